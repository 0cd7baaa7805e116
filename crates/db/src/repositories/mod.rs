//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` (or a connection, for transactional writes) as the
//! first argument.

pub mod annotation_repo;
pub mod custom_model_repo;
pub mod dataset_repo;
pub mod image_repo;

pub use annotation_repo::{AnnotationRepo, AnnotationWriteError};
pub use custom_model_repo::CustomModelRepo;
pub use dataset_repo::DatasetRepo;
pub use image_repo::ImageRepo;
