//! Request handlers.
//!
//! Each submodule provides the async handler functions of one resource.
//! Handlers delegate to the repositories in `adaptlabel_db` and the
//! pipeline in `adaptlabel_pipeline`, and map errors via
//! [`AppError`](crate::error::AppError).

pub mod annotation;
pub mod custom_model;
pub mod dataset;
pub mod export;
pub mod image;
pub mod model;
