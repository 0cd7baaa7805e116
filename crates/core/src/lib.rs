//! Domain logic for the adaptlabel annotation platform.
//!
//! Everything in this crate is free of database and HTTP concerns so the
//! API, pipeline and db layers can share one vocabulary: the error taxonomy,
//! the annotation geometry union, model selectors, the class filter, the
//! bounded model cache and the dataset export encoders.

pub mod annotation;
pub mod cache;
pub mod class_filter;
pub mod error;
pub mod export;
pub mod model;
pub mod naming;
pub mod types;
