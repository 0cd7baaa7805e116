//! Annotation orchestration.
//!
//! Resolves a dataset's model selector to loaded inference capabilities
//! ([`resolver`]), runs the one- or two-stage pipeline on each image
//! ([`controller`]), converts model output into validated annotation records
//! ([`normalizer`]), and drives whole-dataset jobs ([`runner`]) through a
//! bounded worker queue ([`queue`]) backed by an [`store::AnnotationStore`].

pub mod controller;
pub mod normalizer;
pub mod queue;
pub mod resolver;
pub mod runner;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
