//! Request handlers, one module per resource.
//!
//! Reads always re-derive aggregates from the live children; mutations
//! settle into the uniform envelope through [`crate::response::Mutation`].

pub mod comment;
pub mod organization;
pub mod project;
pub mod task;
