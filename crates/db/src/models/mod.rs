//! Row structs for the hierarchy tables.
//!
//! Each submodule contains a `FromRow` struct matching the columns its
//! repository selects (entity columns plus the joined lineage columns) and
//! conversions into the `taskhub_core` entity and lineage types. Status
//! columns are decoded straight into the closed core enums; an unknown id
//! is a decode error, never a pass-through value.

pub mod comment;
pub mod organization;
pub mod project;
pub mod task;
