//! Domain core for Taskhub.
//!
//! Entities, validation, aggregate derivation, slug and scoping rules, and
//! the wire envelopes. No database or network dependencies: the server and
//! the client both build on this crate.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod scope;
pub mod slug;
pub mod status;
pub mod types;
pub mod validation;
pub mod wire;
