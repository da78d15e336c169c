//! Client side of Taskhub: the remote store adapter and the cache
//! consistency controller.
//!
//! [`remote::RemoteStore`] is the only network seam; [`http::HttpRemoteStore`]
//! implements it over the `/api/v1` HTTP surface. A [`session::Session`]
//! owns a [`cache::QueryCache`] keyed by [`query::QueryKey`] and, after
//! every successful mutation, marks stale whatever
//! [`invalidation`] says the mutation could have changed.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod invalidation;
pub mod query;
pub mod remote;
pub mod session;

pub use error::ClientError;
pub use remote::{MutationOutcome, RemoteStore};
pub use session::Session;
