//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. There are no delete methods:
//! the hierarchy only grows, and parentage never changes after insert.

pub mod comment_repo;
pub mod organization_repo;
pub mod project_repo;
pub mod task_repo;

pub use comment_repo::CommentRepo;
pub use organization_repo::OrganizationRepo;
pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
