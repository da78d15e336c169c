//! Tenant scoping rules.
//!
//! Lookups happen in the store; this module only decides whether an entity
//! that was found actually lives under the parent the caller named.

use crate::error::CoreError;
use crate::types::EntityId;

/// A parent boundary a lookup claims to be inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Organization { id: EntityId, slug: &'a str },
    Project { id: EntityId },
}

impl Scope<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            Scope::Organization { id, .. } | Scope::Project { id } => *id,
        }
    }

    fn describe(&self) -> String {
        match self {
            Scope::Organization { slug, .. } => format!("organization {slug}"),
            Scope::Project { id } => format!("project {id}"),
        }
    }
}

/// Accept `entity` only if its recorded parent is the claimed scope.
///
/// Returns [`CoreError::ScopeMismatch`] otherwise; the entity is dropped so
/// cross-tenant data cannot leak through the error path.
pub fn within<T>(
    entity: T,
    entity_name: &'static str,
    key: EntityId,
    actual_parent: EntityId,
    claimed: Scope<'_>,
) -> Result<T, CoreError> {
    if actual_parent == claimed.id() {
        Ok(entity)
    } else {
        Err(CoreError::ScopeMismatch {
            entity: entity_name,
            key: key.to_string(),
            scope: claimed.describe(),
        })
    }
}
