//! Wire envelopes shared by the HTTP server and the client adapter.
//!
//! Every mutation answers with the same shape:
//!
//! ```json
//! { "success": true, "errors": [], "project": { ... } }
//! { "success": false, "errors": ["name: must not be empty"], "project": null }
//! ```
//!
//! The entity key (`organization`, `project`, `task`, `comment`) comes from
//! the payload type's [`EntityKey`] impl.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::{CommentView, OrganizationView, ProjectView, TaskView};

/// Names the field an entity occupies in a mutation envelope.
pub trait EntityKey {
    const KEY: &'static str;
}

impl EntityKey for OrganizationView {
    const KEY: &'static str = "organization";
}

impl EntityKey for ProjectView {
    const KEY: &'static str = "project";
}

impl EntityKey for TaskView {
    const KEY: &'static str = "task";
}

impl EntityKey for CommentView {
    const KEY: &'static str = "comment";
}

/// Uniform mutation response.
///
/// Invariant: `success` is true exactly when `entity` is present and
/// `errors` is empty. Use [`applied`](Self::applied) /
/// [`rejected`](Self::rejected) rather than building it by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResponse<T> {
    pub success: bool,
    pub errors: Vec<String>,
    pub entity: Option<T>,
}

impl<T> MutationResponse<T> {
    pub fn applied(entity: T) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            entity: Some(entity),
        }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            entity: None,
        }
    }
}

impl<T: Serialize + EntityKey> Serialize for MutationResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry("errors", &self.errors)?;
        map.serialize_entry(T::KEY, &self.entity)?;
        map.end()
    }
}

impl<'de, T: DeserializeOwned + EntityKey> Deserialize<'de> for MutationResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EnvelopeVisitor(PhantomData))
    }
}

struct EnvelopeVisitor<T>(PhantomData<T>);

impl<'de, T: DeserializeOwned + EntityKey> Visitor<'de> for EnvelopeVisitor<T> {
    type Value = MutationResponse<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a mutation envelope with `success`, `errors` and `{}`", T::KEY)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut success: Option<bool> = None;
        let mut errors: Option<Vec<String>> = None;
        let mut entity: Option<Option<T>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "success" => success = Some(map.next_value()?),
                "errors" => errors = Some(map.next_value()?),
                k if k == T::KEY => entity = Some(map.next_value()?),
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }

        let success = success.ok_or_else(|| de::Error::missing_field("success"))?;
        let errors = errors.unwrap_or_default();
        let entity = entity.flatten();
        if success && entity.is_none() {
            return Err(de::Error::custom(format!(
                "successful mutation carried no `{}`",
                T::KEY
            )));
        }
        Ok(MutationResponse {
            success,
            errors,
            entity,
        })
    }
}

/// Body of a failed query (`4xx`/`5xx` outside mutations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Optional paging for list queries.
///
/// An absent page means "the whole collection". Aggregates are always
/// computed over the full child set regardless of the page requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Largest page a single list query may return.
pub const MAX_PAGE_LIMIT: u32 = 500;

impl Page {
    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    /// SQL `LIMIT` value: `None` (no limit) when absent, else clamped to
    /// `1..=MAX_PAGE_LIMIT`.
    pub fn sql_limit(&self) -> Option<i64> {
        self.limit
            .map(|limit| i64::from(limit.clamp(1, MAX_PAGE_LIMIT)))
    }

    /// SQL `OFFSET` value, 0 when absent.
    pub fn sql_offset(&self) -> i64 {
        i64::from(self.offset.unwrap_or(0))
    }
}
