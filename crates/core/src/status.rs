//! Closed status enums for projects and tasks.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! corresponding `*_statuses` lookup table. On the wire a status is its
//! SCREAMING_SNAKE_CASE name; unknown names are rejected, never passed through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Returned when a status name or id does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status `{value}`; expected one of {expected}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant = $val ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            const EXPECTED: &'static str = concat!($($wire, " "),+);

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the wire name, e.g. `"IN_PROGRESS"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Map a database status ID back to its variant.
            pub fn from_id(id: StatusId) -> Result<Self, UnknownStatus> {
                match id {
                    $(v if v == $val => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                        expected: Self::EXPECTED.trim_end(),
                    }),
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = UnknownStatus;

            fn try_from(id: StatusId) -> Result<Self, Self::Error> {
                Self::from_id(id)
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                        expected: Self::EXPECTED.trim_end(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Project lifecycle status.
    ProjectStatus("project") {
        Active = 1 => "ACTIVE",
        Completed = 2 => "COMPLETED",
        OnHold = 3 => "ON_HOLD",
        Cancelled = 4 => "CANCELLED",
    }
}

define_status_enum! {
    /// Task workflow status.
    TaskStatus("task") {
        Todo = 1 => "TODO",
        InProgress = 2 => "IN_PROGRESS",
        Review = 3 => "REVIEW",
        Done = 4 => "DONE",
    }
}

impl ProjectStatus {
    /// Terminal projects are never overdue.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        self == TaskStatus::Done
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}
