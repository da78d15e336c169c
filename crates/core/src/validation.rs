//! Input DTOs and their validation.
//!
//! Each `Create*` / `Update*` DTO is what a client sends. `validate()` turns
//! it into a typed, trusted value or returns every field error at once.
//! Parent identifiers never travel in the body; they come from the request
//! scope (URL path) so a body cannot claim a different parent.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::status::{ProjectStatus, TaskStatus};
use crate::types::{Date, Timestamp};

/// Maximum length of an organization name.
pub const MAX_ORGANIZATION_NAME_LEN: usize = 100;

/// Maximum length of a project name or task title.
pub const MAX_TITLE_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Field errors
// ---------------------------------------------------------------------------

/// A single user-correctable problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Join a list of field errors into one `; `-separated line.
    pub fn join(errors: &[FieldError]) -> String {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collects field errors while a DTO is checked.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed, non-empty, at most `max` characters.
    fn required_text(&mut self, field: &'static str, value: &str, max: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.fail(field, "must not be empty");
        } else if trimmed.chars().count() > max {
            self.fail(field, format!("must be at most {max} characters"));
        }
        trimmed.to_string()
    }

    fn email(&mut self, field: &'static str, value: &str) -> String {
        let trimmed = value.trim().to_string();
        if !trimmed.validate_email() {
            self.fail(field, "must be a valid email address");
        }
        trimmed
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Treat absent and blank optional strings the same way.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    pub name: String,
    pub contact_email: String,
}

/// Validated organization input. The slug is assigned by the store, which
/// knows the existing slug set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub contact_email: String,
}

impl CreateOrganization {
    pub fn validate(&self) -> Result<NewOrganization, Vec<FieldError>> {
        let mut check = Checker::default();
        let name = check.required_text("name", &self.name, MAX_ORGANIZATION_NAME_LEN);
        let contact_email = check.email("contactEmail", &self.contact_email);
        check.finish(NewOrganization {
            name,
            contact_email,
        })
    }
}

/// Partial update; only supplied fields change. The slug never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub contact_email: Option<String>,
}

impl UpdateOrganization {
    pub fn validate(&self) -> Result<OrganizationChanges, Vec<FieldError>> {
        let mut check = Checker::default();
        let name = self
            .name
            .as_deref()
            .map(|n| check.required_text("name", n, MAX_ORGANIZATION_NAME_LEN));
        let contact_email = self
            .contact_email
            .as_deref()
            .map(|e| check.email("contactEmail", e));
        check.finish(OrganizationChanges {
            name,
            contact_email,
        })
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `ACTIVE` if omitted.
    pub status: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<Date>,
}

impl CreateProject {
    pub fn validate(&self) -> Result<NewProject, Vec<FieldError>> {
        let mut check = Checker::default();
        let name = check.required_text("name", &self.name, MAX_TITLE_LEN);

        let status = match non_blank(&self.status) {
            None => ProjectStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e: crate::status::UnknownStatus| {
                check.fail("status", e.to_string());
                ProjectStatus::default()
            }),
        };

        let due_date = non_blank(&self.due_date).and_then(|raw| match parse_calendar_date(raw) {
            Ok(date) => Some(date),
            Err(message) => {
                check.fail("dueDate", message);
                None
            }
        });

        check.finish(NewProject {
            name,
            description: self.description.clone().unwrap_or_default(),
            status,
            due_date,
        })
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `TODO` if omitted.
    pub status: Option<String>,
    /// Blank means unassigned.
    pub assignee_email: Option<String>,
    /// RFC 3339 timestamp.
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee_email: Option<String>,
    pub due_date: Option<Timestamp>,
}

impl CreateTask {
    pub fn validate(&self) -> Result<NewTask, Vec<FieldError>> {
        let mut check = Checker::default();
        let title = check.required_text("title", &self.title, MAX_TITLE_LEN);

        let status = match non_blank(&self.status) {
            None => TaskStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e: crate::status::UnknownStatus| {
                check.fail("status", e.to_string());
                TaskStatus::default()
            }),
        };

        let assignee_email =
            non_blank(&self.assignee_email).map(|raw| check.email("assigneeEmail", raw));

        let due_date = non_blank(&self.due_date).and_then(|raw| match parse_timestamp(raw) {
            Ok(at) => Some(at),
            Err(message) => {
                check.fail("dueDate", message);
                None
            }
        });

        check.finish(NewTask {
            title,
            description: self.description.clone().unwrap_or_default(),
            status,
            assignee_email,
            due_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskStatus {
    pub status: String,
}

impl UpdateTaskStatus {
    pub fn validate(&self) -> Result<TaskStatus, Vec<FieldError>> {
        self.status
            .trim()
            .parse()
            .map_err(|e: crate::status::UnknownStatus| vec![FieldError::new("status", e.to_string())])
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub content: String,
    pub author_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub author_email: String,
}

impl CreateComment {
    pub fn validate(&self) -> Result<NewComment, Vec<FieldError>> {
        let mut check = Checker::default();
        if self.content.trim().is_empty() {
            check.fail("content", "must not be empty");
        }
        let author_email = check.email("authorEmail", &self.author_email);
        check.finish(NewComment {
            content: self.content.clone(),
            author_email,
        })
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a project due date. Timestamps are rejected, not truncated.
pub fn parse_calendar_date(raw: &str) -> Result<Date, String> {
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Err("must be a calendar date (YYYY-MM-DD), not a timestamp".to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| "must be a calendar date (YYYY-MM-DD)".to_string())
}

/// Parse a task due date. Bare calendar dates are rejected, not widened.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Err("must be an RFC 3339 timestamp, not a calendar date".to_string());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| "must be an RFC 3339 timestamp".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
