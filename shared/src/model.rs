//! Domain values that travel over the wire

use crate::ProtocolError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Text form of due dates on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifier of a to-do item, unique within its owning account
pub type ToDoId = u32;

/// Urgency of a to-do item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(ProtocolError::InvalidPriority(other.to_string())),
        }
    }
}

/// Parses an optional due date field; an empty field means no due date
pub fn parse_due_date(field: &str) -> Result<Option<NaiveDate>, ProtocolError> {
    if field.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(field, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidDate(field.to_string()))
}

/// Formats an optional due date the way [`parse_due_date`] reads it
pub fn format_due_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// A single to-do item
///
/// The `Display` form is the record sent back to clients by `GET_TODO` and
/// `LIST_TODOS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDo {
    pub id: ToDoId,
    pub title: String,
    pub priority: Priority,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl ToDo {
    pub fn new(
        id: ToDoId,
        title: impl Into<String>,
        priority: Priority,
        description: impl Into<String>,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            priority,
            description: description.into(),
            due_date,
        }
    }
}

impl fmt::Display for ToDo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[id={},title={},priority={},description={},dueDate={}]",
            self.id,
            self.title,
            self.priority,
            self.description,
            format_due_date(self.due_date)
        )
    }
}

/// Serializes a listing of to-do items: records back to back, in the given order
pub fn format_listing<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a ToDo>,
{
    items.into_iter().map(ToString::to_string).collect()
}
