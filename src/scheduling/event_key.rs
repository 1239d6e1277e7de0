//! Structured replacement for the calendar's composite UI identifiers.
//!
//! The dashboard historically encoded slot occurrences as
//! `"<availabilityId>::<suffix>"` and recovered the backend id by string
//! slicing. Only the part before the first separator is meaningful; the
//! suffix tags the rendered occurrence.

use serde::{Deserialize, Serialize};

use super::SchedulingError;

const SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKey {
    pub availability_id: String,
    pub occurrence_tag: Option<String>,
}

impl EventKey {
    pub fn new(availability_id: impl Into<String>, occurrence_tag: Option<String>) -> Self {
        Self {
            availability_id: availability_id.into(),
            occurrence_tag,
        }
    }

    /// Parse a raw composite identifier. Everything before the first `::`
    /// is the backend availability id; the rest (which may itself contain
    /// separators) is the occurrence tag.
    pub fn parse(raw: &str) -> Result<Self, SchedulingError> {
        let (id, tag) = match raw.find(SEPARATOR) {
            Some(pos) => (&raw[..pos], Some(raw[pos + SEPARATOR.len()..].to_string())),
            None => (raw, None),
        };
        if id.is_empty() {
            return Err(SchedulingError::MalformedEventKey(raw.to_string()));
        }
        Ok(Self {
            availability_id: id.to_string(),
            occurrence_tag: tag,
        })
    }

    /// Render back to the composite form the calendar widget expects.
    pub fn to_composite(&self) -> String {
        match &self.occurrence_tag {
            Some(tag) => format!("{}{SEPARATOR}{tag}", self.availability_id),
            None => self.availability_id.clone(),
        }
    }
}
