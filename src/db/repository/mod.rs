//! Repository functions per entity. All take a borrowed [`rusqlite::Connection`]
//! and return [`DatabaseError`].

pub mod account;
pub mod availability;
pub mod booking;
pub mod plan;
pub mod session;
pub mod subscription;
pub mod tenancy;

use uuid::Uuid;

use super::DatabaseError;

/// Parse a TEXT-stored UUID, naming the offending column on failure.
pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}
