//! Login, logout, session resolution and the role-keyed whoami dispatch.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password;
use super::profile::{AccountProfile, ClinicProfile, DoctorProfile, Profile};
use super::token;
use super::{AuthError, Role, RoleSet};
use crate::config::SESSION_TTL_HOURS;
use crate::db::repository::account::{self, Account, NewAccount};
use crate::db::repository::session::{self, SessionRow};
use crate::db::repository::tenancy;
use crate::db::DatabaseError;

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub role: Role,
    pub user: Profile,
    pub expires_at: DateTime<Utc>,
}

/// Authenticate and authorize for one portal, then issue a session.
///
/// The two checks are separate on purpose: bad credentials and a valid
/// account at the wrong portal produce different errors, and the portal
/// check only runs after authentication succeeded.
pub fn login(
    conn: &Connection,
    email: &str,
    password: &str,
    portal: Role,
) -> Result<IssuedSession, AuthError> {
    let account = authenticate(conn, email, password)?;
    if !account.roles.contains(portal) {
        tracing::info!(email, portal = %portal, "login rejected: role not granted");
        return Err(AuthError::PermissionDenied);
    }

    let access_token = token::generate_token();
    let now = Utc::now();
    // Opportunistic cleanup; expired rows are never served anyway.
    let purged = session::purge_expired(conn, now)?;
    if purged > 0 {
        tracing::debug!(purged, "removed expired sessions");
    }
    let expires_at = now + Duration::hours(SESSION_TTL_HOURS);
    session::insert_session(
        conn,
        &SessionRow {
            token_hash: token::hash_token(&access_token),
            account_id: account.id,
            role: portal,
            issued_at: now,
            expires_at,
        },
    )?;

    let user = whoami(conn, &account, portal)?;
    tracing::info!(account_id = %account.id, portal = %portal, "session issued");
    Ok(IssuedSession {
        access_token,
        role: portal,
        user,
        expires_at,
    })
}

/// All credential failures (unknown email, no password set, inactive
/// account, wrong password) collapse into `InvalidCredentials`.
fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<Account, AuthError> {
    let account = account::find_by_email(conn, email)?.ok_or(AuthError::InvalidCredentials)?;
    let stored = account
        .password_hash
        .as_deref()
        .ok_or(AuthError::InvalidCredentials)?;
    if !account.is_active {
        return Err(AuthError::InvalidCredentials);
    }
    if !password::verify_password(password, stored) {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(account)
}

/// Revoke a session by its raw token. Unknown tokens are a no-op.
pub fn logout(conn: &Connection, access_token: &str) -> Result<(), AuthError> {
    session::delete_session(conn, &token::hash_token(access_token))?;
    Ok(())
}

/// Resolve a bearer token to its session and account, or `SessionExpired`.
pub fn resolve_session(
    conn: &Connection,
    access_token: &str,
    now: DateTime<Utc>,
) -> Result<(SessionRow, Account), AuthError> {
    let row = session::find_valid_session(conn, &token::hash_token(access_token), now)?
        .ok_or(AuthError::SessionExpired)?;
    let account = account::get_account(conn, &row.account_id)?;
    if !account.is_active {
        return Err(AuthError::SessionExpired);
    }
    Ok((row, account))
}

/// Build the profile snapshot for a session role. Dispatch is keyed by the
/// role the session was issued under, never by token content.
pub fn whoami(conn: &Connection, account: &Account, role: Role) -> Result<Profile, AuthError> {
    let base = AccountProfile {
        id: account.id,
        email: account.email.clone(),
        display_name: account.display_name.clone(),
        roles: account.roles.roles().to_vec(),
    };

    match role {
        Role::SuperAdmin | Role::Branch => Ok(Profile::Account(base)),
        Role::Clinic => {
            let clinic_id = account.clinic_id.ok_or_else(|| missing_link("clinic_id"))?;
            let clinic = tenancy::get_clinic(conn, &clinic_id)?;
            Ok(Profile::Clinic(ClinicProfile {
                account: base,
                clinic_id: clinic.id,
                clinic_name: clinic.name,
            }))
        }
        Role::Doctor => {
            let doctor_id = account.doctor_id.ok_or_else(|| missing_link("doctor_id"))?;
            let doctor = tenancy::get_doctor(conn, &doctor_id)?;
            Ok(Profile::Doctor(DoctorProfile {
                account: base,
                doctor_id: doctor.id,
                full_name: doctor.full_name,
                specialty: doctor.specialty,
                clinic_id: doctor.clinic_id,
                branch_id: doctor.branch_id,
            }))
        }
    }
}

fn missing_link(field: &str) -> AuthError {
    AuthError::Database(DatabaseError::InvalidValue {
        field: format!("accounts.{field}"),
        value: "required for session role but not set".into(),
    })
}

/// Self-registration for the doctor portal: creates the doctor record and
/// its account (`doctor` role) in one go.
#[allow(clippy::too_many_arguments)]
pub fn register_doctor(
    conn: &Connection,
    clinic_id: &Uuid,
    branch_id: Option<&Uuid>,
    full_name: &str,
    specialty: Option<&str>,
    email: &str,
    plain_password: &str,
) -> Result<Account, AuthError> {
    let doctor = tenancy::insert_doctor(conn, clinic_id, branch_id, full_name, specialty)?;
    let hash = password::hash_password(plain_password)?;
    let account = account::insert_account(
        conn,
        &NewAccount {
            email: email.to_string(),
            display_name: full_name.to_string(),
            password_hash: Some(hash),
            roles: RoleSet::single(Role::Doctor),
            clinic_id: Some(*clinic_id),
            branch_id: branch_id.copied(),
            doctor_id: Some(doctor.id),
        },
    )?;
    Ok(account)
}
