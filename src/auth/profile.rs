//! Profile snapshots returned by the three whoami endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// The role-shaped profile a session carries. Which variant comes back is
/// decided by the role the session was issued under, not by token content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Account(AccountProfile),
    Clinic(ClinicProfile),
    Doctor(DoctorProfile),
}

impl Profile {
    pub fn account(&self) -> &AccountProfile {
        match self {
            Profile::Account(a) => a,
            Profile::Clinic(c) => &c.account,
            Profile::Doctor(d) => &d.account,
        }
    }
}

/// Generic whoami shape (`/me`) for super-admin and branch sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
}

/// Clinic-scoped whoami shape (`/clinics/me`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicProfile {
    pub account: AccountProfile,
    pub clinic_id: Uuid,
    pub clinic_name: String,
}

/// Doctor-scoped whoami shape (`/doctors/me`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub account: AccountProfile,
    pub doctor_id: Uuid,
    pub full_name: String,
    pub specialty: Option<String>,
    pub clinic_id: Uuid,
    pub branch_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> AccountProfile {
        AccountProfile {
            id: Uuid::new_v4(),
            email: "admin@clinic.example".into(),
            display_name: "Admin".into(),
            roles: vec![Role::SuperAdmin],
        }
    }

    #[test]
    fn profile_serde_round_trip() {
        let profile = Profile::Account(sample_account());
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn profile_tag_is_snake_case() {
        let profile = Profile::Clinic(ClinicProfile {
            account: sample_account(),
            clinic_id: Uuid::new_v4(),
            clinic_name: "North Clinic".into(),
        });
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["kind"], "clinic");
    }

    #[test]
    fn account_accessor_reaches_nested_account() {
        let account = sample_account();
        let profile = Profile::Doctor(DoctorProfile {
            account: account.clone(),
            doctor_id: Uuid::new_v4(),
            full_name: "Dr. Osei".into(),
            specialty: Some("Cardiology".into()),
            clinic_id: Uuid::new_v4(),
            branch_id: None,
        });
        assert_eq!(profile.account().email, account.email);
    }
}
