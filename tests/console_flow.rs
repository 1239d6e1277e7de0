//! End-to-end console flow against a live server: sign in, rehydrate,
//! change a booking status, sign out.

use caretide::api::start_server;
use caretide::auth::password::hash_password;
use caretide::auth::{Role, RoleSet};
use caretide::booking::BookingStatus;
use caretide::console::{AuthState, Notification, SessionClient, TokenVault};
use caretide::db::open_memory_database;
use caretide::db::repository::account::{insert_account, NewAccount};
use caretide::db::repository::{booking, tenancy};
use uuid::Uuid;

struct TestServer {
    base_url: String,
    clinic_id: Uuid,
    booking_id: Uuid,
    _handle: caretide::api::ServerHandle,
}

async fn spawn_seeded_server() -> TestServer {
    let conn = open_memory_database().unwrap();
    let clinic = tenancy::insert_clinic(&conn, "Harbor Clinic").unwrap();
    insert_account(
        &conn,
        &NewAccount {
            email: "admin@harbor.example".into(),
            display_name: "Harbor Admin".into(),
            password_hash: Some(hash_password("correct-horse").unwrap()),
            roles: RoleSet::single(Role::Clinic),
            clinic_id: Some(clinic.id),
            branch_id: None,
            doctor_id: None,
        },
    )
    .unwrap();
    let created = booking::insert_booking(
        &conn,
        &clinic.id,
        &serde_json::json!({"name": "Ama Boateng"}),
        None,
        BookingStatus::Pending,
    )
    .unwrap();

    let handle = start_server(conn, "127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    TestServer {
        base_url: format!("http://{}", handle.addr),
        clinic_id: clinic.id,
        booking_id: created.id,
        _handle: handle,
    }
}

fn client(server: &TestServer, dir: &tempfile::TempDir) -> SessionClient {
    let vault = TokenVault::new(dir.path().join("session.json"));
    SessionClient::new(server.base_url.clone(), vault)
}

#[tokio::test]
async fn login_rehydrate_and_logout() {
    let server = spawn_seeded_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut first = client(&server, &dir);
    first
        .login("admin@harbor.example", "correct-horse", Role::Clinic)
        .await
        .unwrap();
    assert!(matches!(
        first.state(),
        AuthState::Authenticated { role: Role::Clinic, .. }
    ));

    // A fresh client over the same vault rehydrates from the stored marker.
    let mut second = client(&server, &dir);
    second.initialize().await;
    match second.state() {
        AuthState::Authenticated { role, .. } => assert_eq!(*role, Role::Clinic),
        other => panic!("expected authenticated, got {other:?}"),
    }

    second.logout().await;
    let mut third = client(&server, &dir);
    third.initialize().await;
    assert_eq!(*third.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn initialize_with_revoked_token_is_unauthenticated() {
    let server = spawn_seeded_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut first = client(&server, &dir);
    first
        .login("admin@harbor.example", "correct-horse", Role::Clinic)
        .await
        .unwrap();

    // Revoke the session server-side while the vault still holds the token.
    let record = TokenVault::new(dir.path().join("session.json"))
        .load()
        .unwrap();
    let response = reqwest::Client::new()
        .post(format!("{}/logout", server.base_url))
        .bearer_auth(&record.access_token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // Rehydration hits the profile endpoint, gets a 401, and lands signed out.
    let mut second = client(&server, &dir);
    second.initialize().await;
    assert_eq!(*second.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn wrong_portal_login_is_permission_denied() {
    let server = spawn_seeded_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut c = client(&server, &dir);
    let err = c
        .login("admin@harbor.example", "correct-horse", Role::SuperAdmin)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        caretide::console::ConsoleError::PermissionDenied
    ));
    // The vault stays empty after a failed login.
    let mut fresh = client(&server, &dir);
    fresh.initialize().await;
    assert_eq!(*fresh.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn confirmed_status_change_refetches_bookings() {
    let server = spawn_seeded_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut c = client(&server, &dir);
    c.login("admin@harbor.example", "correct-horse", Role::Clinic)
        .await
        .unwrap();

    let outcome = c
        .change_booking_status(&server.booking_id, BookingStatus::Confirmed)
        .await;
    assert!(matches!(outcome.notification, Notification::Success(_)));
    let bookings = outcome.bookings.expect("refetch after confirmation");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].clinic_id, server.clinic_id);
    assert_eq!(bookings[0].status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn rejected_status_change_does_not_mutate() {
    let server = spawn_seeded_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut c = client(&server, &dir);
    c.login("admin@harbor.example", "correct-horse", Role::Clinic)
        .await
        .unwrap();

    // Unknown booking id: 404 from the server, error notification here.
    let outcome = c
        .change_booking_status(&Uuid::new_v4(), BookingStatus::Completed)
        .await;
    assert!(matches!(outcome.notification, Notification::Error(_)));
    assert!(outcome.bookings.is_none());

    // The original booking is untouched.
    let outcome = c
        .change_booking_status(&server.booking_id, BookingStatus::Confirmed)
        .await;
    let bookings = outcome.bookings.unwrap();
    assert_eq!(bookings[0].status, BookingStatus::Confirmed);
}
