//! Admin API router.
//!
//! Returns a composable `Router` mountable on any axum server. Public
//! routes cover sign-in and doctor self-registration; everything else sits
//! behind the bearer-auth middleware.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer); endpoint handlers use `State<ApiContext>`.

use axum::routing::{get, patch, post};
use axum::Router;
use rusqlite::Connection;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the admin API router around a single database handle.
pub fn api_router(conn: Connection) -> Router {
    build_router(ApiContext::new(conn))
}

pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // NOTE: path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/logout", post(endpoints::auth::logout))
        .route("/me", get(endpoints::auth::me))
        .route("/clinics/me", get(endpoints::auth::clinic_me))
        .route("/doctors/me", get(endpoints::auth::doctor_me))
        .route(
            "/doctor-availabilities",
            post(endpoints::availability::create).get(endpoints::availability::list),
        )
        .route(
            "/doctor-availabilities/form",
            get(endpoints::availability::form),
        )
        .route(
            "/doctor-availabilities/:id",
            get(endpoints::availability::detail)
                .patch(endpoints::availability::update)
                .delete(endpoints::availability::deactivate),
        )
        .route(
            "/doctor-availabilities/:id/slots",
            get(endpoints::availability::slots),
        )
        .route("/patient-bookings", get(endpoints::bookings::list))
        .route(
            "/patient-bookings/:id",
            patch(endpoints::bookings::change_status),
        )
        .route(
            "/patient-bookings/:id/history",
            get(endpoints::bookings::history),
        )
        .route("/plans", get(endpoints::plans::list))
        .route(
            "/clinic-subscriptions",
            post(endpoints::subscriptions::subscribe),
        )
        .route(
            "/clinic-subscriptions/free-trial",
            post(endpoints::subscriptions::free_trial),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the middleware can extract ApiContext.
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/login", post(endpoints::auth::login))
        .route("/doctors-login", post(endpoints::auth::doctors_login))
        .route("/doctors-register", post(endpoints::auth::doctors_register))
        .with_state(ctx);

    // The dashboards are served from their own origin.
    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::password::hash_password;
    use crate::auth::{Role, RoleSet};
    use crate::billing::{BillingCycle, Plan};
    use crate::booking::BookingStatus;
    use chrono::Utc;

    use crate::db::open_memory_database;
    use crate::db::repository::{
        account, availability as availability_repo, booking, plan, subscription, tenancy,
    };
    use crate::db::repository::account::NewAccount;

    struct Fixture {
        ctx: ApiContext,
        clinic_id: Uuid,
        branch_id: Uuid,
    }

    fn fixture() -> Fixture {
        let conn = open_memory_database().unwrap();
        let clinic = tenancy::insert_clinic(&conn, "Harbor Clinic").unwrap();
        let branch = tenancy::insert_branch(&conn, &clinic.id, "North").unwrap();

        let hash = hash_password("correct-horse").unwrap();
        account::insert_account(
            &conn,
            &NewAccount {
                email: "root@platform.example".into(),
                display_name: "Platform Admin".into(),
                password_hash: Some(hash.clone()),
                roles: RoleSet::single(Role::SuperAdmin),
                clinic_id: None,
                branch_id: None,
                doctor_id: None,
            },
        )
        .unwrap();
        account::insert_account(
            &conn,
            &NewAccount {
                email: "admin@harbor.example".into(),
                display_name: "Harbor Admin".into(),
                password_hash: Some(hash.clone()),
                roles: RoleSet::single(Role::Clinic),
                clinic_id: Some(clinic.id),
                branch_id: None,
                doctor_id: None,
            },
        )
        .unwrap();
        account::insert_account(
            &conn,
            &NewAccount {
                email: "north@harbor.example".into(),
                display_name: "North Desk".into(),
                password_hash: Some(hash),
                roles: RoleSet::single(Role::Branch),
                clinic_id: Some(clinic.id),
                branch_id: Some(branch.id),
                doctor_id: None,
            },
        )
        .unwrap();

        Fixture {
            ctx: ApiContext::new(conn),
            clinic_id: clinic.id,
            branch_id: branch.id,
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn login(ctx: &ApiContext, email: &str, portal: &str) -> String {
        let app = build_router(ctx.clone());
        let body = format!(
            r#"{{"email":"{email}","password":"correct-horse","portal":"{portal}"}}"#
        );
        let response = app
            .oneshot(json_request("POST", "/login", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        json["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn me_requires_auth() {
        let f = fixture();
        let app = build_router(f.ctx);
        let response = app.oneshot(get_request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_then_me_round_trip() {
        let f = fixture();
        let token = login(&f.ctx, "root@platform.example", "super_admin").await;

        let app = build_router(f.ctx);
        let response = app.oneshot(get_request("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");

        let json = response_json(response).await;
        assert_eq!(json["kind"], "account");
        assert_eq!(json["email"], "root@platform.example");
    }

    #[tokio::test]
    async fn wrong_portal_is_permission_denied() {
        let f = fixture();
        let app = build_router(f.ctx);
        let body = r#"{"email":"admin@harbor.example","password":"correct-horse","portal":"super_admin"}"#;
        let response = app
            .oneshot(json_request("POST", "/login", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn bad_password_is_invalid_credentials() {
        let f = fixture();
        let app = build_router(f.ctx);
        let body = r#"{"email":"root@platform.example","password":"wrong","portal":"super_admin"}"#;
        let response = app
            .oneshot(json_request("POST", "/login", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn doctor_portal_rejected_on_shared_login() {
        let f = fixture();
        let app = build_router(f.ctx);
        let body = r#"{"email":"root@platform.example","password":"correct-horse","portal":"doctor"}"#;
        let response = app
            .oneshot(json_request("POST", "/login", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clinic_me_rejects_branch_session() {
        let f = fixture();
        let token = login(&f.ctx, "north@harbor.example", "branch").await;

        let app = build_router(f.ctx);
        let response = app
            .oneshot(get_request("/clinics/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn doctor_register_then_whoami() {
        let f = fixture();
        let app = build_router(f.ctx.clone());
        let body = format!(
            r#"{{"clinic_id":"{}","branch_id":"{}","full_name":"Dr. Osei","specialty":"Cardiology","email":"osei@harbor.example","password":"secret-pw"}}"#,
            f.clinic_id, f.branch_id
        );
        let response = app
            .oneshot(json_request("POST", "/doctors-register", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        let token = json["access_token"].as_str().unwrap().to_string();
        assert_eq!(json["role"], "doctor");

        let app = build_router(f.ctx);
        let response = app
            .oneshot(get_request("/doctors/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["kind"], "doctor");
        assert_eq!(json["full_name"], "Dr. Osei");
    }

    #[tokio::test]
    async fn availability_create_move_deactivate() {
        let f = fixture();
        let app = build_router(f.ctx.clone());
        let body = format!(
            r#"{{"clinic_id":"{}","branch_id":"{}","full_name":"Dr. Mensah","email":"mensah@harbor.example","password":"secret-pw"}}"#,
            f.clinic_id, f.branch_id
        );
        let response = app
            .oneshot(json_request("POST", "/doctors-register", None, &body))
            .await
            .unwrap();
        let token = response_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        // Create a weekly window; doctor sessions do not pass doctor_id.
        let body = format!(
            r#"{{"branch_id":"{}","recurrence":{{"type":"weekly","days":[0,2]}},"start_time":"09:00:00","end_time":"11:00:00","slot_duration_minutes":30}}"#,
            f.branch_id
        );
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/doctor-availabilities",
                Some(&token),
                &body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        let window_id = json["window"]["id"].as_str().unwrap().to_string();
        assert!(json["generated_slots"].as_u64().unwrap() > 0);
        assert_eq!(json["overlapping"].as_array().unwrap().len(), 0);

        // Move it later in the day.
        let body = r#"{"start":"2026-09-01T13:00:00","end":"2026-09-01T15:00:00"}"#;
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/doctor-availabilities/{window_id}"),
                Some(&token),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["start_time"], "13:00:00");
        assert_eq!(json["is_active"], true);

        // Slots are listable, then the window deactivates cleanly.
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(get_request(
                &format!("/doctor-availabilities/{window_id}/slots"),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let app = build_router(f.ctx);
        let req = json_request(
            "DELETE",
            &format!("/doctor-availabilities/{window_id}"),
            Some(&token),
            "",
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn form_seeds_from_calendar_selection() {
        let f = fixture();
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        // 2026-09-02 is a Wednesday; index 2.
        let app = build_router(f.ctx);
        let response = app
            .oneshot(get_request(
                "/doctor-availabilities/form?start=2026-09-02T10:00:00&end=2026-09-02T12:30:00",
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["model"]["availability_id"], serde_json::Value::Null);
        assert_eq!(json["model"]["days_of_week"][0], 2);
        assert_eq!(json["model"]["start_time"], "10:00:00");
        assert_eq!(json["branches"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn form_for_existing_window_surfaces_its_branch_first() {
        let f = fixture();
        let (south_id, window_id) = {
            let conn = f.ctx.lock_db().unwrap();
            let south = tenancy::insert_branch(&conn, &f.clinic_id, "South").unwrap();
            let doctor =
                tenancy::insert_doctor(&conn, &f.clinic_id, Some(&south.id), "Dr. Adjei", None)
                    .unwrap();
            let window = crate::scheduling::AvailabilityWindow {
                id: Uuid::new_v4(),
                doctor_id: doctor.id,
                branch_id: south.id,
                recurrence: crate::scheduling::Recurrence::Weekly { days: vec![0, 3] },
                start_time: "09:00:00".parse().unwrap(),
                end_time: "12:00:00".parse().unwrap(),
                slot_duration_minutes: 30,
                is_active: true,
            };
            availability_repo::insert_window(&conn, &window, Utc::now().date_naive(), 7).unwrap();
            (south.id, window.id)
        };
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        let app = build_router(f.ctx);
        let response = app
            .oneshot(get_request(
                &format!("/doctor-availabilities/form?availability_id={window_id}"),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["model"]["availability_id"], window_id.to_string());
        assert_eq!(json["model"]["days_of_week"], serde_json::json!([0, 3]));
        assert!(!json["model"]["slots"].as_array().unwrap().is_empty());

        // South was created after North but backs the edited window.
        let branches = json["branches"].as_array().unwrap();
        assert_eq!(branches[0]["id"], south_id.to_string());
        assert_eq!(branches[1]["id"], f.branch_id.to_string());
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let f = fixture();
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;
        let doctor = {
            let conn = f.ctx.lock_db().unwrap();
            tenancy::insert_doctor(&conn, &f.clinic_id, None, "Dr. Adjei", None).unwrap()
        };

        let body = format!(
            r#"{{"doctor_id":"{}","branch_id":"{}","recurrence":{{"type":"weekly","days":[0]}},"start_time":"11:00:00","end_time":"09:00:00"}}"#,
            doctor.id, f.branch_id
        );
        let app = build_router(f.ctx);
        let response = app
            .oneshot(json_request(
                "POST",
                "/doctor-availabilities",
                Some(&token),
                &body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booking_status_change_appends_history() {
        let f = fixture();
        let created = {
            let conn = f.ctx.lock_db().unwrap();
            booking::insert_booking(
                &conn,
                &f.clinic_id,
                &serde_json::json!({"name": "Ama"}),
                None,
                BookingStatus::Pending,
            )
            .unwrap()
        };
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/patient-bookings/{}", created.id),
                Some(&token),
                r#"{"status":1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "confirmed");

        let app = build_router(f.ctx);
        let response = app
            .oneshot(get_request(
                &format!("/patient-bookings/{}/history", created.id),
                Some(&token),
            ))
            .await
            .unwrap();
        let json = response_json(response).await;
        let history = json.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1]["status"], "confirmed");
        assert_eq!(history[1]["changed_by"], "admin@harbor.example");
    }

    #[tokio::test]
    async fn unknown_status_code_is_400_and_unknown_booking_404() {
        let f = fixture();
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        let app = build_router(f.ctx.clone());
        let created = {
            let conn = f.ctx.lock_db().unwrap();
            booking::insert_booking(
                &conn,
                &f.clinic_id,
                &serde_json::json!({}),
                None,
                BookingStatus::Pending,
            )
            .unwrap()
        };
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/patient-bookings/{}", created.id),
                Some(&token),
                r#"{"status":9}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app = build_router(f.ctx);
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/patient-bookings/{}", Uuid::new_v4()),
                Some(&token),
                r#"{"status":1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn seed_plan(ctx: &ApiContext, name: &str, cycle: BillingCycle, limit: i64) -> Plan {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: name.into(),
            billing_cycle: cycle,
            booking_limit: limit,
            price_minor: limit * 100,
            is_trial: false,
        };
        let conn = ctx.lock_db().unwrap();
        plan::insert_plan(&conn, &plan).unwrap();
        plan
    }

    #[tokio::test]
    async fn plans_are_gated_by_active_subscription() {
        let f = fixture();
        let basic = seed_plan(&f.ctx, "Basic", BillingCycle::Monthly, 50);
        let pro = seed_plan(&f.ctx, "Pro", BillingCycle::Monthly, 100);
        seed_plan(&f.ctx, "Annual", BillingCycle::Yearly, 600);
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        // Subscribe to Basic, then the catalog disables it while quota remains.
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions",
                Some(&token),
                &format!(r#"{{"plan_id":"{}"}}"#, basic.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let app = build_router(f.ctx.clone());
        let response = app.oneshot(get_request("/plans", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let monthly = json["monthly"].as_array().unwrap();
        for option in monthly {
            let selectable = option["selectable"].as_bool().unwrap();
            if option["plan"]["name"] == "Basic" {
                assert!(!selectable);
            } else {
                assert!(selectable, "higher-capacity plan should stay selectable");
            }
        }
        assert_eq!(json["yearly"].as_array().unwrap().len(), 1);

        // Downgrading or re-buying the same plan is rejected; upgrading works.
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions",
                Some(&token),
                &format!(r#"{{"plan_id":"{}"}}"#, basic.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app = build_router(f.ctx);
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions",
                Some(&token),
                &format!(r#"{{"plan_id":"{}"}}"#, pro.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn upgrade_supersedes_prior_subscription() {
        let f = fixture();
        let basic = seed_plan(&f.ctx, "Basic", BillingCycle::Monthly, 50);
        let pro = seed_plan(&f.ctx, "Pro", BillingCycle::Monthly, 100);
        let token = login(&f.ctx, "admin@harbor.example", "clinic").await;

        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions",
                Some(&token),
                &format!(r#"{{"plan_id":"{}"}}"#, basic.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let first = response_json(response).await;
        let first_id = first["id"].as_str().unwrap().to_string();

        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions",
                Some(&token),
                &format!(r#"{{"plan_id":"{}"}}"#, pro.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // The Basic row is no longer `success`; only the Pro row is active.
        let conn = f.ctx.lock_db().unwrap();
        let old_status: String = conn
            .query_row(
                "SELECT status FROM clinic_subscriptions WHERE id = ?1",
                rusqlite::params![first_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(old_status, "superseded");
        let active = subscription::find_active(&conn, &f.clinic_id, chrono::Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(active.plan_id, pro.id);
    }

    #[tokio::test]
    async fn free_trial_requires_no_active_subscription() {
        let f = fixture();
        let basic = seed_plan(&f.ctx, "Basic", BillingCycle::Monthly, 50);
        let token = login(&f.ctx, "root@platform.example", "super_admin").await;

        let body = format!(
            r#"{{"clinicId":"{}","planId":"{}","bookingLimit":10}}"#,
            f.clinic_id, basic.id
        );
        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions/free-trial",
                Some(&token),
                &body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        assert_eq!(json["remaining_booking_limit"], 10);

        // Second trial while the first is active is rejected.
        let app = build_router(f.ctx);
        let response = app
            .oneshot(json_request(
                "POST",
                "/clinic-subscriptions/free-trial",
                Some(&token),
                &body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let f = fixture();
        let token = login(&f.ctx, "root@platform.example", "super_admin").await;

        let app = build_router(f.ctx.clone());
        let response = app
            .oneshot(json_request("POST", "/logout", Some(&token), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let app = build_router(f.ctx);
        let response = app.oneshot(get_request("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
