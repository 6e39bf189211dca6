use crate::infra::{AppState, Services};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use job_board::outcome::{FailureKind, Outcome};
use job_board::store::EntityStore;
use job_board::workflows::users::{UserAccount, UserId, UserRole};
use job_board::workflows::vacancy::applications::{ApplicationId, ApplicationRequest};
use job_board::workflows::vacancy::{NewVacancy, VacancyId, VacancyUpdate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

type Shared = State<Arc<Services>>;

/// Public HTTP surface: probes plus the vacancy, application and user endpoints.
pub(crate) fn router(services: Arc<Services>) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/vacancies", get(list_vacancies).post(create_vacancy))
        .route("/api/v1/vacancies/archive", post(archive_expired))
        .route("/api/v1/vacancies/search/:term", get(search_vacancies))
        .route(
            "/api/v1/vacancies/:vacancy_id",
            get(get_vacancy).put(update_vacancy).delete(delete_vacancy),
        )
        .route("/api/v1/vacancies/:vacancy_id/post", put(post_vacancy))
        .route(
            "/api/v1/vacancies/:vacancy_id/deactivate",
            put(deactivate_vacancy),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/applications",
            get(vacancy_applications),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/eligibility/:applicant_id",
            get(eligibility),
        )
        .route("/api/v1/applications", post(apply))
        .route("/api/v1/applications/:application_id", get(get_application))
        .route(
            "/api/v1/applicants/:applicant_id/applications",
            get(applicant_applications),
        )
        .route(
            "/api/v1/applicants/:applicant_id/applications/today",
            get(applications_today),
        )
        .route("/api/v1/users", post(register_user))
        .with_state(services)
}

/// NotFound maps to 404, Validation and generic errors to 400, Unauthorized to 401.
pub(crate) fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureKind::Error => StatusCode::BAD_REQUEST,
    }
}

fn respond<T: Serialize>(outcome: Outcome<T>, status: StatusCode) -> Response {
    match outcome {
        Outcome::Success(value) => (status, Json(value)).into_response(),
        Outcome::Failure(failure) => {
            (failure_status(failure.kind()), Json(failure)).into_response()
        }
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn list_vacancies(State(services): Shared) -> Response {
    respond(services.vacancies.list_vacancies(), StatusCode::OK)
}

async fn create_vacancy(State(services): Shared, Json(request): Json<NewVacancy>) -> Response {
    respond(services.vacancies.create_vacancy(request), StatusCode::CREATED)
}

async fn get_vacancy(State(services): Shared, Path(vacancy_id): Path<VacancyId>) -> Response {
    respond(services.vacancies.get_vacancy(&vacancy_id), StatusCode::OK)
}

async fn update_vacancy(
    State(services): Shared,
    Path(vacancy_id): Path<VacancyId>,
    Json(update): Json<VacancyUpdate>,
) -> Response {
    respond(
        services.vacancies.update_vacancy(&vacancy_id, update),
        StatusCode::OK,
    )
}

async fn delete_vacancy(State(services): Shared, Path(vacancy_id): Path<VacancyId>) -> Response {
    match services.vacancies.delete_vacancy(&vacancy_id) {
        Outcome::Success(_) => StatusCode::NO_CONTENT.into_response(),
        failed => respond(failed, StatusCode::NO_CONTENT),
    }
}

async fn search_vacancies(State(services): Shared, Path(term): Path<String>) -> Response {
    respond(services.vacancies.search_vacancies(&term), StatusCode::OK)
}

async fn post_vacancy(State(services): Shared, Path(vacancy_id): Path<VacancyId>) -> Response {
    respond(services.lifecycle.post(&vacancy_id), StatusCode::OK)
}

async fn deactivate_vacancy(
    State(services): Shared,
    Path(vacancy_id): Path<VacancyId>,
) -> Response {
    respond(services.lifecycle.deactivate(&vacancy_id), StatusCode::OK)
}

async fn archive_expired(State(services): Shared) -> Response {
    respond(services.lifecycle.sweep_expired(), StatusCode::OK)
}

async fn vacancy_applications(
    State(services): Shared,
    Path(vacancy_id): Path<VacancyId>,
) -> Response {
    respond(
        services.applications.applicants_for_vacancy(&vacancy_id),
        StatusCode::OK,
    )
}

async fn eligibility(
    State(services): Shared,
    Path((vacancy_id, applicant_id)): Path<(VacancyId, UserId)>,
) -> Response {
    respond(
        services.applications.assess(&vacancy_id, &applicant_id),
        StatusCode::OK,
    )
}

async fn apply(State(services): Shared, Json(request): Json<ApplicationRequest>) -> Response {
    respond(
        services.applications.apply_to_vacancy(request),
        StatusCode::CREATED,
    )
}

async fn get_application(
    State(services): Shared,
    Path(application_id): Path<ApplicationId>,
) -> Response {
    respond(
        services.applications.get_application(&application_id),
        StatusCode::OK,
    )
}

async fn applicant_applications(
    State(services): Shared,
    Path(applicant_id): Path<UserId>,
) -> Response {
    respond(
        services.applications.applications_by_applicant(&applicant_id),
        StatusCode::OK,
    )
}

async fn applications_today(State(services): Shared, Path(applicant_id): Path<UserId>) -> Response {
    let counted = services
        .applications
        .count_applications_today(&applicant_id)
        .map(|count| json!({ "applicant_id": applicant_id, "count": count }));
    respond(counted, StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterUser {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) role: UserRole,
}

/// Seeds the in-memory identity store; account management lives outside this service.
async fn register_user(State(services): Shared, Json(request): Json<RegisterUser>) -> Response {
    let account = UserAccount {
        id: UserId::new(),
        first_name: request.first_name,
        last_name: request.last_name,
        role: request.role,
    };
    respond(services.users.add(account), StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chrono::{Duration, Utc};
    use job_board::clock::SystemClock;
    use job_board::config::PolicyConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app() -> (Router, AppState) {
        let services = Arc::new(Services::in_memory(
            &PolicyConfig::default(),
            Arc::new(SystemClock),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        (router(services).layer(Extension(state.clone())), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = app.clone().oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    async fn register(app: &Router, role: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/users",
            Some(json!({ "first_name": "Lena", "last_name": "Okafor", "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().expect("user id").to_string()
    }

    async fn create_vacancy(
        app: &Router,
        employer: &str,
        title: &str,
        expires_in_days: i64,
    ) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/vacancies",
            Some(json!({
                "title": title,
                "description": "Maintain the settlement pipeline",
                "employer_id": employer,
                "max_applications": 5,
                "expiry_date": (Utc::now() + Duration::days(expires_in_days)).to_rfc3339(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "draft");
        body["id"].as_str().expect("vacancy id").to_string()
    }

    #[test]
    fn failure_kinds_map_to_statuses() {
        assert_eq!(failure_status(FailureKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(failure_status(FailureKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(failure_status(FailureKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(failure_status(FailureKind::Error), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let (app, state) = app();
        let (status, body) = send(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        state.readiness.store(true, Ordering::Release);
        let (status, _) = send(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_vacancy_is_404_with_failure_body() {
        let (app, _) = app();
        let uri = format!("/api/v1/vacancies/{}", VacancyId::new());
        let (status, body) = send(&app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["message"], "resource not found");
    }

    #[tokio::test]
    async fn invalid_vacancy_is_400() {
        let (app, _) = app();
        let employer = register(&app, "employer").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/vacancies",
            Some(json!({
                "title": "",
                "description": "",
                "employer_id": employer,
                "max_applications": 3,
                "expiry_date": Utc::now().to_rfc3339(),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["errors"][0]["identifier"], "title");
    }

    #[tokio::test]
    async fn apply_then_second_apply_is_refused() {
        let (app, _) = app();
        let employer = register(&app, "employer").await;
        let applicant = register(&app, "applicant").await;
        let first = create_vacancy(&app, &employer, "Ledger Engineer", 30).await;
        let second = create_vacancy(&app, &employer, "Risk Analyst", 30).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/vacancies/{first}/post"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({ "vacancy_id": first, "applicant_id": applicant })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["applicant_name"], "Lena Okafor");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({ "vacancy_id": second, "applicant_id": applicant })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("cannot apply to vacancy")));

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/vacancies/{second}/eligibility/{applicant}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decision"], "denied");
        assert_eq!(body["reason"]["reason"], "recent_application");

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/applicants/{applicant}/applications/today"),
            None,
        )
        .await;
        assert_eq!(body["count"], 1);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/vacancies/{first}/applications"),
            None,
        )
        .await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn draft_can_be_deactivated_before_posting() {
        let (app, _) = app();
        let employer = register(&app, "employer").await;
        let vacancy = create_vacancy(&app, &employer, "Ledger Engineer", 30).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/vacancies/{vacancy}/deactivate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "inactive");
    }

    #[tokio::test]
    async fn archive_endpoint_sweeps_expired_vacancies() {
        let (app, _) = app();
        let employer = register(&app, "employer").await;
        let expired = create_vacancy(&app, &employer, "Night Operator", -3).await;
        create_vacancy(&app, &employer, "Day Operator", 10).await;

        let (status, report) = send(&app, Method::POST, "/api/v1/vacancies/archive", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["archived"], json!([expired]));

        let (_, vacancy) = send(
            &app,
            Method::GET,
            &format!("/api/v1/vacancies/{expired}"),
            None,
        )
        .await;
        assert_eq!(vacancy["is_archived"], true);

        let (status, report) = send(&app, Method::POST, "/api/v1/vacancies/archive", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["scanned"], 0);
    }

    #[tokio::test]
    async fn search_and_delete_round_trip() {
        let (app, _) = app();
        let employer = register(&app, "employer").await;
        let vacancy = create_vacancy(&app, &employer, "Ledger Engineer", 30).await;

        let (_, found) = send(&app, Method::GET, "/api/v1/vacancies/search/ledger", None).await;
        assert_eq!(found.as_array().map(Vec::len), Some(1));

        let uri = format!("/api/v1/vacancies/{vacancy}");
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
