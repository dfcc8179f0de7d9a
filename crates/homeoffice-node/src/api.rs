//! HTTP API for the home office node.

use crate::error::Error;
use crate::models::{
    AuditEntry, CandidateView, GrantStanding, HomeOfficeGrant, Nomination, NominationView, Period,
    TallyView, Vote, VoteView,
};
use crate::node::NodeState;
use crate::service::{CloseRequest, ClosureSummary, GrantFilter, NominationRequest, OpenPeriodRequest, VoteRequest};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use homeoffice_tally::{ClosureCheck, ClosureReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

type AppState = Arc<NodeState>;
type ApiResult<T> = Result<Json<T>, Error>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health (at root and under /api/v1 for compatibility)
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        .route("/ready", get(ready))
        // Periods
        .route("/api/v1/periods", get(list_periods).post(open_period))
        .route("/api/v1/periods/current", get(current_period))
        .route("/api/v1/periods/:id", get(get_period))
        .route("/api/v1/periods/:id/close", post(close_period))
        .route("/api/v1/periods/:id/closure-check", get(closure_check))
        .route("/api/v1/periods/:id/results", get(period_results))
        .route("/api/v1/periods/:id/nominations", get(period_nominations))
        .route("/api/v1/periods/:id/candidates", get(period_candidates))
        .route("/api/v1/periods/:id/votes", get(period_votes))
        // Nominations and votes
        .route("/api/v1/nominations", post(create_nomination))
        .route("/api/v1/nominations/:id", delete(withdraw_nomination))
        .route("/api/v1/votes", post(cast_vote))
        // Grants
        .route("/api/v1/users/:id/grants", get(user_grants))
        .route("/api/v1/leaderboard/grants", get(grant_leaderboard))
        // Audit
        .route("/api/v1/audit", get(recent_audit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Errors ---

impl Error {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::InvalidInput(_)
            | Error::InvalidNominee(_)
            | Error::InvalidCandidate(_)
            | Error::DuplicateNomination
            | Error::ValidationRequired(_) => StatusCode::BAD_REQUEST,
            Error::InvalidState(_) | Error::PeriodClosed(_) => StatusCode::CONFLICT,
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    error: &'static str,
    #[serde(flatten)]
    report: &'a ClosureReport,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Error::ValidationRequired(report) => (
                status,
                Json(ValidationBody {
                    error: self.kind(),
                    report,
                }),
            )
                .into_response(),
            _ => {
                if status.is_server_error() {
                    tracing::error!("Request failed: {}", self);
                }
                // Internal details stay in the log.
                let message = if status.is_server_error() {
                    "internal error".to_string()
                } else {
                    self.to_string()
                };
                (
                    status,
                    Json(ErrorBody {
                        error: self.kind(),
                        message,
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Unwrap a JSON body, reporting malformed input as `invalid_input`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::InvalidInput(rejection.body_text()))
}

#[derive(Debug, Serialize)]
struct Success {
    success: bool,
}

const SUCCESS: Success = Success { success: true };

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    state
        .service
        .list_periods()
        .map(|_| "OK")
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

// --- Period endpoints ---

async fn list_periods(State(state): State<AppState>) -> ApiResult<Vec<Period>> {
    Ok(Json(state.service.list_periods()?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OpenPeriodBody {
    week_label: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    #[serde(default)]
    actor_id: Option<Uuid>,
}

async fn open_period(
    State(state): State<AppState>,
    payload: Result<Json<OpenPeriodBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Period>), Error> {
    let req = body(payload)?;
    let period = state.service.open_period(
        OpenPeriodRequest {
            week_label: req.week_label,
            start_date: req.start_date,
            end_date: req.end_date,
        },
        req.actor_id,
    )?;
    Ok((StatusCode::CREATED, Json(period)))
}

async fn current_period(State(state): State<AppState>) -> ApiResult<Option<Period>> {
    Ok(Json(state.service.current_period()?))
}

async fn get_period(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Period> {
    Ok(Json(state.service.get_period(id)?))
}

#[derive(Debug, Serialize)]
struct CloseResponse {
    success: bool,
    #[serde(flatten)]
    summary: ClosureSummary,
}

/// An empty close body means an unforced close; anything else must parse.
fn close_request(raw: &[u8]) -> Result<CloseRequest, Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(CloseRequest::default());
    }
    body(Json::from_bytes(raw))
}

async fn close_period(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    raw: Bytes,
) -> ApiResult<CloseResponse> {
    let request = close_request(&raw)?;
    let summary = state.service.close_period(id, request)?;
    Ok(Json(CloseResponse {
        success: true,
        summary,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClosureCheckResponse {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ClosureReport>,
}

async fn closure_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ClosureCheckResponse> {
    let response = match state.service.preview_closure(id)? {
        ClosureCheck::Ready => ClosureCheckResponse {
            ready: true,
            report: None,
        },
        ClosureCheck::ValidationRequired(report) => ClosureCheckResponse {
            ready: false,
            report: Some(report),
        },
    };
    Ok(Json(response))
}

async fn period_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TallyView>> {
    Ok(Json(state.service.results(id)?))
}

async fn period_nominations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<NominationView>> {
    Ok(Json(state.service.list_nominations(id)?))
}

async fn period_candidates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<CandidateView>> {
    Ok(Json(state.service.list_candidates(id)?))
}

async fn period_votes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<VoteView>> {
    Ok(Json(state.service.list_votes(id)?))
}

// --- Nomination endpoints ---

async fn create_nomination(
    State(state): State<AppState>,
    payload: Result<Json<NominationRequest>, JsonRejection>,
) -> ApiResult<NominationView> {
    Ok(Json(state.service.nominate(body(payload)?)?))
}

async fn withdraw_nomination(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Success> {
    let _: Nomination = state.service.withdraw(id)?;
    Ok(Json(SUCCESS))
}

// --- Vote endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct VoteBody {
    period_id: Uuid,
    voter_id: Uuid,
    target_user_id: Uuid,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    remove: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum VoteResponse {
    Recorded(Vote),
    Removed(Success),
}

async fn cast_vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteBody>, JsonRejection>,
) -> ApiResult<VoteResponse> {
    let req = body(payload)?;
    if req.remove {
        state
            .service
            .retract_vote(req.period_id, req.voter_id, req.target_user_id)?;
        return Ok(Json(VoteResponse::Removed(SUCCESS)));
    }

    let vote = state.service.cast_vote(VoteRequest {
        period_id: req.period_id,
        voter_id: req.voter_id,
        target_user_id: req.target_user_id,
        comment: req.comment,
    })?;
    Ok(Json(VoteResponse::Recorded(vote)))
}

// --- Grant endpoints ---

#[derive(Debug, Deserialize)]
struct GrantsQuery {
    available: Option<bool>,
}

async fn user_grants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<GrantsQuery>,
) -> ApiResult<Vec<HomeOfficeGrant>> {
    let filter = GrantFilter::from_available(query.available);
    Ok(Json(state.service.grants_for(id, filter)?))
}

async fn grant_leaderboard(State(state): State<AppState>) -> ApiResult<Vec<GrantStanding>> {
    Ok(Json(state.service.grant_leaderboard()?))
}

// --- Audit endpoints ---

async fn recent_audit(State(state): State<AppState>) -> ApiResult<Vec<AuditEntry>> {
    Ok(Json(state.service.recent_audit()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::service::Service;
    use crate::storage::Storage;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::NaiveDate;
    use homeoffice_tally::{Actor, ClosureProblem, ProblemKind, Role, RolePolicy};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn json_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&bytes).unwrap()
    }

    struct TestApp {
        router: Router,
        service: Arc<Service>,
        period: Period,
        _dir: TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let storage = Arc::new(Storage::open(dir.path()).unwrap());
            let service = Arc::new(Service::new(storage, RolePolicy::default()));
            let period = service
                .open_period(
                    OpenPeriodRequest {
                        week_label: "2024-W40".into(),
                        start_date: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
                        end_date: NaiveDate::from_ymd_opt(2024, 10, 4).unwrap(),
                    },
                    None,
                )
                .unwrap();
            let router = build_router(Arc::new(NodeState {
                service: Arc::clone(&service),
            }));
            Self {
                router,
                service,
                period,
                _dir: dir,
            }
        }

        fn user(&self, name: &str, role: Role) -> User {
            let user = User::new(name.into(), format!("{}@example.com", name.to_lowercase()), role);
            self.service.put_user(&user).unwrap();
            user
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            (status, json_of(response).await)
        }

        async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            let request = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(request).await
        }

        fn close_uri(&self) -> String {
            format!("/api/v1/periods/{}/close", self.period.id)
        }

        async fn nominate(&self, nominator: &User, nominee: &User) -> (StatusCode, Value) {
            self.post(
                "/api/v1/nominations",
                json!({
                    "periodId": self.period.id,
                    "nominatorId": nominator.id,
                    "nomineeId": nominee.id,
                    "reason": "Covered the on-call rotation",
                }),
            )
            .await
        }
    }

    #[tokio::test]
    async fn malformed_close_body_is_rejected() {
        let app = TestApp::new();

        for body in [json!({ "force": true, "reason": "x" }), json!({ "force": "yes" })] {
            let (status, json) = app.post(&app.close_uri(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "invalid_input");
        }
        assert!(!app.service.get_period(app.period.id).unwrap().is_closed());
    }

    #[tokio::test]
    async fn empty_close_body_validates_then_force_closes() {
        let app = TestApp::new();
        let lea = app.user("Lea", Role::Leader);

        let (status, json) = app
            .send(Request::post(app.close_uri()).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_required");
        assert_eq!(json["canForce"], true);

        // No content type, but the body still says force.
        let forced = json!({ "force": true, "actorId": lea.id }).to_string();
        let (status, json) = app
            .send(Request::post(app.close_uri()).body(Body::from(forced)).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["forced"], true);
        assert_eq!(json["period"]["status"], "CLOSED");
        assert_eq!(json["grantsIssued"], 0);

        let (status, json) = app.post(&app.close_uri(), json!({ "force": true })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "invalid_state");
    }

    #[tokio::test]
    async fn vote_and_remove_over_http() {
        let app = TestApp::new();
        let lea = app.user("Lea", Role::Leader);
        let max = app.user("Max", Role::Member);

        let (status, json) = app.nominate(&lea, &max).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["nominee"]["name"], "Max");

        let vote = json!({
            "periodId": app.period.id,
            "voterId": lea.id,
            "targetUserId": max.id,
        });
        let (status, json) = app.post("/api/v1/votes", vote.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["voterId"], lea.id.to_string());

        let votes_uri = format!("/api/v1/periods/{}/votes", app.period.id);
        let (_, listed) = app
            .send(Request::get(&votes_uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(listed[0]["voter"]["name"], "Lea");

        let mut removal = vote;
        removal["remove"] = json!(true);
        let (status, json) = app.post("/api/v1/votes", removal).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true }));

        let (_, listed) = app
            .send(Request::get(&votes_uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn nomination_errors_map_to_statuses() {
        let app = TestApp::new();
        let ana = app.user("Ana", Role::Member);
        let max = app.user("Max", Role::Member);
        let lea = app.user("Lea", Role::Leader);

        let (status, json) = app.nominate(&ana, &max).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");

        let (status, json) = app
            .post(
                "/api/v1/nominations",
                json!({
                    "periodId": app.period.id,
                    "nominatorId": lea.id,
                    "nomineeId": max.id,
                    "reason": "   ",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_input");

        let missing = format!("/api/v1/nominations/{}", Uuid::new_v4());
        let (status, json) = app
            .send(Request::delete(missing).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");

        let (status, json) = app.nominate(&lea, &max).await;
        assert_eq!(status, StatusCode::OK);
        let withdraw = format!("/api/v1/nominations/{}", json["id"].as_str().unwrap());
        let (status, json) = app
            .send(Request::delete(withdraw).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true }));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(Error::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::DuplicateNomination.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::InvalidNominee("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::PeriodClosed(Uuid::nil()).status(), StatusCode::CONFLICT);
        assert_eq!(Error::InvalidState("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Storage("disk".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn validation_body_is_flat() {
        let report = ClosureReport {
            problems: vec![ClosureProblem {
                kind: ProblemKind::MissingVotes,
                message: "1 user(s) have not voted".into(),
                users: vec![Actor {
                    id: Uuid::from_u128(9),
                    name: "Lea".into(),
                    role: Role::Leader,
                }],
            }],
            summary: "Missing: 1 votes, 0 nominations".into(),
            can_force: true,
        };

        let response = Error::ValidationRequired(report).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_of(response).await;
        assert_eq!(json["error"], "validation_required");
        assert_eq!(json["canForce"], true);
        assert_eq!(json["summary"], "Missing: 1 votes, 0 nominations");
        assert_eq!(json["validationErrors"][0]["type"], "missing_votes");
        assert_eq!(json["validationErrors"][0]["users"][0]["role"], "LEADER");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = Error::Storage("corrupted block 42".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = json_of(response).await;
        assert_eq!(json["error"], "internal");
        assert_eq!(json["message"], "internal error");
    }

    #[test]
    fn vote_body_rejects_unknown_fields() {
        let body = serde_json::json!({
            "periodId": Uuid::nil(),
            "voterId": Uuid::nil(),
            "targetUserId": Uuid::nil(),
            "weight": 5,
        });
        assert!(serde_json::from_value::<VoteBody>(body).is_err());
    }
}
