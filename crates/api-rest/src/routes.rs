//! HTTP transport for the procedure registry.
//!
//! - `POST /rpc/{procedure}` with a JSON body calls any procedure.
//! - `GET /rpc/{procedure}?input=<json>` calls queries only.
//! - `GET /health` is a plain liveness probe.
//!
//! Successful calls answer `{"result": {"data": ...}}` with status 200. Procedures run on the
//! blocking thread pool; password hashing and snapshot writes must not hold an async worker.

use crate::error::{RpcError, RpcErrorCode, RpcErrorEnvelope};
use crate::rpc::{ProcedureKind, ProcedureRegistry};
use api_shared::auth::bearer_token;
use api_shared::contracts::{
    ByIdInput, CreateAppointmentInput, CreateMedicalRecordInput, CreateNotificationInput,
    CreateServiceInput, GetAppointmentsByMidwifeInput, GetAppointmentsByPatientInput,
    GetMedicalRecordsByPatientInput, GetNotificationsByUserInput, GetServicesInput, LoginInput,
    MarkNotificationReadInput, NoInput, RegisterMidwifeInput, RegisterPatientInput,
    UpdateAppointmentStatusInput, UpdateServiceInput,
};
use api_shared::{
    Appointment, AppointmentStatus, AuthRes, FieldIssue, HealthRes, HealthService, IssueKind,
    MedicalRecord, Midwife, MidwifeRegistrationRes, Notification, NotificationType, Patient,
    Service, User, UserRole,
};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path as AxumPath, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
    routing::get,
    Router,
};
use midwifery_core::{Caller, ClinicServices};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: ClinicServices,
    pub registry: Arc<ProcedureRegistry>,
}

impl AppState {
    pub fn new(services: ClinicServices) -> Self {
        Self {
            services,
            registry: Arc::new(ProcedureRegistry::new()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RpcResult {
    /// Procedure output.
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RpcSuccess {
    pub result: RpcResult,
}

/// Query string of a `GET` call.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RpcQueryParams {
    /// URL-encoded JSON input; omitted for procedures without input.
    pub input: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, rpc_query, rpc_mutation),
    components(schemas(
        HealthRes,
        RpcSuccess,
        RpcResult,
        RpcErrorEnvelope,
        RpcError,
        RpcErrorCode,
        FieldIssue,
        IssueKind,
        UserRole,
        AppointmentStatus,
        NotificationType,
        User,
        Patient,
        Midwife,
        Service,
        Appointment,
        MedicalRecord,
        Notification,
        AuthRes,
        MidwifeRegistrationRes,
        NoInput,
        ByIdInput,
        LoginInput,
        RegisterPatientInput,
        RegisterMidwifeInput,
        GetServicesInput,
        CreateServiceInput,
        UpdateServiceInput,
        CreateAppointmentInput,
        UpdateAppointmentStatusInput,
        GetAppointmentsByPatientInput,
        GetAppointmentsByMidwifeInput,
        CreateMedicalRecordInput,
        GetMedicalRecordsByPatientInput,
        CreateNotificationInput,
        MarkNotificationReadInput,
        GetNotificationsByUserInput,
    ))
)]
pub struct ApiDoc;

/// Builds the HTTP router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/:procedure", get(rpc_query).post(rpc_mutation))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/rpc/{procedure}",
    params(
        ("procedure" = String, Path, description = "Procedure name, e.g. getServices"),
        RpcQueryParams
    ),
    responses(
        (status = 200, description = "Procedure result", body = RpcSuccess),
        (status = 400, description = "Invalid input", body = RpcErrorEnvelope),
        (status = 404, description = "Unknown procedure or entity", body = RpcErrorEnvelope),
        (status = 405, description = "Mutation called with GET", body = RpcErrorEnvelope)
    )
)]
/// Call a query procedure
#[axum::debug_handler]
async fn rpc_query(
    State(state): State<AppState>,
    AxumPath(procedure): AxumPath<String>,
    headers: HeaderMap,
    query: Result<Query<RpcQueryParams>, QueryRejection>,
) -> Result<Json<RpcSuccess>, RpcError> {
    let payload = match query {
        Err(rejection) => Err(RpcError::new(
            RpcErrorCode::ParseError,
            format!("query string is not valid: {rejection}"),
        )),
        Ok(Query(params)) => match params.input.as_deref().map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(raw) => serde_json::from_str(raw).map_err(RpcError::parse),
        },
    };
    dispatch(state, &procedure, Via::Get, &headers, payload).await
}

#[utoipa::path(
    post,
    path = "/rpc/{procedure}",
    params(
        ("procedure" = String, Path, description = "Procedure name, e.g. createAppointment")
    ),
    responses(
        (status = 200, description = "Procedure result", body = RpcSuccess),
        (status = 400, description = "Invalid input or malformed JSON", body = RpcErrorEnvelope),
        (status = 401, description = "Unknown session token or bad credentials", body = RpcErrorEnvelope),
        (status = 403, description = "Caller may not access the resource", body = RpcErrorEnvelope),
        (status = 404, description = "Unknown procedure or entity", body = RpcErrorEnvelope),
        (status = 409, description = "Conflicting state", body = RpcErrorEnvelope),
        (status = 500, description = "Internal server error", body = RpcErrorEnvelope)
    )
)]
/// Call any procedure with a JSON body
///
/// An empty body is treated like `{}`.
#[axum::debug_handler]
async fn rpc_mutation(
    State(state): State<AppState>,
    AxumPath(procedure): AxumPath<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RpcSuccess>, RpcError> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Null)
    } else {
        serde_json::from_slice(&body).map_err(RpcError::parse)
    };
    dispatch(state, &procedure, Via::Post, &headers, payload).await
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Via {
    Get,
    Post,
}

async fn dispatch(
    state: AppState,
    name: &str,
    via: Via,
    headers: &HeaderMap,
    payload: Result<Value, RpcError>,
) -> Result<Json<RpcSuccess>, RpcError> {
    let procedure = state
        .registry
        .get(name)
        .ok_or_else(|| RpcError::unknown_procedure(name))?;
    let label = procedure.name();

    if via == Via::Get && procedure.kind() == ProcedureKind::Mutation {
        return Err(RpcError::new(
            RpcErrorCode::MethodNotSupported,
            format!("{label} is a mutation and must be called with POST"),
        ));
    }

    let token = if procedure.uses_caller() {
        bearer(headers)?
    } else {
        None
    };
    let payload = payload?;

    let services = state.services;
    let data = tokio::task::spawn_blocking(move || -> Result<Value, RpcError> {
        let caller = match token {
            Some(token) => services.accounts.resolve_token(&token)?,
            None => Caller::Anonymous,
        };
        procedure.invoke(&services, &caller, payload)
    })
    .await
    .map_err(|e| {
        tracing::error!("rpc {} task failed: {:?}", label, e);
        RpcError::new(RpcErrorCode::InternalServerError, "Internal error")
    })??;

    tracing::debug!("rpc {} ok", label);
    Ok(Json(RpcSuccess {
        result: RpcResult { data },
    }))
}

/// Token from the `Authorization` header. No header means an anonymous caller; a header that is
/// not a bearer token is an error.
fn bearer(headers: &HeaderMap) -> Result<Option<String>, RpcError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| {
        RpcError::new(
            RpcErrorCode::Unauthorized,
            "authorization header is not valid text",
        )
    })?;
    let token = bearer_token(value)
        .map_err(|e| RpcError::new(RpcErrorCode::Unauthorized, e.to_string()))?;

    Ok(Some(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use midwifery_core::{ClinicStore, CoreConfig};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        app_with_iterations(10)
    }

    fn app_with_iterations(iterations: u32) -> Router {
        let cfg = CoreConfig::in_memory()
            .with_password_iterations(iterations)
            .expect("iterations should be valid");
        let services = ClinicServices::new(Arc::new(cfg), Arc::new(ClinicStore::in_memory()));
        router(AppState::new(services))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, body)
    }

    fn post(procedure: &str, input: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/rpc/{procedure}"))
            .header("content-type", "application/json");
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder
            .body(Body::from(input.to_string()))
            .expect("request should build")
    }

    fn get_query(procedure: &str, input: Option<&str>) -> Request<Body> {
        let uri = match input {
            Some(raw) => format!("/rpc/{procedure}?input={raw}"),
            None => format!("/rpc/{procedure}"),
        };
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request should build")
    }

    async fn call(app: &Router, procedure: &str, input: Value) -> Value {
        let (status, body) = send(app, post(procedure, input, None)).await;
        assert_eq!(status, StatusCode::OK, "{procedure} failed: {body}");
        body["result"]["data"].clone()
    }

    async fn register_patient(app: &Router, email: &str) -> Value {
        call(
            app,
            "registerPatient",
            json!({
                "email": email,
                "password": "secret1",
                "full_name": "Jane Doe",
                "phone": null,
                "date_of_birth": "1992-04-12",
                "address": null,
                "emergency_contact": null
            }),
        )
        .await
    }

    async fn register_midwife(app: &Router) -> Value {
        call(
            app,
            "registerMidwife",
            json!({
                "email": "mary@clinic.example",
                "password": "secret1",
                "full_name": "Mary Smith",
                "license_number": "MW-001"
            }),
        )
        .await
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = app();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request should build");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_healthcheck_procedure_via_get() {
        let app = app();
        let (status, body) = send(&app, get_query("healthcheck", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_booking_scenario_end_to_end() {
        let app = app();

        let service = call(
            &app,
            "createService",
            json!({
                "name": "Prenatal Checkup",
                "description": null,
                "duration_minutes": 60,
                "price": 50.00
            }),
        )
        .await;
        assert_eq!(service["is_active"], true);

        let patient_user = register_patient(&app, "jane@clinic.example").await;
        let patients = call(&app, "getAllPatients", json!({})).await;
        let patient_id = patients[0]["id"].clone();
        assert_eq!(patients[0]["user_id"], patient_user["user"]["id"]);

        let midwife = register_midwife(&app).await;
        let midwife_id = midwife["midwife"]["id"].clone();

        let appointment = call(
            &app,
            "createAppointment",
            json!({
                "patient_id": patient_id,
                "midwife_id": midwife_id,
                "service_id": service["id"],
                "appointment_date": "2030-03-01T10:00:00Z",
                "notes": null
            }),
        )
        .await;
        assert_eq!(appointment["status"], "pending");

        let confirmed = call(
            &app,
            "updateAppointmentStatus",
            json!({"id": appointment["id"], "status": "confirmed"}),
        )
        .await;
        assert_eq!(confirmed["status"], "confirmed");

        let (status, body) = send(
            &app,
            post(
                "updateAppointmentStatus",
                json!({"id": appointment["id"], "status": "pending"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let inbox = call(
            &app,
            "getNotificationsByUser",
            json!({"user_id": patient_user["user"]["id"]}),
        )
        .await;
        assert_eq!(inbox[0]["type"], "appointment_confirmed");
        assert_eq!(inbox.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_validation_failure_reports_path_and_kind() {
        let app = app();
        let (status, body) = send(
            &app,
            post(
                "createService",
                json!({"name": "Scan", "duration_minutes": 30, "price": -1}),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["issues"][0]["path"], "price");
        assert_eq!(body["error"]["issues"][0]["kind"], "out_of_range");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parse_error() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/rpc/createService")
            .body(Body::from("{ not json"))
            .expect("request should build");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_procedure_and_mutation_via_get() {
        let app = app();

        let (status, body) = send(&app, post("deleteEverything", json!({}), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, body) = send(&app, get_query("createService", None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["code"], "METHOD_NOT_SUPPORTED");
    }

    #[tokio::test]
    async fn test_get_query_reads_input_parameter() {
        let app = app();
        call(
            &app,
            "createService",
            json!({"name": "Scan", "duration_minutes": 30, "price": 80}),
        )
        .await;

        let (status, body) = send(
            &app,
            get_query("getServices", Some("%7B%22include_inactive%22%3Atrue%7D")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["data"][0]["name"], "Scan");
    }

    #[tokio::test]
    async fn test_bearer_token_scopes_medical_records() {
        let app = app();
        let ann = register_patient(&app, "ann@clinic.example").await;
        let bea = register_patient(&app, "bea@clinic.example").await;
        let midwife = register_midwife(&app).await;

        let patients = call(&app, "getAllPatients", json!({})).await;
        let (ann_id, bea_id) = (patients[0]["id"].clone(), patients[1]["id"].clone());
        assert_eq!(patients[0]["user_id"], ann["user"]["id"]);

        call(
            &app,
            "createMedicalRecord",
            json!({
                "patient_id": bea_id,
                "midwife_id": midwife["midwife"]["id"],
                "visit_date": "2025-05-01"
            }),
        )
        .await;

        let ann_token = ann["token"].as_str().expect("token").to_string();
        let (status, body) = send(
            &app,
            post(
                "getMedicalRecordsByPatient",
                json!({"patient_id": bea_id}),
                Some(&ann_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, body) = send(
            &app,
            post("getAllMedicalRecords", json!({}), Some(&ann_token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["data"], json!([]));

        let bea_token = bea["token"].as_str().expect("token").to_string();
        let (status, body) = send(
            &app,
            post(
                "getMedicalRecordsByPatient",
                json!({"patient_id": bea_id}),
                Some(&bea_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["data"][0]["patient_id"], bea_id);

        let (status, _) = send(
            &app,
            post(
                "getMedicalRecordsByPatient",
                json!({"patient_id": ann_id}),
                Some("forged-token"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_query_string_uses_error_envelope() {
        let app = app();
        let (status, body) = send(
            &app,
            get_query("getServices", Some("%7B%7D&input=%7B%7D")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_stale_token_does_not_block_public_procedures() {
        let app = app();
        register_patient(&app, "jane@clinic.example").await;

        let (status, body) = send(
            &app,
            post(
                "login",
                json!({"email": "jane@clinic.example", "password": "secret1"}),
                Some("token-from-before-restart"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let request = Request::builder()
            .method("GET")
            .uri("/rpc/getServices")
            .header("Authorization", "Basic abc")
            .body(Body::empty())
            .expect("request should build");
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            post("getAllMedicalRecords", json!({}), Some("token-from-before-restart")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_password_hashing_does_not_hold_the_runtime() {
        let app = app_with_iterations(50_000);
        register_patient(&app, "jane@clinic.example").await;

        let login = tokio::spawn({
            let app = app.clone();
            async move {
                send(
                    &app,
                    post(
                        "login",
                        json!({"email": "jane@clinic.example", "password": "secret1"}),
                        None,
                    ),
                )
                .await
            }
        });
        tokio::task::yield_now().await;

        let health = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request should build");
        let (status, _) = send(&app, health).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            !login.is_finished(),
            "health should answer while the login hash is still running"
        );

        let (status, _) = login.await.expect("login task should join");
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let app = app();
        register_patient(&app, "jane@clinic.example").await;

        let auth = call(
            &app,
            "login",
            json!({"email": "Jane@Clinic.Example", "password": "secret1"}),
        )
        .await;
        assert_eq!(auth["user"]["email"], "jane@clinic.example");
        assert!(auth["token"].as_str().is_some_and(|t| !t.is_empty()));

        let (status, body) = send(
            &app,
            post(
                "login",
                json!({"email": "jane@clinic.example", "password": "wrong-pass"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "invalid email or password");
    }
}
