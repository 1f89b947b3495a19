//! API service routes

use attendance::analytics::ProjectionQuery;
use attendance::error::{AttendanceError, Missing};
use attendance::models::{ClassInfo, IssueSessionCode, MarkRequest, NewClass, normalize_id};
use attendance::register::RegisterFilter;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    export,
    models::{
        AnalysisQuery, HistoryQuery, IssueCodeRequest, IssuedCodeResponse, MarkAttendanceResponse,
        ProjectionParams, RegisterQuery,
    },
    validation::{validate_device_fingerprint, validate_roll_no, validate_session_code},
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let teacher_routes = Router::new()
        .route("/session-codes", post(issue_session_code))
        .route("/active-codes/:teacher_id", get(active_codes));

    let student_routes = Router::new()
        .route("/check-code/:code", get(check_code))
        .route("/mark-attendance", post(mark_attendance))
        .route("/attendance/:roll_no", get(attendance_history))
        .route("/attendance/:roll_no/export", get(export_attendance));

    let analysis_routes = Router::new()
        .route("/:roll_no", get(attendance_analysis))
        .route("/:roll_no/projection", get(attendance_projection));

    let class_routes = Router::new()
        .route("/", post(create_class))
        .route("/teacher/:teacher_id", get(teacher_classes))
        .route("/:class_id/register", get(class_register));

    Router::new()
        .route("/health", get(health_check))
        .nest("/teacher", teacher_routes)
        .nest("/student", student_routes)
        .nest("/attendance-analysis", analysis_routes)
        .nest("/classes", class_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "attendance-api",
            "database": database,
        })),
    )
}

/// Issue a session code for a class meeting
pub async fn issue_session_code(
    State(state): State<AppState>,
    Json(payload): Json<IssueCodeRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .registry
        .issue(IssueSessionCode::from(payload))
        .await?;

    let response = IssuedCodeResponse {
        valid_minutes: (session.end_time - session.start_time).num_minutes(),
        code: session.code,
        subject: session.subject,
        start_time: session.start_time,
        end_time: session.end_time,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Unexpired codes of a teacher
pub async fn active_codes(
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let codes = state
        .registry
        .active_for_teacher(&teacher_id, Utc::now())
        .await?;

    Ok(Json(json!({ "active_codes": codes })))
}

/// Look up a session code
pub async fn check_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    validate_session_code(&code)?;
    let view = state.registry.check(&code).await?;

    Ok(Json(view))
}

/// Mark attendance against a session code
pub async fn mark_attendance(
    State(state): State<AppState>,
    Json(payload): Json<MarkRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_roll_no(&payload.student_id)?;
    validate_session_code(&payload.code)?;
    validate_device_fingerprint(&payload.device_fingerprint)?;

    let record = state.marking.mark(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(MarkAttendanceResponse {
            message: "Attendance marked successfully".to_string(),
            roll_no: record.student_id,
            subject: record.subject,
            marked_at: record.marked_at,
        }),
    ))
}

/// Attendance history of a student
pub async fn attendance_history(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    validate_roll_no(&roll_no)?;
    let entries = state
        .analytics
        .history(&roll_no, query.subject.as_deref())
        .await?;

    Ok(Json(json!({
        "roll_no": normalize_id(&roll_no),
        "records": entries,
    })))
}

/// Attendance history as a CSV download
pub async fn export_attendance(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> ApiResult<impl IntoResponse> {
    validate_roll_no(&roll_no)?;
    let entries = state.analytics.history(&roll_no, None).await?;
    if entries.is_empty() {
        return Err(AttendanceError::from(Missing::Records).into());
    }

    let body = export::history_csv(&entries).map_err(|e| ApiError::Export(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=attendance_{}.csv",
        normalize_id(&roll_no)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Monthly attendance summary
pub async fn attendance_analysis(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> ApiResult<impl IntoResponse> {
    validate_roll_no(&roll_no)?;
    let summary = state
        .analytics
        .summarize(&roll_no, query.month, query.year, query.subject.as_deref())
        .await?;

    Ok(Json(summary))
}

/// Classes needed to reach a target percentage
pub async fn attendance_projection(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
    Query(params): Query<ProjectionParams>,
) -> ApiResult<impl IntoResponse> {
    validate_roll_no(&roll_no)?;
    let query = ProjectionQuery {
        subject: params.subject,
        target_percentage: params.target,
        from: params.from,
        to: params.to,
    };
    let projection = state.analytics.project_needed(&roll_no, &query).await?;

    Ok(Json(projection))
}

/// Create a class
pub async fn create_class(
    State(state): State<AppState>,
    Json(payload): Json<NewClass>,
) -> ApiResult<impl IntoResponse> {
    if payload.teacher_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Teacher id is required".to_string()));
    }
    if payload.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("Subject is required".to_string()));
    }

    let class = ClassInfo::from_new(payload, Utc::now());
    state.roster.create_class(&class).await.map_err(|e| {
        tracing::error!("Failed to create class: {}", e);
        ApiError::from(e)
    })?;
    tracing::info!("Created class {} for teacher {}", class.id, class.teacher_id);

    Ok((StatusCode::CREATED, Json(class)))
}

/// Classes of a teacher
pub async fn teacher_classes(
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let classes = state
        .roster
        .classes_for_teacher(&normalize_id(&teacher_id))
        .await?;

    Ok(Json(classes))
}

/// Present/absent register of a class
pub async fn class_register(
    State(state): State<AppState>,
    Path(class_id): Path<Uuid>,
    Query(query): Query<RegisterQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = RegisterFilter::try_from(query)?;
    let register = state.register.build(class_id, filter).await?;

    Ok(Json(register))
}
