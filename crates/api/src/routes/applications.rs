//! Request lifecycle routes: admission, approval, rejection, and undo.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{middleware::AuthUser, AppState};
use kintai_core::workflow::{
    transaction_code, ApprovalStage, DaySession, FlowType, RequestKind, WorkflowError,
};
use kintai_db::{
    entities::{applications, sea_orm_active_enums as db_enums},
    repositories::{
        application::{ApplicationRepository, CreateApplicationInput, CreatedApplication},
        directory::DirectoryRepository,
        undo::UndoRepository,
        workflow::WorkflowRepository,
    },
};

/// Creates the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/applications", post(create_application).get(list_applications))
        .route("/applications/pending", get(pending_applications))
        .route("/applications/{id}", get(get_application))
        .route("/applications/{id}/approve", post(approve_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/applications/{id}/cancellation", post(create_cancellation))
        .route("/applications/{id}/reversal", post(create_reversal))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for admitting a new request.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    /// Applicant; defaults to the authenticated user. Only paper-flow
    /// entries may name someone else.
    pub user_id: Option<i64>,
    /// Request kind: leave, overtime, or `outdoor_work`.
    pub kind: String,
    /// Leave type id; required for leave requests.
    pub leave_type_id: Option<i64>,
    /// Balance year; derived from the start date when omitted.
    pub year: Option<i32>,
    /// Inclusive range start.
    pub start_date: chrono::NaiveDate,
    /// Inclusive range end.
    pub end_date: chrono::NaiveDate,
    /// Half-day marker on the start date: am or pm.
    pub start_session: Option<String>,
    /// Half-day marker on the end date: am or pm.
    pub end_session: Option<String>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Admission path: `e_flow` (default) or `paper_flow`.
    pub flow_type: Option<String>,
}

/// Request body for approving a stage.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// The stage the client believes it is acting on; checked against the
    /// derived stage when present.
    pub stage: Option<String>,
    /// Optional remarks stamped into the stage slot.
    pub remarks: Option<String>,
}

/// Request body for rejecting a request.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Mandatory rejection reason.
    pub reason: String,
}

/// Request body for the undo paths.
#[derive(Debug, Deserialize)]
pub struct UndoRequest {
    /// Mandatory reason.
    pub reason: String,
}

/// One stage slot in a response.
#[derive(Debug, Serialize)]
pub struct StageView {
    /// Stage name.
    pub stage: &'static str,
    /// Snapshot assignee, or the actor who completed the stage.
    pub assignee_id: Option<i64>,
    /// Delegation group authorized for the stage.
    pub group_id: Option<i64>,
    /// Completion timestamp.
    pub acted_at: Option<String>,
    /// Remarks left by the actor.
    pub remarks: Option<String>,
}

/// Response for a request row.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    /// Row id.
    pub id: i64,
    /// Presentation code, e.g. `LV-000042`.
    pub code: String,
    /// Applicant.
    pub user_id: i64,
    /// Request kind.
    pub kind: &'static str,
    /// Leave type, for leave requests.
    pub leave_type_id: Option<i64>,
    /// Balance year.
    pub year: i32,
    /// Inclusive range start.
    pub start_date: chrono::NaiveDate,
    /// Inclusive range end.
    pub end_date: chrono::NaiveDate,
    /// Half-day marker on the start date.
    pub start_session: Option<&'static str>,
    /// Half-day marker on the end date.
    pub end_session: Option<&'static str>,
    /// Charged days.
    pub total_days: String,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Lifecycle status.
    pub status: &'static str,
    /// Derived current stage.
    pub current_stage: &'static str,
    /// Admission path.
    pub flow_type: &'static str,
    /// The four stage slots.
    pub stages: Vec<StageView>,
    /// Rejection reason, when rejected.
    pub rejection_reason: Option<String>,
    /// Cancellation reason, when cancelled.
    pub cancellation_reason: Option<String>,
    /// True for cancellation-request rows.
    pub is_cancellation_request: bool,
    /// The original a cancellation request targets.
    pub original_application_id: Option<i64>,
    /// True for negative-days reversal rows.
    pub is_reversal_transaction: bool,
    /// The original a reversal targets.
    pub reversal_of_application_id: Option<i64>,
    /// True once an approved reversal has been applied to this row.
    pub is_reversed: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/applications` - Admit a new request.
async fn create_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateApplicationRequest>,
) -> impl IntoResponse {
    let Some(kind) = RequestKind::parse(&payload.kind) else {
        return validation_response("kind must be leave, overtime, or outdoor_work");
    };
    let flow_type = match payload.flow_type.as_deref() {
        None => FlowType::EFlow,
        Some(s) => match FlowType::parse(s) {
            Some(f) => f,
            None => return validation_response("flow_type must be e_flow or paper_flow"),
        },
    };
    let start_session = match parse_session(payload.start_session.as_deref()) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let end_session = match parse_session(payload.end_session.as_deref()) {
        Ok(s) => s,
        Err(response) => return response,
    };

    let input = CreateApplicationInput {
        user_id: payload.user_id.unwrap_or_else(|| auth.user_id()),
        kind,
        leave_type_id: payload.leave_type_id,
        year: payload.year,
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_session,
        end_session,
        reason: payload.reason,
        flow_type,
    };

    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.create(auth.user_id(), input).await {
        Ok(created) => {
            info!(
                application_id = created.application.id,
                user_id = created.application.user_id,
                "Request admitted"
            );
            notify_admission(&state, &created);
            (
                StatusCode::CREATED,
                Json(application_to_response(&created.application)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to admit request");
            workflow_error_response(&e)
        }
    }
}

/// GET `/applications` - List the authenticated user's requests.
async fn list_applications(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_for_user(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<ApplicationResponse> =
                rows.iter().map(application_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list requests");
            workflow_error_response(&e)
        }
    }
}

/// GET `/applications/pending` - Requests waiting on the authenticated user.
async fn pending_applications(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.pending_for_actor(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<ApplicationResponse> =
                rows.iter().map(application_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list pending requests");
            workflow_error_response(&e)
        }
    }
}

/// GET `/applications/{id}` - Fetch one request.
async fn get_application(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(Some(row)) => (StatusCode::OK, Json(application_to_response(&row))).into_response(),
        Ok(None) => workflow_error_response(&WorkflowError::ApplicationNotFound(id)),
        Err(e) => {
            error!(error = %e, "Failed to fetch request");
            workflow_error_response(&e)
        }
    }
}

/// POST `/applications/{id}/approve` - Advance a pending request one stage.
async fn approve_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ApproveRequest>,
) -> impl IntoResponse {
    let claimed_stage = match payload.stage.as_deref() {
        None => None,
        Some(s) => match ApprovalStage::parse(s) {
            Some(stage) => Some(stage),
            None => return validation_response("unknown approval stage"),
        },
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .approve_application(id, auth.user_id(), claimed_stage, payload.remarks)
        .await
    {
        Ok(result) => {
            info!(
                application_id = id,
                actor_id = auth.user_id(),
                final_approval = result.outcome.is_final(),
                "Stage approved"
            );
            notify_approval(&state, &result.application, &result.next_stage_notify);
            (
                StatusCode::OK,
                Json(application_to_response(&result.application)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, application_id = id, "Failed to approve stage");
            workflow_error_response(&e)
        }
    }
}

/// POST `/applications/{id}/reject` - Terminally reject a pending request.
async fn reject_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RejectRequest>,
) -> impl IntoResponse {
    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .reject_application(id, auth.user_id(), &payload.reason)
        .await
    {
        Ok(application) => {
            info!(application_id = id, actor_id = auth.user_id(), "Request rejected");
            notify_rejection(&state, &application);
            (StatusCode::OK, Json(application_to_response(&application))).into_response()
        }
        Err(e) => {
            error!(error = %e, application_id = id, "Failed to reject request");
            workflow_error_response(&e)
        }
    }
}

/// POST `/applications/{id}/cancellation` - File a cancellation request
/// against an approved request.
async fn create_cancellation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UndoRequest>,
) -> impl IntoResponse {
    let repo = UndoRepository::new((*state.db).clone());
    match repo
        .create_cancellation_request(id, auth.user_id(), &payload.reason)
        .await
    {
        Ok(created) => {
            info!(
                original_id = id,
                cancellation_request_id = created.application.id,
                "Cancellation request filed"
            );
            notify_admission(&state, &created);
            notify_finalized(&state, &created.application);
            (
                StatusCode::CREATED,
                Json(application_to_response(&created.application)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, original_id = id, "Failed to file cancellation request");
            workflow_error_response(&e)
        }
    }
}

/// POST `/applications/{id}/reversal` - Create a reversal row against an
/// approved leave request.
async fn create_reversal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UndoRequest>,
) -> impl IntoResponse {
    let repo = UndoRepository::new((*state.db).clone());
    match repo
        .create_reversal(id, auth.user_id(), &payload.reason)
        .await
    {
        Ok(created) => {
            info!(
                original_id = id,
                reversal_id = created.application.id,
                "Reversal created"
            );
            notify_admission(&state, &created);
            notify_finalized(&state, &created.application);
            (
                StatusCode::CREATED,
                Json(application_to_response(&created.application)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, original_id = id, "Failed to create reversal");
            workflow_error_response(&e)
        }
    }
}

// ============================================================================
// Notifications (fire-and-forget)
// ============================================================================

/// Notifies the first-stage assignee of a newly admitted pending request.
fn notify_admission(state: &AppState, created: &CreatedApplication) {
    if created.application.status != db_enums::ApplicationStatus::Pending {
        return;
    }
    let Some(first) = created.assignments.first() else {
        return;
    };

    let code = code_of(&created.application);
    let stage = first.stage.as_str().to_string();
    let assignee_id = first.assignee_id;
    let db = state.db.clone();
    let email = state.email_service.clone();

    tokio::spawn(async move {
        let directory = DirectoryRepository::new((*db).clone());
        match directory.user_emails(&[assignee_id]).await {
            Ok(recipients) => {
                if let Err(e) = email.notify_stage_assignees(&recipients, &code, &stage).await {
                    warn!(error = %e, code, "Stage notification failed");
                }
            }
            Err(e) => warn!(error = %e, code, "Could not resolve notification recipients"),
        }
    });
}

/// Notifies the next stage's group members, or the applicant on final
/// approval.
fn notify_approval(state: &AppState, application: &applications::Model, next_notify: &[i64]) {
    if application.status == db_enums::ApplicationStatus::Approved {
        notify_finalized(state, application);
        return;
    }

    let code = code_of(application);
    let db = state.db.clone();
    let email = state.email_service.clone();
    let stage = stage_str(&application.current_approval_stage).to_string();
    let notify = next_notify.to_vec();
    tokio::spawn(async move {
        let directory = DirectoryRepository::new((*db).clone());
        match directory.user_emails(&notify).await {
            Ok(recipients) => {
                if let Err(e) = email.notify_stage_assignees(&recipients, &code, &stage).await {
                    warn!(error = %e, code, "Stage notification failed");
                }
            }
            Err(e) => warn!(error = %e, code, "Could not resolve notification recipients"),
        }
    });
}

/// Notifies the applicant of a fully approved row: completion for ordinary
/// requests, cancellation of the original for cancellation requests.
fn notify_finalized(state: &AppState, application: &applications::Model) {
    if application.status != db_enums::ApplicationStatus::Approved {
        return;
    }

    let is_cancellation = application.is_cancellation_request;
    let code = match application.original_application_id {
        // The cancelled original is what the applicant recognizes.
        Some(original_id) if is_cancellation => {
            transaction_code(kind_of(application), original_id)
        }
        _ => code_of(application),
    };
    let reason = application.reason.clone().unwrap_or_default();
    let user_id = application.user_id;
    let db = state.db.clone();
    let email = state.email_service.clone();

    tokio::spawn(async move {
        let directory = DirectoryRepository::new((*db).clone());
        match directory.user_emails(&[user_id]).await {
            Ok(recipients) => {
                for to in &recipients {
                    let sent = if is_cancellation {
                        email.notify_cancelled(to, &code, &reason).await
                    } else {
                        email.notify_completed(to, &code).await
                    };
                    if let Err(e) = sent {
                        warn!(error = %e, code, "Completion notification failed");
                    }
                }
            }
            Err(e) => warn!(error = %e, code, "Could not resolve notification recipients"),
        }
    });
}

/// Notifies the applicant that their request was rejected.
fn notify_rejection(state: &AppState, application: &applications::Model) {
    let code = code_of(application);
    let reason = application.rejection_reason.clone().unwrap_or_default();
    let user_id = application.user_id;
    let db = state.db.clone();
    let email = state.email_service.clone();

    tokio::spawn(async move {
        let directory = DirectoryRepository::new((*db).clone());
        match directory.user_emails(&[user_id]).await {
            Ok(recipients) => {
                for to in &recipients {
                    if let Err(e) = email.notify_rejected(to, &code, &reason).await {
                        warn!(error = %e, code, "Rejection notification failed");
                    }
                }
            }
            Err(e) => warn!(error = %e, code, "Could not resolve notification recipients"),
        }
    });
}

// ============================================================================
// Helper Functions
// ============================================================================

fn validation_response(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "VALIDATION_ERROR",
            "message": message
        })),
    )
        .into_response()
}

#[allow(clippy::result_large_err)]
fn parse_session(s: Option<&str>) -> Result<Option<DaySession>, axum::response::Response> {
    match s {
        None => Ok(None),
        Some(s) => DaySession::parse(s)
            .map(Some)
            .ok_or_else(|| validation_response("session must be am or pm")),
    }
}

fn workflow_error_response(e: &WorkflowError) -> axum::response::Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({
        "error": e.error_code(),
        "message": e.to_string(),
    });
    if let WorkflowError::OverlapConflict { conflicts } = e {
        body["conflicting_applications"] = json!(conflicts);
    }
    (status, Json(body)).into_response()
}

fn kind_of(application: &applications::Model) -> RequestKind {
    match application.request_kind {
        db_enums::RequestKind::Leave => RequestKind::Leave,
        db_enums::RequestKind::Overtime => RequestKind::Overtime,
        db_enums::RequestKind::OutdoorWork => RequestKind::OutdoorWork,
    }
}

fn code_of(application: &applications::Model) -> String {
    transaction_code(kind_of(application), application.id)
}

const fn status_str(status: &db_enums::ApplicationStatus) -> &'static str {
    match status {
        db_enums::ApplicationStatus::Pending => "pending",
        db_enums::ApplicationStatus::Approved => "approved",
        db_enums::ApplicationStatus::Rejected => "rejected",
        db_enums::ApplicationStatus::Cancelled => "cancelled",
    }
}

const fn stage_str(stage: &db_enums::ApprovalStage) -> &'static str {
    match stage {
        db_enums::ApprovalStage::Checker => "checker",
        db_enums::ApprovalStage::Approver1 => "approver_1",
        db_enums::ApprovalStage::Approver2 => "approver_2",
        db_enums::ApprovalStage::Approver3 => "approver_3",
        db_enums::ApprovalStage::Completed => "completed",
    }
}

const fn session_str(session: db_enums::DaySession) -> &'static str {
    match session {
        db_enums::DaySession::Am => "am",
        db_enums::DaySession::Pm => "pm",
    }
}

fn stage_views(application: &applications::Model) -> Vec<StageView> {
    let at = |t: Option<chrono::DateTime<chrono::FixedOffset>>| t.map(|t| t.to_rfc3339());
    vec![
        StageView {
            stage: "checker",
            assignee_id: application.checker_id,
            group_id: application.checker_group_id,
            acted_at: at(application.checker_at),
            remarks: application.checker_remarks.clone(),
        },
        StageView {
            stage: "approver_1",
            assignee_id: application.approver_1_id,
            group_id: application.approver_1_group_id,
            acted_at: at(application.approver_1_at),
            remarks: application.approver_1_remarks.clone(),
        },
        StageView {
            stage: "approver_2",
            assignee_id: application.approver_2_id,
            group_id: application.approver_2_group_id,
            acted_at: at(application.approver_2_at),
            remarks: application.approver_2_remarks.clone(),
        },
        StageView {
            stage: "approver_3",
            assignee_id: application.approver_3_id,
            group_id: application.approver_3_group_id,
            acted_at: at(application.approver_3_at),
            remarks: application.approver_3_remarks.clone(),
        },
    ]
}

fn application_to_response(application: &applications::Model) -> ApplicationResponse {
    ApplicationResponse {
        id: application.id,
        code: code_of(application),
        user_id: application.user_id,
        kind: kind_of(application).as_str(),
        leave_type_id: application.leave_type_id,
        year: application.year,
        start_date: application.start_date,
        end_date: application.end_date,
        start_session: application.start_session.map(session_str),
        end_session: application.end_session.map(session_str),
        total_days: application.total_days.to_string(),
        reason: application.reason.clone(),
        status: status_str(&application.status),
        current_stage: stage_str(&application.current_approval_stage),
        flow_type: match application.flow_type {
            db_enums::FlowType::EFlow => "e_flow",
            db_enums::FlowType::PaperFlow => "paper_flow",
        },
        stages: stage_views(application),
        rejection_reason: application.rejection_reason.clone(),
        cancellation_reason: application.cancellation_reason.clone(),
        is_cancellation_request: application.is_cancellation_request,
        original_application_id: application.original_application_id,
        is_reversal_transaction: application.is_reversal_transaction,
        reversal_of_application_id: application.reversal_of_application_id,
        is_reversed: application.is_reversed,
        created_at: application.created_at.to_rfc3339(),
        updated_at: application.updated_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session() {
        assert_eq!(parse_session(None).unwrap(), None);
        assert_eq!(
            parse_session(Some("am")).unwrap(),
            Some(DaySession::Am)
        );
        assert!(parse_session(Some("noon")).is_err());
    }

    #[test]
    fn test_workflow_error_status_mapping() {
        let response = workflow_error_response(&WorkflowError::ApplicationNotFound(7));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = workflow_error_response(&WorkflowError::RejectionReasonRequired);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
