//! Breakpoint endpoints
//!
//! `POST /break` is a long poll: the response is held until the breakpoint
//! is resumed, with no timeout. The other endpoints never wait.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::breakpoints::{
    BreakAck, BreakpointContext, ResumeAllResponse, ResumeResponse, StatusResponse, WaitOutcome,
};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the breakpoint router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/break", post(hit_breakpoint))
        .route("/status", get(status))
        .route("/resume/:id", post(resume))
        .route("/resume-all", post(resume_all))
}

/// Client hit a breakpoint; wait for resume
async fn hit_breakpoint(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BreakpointContext>, JsonRejection>,
) -> Result<Json<BreakAck>> {
    let Json(context) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if context.id.trim().is_empty() {
        return Err(AppError::BadRequest("Breakpoint id is required".to_string()));
    }

    let location = format!(
        "{} ({}:{})",
        context.location_label(),
        context.file.as_deref().unwrap_or("?"),
        context.line
    );

    // Only registration touches the registry; the wait holds no lock.
    let handle = state.registry().add(context);
    let id = handle.id().to_string();
    tracing::info!(id = %id, "Breakpoint hit at {}", location);

    match handle.wait().await {
        WaitOutcome::Resumed => {
            tracing::info!(id = %id, "Breakpoint resumed");
            Ok(Json(BreakAck { resumed: true }))
        }
        WaitOutcome::Abandoned => {
            tracing::error!(id = %id, "Breakpoint signal dropped without a resume");
            Err(AppError::Internal(format!(
                "Breakpoint '{}' was dropped before it was resumed",
                id
            )))
        }
    }
}

/// List active breakpoints
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::running(state.registry().get_all()))
}

/// Resume a specific breakpoint
async fn resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeResponse>> {
    if state.registry().try_resume(&id) {
        tracing::info!(id = %id, "Resume requested");
        Ok(Json(ResumeResponse { resumed: true, id }))
    } else {
        Err(AppError::NotFound(format!("Breakpoint '{}' not found", id)))
    }
}

/// Resume all breakpoints
async fn resume_all(State(state): State<AppState>) -> Json<ResumeAllResponse> {
    let count = state.registry().resume_all();
    tracing::info!(count = count, "Resume all requested");
    Json(ResumeAllResponse { resumed: count })
}
