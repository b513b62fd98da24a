use crate::dates::parse_key;
use crate::errors::AppError;
use crate::history::build_history;
use crate::models::{
    HistoryResponse, JournalView, PendingActivity, PendingIntake, RecordPatch, RecoverySnapshot,
    SelectDateRequest,
};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, State},
    response::Html,
};
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = state.with_journal(|journal| journal.view()).await?;
    Ok(Html(render_index(&view)))
}

pub async fn get_journal(State(state): State<AppState>) -> Result<Json<JournalView>, AppError> {
    let view = state.with_journal(|journal| journal.view()).await?;
    Ok(Json(view))
}

pub async fn select_date(
    State(state): State<AppState>,
    Json(payload): Json<SelectDateRequest>,
) -> Result<Json<JournalView>, AppError> {
    let date = parse_key(&payload.date)
        .ok_or_else(|| AppError::bad_request("date must be formatted as YYYY-MM-DD"))?;

    let view = state
        .with_journal(move |journal| {
            journal.select_date(date);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn reset_to_today(State(state): State<AppState>) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(|journal| {
            journal.reset_to_today();
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn patch_record(
    State(state): State<AppState>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.apply_patch(patch);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn toggle_water(
    State(state): State<AppState>,
    Path(pip): Path<u8>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.toggle_water(pip);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn add_meal(
    State(state): State<AppState>,
    Json(pending): Json<PendingIntake>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.set_pending_meal(pending);
            if let Some(entry) = journal.add_pending_meal() {
                info!(id = %entry.id, date = %journal.selected_date(), "meal added");
            }
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn add_misc(
    State(state): State<AppState>,
    Json(pending): Json<PendingIntake>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.set_pending_misc(pending);
            if let Some(entry) = journal.add_pending_misc() {
                info!(id = %entry.id, date = %journal.selected_date(), "misc entry added");
            }
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn add_activity(
    State(state): State<AppState>,
    Json(pending): Json<PendingActivity>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.set_pending_activity(pending);
            if let Some(entry) = journal.add_pending_activity() {
                info!(id = %entry.id, date = %journal.selected_date(), "activity added");
            }
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn remove_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.remove_meal(&id);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn remove_misc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.remove_misc(&id);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn remove_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JournalView>, AppError> {
    let view = state
        .with_journal(move |journal| {
            journal.remove_activity(&id);
            journal.view()
        })
        .await?;
    Ok(Json(view))
}

pub async fn get_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let history = state
        .with_journal(|journal| build_history(journal.history()))
        .await?;
    Ok(Json(history))
}

pub async fn get_recovery(State(state): State<AppState>) -> Result<Json<RecoverySnapshot>, AppError> {
    let snapshot = state
        .with_journal(|journal| journal.recovery_snapshot())
        .await?;
    Ok(Json(snapshot))
}
