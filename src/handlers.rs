use crate::errors::AppError;
use crate::models::{
    AppData, LoginRequest, SleepRecord, SleepRecordInput, StatsResponse, UserSummary,
};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::{path_segment, render_dashboard, render_login};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub edit: Option<i64>,
}

pub async fn index() -> Html<String> {
    Html(render_login())
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserSummary>, AppError> {
    Ok(Json(open_user(&state, &payload.username).await?))
}

pub async fn login_form(
    State(state): State<AppState>,
    Query(payload): Query<LoginRequest>,
) -> Result<Redirect, AppError> {
    let summary = open_user(&state, &payload.username).await?;
    Ok(Redirect::to(&dashboard_url(&summary.username)))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let mut data = state.data.lock().await;
    let session = data.session(&user)?;
    let records = session.records();
    let stats = session.stats(state.rolling_window);
    let editing = query
        .edit
        .and_then(|id| records.iter().find(|record| record.id == id));

    Ok(Html(render_dashboard(session.username(), &records, editing, &stats)))
}

pub async fn list_records(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<SleepRecord>>, AppError> {
    let mut data = state.data.lock().await;
    Ok(Json(data.session(&user)?.records()))
}

pub async fn create_record(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(input): Json<SleepRecordInput>,
) -> Result<(StatusCode, Json<SleepRecord>), AppError> {
    let record = add_record(&state, &user, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn create_record_form(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Form(input): Form<SleepRecordInput>,
) -> Result<Redirect, AppError> {
    add_record(&state, &user, &input).await?;
    Ok(Redirect::to(&dashboard_url(&user)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, i64)>,
    Json(input): Json<SleepRecordInput>,
) -> Result<Json<SleepRecord>, AppError> {
    Ok(Json(edit_record(&state, &user, id, &input).await?))
}

pub async fn update_record_form(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, i64)>,
    Form(input): Form<SleepRecordInput>,
) -> Result<Redirect, AppError> {
    edit_record(&state, &user, id, &input).await?;
    Ok(Redirect::to(&dashboard_url(&user)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    remove_record(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_record_form(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, i64)>,
) -> Result<Redirect, AppError> {
    remove_record(&state, &user, id).await?;
    Ok(Redirect::to(&dashboard_url(&user)))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let mut data = state.data.lock().await;
    Ok(Json(data.session(&user)?.stats(state.rolling_window)))
}

pub async fn export_records(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut data = state.data.lock().await;
    let session = data.session(&user)?;
    let body = session.export().map_err(AppError::internal)?;
    let disposition = format!(
        "attachment; filename=\"{}_sleep_data.json\"",
        session.username().replace('"', "")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn import_records(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(records): Json<Vec<SleepRecord>>,
) -> Result<Json<UserSummary>, AppError> {
    let summary = commit(&state, |data| {
        let mut session = data.session(&user)?;
        let record_count = session.import(records)?;
        Ok(UserSummary {
            username: session.username().to_string(),
            record_count,
        })
    })
    .await?;
    Ok(Json(summary))
}

/// Applies `change` to a copy of the document and swaps it in only once it is on disk.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut draft = data.clone();
    let value = change(&mut draft)?;

    persist_data(&state.data_path, &draft).await?;
    *data = draft;
    Ok(value)
}

async fn open_user(state: &AppState, username: &str) -> Result<UserSummary, AppError> {
    commit(state, |data| {
        let session = data.login(username)?;
        Ok(UserSummary {
            username: session.username().to_string(),
            record_count: session.len(),
        })
    })
    .await
}

async fn add_record(
    state: &AppState,
    user: &str,
    input: &SleepRecordInput,
) -> Result<SleepRecord, AppError> {
    commit(state, |data| Ok(data.session(user)?.add(input)?)).await
}

async fn edit_record(
    state: &AppState,
    user: &str,
    id: i64,
    input: &SleepRecordInput,
) -> Result<SleepRecord, AppError> {
    commit(state, |data| Ok(data.session(user)?.edit(id, input)?)).await
}

async fn remove_record(state: &AppState, user: &str, id: i64) -> Result<(), AppError> {
    commit(state, |data| Ok(data.session(user)?.delete(id)?)).await
}

fn dashboard_url(user: &str) -> String {
    format!("/users/{}", path_segment(user.trim()))
}
