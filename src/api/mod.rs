use axum::extract::{Path, State};
use axum::{Json, Router, http::StatusCode, routing::get};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Course, Location, Reserve, TimeSchedule};
use crate::services::SectionStatus;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct OpenResponse {
    open: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses/{subject}/{catalog}", get(course))
        .route("/courses/{subject}/{catalog}/open", get(open_sections))
        .route(
            "/courses/{subject}/{catalog}/components/{component}",
            get(component_sections),
        )
        .route(
            "/courses/{subject}/{catalog}/associated/{group}",
            get(associated_sections),
        )
        .route("/courses/{subject}/{catalog}/sections/{section}", get(section_open))
        .route(
            "/courses/{subject}/{catalog}/sections/{section}/related",
            get(related_sections),
        )
        .route(
            "/courses/{subject}/{catalog}/sections/{section}/schedule",
            get(time_schedule),
        )
        .route(
            "/courses/{subject}/{catalog}/sections/{section}/instructors",
            get(instructors),
        )
        .route(
            "/courses/{subject}/{catalog}/sections/{section}/reserves",
            get(reserves),
        )
        .route(
            "/courses/{subject}/{catalog}/sections/{section}/location",
            get(location),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1")
        .execute(state.queries.cache().store().pool())
        .await?;
    Ok(StatusCode::OK)
}

async fn course(
    State(state): State<AppState>,
    Path((subject, catalog)): Path<(String, String)>,
) -> Result<Json<Course>, AppError> {
    let course = state
        .queries
        .course(&subject, &catalog)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn open_sections(
    State(state): State<AppState>,
    Path((subject, catalog)): Path<(String, String)>,
) -> Result<Json<Vec<Vec<String>>>, AppError> {
    let groups = state.queries.open_sections(&subject, &catalog).await?;
    Ok(Json(groups))
}

async fn component_sections(
    State(state): State<AppState>,
    Path((subject, catalog, component)): Path<(String, String, String)>,
) -> Result<Json<Vec<SectionStatus>>, AppError> {
    let sections = state
        .queries
        .component_sections(&subject, &catalog, &component)
        .await?;
    Ok(Json(sections))
}

async fn associated_sections(
    State(state): State<AppState>,
    Path((subject, catalog, group)): Path<(String, String, i64)>,
) -> Result<Json<Vec<String>>, AppError> {
    let labels = state
        .queries
        .associated_sections(&subject, &catalog, group)
        .await?;
    Ok(Json(labels))
}

async fn section_open(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<OpenResponse>, AppError> {
    let open = state.queries.is_open(&subject, &catalog, &section).await?;
    Ok(Json(OpenResponse { open }))
}

async fn related_sections(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<Vec<Vec<String>>>, AppError> {
    let groups = state
        .queries
        .related_sections(&subject, &catalog, &section)
        .await?;
    Ok(Json(groups))
}

async fn time_schedule(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<TimeSchedule>, AppError> {
    let schedule = state
        .queries
        .time_schedule(&subject, &catalog, &section)
        .await?;
    Ok(Json(schedule))
}

async fn instructors(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<Vec<String>>, AppError> {
    let names = state.queries.instructors(&subject, &catalog, &section).await?;
    Ok(Json(names))
}

async fn reserves(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<Vec<Reserve>>, AppError> {
    let reserves = state.queries.reserve_info(&subject, &catalog, &section).await?;
    Ok(Json(reserves))
}

async fn location(
    State(state): State<AppState>,
    Path((subject, catalog, section)): Path<(String, String, String)>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = state.queries.location(&subject, &catalog, &section).await?;
    Ok(Json(locations))
}
