use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::task;
use tracing::error;

use crate::scheduler::{
    bulk_rebuild, delete_site, overview, save_site_schedule, set_status, BulkRebuildRequest,
    ChangeSet, ChangelogRecord, DayPlacement, ItemFilter, MaintStatus, SaveScheduleRequest,
    SchedulerError, SiteContact, SiteEnv, StatusChange,
};

use super::state::AppState;

pub(super) async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SaveSiteBody {
    #[serde(default)]
    id: String,
    name: Option<String>,
    env: Option<SiteEnv>,
    renew_month: Option<i64>,
    website_url: Option<String>,
    git_url: Option<String>,
    group_email: Option<String>,
    primary_contact: Option<SiteContact>,
    #[serde(default)]
    rebuild: bool,
    backfill_months: Option<i64>,
    forward_months: Option<i64>,
    #[serde(default)]
    placement: DayPlacement,
}

pub(super) async fn save_site(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SaveSiteBody>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let store = state.store.clone();
    let request = SaveScheduleRequest {
        id: body.id,
        name: body.name,
        env: body.env,
        renew_month: body.renew_month,
        website_url: body.website_url,
        git_url: body.git_url,
        group_email: body.group_email,
        primary_contact: body.primary_contact,
        rebuild: body.rebuild,
        backfill_months: body.backfill_months,
        forward_months: body.forward_months,
        placement: body.placement,
    };
    let outcome = match run_blocking(move || {
        let now = Utc::now();
        save_site_schedule(&store, &request, now.date_naive(), now)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    Json(json!({
        "ok": true,
        "site": outcome.site,
        "scheduleWindow": {
            "from": outcome.window.from,
            "to": outcome.window.to,
            "count": outcome.planned.len(),
        },
        "dates": outcome.planned,
    }))
    .into_response()
}

pub(super) async fn list_sites(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.list_sites()).await {
        Ok(sites) => Json(json!({ "sites": sites })).into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SiteDetailQuery {
    env: Option<SiteEnv>,
}

pub(super) async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SiteDetailQuery>,
) -> Response {
    let store = state.store.clone();
    let result = run_blocking(move || {
        let site = store
            .get_site(&id)?
            .ok_or_else(|| SchedulerError::SiteNotFound(id.clone()))?;
        let items = store.list_items(&ItemFilter {
            site_id: Some(site.id.clone()),
            env: query.env,
            ..ItemFilter::default()
        })?;
        Ok((site, items))
    })
    .await;
    match result {
        Ok((site, items)) => Json(json!({ "ok": true, "site": site, "items": items })).into_response(),
        Err(response) => response,
    }
}

pub(super) async fn remove_site(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let store = state.store.clone();
    match run_blocking(move || delete_site(&store, &id)).await {
        Ok(deleted) => Json(json!({ "ok": true, "deleted": deleted })).into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BulkRebuildBody {
    backfill_months: Option<i64>,
    forward_months: Option<i64>,
    #[serde(default)]
    confirm_text: String,
    #[serde(default)]
    placement: DayPlacement,
}

pub(super) async fn bulk_rebuild_sites(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BulkRebuildBody>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let store = state.store.clone();
    let request = BulkRebuildRequest {
        backfill_months: body.backfill_months,
        forward_months: body.forward_months,
        confirm_text: body.confirm_text,
        placement: body.placement,
    };
    let report = match run_blocking(move || {
        let now = Utc::now();
        bulk_rebuild(&store, &request, now.date_naive(), now)
    })
    .await
    {
        Ok(report) => report,
        Err(response) => return response,
    };
    Json(json!({
        "ok": true,
        "message": format!("Bulk rebuild completed for {} sites", report.total_sites),
        "totalSites": report.total_sites,
        "totalDeleted": report.total_deleted,
        "totalCreated": report.total_created,
        "backfillMonths": report.backfill_months,
        "forwardMonths": report.forward_months,
        "results": report.results,
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StatusBody {
    #[serde(default)]
    site_id: String,
    env: Option<SiteEnv>,
    date: NaiveDate,
    status: MaintStatus,
    from: Option<MaintStatus>,
    by: Option<String>,
    note: Option<String>,
}

pub(super) async fn set_item_status(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> Response {
    if body.site_id.trim().is_empty() {
        return scheduler_error_response(SchedulerError::MissingSiteId);
    }
    let store = state.store.clone();
    let notifier = state.notifier.clone();
    let change = StatusChange {
        site_id: body.site_id,
        env: body.env.unwrap_or_default(),
        date: body.date,
        status: body.status,
        actor: body.by,
        from_hint: body.from,
        note: body.note,
    };
    let outcome =
        match run_blocking(move || set_status(&store, notifier.as_ref(), &change, Utc::now()))
            .await
        {
            Ok(outcome) => outcome,
            Err(response) => return response,
        };
    Json(json!({
        "ok": true,
        "previous": outcome.previous,
        "status": outcome.status,
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct MaintenanceQuery {
    site: Option<String>,
    env: Option<SiteEnv>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<usize>,
}

pub(super) async fn list_maintenance(
    State(state): State<AppState>,
    Query(query): Query<MaintenanceQuery>,
) -> Response {
    let store = state.store.clone();
    let filter = ItemFilter {
        site_id: query.site,
        env: query.env,
        from: query.from,
        to: query.to,
        limit: query.limit,
    };
    match run_blocking(move || store.list_items(&filter)).await {
        Ok(items) => Json(json!({ "items": items })).into_response(),
        Err(response) => response,
    }
}

pub(super) async fn overview_summary(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || overview(&store, Utc::now().date_naive())).await {
        Ok(sites) => Json(json!({ "sites": sites })).into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChangelogBody {
    site: ChangelogSiteBody,
    run: Option<ChangelogRunBody>,
    #[serde(default)]
    changes: ChangeSet,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChangelogSiteBody {
    #[serde(default)]
    id: String,
    env: Option<SiteEnv>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChangelogRunBody {
    timestamp: Option<DateTime<Utc>>,
}

pub(super) async fn ingest_changelog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangelogBody>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    if body.site.id.trim().is_empty() {
        return scheduler_error_response(SchedulerError::MissingSiteId);
    }
    let now = Utc::now();
    let record = ChangelogRecord {
        site_id: body.site.id.trim().to_string(),
        // Changelog reports default to dev: they come from build pipelines.
        site_env: body.site.env.unwrap_or(SiteEnv::Dev),
        run_timestamp: body.run.and_then(|run| run.timestamp).unwrap_or(now),
        received_at: now,
        changes: body.changes,
    };
    let store = state.store.clone();
    let response_fields = (
        record.site_id.clone(),
        record.site_env,
        record.run_timestamp,
    );
    match run_blocking(move || store.upsert_changelog(&record)).await {
        Ok(()) => {
            let (site, env, ts) = response_fields;
            Json(json!({ "ok": true, "site": site, "env": env, "ts": ts })).into_response()
        }
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LatestChangelogQuery {
    site: Option<String>,
    env: Option<SiteEnv>,
}

pub(super) async fn latest_changelog(
    State(state): State<AppState>,
    Query(query): Query<LatestChangelogQuery>,
) -> Response {
    let Some(site) = query.site.filter(|site| !site.trim().is_empty()) else {
        return scheduler_error_response(SchedulerError::MissingSiteId);
    };
    let env = query.env.unwrap_or(SiteEnv::Dev);
    let store = state.store.clone();
    match run_blocking(move || store.latest_changelog(&site, env)).await {
        Ok(Some(record)) => Json(json!({
            "site": { "id": record.site_id, "env": record.site_env },
            "run": { "timestamp": record.run_timestamp },
            "receivedAt": record.received_at,
            "changes": record.changes,
        }))
        .into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(response) => response,
    }
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = state.config.admin_key.as_deref().unwrap_or("");
    let given = headers
        .get("x-admin-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if expected.is_empty() || given != expected {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "ok": false,
                "error": "unauthorized (x-admin-key missing or invalid)",
            })),
        )
            .into_response());
    }
    Ok(())
}

async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, SchedulerError> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(scheduler_error_response(err)),
        Err(err) => {
            error!("blocking task panicked: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "internal error" })),
            )
                .into_response())
        }
    }
}

fn scheduler_error_response(err: SchedulerError) -> Response {
    let status = match &err {
        SchedulerError::MissingSiteId
        | SchedulerError::UnknownEnv(_)
        | SchedulerError::UnknownStatus(_)
        | SchedulerError::UnknownKind(_)
        | SchedulerError::DateParse(_)
        | SchedulerError::ConfirmationRequired => StatusCode::BAD_REQUEST,
        SchedulerError::SiteNotFound(_) | SchedulerError::ItemNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", err);
    }
    (
        status,
        Json(json!({ "ok": false, "error": err.to_string() })),
    )
        .into_response()
}
