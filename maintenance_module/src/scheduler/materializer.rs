use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::cadence::{coerce_renew_month, plan_schedule, window_span, DayPlacement, WindowSpan};
use super::store::{NewItem, SiteUpsert, SqliteMaintenanceStore};
use super::types::{
    PlannedEntry, ScheduleWindow, SchedulerError, Site, SiteContact, SiteEnv, SiteRef,
    DEFAULT_BACKFILL_MONTHS, DEFAULT_FORWARD_MONTHS,
};

/// The literal phrase a bulk rebuild request must carry.
pub const REBUILD_ALL_CONFIRMATION: &str = "REBUILD ALL SITES";

/// Save one site and reconcile its schedule over the requested window.
#[derive(Debug, Clone, Default)]
pub struct SaveScheduleRequest {
    pub id: String,
    pub name: Option<String>,
    pub env: Option<SiteEnv>,
    /// Raw renewal month; out-of-range values coerce to the current month.
    pub renew_month: Option<i64>,
    pub website_url: Option<String>,
    pub git_url: Option<String>,
    pub group_email: Option<String>,
    pub primary_contact: Option<SiteContact>,
    pub rebuild: bool,
    pub backfill_months: Option<i64>,
    pub forward_months: Option<i64>,
    pub placement: DayPlacement,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScheduleOutcome {
    pub site: Site,
    pub window: WindowSpan,
    pub planned: Vec<PlannedEntry>,
    pub created: usize,
}

pub fn save_site_schedule(
    store: &SqliteMaintenanceStore,
    request: &SaveScheduleRequest,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<SaveScheduleOutcome, SchedulerError> {
    let id = request.id.trim();
    if id.is_empty() {
        return Err(SchedulerError::MissingSiteId);
    }
    let renew_month = coerce_renew_month(request.renew_month, today);
    let site = store.upsert_site(
        &SiteUpsert {
            id: id.to_string(),
            name: request.name.clone(),
            env: request.env,
            renew_month,
            website_url: request.website_url.as_deref().map(normalize_url),
            git_url: request.git_url.as_deref().map(normalize_url),
            group_email: request.group_email.clone(),
            primary_contact: request.primary_contact.clone(),
        },
        now,
    )?;

    if request.rebuild {
        let deleted = store.delete_items(&site.id, site.env)?;
        info!(
            "rebuild wiped {} items for {} ({})",
            deleted, site.id, site.env
        );
    }

    let window = ScheduleWindow::clamped(
        request.backfill_months.unwrap_or(DEFAULT_BACKFILL_MONTHS),
        request.forward_months.unwrap_or(DEFAULT_FORWARD_MONTHS),
    );
    let planned = plan_schedule(renew_month, today, window, request.placement);
    let created = materialize(store, &site, &planned, request.rebuild, now)?;
    info!(
        "saved schedule for {} ({}): {} dates planned, {} created",
        site.id,
        site.env,
        planned.len(),
        created
    );

    Ok(SaveScheduleOutcome {
        window: window_span(today, window),
        site,
        planned,
        created,
    })
}

fn materialize(
    store: &SqliteMaintenanceStore,
    site: &Site,
    planned: &[PlannedEntry],
    overwrite: bool,
    now: DateTime<Utc>,
) -> Result<usize, SchedulerError> {
    let mut created = 0;
    for entry in planned {
        let item = NewItem {
            site_id: &site.id,
            site_env: site.env,
            site_name: &site.name,
            entry,
        };
        let inserted = if overwrite {
            store.upsert_item(&item, now)?
        } else {
            store.insert_item_if_absent(&item, now)?
        };
        if inserted {
            created += 1;
        }
    }
    Ok(created)
}

#[derive(Debug, Clone, Default)]
pub struct BulkRebuildRequest {
    pub backfill_months: Option<i64>,
    pub forward_months: Option<i64>,
    pub confirm_text: String,
    pub placement: DayPlacement,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRebuildResult {
    pub site: SiteRef,
    pub deleted: usize,
    pub created: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRebuildReport {
    pub total_sites: usize,
    pub total_deleted: usize,
    pub total_created: usize,
    pub backfill_months: u32,
    pub forward_months: u32,
    pub results: Vec<SiteRebuildResult>,
}

/// Destructively regenerate every site's schedule. Sites are processed
/// sequentially; one site's failure is recorded in its result row and does
/// not stop the rest of the batch.
pub fn bulk_rebuild(
    store: &SqliteMaintenanceStore,
    request: &BulkRebuildRequest,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<BulkRebuildReport, SchedulerError> {
    if request.confirm_text.trim() != REBUILD_ALL_CONFIRMATION {
        return Err(SchedulerError::ConfirmationRequired);
    }
    let window = ScheduleWindow::clamped(
        request.backfill_months.unwrap_or(DEFAULT_BACKFILL_MONTHS),
        request.forward_months.unwrap_or(DEFAULT_FORWARD_MONTHS),
    );

    let sites = store.list_sites()?;
    let mut results = Vec::with_capacity(sites.len());
    let mut total_deleted = 0;
    let mut total_created = 0;
    for site in &sites {
        match rebuild_one(store, site, window, request.placement, today, now) {
            Ok((deleted, created)) => {
                total_deleted += deleted;
                total_created += created;
                results.push(SiteRebuildResult {
                    site: site_ref(site),
                    deleted,
                    created,
                    success: true,
                    error: None,
                });
            }
            Err(err) => {
                warn!("bulk rebuild failed for {} ({}): {}", site.id, site.env, err);
                results.push(SiteRebuildResult {
                    site: site_ref(site),
                    deleted: 0,
                    created: 0,
                    success: false,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    info!(
        "bulk rebuild over {} sites: {} deleted, {} created",
        sites.len(),
        total_deleted,
        total_created
    );

    Ok(BulkRebuildReport {
        total_sites: sites.len(),
        total_deleted,
        total_created,
        backfill_months: window.backfill_months,
        forward_months: window.forward_months,
        results,
    })
}

fn rebuild_one(
    store: &SqliteMaintenanceStore,
    site: &Site,
    window: ScheduleWindow,
    placement: DayPlacement,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(usize, usize), SchedulerError> {
    let deleted = store.delete_items(&site.id, site.env)?;
    let planned = plan_schedule(site.renew_month, today, window, placement);
    let created = materialize(store, site, &planned, true, now)?;
    Ok((deleted, created))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDeletion {
    pub site: usize,
    pub maintenance: usize,
    pub changelogs: usize,
}

/// Explicit site deletion, cascading to its work items (and their history)
/// and changelogs across every environment.
pub fn delete_site(
    store: &SqliteMaintenanceStore,
    id: &str,
) -> Result<SiteDeletion, SchedulerError> {
    store
        .get_site(id)?
        .ok_or_else(|| SchedulerError::SiteNotFound(id.to_string()))?;
    let (site, maintenance, changelogs) = store.delete_site(id)?;
    info!(
        "deleted site {}: {} maintenance items, {} changelogs",
        id, maintenance, changelogs
    );
    Ok(SiteDeletion {
        site,
        maintenance,
        changelogs,
    })
}

fn site_ref(site: &Site) -> SiteRef {
    SiteRef {
        id: site.id.clone(),
        name: site.name.clone(),
        env: site.env,
    }
}

fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
