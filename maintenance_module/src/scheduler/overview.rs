use chrono::NaiveDate;
use serde::Serialize;

use super::store::SqliteMaintenanceStore;
use super::types::{ItemKind, Labels, SchedulerError, SiteEnv};

/// One dashboard row: a site and its next not-yet-elapsed work item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteOverview {
    pub id: String,
    pub name: String,
    pub env: SiteEnv,
    pub renew_month: u32,
    pub next_maintenance: Option<NaiveDate>,
    pub next_kind: Option<ItemKind>,
    pub next_labels: Option<Labels>,
}

/// Read-side projection: for every site, the earliest item with
/// `date >= today`. Sites without an upcoming item report `None`.
pub fn overview(
    store: &SqliteMaintenanceStore,
    today: NaiveDate,
) -> Result<Vec<SiteOverview>, SchedulerError> {
    let sites = store.list_sites()?;
    let mut rows = Vec::with_capacity(sites.len());
    for site in sites {
        let next = store.next_item_on_or_after(&site.id, site.env, today)?;
        rows.push(SiteOverview {
            id: site.id,
            name: site.name,
            env: site.env,
            renew_month: site.renew_month,
            next_maintenance: next.as_ref().map(|item| item.date),
            next_kind: next.as_ref().map(|item| item.kind),
            next_labels: next.as_ref().map(|item| item.labels),
        });
    }
    Ok(rows)
}
