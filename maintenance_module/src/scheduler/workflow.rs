use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::emails::{compose_completion_email, compose_status_note};
use super::notifier::Notifier;
use super::store::{SqliteMaintenanceStore, StatusWrite};
use super::types::{
    ChangeAction, ChangelogRecord, MaintStatus, PackageRow, SchedulerError, Site, SiteEnv,
};

// Changelog gathering window around the item date for completion notices.
const CHANGE_WINDOW_BEFORE_DAYS: i64 = 30;
const CHANGE_WINDOW_AFTER_DAYS: i64 = 7;

/// One requested transition on a work item, addressed by natural key.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub site_id: String,
    pub env: SiteEnv,
    pub date: NaiveDate,
    pub status: MaintStatus,
    pub actor: Option<String>,
    /// Caller-supplied previous-status hint recorded in the history row in
    /// place of the stored status.
    pub from_hint: Option<MaintStatus>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeOutcome {
    pub previous: MaintStatus,
    pub status: MaintStatus,
}

/// Apply a status transition.
///
/// Any-to-any transitions are accepted. Every call appends exactly one
/// history row. The first transition into `Completed` triggers the
/// completion notice; notification failures of any kind are logged and
/// never undo the transition, which is the durable fact.
pub fn set_status(
    store: &SqliteMaintenanceStore,
    notifier: &dyn Notifier,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> Result<StatusChangeOutcome, SchedulerError> {
    let item = store
        .find_item(&change.site_id, change.env, change.date)?
        .ok_or_else(|| SchedulerError::ItemNotFound {
            site_id: change.site_id.clone(),
            env: change.env,
            date: change.date,
        })?;
    let previous = item.status;

    store.apply_status(&StatusWrite {
        row_id: item.row_id,
        status: change.status,
        actor: change.actor.as_deref(),
        from: Some(change.from_hint.unwrap_or(previous)),
        note: change.note.as_deref(),
        completing: change.status == MaintStatus::Completed,
        at: now,
    })?;
    info!(
        "status of {}/{} on {} set to {} (was {})",
        change.site_id, change.env, change.date, change.status, previous
    );

    let site = store.get_site(&change.site_id)?;
    if change.status == MaintStatus::Completed && previous != MaintStatus::Completed {
        if let Err(err) = send_completion_notice(store, notifier, site.as_ref(), change) {
            warn!(
                "completion notice for {}/{} on {} failed: {}",
                change.site_id, change.env, change.date, err
            );
        }
    }
    if change.status != previous {
        send_status_note(store, notifier, site.as_ref(), change, previous);
    }

    Ok(StatusChangeOutcome {
        previous,
        status: change.status,
    })
}

fn send_completion_notice(
    store: &SqliteMaintenanceStore,
    notifier: &dyn Notifier,
    site: Option<&Site>,
    change: &StatusChange,
) -> Result<(), SchedulerError> {
    let Some(recipient) = completion_recipient(site) else {
        info!(
            "no completion recipient configured for {}; skipping notice",
            change.site_id
        );
        return Ok(());
    };
    // Fresh read so the body includes the just-appended history row.
    let item = store
        .find_item(&change.site_id, change.env, change.date)?
        .ok_or_else(|| SchedulerError::ItemNotFound {
            site_id: change.site_id.clone(),
            env: change.env,
            date: change.date,
        })?;
    let (from, to) = change_window(change.date);
    let changes = store.changelogs_between(&change.site_id, change.env, from, to)?;
    let rows = flatten_package_rows(&changes);
    let mail = compose_completion_email(&item, &rows, changes.first(), recipient);
    if let Err(err) = notifier.send(&mail) {
        warn!(
            "completion email delivery failed for {} ({}): {}",
            change.site_id, change.env, err
        );
    }
    Ok(())
}

fn send_status_note(
    store: &SqliteMaintenanceStore,
    notifier: &dyn Notifier,
    site: Option<&Site>,
    change: &StatusChange,
    previous: MaintStatus,
) {
    let Some(group_email) = site.and_then(|site| site.group_email.clone()) else {
        return;
    };
    let item = match store.find_item(&change.site_id, change.env, change.date) {
        Ok(Some(item)) => item,
        Ok(None) => return,
        Err(err) => {
            warn!("status note lookup failed for {}: {}", change.site_id, err);
            return;
        }
    };
    let mail = compose_status_note(&item, previous, change.actor.as_deref(), group_email);
    if let Err(err) = notifier.send(&mail) {
        warn!(
            "status note delivery failed for {} ({}): {}",
            change.site_id, change.env, err
        );
    }
}

fn completion_recipient(site: Option<&Site>) -> Option<String> {
    let site = site?;
    site.group_email.clone().or_else(|| {
        site.primary_contact
            .as_ref()
            .map(|contact| contact.email.trim().to_string())
            .filter(|email| !email.is_empty())
    })
}

fn change_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    (
        midnight - Duration::days(CHANGE_WINDOW_BEFORE_DAYS),
        midnight + Duration::days(CHANGE_WINDOW_AFTER_DAYS),
    )
}

/// Flatten change records into one row per package, tagged by action.
pub fn flatten_package_rows(changes: &[ChangelogRecord]) -> Vec<PackageRow> {
    let mut rows = Vec::new();
    for record in changes {
        for package in &record.changes.updated {
            rows.push(PackageRow {
                action: ChangeAction::Updated,
                name: package.name.clone(),
                old: package.old.clone(),
                new_version: package.new_version.clone(),
            });
        }
        for package in &record.changes.added {
            rows.push(PackageRow {
                action: ChangeAction::Added,
                name: package.name.clone(),
                old: None,
                new_version: package.new_version.clone(),
            });
        }
        for package in &record.changes.removed {
            rows.push(PackageRow {
                action: ChangeAction::Removed,
                name: package.name.clone(),
                old: package.old.clone(),
                new_version: None,
            });
        }
    }
    rows
}
