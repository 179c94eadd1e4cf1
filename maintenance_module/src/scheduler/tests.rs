use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::TempDir;

use super::{
    bulk_rebuild, delete_site, overview, save_site_schedule, set_status, BulkRebuildRequest,
    ChangeSet, ChangelogRecord, DayPlacement, ItemFilter, MaintStatus, NewItem, Notifier,
    NotifyError, OutboundEmail, PackageChange, SaveScheduleRequest, SchedulerError, SiteContact,
    SiteEnv, SqliteMaintenanceStore, StatusChange, REBUILD_ALL_CONFIRMATION,
};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, mail: &OutboundEmail) -> Result<(), NotifyError> {
        self.sent.lock().expect("notifier lock").push(mail.clone());
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _mail: &OutboundEmail) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("transport down".to_string()))
    }
}

fn day(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").expect("valid date")
}

fn at(iso: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(iso)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn test_store(temp: &TempDir) -> SqliteMaintenanceStore {
    SqliteMaintenanceStore::new(temp.path().join("maintenance.db")).expect("store")
}

fn june_site(id: &str) -> SaveScheduleRequest {
    SaveScheduleRequest {
        id: id.to_string(),
        name: Some("Acme".to_string()),
        renew_month: Some(6),
        backfill_months: Some(0),
        forward_months: Some(11),
        primary_contact: Some(SiteContact {
            name: "Site Owner".to_string(),
            email: "owner@acme.test".to_string(),
            phone: String::new(),
        }),
        ..SaveScheduleRequest::default()
    }
}

fn changelog(site: &str, ts: &str, updated: &[(&str, &str, &str)]) -> ChangelogRecord {
    ChangelogRecord {
        site_id: site.to_string(),
        site_env: SiteEnv::Production,
        run_timestamp: at(ts),
        received_at: at(ts),
        changes: ChangeSet {
            updated: updated
                .iter()
                .map(|(name, old, new)| PackageChange {
                    name: name.to_string(),
                    old: Some(old.to_string()),
                    new_version: Some(new.to_string()),
                })
                .collect(),
            ..ChangeSet::default()
        },
    }
}

#[test]
fn save_schedule_materializes_the_cadence() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);

    let outcome = save_site_schedule(
        &store,
        &june_site("acme"),
        day("2025-01-15"),
        at("2025-01-15T09:00:00Z"),
    )
    .expect("save");

    assert_eq!(outcome.planned.len(), 3);
    assert_eq!(outcome.created, 3);
    assert_eq!(outcome.window.from, day("2025-01-01"));
    assert_eq!(outcome.window.to, day("2025-12-01"));
    assert_eq!(store.count_items("acme", SiteEnv::Production).expect("count"), 3);

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("april item");
    assert_eq!(item.status, MaintStatus::ToDo);
    assert!(item.labels.pre_renewal);
    // Creation seeds exactly one history entry.
    assert_eq!(item.status_history.len(), 1);
    assert_eq!(item.status_history[0].to, MaintStatus::ToDo);
    assert_eq!(item.status_history[0].from, None);
}

#[test]
fn missing_site_id_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let request = SaveScheduleRequest {
        id: "   ".to_string(),
        ..SaveScheduleRequest::default()
    };
    let err = save_site_schedule(&store, &request, day("2025-01-15"), Utc::now())
        .expect_err("missing id");
    assert!(matches!(err, SchedulerError::MissingSiteId));
}

#[test]
fn regeneration_without_rebuild_is_idempotent() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("first save");
    let second = save_site_schedule(&store, &june_site("acme"), today, at("2025-01-16T09:00:00Z"))
        .expect("second save");

    assert_eq!(second.planned.len(), 3);
    assert_eq!(second.created, 0);
    assert_eq!(store.count_items("acme", SiteEnv::Production).expect("count"), 3);
}

#[test]
fn regeneration_preserves_manual_status_edits() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");
    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::InProgress,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("transition");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-04-03T09:00:00Z"))
        .expect("regenerate");

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status, MaintStatus::InProgress);
    assert_eq!(item.status_history.len(), 2);
}

#[test]
fn rebuild_discards_manual_edits() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");
    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::ChasedViaPhone,
            actor: None,
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("transition");

    let mut request = june_site("acme");
    request.rebuild = true;
    save_site_schedule(&store, &request, today, at("2025-04-03T09:00:00Z")).expect("rebuild");

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status, MaintStatus::ToDo);
    assert_eq!(item.status_history.len(), 1);
    assert_eq!(store.count_items("acme", SiteEnv::Production).expect("count"), 3);
}

#[test]
fn overlapping_windows_never_duplicate_items() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("first window");
    let mut wider = june_site("acme");
    wider.backfill_months = Some(6);
    wider.forward_months = Some(14);
    save_site_schedule(&store, &wider, today, at("2025-01-16T09:00:00Z")).expect("wider window");

    let items = store
        .list_items(&ItemFilter {
            site_id: Some("acme".to_string()),
            ..ItemFilter::default()
        })
        .expect("list");
    let keys: HashSet<(String, SiteEnv, NaiveDate)> = items
        .iter()
        .map(|item| (item.site.id.clone(), item.site.env, item.date))
        .collect();
    assert_eq!(keys.len(), items.len());
    // Oct 2024 (backfill) and early 2026 months join the original three.
    assert!(items.len() > 3);
}

#[test]
fn overwrite_upsert_refreshes_labels_without_touching_status() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");
    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::InProgress,
            actor: None,
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("transition");

    // A December renewal relabels April as mid-year (pre-renewal is October).
    let entry = super::plan_schedule(
        12,
        day("2025-04-15"),
        super::ScheduleWindow::clamped(0, 0),
        DayPlacement::FirstOfMonth,
    )
    .into_iter()
    .next()
    .expect("april entry");
    let created = store
        .upsert_item(
            &NewItem {
                site_id: "acme",
                site_env: SiteEnv::Production,
                site_name: "Acme",
                entry: &entry,
            },
            at("2025-04-03T09:00:00Z"),
        )
        .expect("upsert");
    assert!(!created);

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert!(item.labels.mid_year);
    assert!(!item.labels.pre_renewal);
    assert_eq!(item.status, MaintStatus::InProgress);
    assert_eq!(item.status_history.len(), 2);
}

#[test]
fn bulk_rebuild_requires_the_exact_phrase() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");

    let err = bulk_rebuild(
        &store,
        &BulkRebuildRequest {
            confirm_text: "rebuild".to_string(),
            ..BulkRebuildRequest::default()
        },
        today,
        at("2025-01-16T09:00:00Z"),
    )
    .expect_err("wrong phrase");
    assert!(matches!(err, SchedulerError::ConfirmationRequired));
    // Nothing was touched.
    assert_eq!(store.count_items("acme", SiteEnv::Production).expect("count"), 3);
}

#[test]
fn bulk_rebuild_reports_per_site_and_totals() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("acme");
    let mut beta = june_site("beta");
    beta.name = Some("Beta".to_string());
    beta.renew_month = Some(1);
    save_site_schedule(&store, &beta, today, at("2025-01-15T09:05:00Z")).expect("beta");

    let report = bulk_rebuild(
        &store,
        &BulkRebuildRequest {
            backfill_months: Some(0),
            forward_months: Some(11),
            confirm_text: REBUILD_ALL_CONFIRMATION.to_string(),
            placement: DayPlacement::FirstOfMonth,
        },
        today,
        at("2025-01-16T09:00:00Z"),
    )
    .expect("bulk rebuild");

    assert_eq!(report.total_sites, 2);
    assert!(report.results.iter().all(|result| result.success));
    assert_eq!(report.total_deleted, 6);
    assert_eq!(report.total_created, 6);
    let acme = report
        .results
        .iter()
        .find(|result| result.site.id == "acme")
        .expect("acme row");
    assert_eq!(acme.deleted, 3);
    assert_eq!(acme.created, 3);
}

#[test]
fn set_status_appends_exactly_one_history_row_per_transition() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");

    let first = set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::InProgress,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("first transition");
    assert_eq!(first.previous, MaintStatus::ToDo);
    assert_eq!(first.status, MaintStatus::InProgress);

    let second = set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::ChasedViaEmail,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: Some("second chase".to_string()),
        },
        at("2025-04-04T10:00:00Z"),
    )
    .expect("second transition");
    assert_eq!(second.previous, MaintStatus::InProgress);

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status_history.len(), 3);
    let last = item.status_history.last().expect("last entry");
    assert_eq!(last.from, Some(MaintStatus::InProgress));
    assert_eq!(last.to, MaintStatus::ChasedViaEmail);
    assert_eq!(last.by.as_deref(), Some("jo"));
    assert_eq!(last.note.as_deref(), Some("second chase"));
}

#[test]
fn set_status_on_missing_item_is_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();

    let err = set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "ghost".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::Completed,
            actor: None,
            from_hint: None,
            note: None,
        },
        Utc::now(),
    )
    .expect_err("not found");
    assert!(matches!(err, SchedulerError::ItemNotFound { .. }));
}

#[test]
fn completion_fires_once_and_summarizes_package_changes() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");
    // Inside the -30/+7 day window around April 1.
    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-03-20T12:00:00Z",
            &[("left-pad", "1.0.0", "1.3.0")],
        ))
        .expect("changelog in window");
    // Outside the window; must not appear.
    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-02-10T12:00:00Z",
            &[("stale-pkg", "0.1.0", "0.2.0")],
        ))
        .expect("changelog out of window");

    let outcome = set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::Completed,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("complete");
    assert_eq!(outcome.previous, MaintStatus::ToDo);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to, "owner@acme.test");
    assert!(mail.subject.contains("Maintenance completed"));
    assert!(mail.subject.contains("Acme"));
    assert!(mail.text.contains("left-pad"));
    assert!(mail.text.contains("1.3.0"));
    assert!(!mail.text.contains("stale-pkg"));

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status, MaintStatus::Completed);
    assert_eq!(item.completed_by.as_deref(), Some("jo"));
    assert!(item.completed_at.is_some());

    // A repeated Completed write appends history but sends nothing new.
    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::Completed,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T11:00:00Z"),
    )
    .expect("repeat completion");
    assert_eq!(notifier.sent().len(), 1);
    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status_history.len(), 3);
}

#[test]
fn delivery_failure_never_rolls_back_the_transition() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");

    let outcome = set_status(
        &store,
        &FailingNotifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::Completed,
            actor: None,
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("transition survives delivery failure");
    assert_eq!(outcome.status, MaintStatus::Completed);

    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status, MaintStatus::Completed);
}

#[test]
fn status_note_goes_to_the_group_recipient() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    let mut request = june_site("acme");
    request.group_email = Some("maintenance@group.test".to_string());
    save_site_schedule(&store, &request, today, at("2025-01-15T09:00:00Z")).expect("save");

    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::InProgress,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("transition");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "maintenance@group.test");
    assert!(sent[0].subject.contains("In Progress"));

    // Same-status write: history grows, no extra email.
    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::InProgress,
            actor: Some("jo".to_string()),
            from_hint: None,
            note: None,
        },
        at("2025-04-02T11:00:00Z"),
    )
    .expect("same-status write");
    assert_eq!(notifier.sent().len(), 1);
    let item = store
        .find_item("acme", SiteEnv::Production, day("2025-04-01"))
        .expect("find")
        .expect("item");
    assert_eq!(item.status_history.len(), 3);
}

#[test]
fn completion_into_group_site_sends_both_emails() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let notifier = RecordingNotifier::default();
    let today = day("2025-01-15");

    let mut request = june_site("acme");
    request.group_email = Some("maintenance@group.test".to_string());
    save_site_schedule(&store, &request, today, at("2025-01-15T09:00:00Z")).expect("save");

    set_status(
        &store,
        &notifier,
        &StatusChange {
            site_id: "acme".to_string(),
            env: SiteEnv::Production,
            date: day("2025-04-01"),
            status: MaintStatus::Completed,
            actor: None,
            from_hint: None,
            note: None,
        },
        at("2025-04-02T10:00:00Z"),
    )
    .expect("complete");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].subject.contains("completed"));
    assert!(sent[1].subject.contains("status"));
}

#[test]
fn overview_returns_the_next_upcoming_item_per_site() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("acme");
    let mut beta = june_site("beta");
    beta.name = Some("Beta".to_string());
    beta.renew_month = Some(3);
    save_site_schedule(&store, &beta, today, at("2025-01-15T09:05:00Z")).expect("beta");

    let rows = overview(&store, day("2025-04-15")).expect("overview");
    assert_eq!(rows.len(), 2);
    // Sites come back ordered by name.
    assert_eq!(rows[0].id, "acme");
    assert_eq!(rows[0].next_maintenance, Some(day("2025-05-01")));
    assert_eq!(rows[1].id, "beta");
    // Beta (March renewal): Jan pre-renewal, Feb report, Jul mid-year.
    assert_eq!(rows[1].next_maintenance, Some(day("2025-07-01")));

    // Past the window's end there is nothing upcoming.
    let rows = overview(&store, day("2026-06-01")).expect("late overview");
    assert_eq!(rows[0].next_maintenance, None);
    assert_eq!(rows[0].next_kind, None);
}

#[test]
fn delete_site_cascades_to_items_and_changelogs() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    save_site_schedule(&store, &june_site("acme"), today, at("2025-01-15T09:00:00Z"))
        .expect("save");
    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-03-20T12:00:00Z",
            &[("left-pad", "1.0.0", "1.3.0")],
        ))
        .expect("changelog");

    let deleted = delete_site(&store, "acme").expect("delete");
    assert_eq!(deleted.site, 1);
    assert_eq!(deleted.maintenance, 3);
    assert_eq!(deleted.changelogs, 1);
    assert!(store.get_site("acme").expect("get").is_none());
    assert_eq!(store.count_items("acme", SiteEnv::Production).expect("count"), 0);

    let err = delete_site(&store, "acme").expect_err("already gone");
    assert!(matches!(err, SchedulerError::SiteNotFound(_)));
}

#[test]
fn site_metadata_follows_set_and_clear_semantics() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);
    let today = day("2025-01-15");

    let mut request = june_site("acme");
    request.website_url = Some("acme.test".to_string());
    let outcome =
        save_site_schedule(&store, &request, today, at("2025-01-15T09:00:00Z")).expect("save");
    assert_eq!(outcome.site.website_url.as_deref(), Some("https://acme.test"));

    // Absent field: untouched.
    let outcome = save_site_schedule(&store, &june_site("acme"), today, at("2025-01-16T09:00:00Z"))
        .expect("resave");
    assert_eq!(outcome.site.website_url.as_deref(), Some("https://acme.test"));

    // Explicitly empty field: cleared.
    let mut request = june_site("acme");
    request.website_url = Some(String::new());
    let outcome =
        save_site_schedule(&store, &request, today, at("2025-01-17T09:00:00Z")).expect("clear");
    assert_eq!(outcome.site.website_url, None);

    let stored = store.get_site("acme").expect("get").expect("site");
    assert_eq!(stored.website_url, None);
    assert_eq!(stored.created_at, at("2025-01-15T09:00:00Z"));
}

#[test]
fn latest_changelog_and_upsert_overwrite() {
    let temp = TempDir::new().expect("tempdir");
    let store = test_store(&temp);

    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-03-20T12:00:00Z",
            &[("left-pad", "1.0.0", "1.2.0")],
        ))
        .expect("first delivery");
    // Redelivery of the same run overwrites the payload.
    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-03-20T12:00:00Z",
            &[("left-pad", "1.0.0", "1.3.0")],
        ))
        .expect("redelivery");
    store
        .upsert_changelog(&changelog(
            "acme",
            "2025-03-01T12:00:00Z",
            &[("older", "1.0.0", "1.1.0")],
        ))
        .expect("older run");

    let latest = store
        .latest_changelog("acme", SiteEnv::Production)
        .expect("latest")
        .expect("record");
    assert_eq!(latest.run_timestamp, at("2025-03-20T12:00:00Z"));
    assert_eq!(latest.changes.updated.len(), 1);
    assert_eq!(latest.changes.updated[0].new_version.as_deref(), Some("1.3.0"));

    let in_window = store
        .changelogs_between(
            "acme",
            SiteEnv::Production,
            at("2025-03-02T00:00:00Z"),
            at("2025-04-08T00:00:00Z"),
        )
        .expect("window query");
    assert_eq!(in_window.len(), 1);
}
