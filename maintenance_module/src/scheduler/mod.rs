mod cadence;
mod emails;
mod materializer;
mod notifier;
mod overview;
mod store;
mod types;
mod workflow;

pub use cadence::{
    cadence_indices, coerce_renew_month, plan_schedule, window_span, CadenceIndices, DayPlacement,
    WindowSpan,
};
pub use materializer::{
    bulk_rebuild, delete_site, save_site_schedule, BulkRebuildReport, BulkRebuildRequest,
    SaveScheduleOutcome, SaveScheduleRequest, SiteDeletion, SiteRebuildResult,
    REBUILD_ALL_CONFIRMATION,
};
pub use notifier::{Notifier, NotifyError, OutboundEmail, PostmarkNotifier};
pub use overview::{overview, SiteOverview};
pub use store::{ItemFilter, NewItem, SiteUpsert, SqliteMaintenanceStore};
pub use types::{
    ChangeAction, ChangeSet, ChangelogRecord, ItemKind, Labels, MaintStatus, MaintenanceItem,
    PackageChange, PackageRow, PlannedEntry, ScheduleWindow, SchedulerError, Site, SiteContact,
    SiteEnv, SiteRef, StatusEntry, DEFAULT_BACKFILL_MONTHS, DEFAULT_FORWARD_MONTHS,
};
pub use workflow::{flatten_package_rows, set_status, StatusChange, StatusChangeOutcome};

#[cfg(test)]
mod tests;
