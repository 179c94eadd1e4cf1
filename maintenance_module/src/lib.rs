pub mod dates;
pub mod service;

mod scheduler;

pub use scheduler::{
    bulk_rebuild, cadence_indices, coerce_renew_month, delete_site, flatten_package_rows,
    overview, plan_schedule, save_site_schedule, set_status, window_span, BulkRebuildReport,
    BulkRebuildRequest, CadenceIndices, ChangeAction, ChangeSet, ChangelogRecord, DayPlacement,
    ItemFilter, ItemKind, Labels, MaintStatus, MaintenanceItem, Notifier, NotifyError,
    OutboundEmail, PackageChange, PackageRow, PlannedEntry, PostmarkNotifier, SaveScheduleOutcome,
    SaveScheduleRequest, ScheduleWindow, SchedulerError, Site, SiteContact, SiteDeletion, SiteEnv,
    SiteOverview, SiteRebuildResult, SiteRef, SiteUpsert, SqliteMaintenanceStore, StatusChange,
    StatusChangeOutcome, StatusEntry, WindowSpan, REBUILD_ALL_CONFIRMATION,
};
