use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKFILL_MONTHS: i64 = 12;
pub const DEFAULT_FORWARD_MONTHS: i64 = 14;
pub(crate) const WINDOW_MONTHS_MAX: i64 = 60;

/// Deployment environment a site's schedule is tracked under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteEnv {
    #[default]
    Production,
    Staging,
    Dev,
    Test,
}

impl SiteEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteEnv::Production => "production",
            SiteEnv::Staging => "staging",
            SiteEnv::Dev => "dev",
            SiteEnv::Test => "test",
        }
    }
}

impl std::fmt::Display for SiteEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SiteEnv {
    type Err = SchedulerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "production" => Ok(SiteEnv::Production),
            "staging" => Ok(SiteEnv::Staging),
            "dev" => Ok(SiteEnv::Dev),
            "test" => Ok(SiteEnv::Test),
            other => Err(SchedulerError::UnknownEnv(other.to_string())),
        }
    }
}

/// Work-item status. The engine accepts any-to-any transitions; `Completed`
/// is terminal only by operator convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintStatus {
    #[default]
    #[serde(rename = "To-Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Awaiting Form Conf")]
    AwaitingFormConf,
    #[serde(rename = "Chased Via Email")]
    ChasedViaEmail,
    #[serde(rename = "Chased Via Phone")]
    ChasedViaPhone,
    Completed,
}

impl MaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintStatus::ToDo => "To-Do",
            MaintStatus::InProgress => "In Progress",
            MaintStatus::AwaitingFormConf => "Awaiting Form Conf",
            MaintStatus::ChasedViaEmail => "Chased Via Email",
            MaintStatus::ChasedViaPhone => "Chased Via Phone",
            MaintStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for MaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MaintStatus {
    type Err = SchedulerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "To-Do" => Ok(MaintStatus::ToDo),
            "In Progress" => Ok(MaintStatus::InProgress),
            "Awaiting Form Conf" => Ok(MaintStatus::AwaitingFormConf),
            "Chased Via Email" => Ok(MaintStatus::ChasedViaEmail),
            "Chased Via Phone" => Ok(MaintStatus::ChasedViaPhone),
            "Completed" => Ok(MaintStatus::Completed),
            other => Err(SchedulerError::UnknownStatus(other.to_string())),
        }
    }
}

/// Reports are a distinct work type, not a label on a maintenance item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Maintenance,
    Report,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Maintenance => "maintenance",
            ItemKind::Report => "report",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = SchedulerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "maintenance" => Ok(ItemKind::Maintenance),
            "report" => Ok(ItemKind::Report),
            other => Err(SchedulerError::UnknownKind(other.to_string())),
        }
    }
}

/// Category labels carried by a scheduled date. In the normal case exactly
/// one is true, consistent with the item's kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Labels {
    pub pre_renewal: bool,
    pub report_due: bool,
    pub mid_year: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl SiteContact {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.email.trim().is_empty() && self.phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    pub env: SiteEnv,
    pub renew_month: u32,
    pub website_url: Option<String>,
    pub git_url: Option<String>,
    pub group_email: Option<String>,
    pub primary_contact: Option<SiteContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized site identity embedded in items and batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRef {
    pub id: String,
    pub name: String,
    pub env: SiteEnv,
}

/// One row of the append-only transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub at: DateTime<Utc>,
    pub by: Option<String>,
    pub from: Option<MaintStatus>,
    pub to: MaintStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceItem {
    #[serde(skip)]
    pub(crate) row_id: i64,
    pub site: SiteRef,
    pub date: NaiveDate,
    pub kind: ItemKind,
    pub labels: Labels,
    pub status: MaintStatus,
    pub status_history: Vec<StatusEntry>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One planned `(date, kind, labels)` entry before materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntry {
    pub date: NaiveDate,
    pub kind: ItemKind,
    pub labels: Labels,
}

/// Transient span of months evaluated on each (re)generation, relative to
/// the first day of the current month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    pub backfill_months: u32,
    pub forward_months: u32,
}

impl Default for ScheduleWindow {
    fn default() -> Self {
        Self::clamped(DEFAULT_BACKFILL_MONTHS, DEFAULT_FORWARD_MONTHS)
    }
}

impl ScheduleWindow {
    pub fn clamped(backfill_months: i64, forward_months: i64) -> Self {
        Self {
            backfill_months: backfill_months.clamp(0, WINDOW_MONTHS_MAX) as u32,
            forward_months: forward_months.clamp(0, WINDOW_MONTHS_MAX) as u32,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub updated: Vec<PackageChange>,
    #[serde(default)]
    pub added: Vec<PackageChange>,
    #[serde(default)]
    pub removed: Vec<PackageChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(default, rename = "new", skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

/// One ingested package-change report for a site/environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogRecord {
    pub site_id: String,
    pub site_env: SiteEnv,
    pub run_timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub changes: ChangeSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Updated,
    Added,
    Removed,
}

/// A change record flattened to one package per row for notification bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRow {
    pub action: ChangeAction,
    pub name: String,
    pub old: Option<String>,
    #[serde(rename = "new")]
    pub new_version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing site id")]
    MissingSiteId,
    #[error("unknown environment: {0}")]
    UnknownEnv(String),
    #[error("unknown status: {0}")]
    UnknownStatus(String),
    #[error("unknown item kind: {0}")]
    UnknownKind(String),
    #[error("site not found: {0}")]
    SiteNotFound(String),
    #[error("maintenance item not found: {site_id}/{env} on {date}")]
    ItemNotFound {
        site_id: String,
        env: SiteEnv,
        date: NaiveDate,
    },
    #[error("bulk rebuild requires confirmText \"REBUILD ALL SITES\"")]
    ConfirmationRequired,
}
