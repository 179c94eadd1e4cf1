use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::dates::{parse_iso_date, to_iso_date};

use super::types::{
    ChangeSet, ChangelogRecord, Labels, MaintStatus, MaintenanceItem, PlannedEntry,
    SchedulerError, Site, SiteContact, SiteEnv, SiteRef, StatusEntry,
};

const ITEM_LIST_LIMIT_DEFAULT: usize = 100;
const ITEM_LIST_LIMIT_MAX: usize = 500;
const CHANGELOG_QUERY_LIMIT: usize = 100;

const MAINTENANCE_SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sites (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    env TEXT NOT NULL DEFAULT 'production',
    renew_month INTEGER NOT NULL,
    website_url TEXT,
    git_url TEXT,
    group_email TEXT,
    contact_name TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS maintenance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    site_env TEXT NOT NULL,
    site_name TEXT NOT NULL,
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    pre_renewal INTEGER NOT NULL DEFAULT 0,
    report_due INTEGER NOT NULL DEFAULT 0,
    mid_year INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'To-Do',
    completed_at TEXT,
    completed_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (site_id, site_env, date)
);

CREATE TABLE IF NOT EXISTS status_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES maintenance(id) ON DELETE CASCADE,
    at TEXT NOT NULL,
    actor TEXT,
    from_status TEXT,
    to_status TEXT NOT NULL,
    note TEXT
);

CREATE TABLE IF NOT EXISTS changelogs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    site_env TEXT NOT NULL,
    run_timestamp TEXT NOT NULL,
    received_at TEXT NOT NULL,
    payload TEXT NOT NULL,
    UNIQUE (site_id, site_env, run_timestamp)
);
"#;

fn ensure_sites_columns(conn: &Connection) -> Result<(), SchedulerError> {
    let mut stmt = conn.prepare("PRAGMA table_info(sites)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut columns = HashSet::new();
    for row in rows {
        columns.insert(row?);
    }

    if !columns.contains("group_email") {
        conn.execute("ALTER TABLE sites ADD COLUMN group_email TEXT", [])?;
    }
    Ok(())
}

/// Fresh work item handed to the store by the materializer.
#[derive(Debug, Clone, Copy)]
pub struct NewItem<'a> {
    pub site_id: &'a str,
    pub site_env: SiteEnv,
    pub site_name: &'a str,
    pub entry: &'a PlannedEntry,
}

/// Site upsert payload. Metadata fields follow tri-state semantics: `None`
/// leaves the stored value untouched, an empty value clears it, anything
/// else replaces it. `name`, `env` and `renew_month` are always written.
#[derive(Debug, Clone, Default)]
pub struct SiteUpsert {
    pub id: String,
    pub name: Option<String>,
    pub env: Option<SiteEnv>,
    pub renew_month: u32,
    pub website_url: Option<String>,
    pub git_url: Option<String>,
    pub group_email: Option<String>,
    pub primary_contact: Option<SiteContact>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub site_id: Option<String>,
    pub env: Option<SiteEnv>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Write applied by the status workflow: one item update plus one history
/// row, committed together.
#[derive(Debug, Clone, Copy)]
pub struct StatusWrite<'a> {
    pub row_id: i64,
    pub status: MaintStatus,
    pub actor: Option<&'a str>,
    pub from: Option<MaintStatus>,
    pub note: Option<&'a str>,
    pub completing: bool,
    pub at: DateTime<Utc>,
}

/// SQLite realization of the document-store collaborator. Holds only the
/// database path; every call opens its own short-lived connection.
#[derive(Debug, Clone)]
pub struct SqliteMaintenanceStore {
    path: PathBuf,
}

impl SqliteMaintenanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SchedulerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path };
        let conn = store.open()?;
        conn.execute_batch(MAINTENANCE_SCHEMA)?;
        ensure_sites_columns(&conn)?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection, SchedulerError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    // --- sites -----------------------------------------------------------

    pub fn upsert_site(
        &self,
        upsert: &SiteUpsert,
        now: DateTime<Utc>,
    ) -> Result<Site, SchedulerError> {
        let conn = self.open()?;
        let existing = get_site_with(&conn, &upsert.id)?;

        let mut site = existing.unwrap_or(Site {
            id: upsert.id.clone(),
            name: upsert.id.clone(),
            env: SiteEnv::default(),
            renew_month: upsert.renew_month,
            website_url: None,
            git_url: None,
            group_email: None,
            primary_contact: None,
            created_at: now,
            updated_at: now,
        });

        site.name = upsert
            .name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(&upsert.id)
            .to_string();
        site.env = upsert.env.unwrap_or_default();
        site.renew_month = upsert.renew_month;
        if let Some(value) = &upsert.website_url {
            site.website_url = non_empty(value);
        }
        if let Some(value) = &upsert.git_url {
            site.git_url = non_empty(value);
        }
        if let Some(value) = &upsert.group_email {
            site.group_email = non_empty(value);
        }
        if let Some(contact) = &upsert.primary_contact {
            site.primary_contact = if contact.is_empty() {
                None
            } else {
                Some(SiteContact {
                    name: contact.name.trim().to_string(),
                    email: contact.email.trim().to_string(),
                    phone: contact.phone.trim().to_string(),
                })
            };
        }
        site.updated_at = now;

        let contact = site.primary_contact.clone().unwrap_or_default();
        conn.execute(
            "INSERT INTO sites (id, name, env, renew_month, website_url, git_url, group_email,
                                contact_name, contact_email, contact_phone, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 env = excluded.env,
                 renew_month = excluded.renew_month,
                 website_url = excluded.website_url,
                 git_url = excluded.git_url,
                 group_email = excluded.group_email,
                 contact_name = excluded.contact_name,
                 contact_email = excluded.contact_email,
                 contact_phone = excluded.contact_phone,
                 updated_at = excluded.updated_at",
            params![
                site.id,
                site.name,
                site.env.as_str(),
                site.renew_month as i64,
                site.website_url,
                site.git_url,
                site.group_email,
                non_empty(&contact.name),
                non_empty(&contact.email),
                non_empty(&contact.phone),
                format_datetime(site.created_at),
                format_datetime(site.updated_at),
            ],
        )?;
        Ok(site)
    }

    pub fn get_site(&self, id: &str) -> Result<Option<Site>, SchedulerError> {
        let conn = self.open()?;
        get_site_with(&conn, id)
    }

    pub fn list_sites(&self) -> Result<Vec<Site>, SchedulerError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SITE_COLUMNS} FROM sites ORDER BY name, id"
        ))?;
        let rows = stmt.query_map([], read_site_row)?;
        let mut sites = Vec::new();
        for row in rows {
            sites.push(site_from_row(row?)?);
        }
        Ok(sites)
    }

    /// Delete a site and everything stored under its id, across all
    /// environments. Returns `(sites, maintenance, changelogs)` counts.
    pub fn delete_site(&self, id: &str) -> Result<(usize, usize, usize), SchedulerError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let maintenance = tx.execute("DELETE FROM maintenance WHERE site_id = ?1", params![id])?;
        let changelogs = tx.execute("DELETE FROM changelogs WHERE site_id = ?1", params![id])?;
        let sites = tx.execute("DELETE FROM sites WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok((sites, maintenance, changelogs))
    }

    // --- maintenance items ----------------------------------------------

    /// Insert-if-absent. Existing items at the same `(site, env, date)` are
    /// left untouched so manual status edits survive regeneration. Returns
    /// whether a row was created.
    pub fn insert_item_if_absent(
        &self,
        item: &NewItem<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, SchedulerError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let inserted = insert_item_row(&tx, item, now)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Overwrite semantics: recomputed labels, kind and site name take
    /// effect on an existing row without touching its status or history;
    /// missing rows are created. Returns whether a row was created.
    pub fn upsert_item(
        &self,
        item: &NewItem<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, SchedulerError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE maintenance
             SET site_name = ?1, kind = ?2, pre_renewal = ?3, report_due = ?4, mid_year = ?5,
                 updated_at = ?6
             WHERE site_id = ?7 AND site_env = ?8 AND date = ?9",
            params![
                item.site_name,
                item.entry.kind.as_str(),
                bool_to_int(item.entry.labels.pre_renewal),
                bool_to_int(item.entry.labels.report_due),
                bool_to_int(item.entry.labels.mid_year),
                format_datetime(now),
                item.site_id,
                item.site_env.as_str(),
                to_iso_date(item.entry.date),
            ],
        )?;
        let created = if updated == 0 {
            insert_item_row(&tx, item, now)?
        } else {
            false
        };
        tx.commit()?;
        Ok(created)
    }

    pub fn delete_items(&self, site_id: &str, env: SiteEnv) -> Result<usize, SchedulerError> {
        let conn = self.open()?;
        let deleted = conn.execute(
            "DELETE FROM maintenance WHERE site_id = ?1 AND site_env = ?2",
            params![site_id, env.as_str()],
        )?;
        Ok(deleted)
    }

    pub fn find_item(
        &self,
        site_id: &str,
        env: SiteEnv,
        date: NaiveDate,
    ) -> Result<Option<MaintenanceItem>, SchedulerError> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM maintenance
                     WHERE site_id = ?1 AND site_env = ?2 AND date = ?3"
                ),
                params![site_id, env.as_str(), to_iso_date(date)],
                read_item_row,
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(item_from_row(&conn, raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<MaintenanceItem>, SchedulerError> {
        let conn = self.open()?;
        let mut conditions = Vec::new();
        let mut bindings: Vec<String> = Vec::new();
        if let Some(site_id) = &filter.site_id {
            bindings.push(site_id.clone());
            conditions.push(format!("site_id = ?{}", bindings.len()));
        }
        if let Some(env) = filter.env {
            bindings.push(env.as_str().to_string());
            conditions.push(format!("site_env = ?{}", bindings.len()));
        }
        if let Some(from) = filter.from {
            bindings.push(to_iso_date(from));
            conditions.push(format!("date >= ?{}", bindings.len()));
        }
        if let Some(to) = filter.to {
            bindings.push(to_iso_date(to));
            conditions.push(format!("date <= ?{}", bindings.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let limit = filter
            .limit
            .unwrap_or(ITEM_LIST_LIMIT_DEFAULT)
            .min(ITEM_LIST_LIMIT_MAX);
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM maintenance{where_clause} ORDER BY date LIMIT {limit}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(bindings.iter()), read_item_row)?;
        let mut raws = Vec::new();
        for row in rows {
            raws.push(row?);
        }
        let mut items = Vec::new();
        for raw in raws {
            items.push(item_from_row(&conn, raw)?);
        }
        Ok(items)
    }

    /// Earliest item for the site/environment falling on or after `date`.
    pub fn next_item_on_or_after(
        &self,
        site_id: &str,
        env: SiteEnv,
        date: NaiveDate,
    ) -> Result<Option<MaintenanceItem>, SchedulerError> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM maintenance
                     WHERE site_id = ?1 AND site_env = ?2 AND date >= ?3
                     ORDER BY date LIMIT 1"
                ),
                params![site_id, env.as_str(), to_iso_date(date)],
                read_item_row,
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(item_from_row(&conn, raw)?)),
            None => Ok(None),
        }
    }

    pub fn count_items(&self, site_id: &str, env: SiteEnv) -> Result<usize, SchedulerError> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM maintenance WHERE site_id = ?1 AND site_env = ?2",
            params![site_id, env.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Apply one status transition: the item update and its history row
    /// commit together or not at all.
    pub fn apply_status(&self, write: &StatusWrite<'_>) -> Result<(), SchedulerError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        if write.completing {
            tx.execute(
                "UPDATE maintenance
                 SET status = ?1, updated_at = ?2, completed_at = ?2, completed_by = ?3
                 WHERE id = ?4",
                params![
                    write.status.as_str(),
                    format_datetime(write.at),
                    write.actor,
                    write.row_id,
                ],
            )?;
        } else {
            tx.execute(
                "UPDATE maintenance SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![write.status.as_str(), format_datetime(write.at), write.row_id],
            )?;
        }
        tx.execute(
            "INSERT INTO status_history (item_id, at, actor, from_status, to_status, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                write.row_id,
                format_datetime(write.at),
                write.actor,
                write.from.map(|status| status.as_str()),
                write.status.as_str(),
                write.note,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    // --- changelogs ------------------------------------------------------

    /// Upsert keyed by `(site, env, run timestamp)`; re-delivery of the
    /// same run overwrites the payload.
    pub fn upsert_changelog(&self, record: &ChangelogRecord) -> Result<(), SchedulerError> {
        let conn = self.open()?;
        let payload = serde_json::to_string(&record.changes)?;
        conn.execute(
            "INSERT INTO changelogs (site_id, site_env, run_timestamp, received_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (site_id, site_env, run_timestamp) DO UPDATE SET
                 received_at = excluded.received_at,
                 payload = excluded.payload",
            params![
                record.site_id,
                record.site_env.as_str(),
                format_datetime(record.run_timestamp),
                format_datetime(record.received_at),
                payload,
            ],
        )?;
        Ok(())
    }

    /// Records whose run timestamp falls inside `[from, to]`, most recent
    /// first, capped at 100.
    pub fn changelogs_between(
        &self,
        site_id: &str,
        env: SiteEnv,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ChangelogRecord>, SchedulerError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT site_id, site_env, run_timestamp, received_at, payload FROM changelogs
             WHERE site_id = ?1 AND site_env = ?2 AND run_timestamp >= ?3 AND run_timestamp <= ?4
             ORDER BY run_timestamp DESC LIMIT {CHANGELOG_QUERY_LIMIT}"
        ))?;
        let rows = stmt.query_map(
            params![
                site_id,
                env.as_str(),
                format_datetime(from),
                format_datetime(to)
            ],
            read_changelog_row,
        )?;
        let mut records = Vec::new();
        for row in rows {
            records.push(changelog_from_row(row?)?);
        }
        Ok(records)
    }

    pub fn latest_changelog(
        &self,
        site_id: &str,
        env: SiteEnv,
    ) -> Result<Option<ChangelogRecord>, SchedulerError> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                "SELECT site_id, site_env, run_timestamp, received_at, payload FROM changelogs
                 WHERE site_id = ?1 AND site_env = ?2
                 ORDER BY run_timestamp DESC LIMIT 1",
                params![site_id, env.as_str()],
                read_changelog_row,
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(changelog_from_row(raw)?)),
            None => Ok(None),
        }
    }
}

// --- row plumbing --------------------------------------------------------

const SITE_COLUMNS: &str = "id, name, env, renew_month, website_url, git_url, group_email, \
                            contact_name, contact_email, contact_phone, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, site_id, site_env, site_name, date, kind, pre_renewal, \
                            report_due, mid_year, status, completed_at, completed_by, \
                            created_at, updated_at";

type SiteRow = (
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn read_site_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SiteRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn site_from_row(raw: SiteRow) -> Result<Site, SchedulerError> {
    let (
        id,
        name,
        env,
        renew_month,
        website_url,
        git_url,
        group_email,
        contact_name,
        contact_email,
        contact_phone,
        created_at,
        updated_at,
    ) = raw;
    let contact = SiteContact {
        name: contact_name.unwrap_or_default(),
        email: contact_email.unwrap_or_default(),
        phone: contact_phone.unwrap_or_default(),
    };
    Ok(Site {
        id,
        name,
        env: env.parse()?,
        renew_month: renew_month as u32,
        website_url,
        git_url,
        group_email,
        primary_contact: if contact.is_empty() {
            None
        } else {
            Some(contact)
        },
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn get_site_with(conn: &Connection, id: &str) -> Result<Option<Site>, SchedulerError> {
    let raw = conn
        .query_row(
            &format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = ?1"),
            params![id],
            read_site_row,
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(site_from_row(raw)?)),
        None => Ok(None),
    }
}

type ItemRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn read_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
    ))
}

fn item_from_row(conn: &Connection, raw: ItemRow) -> Result<MaintenanceItem, SchedulerError> {
    let (
        row_id,
        site_id,
        site_env,
        site_name,
        date,
        kind,
        pre_renewal,
        report_due,
        mid_year,
        status,
        completed_at,
        completed_by,
        created_at,
        updated_at,
    ) = raw;
    let status_history = load_history(conn, row_id)?;
    Ok(MaintenanceItem {
        row_id,
        site: SiteRef {
            id: site_id,
            name: site_name,
            env: site_env.parse()?,
        },
        date: parse_iso_date(&date)?,
        kind: kind.parse()?,
        labels: Labels {
            pre_renewal: pre_renewal != 0,
            report_due: report_due != 0,
            mid_year: mid_year != 0,
        },
        status: status.parse()?,
        status_history,
        completed_at: parse_optional_datetime(completed_at.as_deref())?,
        completed_by,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn load_history(conn: &Connection, item_id: i64) -> Result<Vec<StatusEntry>, SchedulerError> {
    let mut stmt = conn.prepare(
        "SELECT at, actor, from_status, to_status, note FROM status_history
         WHERE item_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![item_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;
    let mut entries = Vec::new();
    for row in rows {
        let (at, actor, from_status, to_status, note) = row?;
        entries.push(StatusEntry {
            at: parse_datetime(&at)?,
            by: actor,
            from: from_status
                .as_deref()
                .map(str::parse::<MaintStatus>)
                .transpose()?,
            to: to_status.parse()?,
            note,
        });
    }
    Ok(entries)
}

fn insert_item_row(
    tx: &rusqlite::Transaction<'_>,
    item: &NewItem<'_>,
    now: DateTime<Utc>,
) -> Result<bool, SchedulerError> {
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO maintenance
             (site_id, site_env, site_name, date, kind, pre_renewal, report_due, mid_year,
              status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            item.site_id,
            item.site_env.as_str(),
            item.site_name,
            to_iso_date(item.entry.date),
            item.entry.kind.as_str(),
            bool_to_int(item.entry.labels.pre_renewal),
            bool_to_int(item.entry.labels.report_due),
            bool_to_int(item.entry.labels.mid_year),
            MaintStatus::ToDo.as_str(),
            format_datetime(now),
        ],
    )?;
    if inserted == 0 {
        return Ok(false);
    }
    // Seed the audit log with the creation state.
    tx.execute(
        "INSERT INTO status_history (item_id, at, to_status) VALUES (?1, ?2, ?3)",
        params![
            tx.last_insert_rowid(),
            format_datetime(now),
            MaintStatus::ToDo.as_str(),
        ],
    )?;
    Ok(true)
}

type ChangelogRow = (String, String, String, String, String);

fn read_changelog_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChangelogRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn changelog_from_row(raw: ChangelogRow) -> Result<ChangelogRecord, SchedulerError> {
    let (site_id, site_env, run_timestamp, received_at, payload) = raw;
    let changes: ChangeSet = serde_json::from_str(&payload)?;
    Ok(ChangelogRecord {
        site_id,
        site_env: site_env.parse()?,
        run_timestamp: parse_datetime(&run_timestamp)?,
        received_at: parse_datetime(&received_at)?,
        changes,
    })
}

pub(crate) fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>, SchedulerError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn parse_optional_datetime(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    match value {
        Some(raw) => Ok(Some(parse_datetime(raw)?)),
        None => Ok(None),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
