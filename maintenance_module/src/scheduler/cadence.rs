use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::{add_months, first_of_month, last_weekday_of_month};

use super::types::{ItemKind, Labels, PlannedEntry, ScheduleWindow};

/// Zero-based month indices derived from a site's renewal month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceIndices {
    pub pre_renewal: u32,
    pub report_due: u32,
    pub mid_year: u32,
}

/// Derive the three category months from a 1-based renewal month.
///
/// Pre-renewal sits two months before renewal, the report one month before,
/// and the mid-year check six months after pre-renewal. All arithmetic is
/// mod 12, normalized non-negative.
pub fn cadence_indices(renew_month: u32) -> CadenceIndices {
    let r = (renew_month + 11) % 12;
    let pre_renewal = (r + 10) % 12;
    let report_due = (r + 11) % 12;
    let mid_year = (pre_renewal + 6) % 12;
    CadenceIndices {
        pre_renewal,
        report_due,
        mid_year,
    }
}

/// Renewal months outside 1..=12 (or absent) coerce to the current UTC
/// month rather than being rejected. Observed behavior of the system this
/// one replaces; kept deliberately.
pub fn coerce_renew_month(raw: Option<i64>, today: NaiveDate) -> u32 {
    match raw {
        Some(n) if (1..=12).contains(&n) => n as u32,
        _ => today.month(),
    }
}

/// Where within an emitted month the work item lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPlacement {
    #[default]
    FirstOfMonth,
    /// Last weekday of the month; the bulk-anchor variant.
    LastBusinessDay,
}

/// Inclusive month span a generation call evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub fn window_span(today: NaiveDate, window: ScheduleWindow) -> WindowSpan {
    let this_month = first_of_month(today.year(), today.month0());
    WindowSpan {
        from: add_months(this_month, -(window.backfill_months as i32)),
        to: add_months(this_month, window.forward_months as i32),
    }
}

/// The canonical month-walk: step month by month across the window and
/// emit one entry for each month matching a cadence index. Months matching
/// none are skipped, so a full year contributes at most three entries.
pub fn plan_schedule(
    renew_month: u32,
    today: NaiveDate,
    window: ScheduleWindow,
    placement: DayPlacement,
) -> Vec<PlannedEntry> {
    let span = window_span(today, window);
    let stop = add_months(span.to, 1);
    let idx = cadence_indices(renew_month);

    let mut planned = Vec::new();
    let mut cursor = span.from;
    while cursor < stop {
        let month = cursor.month0();
        let on_pre = month == idx.pre_renewal;
        let on_report = month == idx.report_due;
        let on_mid = month == idx.mid_year;
        if on_pre || on_report || on_mid {
            let date = match placement {
                DayPlacement::FirstOfMonth => cursor,
                DayPlacement::LastBusinessDay => last_weekday_of_month(cursor.year(), month),
            };
            planned.push(PlannedEntry {
                date,
                kind: if on_report {
                    ItemKind::Report
                } else {
                    ItemKind::Maintenance
                },
                labels: Labels {
                    pre_renewal: on_pre,
                    report_due: on_report,
                    mid_year: on_mid,
                },
            });
        }
        cursor = add_months(cursor, 1);
    }
    planned
}
