//! Notification bodies for the status workflow. Pure rendering; the
//! workflow decides when and where to send.

use super::notifier::OutboundEmail;
use super::types::{
    ChangeAction, ChangelogRecord, ItemKind, MaintStatus, MaintenanceItem, PackageRow,
};

pub(super) fn compose_completion_email(
    item: &MaintenanceItem,
    rows: &[PackageRow],
    latest: Option<&ChangelogRecord>,
    to: String,
) -> OutboundEmail {
    let title = item_title(item);
    let date_str = item.date.format("%d %b %Y").to_string();
    let subject = format!(
        "{} completed - {} ({}) on {}",
        title, item.site.name, item.site.env, date_str
    );
    let chips = label_chips(item);

    let mut text = String::new();
    text.push_str(&format!("{} completed for {}\n", title, item.site.name));
    text.push_str(&format!("Site: {} ({})\n", item.site.name, item.site.id));
    text.push_str(&format!("Environment: {}\n", item.site.env));
    text.push_str(&format!("Date: {}\n", date_str));
    if !chips.is_empty() {
        text.push_str(&format!("Labels: {}\n", chips.join(", ")));
    }
    text.push_str("\nPackages changed around this maintenance:\n");
    if rows.is_empty() {
        text.push_str("No package changes found in the surrounding window.\n");
    } else {
        for row in rows {
            text.push_str(&row_line(row));
            text.push('\n');
        }
    }
    if let Some(record) = latest {
        let latest_rows = super::workflow::flatten_package_rows(std::slice::from_ref(record));
        text.push_str(&format!(
            "\nMost recent changelog (run {}):\n",
            record.run_timestamp.format("%Y-%m-%d %H:%M")
        ));
        if latest_rows.is_empty() {
            text.push_str("No package changes in that run.\n");
        } else {
            for row in &latest_rows {
                text.push_str(&row_line(row));
                text.push('\n');
            }
        }
    }
    if !item.status_history.is_empty() {
        text.push_str("\nHistory:\n");
        for entry in item.status_history.iter().rev() {
            text.push_str(&history_line(entry));
            text.push('\n');
        }
    }

    let mut html = String::new();
    html.push_str("<div style=\"font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif\">");
    html.push_str(&format!(
        "<h2 style=\"margin:0 0 6px\">{} completed for {}</h2>",
        escape_html(title),
        escape_html(&item.site.name)
    ));
    html.push_str(&format!(
        "<p style=\"margin:0 0 12px\"><b>Site:</b> {} ({})<br/><b>Environment:</b> {}<br/><b>Date:</b> {}</p>",
        escape_html(&item.site.name),
        escape_html(&item.site.id),
        item.site.env,
        escape_html(&date_str)
    ));
    if !chips.is_empty() {
        html.push_str(&format!(
            "<p style=\"margin:0 0 12px\"><b>Labels:</b> {}</p>",
            chips
                .iter()
                .map(|chip| escape_html(chip))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    html.push_str("<h3 style=\"margin:16px 0 8px\">Packages changed around this maintenance</h3>");
    html.push_str(&rows_html(rows, "No package changes found in the surrounding window."));
    if let Some(record) = latest {
        let latest_rows = super::workflow::flatten_package_rows(std::slice::from_ref(record));
        html.push_str(&format!(
            "<h3 style=\"margin:16px 0 8px\">Most recent changelog ({})</h3>",
            record.run_timestamp.format("%Y-%m-%d %H:%M")
        ));
        html.push_str(&rows_html(&latest_rows, "No package changes in that run."));
    }
    if !item.status_history.is_empty() {
        html.push_str("<h3 style=\"margin:16px 0 8px\">History</h3><ul style=\"margin:0;padding-left:18px\">");
        for entry in item.status_history.iter().rev() {
            html.push_str(&format!("<li>{}</li>", escape_html(&history_line(entry))));
        }
        html.push_str("</ul>");
    }
    html.push_str("</div>");

    OutboundEmail {
        to,
        subject,
        text,
        html,
    }
}

pub(super) fn compose_status_note(
    item: &MaintenanceItem,
    previous: MaintStatus,
    actor: Option<&str>,
    to: String,
) -> OutboundEmail {
    let title = item_title(item);
    let date_str = item.date.format("%d %b %Y").to_string();
    let subject = format!(
        "[{}] {} status: {}",
        item.site.name, title, item.status
    );
    let by = actor.unwrap_or("system");
    let text = format!(
        "{} for {} ({}) on {}\nStatus changed from \"{}\" to \"{}\" by {}.\n",
        title, item.site.name, item.site.env, date_str, previous, item.status, by
    );
    let html = format!(
        "<div style=\"font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif\">\
         <p>{} for <b>{}</b> ({}) on {}</p>\
         <p>Status changed from <code>{}</code> to <code>{}</code> by {}.</p></div>",
        escape_html(title),
        escape_html(&item.site.name),
        item.site.env,
        escape_html(&date_str),
        previous,
        item.status,
        escape_html(by)
    );
    OutboundEmail {
        to,
        subject,
        text,
        html,
    }
}

fn item_title(item: &MaintenanceItem) -> &'static str {
    if item.labels.report_due || item.kind == ItemKind::Report {
        "Report"
    } else {
        "Maintenance"
    }
}

fn label_chips(item: &MaintenanceItem) -> Vec<&'static str> {
    let mut chips = Vec::new();
    if item.labels.report_due {
        chips.push("Report");
    }
    if item.labels.pre_renewal {
        chips.push("Pre-renewal");
    }
    if item.labels.mid_year {
        chips.push("Mid-year");
    }
    chips
}

fn row_line(row: &PackageRow) -> String {
    match row.action {
        ChangeAction::Updated => format!(
            "updated {}: {} -> {}",
            row.name,
            row.old.as_deref().unwrap_or("?"),
            row.new_version.as_deref().unwrap_or("?")
        ),
        ChangeAction::Added => format!(
            "added {}: {}",
            row.name,
            row.new_version.as_deref().unwrap_or("?")
        ),
        ChangeAction::Removed => {
            format!("removed {}: {}", row.name, row.old.as_deref().unwrap_or("?"))
        }
    }
}

fn rows_html(rows: &[PackageRow], empty_note: &str) -> String {
    if rows.is_empty() {
        return format!("<p>{}</p>", escape_html(empty_note));
    }
    let mut html = String::from("<ul style=\"margin:0;padding-left:18px\">");
    for row in rows {
        html.push_str(&format!("<li>{}</li>", escape_html(&row_line(row))));
    }
    html.push_str("</ul>");
    html
}

fn history_line(entry: &super::types::StatusEntry) -> String {
    let when = entry.at.format("%Y-%m-%d %H:%M").to_string();
    let by = entry.by.as_deref().unwrap_or("Unknown");
    let from = entry.from.map(|status| status.as_str()).unwrap_or("N/A");
    format!(
        "{} - {} changed status from \"{}\" to \"{}\".",
        when, by, from, entry.to
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
