use chrono::{DateTime, Local};
use notice_core::{build_rows, AnnouncementRecord, RecordRow, EMPTY_HINT};

/// Creation time as local `MM/DD HH:MM`.
pub fn format_created(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|utc| utc.with_timezone(&Local).format("%m/%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn render_text(records: &[AnnouncementRecord], limit: usize) -> String {
    let rows = build_rows(records, limit, format_created);
    if rows.is_empty() {
        return EMPTY_HINT.to_string();
    }
    // rows carry the markup-escaped summary; plain text uses the record's own
    rows.iter()
        .zip(records)
        .map(|(row, record)| text_row(row, &record.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn text_row(row: &RecordRow, summary: &str) -> String {
    let mut out = format!("{}\n  {}", row.title, row.url);
    if !row.meta.is_empty() {
        out.push_str(&format!("\n  {}", row.meta));
    }
    for line in summary.lines() {
        out.push_str(&format!("\n  {line}"));
    }
    out
}

pub fn render_html(records: &[AnnouncementRecord], limit: usize) -> String {
    let rows = build_rows(records, limit, format_created);
    if rows.is_empty() {
        return format!("<p class=\"empty\">{EMPTY_HINT}</p>");
    }
    let items: String = rows.iter().map(html_row).collect();
    format!("<ul class=\"notices\">\n{items}</ul>")
}

fn html_row(row: &RecordRow) -> String {
    format!(
        "  <li data-id=\"{id}\">\n    <a href=\"{url}\" target=\"_blank\">{title}</a>\n    \
         <div class=\"meta\">{meta}</div>\n    <div class=\"summary\">{summary}</div>\n  </li>\n",
        id = escape(&row.id),
        url = escape(&row.url),
        title = escape(&row.title),
        meta = escape(&row.meta),
        summary = row.summary.replace('\n', "<br>"),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
