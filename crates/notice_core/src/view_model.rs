use crate::AnnouncementRecord;

/// Records shown by the display surface.
pub const DISPLAY_LIMIT: usize = 15;
/// Shown instead of rows when nothing has been cached yet.
pub const EMPTY_HINT: &str = "아직 저장된 공고가 없습니다.";
const META_SEPARATOR: &str = " · ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub title: String,
    /// Registration date, period and creation time, blanks omitted.
    pub meta: String,
    /// Summary with `<` escaped for markup output.
    pub summary: String,
    pub url: String,
}

/// Rows for the `limit` most recent records. `format_time` renders a record's
/// creation time (epoch milliseconds).
pub fn build_rows(
    records: &[AnnouncementRecord],
    limit: usize,
    format_time: impl Fn(i64) -> String,
) -> Vec<RecordRow> {
    records
        .iter()
        .take(limit)
        .map(|record| RecordRow {
            id: record.id.clone(),
            title: record.title.clone(),
            meta: meta_line(record, &format_time(record.created_at_epoch_ms)),
            summary: record.summary.replace('<', "&lt;"),
            url: record.url.clone(),
        })
        .collect()
}

fn meta_line(record: &AnnouncementRecord, created: &str) -> String {
    let date = if record.date.is_empty() {
        String::new()
    } else {
        format!("등록일 {}", record.date)
    };
    let period = if record.period.is_empty() {
        String::new()
    } else {
        format!("기간 {}", record.period)
    };
    [date.as_str(), period.as_str(), created]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(META_SEPARATOR)
}
