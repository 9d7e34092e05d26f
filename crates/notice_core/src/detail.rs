use crate::dates::first_period;
use crate::markup::{first_element_inner, normalize};
use crate::record::DetailSummary;
use crate::summarize::summarize_text;

/// Used when the page has neither a title nor a top-level heading.
pub const FALLBACK_TITLE: &str = "새 공고";

/// Title, validity period and extractive summary of a detail page.
pub fn summarize_detail(markup: &str) -> DetailSummary {
    let plain = normalize(markup);
    DetailSummary {
        title: detail_title(markup),
        summary: summarize_text(&plain),
        period: first_period(&plain).unwrap_or_default(),
    }
}

/// `<title>`, else the first `<h1>`/`<h2>`, else [`FALLBACK_TITLE`].
pub fn detail_title(markup: &str) -> String {
    let candidates: [&[&str]; 2] = [&["title"], &["h1", "h2"]];
    candidates
        .iter()
        .filter_map(|names| first_element_inner(markup, names))
        .map(normalize)
        .find(|title| !title.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}
