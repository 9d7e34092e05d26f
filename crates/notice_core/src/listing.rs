use std::collections::HashSet;

use url::Url;

use crate::dates::first_date;
use crate::markup::{find_ascii_ci, normalize, TagScanner};
use crate::record::ListEntry;

/// Query parameter carrying the announcement identifier.
pub const ID_PARAM: &str = "pblancId=";
const DETAIL_PATH: &str = "view.do?";
/// Characters of context inspected on each side of an anchor for its date.
pub const DATE_WINDOW_CHARS: usize = 400;

/// Scan listing markup for announcement links.
///
/// Entries come back in document order of first occurrence, one per
/// identifier. Anchors whose href cannot be resolved against `base_url` or
/// carries no identifier are skipped. An empty vector means nothing matched;
/// the caller decides whether that is an error.
pub fn extract_list_items(markup: &str, base_url: &str) -> Vec<ListEntry> {
    let base = Url::parse(base_url).ok();
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    let mut scanner = TagScanner::new(markup);
    while let Some(open) = scanner.next() {
        if open.closing || !open.is("a") {
            continue;
        }
        let Some(href) = open.attr("href").filter(|href| is_detail_href(href)) else {
            continue;
        };
        // Anchors nested inside this one are consumed with it.
        let Some(close) = scanner.find_closing("a") else {
            break;
        };

        let Some(url) = resolve(href, base.as_ref()) else {
            continue;
        };
        let Some(id) = extract_id(url.as_str()) else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            continue;
        }

        let title = normalize(&markup[open.end..close.start]);
        let date = nearby_date(markup, open.start, close.end).unwrap_or_default();
        items.push(ListEntry {
            id: id.to_string(),
            url: url.to_string(),
            title,
            date,
        });
    }

    items
}

/// `view.do?` followed somewhere later by `pblancId=` and a non-empty value.
fn is_detail_href(href: &str) -> bool {
    let Some(view) = find_ascii_ci(href, DETAIL_PATH, 0) else {
        return false;
    };
    find_ascii_ci(href, ID_PARAM, view + DETAIL_PATH.len())
        .is_some_and(|at| at + ID_PARAM.len() < href.len())
}

fn resolve(href: &str, base: Option<&Url>) -> Option<Url> {
    let href = href.trim().replace("&amp;", "&");
    match base {
        Some(base) => base.join(&href).ok(),
        None => Url::parse(&href).ok(),
    }
}

/// Identifier following `pblancId=` in a resolved URL.
pub fn extract_id(url: &str) -> Option<&str> {
    let value_start = url.find(ID_PARAM)? + ID_PARAM.len();
    let value = &url[value_start..];
    let len = value
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        .count();
    (len > 0).then(|| &value[..len])
}

/// First date in the flattened text around `[start, end)`.
fn nearby_date(markup: &str, start: usize, end: usize) -> Option<String> {
    let window_start = markup[..start]
        .char_indices()
        .rev()
        .nth(DATE_WINDOW_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let window_end = markup[end..]
        .char_indices()
        .nth(DATE_WINDOW_CHARS)
        .map_or(markup.len(), |(i, _)| end + i);
    first_date(&normalize(&markup[window_start..window_end]))
}
