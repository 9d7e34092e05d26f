//! Extractive summaries of announcement bodies.
//!
//! The body is narrowed to the business-overview section when one exists,
//! cut into sentences, and the three sentences carrying the most domain
//! keywords are kept.

use crate::markup::prefix_chars;

/// Heading that introduces the business overview.
pub const OVERVIEW_MARKER: &str = "사업개요";
/// Headings (and footer text) that end the overview section.
pub const STOP_MARKERS: [&str; 6] = [
    "사업신청",
    "신청기간",
    "문의처",
    "첨부파일",
    "본문출력파일",
    "정보에 만족하셨나요?",
];
/// Support, recruitment, eligibility, period, amount, limit, funding, subsidy,
/// loan, startup, execution, conditions.
pub const KEYWORDS: [&str; 12] = [
    "지원", "모집", "대상", "기간", "금액", "한도", "자금", "보조", "융자", "창업", "수행", "조건",
];

/// Characters of page text used when there is no overview marker.
pub const FALLBACK_CHARS: usize = 800;
pub const PSEUDO_SENTENCE_CHARS: usize = 180;
/// Segments this long are un-split tables or navigation, not sentences.
pub const MAX_SENTENCE_CHARS: usize = 280;
pub const MAX_SENTENCES: usize = 3;
/// Hard cap including the ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 500;

const BULLET: &str = "• ";
const ELLIPSIS: char = '…';
const BULLET_GLYPHS: [char; 3] = ['•', '·', 'ㆍ'];

/// Summarize flattened page text (see [`crate::normalize`]).
pub fn summarize_text(plain: &str) -> String {
    let candidate = candidate_text(plain);
    let sentences = split_sentences(candidate);

    let picked: Vec<&str> = if sentences.is_empty() {
        vec![prefix_chars(candidate, PSEUDO_SENTENCE_CHARS)]
    } else {
        let mut scored: Vec<(&str, f64)> = sentences.into_iter().map(|s| (s, score(s))).collect();
        // stable: equal scores keep document order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(MAX_SENTENCES)
            .map(|(s, _)| s)
            .collect()
    };

    cap(format!("{BULLET}{}", picked.join(&format!("\n{BULLET}"))))
}

/// The overview section if the page has one, else the head of the page.
pub fn candidate_text(plain: &str) -> &str {
    let Some(start) = plain.find(OVERVIEW_MARKER) else {
        return prefix_chars(plain, FALLBACK_CHARS);
    };
    let section = &plain[start + OVERVIEW_MARKER.len()..];
    let cut = STOP_MARKERS
        .iter()
        .filter_map(|marker| section.find(marker))
        .min()
        .unwrap_or(section.len());
    section[..cut].trim()
}

/// Split on whitespace following `.`/`!`/`?`, on line breaks and on bullet
/// glyphs. Empty and overlong segments are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        let after_punct = matches!(prev, Some('.' | '!' | '?'));
        let continues: fn(char) -> bool = if c.is_whitespace() && after_punct {
            char::is_whitespace
        } else if c == '\n' || c == '\r' {
            |next| next == '\n' || next == '\r'
        } else if BULLET_GLYPHS.contains(&c) {
            char::is_whitespace
        } else {
            prev = Some(c);
            continue;
        };

        pieces.push(&text[piece_start..at]);
        let mut last = c;
        piece_start = at + c.len_utf8();
        while let Some(&(next_at, next)) = chars.peek() {
            if !continues(next) {
                break;
            }
            last = next;
            piece_start = next_at + next.len_utf8();
            chars.next();
        }
        prev = Some(last);
    }
    pieces.push(&text[piece_start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.chars().count() < MAX_SENTENCE_CHARS)
        .collect()
}

/// Two points per distinct keyword present, plus up to one point for length.
pub fn score(sentence: &str) -> f64 {
    let hits = KEYWORDS.iter().filter(|kw| sentence.contains(*kw)).count();
    let length_bonus = (sentence.chars().count() as f64 / 80.0).min(1.0);
    hits as f64 * 2.0 + length_bonus
}

fn cap(summary: String) -> String {
    if summary.chars().count() <= SUMMARY_MAX_CHARS {
        return summary;
    }
    let mut capped = prefix_chars(&summary, SUMMARY_MAX_CHARS - 1).to_string();
    capped.push(ELLIPSIS);
    capped
}
