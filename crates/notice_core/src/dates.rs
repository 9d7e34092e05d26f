//! Date-shaped tokens (`YYYY.MM.DD` / `YYYY-MM-DD`) in flattened text.

const DATE_LEN: usize = 10;

/// Does a date token start at byte offset `at`?
fn date_at(bytes: &[u8], at: usize) -> bool {
    let Some(token) = bytes.get(at..at + DATE_LEN) else {
        return false;
    };
    token.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => matches!(b, b'.' | b'-'),
        _ => b.is_ascii_digit(),
    })
}

/// Render a matched token with `-` separators.
fn iso(token: &str) -> String {
    token.replace('.', "-")
}

/// First date token anywhere in `text`, rendered as `YYYY-MM-DD`.
pub fn first_date(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    (0..bytes.len())
        .find(|&i| date_at(bytes, i))
        .map(|i| iso(&text[i..i + DATE_LEN]))
}

/// First `DATE ~ DATE` range in `text`, rendered as `"YYYY-MM-DD ~ YYYY-MM-DD"`.
///
/// The separator may be `~`, `-` or an en dash, with optional whitespace on
/// either side.
pub fn first_period(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    (0..bytes.len()).find_map(|start| {
        if !date_at(bytes, start) {
            return None;
        }
        let after_start = skip_whitespace(text, start + DATE_LEN);
        let rest = &text[after_start..];
        let separator_len = ['~', '-', '–']
            .iter()
            .find(|sep| rest.starts_with(**sep))
            .map(|sep| sep.len_utf8())?;
        let end = skip_whitespace(text, after_start + separator_len);
        date_at(bytes, end).then(|| {
            format!(
                "{} ~ {}",
                iso(&text[start..start + DATE_LEN]),
                iso(&text[end..end + DATE_LEN])
            )
        })
    })
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(offset, _)| from + offset)
}
