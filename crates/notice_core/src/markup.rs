//! Heuristic markup handling.
//!
//! Nothing in here builds a document tree. [`normalize`] flattens markup into a
//! single line of text and [`TagScanner`] walks a buffer tag by tag. Both are
//! total: malformed input degrades into plain text instead of an error.

/// Flatten markup into plain text.
///
/// Script and style blocks are dropped, every other tag becomes a space,
/// `&nbsp;` and `&amp;` are decoded (in that order), whitespace runs collapse
/// into one space and the result is trimmed. Other entities are left as-is.
pub fn normalize(markup: &str) -> String {
    let without_scripts = remove_blocks(markup, "script");
    let without_styles = remove_blocks(&without_scripts, "style");
    let untagged = replace_tags(&without_styles);
    let decoded = untagged.replace("&nbsp;", " ").replace("&amp;", "&");
    collapse_whitespace(&decoded)
}

/// Drop `<name …>…</name>` blocks. An opening without a matching close is kept
/// and later handled like any other tag.
fn remove_blocks(text: &str, name: &str) -> String {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(start) = find_ascii_ci(text, &open, cursor) {
        let Some(close_at) = find_ascii_ci(text, &close, start + open.len()) else {
            break;
        };
        out.push_str(&text[cursor..start]);
        cursor = close_at + close.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Replace `<` + at least one non-`>` character + `>` with a single space.
fn replace_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('<') {
        let lt = search_from + offset;
        match text[lt + 1..].find('>') {
            // "<>" is not a tag
            Some(0) => search_from = lt + 1,
            Some(len) => {
                out.push_str(&text[cursor..lt]);
                out.push(' ');
                cursor = lt + 1 + len + 1;
                search_from = cursor;
            }
            None => break,
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `max_chars` characters of `text`.
pub fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// ASCII case-insensitive substring search starting at byte offset `from`.
///
/// The needle is expected to be ASCII, so any returned offset is a char
/// boundary of `haystack`.
pub(crate) fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || from > hay.len() || hay.len() - from < pat.len() {
        return None;
    }
    (from..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

/// One opening or closing tag found by [`TagScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Tag name as written in the source (case preserved).
    pub name: &'a str,
    /// `true` for `</name>`.
    pub closing: bool,
    /// Raw text between the name and the closing `>`.
    pub attrs: &'a str,
    /// Byte offset of the `<`.
    pub start: usize,
    /// Byte offset just past the `>`.
    pub end: usize,
}

impl<'a> Tag<'a> {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Value of the first attribute called `name` (ASCII case-insensitive).
    /// Valueless attributes yield an empty string.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        AttrIter::new(self.attrs)
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Forgiving tag tokenizer over a byte-indexed buffer.
///
/// Text between tags is skipped, comments are skipped, quoted attribute values
/// may contain `>`. Anything that does not look like a tag is treated as text.
/// The scanner stops at the first `<name` that never closes.
#[derive(Debug, Clone)]
pub struct TagScanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::starting_at(src, 0)
    }

    pub fn starting_at(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos: pos.min(src.len()),
        }
    }

    /// Advance to the next closing tag called `name`.
    pub fn find_closing(&mut self, name: &str) -> Option<Tag<'a>> {
        self.find(|tag| tag.closing && tag.is(name))
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        let bytes = self.src.as_bytes();
        loop {
            let lt = self.pos + self.src[self.pos..].find('<')?;
            let rest = &self.src[lt + 1..];

            if rest.starts_with("!--") {
                self.pos = match rest.find("-->") {
                    Some(offset) => lt + 1 + offset + 3,
                    None => self.src.len(),
                };
                continue;
            }

            let closing = rest.starts_with('/');
            let name_start = lt + 1 + usize::from(closing);
            let name_len = bytes[name_start..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-' || **b == b':')
                .count();
            if name_len == 0 || !bytes[name_start].is_ascii_alphabetic() {
                self.pos = lt + 1;
                continue;
            }
            let name_end = name_start + name_len;

            let Some(gt) = find_tag_end(bytes, name_end) else {
                self.pos = self.src.len();
                return None;
            };
            self.pos = gt + 1;
            return Some(Tag {
                name: &self.src[name_start..name_end],
                closing,
                attrs: &self.src[name_end..gt],
                start: lt,
                end: gt + 1,
            });
        }
    }
}

/// Offset of the `>` ending a tag. Quotes only count when they open an
/// attribute value, so a stray apostrophe in malformed markup cannot swallow
/// the rest of the page.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut prev_significant = 0u8;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if prev_significant == b'=' => quote = Some(b),
                _ => {}
            },
        }
        if !b.is_ascii_whitespace() {
            prev_significant = b;
        }
    }
    None
}

struct AttrIter<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> AttrIter<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.src.as_bytes();
        self.skip_while(|b| b.is_ascii_whitespace() || b == b'/');
        if self.pos >= bytes.len() {
            return None;
        }

        let key_start = self.pos;
        self.skip_while(|b| !b.is_ascii_whitespace() && b != b'=' && b != b'/');
        let key = &self.src[key_start..self.pos];
        if key.is_empty() {
            // lone '=' or similar junk
            self.pos += 1;
            return self.next();
        }

        self.skip_while(|b| b.is_ascii_whitespace());
        if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
            return Some((key, ""));
        }
        self.pos += 1;
        self.skip_while(|b| b.is_ascii_whitespace());
        if self.pos >= bytes.len() {
            return Some((key, ""));
        }

        let value = match bytes[self.pos] {
            q @ (b'"' | b'\'') => {
                let value_start = self.pos + 1;
                let value_end = self.src[value_start..]
                    .find(q as char)
                    .map_or(self.src.len(), |offset| value_start + offset);
                self.pos = (value_end + 1).min(self.src.len());
                &self.src[value_start..value_end]
            }
            _ => {
                let value_start = self.pos;
                self.skip_while(|b| !b.is_ascii_whitespace());
                &self.src[value_start..self.pos]
            }
        };
        Some((key, value))
    }
}

/// Inner markup of the first element whose name is in `names`, searching in
/// document order. Elements without a matching close tag are skipped.
pub fn first_element_inner<'a>(markup: &'a str, names: &[&str]) -> Option<&'a str> {
    let mut scanner = TagScanner::new(markup);
    while let Some(open) = scanner.next() {
        if open.closing || !names.iter().any(|name| open.is(name)) {
            continue;
        }
        let mut inner = TagScanner::starting_at(markup, open.end);
        if let Some(close) = inner.find_closing(open.name) {
            return Some(&markup[open.end..close.start]);
        }
    }
    None
}
