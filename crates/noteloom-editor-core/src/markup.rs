//! Minimal tag scanner for serialized field markup.
//!
//! Field text is HTML as serialized by the editor, so every raw `<` followed
//! by a letter (or `/` and a letter) starts a tag. Text content has its `<`
//! escaped already. The scanner only finds tags and their attributes; it does
//! not build a tree.

use std::ops::Range;

/// One start, end or self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Tag name as written.
    pub name: &'a str,
    /// `</name>`
    pub closing: bool,
    /// `<name … />`
    pub self_closing: bool,
    /// Byte range of the whole tag, `<` through `>`.
    pub range: Range<usize>,
    /// Byte range of the attribute text (after the name, before `/>` or `>`).
    pub attrs: Range<usize>,
}

/// One attribute of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// Raw value, entities not decoded. `None` for bare attributes.
    pub value: Option<&'a str>,
    /// Byte range of the value without quotes.
    pub value_range: Option<Range<usize>>,
    /// Byte range of the whole attribute, name through closing quote.
    pub range: Range<usize>,
}

impl<'a> Tag<'a> {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Attributes in source order. `text` must be the text the tag was scanned from.
    pub fn attributes(&self, text: &'a str) -> Vec<Attribute<'a>> {
        parse_attributes(text, self.attrs.clone())
    }

    pub fn attribute(&self, text: &'a str, name: &str) -> Option<Attribute<'a>> {
        self.attributes(text)
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, text: &'a str, class: &str) -> bool {
        self.attribute(text, "class")
            .and_then(|a| a.value)
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Find the next tag starting at or after `from`.
///
/// Comments are skipped. Returns `None` when no further complete tag exists;
/// a `<` that never reaches its `>` ends the scan.
pub fn next_tag(text: &str, from: usize) -> Option<Tag<'_>> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(rel) = text.get(pos..)?.find('<') {
        let start = pos + rel;
        if text[start..].starts_with("<!--") {
            let end = text[start + 4..].find("-->")?;
            pos = start + 4 + end + 3;
            continue;
        }
        match scan_tag(text, bytes, start) {
            Some(tag) => return Some(tag),
            None if has_tag_name(bytes, start) => return None,
            None => pos = start + 1,
        }
    }
    None
}

fn has_tag_name(bytes: &[u8], start: usize) -> bool {
    let mut i = start + 1;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic())
}

fn scan_tag<'a>(text: &'a str, bytes: &[u8], start: usize) -> Option<Tag<'a>> {
    let mut i = start + 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    let name_start = i;
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_' || *b == b':')
    {
        i += 1;
    }
    let name = &text[name_start..i];
    let attrs_start = i;

    let mut quote: Option<u8> = None;
    while let Some(&b) = bytes.get(i) {
        match (quote, b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => break,
            (None, _) => {}
        }
        i += 1;
    }
    if bytes.get(i) != Some(&b'>') {
        return None;
    }

    let mut attrs_end = i;
    let mut self_closing = false;
    let before_gt = text[attrs_start..i].trim_end();
    if before_gt.ends_with('/') {
        self_closing = true;
        attrs_end = attrs_start + before_gt.len() - 1;
    }

    Some(Tag {
        name,
        closing,
        self_closing,
        range: start..i + 1,
        attrs: attrs_start..attrs_end,
    })
}

fn parse_attributes(text: &str, range: Range<usize>) -> Vec<Attribute<'_>> {
    let bytes = text.as_bytes();
    let end = range.end;
    let mut i = range.start;
    let mut attrs = Vec::new();

    while i < end {
        if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
            i += 1;
            continue;
        }
        let name_start = i;
        while i < end && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' && bytes[i] != b'/' {
            i += 1;
        }
        let name = &text[name_start..i];

        let mut j = i;
        while j < end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= end || bytes[j] != b'=' {
            attrs.push(Attribute {
                name,
                value: None,
                value_range: None,
                range: name_start..i,
            });
            continue;
        }
        j += 1;
        while j < end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let (value_range, attr_end) = match bytes.get(j) {
            Some(&(q @ (b'"' | b'\''))) if j < end => {
                let value_start = j + 1;
                let value_end = text[value_start..end]
                    .find(q as char)
                    .map_or(end, |p| value_start + p);
                (value_start..value_end, (value_end + 1).min(end))
            }
            _ => {
                let value_start = j;
                let mut k = j;
                while k < end && !bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                (value_start..k, k)
            }
        };

        attrs.push(Attribute {
            name,
            value: Some(&text[value_range.clone()]),
            value_range: Some(value_range),
            range: name_start..attr_end,
        });
        i = attr_end;
    }
    attrs
}
