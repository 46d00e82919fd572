//! Collapse scale wrappers left in field text before a note is stored.
//!
//! A wrapper reaches storage when the note is saved or switched away from
//! while an image is still selected. Normalization replaces every wrapper with
//! its image, sized by the wrapper's declared pixel width, so stored notes only
//! ever contain plain images.
//!
//! # How it works
//!
//! 1. [`tokenize`] splits the text into plain-text and wrapper segments,
//!    validating each wrapper's interior.
//! 2. [`normalize`] rewrites each wrapper segment to its adjusted `<img>` tag
//!    and copies everything else through byte for byte.

use std::ops::Range;

use smol_str::SmolStr;

use crate::error::{FieldFailure, FlushError, NormalizeError};
use crate::markup::{Tag, next_tag};
use crate::style::{InlineStyle, apply_plain_shape, clear_scale_properties};

/// Class marking the wrapper around a selected image.
pub const WRAPPER_CLASS: &str = "esi_scale_div";

/// A span of field text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// Text copied through unchanged.
    Text(Range<usize>),
    /// A wrapper element holding exactly one image.
    Wrapper(WrapperSpan<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrapperSpan<'a> {
    /// Opening tag through matching closing tag.
    pub range: Range<usize>,
    /// Declared pixel width of the wrapper.
    pub width: f64,
    /// The wrapped `<img>` tag.
    pub image: Tag<'a>,
}

/// Split field text into text and wrapper segments.
pub fn tokenize(text: &str) -> Result<Vec<Segment<'_>>, NormalizeError> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut from = 0;

    while let Some(tag) = next_tag(text, from) {
        if tag.closing || !tag.has_class(text, WRAPPER_CLASS) {
            from = tag.range.end;
            continue;
        }
        let span = parse_wrapper(text, tag)?;
        if text_start < span.range.start {
            segments.push(Segment::Text(text_start..span.range.start));
        }
        text_start = span.range.end;
        from = span.range.end;
        segments.push(Segment::Wrapper(span));
    }

    if text_start < text.len() {
        segments.push(Segment::Text(text_start..text.len()));
    }
    Ok(segments)
}

fn parse_wrapper<'a>(text: &'a str, open: Tag<'a>) -> Result<WrapperSpan<'a>, NormalizeError> {
    let offset = open.range.start;
    if open.self_closing {
        return Err(NormalizeError::MissingImage { offset });
    }

    let style = match open.attribute(text, "style").and_then(|a| a.value) {
        Some(style) => InlineStyle::parse(style)
            .map_err(|source| NormalizeError::Style { offset, source })?,
        None => InlineStyle::new(),
    };
    let width = style
        .px("width")
        .ok_or(NormalizeError::MissingWidth { offset })?;

    let mut image: Option<Tag<'a>> = None;
    let mut from = open.range.end;
    loop {
        let Some(tag) = next_tag(text, from) else {
            return Err(NormalizeError::Unterminated {
                offset,
                tag: SmolStr::new(open.name),
            });
        };
        if !text[from..tag.range.start].trim().is_empty() {
            return Err(NormalizeError::StrayContent { offset });
        }

        if tag.is(open.name) {
            if !tag.closing {
                return Err(NormalizeError::Nested {
                    offset,
                    tag: SmolStr::new(tag.name),
                });
            }
            let image = image.ok_or(NormalizeError::MissingImage { offset })?;
            return Ok(WrapperSpan {
                range: offset..tag.range.end,
                width,
                image,
            });
        }

        if tag.closing || !tag.is("img") {
            return Err(NormalizeError::StrayContent { offset });
        }
        if image.is_some() {
            return Err(NormalizeError::MultipleImages { offset });
        }
        from = tag.range.end;
        image = Some(tag);
    }
}

/// Render the image tag of a wrapper in its plain shape at the wrapper's width.
///
/// Only the `style` attribute changes; an image without one gains one.
/// Character references in the attribute are kept as written.
fn plain_image_tag(text: &str, span: &WrapperSpan<'_>) -> Result<String, NormalizeError> {
    let image = &span.image;
    let style_attr = image.attribute(text, "style");

    let mut style = match style_attr.as_ref().and_then(|a| a.value) {
        Some(style) => InlineStyle::parse(style).map_err(|source| NormalizeError::Style {
            offset: span.range.start,
            source,
        })?,
        None => InlineStyle::new(),
    };
    clear_scale_properties(&mut style);
    apply_plain_shape(&mut style, span.width);
    let style = style.to_string();

    let tag_text = &text[image.range.clone()];
    let base = image.range.start;
    let tag = match style_attr {
        Some(attr) => match attr.value_range {
            Some(value) if value.end < attr.range.end => {
                // Quoted: swap the value between the quotes.
                splice(tag_text, value.start - base..value.end - base, &style)
            }
            _ => splice(
                tag_text,
                attr.range.start - base..attr.range.end - base,
                &format!(r#"style="{style}""#),
            ),
        },
        None => {
            let attrs = text[image.attrs.clone()].trim_end();
            let at = image.attrs.start + attrs.len() - base;
            splice(tag_text, at..at, &format!(r#" style="{style}""#))
        }
    };
    Ok(tag)
}

fn splice(text: &str, range: Range<usize>, with: &str) -> String {
    let mut out = String::with_capacity(text.len() + with.len());
    out.push_str(&text[..range.start]);
    out.push_str(with);
    out.push_str(&text[range.end..]);
    out
}

/// Replace every scale wrapper in `text` with its plain-sized image.
///
/// Text without wrappers is returned unchanged, so normalizing twice is the
/// same as normalizing once.
pub fn normalize(text: &str) -> Result<String, NormalizeError> {
    if !text.contains(WRAPPER_CLASS) {
        return Ok(text.to_owned());
    }

    let segments = tokenize(text)?;
    let mut out = String::with_capacity(text.len());
    for segment in &segments {
        match segment {
            Segment::Text(range) => out.push_str(&text[range.clone()]),
            Segment::Wrapper(span) => {
                let image = plain_image_tag(text, span)?;
                tracing::debug!(
                    offset = span.range.start,
                    width = span.width,
                    "normalize: collapsed scale wrapper"
                );
                tracing::trace!(image = %image.escape_debug(), "normalize: image tag");
                out.push_str(&image);
            }
        }
    }
    Ok(out)
}

/// Normalize every field of a note in place.
///
/// Each field is handled on its own: fields that fail keep their text and are
/// reported together, the rest are rewritten. Returns how many fields changed.
pub fn normalize_fields(fields: &mut [String]) -> Result<usize, FlushError> {
    let mut changed = 0;
    let mut failures = Vec::new();

    for (index, field) in fields.iter_mut().enumerate() {
        match normalize(field) {
            Ok(normalized) => {
                if normalized != *field {
                    *field = normalized;
                    changed += 1;
                }
            }
            Err(source) => {
                tracing::error!(index, error = %source, "normalize: field left unchanged");
                failures.push(FieldFailure { index, source });
            }
        }
    }

    if failures.is_empty() {
        Ok(changed)
    } else {
        Err(FlushError { failures })
    }
}
