//! Inline `style` attribute model and the image shapes used while scaling.
//!
//! An image is always in one of two shapes:
//! - plain: sized through `width`/`min-width`/`max-width` in pixels
//! - wrapped: filling the scale wrapper (`width: 100%`) with pointer events off
//!
//! Only the properties in [`SCALE_PROPERTIES`] are ever touched; everything
//! else in the attribute is carried through unchanged and in order.

use std::fmt;

use smol_str::SmolStr;

use crate::error::StyleError;

/// Properties owned by the scale shapes.
pub const SCALE_PROPERTIES: [&str; 7] = [
    "display",
    "pointer-events",
    "object-fit",
    "height",
    "width",
    "min-width",
    "max-width",
];

/// Ordered CSS declarations of an inline `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(SmolStr, String)>,
}

impl InlineStyle {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `prop: value; prop: value` text.
    ///
    /// Declarations end at a `;` outside quotes, parentheses and character
    /// references, so `url("data:image/png;base64,…")` and serialized
    /// `&quot;Noto Sans&quot;` stay whole. Values keep any colons after the
    /// first one. Empty declarations are skipped; any other declaration that
    /// is not `prop: value` is an error.
    pub fn parse(text: &str) -> Result<Self, StyleError> {
        let mut decls = Vec::new();
        for decl in declarations(text)? {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            let (prop, value) = decl
                .split_once(':')
                .filter(|(prop, _)| !prop.trim().is_empty())
                .ok_or_else(|| StyleError::Declaration {
                    decl: decl.to_owned(),
                })?;
            decls.push((
                SmolStr::new(prop.trim().to_ascii_lowercase()),
                value.trim().to_owned(),
            ));
        }
        Ok(Self { decls })
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(prop))
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its position if it is already declared.
    pub fn set(&mut self, prop: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .decls
            .iter_mut()
            .find(|(p, _)| p.eq_ignore_ascii_case(prop))
        {
            Some((_, v)) => *v = value,
            None => self.decls.push((SmolStr::new(prop), value)),
        }
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, prop: &str) -> Option<String> {
        let idx = self
            .decls
            .iter()
            .position(|(p, _)| p.eq_ignore_ascii_case(prop))?;
        Some(self.decls.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Pixel value of a property such as `width: 312px`.
    pub fn px(&self, prop: &str) -> Option<f64> {
        parse_px(self.get(prop)?)
    }
}

impl fmt::Display for InlineStyle {
    /// Serializes as `prop: value; prop: value;`, the form stored in notes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (prop, value)) in self.decls.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{prop}: {value};")?;
        }
        Ok(())
    }
}

/// Split style text at its top-level `;` separators.
fn declarations(text: &str) -> Result<Vec<&str>, StyleError> {
    let bytes = text.as_bytes();
    let mut decls = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        // A character reference counts as the quote it encodes, or as
        // opaque value bytes.
        let (ch, len) = match bytes[i] {
            b'&' => match reference_len(&text[i..]) {
                Some(len) => (quote_reference(&text[i..i + len]).unwrap_or(b'&'), len),
                None => (b'&', 1),
            },
            b => (b, 1),
        };
        match quote {
            Some(_) if ch == b'\\' => {
                i += 2;
                continue;
            }
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                b'"' | b'\'' => quote = Some(ch),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => {
                    decls.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += len;
    }

    if quote.is_some() {
        return Err(StyleError::UnclosedQuote);
    }
    if depth > 0 {
        return Err(StyleError::UnclosedParen);
    }
    decls.push(&text[start..]);
    Ok(decls)
}

/// Length of the `&name;` / `&#nn;` reference at the start of `text`.
fn reference_len(text: &str) -> Option<usize> {
    let body = text.strip_prefix('&')?;
    let end = body.bytes().take(32).position(|b| b == b';')?;
    let name = &body.as_bytes()[..end];
    let valid = match name.split_first() {
        Some((b'#', digits)) => !digits.is_empty() && digits.iter().all(u8::is_ascii_alphanumeric),
        Some(_) => name.iter().all(u8::is_ascii_alphanumeric),
        None => false,
    };
    valid.then_some(end + 2)
}

fn quote_reference(reference: &str) -> Option<u8> {
    match reference.to_ascii_lowercase().as_str() {
        "&quot;" | "&#34;" | "&#x22;" => Some(b'"'),
        "&apos;" | "&#39;" | "&#x27;" => Some(b'\''),
        _ => None,
    }
}

/// Parse `312px` / `312.5px` / `312`.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim_end();
    let px: f64 = number.parse().ok()?;
    (px.is_finite() && px >= 0.0).then_some(px)
}

/// Format a pixel length; whole numbers are written without a fraction.
pub fn px(width: f64) -> String {
    format!("{width}px")
}

/// Plain shape: sized by pixels, interactive again.
pub fn apply_plain_shape(style: &mut InlineStyle, width: f64) {
    let width = px(width);
    style.set("display", "inline-block");
    style.set("pointer-events", "auto");
    style.set("object-fit", "contain");
    style.set("height", "auto");
    style.set("width", width.clone());
    style.set("min-width", width.clone());
    style.set("max-width", width);
}

/// Wrapped shape: fill the wrapper, let clicks fall through to it.
pub fn apply_wrapped_shape(style: &mut InlineStyle) {
    style.set("display", "block");
    style.set("pointer-events", "none");
    style.set("object-fit", "contain");
    style.set("height", "auto");
    style.set("width", "100%");
    style.remove("min-width");
    style.remove("max-width");
}

/// Drop all sizing so the image flows at its natural size.
pub fn apply_reset_shape(style: &mut InlineStyle) {
    style.set("pointer-events", "auto");
    style.set("height", "auto");
    style.remove("width");
    style.remove("min-width");
    style.remove("max-width");
}

/// Remove every property owned by the scale shapes.
pub fn clear_scale_properties(style: &mut InlineStyle) {
    for prop in SCALE_PROPERTIES {
        style.remove(prop);
    }
}

/// Inline style of the scale wrapper around a selected image.
pub fn wrapper_style(border: &str, width: f64) -> InlineStyle {
    let mut style = InlineStyle::new();
    style.set("cursor", "crosshair");
    style.set("border", border);
    style.set("overflow", "hidden");
    style.set("resize", "horizontal");
    style.set("display", "inline-block");
    style.set("width", px(width));
    style
}
