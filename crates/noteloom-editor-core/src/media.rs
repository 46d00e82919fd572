//! Inline media rendering for paired fields.
//!
//! The source field holds `[sound:<name>.<ext>]` tags, one per line, with
//! optional playback options. The display field holds one rendered control per
//! tag, each inside a `<span id="IM-<n>">` block. Anything the user typed
//! between blocks in the display field survives re-rendering.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::settings::EditorSettings;

/// `[sound:<file.ext and inside options>]<trailing options>`
static MEDIA_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:(?P<body>[^\]]+)\](?P<rest>.*)").unwrap());

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\r?\n|<br\s*/?>|</?div(?:\s[^>]*)?>").unwrap());

static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<span id="IM-\d+">.*?</span>"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Element name, also the MIME top-level type.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Playback options for one rendered control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOptions {
    pub kind: MediaKind,
    pub autoplay: bool,
    pub loop_playback: bool,
    pub mute: bool,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

impl MediaOptions {
    /// Options before any tokens are applied.
    pub fn defaults(kind: MediaKind, settings: &EditorSettings) -> Self {
        Self {
            kind,
            autoplay: settings.autoplay,
            loop_playback: settings.loop_playback,
            mute: settings.mute,
            height: settings.default_height(),
            width: settings.default_width(),
        }
    }

    /// Apply one option token. Returns `false` for tokens that mean nothing.
    pub fn apply_token(&mut self, token: &str) -> bool {
        match token {
            "a" | "audio" => self.kind = MediaKind::Audio,
            "v" | "video" => self.kind = MediaKind::Video,
            "auto" | "autoplay" => self.autoplay = true,
            "na" | "noauto" | "noautoplay" => self.autoplay = false,
            "l" | "loop" => self.loop_playback = true,
            "nl" | "noloop" => self.loop_playback = false,
            "m" | "mute" => self.mute = true,
            "nm" | "nomute" => self.mute = false,
            _ => {
                let Some((key, value)) = token.split_once([':', '=']) else {
                    return false;
                };
                let Some(value) = parse_dimension(value) else {
                    return false;
                };
                match key {
                    "h" | "height" => self.height = Some(value),
                    "w" | "width" => self.width = Some(value),
                    _ => return false,
                }
            }
        }
        true
    }

    fn apply_tokens(&mut self, text: &str) {
        let text = text.replace("&nbsp;", " ");
        // `split_whitespace` also splits on U+00A0.
        for token in text.split_whitespace() {
            if !self.apply_token(token) {
                tracing::trace!(token, "media: ignoring option");
            }
        }
    }
}

fn parse_dimension(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// A recognized media tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTag {
    /// File name as written in the source field.
    pub filename: String,
    pub ext: SmolStr,
    pub options: MediaOptions,
}

/// Parse the first `[sound:…]` tag of a line.
///
/// The file name runs up to the last `.<ext>` inside the brackets where
/// `<ext>` equals the configured audio or video extension exactly and is
/// followed by whitespace or the closing bracket. Whatever follows it inside
/// the brackets is options. Tags without such an extension are left to the
/// surrounding text.
pub fn parse_media_tag(line: &str, settings: &EditorSettings) -> Option<MediaTag> {
    let caps = MEDIA_TAG_RE.captures(line)?;
    let body = caps.name("body")?.as_str();
    let Some((name_end, kind)) = [
        (settings.audio_ext.as_str(), MediaKind::Audio),
        (settings.video_ext.as_str(), MediaKind::Video),
    ]
    .into_iter()
    .filter_map(|(ext, kind)| Some((extension_end(body, ext)?, kind)))
    .max_by_key(|(end, _)| *end) else {
        tracing::trace!(body, "media: no configured extension");
        return None;
    };

    let filename = &body[..name_end];
    let ext = filename.rsplit_once('.').map_or("", |(_, ext)| ext);
    let mut options = MediaOptions::defaults(kind, settings);
    options.apply_tokens(&body[name_end..]);
    if let Some(rest) = caps.name("rest") {
        options.apply_tokens(rest.as_str());
    }

    Some(MediaTag {
        filename: filename.to_owned(),
        ext: SmolStr::new(ext),
        options,
    })
}

/// End of the last `.<ext>` in `body` that closes a file name.
fn extension_end(body: &str, ext: &str) -> Option<usize> {
    if ext.is_empty() {
        return None;
    }
    let suffix = format!(".{ext}");
    body.rmatch_indices(&suffix).find_map(|(start, _)| {
        let end = start + suffix.len();
        let after = &body[end..];
        let closes = after.is_empty()
            || after.starts_with(char::is_whitespace)
            || after.starts_with("&nbsp;");
        (start > 0 && closes).then_some(end)
    })
}

/// Split field markup into logical lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    LINE_BREAK_RE.split(text).collect()
}

/// Id of the display block for the `index`th media tag.
pub fn block_id(index: usize) -> String {
    format!("IM-{index}")
}

/// Render one media control wrapped in its identifying block.
///
/// Boolean attributes are written the way the browser serializes them, so a
/// rendered block reads back byte-identical from the live document.
pub fn render_control(filename: &str, options: &MediaOptions, index: usize) -> String {
    let element = options.kind.as_str();
    let ext = filename.rsplit_once('.').map_or("", |(_, ext)| ext);
    let src = filename.replace('"', "&quot;");

    let mut out = format!(r#"<span id="{}"><{element} controls="""#, block_id(index));
    if options.autoplay {
        out.push_str(r#" autoplay="""#);
    }
    if options.loop_playback {
        out.push_str(r#" loop="""#);
    }
    if options.mute {
        out.push_str(r#" muted="""#);
    }
    if let Some(height) = options.height {
        out.push_str(&format!(r#" height="{height}""#));
    }
    if let Some(width) = options.width {
        out.push_str(&format!(r#" width="{width}""#));
    }
    out.push_str(&format!(
        r#"><source src="{src}" type="{element}/{ext}"></{element}></span>"#
    ));
    out
}

/// Media tags of the source field in line order.
pub fn media_tags(source: &str, settings: &EditorSettings) -> Vec<MediaTag> {
    split_lines(source)
        .into_iter()
        .filter_map(|line| parse_media_tag(line, settings))
        .collect()
}

/// Compute the display markup for `source`, keeping the non-block content
/// currently in `display` in place.
///
/// The current display is split on its blocks; segment `i` goes before
/// rendered block `i` and segments past the last block are appended.
pub fn render_display(source: &str, display: &str, settings: &EditorSettings) -> String {
    let tags = media_tags(source, settings);
    let segments: Vec<&str> = BLOCK_RE.split(display).collect();

    let mut out = String::with_capacity(display.len());
    for (index, tag) in tags.iter().enumerate() {
        if let Some(segment) = segments.get(index) {
            out.push_str(segment);
        }
        out.push_str(&render_control(&tag.filename, &tag.options, index));
    }
    for segment in segments.iter().skip(tags.len()) {
        out.push_str(segment);
    }
    out
}

/// Result of re-rendering a display field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The display field already shows the right markup; do not touch it.
    Unchanged,
    /// Replace the display field's content with this markup.
    Replaced(String),
}

/// Re-render `display` from `source`.
pub fn synchronize(source: &str, display: &str, settings: &EditorSettings) -> SyncOutcome {
    let rendered = render_display(source, display, settings);
    if rendered == display {
        SyncOutcome::Unchanged
    } else {
        tracing::debug!(
            blocks = BLOCK_RE.find_iter(&rendered).count(),
            "media: display field re-rendered"
        );
        SyncOutcome::Replaced(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EditorSettings {
        EditorSettings::default()
    }

    fn render_source(source: &str) -> String {
        match synchronize(source, "", &settings()) {
            SyncOutcome::Replaced(markup) => markup,
            SyncOutcome::Unchanged => String::new(),
        }
    }

    #[test]
    fn test_renders_audio_with_defaults() {
        insta::assert_snapshot!(
            render_source("[sound:clip.ogg]"),
            @r#"<span id="IM-0"><audio controls=""><source src="clip.ogg" type="audio/ogg"></audio></span>"#
        );
    }

    #[test]
    fn test_renders_video_with_inside_options() {
        insta::assert_snapshot!(
            render_source("[sound:clip.webm w:320 h:240 noauto]"),
            @r#"<span id="IM-0"><video controls="" height="240" width="320"><source src="clip.webm" type="video/webm"></video></span>"#
        );
    }

    #[test]
    fn test_settings_provide_defaults() {
        let settings = EditorSettings {
            autoplay: true,
            mute: true,
            width: 200,
            ..EditorSettings::default()
        };
        let tag = parse_media_tag("[sound:a.ogg]", &settings).unwrap();
        assert!(tag.options.autoplay && tag.options.mute);
        assert!(!tag.options.loop_playback);
        assert_eq!(tag.options.width, Some(200));
        assert_eq!(tag.options.height, None);
    }

    #[test]
    fn test_trailing_options_apply_after_inside_options() {
        let tag = parse_media_tag("[sound:a.ogg loop]&nbsp;nl\u{a0}v w=90 bogus h:x", &settings())
            .unwrap();
        assert_eq!(tag.filename, "a.ogg");
        assert_eq!(tag.options.kind, MediaKind::Video);
        assert!(!tag.options.loop_playback);
        assert_eq!(tag.options.width, Some(90));
        assert_eq!(tag.options.height, None);
        assert!(render_control(&tag.filename, &tag.options, 3).contains(r#"type="video/ogg""#));
    }

    #[test]
    fn test_extension_mismatch_falls_through() {
        assert_eq!(parse_media_tag("[sound:clip.mp3]", &settings()), None);
        assert_eq!(parse_media_tag("[sound:clip.OGG]", &settings()), None);
        assert_eq!(synchronize("[sound:clip.mp3]", "", &settings()), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_filenames_with_dots_and_spaces() {
        let tag = parse_media_tag("x [sound:my clip.v2.ogg] y", &settings()).unwrap();
        assert_eq!(tag.filename, "my clip.v2.ogg");
        assert_eq!(
            render_control(r#"a"b.ogg"#, &tag.options, 0),
            r#"<span id="IM-0"><audio controls=""><source src="a&quot;b.ogg" type="audio/ogg"></audio></span>"#
        );
    }

    #[test]
    fn test_dotted_words_before_the_extension() {
        let tag = parse_media_tag("[sound:take 1.2 final.ogg]", &settings()).unwrap();
        assert_eq!(tag.filename, "take 1.2 final.ogg");
        assert_eq!(tag.ext, "ogg");
        assert_eq!(tag.options.kind, MediaKind::Audio);

        let tag = parse_media_tag("[sound:v1.5 demo.webm w:320 loop] m", &settings()).unwrap();
        assert_eq!(tag.filename, "v1.5 demo.webm");
        assert_eq!(tag.options.kind, MediaKind::Video);
        assert_eq!(tag.options.width, Some(320));
        assert!(tag.options.loop_playback && tag.options.mute);

        // `.oggx` does not close a file name.
        assert_eq!(parse_media_tag("[sound:a.oggx]", &settings()), None);
        assert_eq!(parse_media_tag("[sound:.ogg]", &settings()), None);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(
            split_lines("a\nb<br>c<BR />d<div>e</div><div class=\"x\">f\r\ng"),
            ["a", "b", "c", "d", "e", "", "f", "g"]
        );
    }

    #[test]
    fn test_one_control_per_line_in_order() {
        let markup = render_source("[sound:a.ogg]<br>text<div>[sound:b.webm] [sound:c.ogg]</div>");
        assert!(markup.starts_with(r#"<span id="IM-0"><audio"#));
        assert!(markup.contains(r#"<span id="IM-1"><video"#));
        assert!(markup.contains(r#"src="b.webm""#));
        assert!(!markup.contains("IM-2"));
        assert!(!markup.contains("c.ogg"));
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let source = "[sound:a.ogg]\n[sound:b.webm] loop";
        let SyncOutcome::Replaced(display) = synchronize(source, "", &settings()) else {
            panic!("first render should replace");
        };
        assert_eq!(synchronize(source, &display, &settings()), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_manual_text_between_blocks_survives() {
        let source = "[sound:a.ogg]\n[sound:b.ogg]";
        let first = render_control("a.ogg", &MediaOptions::defaults(MediaKind::Audio, &settings()), 0);
        let second =
            render_control("b.ogg", &MediaOptions::defaults(MediaKind::Audio, &settings()), 1);
        let display = format!("{first}<div>my note</div>{second}");
        assert_eq!(synchronize(source, &display, &settings()), SyncOutcome::Unchanged);

        // Dropping the second tag keeps the note, now trailing.
        let SyncOutcome::Replaced(markup) = synchronize("[sound:a.ogg]", &display, &settings())
        else {
            panic!("expected a re-render");
        };
        assert_eq!(markup, format!("{first}<div>my note</div>"));
    }

    #[test]
    fn test_leading_display_content_stays_first() {
        let SyncOutcome::Replaced(markup) = synchronize("[sound:a.ogg]", "Listen: ", &settings())
        else {
            panic!("expected a re-render");
        };
        assert!(markup.starts_with(r#"Listen: <span id="IM-0">"#));
    }
}
