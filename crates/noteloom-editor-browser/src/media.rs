//! Display field write-back for inline media.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlMediaElement};

use noteloom_editor_core::{EditorSettings, SyncOutcome, synchronize};

/// Re-render `display` from the media tags in `source`.
///
/// Returns whether the display field was rewritten. Nothing is touched when
/// the rendered markup already matches, so playback is not interrupted.
pub fn sync_media_field(source: &Element, display: &Element, settings: &EditorSettings) -> bool {
    match synchronize(&source.inner_html(), &display.inner_html(), settings) {
        SyncOutcome::Unchanged => false,
        SyncOutcome::Replaced(markup) => {
            pause_media(display);
            display.set_inner_html(&markup);
            true
        }
    }
}

/// Pause every audio and video element under `root`.
pub fn pause_media(root: &Element) {
    let media = match root.query_selector_all("audio, video") {
        Ok(media) => media,
        Err(e) => {
            tracing::warn!("pause_media: query failed: {:?}", e);
            return;
        }
    };
    for i in 0..media.length() {
        let Some(element) = media
            .item(i)
            .and_then(|node| node.dyn_into::<HtmlMediaElement>().ok())
        else {
            continue;
        };
        if let Err(e) = element.pause() {
            tracing::warn!("pause_media: pause failed: {:?}", e);
        }
    }
}
