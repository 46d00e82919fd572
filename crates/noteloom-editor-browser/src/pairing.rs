//! Focus-out wiring between media source fields and their display fields.

use std::rc::Rc;

use gloo_events::EventListener;
use web_sys::{Element, HtmlElement};

use noteloom_editor_core::{EditorSettings, FieldPair, PairingResolver};

use crate::media::sync_media_field;

/// A field of the loaded note as the host laid it out.
#[derive(Debug, Clone)]
pub struct BoundField {
    /// Field name shown to the user, e.g. `Sentence/media`.
    pub label: String,
    /// Element whose subtree (or shadow root) receives the field's events.
    pub root: Element,
    /// The contenteditable surface holding the field text.
    pub editable: HtmlElement,
}

/// Attach a `focusout` listener to the source of every field pair in
/// `fields`, re-rendering that pair's display field.
///
/// `wire` decides per pair whether it gets a listener.
pub fn wire_field_pairs(
    fields: &[BoundField],
    settings: &Rc<EditorSettings>,
    wire: impl Fn(&FieldPair) -> bool,
) -> Vec<EventListener> {
    let mut resolver = PairingResolver::new();
    let mut listeners = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        for pair in resolver.push(index, &field.label) {
            if !wire(&pair) {
                continue;
            }
            let (Some(source), Some(display)) = (fields.get(pair.source), fields.get(pair.display))
            else {
                continue;
            };
            let target = source.editable.clone();
            let source: Element = source.editable.clone().into();
            let display: Element = display.editable.clone().into();
            let settings = Rc::clone(settings);
            let base = pair.base.clone();
            listeners.push(EventListener::new(&target, "focusout", move |_| {
                if sync_media_field(&source, &display, &settings) {
                    tracing::debug!(base = %base, "media: display field updated");
                }
            }));
        }
    }
    listeners
}
