//! One editor's live bindings to the loaded note.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use web_sys::{Element, EventTarget};

use noteloom_editor_core::{EditorSettings, PlatformError, ScaleSelection};

use crate::events::{SharedScale, install_scale_listeners};
use crate::pairing::{BoundField, wire_field_pairs};
use crate::scale::BrowserScalePlatform;

/// Attribute marking a field root that already has scale listeners.
pub const BOUND_MARKER: &str = "data-noteloom-bound";

/// Listeners, selection slot and bound field roots of one editor.
///
/// Dropping the session removes every listener it installed.
pub struct EditorSession {
    settings: Rc<EditorSettings>,
    selection: SharedScale,
    listeners: Vec<EventListener>,
    bound: Vec<Element>,
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Result<Self, PlatformError> {
        let platform = BrowserScalePlatform::from_window()?;
        Ok(Self::with_platform(platform, settings))
    }

    pub fn with_platform(platform: BrowserScalePlatform, settings: EditorSettings) -> Self {
        let settings = settings.sanitized();
        let selection = Rc::new(RefCell::new(ScaleSelection::new(platform, &settings)));
        Self {
            settings: Rc::new(settings),
            selection,
            listeners: Vec::new(),
            bound: Vec::new(),
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn selection(&self) -> &SharedScale {
        &self.selection
    }

    /// Bind the fields of a newly loaded note, replacing this session's
    /// previous bindings.
    ///
    /// Roots that already carry [`BOUND_MARKER`] are left alone, as are the
    /// media pairs whose source lives under one. Returns how many roots were
    /// bound.
    pub fn attach(&mut self, fields: &[BoundField]) -> usize {
        self.detach();

        let fresh: Vec<bool> = fields
            .iter()
            .map(|field| !field.root.has_attribute(BOUND_MARKER))
            .collect();

        for (field, _) in fields.iter().zip(&fresh).filter(|(_, fresh)| **fresh) {
            let target: EventTarget = match field.root.shadow_root() {
                Some(shadow) => shadow.into(),
                None => field.root.clone().into(),
            };
            self.listeners
                .extend(install_scale_listeners(&target, &self.selection));
            if let Err(e) = field.root.set_attribute(BOUND_MARKER, "") {
                tracing::warn!(label = %field.label, "attach: could not mark field: {:?}", e);
            }
            self.bound.push(field.root.clone());
        }

        let pair_listeners = wire_field_pairs(fields, &self.settings, |pair| {
            fresh.get(pair.source).copied().unwrap_or(false)
        });
        tracing::debug!(
            fields = fields.len(),
            bound = self.bound.len(),
            pairs = pair_listeners.len(),
            "attach: note fields bound"
        );
        self.listeners.extend(pair_listeners);
        self.bound.len()
    }

    /// Release any live selection and remove every listener and marker.
    pub fn detach(&mut self) {
        match self.selection.try_borrow_mut() {
            Ok(mut selection) => {
                if let Err(e) = selection.release() {
                    tracing::warn!("detach: releasing selection failed: {}", e);
                }
            }
            Err(_) => tracing::warn!("detach: selection busy, not released"),
        }
        self.listeners.clear();
        for root in self.bound.drain(..) {
            if let Err(e) = root.remove_attribute(BOUND_MARKER) {
                tracing::warn!("detach: could not unmark field: {:?}", e);
            }
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection
            .try_borrow()
            .map(|selection| selection.is_active())
            .unwrap_or(false)
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.detach();
    }
}
