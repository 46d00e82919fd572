//! Browser event handling for image scaling.
//!
//! Each field root gets one listener per [`ScaleEventKind`]; all of them feed
//! the same selection slot.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, Node};

use noteloom_editor_core::{ScaleEvent, ScaleEventKind, ScaleSelection, ScaleTransition};

use crate::scale::BrowserScalePlatform;

/// Selection slot shared by the listeners of one session.
pub type SharedScale = Rc<RefCell<ScaleSelection<BrowserScalePlatform>>>;

/// Convert a DOM event into a scale event.
///
/// Events targeting a text node are attributed to its parent element.
pub fn parse_scale_event(event: &Event) -> Option<ScaleEvent<Element>> {
    let kind = ScaleEventKind::from_dom_type(&event.type_())?;
    let target = match event.target()?.dyn_into::<Element>() {
        Ok(element) => element,
        Err(other) => other.dyn_into::<Node>().ok()?.parent_element()?,
    };
    Some(ScaleEvent { kind, target })
}

/// Run one DOM event through the selection.
pub fn dispatch_scale_event(selection: &SharedScale, event: &Event) {
    let Some(event) = parse_scale_event(event) else {
        return;
    };
    let Ok(mut selection) = selection.try_borrow_mut() else {
        tracing::debug!(kind = event.kind.dom_type(), "scale: re-entrant event dropped");
        return;
    };
    match selection.handle_event(&event) {
        Ok(ScaleTransition::Ignored) => {}
        Ok(transition) => {
            tracing::trace!(kind = event.kind.dom_type(), ?transition, "scale: event handled");
        }
        Err(e) => {
            tracing::warn!(kind = event.kind.dom_type(), "scale: event failed: {}", e);
        }
    }
}

/// Install the scale listeners on `target`.
///
/// Listeners are removed when the returned handles are dropped.
pub fn install_scale_listeners(target: &EventTarget, selection: &SharedScale) -> Vec<EventListener> {
    ScaleEventKind::ALL
        .iter()
        .map(|kind| {
            let selection = Rc::clone(selection);
            EventListener::new(target, kind.dom_type(), move |event| {
                dispatch_scale_event(&selection, event);
            })
        })
        .collect()
}
