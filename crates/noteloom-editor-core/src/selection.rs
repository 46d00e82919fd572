//! Image scale selection.
//!
//! Clicking an image selects it: the image is moved into a horizontally
//! resizable wrapper and made to fill it. Any later mouse-down or key-press
//! outside the wrapper releases it again, writing the wrapper's final width
//! back onto the image if the user dragged the resize handle. Double-clicking
//! the wrapper drops all sizing instead.
//!
//! At most one image is selected per [`ScaleSelection`]. The selection never
//! holds a half-built state: if a document operation fails partway, what was
//! done is undone and the error is returned with the slot left empty.

use crate::platform::{PlatformError, ScalePlatform};
use crate::settings::EditorSettings;
use crate::style::{
    InlineStyle, apply_plain_shape, apply_reset_shape, apply_wrapped_shape, wrapper_style,
};

/// Document events the selection reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleEventKind {
    Click,
    DoubleClick,
    KeyDown,
    MouseDown,
}

impl ScaleEventKind {
    pub const ALL: [ScaleEventKind; 4] = [
        ScaleEventKind::Click,
        ScaleEventKind::DoubleClick,
        ScaleEventKind::KeyDown,
        ScaleEventKind::MouseDown,
    ];

    pub fn from_dom_type(event_type: &str) -> Option<Self> {
        match event_type {
            "click" => Some(ScaleEventKind::Click),
            "dblclick" => Some(ScaleEventKind::DoubleClick),
            "keydown" => Some(ScaleEventKind::KeyDown),
            "mousedown" => Some(ScaleEventKind::MouseDown),
            _ => None,
        }
    }

    /// DOM event type string.
    pub fn dom_type(self) -> &'static str {
        match self {
            ScaleEventKind::Click => "click",
            ScaleEventKind::DoubleClick => "dblclick",
            ScaleEventKind::KeyDown => "keydown",
            ScaleEventKind::MouseDown => "mousedown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleEvent<N> {
    pub kind: ScaleEventKind,
    pub target: N,
}

/// The currently selected image.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveScale<N> {
    pub wrapper: N,
    pub image: N,
    /// Editable element containing the wrapper, if any.
    pub host: Option<N>,
    /// Inline caret color of `host` before selection.
    pub host_caret_color: String,
    /// Rendered width of the image when selected.
    pub width: f64,
    /// `style` attribute of the image before selection.
    pub saved_style: Option<String>,
    /// Declarations of `saved_style`.
    pub base_style: InlineStyle,
}

/// What an event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleTransition {
    Ignored,
    Selected,
    /// Released; `resized_to` is the new width if the wrapper was resized.
    Deselected { resized_to: Option<f64> },
    Reset,
}

/// Selection slot of one editor session.
pub struct ScaleSelection<P: ScalePlatform> {
    platform: P,
    border: String,
    active: Option<ActiveScale<P::Node>>,
}

impl<P: ScalePlatform> ScaleSelection<P> {
    pub fn new(platform: P, settings: &EditorSettings) -> Self {
        Self {
            platform,
            border: settings.selected_border.clone(),
            active: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn active(&self) -> Option<&ActiveScale<P::Node>> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle_event(
        &mut self,
        event: &ScaleEvent<P::Node>,
    ) -> Result<ScaleTransition, PlatformError> {
        match event.kind {
            ScaleEventKind::Click => self.select(&event.target),
            ScaleEventKind::DoubleClick => self.reset(&event.target),
            ScaleEventKind::KeyDown | ScaleEventKind::MouseDown => self.deselect(event),
        }
    }

    /// Wrap `target` for resizing. Ignored unless nothing is selected and
    /// `target` is an image.
    pub fn select(&mut self, target: &P::Node) -> Result<ScaleTransition, PlatformError> {
        if self.active.is_some() || !self.platform.is_image(target) {
            return Ok(ScaleTransition::Ignored);
        }

        let saved_style = self.platform.inline_style(target);
        let base_style = InlineStyle::parse(saved_style.as_deref().unwrap_or_default())
            .map_err(|e| PlatformError(format!("image style: {e}")))?;
        let width = self.platform.rendered_width(target);
        let wrapper = self
            .platform
            .wrap(target, &wrapper_style(&self.border, width))?;
        let host = self.platform.editable_host(&wrapper);
        let host_caret_color = host
            .as_ref()
            .map(|host| self.platform.caret_color(host))
            .unwrap_or_default();

        let active = ActiveScale {
            wrapper,
            image: target.clone(),
            host,
            host_caret_color,
            width,
            saved_style,
            base_style,
        };

        if let Err(err) = self.enter_wrapped(&active) {
            if let Err(rollback) = self.teardown(&active, active.saved_style.as_deref()) {
                tracing::warn!(%rollback, "select: rollback failed");
            }
            return Err(err);
        }

        tracing::debug!(width, "select: image wrapped");
        self.active = Some(active);
        Ok(ScaleTransition::Selected)
    }

    fn enter_wrapped(&self, active: &ActiveScale<P::Node>) -> Result<(), PlatformError> {
        let mut style = active.base_style.clone();
        apply_wrapped_shape(&mut style);
        self.platform
            .set_inline_style(&active.image, Some(&style.to_string()))?;
        if let Some(host) = &active.host {
            self.platform.set_caret_color(host, "transparent")?;
        }
        self.platform.collapse_caret_after(&active.wrapper)
    }

    /// Release the selection in response to `event`.
    ///
    /// A mouse-down on the wrapper itself starts a resize drag and is ignored;
    /// a key-press anywhere releases.
    pub fn deselect(
        &mut self,
        event: &ScaleEvent<P::Node>,
    ) -> Result<ScaleTransition, PlatformError> {
        match &self.active {
            None => return Ok(ScaleTransition::Ignored),
            Some(active)
                if active.wrapper == event.target && event.kind != ScaleEventKind::KeyDown =>
            {
                return Ok(ScaleTransition::Ignored);
            }
            Some(_) => {}
        }
        self.release()
    }

    /// Release the selection, if any, regardless of event.
    ///
    /// Without a resize the image gets its saved style back exactly. After a
    /// resize the plain shape at the wrapper's final width is applied on top.
    pub fn release(&mut self) -> Result<ScaleTransition, PlatformError> {
        let Some(active) = self.active.take() else {
            return Ok(ScaleTransition::Ignored);
        };

        let final_width = self.platform.rendered_width(&active.wrapper);
        let resized_to = (final_width != active.width).then_some(final_width);
        let style = match resized_to {
            None => active.saved_style.clone(),
            Some(width) => {
                let mut style = active.base_style.clone();
                apply_plain_shape(&mut style, width);
                Some(style.to_string())
            }
        };

        self.teardown(&active, style.as_deref())?;
        tracing::debug!(?resized_to, "deselect: image released");
        Ok(ScaleTransition::Deselected { resized_to })
    }

    /// Drop all sizing from the selected image. Only a double-click on the
    /// wrapper resets.
    pub fn reset(&mut self, target: &P::Node) -> Result<ScaleTransition, PlatformError> {
        if !self
            .active
            .as_ref()
            .is_some_and(|active| active.wrapper == *target)
        {
            return Ok(ScaleTransition::Ignored);
        }
        let Some(active) = self.active.take() else {
            return Ok(ScaleTransition::Ignored);
        };

        let mut style = active.base_style.clone();
        apply_reset_shape(&mut style);

        let torn_down = self.teardown(&active, Some(&style.to_string()));
        let cleared = self.platform.clear_text_selection();
        torn_down.and(cleared)?;
        tracing::debug!("reset: image sizing dropped");
        Ok(ScaleTransition::Reset)
    }

    /// Restore `style` on the image, give the host its caret back and remove
    /// the wrapper. Every step is attempted; the first failure is returned.
    fn teardown(
        &self,
        active: &ActiveScale<P::Node>,
        style: Option<&str>,
    ) -> Result<(), PlatformError> {
        let styled = self.platform.set_inline_style(&active.image, style);
        let caret = match &active.host {
            Some(host) => self
                .platform
                .set_caret_color(host, &active.host_caret_color),
            None => Ok(()),
        };
        let unwrapped = self.platform.unwrap(&active.wrapper, &active.image);
        styled.and(caret).and(unwrapped)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::normalize::normalize;
    use crate::style::{SCALE_PROPERTIES, px};

    #[derive(Debug, Default)]
    struct FakeNode {
        tag: &'static str,
        style: Option<String>,
        width: f64,
        editable: bool,
        caret_color: String,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    /// In-memory document; nodes are indices.
    #[derive(Debug, Default)]
    struct FakeDom {
        nodes: RefCell<Vec<FakeNode>>,
        caret: Cell<Option<usize>>,
        selection_cleared: Cell<usize>,
        fail_caret: Cell<bool>,
    }

    impl FakeDom {
        fn add(&self, parent: Option<usize>, node: FakeNode) -> usize {
            let mut nodes = self.nodes.borrow_mut();
            let id = nodes.len();
            nodes.push(FakeNode { parent, ..node });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }
            id
        }

        fn children(&self, node: usize) -> Vec<usize> {
            self.nodes.borrow()[node].children.clone()
        }

        fn style(&self, node: usize) -> Option<String> {
            self.nodes.borrow()[node].style.clone()
        }

        fn caret_of(&self, node: usize) -> String {
            self.nodes.borrow()[node].caret_color.clone()
        }

        fn resize(&self, node: usize, width: f64) {
            self.nodes.borrow_mut()[node].width = width;
        }
    }

    impl ScalePlatform for &FakeDom {
        type Node = usize;

        fn is_image(&self, node: &usize) -> bool {
            self.nodes.borrow()[*node].tag == "img"
        }

        fn rendered_width(&self, node: &usize) -> f64 {
            self.nodes.borrow()[*node].width
        }

        fn inline_style(&self, node: &usize) -> Option<String> {
            self.style(*node)
        }

        fn set_inline_style(&self, node: &usize, style: Option<&str>) -> Result<(), PlatformError> {
            self.nodes.borrow_mut()[*node].style = style.map(str::to_owned);
            Ok(())
        }

        fn wrap(&self, image: &usize, style: &InlineStyle) -> Result<usize, PlatformError> {
            let parent = self.nodes.borrow()[*image].parent.ok_or("image is detached")?;
            let wrapper = self.add(
                None,
                FakeNode {
                    tag: "div",
                    style: Some(style.to_string()),
                    width: style.px("width").unwrap_or_default(),
                    ..FakeNode::default()
                },
            );
            let mut nodes = self.nodes.borrow_mut();
            let pos = nodes[parent]
                .children
                .iter()
                .position(|c| c == image)
                .ok_or("image not in parent")?;
            nodes[parent].children[pos] = wrapper;
            nodes[wrapper].parent = Some(parent);
            nodes[wrapper].children.push(*image);
            nodes[*image].parent = Some(wrapper);
            Ok(wrapper)
        }

        fn unwrap(&self, wrapper: &usize, image: &usize) -> Result<(), PlatformError> {
            let mut nodes = self.nodes.borrow_mut();
            let parent = nodes[*wrapper].parent.ok_or("wrapper is detached")?;
            let pos = nodes[parent]
                .children
                .iter()
                .position(|c| c == wrapper)
                .ok_or("wrapper not in parent")?;
            nodes[parent].children[pos] = *image;
            nodes[*image].parent = Some(parent);
            nodes[*wrapper].parent = None;
            nodes[*wrapper].children.clear();
            Ok(())
        }

        fn editable_host(&self, node: &usize) -> Option<usize> {
            let nodes = self.nodes.borrow();
            let mut current = nodes[*node].parent;
            while let Some(id) = current {
                if nodes[id].editable {
                    return Some(id);
                }
                current = nodes[id].parent;
            }
            None
        }

        fn caret_color(&self, host: &usize) -> String {
            self.caret_of(*host)
        }

        fn set_caret_color(&self, host: &usize, color: &str) -> Result<(), PlatformError> {
            self.nodes.borrow_mut()[*host].caret_color = color.to_owned();
            Ok(())
        }

        fn collapse_caret_after(&self, wrapper: &usize) -> Result<(), PlatformError> {
            if self.fail_caret.get() {
                return Err("no selection available".into());
            }
            let nodes = self.nodes.borrow();
            let parent = nodes[*wrapper].parent.ok_or("wrapper is detached")?;
            let siblings = &nodes[parent].children;
            let next = siblings
                .iter()
                .position(|c| c == wrapper)
                .and_then(|pos| siblings.get(pos + 1))
                .copied();
            self.caret.set(Some(next.unwrap_or(*wrapper)));
            Ok(())
        }

        fn clear_text_selection(&self) -> Result<(), PlatformError> {
            self.selection_cleared.set(self.selection_cleared.get() + 1);
            Ok(())
        }
    }

    struct Doc {
        dom: FakeDom,
        host: usize,
        image: usize,
        text: usize,
    }

    fn doc(image_style: Option<&str>) -> Doc {
        let dom = FakeDom::default();
        let root = dom.add(None, FakeNode { tag: "div", ..FakeNode::default() });
        let host = dom.add(
            Some(root),
            FakeNode {
                tag: "div",
                editable: true,
                caret_color: "blue".to_owned(),
                ..FakeNode::default()
            },
        );
        let image = dom.add(
            Some(host),
            FakeNode {
                tag: "img",
                style: image_style.map(str::to_owned),
                width: 120.0,
                ..FakeNode::default()
            },
        );
        let text = dom.add(Some(host), FakeNode { tag: "span", ..FakeNode::default() });
        Doc { dom, host, image, text }
    }

    fn event(kind: ScaleEventKind, target: usize) -> ScaleEvent<usize> {
        ScaleEvent { kind, target }
    }

    #[test]
    fn test_event_kinds_round_trip_dom_types() {
        for kind in ScaleEventKind::ALL {
            assert_eq!(ScaleEventKind::from_dom_type(kind.dom_type()), Some(kind));
        }
        assert_eq!(ScaleEventKind::from_dom_type("focusout"), None);
    }

    #[test]
    fn test_select_wraps_image() {
        let doc = doc(Some("border: 1px solid red; width: 120px"));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());

        let outcome = selection.handle_event(&event(ScaleEventKind::Click, doc.image));
        assert_eq!(outcome, Ok(ScaleTransition::Selected));

        let active = selection.active().unwrap().clone();
        assert_eq!(doc.dom.children(doc.host), [active.wrapper, doc.text]);
        assert_eq!(doc.dom.children(active.wrapper), [doc.image]);
        assert_eq!(active.host, Some(doc.host));
        assert_eq!(active.width, 120.0);
        assert_eq!(
            doc.dom.style(active.wrapper).as_deref(),
            Some(
                "cursor: crosshair; border: 2px solid #99D1FF; overflow: hidden; \
                 resize: horizontal; display: inline-block; width: 120px;"
            )
        );
        assert_eq!(
            doc.dom.style(doc.image).as_deref(),
            Some(
                "border: 1px solid red; width: 100%; display: block; pointer-events: none; \
                 object-fit: contain; height: auto;"
            )
        );
        assert_eq!(doc.dom.caret_of(doc.host), "transparent");
        assert_eq!(doc.dom.caret.get(), Some(doc.text));
    }

    #[test]
    fn test_caret_lands_on_wrapper_without_next_sibling() {
        let doc = doc(None);
        doc.dom.nodes.borrow_mut()[doc.host].children.pop();
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());
        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;
        assert_eq!(doc.dom.caret.get(), Some(wrapper));
    }

    #[test]
    fn test_round_trip_restores_style_exactly() {
        for style in [None, Some("width: 120px;color:red"), Some("")] {
            let doc = doc(style);
            let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());
            selection.select(&doc.image).unwrap();

            let outcome = selection.handle_event(&event(ScaleEventKind::MouseDown, doc.text));
            assert_eq!(outcome, Ok(ScaleTransition::Deselected { resized_to: None }));
            assert_eq!(doc.dom.style(doc.image).as_deref(), style);
            assert_eq!(doc.dom.children(doc.host), [doc.image, doc.text]);
            assert_eq!(doc.dom.caret_of(doc.host), "blue");
            assert!(!selection.is_active());
        }
    }

    #[test]
    fn test_resize_wins() {
        let doc = doc(Some("max-width: 5px; width: 120px; height: 40px; pointer-events: none"));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());
        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;

        // Mouse-down on the wrapper starts the drag.
        let outcome = selection.handle_event(&event(ScaleEventKind::MouseDown, wrapper));
        assert_eq!(outcome, Ok(ScaleTransition::Ignored));
        doc.dom.resize(wrapper, 200.0);

        let outcome = selection.handle_event(&event(ScaleEventKind::KeyDown, wrapper));
        assert_eq!(outcome, Ok(ScaleTransition::Deselected { resized_to: Some(200.0) }));

        let style = InlineStyle::parse(&doc.dom.style(doc.image).unwrap()).unwrap();
        for prop in ["width", "min-width", "max-width"] {
            assert_eq!(style.get(prop), Some("200px"), "{prop}");
        }
        assert_eq!(style.get("height"), Some("auto"));
        assert_eq!(style.get("pointer-events"), Some("auto"));
        assert_eq!(style.get("display"), Some("inline-block"));
    }

    #[test]
    fn test_resize_keeps_data_uri_background() {
        let background = r#"url("data:image/png;base64,iVBORw0KGgo=")"#;
        let doc = doc(Some(&format!("background: {background}; width: 120px")));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());
        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;

        doc.dom.resize(wrapper, 90.0);
        selection.release().unwrap();
        let style = InlineStyle::parse(&doc.dom.style(doc.image).unwrap()).unwrap();
        assert_eq!(style.get("background"), Some(background));
        assert_eq!(style.get("max-width"), Some("90px"));
    }

    #[test]
    fn test_unreadable_style_is_not_selected() {
        let doc = doc(Some(r#"font-family: "Noto; width: 120px"#));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());

        let err = selection.select(&doc.image).unwrap_err();
        assert_eq!(err, PlatformError::from("image style: unclosed quote"));
        assert!(!selection.is_active());
        assert_eq!(doc.dom.children(doc.host), [doc.image, doc.text]);
        assert_eq!(
            doc.dom.style(doc.image).as_deref(),
            Some(r#"font-family: "Noto; width: 120px"#)
        );
    }

    #[test]
    fn test_resize_matches_normalized_storage() {
        let doc = doc(Some("border: 0; width: 120px"));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());
        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;

        // What storage would see if the note were saved mid-selection.
        let stored = format!(
            r#"<div class="esi_scale_div" style="{}"><img style="{}"></div>"#,
            wrapper_style("2px solid #99D1FF", 250.0),
            doc.dom.style(doc.image).unwrap(),
        );
        let normalized = normalize(&stored).unwrap();
        let stored_style = normalized
            .split_once(r#"style=""#)
            .and_then(|(_, rest)| rest.split_once('"'))
            .map(|(style, _)| InlineStyle::parse(style).unwrap())
            .unwrap();

        doc.dom.resize(wrapper, 250.0);
        selection.release().unwrap();
        let live_style = InlineStyle::parse(&doc.dom.style(doc.image).unwrap()).unwrap();

        for prop in SCALE_PROPERTIES {
            assert_eq!(live_style.get(prop), stored_style.get(prop), "{prop}");
        }
        assert_eq!(live_style.get("width"), Some(px(250.0).as_str()));
        assert_eq!(live_style.get("border"), stored_style.get("border"));
    }

    #[test]
    fn test_reset_on_wrapper_only() {
        let doc = doc(Some("width: 120px; min-width: 120px; color: red"));
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());

        let outcome = selection.handle_event(&event(ScaleEventKind::DoubleClick, doc.image));
        assert_eq!(outcome, Ok(ScaleTransition::Ignored));

        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;
        let outcome = selection.handle_event(&event(ScaleEventKind::DoubleClick, doc.text));
        assert_eq!(outcome, Ok(ScaleTransition::Ignored));
        assert!(selection.is_active());

        let outcome = selection.handle_event(&event(ScaleEventKind::DoubleClick, wrapper));
        assert_eq!(outcome, Ok(ScaleTransition::Reset));
        assert_eq!(
            doc.dom.style(doc.image).as_deref(),
            Some("color: red; pointer-events: auto; height: auto;")
        );
        assert_eq!(doc.dom.children(doc.host), [doc.image, doc.text]);
        assert_eq!(doc.dom.caret_of(doc.host), "blue");
        assert_eq!(doc.dom.selection_cleared.get(), 1);
        assert!(!selection.is_active());
    }

    #[test]
    fn test_preconditions_are_silent() {
        let doc = doc(None);
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());

        for kind in [ScaleEventKind::KeyDown, ScaleEventKind::MouseDown] {
            assert_eq!(selection.handle_event(&event(kind, doc.image)), Ok(ScaleTransition::Ignored));
        }
        assert_eq!(selection.select(&doc.text), Ok(ScaleTransition::Ignored));
        assert_eq!(selection.release(), Ok(ScaleTransition::Ignored));

        selection.select(&doc.image).unwrap();
        let first = selection.active().cloned();
        assert_eq!(selection.select(&doc.image), Ok(ScaleTransition::Ignored));
        assert_eq!(selection.active().cloned(), first);
    }

    #[test]
    fn test_platform_failure_leaves_slot_empty() {
        let doc = doc(Some("width: 120px"));
        doc.dom.fail_caret.set(true);
        let mut selection = ScaleSelection::new(&doc.dom, &EditorSettings::default());

        let err = selection.select(&doc.image).unwrap_err();
        assert_eq!(err, PlatformError::from("no selection available"));
        assert!(!selection.is_active());
        assert_eq!(doc.dom.style(doc.image).as_deref(), Some("width: 120px"));
        assert_eq!(doc.dom.children(doc.host), [doc.image, doc.text]);
        assert_eq!(doc.dom.caret_of(doc.host), "blue");
    }

    #[test]
    fn test_custom_border() {
        let doc = doc(None);
        let settings = EditorSettings {
            selected_border: "1px dashed red".to_owned(),
            ..EditorSettings::default()
        };
        let mut selection = ScaleSelection::new(&doc.dom, &settings);
        selection.select(&doc.image).unwrap();
        let wrapper = selection.active().unwrap().wrapper;
        assert!(doc.dom.style(wrapper).unwrap().contains("border: 1px dashed red;"));
    }
}
