//! Browser implementation of the scale platform.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, Node};

use noteloom_editor_core::normalize::WRAPPER_CLASS;
use noteloom_editor_core::{InlineStyle, PlatformError, ScalePlatform};

/// Editable ancestor lookup; `contenteditable="false"` islands do not count.
const EDITABLE_SELECTOR: &str = r#"[contenteditable]:not([contenteditable="false"])"#;

/// `ScalePlatform` over the elements of one document.
#[derive(Debug, Clone)]
pub struct BrowserScalePlatform {
    document: Document,
}

impl BrowserScalePlatform {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Platform for the current window's document.
    pub fn from_window() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn js_err(what: &str) -> impl FnOnce(wasm_bindgen::JsValue) -> PlatformError + '_ {
    move |e| PlatformError(format!("{what} failed: {e:?}"))
}

impl ScalePlatform for BrowserScalePlatform {
    type Node = Element;

    fn is_image(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlImageElement>().is_some()
    }

    fn rendered_width(&self, node: &Element) -> f64 {
        // Images report their layout width; the wrapper its content box,
        // which is what the resize handle changes.
        match node.dyn_ref::<HtmlImageElement>() {
            Some(image) => f64::from(image.width()),
            None => f64::from(node.client_width()),
        }
    }

    fn inline_style(&self, node: &Element) -> Option<String> {
        node.get_attribute("style")
    }

    fn set_inline_style(&self, node: &Element, style: Option<&str>) -> Result<(), PlatformError> {
        match style {
            Some(style) => node
                .set_attribute("style", style)
                .map_err(js_err("set_attribute(style)")),
            None => node
                .remove_attribute("style")
                .map_err(js_err("remove_attribute(style)")),
        }
    }

    fn wrap(&self, image: &Element, style: &InlineStyle) -> Result<Element, PlatformError> {
        let parent = image.parent_node().ok_or("image has no parent")?;
        let wrapper = self
            .document
            .create_element("div")
            .map_err(js_err("create_element"))?;
        wrapper.set_class_name(WRAPPER_CLASS);
        wrapper
            .set_attribute("style", &style.to_string())
            .map_err(js_err("set_attribute(style)"))?;
        parent
            .insert_before(&wrapper, Some(image))
            .map_err(js_err("insert_before"))?;
        wrapper
            .append_child(image)
            .map_err(js_err("append_child"))?;
        Ok(wrapper)
    }

    fn unwrap(&self, wrapper: &Element, image: &Element) -> Result<(), PlatformError> {
        wrapper
            .replace_with_with_node_1(image)
            .map_err(js_err("replace_with"))
    }

    fn editable_host(&self, node: &Element) -> Option<Element> {
        node.closest(EDITABLE_SELECTOR).ok().flatten()
    }

    fn caret_color(&self, host: &Element) -> String {
        host.dyn_ref::<HtmlElement>()
            .and_then(|host| host.style().get_property_value("caret-color").ok())
            .unwrap_or_default()
    }

    fn set_caret_color(&self, host: &Element, color: &str) -> Result<(), PlatformError> {
        let host = host
            .dyn_ref::<HtmlElement>()
            .ok_or("editable host is not an HtmlElement")?;
        let style = host.style();
        if color.is_empty() {
            style
                .remove_property("caret-color")
                .map(|_| ())
                .map_err(js_err("remove_property(caret-color)"))
        } else {
            style
                .set_property("caret-color", color)
                .map_err(js_err("set_property(caret-color)"))
        }
    }

    fn collapse_caret_after(&self, wrapper: &Element) -> Result<(), PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let selection = window
            .get_selection()
            .map_err(js_err("get_selection"))?
            .ok_or("no selection object")?;
        let range = self.document.create_range().map_err(js_err("create_range"))?;

        let anchor: Node = wrapper
            .next_sibling()
            .unwrap_or_else(|| wrapper.clone().into());
        range.set_start(&anchor, 0).map_err(js_err("set_start"))?;
        range.collapse_with_to_start(true);

        selection
            .remove_all_ranges()
            .map_err(js_err("remove_all_ranges"))?;
        selection.add_range(&range).map_err(js_err("add_range"))
    }

    fn clear_text_selection(&self) -> Result<(), PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        match window.get_selection().map_err(js_err("get_selection"))? {
            Some(selection) => selection
                .remove_all_ranges()
                .map_err(js_err("remove_all_ranges")),
            None => Ok(()),
        }
    }
}
