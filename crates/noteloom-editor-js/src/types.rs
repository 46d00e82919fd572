//! Types exposed to JavaScript via wasm-bindgen.

use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

use noteloom_editor_browser::{BoundField, EditorSettings};

#[wasm_bindgen(typescript_custom_section)]
const TS_EDITOR_SETTINGS: &'static str = r#"
/**
 * Editor settings. Missing keys keep their defaults; the labelled keys of the
 * add-on config file (`"Selected border"`, `"Audio extension"`, ...) are
 * accepted too.
 */
export interface EditorSettings {
    selectedBorder?: string;
    audioExt?: string;
    videoExt?: string;
    autoplay?: boolean;
    loop?: boolean;
    mute?: boolean;
    /** `-1` leaves the attribute off. */
    height?: number;
    /** `-1` leaves the attribute off. */
    width?: number;
}
"#;

#[wasm_bindgen(typescript_custom_section)]
const TS_NOTE_FIELD: &'static str = r#"
/** One field of the note being loaded, in field order. */
export interface NoteField {
    /** Field name, e.g. `Sentence` or `Sentence/media`. */
    label: string;
    /** Element receiving the field's events; its shadow root is used when present. */
    root: Element;
    /** The contenteditable surface holding the field text. */
    editable: HTMLElement;
}
"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(typescript_type = "NoteField[]")]
    pub type NoteFieldArray;

    #[wasm_bindgen(typescript_type = "EditorSettings")]
    pub type EditorSettingsInit;
}

/// Read the host's settings object.
pub fn parse_settings(settings: Option<EditorSettingsInit>) -> Result<EditorSettings, JsError> {
    let Some(settings) = settings else {
        return Ok(EditorSettings::default());
    };
    let settings: EditorSettings = serde_wasm_bindgen::from_value(settings.into())
        .map_err(|e| JsError::new(&format!("Invalid settings: {}", e)))?;
    Ok(settings.sanitized())
}

fn get(obj: &JsValue, key: &str) -> Result<JsValue, JsError> {
    let value = Reflect::get(obj, &JsValue::from_str(key))
        .map_err(|e| JsError::new(&format!("Cannot read field {key}: {e:?}")))?;
    if value.is_null() || value.is_undefined() {
        return Err(JsError::new(&format!("Missing required field: {key}")));
    }
    Ok(value)
}

/// Read the host's field list.
pub fn parse_fields(fields: &JsValue) -> Result<Vec<BoundField>, JsError> {
    if !Array::is_array(fields) {
        return Err(JsError::new("Fields must be an array"));
    }
    Array::from(fields)
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let label = get(&field, "label")?
                .as_string()
                .ok_or_else(|| JsError::new(&format!("Field {index}: label must be a string")))?;
            let root = get(&field, "root")?
                .dyn_into::<Element>()
                .map_err(|_| JsError::new(&format!("Field {index}: root must be an Element")))?;
            let editable = get(&field, "editable")?
                .dyn_into::<HtmlElement>()
                .map_err(|_| {
                    JsError::new(&format!("Field {index}: editable must be an HTMLElement"))
                })?;
            Ok(BoundField {
                label,
                root,
                editable,
            })
        })
        .collect()
}
