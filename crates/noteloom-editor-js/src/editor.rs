//! JsNoteEditor - the editor session exposed to JavaScript.

use wasm_bindgen::prelude::*;

use noteloom_editor_browser::{
    EditorSession, EditorSettings, FlushError, normalize, normalize_fields,
};

use crate::types::{EditorSettingsInit, NoteFieldArray, parse_fields, parse_settings};

/// Image scaling and inline media for one editor.
///
/// Call `onNoteLoad` whenever a note is loaded into the editor's fields and
/// `onNoteFlush` with the note's field texts before it is stored.
#[wasm_bindgen(js_name = NoteEditor)]
pub struct JsNoteEditor {
    session: EditorSession,
}

#[wasm_bindgen(js_class = NoteEditor)]
impl JsNoteEditor {
    /// Create an editor session. `settings` may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: Option<EditorSettingsInit>) -> Result<JsNoteEditor, JsError> {
        Self::with_settings(parse_settings(settings)?)
    }

    /// Create an editor session from the add-on's JSON config text.
    #[wasm_bindgen(js_name = fromConfigJson)]
    pub fn from_config_json(json: &str) -> Result<JsNoteEditor, JsError> {
        let settings = EditorSettings::from_json(json).map_err(|e| JsError::new(&e.to_string()))?;
        Self::with_settings(settings)
    }

    fn with_settings(settings: EditorSettings) -> Result<JsNoteEditor, JsError> {
        let session = EditorSession::new(settings)
            .map_err(|e| JsError::new(&format!("Cannot create editor: {}", e)))?;
        Ok(Self { session })
    }

    /// Bind the fields of a newly loaded note. Returns how many field roots
    /// were bound.
    #[wasm_bindgen(js_name = onNoteLoad)]
    pub fn on_note_load(&mut self, fields: NoteFieldArray) -> Result<usize, JsError> {
        let fields = parse_fields(&fields)?;
        Ok(self.session.attach(&fields))
    }

    /// Normalize the note's field texts for storage.
    ///
    /// Throws if any field holds a malformed scale wrapper; the message lists
    /// every failing field.
    #[wasm_bindgen(js_name = onNoteFlush)]
    pub fn on_note_flush(&self, texts: Vec<String>) -> Result<Vec<String>, JsError> {
        normalize_texts(texts)
    }

    /// Remove all listeners and release any selected image.
    pub fn detach(&mut self) {
        self.session.detach();
    }

    /// Whether an image is currently selected for scaling.
    #[wasm_bindgen(js_name = hasSelection)]
    pub fn has_selection(&self) -> bool {
        self.session.has_selection()
    }

    /// The settings in effect.
    #[wasm_bindgen(js_name = getSettings)]
    pub fn get_settings(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(self.session.settings())
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }
}

/// Collapse scale wrappers in a single field text.
#[wasm_bindgen(js_name = normalizeField)]
pub fn normalize_field(text: &str) -> Result<String, JsError> {
    normalize(text).map_err(|e| JsError::new(&e.to_string()))
}

fn normalize_texts(mut texts: Vec<String>) -> Result<Vec<String>, JsError> {
    match normalize_fields(&mut texts) {
        Ok(_) => Ok(texts),
        Err(err) => Err(JsError::new(&flush_message(&err))),
    }
}

fn flush_message(err: &FlushError) -> String {
    let details: Vec<String> = err.failures.iter().map(|f| f.to_string()).collect();
    format!("{}: {}", err, details.join("; "))
}
