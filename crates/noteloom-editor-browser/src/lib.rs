//! Browser DOM layer for the noteloom editor extensions.
//!
//! This crate carries out what `noteloom-editor-core` decides against the
//! live document. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `scale`: `ScalePlatform` over `web_sys` elements
//! - `events`: click/dblclick/keydown/mousedown listeners feeding the selection
//! - `media`: display field write-back for inline media
//! - `pairing`: focus-out wiring between source and display fields
//! - `session`: one editor's listeners, selection slot and bound fields
//!
//! # Re-exports
//!
//! This crate re-exports `noteloom-editor-core` for convenience, so consumers
//! only need to depend on `noteloom-editor-browser`.

// Re-export core crate
pub use noteloom_editor_core;
pub use noteloom_editor_core::*;

pub mod events;
pub mod media;
pub mod pairing;
pub mod scale;
pub mod session;

pub use events::{SharedScale, dispatch_scale_event, install_scale_listeners, parse_scale_event};
pub use media::{pause_media, sync_media_field};
pub use pairing::{BoundField, wire_field_pairs};
pub use scale::BrowserScalePlatform;
pub use session::{BOUND_MARKER, EditorSession};
