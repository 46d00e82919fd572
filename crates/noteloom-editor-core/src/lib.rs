//! noteloom-editor-core: Pure Rust logic for the note editor extensions.
//!
//! This crate provides:
//! - `ScaleSelection<P>` - the image scale selection state machine, generic over
//!   a `ScalePlatform` that owns the actual document
//! - `normalize` - collapses leftover scale wrapper markup before a note is stored
//! - `synchronize` - renders `[sound:…]` tags from a source field into a display field
//! - `PairingResolver` - groups `<base>` / `<base>/media` fields into pairs
//! - `EditorSettings` - the immutable configuration record shared by all of the above

pub mod error;
pub mod markup;
pub mod media;
pub mod normalize;
pub mod pairing;
pub mod platform;
pub mod selection;
pub mod settings;
pub mod style;

pub use error::{FieldFailure, FlushError, NormalizeError, SettingsError, StyleError};
pub use media::{
    MediaKind, MediaOptions, MediaTag, SyncOutcome, block_id, media_tags, parse_media_tag,
    render_control, render_display, split_lines, synchronize,
};
pub use normalize::{Segment, WRAPPER_CLASS, WrapperSpan, normalize, normalize_fields, tokenize};
pub use pairing::{FieldLabel, FieldPair, FieldRole, PairingResolver, resolve_pairs};
pub use platform::{PlatformError, ScalePlatform};
pub use selection::{ActiveScale, ScaleEvent, ScaleEventKind, ScaleSelection, ScaleTransition};
pub use settings::EditorSettings;
pub use smol_str::SmolStr;
pub use style::InlineStyle;
