//! Editor settings.
//!
//! Settings are read once by the host and handed to the editor session as a
//! plain record. Keys are accepted both in camelCase and in the labelled form
//! used by the add-on config file (`"Selected border"`, `"Audio extension"`, …).

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Border drawn around the wrapper of the selected image.
pub const DEFAULT_SELECTED_BORDER: &str = "2px solid #99D1FF";

/// Height/width value meaning "leave the attribute off".
pub const UNSET_DIMENSION: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    #[serde(alias = "Selected border")]
    pub selected_border: String,
    /// Extension treated as audio, compared case-sensitively.
    #[serde(alias = "Audio extension")]
    pub audio_ext: String,
    /// Extension treated as video, compared case-sensitively.
    #[serde(alias = "Video extension")]
    pub video_ext: String,
    #[serde(alias = "Autoplay")]
    pub autoplay: bool,
    #[serde(rename = "loop", alias = "Loop")]
    pub loop_playback: bool,
    #[serde(alias = "Mute")]
    pub mute: bool,
    #[serde(alias = "Height")]
    pub height: i32,
    #[serde(alias = "Width")]
    pub width: i32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            selected_border: DEFAULT_SELECTED_BORDER.to_owned(),
            audio_ext: "ogg".to_owned(),
            video_ext: "webm".to_owned(),
            autoplay: false,
            loop_playback: false,
            mute: false,
            height: UNSET_DIMENSION,
            width: UNSET_DIMENSION,
        }
    }
}

impl EditorSettings {
    /// Parse settings from the host's JSON config. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Replace values the host left blank with defaults.
    pub fn sanitized(mut self) -> Self {
        if self.selected_border.trim().is_empty() {
            self.selected_border = DEFAULT_SELECTED_BORDER.to_owned();
        }
        self
    }

    /// Configured media height, `None` when unset.
    pub fn default_height(&self) -> Option<u32> {
        dimension(self.height)
    }

    /// Configured media width, `None` when unset.
    pub fn default_width(&self) -> Option<u32> {
        dimension(self.width)
    }
}

fn dimension(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}
