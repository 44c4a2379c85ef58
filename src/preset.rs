use crate::profile::PluginProfile;
use std::path::PathBuf;

/// Preset content as read from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// Nothing parsed yet. Only seen on invalid presets.
    #[default]
    Empty,
    /// Full text document in a vendor grammar.
    Text(String),
    /// Opaque plugin state.
    Chunk(Vec<u8>),
}

/// Canonical, format-agnostic preset produced by every parser and consumed by
/// every generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetData {
    pub preset_name: String,
    /// Identity hints from the source. Empty when the parser could not tell.
    pub plugin_name: String,
    pub plugin_id: String,
    pub is_valid: bool,
    pub payload: Payload,
    pub source_path: Option<PathBuf>,
    /// Profile attached by [`PresetData::enrich`].
    pub profile: Option<PluginProfile>,
}

impl PresetData {
    pub fn text(preset_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            preset_name: preset_name.into(),
            is_valid: true,
            payload: Payload::Text(text.into()),
            ..Self::default()
        }
    }

    pub fn chunk(preset_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            preset_name: preset_name.into(),
            is_valid: true,
            payload: Payload::Chunk(bytes),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn is_text_based(&self) -> bool {
        matches!(self.payload, Payload::Text(_))
    }

    pub fn is_chunk_based(&self) -> bool {
        matches!(self.payload, Payload::Chunk(_))
    }

    pub fn text_data(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn chunk_data(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Chunk(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Raw bytes of whichever payload is present.
    pub fn payload_bytes(&self) -> &[u8] {
        match &self.payload {
            Payload::Empty => &[],
            Payload::Text(text) => text.as_bytes(),
            Payload::Chunk(bytes) => bytes,
        }
    }

    /// Attach a resolved profile, filling identity hints the parser left empty.
    pub fn enrich(&mut self, profile: PluginProfile) {
        if self.plugin_id.is_empty() {
            self.plugin_id = profile.plugin_id.clone();
        }
        if self.plugin_name.is_empty() {
            self.plugin_name = profile.plugin_name.clone();
        }
        self.profile = Some(profile);
    }
}
