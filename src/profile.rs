//! Declarative plugin profiles and their JSON descriptor documents.
//!
//! A descriptor is one JSON object per file. Recognized keys:
//! `pluginName`, `pluginId`, `manufacturer`, `version`, `isChunkBased`,
//! `isVst2`, `isVst3`, `defaultLayerType`, `profileAuthor`, `notes`,
//! `aliases`, `requiredSamples` and `parameterMappings`. Anything else is
//! ignored, and every missing key falls back to an empty/false default so a
//! sparse document never fails extraction.

use crate::error::{ConvertError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

/// File extension of profile descriptor documents.
pub const PROFILE_EXTENSION: &str = "json";

/// Layer type used when a profile does not name one.
pub const FALLBACK_LAYER_TYPE: &str = "Synth";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginProfile {
    pub plugin_name: String,
    /// Vendor 4-character code or equivalent.
    pub plugin_id: String,
    pub manufacturer: String,
    pub version: String,

    pub is_chunk_based: bool,
    pub is_vst2: bool,
    pub is_vst3: bool,
    pub default_layer_type: String,
    pub aliases: Vec<String>,
    pub required_samples: Vec<String>,
    /// Interpreted by a downstream mapper, carried through untouched here.
    pub parameter_mappings: Vec<Value>,

    pub profile_author: String,
    pub notes: String,
    #[serde(skip)]
    pub creation_date: DateTime<Local>,
}

impl Default for PluginProfile {
    fn default() -> Self {
        Self {
            plugin_name: String::new(),
            plugin_id: String::new(),
            manufacturer: String::new(),
            version: String::new(),
            is_chunk_based: false,
            is_vst2: false,
            is_vst3: false,
            default_layer_type: String::new(),
            aliases: Vec::new(),
            required_samples: Vec::new(),
            parameter_mappings: Vec::new(),
            profile_author: String::new(),
            notes: String::new(),
            creation_date: Local::now(),
        }
    }
}

impl PluginProfile {
    pub fn new(plugin_id: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            plugin_name: plugin_name.into(),
            ..Self::default()
        }
    }

    /// A profile is usable only when it carries both an id and a name.
    pub fn is_valid(&self) -> bool {
        !self.plugin_id.is_empty() && !self.plugin_name.is_empty()
    }

    /// Layer type for generators, falling back to [`FALLBACK_LAYER_TYPE`].
    pub fn layer_type(&self) -> &str {
        if self.default_layer_type.is_empty() {
            FALLBACK_LAYER_TYPE
        } else {
            &self.default_layer_type
        }
    }

    /// Extract a profile from an already-parsed descriptor tree.
    ///
    /// `source` is only used to name the document in error messages.
    pub fn from_document(document: &Value, source: &Path) -> Result<Self> {
        let obj = document
            .as_object()
            .ok_or_else(|| ConvertError::malformed("JSON is not an object", source))?;

        let profile = Self {
            plugin_name: string_prop(obj, "pluginName"),
            plugin_id: string_prop(obj, "pluginId"),
            manufacturer: string_prop(obj, "manufacturer"),
            version: string_prop(obj, "version"),
            is_chunk_based: bool_prop(obj, "isChunkBased"),
            is_vst2: bool_prop(obj, "isVst2"),
            is_vst3: bool_prop(obj, "isVst3"),
            default_layer_type: string_prop(obj, "defaultLayerType"),
            profile_author: string_prop(obj, "profileAuthor"),
            notes: string_prop(obj, "notes"),
            aliases: string_array_prop(obj, "aliases"),
            required_samples: string_array_prop(obj, "requiredSamples"),
            parameter_mappings: value_array_prop(obj, "parameterMappings"),
            creation_date: Local::now(),
        };

        if !profile.is_valid() {
            return Err(ConvertError::malformed(
                "Profile missing pluginName or pluginId",
                source,
            ));
        }

        Ok(profile)
    }

    /// Parse descriptor bytes into a profile.
    pub fn from_json_bytes(bytes: &[u8], source: &Path) -> Result<Self> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| ConvertError::malformed(format!("Invalid JSON ({e}) in"), source))?;
        Self::from_document(&document, source)
    }

    /// Read and parse a descriptor document from disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConvertError::not_found("Profile", path));
        }
        let bytes = fs::read(path)
            .map_err(|e| ConvertError::io(format!("Failed to read profile {:?}", path), e))?;
        Self::from_json_bytes(&bytes, path)
    }

    /// Descriptor document for this profile, using the same keys it is loaded from.
    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| ConvertError::invalid_state(format!("Failed to encode profile: {e}")))
    }

    /// Write the descriptor document to `path`, replacing it atomically.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| ConvertError::invalid_state(format!("Failed to encode profile: {e}")))?;
        write_atomically(path, &content)
    }
}

/// Write `bytes` to a temporary file next to `dest`, then rename it over
/// `dest`. On any failure the temporary file is removed and `dest` is left as
/// it was.
pub(crate) fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(ConvertError::not_found("Output directory", dir));
    }

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| ConvertError::io(format!("Failed to create temp file in {:?}", dir), e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| ConvertError::io(format!("Failed to write {:?}", dest), e))?;
    tmp.persist(dest)
        .map_err(|e| ConvertError::io(format!("Failed to replace {:?}", dest), e.error))?;
    Ok(())
}

fn string_prop(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(value_to_string).unwrap_or_default()
}

fn bool_prop(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.parse::<i64>().map(|i| i != 0).unwrap_or(false)
        }
        _ => false,
    }
}

fn string_array_prop(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        _ => Vec::new(),
    }
}

fn value_array_prop(obj: &Map<String, Value>, key: &str) -> Vec<Value> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
