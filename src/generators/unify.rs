use super::{ensure_valid, PresetGenerator};
use crate::error::{ConvertError, Result};
use crate::preset::{Payload, PresetData};
use crate::profile::FALLBACK_LAYER_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

pub const UNIFY_FORMAT: &str = "unify-patch";
pub const UNIFY_FORMAT_VERSION: u32 = 1;

/// Single-layer Unify patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyPatch {
    pub format: String,
    pub format_version: u32,
    pub patch_name: String,
    pub created_at: String,
    pub layer: UnifyLayer,
    pub state: UnifyState,
    #[serde(default)]
    pub required_samples: Vec<String>,
    #[serde(default)]
    pub parameter_mappings: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyLayer {
    pub layer_type: String,
    pub plugin_name: String,
    pub plugin_id: String,
    pub manufacturer: String,
    pub plugin_version: String,
    pub is_vst2: bool,
    pub is_vst3: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyState {
    /// `"text"` or `"hex"`.
    pub encoding: String,
    pub data: String,
    pub size: usize,
    /// MD5 of the decoded state bytes.
    pub md5: String,
}

impl UnifyPatch {
    /// Build a patch from a valid preset and its attached profile, if any.
    pub fn from_preset(preset: &PresetData) -> Result<Self> {
        ensure_valid(preset)?;

        let profile = preset.profile.as_ref();
        let (encoding, data) = match &preset.payload {
            Payload::Text(text) => ("text", text.clone()),
            Payload::Chunk(bytes) => ("hex", to_hex(bytes)),
            Payload::Empty => return Err(ConvertError::invalid_state("preset has no payload")),
        };
        let raw = preset.payload_bytes();

        Ok(Self {
            format: UNIFY_FORMAT.to_string(),
            format_version: UNIFY_FORMAT_VERSION,
            patch_name: preset.preset_name.clone(),
            created_at: chrono::Local::now().to_rfc3339(),
            layer: UnifyLayer {
                layer_type: profile
                    .map(|p| p.layer_type().to_string())
                    .unwrap_or_else(|| FALLBACK_LAYER_TYPE.to_string()),
                plugin_name: preset.plugin_name.clone(),
                plugin_id: preset.plugin_id.clone(),
                manufacturer: profile.map(|p| p.manufacturer.clone()).unwrap_or_default(),
                plugin_version: profile.map(|p| p.version.clone()).unwrap_or_default(),
                is_vst2: profile.map(|p| p.is_vst2).unwrap_or(false),
                is_vst3: profile.map(|p| p.is_vst3).unwrap_or(false),
            },
            state: UnifyState {
                encoding: encoding.to_string(),
                data,
                size: raw.len(),
                md5: format!("{:x}", md5::compute(raw)),
            },
            required_samples: profile.map(|p| p.required_samples.clone()).unwrap_or_default(),
            parameter_mappings: profile
                .map(|p| p.parameter_mappings.clone())
                .unwrap_or_default(),
        })
    }

    /// Decode the embedded state and check it against the stored size and digest.
    pub fn decode_state(&self) -> Result<Vec<u8>> {
        let bytes = match self.state.encoding.as_str() {
            "text" => self.state.data.as_bytes().to_vec(),
            "hex" => from_hex(&self.state.data)?,
            other => return Err(ConvertError::unsupported("state encoding", other.to_string())),
        };
        let digest = format!("{:x}", md5::compute(&bytes));
        if bytes.len() != self.state.size || digest != self.state.md5 {
            return Err(ConvertError::invalid_state(format!(
                "state of patch {:?} does not match its checksum",
                self.patch_name
            )));
        }
        Ok(bytes)
    }
}

/// Writes Unify `.unify` patch documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnifyPatchGenerator;

impl PresetGenerator for UnifyPatchGenerator {
    fn name(&self) -> &'static str {
        "unify"
    }

    fn extension(&self, _preset: &PresetData) -> String {
        "unify".to_string()
    }

    fn render(&self, preset: &PresetData) -> Result<Vec<u8>> {
        let patch = UnifyPatch::from_preset(preset)?;
        serde_json::to_vec_pretty(&patch)
            .map_err(|e| ConvertError::invalid_state(format!("Failed to encode Unify patch: {e}")))
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

fn from_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(ConvertError::invalid_state("hex state has odd length"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ConvertError::invalid_state(format!("bad hex digit at {i}")))
        })
        .collect()
}
