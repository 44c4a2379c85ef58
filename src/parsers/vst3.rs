use super::{check_input, preset_name_from, read_bytes, PresetParser};
use crate::error::Result;
use crate::preset::PresetData;
use std::path::Path;
use tracing::debug;

/// VST3 `.vstpreset` files, carried as an opaque chunk.
///
/// When the header is intact the processor class id is copied into
/// `plugin_id`; the bytes themselves are never validated or trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vst3Parser;

const EXTENSIONS: &[&str] = &[".vstpreset"];

const HEADER_MAGIC: &[u8; 4] = b"VST3";
// magic(4) + version(4), then a 32-character ASCII class id
const CLASS_ID_RANGE: std::ops::Range<usize> = 8..40;

/// Processor class id from a `.vstpreset` header, if present.
fn class_id(bytes: &[u8]) -> Option<String> {
    if !bytes.starts_with(HEADER_MAGIC) {
        return None;
    }
    let raw = bytes.get(CLASS_ID_RANGE)?;
    if !raw.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    std::str::from_utf8(raw).ok().map(str::to_string)
}

impl PresetParser for Vst3Parser {
    fn name(&self) -> &'static str {
        "VST3"
    }

    fn extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<PresetData>> {
        let suffix = check_input(path, "VST3 preset", EXTENSIONS)?;
        let bytes = read_bytes(path, "VST3 preset")?;

        debug!("Read VST3 preset {:?} ({} bytes)", path, bytes.len());
        let plugin_id = class_id(&bytes).unwrap_or_default();
        let mut preset = PresetData::chunk(preset_name_from(path, suffix), bytes).with_source(path);
        preset.plugin_id = plugin_id;
        Ok(vec![preset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn chunk_is_read_verbatim() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Init.vstpreset");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        fs::write(&path, &bytes).unwrap();

        let presets = Vst3Parser.parse_file(&path).unwrap();
        assert_eq!(presets.len(), 1);
        assert!(presets[0].is_chunk_based());
        assert_eq!(presets[0].chunk_data(), Some(bytes.as_slice()));
        assert_eq!(presets[0].preset_name, "Init");
        assert!(presets[0].plugin_id.is_empty());
    }

    #[test]
    fn class_id_is_taken_from_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Lead.vstpreset");
        let mut bytes = b"VST3".to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(b"56535458657278736572756D00000000");
        bytes.extend_from_slice(&48u64.to_le_bytes());
        bytes.extend_from_slice(b"Comp");
        fs::write(&path, &bytes).unwrap();

        let preset = Vst3Parser.parse_file(&path).unwrap().remove(0);
        assert_eq!(preset.plugin_id, "56535458657278736572756D00000000");
        assert_eq!(preset.chunk_data().map(|c| c.len()), Some(bytes.len()));
    }

    #[test]
    fn empty_file_is_still_a_preset() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Empty.vstpreset");
        fs::write(&path, b"").unwrap();

        let presets = Vst3Parser.parse_file(&path).unwrap();
        assert_eq!(presets[0].chunk_data().map(|c| c.len()), Some(0));
    }
}
