use super::{check_input, preset_name_from, read_bytes, PresetParser};
use crate::error::Result;
use crate::preset::PresetData;
use std::path::Path;
use tracing::debug;

/// u-he text presets (Diva, Zebra2, Repro, ...). The whole document is
/// carried as text; the grammar is left to the generator side.
#[derive(Debug, Clone, Copy, Default)]
pub struct UheParser;

const EXTENSIONS: &[&str] = &[".h2p", ".uhe-preset", ".txt", ".h2p.txt"];

/// Header line naming the plugin the preset belongs to.
const PLUGIN_TAG: &str = "#AM=";

/// Plugin name from the `#AM=` header, which precedes the metadata block.
fn plugin_name_hint(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .take_while(|line| line.starts_with('#'))
        .find_map(|line| line.strip_prefix(PLUGIN_TAG))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Decode preset text. Older presets carry Latin-1 in their metadata block,
/// so anything that is not valid UTF-8 is read as Latin-1 instead.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

impl PresetParser for UheParser {
    fn name(&self) -> &'static str {
        "u-he"
    }

    fn extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<PresetData>> {
        let suffix = check_input(path, "u-he preset", EXTENSIONS)?;

        let bytes = read_bytes(path, "u-he preset")?;
        let text = decode_text(bytes);

        let plugin_name = plugin_name_hint(&text).unwrap_or_default();
        let mut preset = PresetData::text(preset_name_from(path, suffix), text).with_source(path);
        preset.plugin_name = plugin_name;
        debug!(
            "Parsed u-he preset {:?} ({} bytes)",
            preset.preset_name,
            preset.payload_bytes().len()
        );
        Ok(vec![preset])
    }
}
