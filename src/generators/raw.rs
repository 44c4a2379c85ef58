use super::PresetGenerator;
use crate::error::Result;
use crate::preset::PresetData;

/// Writes the preset payload back out unchanged: chunk bytes verbatim, or the
/// text document as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawChunkGenerator;

impl PresetGenerator for RawChunkGenerator {
    fn name(&self) -> &'static str {
        "raw"
    }

    /// Same extension as the source file when known.
    fn extension(&self, preset: &PresetData) -> String {
        let from_source = preset
            .source_path
            .as_deref()
            .and_then(|p| p.extension())
            .map(|ext| ext.to_string_lossy().to_lowercase());
        match from_source {
            Some(ext) => ext,
            None if preset.is_text_based() => "txt".to_string(),
            None => "bin".to_string(),
        }
    }

    fn render(&self, preset: &PresetData) -> Result<Vec<u8>> {
        Ok(preset.payload_bytes().to_vec())
    }
}
