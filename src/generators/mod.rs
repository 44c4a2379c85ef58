//! Target-format generators.
//!
//! A generator renders the whole artifact in memory first and only then
//! replaces the destination, so a failed call never leaves a partial file.

mod raw;
mod unify;

pub use raw::RawChunkGenerator;
pub use unify::{UnifyLayer, UnifyPatch, UnifyPatchGenerator, UnifyState};

use crate::error::{ConvertError, Result};
use crate::preset::PresetData;
use crate::profile::write_atomically;
use std::path::Path;
use tracing::debug;

pub trait PresetGenerator {
    fn name(&self) -> &'static str;

    /// Extension (without dot) of files this generator writes.
    fn extension(&self, preset: &PresetData) -> String;

    /// Render `preset` into target-format bytes.
    fn render(&self, preset: &PresetData) -> Result<Vec<u8>>;

    /// Render `preset` and write it to `dest`. The destination is left
    /// untouched on any failure.
    fn save_patch(&self, preset: &PresetData, dest: &Path) -> Result<()> {
        ensure_valid(preset)?;
        let bytes = self.render(preset)?;
        write_atomically(dest, &bytes)?;
        debug!("{} wrote {:?} ({} bytes)", self.name(), dest, bytes.len());
        Ok(())
    }
}

/// Reject presets that must not reach a generator.
pub fn ensure_valid(preset: &PresetData) -> Result<()> {
    if !preset.is_valid {
        return Err(ConvertError::invalid_state(format!(
            "refusing to generate from invalid preset {:?}",
            preset.preset_name
        )));
    }
    if !preset.is_text_based() && !preset.is_chunk_based() {
        return Err(ConvertError::invalid_state(format!(
            "preset {:?} has no payload",
            preset.preset_name
        )));
    }
    Ok(())
}

/// Generator for a target name as used on the command line and in settings.
pub fn generator_for(target: &str) -> Result<Box<dyn PresetGenerator>> {
    match target.trim().to_lowercase().as_str() {
        "unify" => Ok(Box::new(UnifyPatchGenerator)),
        "raw" | "passthrough" => Ok(Box::new(RawChunkGenerator)),
        other => Err(ConvertError::unsupported("target format", other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn invalid_preset_fails_without_writing() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("out.unify");

        for generator in [generator_for("unify").unwrap(), generator_for("raw").unwrap()] {
            let err = generator.save_patch(&PresetData::default(), &dest).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
            assert!(!dest.exists());
        }
    }

    #[test]
    fn failed_save_keeps_existing_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("keep.unify");
        std::fs::write(&dest, b"previous").unwrap();

        let mut preset = PresetData::chunk("X", vec![1]);
        preset.is_valid = false;
        assert!(UnifyPatchGenerator.save_patch(&preset, &dest).is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    }

    #[test]
    fn missing_output_directory_is_reported() {
        let preset = PresetData::chunk("X", vec![1]);
        let err = RawChunkGenerator
            .save_patch(&preset, Path::new("/no/such/dir/x.fxp"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unknown_target_is_unsupported() {
        assert_eq!(
            generator_for("nks").err().map(|e| e.kind()),
            Some(ErrorKind::UnsupportedFormat)
        );
    }
}
