//! Conversion operations tying parsers, the profile registry and generators
//! together.
//!
//! - Resolve: parse a source file and attach the best matching profile
//! - Convert: resolve, then write every preset in the target format

use crate::error::{ConvertError, Result};
use crate::generators::PresetGenerator;
use crate::parsers::ParserSet;
use crate::preset::PresetData;
use crate::registry::{MatchStage, ProfileRegistry};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A parsed preset with the profile it was matched to.
#[derive(Debug, Clone)]
pub struct ResolvedPreset {
    pub preset: PresetData,
    pub stage: MatchStage,
}

/// Parse `input` and enrich every valid preset with a resolved profile,
/// falling back to a default profile when nothing matches.
pub fn resolve_file(
    input: &Path,
    parsers: &ParserSet,
    registry: &ProfileRegistry,
) -> Result<Vec<ResolvedPreset>> {
    let presets = parsers.parse_file(input)?;

    let mut resolved = Vec::with_capacity(presets.len());
    for mut preset in presets {
        if !preset.is_valid {
            warn!("Dropping invalid preset {:?} from {:?}", preset.preset_name, input);
            continue;
        }
        let (profile, stage) = registry.resolve_or_default(&preset.plugin_id, &preset.plugin_name);
        debug!(
            "Preset {:?} matched {:?} via {:?}",
            preset.preset_name, profile.plugin_name, stage
        );
        preset.enrich(profile);
        resolved.push(ResolvedPreset { preset, stage });
    }

    Ok(resolved)
}

/// Convert every preset in `input` with `generator`, writing into `out_dir`.
/// Returns the paths written.
pub fn convert_file(
    input: &Path,
    parsers: &ParserSet,
    registry: &ProfileRegistry,
    generator: &dyn PresetGenerator,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let resolved = resolve_file(input, parsers, registry)?;

    fs::create_dir_all(out_dir).map_err(|e| {
        ConvertError::io(format!("Failed to create output directory: {:?}", out_dir), e)
    })?;

    let mut taken = HashSet::new();
    let mut written = Vec::with_capacity(resolved.len());
    for item in &resolved {
        let dest = unique_destination(out_dir, &item.preset, generator, &mut taken);
        generator.save_patch(&item.preset, &dest)?;
        written.push(dest);
    }

    info!(
        "Converted {:?} into {} {} file(s)",
        input,
        written.len(),
        generator.name()
    );
    Ok(written)
}

/// Replace characters that are unsafe in file names on any platform.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "Untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Destination for `preset` inside `out_dir` that no earlier preset of the
/// same run has claimed. Bank files can hold several same-named programs.
fn unique_destination(
    out_dir: &Path,
    preset: &PresetData,
    generator: &dyn PresetGenerator,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let base = sanitize_file_name(&preset.preset_name);
    let ext = generator.extension(preset);

    let mut candidate = out_dir.join(format!("{}.{}", base, ext));
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = out_dir.join(format!("{} ({}).{}", base, n, ext));
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}
