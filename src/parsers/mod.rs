//! Source-format parsers.
//!
//! Each parser turns one input file into zero or more [`PresetData`]. A
//! [`ParserSet`] picks the parser for a file from its extension.

mod fxp;
mod uhe;
mod vst3;

pub use fxp::FxpParser;
pub use uhe::UheParser;
pub use vst3::Vst3Parser;

use crate::error::{ConvertError, Result};
use crate::preset::PresetData;
use std::fs;
use std::path::Path;

pub trait PresetParser {
    /// Short human-readable format name, used in messages.
    fn name(&self) -> &'static str;

    /// Lower-case file name suffixes this parser accepts, including the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse one file. Success yields at least one valid preset; a bank
    /// format may yield several.
    fn parse_file(&self, path: &Path) -> Result<Vec<PresetData>>;
}

/// Dispatch table from file extension to parser.
pub struct ParserSet {
    parsers: Vec<Box<dyn PresetParser>>,
}

impl Default for ParserSet {
    fn default() -> Self {
        Self {
            parsers: vec![
                Box::new(UheParser),
                Box::new(Vst3Parser),
                Box::new(FxpParser),
            ],
        }
    }
}

impl ParserSet {
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn register(&mut self, parser: Box<dyn PresetParser>) {
        self.parsers.push(parser);
    }

    /// Parser for `path`, chosen by the longest matching suffix so that
    /// `Pad.h2p.txt` goes to the parser claiming `.h2p.txt`.
    pub fn parser_for(&self, path: &Path) -> Result<&dyn PresetParser> {
        let file_name = lower_file_name(path);
        self.parsers
            .iter()
            .filter_map(|parser| {
                matched_suffix(&file_name, parser.extensions()).map(|ext| (ext.len(), parser))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, parser)| &**parser)
            .ok_or_else(|| {
                ConvertError::unsupported("preset extension", display_extension(path))
            })
    }

    pub fn parse_file(&self, path: &Path) -> Result<Vec<PresetData>> {
        if !path.is_file() {
            return Err(ConvertError::not_found("Preset", path));
        }
        self.parser_for(path)?.parse_file(path)
    }

    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .parsers
            .iter()
            .flat_map(|p| p.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }
}

fn lower_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Longest suffix from `extensions` that `file_name` ends with.
fn matched_suffix(file_name: &str, extensions: &[&'static str]) -> Option<&'static str> {
    extensions
        .iter()
        .copied()
        .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext))
        .max_by_key(|ext| ext.len())
}

fn display_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => format!("(no extension) {}", path.display()),
    }
}

/// Preset name from a file name with `suffix` removed. Falls back to the
/// full file name so the result is never empty.
pub(crate) fn preset_name_from(path: &Path, suffix: &str) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem_len = file_name.len().saturating_sub(suffix.len());
    let stem = file_name.get(..stem_len).unwrap_or_default().trim();
    if stem.is_empty() {
        file_name
    } else {
        stem.to_string()
    }
}

/// Check existence and pick the accepted suffix shared by every parser.
pub(crate) fn check_input(
    path: &Path,
    what: &'static str,
    extensions: &[&'static str],
) -> Result<&'static str> {
    if !path.is_file() {
        return Err(ConvertError::not_found(what, path));
    }
    matched_suffix(&lower_file_name(path), extensions)
        .ok_or_else(|| ConvertError::unsupported(what, display_extension(path)))
}

pub(crate) fn read_bytes(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ConvertError::io(format!("Failed to read {what} data"), e))
}
