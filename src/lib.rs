//! PresetConv Core Library
//!
//! Converts instrument-plugin presets between vendor formats through one
//! canonical in-memory representation.
//!
//! # Architecture
//!
//! Parsers and generators only share [`PresetData`]; the profile registry only
//! shares [`PluginProfile`]. New source or target formats never touch the
//! registry, and new profiles never touch a parser.
//!
//! ## Canonical Data (`preset`, `profile` modules)
//! - `PresetData` - Preset name, identity hints and a text or chunk payload
//! - `PluginProfile` - Plugin identity, aliases and conversion hints, loaded
//!   from JSON descriptor documents
//!
//! ## Profile Resolution (`registry` module)
//! - `ProfileRegistry::load_profiles_from_directory()` - Batch-load descriptors
//! - `ProfileRegistry::resolve()` - Match by id, then name, then alias
//! - `ProfileRegistry::create_default_profile()` - Placeholder when nothing matches
//!
//! ## Formats (`parsers`, `generators` modules)
//! - `UheParser` - u-he text presets (`.h2p`, `.uhe-preset`, `.txt`)
//! - `Vst3Parser` / `FxpParser` - VST3 and VST2 binary chunks
//! - `UnifyPatchGenerator` - Unify patch documents
//! - `RawChunkGenerator` - Payload written back unchanged
//!
//! ## Conversion (`operations` module)
//! - `resolve_file()` - Parse and attach profiles
//! - `convert_file()` - Parse, resolve and write in the target format
//!
//! ## Native Frontends (`ffi` module)
//! - C ABI over the registry and conversion, with a per-handle last error

pub mod config;
pub mod error;
pub mod ffi;
pub mod generators;
pub mod operations;
pub mod parsers;
pub mod preset;
pub mod profile;
pub mod registry;

pub use config::Settings;
pub use error::{ConvertError, ErrorKind};
pub use generators::{generator_for, PresetGenerator, RawChunkGenerator, UnifyPatchGenerator};
pub use parsers::{ParserSet, PresetParser};
pub use preset::{Payload, PresetData};
pub use profile::PluginProfile;
pub use registry::{LoadReport, MatchStage, ProfileKey, ProfileRegistry, Resolution};
