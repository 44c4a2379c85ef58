//! Plugin profile registry and identity resolution.
//!
//! The registry is filled once (built-in profiles, then a directory of user
//! descriptor documents, then any programmatic registrations) and read many
//! times afterwards. It is not synchronized; callers that mutate it from more
//! than one thread must serialize access themselves.
//!
//! # Resolution
//!
//! A preset's identity hints are matched against registered profiles in a
//! fixed order, each stage reported as a [`MatchStage`]:
//!
//! 1. [`MatchStage::Id`] - exact, case-sensitive plugin id
//! 2. [`MatchStage::Name`] - trimmed, case-folded primary plugin name
//! 3. [`MatchStage::Alias`] - trimmed, case-folded alias (every profile's own
//!    name is registered as one of its aliases)
//!
//! When no stage matches, [`ProfileRegistry::resolve_or_default`] falls back to
//! [`ProfileRegistry::create_default_profile`].

use crate::error::{ConvertError, Result};
use crate::profile::{PluginProfile, PROFILE_EXTENSION};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key a profile is stored under.
///
/// Profiles with an id are keyed by it. The `Name` variant keeps entries
/// without an id apart from id-keyed ones no matter what the id looks like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileKey {
    Id(String),
    Name(String),
}

impl ProfileKey {
    pub fn for_profile(profile: &PluginProfile) -> Self {
        if profile.plugin_id.is_empty() {
            ProfileKey::Name(profile.plugin_name.clone())
        } else {
            ProfileKey::Id(profile.plugin_id.clone())
        }
    }
}

/// Which lookup strategy satisfied a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Id,
    Name,
    Alias,
    /// Nothing matched; a placeholder profile was synthesized.
    Default,
}

/// A profile found by [`ProfileRegistry::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub profile: &'a PluginProfile,
    pub stage: MatchStage,
}

/// Outcome of a directory load, with every per-file failure kept.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub failures: Vec<(PathBuf, ConvertError)>,
}

#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileKey, PluginProfile>,
    /// Normalized alias -> key in `profiles`.
    alias_lookup: HashMap<String, ProfileKey>,
    last_error: Option<String>,
}

/// Trim and case-fold a name or alias for lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with [`builtin_profiles`].
    pub fn with_builtin_profiles() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            registry.register_profile(profile);
        }
        registry
    }

    /// Message of the most recent failure, if the last operation failed.
    ///
    /// Directory loads keep only the most recent per-file failure here; use
    /// [`ProfileRegistry::load_profiles_from_directory_report`] for all of them.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Load every `*.json` descriptor in `dir` (non-recursive) and return how
    /// many were registered. Failing files are skipped.
    pub fn load_profiles_from_directory(&mut self, dir: &Path) -> usize {
        match self.load_profiles_from_directory_report(dir) {
            Ok(report) => {
                self.last_error = report.failures.last().map(|(_, e)| e.to_string());
                report.loaded
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                0
            }
        }
    }

    /// Like [`ProfileRegistry::load_profiles_from_directory`], but reports every
    /// failing file. Fails only when `dir` itself cannot be read.
    pub fn load_profiles_from_directory_report(&mut self, dir: &Path) -> Result<LoadReport> {
        self.last_error = None;

        if !dir.is_dir() {
            return Err(ConvertError::not_found("Profile directory", dir));
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| ConvertError::io(format!("Failed to read directory: {:?}", dir), e))?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_profile_extension(path))
            .collect();
        files.sort();

        let mut report = LoadReport::default();
        for path in files {
            match self.try_load_profile(&path) {
                Ok(_) => report.loaded += 1,
                Err(e) => {
                    warn!("Skipping profile {:?}: {}", path, e);
                    report.failures.push((path, e));
                }
            }
        }

        info!(
            "Loaded {} profile(s) from {:?} ({} failed)",
            report.loaded,
            dir,
            report.failures.len()
        );
        Ok(report)
    }

    /// Load and register one descriptor document. Returns false and records
    /// the reason in [`ProfileRegistry::last_error`] on failure.
    pub fn load_profile(&mut self, path: &Path) -> bool {
        match self.try_load_profile(path) {
            Ok(_) => {
                self.last_error = None;
                true
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Load and register one descriptor document, returning its key.
    pub fn try_load_profile(&mut self, path: &Path) -> Result<ProfileKey> {
        let profile = PluginProfile::load_from_file(path)?;
        let key = ProfileKey::for_profile(&profile);
        self.register_profile(profile);
        debug!("Registered profile {:?} from {:?}", key, path);
        Ok(key)
    }

    /// Register a profile programmatically. Invalid profiles are ignored.
    ///
    /// Replaces any profile under the same key, dropping the aliases the
    /// replaced profile had registered. A dropped alias that another
    /// registered profile still lists moves to that profile.
    pub fn register_profile(&mut self, profile: PluginProfile) -> bool {
        if !profile.is_valid() {
            return false;
        }

        let key = ProfileKey::for_profile(&profile);
        if self.profiles.contains_key(&key) {
            let mut dropped = Vec::new();
            self.alias_lookup.retain(|alias, target| {
                let keep = *target != key;
                if !keep {
                    dropped.push(alias.clone());
                }
                keep
            });
            for alias in dropped {
                if let Some(owner) = self.alias_owner(&alias, &key) {
                    self.alias_lookup.insert(alias, owner);
                }
            }
        }

        for alias in profile.aliases.iter().chain(std::iter::once(&profile.plugin_name)) {
            let alias = normalize_name(alias);
            if !alias.is_empty() {
                self.alias_lookup.insert(alias, key.clone());
            }
        }

        self.profiles.insert(key, profile);
        true
    }

    /// Key of a profile other than `except` that lists `alias`, last in key
    /// order when several do.
    fn alias_owner(&self, alias: &str, except: &ProfileKey) -> Option<ProfileKey> {
        self.profiles
            .iter()
            .filter(|(key, _)| *key != except)
            .filter(|(_, p)| {
                p.aliases
                    .iter()
                    .chain(std::iter::once(&p.plugin_name))
                    .any(|a| normalize_name(a) == alias)
            })
            .map(|(key, _)| key.clone())
            .last()
    }

    /// Exact, case-sensitive id lookup.
    pub fn get_profile_by_id(&self, plugin_id: &str) -> Option<&PluginProfile> {
        self.profiles.get(&ProfileKey::Id(plugin_id.to_string()))
    }

    pub fn get_profile_by_key(&self, key: &ProfileKey) -> Option<&PluginProfile> {
        self.profiles.get(key)
    }

    /// Case-insensitive name lookup, falling back to aliases.
    pub fn get_profile_by_name(&self, plugin_name: &str) -> Option<&PluginProfile> {
        self.find_by_name(plugin_name).map(|r| r.profile)
    }

    /// Case-insensitive alias lookup.
    pub fn get_profile_by_alias(&self, alias: &str) -> Option<&PluginProfile> {
        let key = self.alias_lookup.get(&normalize_name(alias))?;
        self.profiles.get(key)
    }

    /// Name lookup that reports whether the primary name or an alias matched.
    pub fn find_by_name(&self, plugin_name: &str) -> Option<Resolution<'_>> {
        let wanted = normalize_name(plugin_name);
        if wanted.is_empty() {
            return None;
        }

        let by_name = self
            .profiles
            .values()
            .find(|p| normalize_name(&p.plugin_name) == wanted);
        if let Some(profile) = by_name {
            return Some(Resolution {
                profile,
                stage: MatchStage::Name,
            });
        }

        self.get_profile_by_alias(plugin_name).map(|profile| Resolution {
            profile,
            stage: MatchStage::Alias,
        })
    }

    /// Resolve identity hints by id, then name, then alias.
    pub fn resolve(&self, plugin_id: &str, plugin_name: &str) -> Option<Resolution<'_>> {
        if !plugin_id.is_empty() {
            if let Some(profile) = self.get_profile_by_id(plugin_id) {
                return Some(Resolution {
                    profile,
                    stage: MatchStage::Id,
                });
            }
        }
        self.find_by_name(plugin_name)
    }

    /// Resolve identity hints, synthesizing a default profile when nothing matches.
    pub fn resolve_or_default(
        &self,
        plugin_id: &str,
        plugin_name: &str,
    ) -> (PluginProfile, MatchStage) {
        match self.resolve(plugin_id, plugin_name) {
            Some(found) => (found.profile.clone(), found.stage),
            None => (
                self.create_default_profile(plugin_id, plugin_name),
                MatchStage::Default,
            ),
        }
    }

    /// Sorted (case-sensitive), duplicate-free names of all registered profiles.
    pub fn get_registered_plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .profiles
            .values()
            .filter(|p| !p.plugin_name.is_empty())
            .map(|p| p.plugin_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Snapshot of every registered profile, ordered by key.
    pub fn get_all_profiles(&self) -> Vec<PluginProfile> {
        self.profiles.values().cloned().collect()
    }

    pub fn has_profile(&self, plugin_id: &str) -> bool {
        self.get_profile_by_id(plugin_id).is_some()
    }

    pub fn get_profile_count(&self) -> usize {
        self.profiles.len()
    }

    /// Remove every profile and alias.
    pub fn clear_profiles(&mut self) {
        self.profiles.clear();
        self.alias_lookup.clear();
    }

    /// Placeholder profile for presets whose plugin could not be identified.
    pub fn create_default_profile(&self, plugin_id: &str, plugin_name: &str) -> PluginProfile {
        PluginProfile {
            plugin_id: plugin_id.to_string(),
            plugin_name: if plugin_name.is_empty() {
                "Unknown Plugin".to_string()
            } else {
                plugin_name.to_string()
            },
            manufacturer: "Unknown".to_string(),
            version: "1.0".to_string(),
            is_chunk_based: true,
            is_vst2: true,
            default_layer_type: "Synth".to_string(),
            profile_author: "Auto-generated".to_string(),
            notes: "Default profile with no parameter mappings.".to_string(),
            ..PluginProfile::default()
        }
    }
}

fn has_profile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(PROFILE_EXTENSION))
        .unwrap_or(false)
}

/// Profiles shipped with the converter. User descriptors loaded afterwards
/// replace these when they share an id.
pub fn builtin_profiles() -> Vec<PluginProfile> {
    fn profile(
        id: &str,
        name: &str,
        manufacturer: &str,
        layer: &str,
        chunk: bool,
        aliases: &[&str],
    ) -> PluginProfile {
        PluginProfile {
            manufacturer: manufacturer.to_string(),
            version: "1.0".to_string(),
            is_chunk_based: chunk,
            is_vst2: true,
            is_vst3: true,
            default_layer_type: layer.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            profile_author: "Built-in".to_string(),
            ..PluginProfile::new(id, name)
        }
    }

    vec![
        profile("DiVa", "Diva", "u-he", "Synth", false, &["u-he Diva", "Diva(x64)"]),
        profile("Zbr2", "Zebra2", "u-he", "Synth", false, &["Zebra", "u-he Zebra2"]),
        profile("RPR1", "Repro-1", "u-he", "Synth", false, &["Repro", "u-he Repro-1"]),
        profile("XfsX", "Serum", "Xfer Records", "Synth", true, &["Xfer Serum", "Serum_x64"]),
        profile(
            "AmbS",
            "Omnisphere",
            "Spectrasonics",
            "Sampler",
            true,
            &["Spectrasonics Omnisphere", "Omnisphere 2"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str, aliases: &[&str]) -> PluginProfile {
        PluginProfile {
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            ..PluginProfile::new(id, name)
        }
    }

    #[test]
    fn register_then_lookup_by_id() {
        let mut registry = ProfileRegistry::new();
        let p = profile("XfsX", "Serum", &[]);
        assert!(registry.register_profile(p.clone()));

        assert_eq!(registry.get_profile_by_id("XfsX"), Some(&p));
        assert!(registry.get_profile_by_id("xfsx").is_none());
        assert!(registry.has_profile("XfsX"));
        assert_eq!(registry.get_profile_count(), 1);
    }

    #[test]
    fn aliases_match_any_case_and_whitespace() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("XfsX", "Serum", &["Xfer Serum", "Serum_x64"]));

        for query in ["xfer serum", "  XFER SERUM  ", "serum_X64", "\tSerum\n"] {
            let found = registry.get_profile_by_alias(query);
            assert_eq!(found.map(|p| p.plugin_id.as_str()), Some("XfsX"), "{query:?}");
        }
    }

    #[test]
    fn invalid_profiles_are_not_registered() {
        let mut registry = ProfileRegistry::new();
        assert!(!registry.register_profile(profile("", "NoId", &["x"])));
        assert!(!registry.register_profile(profile("NoNm", "", &[])));
        assert_eq!(registry.get_profile_count(), 0);
        assert!(registry.get_profile_by_alias("x").is_none());
    }

    #[test]
    fn reregistering_hands_shared_alias_back() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("AAAA", "Alpha", &["Shared"]));
        registry.register_profile(profile("BBBB", "Beta", &["Shared"]));
        assert_eq!(
            registry.get_profile_by_alias("shared").map(|p| p.plugin_id.as_str()),
            Some("BBBB")
        );

        registry.register_profile(profile("BBBB", "Beta", &[]));
        assert_eq!(
            registry.get_profile_by_alias("shared").map(|p| p.plugin_id.as_str()),
            Some("AAAA")
        );
        assert_eq!(
            registry.find_by_name("Shared").map(|r| (r.profile.plugin_id.as_str(), r.stage)),
            Some(("AAAA", MatchStage::Alias))
        );
    }

    #[test]
    fn lookup_by_key() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("XfsX", "Serum", &[]));

        let found = registry.get_profile_by_key(&ProfileKey::Id("XfsX".to_string()));
        assert_eq!(found.map(|p| p.plugin_name.as_str()), Some("Serum"));
        assert!(registry.get_profile_by_key(&ProfileKey::Id("xfsx".to_string())).is_none());
        assert!(registry.get_profile_by_key(&ProfileKey::Name("serum".to_string())).is_none());
    }

    #[test]
    fn reregistering_drops_stale_aliases() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("DiVa", "Diva", &["Old Alias"]));
        registry.register_profile(profile("DiVa", "Diva 2", &["New Alias"]));

        assert_eq!(registry.get_profile_count(), 1);
        assert!(registry.get_profile_by_alias("old alias").is_none());
        assert!(registry.get_profile_by_alias("diva").is_none());
        assert_eq!(
            registry.get_profile_by_alias("new alias").map(|p| p.plugin_name.as_str()),
            Some("Diva 2")
        );
    }

    #[test]
    fn name_lookup_reports_stage() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("Zbr2", "Zebra2", &["Zebra"]));
        registry.register_profile(profile("ZbHZ", "ZebraHZ", &[]));

        let hit = registry.find_by_name(" zebra2 ").unwrap();
        assert_eq!(hit.stage, MatchStage::Name);
        assert_eq!(hit.profile.plugin_id, "Zbr2");

        let hit = registry.find_by_name("ZEBRA").unwrap();
        assert_eq!(hit.stage, MatchStage::Alias);
        assert_eq!(hit.profile.plugin_id, "Zbr2");

        assert!(registry.find_by_name("Zebra3").is_none());
        assert!(registry.find_by_name("   ").is_none());
        assert_eq!(
            registry.get_profile_by_name("zebra").map(|p| p.plugin_id.as_str()),
            Some("Zbr2")
        );
    }

    #[test]
    fn resolve_prefers_id_then_name() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("AAAA", "Alpha", &[]));
        registry.register_profile(profile("BBBB", "Beta", &["Alpha Legacy"]));

        let hit = registry.resolve("BBBB", "Alpha").unwrap();
        assert_eq!((hit.stage, hit.profile.plugin_id.as_str()), (MatchStage::Id, "BBBB"));

        let hit = registry.resolve("ZZZZ", "alpha legacy").unwrap();
        assert_eq!((hit.stage, hit.profile.plugin_id.as_str()), (MatchStage::Alias, "BBBB"));

        let (fallback, stage) = registry.resolve_or_default("ZZZZ", "");
        assert_eq!(stage, MatchStage::Default);
        assert_eq!(fallback.plugin_name, "Unknown Plugin");
        assert!(fallback.is_chunk_based && fallback.is_vst2);
    }

    #[test]
    fn registered_names_are_sorted_and_unique() {
        let mut registry = ProfileRegistry::new();
        registry.register_profile(profile("0003", "zeta", &[]));
        registry.register_profile(profile("0001", "Alpha", &[]));
        registry.register_profile(profile("0002", "Alpha", &[]));
        registry.register_profile(profile("0004", "Beta", &[]));
        registry.register_profile(profile("0004", "Beta", &[]));

        assert_eq!(
            registry.get_registered_plugin_names(),
            vec!["Alpha", "Beta", "zeta"]
        );
    }

    #[test]
    fn snapshot_is_independent_of_later_changes() {
        let mut registry = ProfileRegistry::with_builtin_profiles();
        let snapshot = registry.get_all_profiles();
        let count = snapshot.len();

        registry.clear_profiles();
        assert_eq!(registry.get_profile_count(), 0);
        assert!(registry.get_profile_by_alias("xfer serum").is_none());
        assert_eq!(snapshot.len(), count);
    }

    #[test]
    fn name_keys_do_not_collide_with_ids() {
        let named = ProfileKey::for_profile(&PluginProfile::new("", "Serum"));
        let ided = ProfileKey::for_profile(&PluginProfile::new("Serum", "Serum"));
        assert_ne!(named, ided);
        assert_eq!(named, ProfileKey::Name("Serum".into()));
    }

    #[test]
    fn builtins_are_valid_and_resolvable() {
        let registry = ProfileRegistry::with_builtin_profiles();
        assert_eq!(registry.get_profile_count(), builtin_profiles().len());
        assert_eq!(
            registry.get_profile_by_name("u-he diva").map(|p| p.plugin_id.as_str()),
            Some("DiVa")
        );
    }

    #[test]
    fn missing_directory_records_error() {
        let mut registry = ProfileRegistry::new();
        assert_eq!(
            registry.load_profiles_from_directory(Path::new("/definitely/not/here")),
            0
        );
        assert!(registry.last_error().unwrap().contains("not found"));
    }
}
