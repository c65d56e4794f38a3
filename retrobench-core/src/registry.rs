//! System Registry
//!
//! Maps systems to the core library that runs them, and content file
//! extensions to systems. The harness only depends on [`SystemRegistry`];
//! [`StaticRegistry`] is the built-in table shipped with the binary.

use std::collections::BTreeMap;

/// Lookup capability over the system table
pub trait SystemRegistry {
    /// Core library registered for `system`, if the system is known
    fn core_lib_for(&self, system: &str) -> Option<&str>;

    /// System owning a content file extension (without the leading dot)
    fn system_for_extension(&self, extension: &str) -> Option<&str>;

    /// Core library → systems it runs, both sorted
    fn group_systems_by_lib(&self) -> BTreeMap<String, Vec<String>>;
}

/// One row of the system table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEntry {
    /// System name, e.g. `Nes`
    pub system: String,
    /// Core library name, e.g. `fceumm`
    pub core_lib: String,
    /// Content extensions without the dot
    pub extensions: Vec<String>,
}

impl SystemEntry {
    /// Build an entry
    pub fn new(system: &str, core_lib: &str, extensions: &[&str]) -> Self {
        Self {
            system: system.to_string(),
            core_lib: core_lib.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// In-memory system table
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    systems: BTreeMap<String, SystemEntry>,
    extensions: BTreeMap<String, String>,
}

impl StaticRegistry {
    /// Build from explicit entries. Later entries win on duplicate systems or extensions.
    pub fn from_entries(entries: impl IntoIterator<Item = SystemEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            for ext in &entry.extensions {
                registry
                    .extensions
                    .insert(ext.to_ascii_lowercase(), entry.system.clone());
            }
            registry.systems.insert(entry.system.clone(), entry);
        }
        registry
    }

    /// The built-in table of supported systems
    pub fn builtin() -> Self {
        Self::from_entries([
            SystemEntry::new("Atari2600", "stella", &["a26"]),
            SystemEntry::new("Atari7800", "prosystem", &["a78"]),
            SystemEntry::new("Nes", "fceumm", &["nes"]),
            SystemEntry::new("Snes", "snes9x", &["sfc", "smc"]),
            SystemEntry::new("Genesis", "genesis_plus_gx", &["md"]),
            SystemEntry::new("Sms", "genesis_plus_gx", &["sms"]),
            SystemEntry::new("GameGear", "genesis_plus_gx", &["gg"]),
            SystemEntry::new("Gb", "gambatte", &["gb"]),
            SystemEntry::new("Gbc", "gambatte", &["gbc"]),
            SystemEntry::new("GbAdvance", "mgba", &["gba"]),
            SystemEntry::new("PCEngine", "mednafen_pce_fast", &["pce"]),
            SystemEntry::new("Saturn", "mednafen_saturn", &["cue"]),
            SystemEntry::new("32x", "picodrive", &["32x"]),
            SystemEntry::new("N64", "parallel_n64", &["n64", "z64"]),
            SystemEntry::new("FBNeo", "fbneo", &["zip"]),
        ])
    }
}

impl SystemRegistry for StaticRegistry {
    fn core_lib_for(&self, system: &str) -> Option<&str> {
        self.systems.get(system).map(|e| e.core_lib.as_str())
    }

    fn system_for_extension(&self, extension: &str) -> Option<&str> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extensions.get(&ext).map(String::as_str)
    }

    fn group_systems_by_lib(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in self.systems.values() {
            groups
                .entry(entry.core_lib.clone())
                .or_default()
                .push(entry.system.clone());
        }
        for systems in groups.values_mut() {
            systems.sort();
            systems.dedup();
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_maps_systems_and_extensions() {
        let registry = StaticRegistry::builtin();
        assert_eq!(registry.core_lib_for("Nes"), Some("fceumm"));
        assert_eq!(registry.core_lib_for("Dreamcast"), None);
        assert_eq!(registry.system_for_extension("smc"), Some("Snes"));
        assert_eq!(registry.system_for_extension(".SFC"), Some("Snes"));
        assert_eq!(registry.system_for_extension("exe"), None);
    }

    #[test]
    fn groups_are_sorted_per_lib() {
        let registry = StaticRegistry::builtin();
        let groups = registry.group_systems_by_lib();
        assert_eq!(
            groups["genesis_plus_gx"],
            vec!["GameGear".to_string(), "Genesis".to_string(), "Sms".to_string()]
        );
        let libs: Vec<_> = groups.keys().cloned().collect();
        let mut sorted = libs.clone();
        sorted.sort();
        assert_eq!(libs, sorted);
    }

    #[test]
    fn later_entries_override() {
        let registry = StaticRegistry::from_entries([
            SystemEntry::new("Nes", "fceumm", &["nes"]),
            SystemEntry::new("Nes", "nestopia", &["nes", "unf"]),
        ]);
        assert_eq!(registry.core_lib_for("Nes"), Some("nestopia"));
        assert_eq!(registry.system_for_extension("unf"), Some("Nes"));
        assert_eq!(registry.group_systems_by_lib().len(), 1);
    }
}
