//! Content Catalog
//!
//! Finds installed workloads on disk. The harness talks to [`ContentCatalog`];
//! [`DirectoryCatalog`] implements it over the integration directory layout:
//!
//! ```text
//! <data_dir>/
//! ├── stable/<Game>/rom.<ext>
//! ├── experimental/<Game>/rom.<ext>
//! └── contrib/<Game>/rom.<ext>
//! <custom_dir>/<Game>/rom.<ext>
//! ```
//!
//! `<ext>` must be registered with the [`SystemRegistry`], which also decides
//! the workload's system.

use crate::Candidate;
use crate::registry::SystemRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which integration tiers are eligible for discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Integrations {
    /// Stable integrations only
    Default,
    /// Stable integrations only
    Stable,
    /// Contributed integrations only
    Contrib,
    /// Experimental integrations only
    Experimental,
    /// Operator-provided directories only
    Custom,
    /// Every tier
    #[default]
    All,
}

/// One searchable integration tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `<data_dir>/stable`
    Stable,
    /// `<data_dir>/experimental`
    Experimental,
    /// `<data_dir>/contrib`
    Contrib,
    /// Configured custom directories
    Custom,
}

impl Integrations {
    /// Tiers in search order
    pub fn tiers(self) -> &'static [Tier] {
        match self {
            Integrations::Default | Integrations::Stable => &[Tier::Stable],
            Integrations::Contrib => &[Tier::Contrib],
            Integrations::Experimental => &[Tier::Experimental],
            Integrations::Custom => &[Tier::Custom],
            Integrations::All => &[Tier::Stable, Tier::Experimental, Tier::Contrib, Tier::Custom],
        }
    }

    /// Name as accepted on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Integrations::Default => "default",
            Integrations::Stable => "stable",
            Integrations::Contrib => "contrib",
            Integrations::Experimental => "experimental",
            Integrations::Custom => "custom",
            Integrations::All => "all",
        }
    }
}

impl std::fmt::Display for Integrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Integrations {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Integrations::Default),
            "stable" => Ok(Integrations::Stable),
            "contrib" => Ok(Integrations::Contrib),
            "experimental" => Ok(Integrations::Experimental),
            "custom" => Ok(Integrations::Custom),
            "all" => Ok(Integrations::All),
            other => Err(format!(
                "Unknown integrations: {} (use one of: default|stable|contrib|experimental|custom|all)",
                other
            )),
        }
    }
}

/// Catalog lookup failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no installed content for {game} (searched {} location(s))", searched.len())]
    NotFound { game: String, searched: Vec<PathBuf> },

    #[error("invalid game identifier: {0:?}")]
    InvalidGame(String),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves workloads to content paths
pub trait ContentCatalog {
    /// Path of the installed content for `game` within `scope`
    fn resolve(&self, game: &str, scope: Integrations) -> Result<PathBuf, CatalogError>;

    /// Every installed workload within `scope`, in search order
    fn installed(&self, scope: Integrations) -> Result<Vec<Candidate>, CatalogError>;
}

/// Catalog over the on-disk integration layout
pub struct DirectoryCatalog<'r> {
    data_dir: PathBuf,
    custom_dirs: Vec<PathBuf>,
    registry: &'r dyn SystemRegistry,
}

impl<'r> DirectoryCatalog<'r> {
    /// Create a catalog rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>, registry: &'r dyn SystemRegistry) -> Self {
        Self {
            data_dir: data_dir.into(),
            custom_dirs: Vec::new(),
            registry,
        }
    }

    /// Add directories searched for the `custom` tier
    pub fn with_custom_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.custom_dirs.extend(dirs);
        self
    }

    fn tier_dirs(&self, tier: Tier) -> Vec<PathBuf> {
        match tier {
            Tier::Stable => vec![self.data_dir.join("stable")],
            Tier::Experimental => vec![self.data_dir.join("experimental")],
            Tier::Contrib => vec![self.data_dir.join("contrib")],
            Tier::Custom => self.custom_dirs.clone(),
        }
    }

    fn scope_dirs(&self, scope: Integrations) -> Vec<PathBuf> {
        scope
            .tiers()
            .iter()
            .flat_map(|tier| self.tier_dirs(*tier))
            .collect()
    }

    /// Find `rom.<ext>` with a registered extension inside one game directory.
    fn content_in(&self, game_dir: &Path) -> Result<Option<(PathBuf, String)>, CatalogError> {
        let entries = match std::fs::read_dir(game_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CatalogError::Io {
                    path: game_dir.to_path_buf(),
                    source,
                });
            }
        };

        let mut found: Vec<(PathBuf, String)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.file_stem().and_then(|s| s.to_str()) == Some("rom"))
            .filter_map(|path| {
                let ext = path.extension()?.to_str()?;
                let system = self.registry.system_for_extension(ext)?.to_string();
                Some((path, system))
            })
            .collect();
        found.sort();
        Ok(found.into_iter().next())
    }
}

impl ContentCatalog for DirectoryCatalog<'_> {
    fn resolve(&self, game: &str, scope: Integrations) -> Result<PathBuf, CatalogError> {
        if game.is_empty() || game.contains(['/', '\\']) || game == "." || game == ".." {
            return Err(CatalogError::InvalidGame(game.to_string()));
        }

        let mut searched = Vec::new();
        for dir in self.scope_dirs(scope) {
            let game_dir = dir.join(game);
            if let Some((path, _system)) = self.content_in(&game_dir)? {
                tracing::debug!(game, path = %path.display(), "content resolved");
                return Ok(path);
            }
            searched.push(game_dir);
        }

        Err(CatalogError::NotFound {
            game: game.to_string(),
            searched,
        })
    }

    fn installed(&self, scope: Integrations) -> Result<Vec<Candidate>, CatalogError> {
        let mut candidates = Vec::new();
        for dir in self.scope_dirs(scope) {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CatalogError::Io { path: dir, source }),
            };

            let mut games: Vec<(String, PathBuf)> = entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| Some((entry.file_name().to_str()?.to_string(), entry.path())))
                .collect();
            games.sort();

            for (game, game_dir) in games {
                if let Some((content_path, system)) = self.content_in(&game_dir)? {
                    candidates.push(Candidate {
                        system,
                        game,
                        content_path,
                    });
                }
            }
        }
        Ok(candidates)
    }
}
