//! Layered configuration for mandb.
//!
//! Values are merged from, in increasing order of priority:
//!
//! 1. compiled-in defaults ([`Config::default`]),
//! 2. a TOML file, either given explicitly or `config.toml` in the
//!    platform configuration directory,
//! 3. environment variables prefixed with `MANDB_` (`MANDB_STRAY_CATS=false`).
//!
//! ```toml
//! database = "index.db"
//! stray_cats = true
//!
//! [[hierarchies]]
//! root = "/usr/share/man"
//! cache_dir = "/var/cache/man"
//! system = true
//!
//! [[hierarchies]]
//! root = "/home/me/.local/share/man"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "MANDB_";
const CONFIG_FILE: &str = "config.toml";

/// A manual page hierarchy and where its index cache lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hierarchy {
    /// Directory holding the `manN`/`catN` subdirectories.
    pub root: PathBuf,
    /// Directory holding the cache database; the root itself if unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// System hierarchies are scanned with full privileges, user ones with
    /// privileges dropped.
    #[serde(default)]
    pub system: bool,
}

impl Hierarchy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache_dir: None, system: false }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.as_deref().unwrap_or(&self.root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hierarchies: Vec<Hierarchy>,
    /// File name of the cache database inside each cache directory.
    pub database: String,
    /// Sections to scan, in order. Empty means every `manN` directory found.
    pub sections: Vec<String>,
    /// Whether to index formatted pages that have no source page.
    pub stray_cats: bool,
    /// How many `.so` hops to follow before calling it a loop.
    pub so_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hierarchies: vec![Hierarchy::new("/usr/share/man").with_cache_dir("/var/cache/man").system()],
            database: "index.db".to_string(),
            sections: Vec::new(),
            stray_cats: true,
            so_depth: 10,
        }
    }
}

impl Config {
    /// The platform location of the configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mandb").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// The layered sources, with `file` (if any) as the TOML layer.
    ///
    /// Exposed so callers can add layers of their own before extracting.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from the platform configuration file (if it exists) and the
    /// environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path().filter(|path| path.is_file());
        tracing::debug!(path = ?path, "Loading configuration");
        Self::from_figment(Self::figment(path.as_deref()))
    }

    /// Load from an explicit configuration file and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_figment(Self::figment(Some(path)))
    }

    /// Extract and validate a configuration from arbitrary sources.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hierarchy) = self.hierarchies.iter().find(|h| !h.root.is_absolute()) {
            exn::bail!(ErrorKind::Invalid(format!("hierarchy root {} is not absolute", hierarchy.root.display())));
        }
        if self.database.is_empty() {
            exn::bail!(ErrorKind::Invalid("database name is empty".to_string()));
        }
        if self.database.contains(['/', std::path::MAIN_SEPARATOR]) {
            exn::bail!(ErrorKind::Invalid(format!("database name {:?} is a path", self.database)));
        }
        if self.so_depth == 0 {
            exn::bail!(ErrorKind::Invalid("so_depth must be at least 1".to_string()));
        }
        if self.sections.iter().any(|s| s.is_empty()) {
            exn::bail!(ErrorKind::Invalid("empty section name".to_string()));
        }
        Ok(())
    }

    /// Where the cache database for `hierarchy` lives.
    pub fn database_path(&self, hierarchy: &Hierarchy) -> PathBuf {
        hierarchy.cache_dir().join(&self.database)
    }
}
