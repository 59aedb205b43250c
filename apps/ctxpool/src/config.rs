//! # Host Configuration
//!
//! Two TOML documents describe a hosted computer:
//!
//! - the **computer configuration**: its plugins (`[[plugin]]`) and how they
//!   are wired (`[[connection]]`)
//! - the **interface catalog**: the context interfaces plugins publish
//!   (`[[interface]]`, each with `[[interface.operation]]` entries)
//!
//! ```toml
//! [[plugin]]
//! id = 1
//! name = "8080-cpu"
//! kind = "cpu"
//! provides = ["CpuContext"]
//!
//! [[connection]]
//! from = 1
//! to = 2
//! ```
//!
//! Connections are bidirectional unless `bidirectional = false`.

use ctxpool_core::{ConnectionGraph, ContextFamily, ContextSchema, Credential, OwnerId, PoolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable holding the host secret.
pub const SECRET_ENV: &str = "CTXPOOL_SECRET";

/// Canonicalize a configuration path and check it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PoolError> {
    let canonical = path.canonicalize().map_err(|e| {
        PoolError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PoolError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read a configuration file, refusing oversized input.
fn read_config_file(path: &Path) -> Result<String, PoolError> {
    let path = validate_file_path(path)?;

    let metadata = std::fs::metadata(&path)
        .map_err(|e| PoolError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(PoolError::Config(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    std::fs::read_to_string(&path)
        .map_err(|e| PoolError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// COMPUTER CONFIGURATION
// =============================================================================

fn default_bidirectional() -> bool {
    true
}

/// One plugin of the computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Owner ID the plugin registers its contexts under.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Plugin family.
    #[serde(default)]
    pub kind: ContextFamily,
    /// Catalog names of the interfaces the plugin publishes.
    #[serde(default)]
    pub provides: Vec<String>,
}

impl PluginConfig {
    /// Owner ID of the plugin.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        OwnerId(self.id)
    }
}

/// A wire between two plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Plugin that accesses.
    pub from: u64,
    /// Plugin that is accessed.
    pub to: u64,
    /// Whether `to` may also access `from`.
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

/// Plugins and wiring of one hosted computer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerConfig {
    /// Computer name.
    #[serde(default)]
    pub name: String,
    /// Plugins, in load order.
    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginConfig>,
    /// Connections between plugins.
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionConfig>,
}

impl ComputerConfig {
    /// Parse and validate a computer configuration.
    pub fn from_toml(text: &str) -> Result<Self, PoolError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| PoolError::Config(format!("Invalid computer configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a computer configuration from disk.
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        Self::from_toml(&read_config_file(path)?)
    }

    /// Reject duplicate plugin IDs and connections to unknown plugins.
    pub fn validate(&self) -> Result<(), PoolError> {
        let mut ids = BTreeSet::new();
        for plugin in &self.plugins {
            if !ids.insert(plugin.id) {
                return Err(PoolError::Config(format!(
                    "Duplicate plugin id {}",
                    plugin.id
                )));
            }
        }

        for connection in &self.connections {
            for end in [connection.from, connection.to] {
                if !ids.contains(&end) {
                    return Err(PoolError::Config(format!(
                        "Connection {} -> {} names unknown plugin {}",
                        connection.from, connection.to, end
                    )));
                }
            }
        }

        Ok(())
    }

    /// Plugin with the given ID.
    #[must_use]
    pub fn plugin(&self, id: u64) -> Option<&PluginConfig> {
        self.plugins.iter().find(|plugin| plugin.id == id)
    }

    /// Display name of an owner, or its ID if it is not a configured plugin.
    #[must_use]
    pub fn display_name(&self, owner: OwnerId) -> String {
        self.plugin(owner.0)
            .map(|plugin| plugin.name.clone())
            .unwrap_or_else(|| owner.to_string())
    }

    /// The topology described by the connections.
    #[must_use]
    pub fn graph(&self) -> ConnectionGraph {
        let mut graph = ConnectionGraph::new();
        for connection in &self.connections {
            let (from, to) = (OwnerId(connection.from), OwnerId(connection.to));
            if connection.bidirectional {
                graph.connect_both(from, to);
            } else {
                graph.connect(from, to);
            }
        }
        graph
    }
}

// =============================================================================
// INTERFACE CATALOG
// =============================================================================

/// Context interfaces known to the host, by catalog name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCatalog {
    /// Interface schemas, in catalog order.
    #[serde(default, rename = "interface")]
    pub interfaces: Vec<ContextSchema>,
}

impl InterfaceCatalog {
    /// Parse an interface catalog.
    ///
    /// Schemas are not validated here: reporting invalid interfaces is the
    /// job of the `fingerprint` command.
    pub fn from_toml(text: &str) -> Result<Self, PoolError> {
        toml::from_str(text)
            .map_err(|e| PoolError::Config(format!("Invalid interface catalog: {}", e)))
    }

    /// Load an interface catalog from disk.
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        Self::from_toml(&read_config_file(path)?)
    }

    /// Schema with the given declaring name.
    #[must_use]
    pub fn get(&self, interface: &str) -> Option<&ContextSchema> {
        self.interfaces
            .iter()
            .find(|schema| schema.interface == interface)
    }
}

// =============================================================================
// HOST SECRET
// =============================================================================

/// The secret guarding the topology binding.
///
/// Taken from `CTXPOOL_SECRET` when set; otherwise a fresh random one is
/// generated for this process, so no plugin can know it in advance.
#[must_use]
pub fn host_secret() -> Credential {
    match std::env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => Credential::new(secret),
        _ => Credential::new(generate_secret()),
    }
}

/// 32 bytes from the OS-seeded thread RNG, hex encoded.
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    let mut secret = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(secret, "{byte:02x}");
    }
    secret
}
