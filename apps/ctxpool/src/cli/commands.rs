//! # CLI Command Implementations
//!
//! Each command has a pure part building a report (used by the tests) and a
//! printing part honoring `--json-mode`.

use crate::config::{ComputerConfig, InterfaceCatalog, PluginConfig, host_secret};
use ctxpool_core::{
    ContextFamily, ContextObject, ContextPool, PoolError, canonical_form, fingerprint,
};
use serde::Serialize;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// FINGERPRINT COMMAND
// =============================================================================

/// Fingerprint of one catalog entry, or why it has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintEntry {
    pub interface: String,
    pub family: ContextFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub canonical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fingerprint every interface of a catalog, in catalog order.
pub fn fingerprint_catalog(catalog: &InterfaceCatalog) -> Vec<FingerprintEntry> {
    catalog
        .interfaces
        .iter()
        .map(|schema| {
            let (fingerprint, error) = match fingerprint(schema) {
                Ok(fp) => (Some(fp.to_string()), None),
                Err(e) => (None, Some(e.to_string())),
            };
            FingerprintEntry {
                interface: schema.interface.clone(),
                family: schema.family,
                fingerprint,
                canonical: canonical_form(schema),
                error,
            }
        })
        .collect()
}

/// Validate and fingerprint an interface catalog.
///
/// Fails if any interface is not a valid context, after reporting all of
/// them.
pub fn cmd_fingerprint(file: &Path, json_mode: bool, verbose: bool) -> Result<(), PoolError> {
    let catalog = InterfaceCatalog::load(file)?;
    let entries = fingerprint_catalog(&catalog);
    let invalid = entries.iter().filter(|entry| entry.error.is_some()).count();

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "interfaces": entries,
            "invalid": invalid,
        }));
    } else {
        println!("Interface Fingerprints");
        println!("======================");
        for entry in &entries {
            match (&entry.fingerprint, &entry.error) {
                (Some(fp), _) => println!("{}  {} [{}]", fp, entry.interface, entry.family),
                (None, Some(error)) => println!("{:<64}  {} ({})", "INVALID", entry.interface, error),
                (None, None) => {}
            }
            if verbose {
                println!("    {}", entry.canonical);
            }
        }
        println!();
        println!("Interfaces: {} ({} invalid)", entries.len(), invalid);
    }

    if invalid > 0 {
        return Err(PoolError::InvalidContext(format!(
            "{} of {} interfaces are not valid contexts",
            invalid,
            entries.len()
        )));
    }
    Ok(())
}

// =============================================================================
// TOPOLOGY COMMAND
// =============================================================================

/// Show plugins and connections of a computer configuration.
pub fn cmd_topology(config_path: &Path, json_mode: bool) -> Result<(), PoolError> {
    let config = ComputerConfig::load(config_path)?;
    let graph = config.graph();

    if json_mode {
        let connections: Vec<_> = graph
            .connections()
            .map(|(from, to)| serde_json::json!({ "from": from.0, "to": to.0 }))
            .collect();
        print_json(&serde_json::json!({
            "computer": config.name,
            "plugins": config.plugins,
            "connections": connections,
        }));
        return Ok(());
    }

    println!("Computer: {}", config.name);
    println!("==========");
    println!("Plugins:");
    for plugin in &config.plugins {
        println!("  {:>4}  {:<20} {}", plugin.id, plugin.name, plugin.kind);
    }
    println!();
    println!("Connections ({} directed):", graph.connection_count());
    for (from, to) in graph.connections() {
        println!(
            "  {} -> {}",
            config.display_name(from),
            config.display_name(to)
        );
    }

    Ok(())
}

// =============================================================================
// AUDIT COMMAND
// =============================================================================

/// A plugin as it appears in the audit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRef {
    pub id: u64,
    pub name: String,
}

impl From<&PluginConfig> for PluginRef {
    fn from(plugin: &PluginConfig) -> Self {
        Self {
            id: plugin.id,
            name: plugin.name.clone(),
        }
    }
}

/// One interface a requester can discover, with the plugins providing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleContext {
    pub interface: String,
    pub fingerprint: String,
    pub providers: Vec<PluginRef>,
}

/// What one plugin can discover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequesterReport {
    pub requester: PluginRef,
    pub visible: Vec<VisibleContext>,
}

/// Result of an audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub computer: String,
    pub registered: usize,
    pub requesters: Vec<RequesterReport>,
}

/// Build a pool for the configured computer and report visibility.
///
/// Every plugin registers one context per interface it provides; the
/// configured connections are bound as the topology.
pub fn build_audit(
    config: &ComputerConfig,
    catalog: &InterfaceCatalog,
    requester: Option<u64>,
) -> Result<AuditReport, PoolError> {
    let secret = host_secret();
    let pool = ContextPool::new(secret.clone())?;
    pool.bind(&secret, Arc::new(config.graph()))?;

    for plugin in &config.plugins {
        for name in &plugin.provides {
            let schema = catalog.get(name).ok_or_else(|| {
                PoolError::Config(format!(
                    "Plugin '{}' provides unknown interface '{}'",
                    plugin.name, name
                ))
            })?;
            let instance: Arc<dyn Any + Send + Sync> = Arc::new(format!("{}/{}", plugin.name, name));
            let object = ContextObject::declared(instance, schema)?;
            pool.register_object(plugin.owner(), object, schema)?;
        }
    }

    let requesters: Vec<&PluginConfig> = match requester {
        Some(id) => vec![config.plugin(id).ok_or_else(|| {
            PoolError::Config(format!("Unknown requester plugin id {}", id))
        })?],
        None => config.plugins.iter().collect(),
    };

    let mut reports = Vec::with_capacity(requesters.len());
    for plugin in requesters {
        let mut visible = Vec::new();
        for schema in &catalog.interfaces {
            let Ok(fp) = fingerprint(schema) else {
                continue;
            };
            let providers: Vec<PluginRef> = pool
                .visible(plugin.owner(), schema)?
                .iter()
                .map(|registration| PluginRef {
                    id: registration.owner.0,
                    name: config.display_name(registration.owner),
                })
                .collect();
            if !providers.is_empty() {
                visible.push(VisibleContext {
                    interface: schema.interface.clone(),
                    fingerprint: fp.to_string(),
                    providers,
                });
            }
        }
        reports.push(RequesterReport {
            requester: PluginRef::from(plugin),
            visible,
        });
    }

    Ok(AuditReport {
        computer: config.name.clone(),
        registered: pool.stats().registrations,
        requesters: reports,
    })
}

/// Report which contexts each plugin of a computer can discover.
pub fn cmd_audit(
    config_path: &Path,
    catalog_path: &Path,
    requester: Option<u64>,
    json_mode: bool,
) -> Result<(), PoolError> {
    let config = ComputerConfig::load(config_path)?;
    let catalog = InterfaceCatalog::load(catalog_path)?;
    let report = build_audit(&config, &catalog, requester)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Context Audit: {}", report.computer);
    println!("==============");
    println!("Registered contexts: {}", report.registered);
    for entry in &report.requesters {
        println!();
        println!("{} (#{})", entry.requester.name, entry.requester.id);
        if entry.visible.is_empty() {
            println!("  (nothing visible)");
        }
        for context in &entry.visible {
            let providers: Vec<String> = context
                .providers
                .iter()
                .map(|provider| format!("{} (#{})", provider.name, provider.id))
                .collect();
            println!(
                "  {} [{}] <- {}",
                context.interface,
                context.fingerprint.get(..8).unwrap_or(&context.fingerprint),
                providers.join(", ")
            );
        }
    }

    Ok(())
}
