//! Declarative route manifests.
//!
//! A manifest lists routes and groups in YAML, JSON or TOML (picked by file
//! extension) and loads into a [`RouterBuilder`] whose handlers are handler names.
//!
//! ```yaml
//! settings:
//!   host_wildcards: true
//! middlewares: [request_id]
//! routes:
//!   - method: GET
//!     path: /health
//!     handler: health
//!   - methods: [GET, HEAD]
//!     path: /files/*path
//!     handler: serve_file
//!     name: files
//! groups:
//!   - prefix: /api/v1
//!     name: v1
//!     middlewares: [auth]
//!     routes:
//!       - method: GET
//!         path: /users/{id:int}
//!         handler: get_user
//!         name: user
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::router::{Group, Router, RouterBuilder, RouterConfig, ANY_METHODS};

/// Serialization format of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
    Toml,
}

impl ManifestFormat {
    /// Format implied by the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ManifestFormat::Yaml),
            "json" => Ok(ManifestFormat::Json),
            "toml" => Ok(ManifestFormat::Toml),
            _ => bail!(
                "unsupported manifest extension {:?} for {}",
                ext,
                path.display()
            ),
        }
    }
}

/// Root of a route manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub settings: RouterConfig,
    /// Handler names run before every route
    pub middlewares: Vec<String>,
    pub routes: Vec<RouteDef>,
    pub groups: Vec<GroupDef>,
}

/// One route entry; `method` and `methods` may be combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub handler: String,
}

impl RouteDef {
    /// Methods to register, with `ANY` expanded to every standard method.
    pub fn method_list(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.method.iter().chain(&self.methods).cloned().collect();
        if methods.iter().any(|m| m.eq_ignore_ascii_case("any")) {
            methods = ANY_METHODS.iter().map(|m| m.as_str().to_string()).collect();
        }
        methods
    }
}

/// A group of routes sharing a prefix, host, name and middlewares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDef {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub middlewares: Vec<String>,
    pub routes: Vec<RouteDef>,
    pub groups: Vec<GroupDef>,
}

impl Manifest {
    /// Read and parse a manifest, detecting the format from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ManifestFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(&content, format)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self> {
        let manifest = match format {
            ManifestFormat::Yaml => serde_yaml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
            ManifestFormat::Toml => toml::from_str(content)?,
        };
        Ok(manifest)
    }

    /// Register every route into a new builder configured with `settings`.
    pub fn builder(&self) -> Result<RouterBuilder<String>> {
        let mut builder = RouterBuilder::with_config(self.settings.clone());
        for middleware in &self.middlewares {
            builder.middleware(middleware.clone());
        }
        for route in &self.routes {
            let mut group = builder.group("");
            if let Some(host) = &route.host {
                group = group.host(host);
            }
            register_route(&mut group, route)?;
        }
        for def in &self.groups {
            register_group(builder.group(&def.prefix), def)?;
        }
        info!(
            routes = self.routes.len(),
            groups = self.groups.len(),
            registered = builder.len(),
            "Manifest loaded"
        );
        Ok(builder)
    }

    pub fn build(&self) -> Result<Router<String>> {
        Ok(self.builder()?.build())
    }
}

/// Load a manifest file straight into a serving router.
pub fn load_router(path: impl AsRef<Path>) -> Result<Router<String>> {
    Manifest::from_path(path)?.build()
}

fn configure<'b>(mut group: Group<'b, String>, def: &GroupDef) -> Group<'b, String> {
    if let Some(host) = &def.host {
        group = group.host(host);
    }
    if let Some(name) = &def.name {
        group = group.named(name);
    }
    group.middlewares(def.middlewares.iter().cloned())
}

fn register_group(group: Group<'_, String>, def: &GroupDef) -> Result<()> {
    let mut group = configure(group, def);
    for route in &def.routes {
        register_route(&mut group, route)?;
    }
    for child in &def.groups {
        register_group(group.group(&child.prefix), child)?;
    }
    Ok(())
}

fn register_route(group: &mut Group<'_, String>, route: &RouteDef) -> Result<()> {
    let methods = route.method_list();
    if methods.is_empty() {
        bail!("route {} has no method", route.path);
    }
    for method in methods {
        let entry = group
            .add(&method, &route.path, vec![route.handler.clone()])
            .with_context(|| format!("failed to register {method} {}", route.path))?;
        if let Some(name) = &route.name {
            entry.named(name);
        }
    }
    Ok(())
}
