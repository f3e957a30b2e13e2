//! Fixed dependency catalog
//!
//! The catalog is a flat list of `(name, version)` descriptors plus one default
//! constraint per dependency name. It is loaded once per process from the
//! embedded `manifest.yml` and never mutated afterwards.

pub mod version;

use crate::error::{BuildpackError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

pub use version::{compare_versions, highest_matching, java_major, VersionConstraint};

const EMBEDDED_MANIFEST: &str = include_str!("../../manifest.yml");

/// Name used in error messages for the embedded catalog
pub const EMBEDDED_CATALOG_NAME: &str = "manifest.yml";

/// One installable artifact in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub name: String,
    pub version: String,
    #[serde(rename = "uri")]
    pub source_location: String,
    #[serde(rename = "sha256")]
    pub integrity_hash: String,
    #[serde(rename = "cf_stacks", default)]
    pub platform_compatibility: Vec<String>,
}

impl DependencyDescriptor {
    fn supports(&self, stack: Option<&str>) -> bool {
        match stack {
            Some(stack) if !self.platform_compatibility.is_empty() => {
                self.platform_compatibility.iter().any(|s| s == stack)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultVersion {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    dependencies: Vec<DependencyDescriptor>,
    #[serde(default)]
    default_versions: Vec<DefaultVersion>,
}

/// The dependency catalog, optionally narrowed to one platform stack
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    dependencies: Vec<DependencyDescriptor>,
    default_versions: Vec<DefaultVersion>,
    stack: Option<String>,
}

impl Catalog {
    /// Loads the catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_CATALOG_NAME, EMBEDDED_MANIFEST)
    }

    pub fn from_yaml(name: &str, content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;

        let mut seen = HashSet::new();
        for dep in &file.dependencies {
            if !seen.insert((dep.name.as_str(), dep.version.as_str())) {
                return Err(BuildpackError::Configuration {
                    variable: name.to_string(),
                    message: format!("duplicate catalog entry {} {}", dep.name, dep.version),
                });
            }
        }

        debug!(
            catalog = name,
            entries = file.dependencies.len(),
            "Loaded dependency catalog"
        );

        Ok(Self {
            name: name.to_string(),
            dependencies: file.dependencies,
            default_versions: file.default_versions,
            stack: None,
        })
    }

    /// Hides entries that declare a platform list not containing `stack`
    pub fn with_stack(mut self, stack: Option<&str>) -> Self {
        self.stack = stack.map(str::to_string);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn visible(&self, name: &str) -> impl Iterator<Item = &DependencyDescriptor> + '_ {
        let name = name.to_string();
        self.dependencies
            .iter()
            .filter(move |d| d.name == name && d.supports(self.stack.as_deref()))
    }

    /// All visible versions of `name`, highest first
    pub fn all_versions(&self, name: &str) -> Vec<String> {
        let mut versions: Vec<String> = self.visible(name).map(|d| d.version.clone()).collect();
        versions.sort_by(|a, b| compare_versions(b, a));
        versions
    }

    pub fn find(&self, name: &str, version: &str) -> Option<&DependencyDescriptor> {
        self.visible(name).find(|d| d.version == version)
    }

    /// Resolves `constraint` to the highest matching visible entry
    pub fn resolve(&self, name: &str, constraint: &str) -> Result<DependencyDescriptor> {
        let parsed = VersionConstraint::parse(constraint)?;
        let best = highest_matching(&parsed, self.visible(name).map(|d| d.version.as_str()))
            .and_then(|version| self.find(name, version));

        match best {
            Some(dep) => {
                debug!(
                    dependency = name,
                    constraint = %parsed,
                    version = %dep.version,
                    "Resolved dependency version"
                );
                Ok(dep.clone())
            }
            None => Err(BuildpackError::NotFound {
                name: name.to_string(),
                constraint: parsed.to_string(),
                catalog: self.name.clone(),
            }),
        }
    }

    /// Resolves the catalog's default constraint for `name`
    pub fn default_version(&self, name: &str) -> Result<DependencyDescriptor> {
        let default = self
            .default_versions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| BuildpackError::NotFound {
                name: name.to_string(),
                constraint: "default".to_string(),
                catalog: self.name.clone(),
            })?;
        self.resolve(name, &default.version)
    }

    /// Resolves `constraint` when given, otherwise the default
    pub fn resolve_or_default(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<DependencyDescriptor> {
        match constraint {
            Some(c) => self.resolve(name, c),
            None => self.default_version(name),
        }
    }
}
