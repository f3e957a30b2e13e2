//! Configuration snapshot for one phase invocation
//!
//! All configuration is read once, up front, into a [`BuildpackConfig`] that is
//! handed by reference to every provider. Supply and finalize run in different
//! processes; as long as the platform gives both the same environment, both
//! observe identical configuration.
//!
//! # Environment Variables
//!
//! - `BP_JAVA_VERSION`: runtime selector (`17`, `17.*`, `11.+`, `17.0.13`)
//! - `JBP_CONFIG_<COMPONENT>`: YAML flow mapping overriding one component,
//!   e.g. `JBP_CONFIG_OPEN_JDK_JRE='{jre: {version: 11.+}}'`
//! - `JBP_CONFIG_COMPONENTS`: explicitly requested non-default providers,
//!   e.g. `'{jres: [zulu_jre]}'`
//! - `VCAP_SERVICES`: JSON service bindings
//! - `CF_STACK`: platform stack used to filter the dependency catalog
//! - `JBP_LOG_LEVEL`, `JBP_LOG_JSON`, `BP_DEBUG`: logging

use crate::error::{BuildpackError, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;
use std::fmt;

const CONFIG_PREFIX: &str = "JBP_CONFIG_";
const COMPONENTS_KEY: &str = "components";
const DEFAULT_LOG_LEVEL: &str = "info";

/// One bound service from `VCAP_SERVICES`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceBinding {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

impl ServiceBinding {
    /// True when label, name or any tag contains `needle` (case-insensitive)
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.label.to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    pub fn credential(&self, key: &str) -> Option<String> {
        match self.credentials.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn has_credentials(&self, keys: &[&str]) -> bool {
        keys.iter().all(|k| self.credential(k).is_some())
    }
}

/// Override blob for one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentConfig {
    value: Option<Value>,
}

impl ComponentConfig {
    /// `Some(flag)` only when the blob states `enabled` explicitly
    pub fn enabled(&self) -> Option<bool> {
        self.get(&["enabled"]).and_then(Value::as_bool)
    }

    pub fn is_disabled(&self) -> bool {
        self.enabled() == Some(false)
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self.value.as_ref()?;
        for key in path {
            current = current.as_mapping()?.get(Value::from(*key))?;
        }
        Some(current)
    }

    /// Reads a scalar at `path` as a string, whatever its YAML type
    pub fn string(&self, path: &[&str]) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn u64(&self, path: &[&str]) -> Option<u64> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool(&self, path: &[&str]) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Immutable configuration shared by every provider in one phase
#[derive(Debug, Clone, Default)]
pub struct BuildpackConfig {
    /// Runtime version selector from `BP_JAVA_VERSION`
    pub java_version: Option<String>,

    /// Platform stack from `CF_STACK`
    pub stack: Option<String>,

    /// Identifiers from `JBP_CONFIG_COMPONENTS`
    pub requested_components: BTreeSet<String>,

    /// Bound services from `VCAP_SERVICES`
    pub services: Vec<ServiceBinding>,

    /// Raw environment, consulted by the `java_opts` agent
    pub java_opts_env: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    overrides: BTreeMap<String, Value>,
}

impl BuildpackConfig {
    /// Snapshot of the current process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    /// Builds a snapshot from explicit variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut overrides = BTreeMap::new();
        for (key, raw) in &vars {
            if let Some(component) = key.strip_prefix(CONFIG_PREFIX) {
                let value: Value =
                    serde_yaml::from_str(raw).map_err(|e| BuildpackError::Configuration {
                        variable: key.clone(),
                        message: e.to_string(),
                    })?;
                overrides.insert(component.to_lowercase(), value);
            }
        }

        let requested_components = overrides
            .get(COMPONENTS_KEY)
            .map(collect_identifiers)
            .unwrap_or_default();

        let services = match vars.get("VCAP_SERVICES") {
            Some(raw) if !raw.trim().is_empty() => parse_services(raw)?,
            _ => Vec::new(),
        };

        let log_level = if vars.contains_key("BP_DEBUG") {
            "debug".to_string()
        } else {
            vars.get("JBP_LOG_LEVEL")
                .map(|l| l.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        };

        Ok(Self {
            java_version: non_empty(vars.get("BP_JAVA_VERSION")),
            stack: non_empty(vars.get("CF_STACK")),
            requested_components,
            services,
            java_opts_env: non_empty(vars.get("JAVA_OPTS")),
            log_level,
            overrides,
        })
    }

    /// Override blob for `component` (empty when absent)
    pub fn component(&self, component: &str) -> ComponentConfig {
        ComponentConfig {
            value: self.overrides.get(component).cloned(),
        }
    }

    pub fn is_requested(&self, component: &str) -> bool {
        self.requested_components.contains(component)
    }

    /// Services whose label, name or tags contain any of `needles`
    pub fn find_services(&self, needles: &[&str]) -> Vec<&ServiceBinding> {
        self.services
            .iter()
            .filter(|s| needles.iter().any(|n| s.matches(n)))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(BuildpackError::Configuration {
                variable: "JBP_LOG_LEVEL".to_string(),
                message: format!(
                    "invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for BuildpackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Buildpack Configuration:")?;
        writeln!(
            f,
            "  Java Version: {}",
            self.java_version.as_deref().unwrap_or("(default)")
        )?;
        writeln!(f, "  Stack: {}", self.stack.as_deref().unwrap_or("(any)"))?;
        writeln!(f, "  Services: {}", self.services.len())?;
        for (component, value) in &self.overrides {
            writeln!(
                f,
                "  JBP_CONFIG_{}: {}",
                component.to_uppercase(),
                serde_yaml::to_string(value)
                    .unwrap_or_default()
                    .trim()
                    .replace('\n', " ")
            )?;
        }
        Ok(())
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn collect_identifiers(value: &Value) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    match value {
        Value::String(s) => {
            ids.insert(s.clone());
        }
        Value::Sequence(items) => {
            for item in items {
                ids.extend(collect_identifiers(item));
            }
        }
        Value::Mapping(map) => {
            for item in map.values() {
                ids.extend(collect_identifiers(item));
            }
        }
        _ => {}
    }
    ids
}

fn parse_services(raw: &str) -> Result<Vec<ServiceBinding>> {
    let by_label: BTreeMap<String, Vec<ServiceBinding>> =
        serde_json::from_str(raw).map_err(|e| BuildpackError::Configuration {
            variable: "VCAP_SERVICES".to_string(),
            message: e.to_string(),
        })?;

    Ok(by_label
        .into_iter()
        .flat_map(|(label, bindings)| {
            bindings.into_iter().map(move |mut b| {
                if b.label.is_empty() {
                    b.label = label.clone();
                }
                b
            })
        })
        .collect())
}
