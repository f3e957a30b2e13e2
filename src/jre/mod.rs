//! Java runtimes
//!
//! Exactly one JRE is used per application. OpenJDK is the default and matches
//! unless another JRE is explicitly configured, either by listing it in
//! `JBP_CONFIG_COMPONENTS` or by `{enabled: true}` in its own override blob.

mod runtime;

pub use runtime::JavaRuntime;

use crate::config::BuildpackConfig;
use crate::provider::{Jre, JreId};

/// The runtime catalog in registration order
pub fn default_jres() -> Vec<Box<dyn Jre>> {
    vec![
        Box::new(JavaRuntime::new(JreId::OpenJdk, "openjdk", true)),
        Box::new(JavaRuntime::new(JreId::SapMachine, "sapmachine", false)),
        Box::new(JavaRuntime::new(JreId::Zulu, "zulu", false)),
    ]
}

/// True when the user asked for `id` by name
pub fn is_explicit(config: &BuildpackConfig, id: JreId) -> bool {
    config.is_requested(id.as_str()) || config.component(id.as_str()).enabled() == Some(true)
}

/// Every explicitly configured JRE
pub fn explicit_jres(config: &BuildpackConfig) -> Vec<JreId> {
    JreId::all_variants()
        .iter()
        .copied()
        .filter(|id| is_explicit(config, *id))
        .collect()
}
