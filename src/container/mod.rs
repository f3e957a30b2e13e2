//! Application containers
//!
//! Containers are tried in registration order and the first match wins, so the
//! most specific layouts come first: a Spring Boot fat JAR also has a
//! `Main-Class`, and would otherwise be launched as a plain executable JAR.

mod dist_zip;
mod groovy;
mod java_main;
pub mod manifest;
mod play;
mod spring_boot;
mod tomcat;

pub use dist_zip::DistZip;
pub use groovy::Groovy;
pub use java_main::JavaMain;
pub use manifest::Manifest;
pub use play::PlayFramework;
pub use spring_boot::SpringBoot;
pub use tomcat::Tomcat;

use crate::error::{BuildpackError, Category, Result};
use crate::util::fs as fsutil;
use std::path::Path;

/// Java launcher as seen by the start command
pub const JAVA_BIN: &str = "$JAVA_HOME/bin/java";

/// The container catalog in registration order
pub fn default_containers() -> Vec<Box<dyn crate::provider::Container>> {
    vec![
        Box::new(SpringBoot),
        Box::new(PlayFramework),
        Box::new(DistZip),
        Box::new(Groovy),
        Box::new(Tomcat),
        Box::new(JavaMain),
    ]
}

pub(crate) fn ambiguous(provider: &str, detail: impl Into<String>) -> BuildpackError {
    BuildpackError::AmbiguousMatch {
        category: Category::Container,
        provider: provider.to_string(),
        detail: detail.into(),
    }
}

/// Launch scripts in `dir`, ignoring Windows batch files
pub(crate) fn scripts_in(dir: &Path) -> Result<Vec<String>> {
    Ok(fsutil::list_dir(dir)?
        .into_iter()
        .filter(|name| !name.ends_with(".bat") && dir.join(name).is_file())
        .collect())
}

pub(crate) fn jars_in(dir: &Path) -> Result<Vec<String>> {
    Ok(fsutil::list_dir(dir)?
        .into_iter()
        .filter(|name| name.ends_with(".jar"))
        .collect())
}
