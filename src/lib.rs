//! javapack - two-phase buildpack for JVM applications
//!
//! javapack stages a JVM application for a container platform in two separate
//! processes. `supply` detects what the application is and installs what it
//! needs into a numbered dependency slot; `finalize` re-derives the same
//! decisions, configures the installed software for runtime paths and writes
//! the start command.
//!
//! # Core Concepts
//!
//! - **Providers**: stateless units in three registries. Containers (the
//!   application shape, first match wins), JREs (exactly one) and agents
//!   (every match, failures isolated).
//! - **Stager**: the build, cache and dependency directories, and the
//!   translation of staging paths into expressions valid at runtime.
//! - **Catalog**: the embedded dependency manifest and version resolution.
//! - **Option fragments**: each provider writes its JVM options to its own file;
//!   finalize assembles them into one `JAVA_OPTS` export.
//!
//! # Example Usage
//!
//! ```ignore
//! use javapack::{Buildpack, BuildpackConfig, Catalog, Stager};
//! use javapack::installer::CacheInstaller;
//! use javapack::provider::Context;
//!
//! let stager = Stager::new("/tmp/app", "/tmp/cache", "/tmp/deps", 0);
//! let config = BuildpackConfig::from_env()?;
//! let catalog = Catalog::embedded()?.with_stack(config.stack.as_deref());
//! let installer = CacheInstaller::new(vec!["/tmp/cache/dependencies".into()]);
//! let ctx = Context::new(&stager, &config, &catalog, &installer);
//!
//! let buildpack = Buildpack::with_defaults();
//! buildpack.supply(&ctx)?;
//! let release = buildpack.finalize(&ctx)?;
//! println!("{}", release.web_command());
//! ```

pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod installer;
pub mod jre;
pub mod lifecycle;
pub mod memory;
pub mod options;
pub mod provider;
pub mod stager;
pub mod util;

#[cfg(test)]
mod testutil;

pub use catalog::Catalog;
pub use config::BuildpackConfig;
pub use error::{BuildpackError, Category, Result};
pub use lifecycle::{Buildpack, DetectionPlan, ReleaseDescriptor};
pub use stager::Stager;
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_javapack() {
        assert_eq!(NAME, "javapack");
    }
}
