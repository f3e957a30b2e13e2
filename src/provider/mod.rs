//! Provider contract shared by containers, JREs and agents
//!
//! A provider is a stateless unit that decides from filesystem and
//! configuration evidence whether it applies (`detect`), installs what it needs
//! (`supply`), and configures what it installed (`finalize`). Because both
//! phases may run in different processes, `detect` must be a pure function of
//! the application tree, the dependency directory and the configuration
//! snapshot: finalize re-runs it instead of receiving state from supply.

#[macro_use]
pub mod id_enum_macro;

pub mod ids;
pub mod registry;

pub use ids::{AgentId, ContainerId, JreId};
pub use registry::{Detected, Registry};

use crate::catalog::{Catalog, DependencyDescriptor};
use crate::config::{BuildpackConfig, ComponentConfig};
use crate::error::{Category, Result};
use crate::installer::Installer;
use crate::options::{self, OptionFragment};
use crate::stager::Stager;
use crate::util::fs as fsutil;
use std::path::Path;
use tracing::info;

/// Everything a provider may consult during one phase
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub stager: &'a Stager,
    pub config: &'a BuildpackConfig,
    pub catalog: &'a Catalog,
    pub installer: &'a dyn Installer,
    registration: usize,
}

impl<'a> Context<'a> {
    pub fn new(
        stager: &'a Stager,
        config: &'a BuildpackConfig,
        catalog: &'a Catalog,
        installer: &'a dyn Installer,
    ) -> Self {
        Self {
            stager,
            config,
            catalog,
            installer,
            registration: 0,
        }
    }

    /// Same context, tagged with the calling provider's registry position
    pub fn for_registration(self, registration: usize) -> Self {
        Self {
            registration,
            ..self
        }
    }

    pub fn app_dir(&self) -> &'a Path {
        self.stager.build_dir()
    }

    pub fn component(&self, id: &str) -> ComponentConfig {
        self.config.component(id)
    }

    /// Installs `dependency` into the provider's own directory under the slot,
    /// replacing whatever an earlier supply left there
    pub fn install(&self, provider_id: &str, dependency: &DependencyDescriptor) -> Result<()> {
        let target = self.stager.provider_dir(provider_id);
        info!(
            "-----> Installing {} {} for {}",
            dependency.name, dependency.version, provider_id
        );
        fsutil::remove_dir_if_exists(&target)?;
        self.installer.install(dependency, &target)
    }

    /// Writes this provider's option fragment
    pub fn write_options(&self, contributor: &str, priority: u32, opts: &[String]) -> Result<()> {
        let fragment = OptionFragment::new(contributor, priority, self.registration, opts);
        options::write_fragment(self.stager, &fragment)?;
        Ok(())
    }
}

/// Common lifecycle for every provider category
pub trait Provider {
    /// Stable identifier, also the install directory and config key
    fn id(&self) -> &'static str;

    fn category(&self) -> Category;

    /// `Ok(Some(tag))` when the provider applies.
    ///
    /// An application that satisfies two mutually-exclusive layouts of this
    /// provider is an `AmbiguousMatch` error, never a silent pick.
    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>>;

    fn supply(&self, ctx: &Context<'_>) -> Result<()>;

    fn finalize(&self, ctx: &Context<'_>) -> Result<()>;
}

/// An application shape; exactly the first matching container is used
pub trait Container: Provider {
    /// Command that launches the application
    fn release(&self, ctx: &Context<'_>) -> Result<String>;
}

/// A Java runtime; exactly one must match
pub trait Jre: Provider {
    /// Memory calculation prefix for the start command, if available
    fn release(&self, ctx: &Context<'_>) -> Result<Option<String>>;
}

/// An independent supporting agent; every matching agent is used
pub trait Agent: Provider {
    /// Lower priorities appear earlier in `JAVA_OPTS`
    fn priority(&self) -> u32;
}

/// Option priorities
pub mod priority {
    pub const JRE: u32 = 0;
    pub const AGENT: u32 = 20;
    pub const DEBUG: u32 = 30;
    pub const USER: u32 = 99;
}

/// Tag in the `<id>=<version>` form used in detection output
pub fn versioned_tag(id: &str, version: &str) -> String {
    format!("{}={}", id.replace('_', "-"), version)
}

/// Tag without a version
pub fn plain_tag(id: &str) -> String {
    id.replace('_', "-")
}
