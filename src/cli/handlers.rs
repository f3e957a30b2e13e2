//! Subcommand implementations; each returns the process exit code

use anyhow::{Context as _, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use super::commands::{DetectArgs, ReleaseArgs, StageArgs};
use super::output::OutputFormatter;
use crate::installer::CacheInstaller;
use crate::lifecycle::{self, Buildpack};
use crate::provider::Context;
use crate::{BuildpackConfig, Catalog, Stager};

/// Subdirectory of the cache dir holding pre-fetched archives
const CACHE_SUBDIR: &str = "dependencies";

fn load_config() -> Result<BuildpackConfig> {
    let config = BuildpackConfig::from_env().context("Failed to read configuration")?;
    config.validate()?;
    debug!("{}", config);
    Ok(config)
}

fn load_catalog(config: &BuildpackConfig) -> Result<Catalog> {
    Ok(Catalog::embedded()
        .context("Failed to load dependency catalog")?
        .with_stack(config.stack.as_deref()))
}

/// Cache locations searched by the installer: the staging cache, then a
/// `dependencies` directory shipped next to the executable
fn cache_dirs(cache_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![cache_dir.join(CACHE_SUBDIR)];
    if let Some(bundled) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CACHE_SUBDIR)))
    {
        dirs.push(bundled);
    }
    dirs
}

fn report(phase: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{} failed: {:#}", phase, e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_detect(args: &DetectArgs) -> i32 {
    match run_detect(args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_detect(args: &DetectArgs) -> Result<bool> {
    let config = load_config()?;
    let catalog = load_catalog(&config)?;
    // detection only reads the build directory, never the slot
    let stager = Stager::new(&args.build_dir, env::temp_dir(), env::temp_dir(), 0);
    let installer = CacheInstaller::new(Vec::new());
    let ctx = Context::new(&stager, &config, &catalog, &installer);

    let plan = Buildpack::with_defaults().plan(&ctx)?;
    let output = OutputFormatter::new(args.format.into()).format(&plan)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(plan.container.is_some())
}

fn stager(args: &StageArgs) -> Stager {
    Stager::new(&args.build_dir, &args.cache_dir, &args.deps_dir, args.index)
}

pub fn handle_supply(args: &StageArgs) -> i32 {
    report("Supply", run_supply(args))
}

fn run_supply(args: &StageArgs) -> Result<()> {
    let config = load_config()?;
    let catalog = load_catalog(&config)?;
    let stager = stager(args);
    let installer = CacheInstaller::new(cache_dirs(&args.cache_dir));
    let ctx = Context::new(&stager, &config, &catalog, &installer);

    Buildpack::with_defaults().supply(&ctx)?;
    Ok(())
}

pub fn handle_finalize(args: &StageArgs) -> i32 {
    report("Finalize", run_finalize(args))
}

fn run_finalize(args: &StageArgs) -> Result<()> {
    let config = load_config()?;
    let catalog = load_catalog(&config)?;
    let stager = stager(args);
    let installer = CacheInstaller::new(cache_dirs(&args.cache_dir));
    let ctx = Context::new(&stager, &config, &catalog, &installer);

    Buildpack::with_defaults().finalize(&ctx)?;
    Ok(())
}

pub fn handle_release(args: &ReleaseArgs) -> i32 {
    let stager = Stager::new("", "", &args.deps_dir, args.index);
    match lifecycle::read_release(&stager) {
        Ok(yaml) => {
            print!("{}", yaml);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dirs_prefers_staging_cache() {
        let dirs = cache_dirs(Path::new("/tmp/cache"));
        assert_eq!(dirs[0], PathBuf::from("/tmp/cache/dependencies"));
        assert!(dirs.len() <= 2);
    }

    #[test]
    fn test_release_without_finalize() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = ReleaseArgs {
            deps_dir: dir.path().to_path_buf(),
            index: 0,
        };
        assert_eq!(handle_release(&args), 1);
    }
}
