//! Build-time layout and staging-to-runtime path translation
//!
//! During staging, dependencies are installed under `<deps>/<idx>`. When the
//! application runs, the same tree is mounted somewhere else and reachable
//! through the platform's `$DEPS_DIR` variable. Nothing written during staging
//! may embed a build-time absolute path; every reference goes through
//! [`Stager::translate`].
//!
//! There are two translation targets:
//!
//! - [`Translation::Deferred`] yields `$DEPS_DIR/<idx>/...`, for anything
//!   evaluated after the platform has set up its environment (profile.d
//!   scripts, the start command).
//! - [`Translation::Early`] yields the absolute runtime path
//!   `/home/vcap/deps/<idx>/...`, for `env.d` scripts sourced before
//!   `$DEPS_DIR` is defined.

use crate::error::{BuildpackError, Result};
use crate::util::fs as fsutil;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Expression the platform resolves to the runtime dependency root
pub const RUNTIME_DEPS_EXPR: &str = "$DEPS_DIR";

/// Literal runtime dependency root, valid before `$DEPS_DIR` is exported
pub const RUNTIME_DEPS_ROOT: &str = "/home/vcap/deps";

/// Expression the platform resolves to the application root at runtime
pub const RUNTIME_APP_EXPR: &str = "$HOME";

const PROFILE_D: &str = "profile.d";
const ENV_D: &str = "env.d";
const FRAGMENTS: &str = "java_opts";
const MARKER_FILE: &str = "supply.json";
const RELEASE_FILE: &str = "release.yml";

/// Which runtime form a translated path takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// `$DEPS_DIR/<idx>/...`
    Deferred,
    /// `/home/vcap/deps/<idx>/...`
    Early,
}

/// Directories handed to a phase by the platform
#[derive(Debug, Clone)]
pub struct Stager {
    build_dir: PathBuf,
    cache_dir: PathBuf,
    deps_dir: PathBuf,
    deps_idx: usize,
}

impl Stager {
    pub fn new(
        build_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        deps_dir: impl Into<PathBuf>,
        deps_idx: usize,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            cache_dir: cache_dir.into(),
            deps_dir: deps_dir.into(),
            deps_idx,
        }
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn deps_dir(&self) -> &Path {
        &self.deps_dir
    }

    pub fn deps_idx(&self) -> usize {
        self.deps_idx
    }

    /// This buildpack's dependency slot: `<deps>/<idx>`
    pub fn dep_dir(&self) -> PathBuf {
        self.deps_dir.join(self.deps_idx.to_string())
    }

    /// Install directory for one provider
    pub fn provider_dir(&self, provider_id: &str) -> PathBuf {
        self.dep_dir().join(provider_id)
    }

    pub fn profile_d_dir(&self) -> PathBuf {
        self.dep_dir().join(PROFILE_D)
    }

    pub fn env_d_dir(&self) -> PathBuf {
        self.dep_dir().join(ENV_D)
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.dep_dir().join(FRAGMENTS)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.dep_dir().join(MARKER_FILE)
    }

    pub fn release_path(&self) -> PathBuf {
        self.dep_dir().join(RELEASE_FILE)
    }

    /// Suffix of `path` below the dependency slot
    pub fn relative_to_slot(&self, path: &Path) -> Result<String> {
        relative_suffix(path, &self.dep_dir())
    }

    /// Rewrites a build-time path under the dependency slot for use at runtime
    pub fn translate(&self, path: &Path, target: Translation) -> Result<String> {
        let suffix = self.relative_to_slot(path)?;
        let root = match target {
            Translation::Deferred => RUNTIME_DEPS_EXPR,
            Translation::Early => RUNTIME_DEPS_ROOT,
        };
        let translated = join_expr(&format!("{}/{}", root, self.deps_idx), &suffix);
        debug!(
            from = %path.display(),
            to = %translated,
            "Translated staging path"
        );
        Ok(translated)
    }

    /// Shorthand for [`Translation::Deferred`]
    pub fn runtime_path(&self, path: &Path) -> Result<String> {
        self.translate(path, Translation::Deferred)
    }

    /// Rewrites a path inside the application tree relative to `$HOME`
    pub fn app_runtime_path(&self, path: &Path) -> Result<String> {
        let suffix = relative_suffix(path, &self.build_dir)?;
        Ok(join_expr(RUNTIME_APP_EXPR, &suffix))
    }

    /// Writes a startup script into `profile.d`, replacing any previous version
    pub fn write_profile_d(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.profile_d_dir().join(format!("{}.sh", name));
        fsutil::write_file(&path, content)?;
        Ok(path)
    }

    /// Writes an early script into `env.d`, replacing any previous version
    pub fn write_env_d(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.env_d_dir().join(format!("{}.sh", name));
        fsutil::write_file(&path, content)?;
        Ok(path)
    }
}

/// Resolves a translated expression against a concrete runtime dependency root.
///
/// This is what the platform does at process start; it exists so the
/// translation can be checked without a running container.
pub fn resolve_runtime_expr(expr: &str, runtime_deps_root: &Path) -> Option<PathBuf> {
    let rest = expr
        .strip_prefix(RUNTIME_DEPS_EXPR)
        .or_else(|| expr.strip_prefix(RUNTIME_DEPS_ROOT))?;
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        return Some(runtime_deps_root.to_path_buf());
    }
    Some(runtime_deps_root.join(rest))
}

fn relative_suffix(path: &Path, root: &Path) -> Result<String> {
    let suffix = path
        .strip_prefix(root)
        .map_err(|_| BuildpackError::PathOutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut parts = Vec::new();
    for component in suffix.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(BuildpackError::PathOutsideRoot {
                    path: path.to_path_buf(),
                    root: root.to_path_buf(),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

fn join_expr(root: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, suffix)
    }
}
