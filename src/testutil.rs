//! Fixtures for provider unit tests

use crate::catalog::{Catalog, DependencyDescriptor};
use crate::config::BuildpackConfig;
use crate::error::{BuildpackError, Result};
use crate::installer::Installer;
use crate::provider::Context;
use crate::stager::Stager;
use crate::util::fs as fsutil;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Installer that lays out a plausible distribution instead of unpacking one
#[derive(Default)]
pub struct RecordingInstaller {
    pub installed: RefCell<Vec<(String, String, PathBuf)>>,
    failing: HashSet<String>,
}

impl RecordingInstaller {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            installed: RefCell::default(),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.installed
            .borrow()
            .iter()
            .map(|(name, _, _)| name.clone())
            .collect()
    }
}

impl Installer for RecordingInstaller {
    fn install(&self, dependency: &DependencyDescriptor, target_dir: &Path) -> Result<()> {
        if self.failing.contains(&dependency.name) {
            return Err(BuildpackError::Install {
                name: dependency.name.clone(),
                version: dependency.version.clone(),
                message: "download refused".to_string(),
            });
        }

        let v = &dependency.version;
        let file = match dependency.name.as_str() {
            "openjdk" | "sapmachine" | "zulu" => format!("jre-{}/bin/java", v),
            "memory-calculator" => format!("java-buildpack-memory-calculator-{}", v),
            "tomcat" => format!("apache-tomcat-{}/bin/catalina.sh", v),
            "groovy" => format!("groovy-{}/bin/groovy", v),
            "appdynamics" => "AppServerAgent/javaagent.jar".to_string(),
            "newrelic" => format!("new-relic-{}.jar", v),
            "jacoco" => "lib/jacocoagent.jar".to_string(),
            "contrast-security" => format!("contrast-agent-{}.jar", v),
            other => format!("{}.installed", other),
        };
        let path = target_dir.join(file);
        fsutil::write_file(&path, "")?;
        fsutil::set_executable(&path)?;

        self.installed.borrow_mut().push((
            dependency.name.clone(),
            dependency.version.clone(),
            target_dir.to_path_buf(),
        ));
        Ok(())
    }
}

/// Temporary build/cache/deps trees with slot 0
pub struct TestEnv {
    _root: TempDir,
    pub stager: Stager,
    pub catalog: Catalog,
    pub installer: RecordingInstaller,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_installer(RecordingInstaller::default())
    }

    pub fn with_installer(installer: RecordingInstaller) -> Self {
        let root = TempDir::new().unwrap();
        let stager = Stager::new(
            root.path().join("app"),
            root.path().join("cache"),
            root.path().join("deps"),
            0,
        );
        fsutil::create_dir_all(stager.build_dir()).unwrap();
        fsutil::create_dir_all(&stager.dep_dir()).unwrap();
        Self {
            _root: root,
            stager,
            catalog: Catalog::embedded().unwrap(),
            installer,
        }
    }

    pub fn app(&self) -> &Path {
        self.stager.build_dir()
    }

    /// Writes a file relative to the application root
    pub fn app_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.app().join(rel);
        fsutil::write_file(&path, content).unwrap();
        path
    }

    pub fn app_dir(&self, rel: &str) -> PathBuf {
        let path = self.app().join(rel);
        fsutil::create_dir_all(&path).unwrap();
        path
    }

    pub fn ctx<'a>(&'a self, config: &'a BuildpackConfig) -> Context<'a> {
        Context::new(&self.stager, config, &self.catalog, &self.installer)
    }
}

pub fn config(vars: &[(&str, &str)]) -> BuildpackConfig {
    BuildpackConfig::from_vars(vars.iter().copied()).unwrap()
}
