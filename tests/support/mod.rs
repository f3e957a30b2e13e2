//! Shared fixtures for integration tests

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use javapack::catalog::DependencyDescriptor;
use javapack::installer::Installer;
use javapack::{BuildpackConfig, Stager};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Build, cache and deps directories under one temporary root, slot 0
pub struct Workspace {
    root: TempDir,
    pub stager: Stager,
}

impl Workspace {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let stager = Stager::new(
            root.path().join("app"),
            root.path().join("cache"),
            root.path().join("deps"),
            0,
        );
        fs::create_dir_all(stager.build_dir()).unwrap();
        fs::create_dir_all(stager.dep_dir()).unwrap();
        fs::create_dir_all(stager.cache_dir()).unwrap();
        Self { root, stager }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn app(&self) -> &Path {
        self.stager.build_dir()
    }

    pub fn app_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.app().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read_slot(&self, rel: &str) -> String {
        fs::read_to_string(self.stager.dep_dir().join(rel))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e))
    }

    /// An exploded Spring Boot fat JAR
    pub fn spring_boot_app(&self, version: &str) {
        self.app_file(
            "META-INF/MANIFEST.MF",
            &format!(
                "Manifest-Version: 1.0\nMain-Class: org.springframework.boot.loader.JarLauncher\nStart-Class: com.example.Application\nSpring-Boot-Version: {}\n",
                version
            ),
        );
        self.app_file("BOOT-INF/classes/com/example/Application.class", "");
        self.app_file("BOOT-INF/classes/application.properties", "");
    }
}

pub fn config(vars: &[(&str, &str)]) -> BuildpackConfig {
    BuildpackConfig::from_vars(vars.iter().copied()).unwrap()
}

/// Lays out a minimal distribution for each dependency instead of unpacking one
#[derive(Default)]
pub struct StubInstaller {
    pub installed: RefCell<Vec<String>>,
    pub refuse: Vec<&'static str>,
}

impl Installer for StubInstaller {
    fn install(&self, dep: &DependencyDescriptor, target_dir: &Path) -> javapack::Result<()> {
        if self.refuse.contains(&dep.name.as_str()) {
            return Err(javapack::BuildpackError::Install {
                name: dep.name.clone(),
                version: dep.version.clone(),
                message: "refused by test".to_string(),
            });
        }
        let file = match dep.name.as_str() {
            "openjdk" | "sapmachine" | "zulu" => "jre/bin/java".to_string(),
            "memory-calculator" => format!("java-buildpack-memory-calculator-{}", dep.version),
            "tomcat" => "bin/catalina.sh".to_string(),
            "groovy" => "bin/groovy".to_string(),
            "appdynamics" => "javaagent.jar".to_string(),
            "newrelic" => "newrelic.jar".to_string(),
            "jacoco" => "lib/jacocoagent.jar".to_string(),
            "contrast-security" => format!("contrast-agent-{}.jar", dep.version),
            other => format!("{}.bin", other),
        };
        let path = target_dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        self.installed
            .borrow_mut()
            .push(format!("{}={}", dep.name, dep.version));
        Ok(())
    }
}

/// A gzipped tarball holding `entries` as `(path, content, mode)`
pub fn tar_gz(entries: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Path to the compiled `javapack` binary
pub fn javapack_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("javapack")
}
