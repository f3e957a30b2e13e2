//! Installing catalog dependencies into a directory
//!
//! Providers only see the [`Installer`] trait. [`CacheInstaller`] is the shipped
//! implementation: it works from archives already present in a local
//! dependency cache, verifies their sha256, and unpacks them.

use crate::catalog::DependencyDescriptor;
use crate::error::{BuildpackError, Result};
use crate::util::fs as fsutil;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Installs one dependency into `target_dir`
///
/// Installing over an existing directory must succeed; supply is re-runnable.
pub trait Installer {
    fn install(&self, dependency: &DependencyDescriptor, target_dir: &Path) -> Result<()>;
}

/// Installs from pre-fetched archives in a cache directory
#[derive(Debug, Clone)]
pub struct CacheInstaller {
    cache_dirs: Vec<PathBuf>,
}

impl CacheInstaller {
    pub fn new(cache_dirs: Vec<PathBuf>) -> Self {
        Self { cache_dirs }
    }

    fn locate(&self, dependency: &DependencyDescriptor) -> Option<PathBuf> {
        let file_name = archive_name(&dependency.source_location);
        self.cache_dirs
            .iter()
            .flat_map(|dir| {
                [
                    dir.join(&dependency.integrity_hash).join(&file_name),
                    dir.join(&file_name),
                ]
            })
            .find(|p| p.is_file())
    }

    fn failure(dependency: &DependencyDescriptor, message: impl Into<String>) -> BuildpackError {
        BuildpackError::Install {
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            message: message.into(),
        }
    }
}

impl Installer for CacheInstaller {
    fn install(&self, dependency: &DependencyDescriptor, target_dir: &Path) -> Result<()> {
        let archive = self.locate(dependency).ok_or_else(|| {
            Self::failure(
                dependency,
                format!(
                    "{} not found in dependency cache",
                    archive_name(&dependency.source_location)
                ),
            )
        })?;

        let actual = sha256_file(&archive)?;
        if !actual.eq_ignore_ascii_case(&dependency.integrity_hash) {
            return Err(Self::failure(
                dependency,
                format!(
                    "sha256 mismatch: expected {}, got {}",
                    dependency.integrity_hash, actual
                ),
            ));
        }

        info!(
            "Installing {} {} into {}",
            dependency.name,
            dependency.version,
            target_dir.display()
        );
        fsutil::create_dir_all(target_dir)?;

        let name = archive.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            unpack_tar_gz(&archive, target_dir)
                .map_err(|e| Self::failure(dependency, e.to_string()))?;
        } else if name.ends_with(".zip") {
            unpack_zip(&archive, target_dir).map_err(|e| Self::failure(dependency, e))?;
        } else {
            let dest = target_dir.join(archive_name(&dependency.source_location));
            fs::copy(&archive, &dest).map_err(|e| BuildpackError::io(&dest, e))?;
        }

        debug!(dependency = %dependency.name, "Install complete");
        Ok(())
    }
}

/// Last path segment of a URI with percent-escaped `+` restored
pub fn archive_name(uri: &str) -> String {
    uri.rsplit('/')
        .next()
        .unwrap_or(uri)
        .replace("%2B", "+")
}

fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| BuildpackError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| BuildpackError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn unpack_tar_gz(archive: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.set_overwrite(true);
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
}

fn unpack_zip(archive: &Path, dest: &Path) -> std::result::Result<(), String> {
    let file = File::open(archive).map_err(|e| e.to_string())?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| e.to_string())?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| e.to_string())?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| format!("unsafe zip entry name: {}", entry.name()))?;
        let out = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| e.to_string())?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let mut writer = File::create(&out).map_err(|e| e.to_string())?;
        io::copy(&mut entry, &mut writer).map_err(|e| e.to_string())?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out, fs::Permissions::from_mode(mode))
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}
