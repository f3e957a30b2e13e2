//! JVM heap sizing
//!
//! The container memory limit is only known when the application starts, so
//! staging cannot compute `-Xmx` itself. Instead it estimates how many classes
//! the JVM will load, and emits a shell fragment that runs the installed memory
//! calculator at process start with `$MEMORY_LIMIT` and that estimate.

use crate::config::ComponentConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Percentage of classpath classes a typical run actually loads
pub const LOADED_CLASS_PERCENT: u64 = 35;

/// Classes the runtime itself loads from its module image on Java 9+
pub const JRE_CLASS_COUNT: u64 = 42_215;

pub const DEFAULT_THREAD_COUNT: u64 = 250;

/// File name prefix of the installed calculator binary
pub const CALCULATOR_BINARY: &str = "java-buildpack-memory-calculator";

/// Platform variable holding the container memory limit at runtime
pub const MEMORY_LIMIT_EXPR: &str = "$MEMORY_LIMIT";

const CLASS_EXTENSIONS: &[&str] = &["class", "groovy"];
const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "war", "ear", "zip"];

/// Inputs to the runtime memory calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapProfile {
    pub loaded_class_estimate: u64,
    pub thread_budget: u64,
    /// Percentage of total memory left unallocated
    pub headroom: Option<u64>,
}

/// User overrides read from the JRE's `memory_calculator` block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculatorSettings {
    pub stack_threads: Option<u64>,
    pub headroom: Option<u64>,
    pub class_count: Option<u64>,
}

impl CalculatorSettings {
    pub fn from_component(config: &ComponentConfig) -> Self {
        Self {
            stack_threads: config.u64(&["memory_calculator", "stack_threads"]),
            headroom: config.u64(&["memory_calculator", "headroom"]),
            class_count: config.u64(&["memory_calculator", "class_count"]),
        }
    }
}

impl HeapProfile {
    /// Scans `app_dir` unless a class count override is configured
    pub fn compute(app_dir: &Path, java_major: u32, settings: &CalculatorSettings) -> Self {
        let loaded_class_estimate = match settings.class_count {
            Some(count) => count,
            None => estimate_loaded_classes(count_classes(app_dir), java_major),
        };

        Self {
            loaded_class_estimate,
            thread_budget: settings.stack_threads.unwrap_or(DEFAULT_THREAD_COUNT),
            headroom: settings.headroom,
        }
    }
}

/// Applies the runtime constant and the loaded-class percentage to a raw
/// count, rounding down
pub fn estimate_loaded_classes(raw_count: u64, java_major: u32) -> u64 {
    let total = if java_major >= 9 {
        raw_count + JRE_CLASS_COUNT
    } else {
        raw_count
    };
    total * LOADED_CLASS_PERCENT / 100
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Counts compiled classes and scripts under `root`, including entries of
/// top-level archives. Unreadable files and archives are skipped.
pub fn count_classes(root: &Path) -> u64 {
    let mut count = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry during class count: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if has_extension(path, CLASS_EXTENSIONS) {
            count += 1;
        } else if has_extension(path, ARCHIVE_EXTENSIONS) {
            match count_archive_entries(path) {
                Ok(n) => count += n,
                Err(e) => warn!("Unable to count classes in {}: {}", path.display(), e),
            }
        }
    }

    debug!(root = %root.display(), count, "Counted application classes");
    count
}

fn count_archive_entries(path: &Path) -> Result<u64, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| e.to_string())?;

    let mut count = 0;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).map_err(|e| e.to_string())?;
        if !entry.is_dir() && has_extension(Path::new(entry.name()), CLASS_EXTENSIONS) {
            count += 1;
        }
    }
    Ok(count)
}

/// Finds the calculator binary installed during supply
pub fn locate_calculator(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(CALCULATOR_BINARY))
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// A deferred calculator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCalculation {
    /// Runtime expression for the calculator binary
    pub binary: String,
    pub profile: HeapProfile,
}

impl MemoryCalculation {
    /// Shell fragment that computes memory flags and appends them to `JAVA_OPTS`
    pub fn command(&self) -> String {
        let mut args = vec![
            format!("--total-memory={}", MEMORY_LIMIT_EXPR),
            format!("--loaded-class-count={}", self.profile.loaded_class_estimate),
            format!("--thread-count={}", self.profile.thread_budget),
        ];
        if let Some(headroom) = self.profile.headroom {
            args.push(format!("--head-room={}", headroom));
        }
        args.push("--jvm-options=\"$JAVA_OPTS\"".to_string());

        format!(
            "CALCULATED_MEMORY=$({} {}) && echo JVM Memory Configuration: $CALCULATED_MEMORY && JAVA_OPTS=\"$JAVA_OPTS $CALCULATED_MEMORY\"",
            self.binary,
            args.join(" ")
        )
    }
}
