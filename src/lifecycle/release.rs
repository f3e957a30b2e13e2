//! The release descriptor written at the end of finalize

use crate::error::{BuildpackError, Result};
use crate::stager::Stager;
use crate::util::fs as fsutil;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEB_PROCESS: &str = "web";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub start_command: String,
    /// Runs before the start command and extends `JAVA_OPTS` with memory flags
    pub memory_calculation_prefix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReleaseFile {
    default_process_types: BTreeMap<String, String>,
}

impl ReleaseDescriptor {
    /// The full `web` process command
    pub fn web_command(&self) -> String {
        match &self.memory_calculation_prefix {
            Some(prefix) => format!("{} && {}", prefix, self.start_command),
            None => self.start_command.clone(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        let file = ReleaseFile {
            default_process_types: BTreeMap::from([(WEB_PROCESS.to_string(), self.web_command())]),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn write(&self, stager: &Stager) -> Result<()> {
        fsutil::write_file(&stager.release_path(), &self.to_yaml()?)
    }
}

/// The release YAML written by a completed finalize
pub fn read_release(stager: &Stager) -> Result<String> {
    let path = stager.release_path();
    fsutil::read_optional(&path)?.ok_or(BuildpackError::MissingPriorState {
        provider: "finalize".to_string(),
        path,
    })
}

/// The `web` command from release YAML
pub fn web_command(yaml: &str) -> Result<Option<String>> {
    let file: ReleaseFile = serde_yaml::from_str(yaml)?;
    Ok(file.default_process_types.get(WEB_PROCESS).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_joins_with_and() {
        let release = ReleaseDescriptor {
            start_command: "exec app".to_string(),
            memory_calculation_prefix: Some("CALC=1".to_string()),
        };
        assert_eq!(release.web_command(), "CALC=1 && exec app");

        let yaml = release.to_yaml().unwrap();
        assert!(yaml.starts_with("default_process_types:"));
        assert_eq!(web_command(&yaml).unwrap().as_deref(), Some("CALC=1 && exec app"));
    }

    #[test]
    fn test_without_prefix() {
        let release = ReleaseDescriptor {
            start_command: "exec app".to_string(),
            memory_calculation_prefix: None,
        };
        assert_eq!(release.web_command(), "exec app");
    }
}
