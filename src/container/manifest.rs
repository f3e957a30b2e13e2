//! `META-INF/MANIFEST.MF` reader

use crate::error::Result;
use crate::util::fs as fsutil;
use std::collections::BTreeMap;
use std::path::Path;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Main attributes of a JAR manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: BTreeMap<String, String>,
}

impl Manifest {
    /// Parses `Key: value` lines; a line starting with a single space continues
    /// the previous value.
    pub fn parse(content: &str) -> Self {
        let mut attributes = BTreeMap::new();
        let mut current: Option<(String, String)> = None;

        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((key, value)) = current.take() {
                attributes.insert(key, value);
            }
            // main section ends at the first blank line
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                current = Some((key.trim().to_string(), value.trim().to_string()));
            }
        }
        if let Some((key, value)) = current {
            attributes.insert(key, value);
        }

        Self { attributes }
    }

    /// The manifest of an exploded archive, if it has one
    pub fn read(app_dir: &Path) -> Result<Option<Self>> {
        Ok(fsutil::read_optional(&app_dir.join(MANIFEST_PATH))?.map(|c| Self::parse(&c)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn main_class(&self) -> Option<&str> {
        self.get("Main-Class")
    }

    /// `Class-Path` entries, relative to the application root
    pub fn class_path(&self) -> Vec<&str> {
        self.get("Class-Path")
            .map(|cp| cp.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_main_section() {
        let manifest = Manifest::parse(
            "Manifest-Version: 1.0\r\nMain-Class: com.example.App\r\nClass-Path: lib/a.jar\r\n  lib/b.jar\r\n\r\nName: other\r\nMain-Class: ignored\r\n",
        );
        assert_eq!(manifest.main_class(), Some("com.example.App"));
        assert_eq!(manifest.class_path(), vec!["lib/a.jar", "lib/b.jar"]);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let manifest = Manifest::parse("Main-Class: \n");
        assert_eq!(manifest.main_class(), None);
    }
}
