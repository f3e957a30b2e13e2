//! Output formatting for `javapack detect`
//!
//! Everything here goes to stdout; logs go to stderr.

use anyhow::{Context, Result};

use crate::lifecycle::{DetectionPlan, ProviderRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The container tag alone, as platform detect scripts expect
    Tag,
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, plan: &DetectionPlan) -> Result<String> {
        match self.format {
            OutputFormat::Tag => Ok(plan
                .container
                .as_ref()
                .map(|c| c.tag.clone())
                .unwrap_or_default()),
            OutputFormat::Json => serde_json::to_string_pretty(plan)
                .context("Failed to serialize detection plan to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(plan).context("Failed to serialize detection plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(plan)),
        }
    }

    fn format_human(&self, plan: &DetectionPlan) -> String {
        fn line(record: Option<&ProviderRecord>) -> String {
            record
                .map(|r| r.tag.clone())
                .unwrap_or_else(|| "(none)".to_string())
        }

        let mut output = String::new();
        if plan.container.is_some() {
            output.push_str("\u{2713} Detection Result\n");
        } else {
            output.push_str("\u{2717} Detection Result (no container matched)\n");
        }
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&format!("Container:  {}\n", line(plan.container.as_ref())));
        output.push_str(&format!("JRE:        {}\n", line(plan.jre.as_ref())));

        if plan.agents.is_empty() {
            output.push_str("Agents:     (none)\n");
        } else {
            output.push_str("Agents:\n");
            for (i, agent) in plan.agents.iter().enumerate() {
                let connector = if i == plan.agents.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, agent.tag));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> DetectionPlan {
        DetectionPlan {
            container: Some(ProviderRecord {
                id: "spring_boot".to_string(),
                tag: "spring-boot=2.7.0".to_string(),
            }),
            jre: Some(ProviderRecord {
                id: "open_jdk_jre".to_string(),
                tag: "open-jdk-jre=17.0.13".to_string(),
            }),
            agents: vec![
                ProviderRecord {
                    id: "debug".to_string(),
                    tag: "debug=8000".to_string(),
                },
                ProviderRecord {
                    id: "java_opts".to_string(),
                    tag: "java-opts".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_tag_format() {
        let formatter = OutputFormatter::new(OutputFormat::Tag);
        assert_eq!(formatter.format(&plan()).unwrap(), "spring-boot=2.7.0");
    }

    #[test]
    fn test_json_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format(&plan()).unwrap()).unwrap();
        assert_eq!(json["jre"]["id"], "open_jdk_jre");
        assert_eq!(json["agents"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_human_format() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format(&plan()).unwrap();
        assert!(output.contains("Container:  spring-boot=2.7.0"));
        assert!(output.contains("\u{251C}\u{2500} debug=8000"));
        assert!(output.contains("\u{2514}\u{2500} java-opts"));
    }
}
