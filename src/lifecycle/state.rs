//! Supply marker persisted between the two phases

use crate::error::Result;
use crate::stager::Stager;
use crate::util::fs as fsutil;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    NotStarted,
    Supplied,
    Finalized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "not started",
            LifecycleState::Supplied => "supplied",
            LifecycleState::Finalized => "finalized",
        };
        write!(f, "{}", name)
    }
}

/// A detected provider as recorded by supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub tag: String,
    /// False when the agent's supply failed and finalize must skip it
    pub supplied: bool,
}

/// Contents of `<deps>/<idx>/supply.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyMarker {
    pub state: LifecycleState,
    pub container: ProviderRecord,
    pub jre: ProviderRecord,
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
}

impl SupplyMarker {
    pub fn read(stager: &Stager) -> Result<Option<Self>> {
        match fsutil::read_optional(&stager.marker_path())? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    pub fn write(&self, stager: &Stager) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fsutil::write_file(&stager.marker_path(), &content)
    }

    /// Agents as `id=tag` strings, for mismatch reports
    pub fn agent_tags(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.tag.clone()).collect()
    }
}

/// Where the slot stands, judged from the marker alone
pub fn current_state(stager: &Stager) -> Result<LifecycleState> {
    Ok(SupplyMarker::read(stager)?
        .map(|m| m.state)
        .unwrap_or(LifecycleState::NotStarted))
}
