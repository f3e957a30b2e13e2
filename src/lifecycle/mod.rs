//! Supply and finalize orchestration
//!
//! Supply detects and installs, in order, the container, the JRE and every
//! agent, then records what it detected in the supply marker. Finalize runs in
//! a separate process: it re-runs the same detection, refuses to continue if
//! the result differs from the marker, configures each provider and writes the
//! release descriptor.

mod release;
mod state;

pub use release::{read_release, web_command, ReleaseDescriptor};
pub use state::{current_state, AgentRecord, LifecycleState, ProviderRecord, SupplyMarker};

use crate::agent::default_agents;
use crate::container::default_containers;
use crate::error::{BuildpackError, Category, Result};
use crate::jre::default_jres;
use crate::options;
use crate::provider::{Agent, Container, Context, Detected, Jre, Provider, Registry};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything detection would select, without installing anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionPlan {
    pub container: Option<ProviderRecord>,
    pub jre: Option<ProviderRecord>,
    pub agents: Vec<ProviderRecord>,
}

/// The three provider registries
pub struct Buildpack {
    containers: Registry<dyn Container>,
    jres: Registry<dyn Jre>,
    agents: Registry<dyn Agent>,
}

impl Buildpack {
    pub fn new(
        containers: Vec<Box<dyn Container>>,
        jres: Vec<Box<dyn Jre>>,
        agents: Vec<Box<dyn Agent>>,
    ) -> Self {
        Self {
            containers: Registry::new(Category::Container, containers),
            jres: Registry::new(Category::Jre, jres),
            agents: Registry::new(Category::Agent, agents),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_containers(), default_jres(), default_agents())
    }

    /// Tag of the container that would run the application, if any
    pub fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        Ok(self.containers.detect_first(ctx)?.map(|d| d.tag))
    }

    /// Runs detection for all three categories
    ///
    /// A missing JRE is reported as `None`; every other error propagates.
    pub fn plan(&self, ctx: &Context<'_>) -> Result<DetectionPlan> {
        let container = self.containers.detect_first(ctx)?.map(|d| record(&d));
        let jre = match self.jres.detect_exactly_one(ctx) {
            Ok(detected) => Some(record(&detected)),
            Err(BuildpackError::NoMatch { .. }) => None,
            Err(e) => return Err(e),
        };
        let agents = self.agents.detect_all(ctx)?.iter().map(record).collect();
        Ok(DetectionPlan {
            container,
            jre,
            agents,
        })
    }

    fn detect_container(&self, ctx: &Context<'_>) -> Result<Detected<'_, dyn Container>> {
        self.containers
            .detect_first(ctx)?
            .ok_or(BuildpackError::NoMatch {
                category: Category::Container,
            })
    }

    pub fn supply(&self, ctx: &Context<'_>) -> Result<SupplyMarker> {
        let container = self.detect_container(ctx)?;
        info!("-----> Container: {}", container.tag);
        container
            .provider
            .supply(&ctx.for_registration(container.index))?;

        let jre = self.jres.detect_exactly_one(ctx)?;
        info!("-----> JRE: {}", jre.tag);
        jre.provider.supply(&ctx.for_registration(jre.index))?;

        let mut agents = Vec::new();
        for agent in self.agents.detect_all(ctx)? {
            info!("-----> Agent: {}", agent.tag);
            let supplied = match agent.provider.supply(&ctx.for_registration(agent.index)) {
                Ok(()) => true,
                Err(e) if e.is_agent_skippable() => {
                    warn!("Agent '{}' not supplied: {}", agent.id(), e);
                    false
                }
                Err(e) => return Err(e),
            };
            agents.push(AgentRecord {
                id: agent.id().to_string(),
                tag: agent.tag,
                supplied,
            });
        }

        let marker = SupplyMarker {
            state: LifecycleState::Supplied,
            container: record(&container),
            jre: record(&jre),
            agents,
        };
        marker.write(ctx.stager)?;
        debug!(marker = %ctx.stager.marker_path().display(), "Supply complete");
        Ok(marker)
    }

    pub fn finalize(&self, ctx: &Context<'_>) -> Result<ReleaseDescriptor> {
        let mut marker =
            SupplyMarker::read(ctx.stager)?.ok_or_else(|| BuildpackError::MissingPriorState {
                provider: "supply".to_string(),
                path: ctx.stager.marker_path(),
            })?;

        let container = self.detect_container(ctx)?;
        ensure_same(Category::Container, &marker.container.tag, &container.tag)?;
        let jre = self.jres.detect_exactly_one(ctx)?;
        ensure_same(Category::Jre, &marker.jre.tag, &jre.tag)?;
        let agents = self.agents.detect_all(ctx)?;
        let detected_tags: Vec<String> = agents.iter().map(|a| a.tag.clone()).collect();
        ensure_same(
            Category::Agent,
            &marker.agent_tags().join(", "),
            &detected_tags.join(", "),
        )?;

        options::clear_fragments(ctx.stager)?;

        let container_ctx = ctx.for_registration(container.index);
        container.provider.finalize(&container_ctx)?;
        let jre_ctx = ctx.for_registration(jre.index);
        jre.provider.finalize(&jre_ctx)?;

        for (agent, record) in agents.iter().zip(&marker.agents) {
            if !record.supplied {
                warn!("Agent '{}' skipped: supply did not complete", agent.id());
                continue;
            }
            match agent.provider.finalize(&ctx.for_registration(agent.index)) {
                Ok(()) => {}
                Err(e) if e.is_agent_skippable() => {
                    warn!("Agent '{}' not configured: {}", agent.id(), e);
                }
                Err(e) => return Err(e),
            }
        }

        options::write_assembly(ctx.stager)?;

        let release = ReleaseDescriptor {
            start_command: container.provider.release(&container_ctx)?,
            memory_calculation_prefix: jre.provider.release(&jre_ctx)?,
        };
        release.write(ctx.stager)?;
        info!("-----> Start command: {}", release.web_command());

        marker.state = LifecycleState::Finalized;
        marker.write(ctx.stager)?;
        Ok(release)
    }
}

fn record<P: Provider + ?Sized>(detected: &Detected<'_, P>) -> ProviderRecord {
    ProviderRecord {
        id: detected.id().to_string(),
        tag: detected.tag.clone(),
    }
}

fn ensure_same(category: Category, supplied: &str, detected: &str) -> Result<()> {
    if supplied == detected {
        return Ok(());
    }
    Err(BuildpackError::DetectionMismatch {
        category,
        supplied: supplied.to_string(),
        detected: detected.to_string(),
    })
}
