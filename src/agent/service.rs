use crate::catalog::DependencyDescriptor;
use crate::config::ServiceBinding;
use crate::error::{BuildpackError, Category, Result};
use crate::provider::{priority, versioned_tag, Agent, AgentId, Context, Provider};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// What distinguishes one binding-driven agent from another
#[derive(Clone, Copy)]
pub struct ServiceAgentSpec {
    pub id: AgentId,
    /// Substrings matched against a binding's label, name and tags
    pub filters: &'static [&'static str],
    pub required_credentials: &'static [&'static str],
    /// Catalog dependency name
    pub dependency: &'static str,
    /// File name of the agent jar inside the installed distribution
    pub jar_pattern: &'static str,
    /// JVM options from the agent jar's runtime path and the binding
    pub options: fn(&str, &ServiceBinding) -> Vec<String>,
}

/// An agent enabled by a bound service in `VCAP_SERVICES`
pub struct ServiceAgent {
    spec: ServiceAgentSpec,
    jar_pattern: Regex,
}

impl ServiceAgent {
    pub fn new(spec: ServiceAgentSpec) -> Self {
        Self {
            jar_pattern: Regex::new(spec.jar_pattern).expect("valid regex"),
            spec,
        }
    }

    fn binding<'a>(&self, ctx: &Context<'a>) -> Result<Option<&'a ServiceBinding>> {
        let mut bindings: Vec<&ServiceBinding> = ctx
            .config
            .find_services(self.spec.filters)
            .into_iter()
            .filter(|s| s.has_credentials(self.spec.required_credentials))
            .collect();

        match bindings.len() {
            0 => Ok(None),
            1 => Ok(bindings.pop()),
            _ => {
                let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
                Err(BuildpackError::AmbiguousMatch {
                    category: Category::Agent,
                    provider: self.id().to_string(),
                    detail: format!("several bound services qualify: {}", names.join(", ")),
                })
            }
        }
    }

    fn dependency(&self, ctx: &Context<'_>) -> Result<DependencyDescriptor> {
        let constraint = ctx.component(self.id()).string(&["version"]);
        ctx.catalog
            .resolve_or_default(self.spec.dependency, constraint.as_deref())
    }

    fn locate_jar(&self, dir: &Path) -> Option<PathBuf> {
        let mut jars: Vec<(usize, PathBuf)> = WalkDir::new(dir)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.file_name()
                        .to_str()
                        .map(|n| self.jar_pattern.is_match(n))
                        .unwrap_or(false)
            })
            .map(|e| (e.depth(), e.into_path()))
            .collect();
        jars.sort();
        jars.into_iter().next().map(|(_, path)| path)
    }
}

impl Provider for ServiceAgent {
    fn id(&self) -> &'static str {
        self.spec.id.as_str()
    }

    fn category(&self) -> Category {
        Category::Agent
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(self.id()).is_disabled() || self.binding(ctx)?.is_none() {
            return Ok(None);
        }
        let dep = self.dependency(ctx)?;
        Ok(Some(versioned_tag(self.id(), &dep.version)))
    }

    fn supply(&self, ctx: &Context<'_>) -> Result<()> {
        let dep = self.dependency(ctx)?;
        info!("-----> {} {} selected", self.spec.id, dep.version);
        ctx.install(self.id(), &dep)
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let dir = ctx.stager.provider_dir(self.id());
        let jar = self
            .locate_jar(&dir)
            .ok_or_else(|| BuildpackError::MissingPriorState {
                provider: self.id().to_string(),
                path: dir.clone(),
            })?;
        let binding = self.binding(ctx)?.ok_or_else(|| BuildpackError::DetectionMismatch {
            category: Category::Agent,
            supplied: self.id().to_string(),
            detected: "no bound service".to_string(),
        })?;

        let jar = ctx.stager.runtime_path(&jar)?;
        ctx.write_options(self.id(), self.priority(), &(self.spec.options)(&jar, binding))
    }
}

impl Agent for ServiceAgent {
    fn priority(&self) -> u32 {
        priority::AGENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::service_agent_specs;
    use crate::options;
    use crate::testutil::{config, RecordingInstaller, TestEnv};

    fn agent(id: AgentId) -> ServiceAgent {
        let spec = service_agent_specs()
            .into_iter()
            .find(|s| s.id == id)
            .unwrap();
        ServiceAgent::new(spec)
    }

    const NEW_RELIC: &str = r#"{"newrelic": [{"label": "newrelic", "name": "apm", "tags": [], "credentials": {"licenseKey": "abc123"}}]}"#;

    #[test]
    fn test_new_relic_lifecycle() {
        let env = TestEnv::new();
        let cfg = config(&[("VCAP_SERVICES", NEW_RELIC)]);
        let ctx = env.ctx(&cfg).for_registration(1);
        let agent = agent(AgentId::NewRelic);

        assert_eq!(
            agent.detect(&ctx).unwrap().as_deref(),
            Some("new-relic-agent=8.16.0")
        );
        agent.supply(&ctx).unwrap();
        agent.finalize(&ctx).unwrap();

        let fragments = options::read_fragments(&env.stager).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].priority, priority::AGENT);
        assert_eq!(fragments[0].registration, 1);
        assert!(fragments[0]
            .content
            .starts_with("-javaagent:$DEPS_DIR/0/new_relic_agent/new-relic-8.16.0.jar "));
        assert!(fragments[0]
            .content
            .contains("-Dnewrelic.config.license_key=abc123"));
    }

    #[test]
    fn test_binding_without_credentials_is_ignored() {
        let env = TestEnv::new();
        let cfg = config(&[(
            "VCAP_SERVICES",
            r#"{"user-provided": [{"label": "user-provided", "name": "my-newrelic", "credentials": {}}]}"#,
        )]);
        assert_eq!(agent(AgentId::NewRelic).detect(&env.ctx(&cfg)).unwrap(), None);
    }

    #[test]
    fn test_disabled_agent() {
        let env = TestEnv::new();
        let cfg = config(&[
            ("VCAP_SERVICES", NEW_RELIC),
            ("JBP_CONFIG_NEW_RELIC_AGENT", "{enabled: false}"),
        ]);
        assert_eq!(agent(AgentId::NewRelic).detect(&env.ctx(&cfg)).unwrap(), None);
    }

    #[test]
    fn test_two_qualifying_bindings_is_ambiguous() {
        let env = TestEnv::new();
        let cfg = config(&[(
            "VCAP_SERVICES",
            r#"{"jacoco": [
                {"label": "jacoco", "name": "a", "credentials": {"address": "x"}},
                {"label": "jacoco", "name": "b", "credentials": {"address": "y"}}
            ]}"#,
        )]);
        assert!(matches!(
            agent(AgentId::Jacoco).detect(&env.ctx(&cfg)),
            Err(BuildpackError::AmbiguousMatch { .. })
        ));
    }

    #[test]
    fn test_install_failure_surfaces() {
        let env = TestEnv::with_installer(RecordingInstaller::failing(&["newrelic"]));
        let cfg = config(&[("VCAP_SERVICES", NEW_RELIC)]);
        let err = agent(AgentId::NewRelic).supply(&env.ctx(&cfg)).unwrap_err();
        assert!(err.is_agent_skippable());
    }

    #[test]
    fn test_appdynamics_jar_in_nested_dir() {
        let env = TestEnv::new();
        let cfg = config(&[(
            "VCAP_SERVICES",
            r#"{"appdynamics": [{"label": "appdynamics", "name": "appd", "credentials": {"host-name": "ctl.example.com", "account-name": "acme"}}]}"#,
        )]);
        let ctx = env.ctx(&cfg);
        let agent = agent(AgentId::AppDynamics);
        agent.supply(&ctx).unwrap();
        agent.finalize(&ctx).unwrap();

        let content = &options::read_fragments(&env.stager).unwrap()[0].content;
        assert!(content.starts_with(
            "-javaagent:$DEPS_DIR/0/app_dynamics_agent/AppServerAgent/javaagent.jar "
        ));
        assert!(content.contains("-Dappdynamics.controller.hostName=ctl.example.com"));
    }
}
