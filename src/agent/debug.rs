use crate::error::{Category, Result};
use crate::provider::{priority, versioned_tag, Agent, AgentId, Context, Provider};

const DEFAULT_PORT: u64 = 8000;

/// JDWP remote debugging, enabled with `JBP_CONFIG_DEBUG: {enabled: true}`
pub struct RemoteDebug;

impl RemoteDebug {
    const ID: &'static str = AgentId::Debug.as_str();

    fn port(ctx: &Context<'_>) -> u64 {
        ctx.component(Self::ID)
            .u64(&["port"])
            .unwrap_or(DEFAULT_PORT)
    }
}

impl Provider for RemoteDebug {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn category(&self) -> Category {
        Category::Agent
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(Self::ID).enabled() != Some(true) {
            return Ok(None);
        }
        Ok(Some(versioned_tag(Self::ID, &Self::port(ctx).to_string())))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let suspend = ctx
            .component(Self::ID)
            .bool(&["suspend"])
            .unwrap_or(false);
        let flag = format!(
            "-agentlib:jdwp=transport=dt_socket,server=y,address={},suspend={}",
            Self::port(ctx),
            if suspend { "y" } else { "n" }
        );
        ctx.write_options(Self::ID, self.priority(), &[flag])
    }
}

impl Agent for RemoteDebug {
    fn priority(&self) -> u32 {
        priority::DEBUG
    }
}
