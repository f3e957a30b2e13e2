use crate::error::{Category, Result};
use crate::provider::{plain_tag, priority, Agent, AgentId, Context, Provider};
use crate::util::shell;
use serde_yaml::Value;

/// User-supplied JVM options; highest priority so they override everything else
///
/// `JBP_CONFIG_JAVA_OPTS: {java_opts: "...", from_environment: true}`.
/// `java_opts` may be a string or a list. With `from_environment` (the
/// default) the application's own `$JAVA_OPTS` is appended at startup.
pub struct JavaOpts;

impl JavaOpts {
    const ID: &'static str = AgentId::JavaOpts.as_str();

    fn configured(ctx: &Context<'_>) -> Vec<String> {
        match ctx.component(Self::ID).get(&["java_opts"]) {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![shell::escape_quotes(s.trim())],
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(shell::escape_quotes(s)),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn from_environment(ctx: &Context<'_>) -> bool {
        ctx.config.java_opts_env.is_some()
            && ctx
                .component(Self::ID)
                .bool(&["from_environment"])
                .unwrap_or(true)
    }

    fn options(ctx: &Context<'_>) -> Vec<String> {
        let mut opts = Self::configured(ctx);
        if Self::from_environment(ctx) {
            opts.push("$JAVA_OPTS".to_string());
        }
        opts
    }
}

impl Provider for JavaOpts {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn category(&self) -> Category {
        Category::Agent
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(Self::ID).is_disabled() || Self::options(ctx).is_empty() {
            return Ok(None);
        }
        Ok(Some(plain_tag(Self::ID)))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        ctx.write_options(Self::ID, self.priority(), &Self::options(ctx))
    }
}

impl Agent for JavaOpts {
    fn priority(&self) -> u32 {
        priority::USER
    }
}
