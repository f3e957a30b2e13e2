use super::{ambiguous, jars_in, scripts_in};
use crate::error::{BuildpackError, Category, Result};
use crate::provider::{plain_tag, Container, ContainerId, Context, Provider};
use crate::util::fs as fsutil;
use std::path::Path;

/// Output of Gradle's `distZip` or sbt-native-packager: `bin/<script>` + `lib/*.jar`
pub struct DistZip;

impl DistZip {
    const ID: &'static str = ContainerId::DistZip.as_str();

    fn start_script(app: &Path) -> Result<Option<String>> {
        if jars_in(&app.join("lib"))?.is_empty() {
            return Ok(None);
        }
        let scripts = scripts_in(&app.join("bin"))?;
        match scripts.as_slice() {
            [] => Ok(None),
            [script] => Ok(Some(script.clone())),
            many => Err(ambiguous(
                Self::ID,
                format!("several start scripts in bin/: {}", many.join(", ")),
            )),
        }
    }

    fn required_script(app: &Path) -> Result<String> {
        Self::start_script(app)?.ok_or_else(|| BuildpackError::NoMatch {
            category: Category::Container,
        })
    }
}

impl Provider for DistZip {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn category(&self) -> Category {
        Category::Container
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(Self::ID).is_disabled() {
            return Ok(None);
        }
        Ok(Self::start_script(ctx.app_dir())?.map(|_| plain_tag(Self::ID)))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let script = Self::required_script(ctx.app_dir())?;
        fsutil::set_executable(&ctx.app_dir().join("bin").join(script))
    }
}

impl Container for DistZip {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let script = Self::required_script(ctx.app_dir())?;
        Ok(format!("SERVER_PORT=$PORT exec $HOME/bin/{}", script))
    }
}
