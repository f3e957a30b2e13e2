use super::{Manifest, JAVA_BIN};
use crate::error::{BuildpackError, Category, Result};
use crate::provider::{plain_tag, Container, ContainerId, Context, Provider};

/// Any application with a main class
pub struct JavaMain;

impl JavaMain {
    const ID: &'static str = ContainerId::JavaMain.as_str();

    /// Configured main class first, then the manifest's
    fn main_class(ctx: &Context<'_>, manifest: Option<&Manifest>) -> Option<String> {
        ctx.component(Self::ID)
            .string(&["java_main_class"])
            .or_else(|| manifest.and_then(|m| m.main_class()).map(str::to_string))
    }
}

impl Provider for JavaMain {
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
        let manifest = Manifest::read(ctx.app_dir())?;
        Ok(Self::main_class(ctx, manifest.as_ref()).map(|_| plain_tag(Self::ID)))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }
}

impl Container for JavaMain {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let manifest = Manifest::read(ctx.app_dir())?;
        let main_class =
            Self::main_class(ctx, manifest.as_ref()).ok_or(BuildpackError::NoMatch {
                category: Category::Container,
            })?;

        let mut class_path = vec!["$HOME/.".to_string()];
        if let Some(manifest) = &manifest {
            class_path.extend(
                manifest
                    .class_path()
                    .into_iter()
                    .map(|entry| format!("$HOME/{}", entry.trim_start_matches("./"))),
            );
        }

        let mut command = format!(
            "eval exec {} $JAVA_OPTS -cp {} {}",
            JAVA_BIN,
            class_path.join(":"),
            main_class
        );
        if let Some(arguments) = ctx.component(Self::ID).string(&["arguments"]) {
            command.push(' ');
            command.push_str(&arguments);
        }
        Ok(command)
    }
}
