use super::{ambiguous, jars_in, scripts_in};
use crate::error::{Category, Result};
use crate::provider::{plain_tag, versioned_tag, Container, ContainerId, Context, Provider};
use crate::util::fs as fsutil;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn play_jar_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<prefix>com\.typesafe\.play\.|org\.playframework\.|play\.)play_[^-]+-(?P<version>\d[^/]*)\.jar$",
        )
        .expect("valid regex")
    })
}

/// Staged (`bin/<script>`) or legacy (`start`) Play application
pub struct PlayFramework;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// `bin/<script>` with `lib/com.typesafe.play.play_*.jar`
    Staged { script: String, version: Option<String> },
    /// `start` with `lib/play.play_*.jar`
    Legacy { version: Option<String> },
}

impl Layout {
    fn version(&self) -> Option<&str> {
        match self {
            Layout::Staged { version, .. } | Layout::Legacy { version } => version.as_deref(),
        }
    }
}

impl PlayFramework {
    const ID: &'static str = ContainerId::PlayFramework.as_str();

    fn play_jar(jars: &[String], prefix: &str) -> Option<Option<String>> {
        jars.iter()
            .find(|jar| jar.starts_with(prefix) && jar[prefix.len()..].starts_with("play_"))
            .map(|jar| {
                play_jar_pattern()
                    .captures(jar)
                    .filter(|caps| &caps["prefix"] == prefix)
                    .map(|caps| caps["version"].to_string())
            })
    }

    fn staged(app: &Path, jars: &[String]) -> Result<Option<Layout>> {
        let version = ["com.typesafe.play.", "org.playframework."]
            .iter()
            .find_map(|prefix| Self::play_jar(jars, prefix));
        let Some(version) = version else {
            return Ok(None);
        };
        let scripts = scripts_in(&app.join("bin"))?;
        Ok(match scripts.as_slice() {
            [] => None,
            [script] => Some(Layout::Staged {
                script: script.clone(),
                version,
            }),
            many => {
                return Err(ambiguous(
                    Self::ID,
                    format!("several start scripts in bin/: {}", many.join(", ")),
                ))
            }
        })
    }

    fn legacy(app: &Path, jars: &[String]) -> Option<Layout> {
        if !app.join("start").is_file() {
            return None;
        }
        Self::play_jar(jars, "play.").map(|version| Layout::Legacy { version })
    }

    fn layout(app: &Path) -> Result<Option<Layout>> {
        let jars = jars_in(&app.join("lib"))?;
        let staged = Self::staged(app, &jars)?;
        let legacy = Self::legacy(app, &jars);
        match (staged, legacy) {
            (Some(_), Some(_)) => Err(ambiguous(
                Self::ID,
                "both staged (bin/) and legacy (start) layouts are present",
            )),
            (staged, legacy) => Ok(staged.or(legacy)),
        }
    }
}

impl Provider for PlayFramework {
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
        Ok(Self::layout(ctx.app_dir())?.map(|layout| match layout.version() {
            Some(version) => versioned_tag(Self::ID, version),
            None => plain_tag(Self::ID),
        }))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let app = ctx.app_dir();
        match Self::layout(app)? {
            Some(Layout::Staged { script, .. }) => fsutil::set_executable(&app.join("bin").join(script)),
            Some(Layout::Legacy { .. }) => fsutil::set_executable(&app.join("start")),
            None => Ok(()),
        }
    }
}

impl Container for PlayFramework {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let command = match Self::layout(ctx.app_dir())? {
            Some(Layout::Staged { script, .. }) => format!(
                "PATH=$JAVA_HOME/bin:$PATH JAVA_OPTS=\"$JAVA_OPTS -Dhttp.port=$PORT\" exec $HOME/bin/{}",
                script
            ),
            _ => "PATH=$JAVA_HOME/bin:$PATH exec $HOME/start $JAVA_OPTS -Dhttp.port=$PORT"
                .to_string(),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildpackError;
    use crate::testutil::{config, TestEnv};

    #[test]
    fn test_staged_layout() {
        let env = TestEnv::new();
        env.app_file("bin/shop", "#!/bin/sh");
        env.app_file("bin/shop.bat", "");
        env.app_file("lib/com.typesafe.play.play_2.13-2.8.19.jar", "");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);

        assert_eq!(
            PlayFramework.detect(&ctx).unwrap().as_deref(),
            Some("play-framework=2.8.19")
        );
        assert!(PlayFramework.release(&ctx).unwrap().ends_with("exec $HOME/bin/shop"));
    }

    #[test]
    fn test_legacy_layout() {
        let env = TestEnv::new();
        env.app_file("start", "#!/bin/sh");
        env.app_file("lib/play.play_2.10-2.1.5.jar", "");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);

        assert_eq!(
            PlayFramework.detect(&ctx).unwrap().as_deref(),
            Some("play-framework=2.1.5")
        );
        PlayFramework.finalize(&ctx).unwrap();
        assert!(fsutil::is_executable(&env.app().join("start")));
        assert!(PlayFramework.release(&ctx).unwrap().contains("exec $HOME/start"));
    }

    #[test]
    fn test_both_layouts_is_ambiguous() {
        let env = TestEnv::new();
        env.app_file("start", "#!/bin/sh");
        env.app_file("bin/shop", "#!/bin/sh");
        env.app_file("lib/play.play_2.10-2.1.5.jar", "");
        env.app_file("lib/com.typesafe.play.play_2.13-2.8.19.jar", "");
        let cfg = config(&[]);
        let err = PlayFramework.detect(&env.ctx(&cfg)).unwrap_err();
        assert!(matches!(err, BuildpackError::AmbiguousMatch { .. }));
    }

    #[test]
    fn test_play_jar_versions_by_prefix() {
        let jars = vec![
            "org.playframework.play_3-3.0.1.jar".to_string(),
            "play.play_2.10-2.1.5.jar".to_string(),
        ];
        assert_eq!(
            PlayFramework::play_jar(&jars, "org.playframework."),
            Some(Some("3.0.1".to_string()))
        );
        assert_eq!(
            PlayFramework::play_jar(&jars, "play."),
            Some(Some("2.1.5".to_string()))
        );
        assert_eq!(PlayFramework::play_jar(&jars, "com.typesafe.play."), None);
        assert!(std::ptr::eq(play_jar_pattern(), play_jar_pattern()));
    }

    #[test]
    fn test_dist_without_play_jar_is_not_play() {
        let env = TestEnv::new();
        env.app_file("bin/app", "#!/bin/sh");
        env.app_file("lib/app.jar", "");
        let cfg = config(&[]);
        assert_eq!(PlayFramework.detect(&env.ctx(&cfg)).unwrap(), None);
    }
}
