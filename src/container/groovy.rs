use super::ambiguous;
use crate::catalog::DependencyDescriptor;
use crate::error::{BuildpackError, Category, Result};
use crate::provider::{versioned_tag, Container, ContainerId, Context, Provider};
use crate::util::fs as fsutil;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;
use walkdir::WalkDir;

const DEPENDENCY: &str = "groovy";

fn main_method() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"static\s+(void\s+)?main\s*\(").expect("valid regex")
    })
}

fn class_declaration() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*(public\s+|abstract\s+|final\s+)*class\s+\w+").expect("valid regex")
    })
}

/// Uncompiled Groovy scripts run with the Groovy launcher
pub struct Groovy;

impl Groovy {
    const ID: &'static str = ContainerId::Groovy.as_str();

    /// `*.groovy` files below `app`, as sorted relative paths
    fn scripts(app: &Path) -> Vec<(String, String)> {
        let mut scripts: Vec<(String, String)> = WalkDir::new(app)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.path().extension().and_then(|x| x.to_str()) == Some("groovy")
            })
            .filter_map(|e| {
                let rel = e.path().strip_prefix(app).ok()?.to_string_lossy().into_owned();
                let content = std::fs::read_to_string(e.path()).ok()?;
                Some((rel, content))
            })
            .collect();
        scripts.sort();
        scripts
    }

    fn pick<'a>(candidates: &[&'a str], kind: &str) -> Result<Option<&'a str>> {
        match candidates {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(ambiguous(
                Self::ID,
                format!("several {} scripts: {}", kind, many.join(", ")),
            )),
        }
    }

    /// The script to launch: the one with a `main` method, else the only
    /// script that is not a class declaration.
    fn main_script(app: &Path) -> Result<Option<String>> {
        if app.join("WEB-INF").is_dir() {
            return Ok(None);
        }
        let scripts = Self::scripts(app);

        let with_main: Vec<&str> = scripts
            .iter()
            .filter(|(_, content)| main_method().is_match(content) || content.starts_with("#!"))
            .map(|(rel, _)| rel.as_str())
            .collect();
        if let Some(script) = Self::pick(&with_main, "main")? {
            return Ok(Some(script.to_string()));
        }

        let plain: Vec<&str> = scripts
            .iter()
            .filter(|(_, content)| !class_declaration().is_match(content))
            .map(|(rel, _)| rel.as_str())
            .collect();
        Ok(Self::pick(&plain, "non-class")?.map(str::to_string))
    }

    fn dependency(ctx: &Context<'_>) -> Result<DependencyDescriptor> {
        let constraint = ctx.component(Self::ID).string(&["version"]);
        ctx.catalog
            .resolve_or_default(DEPENDENCY, constraint.as_deref())
    }

    fn groovy_home(ctx: &Context<'_>) -> Result<PathBuf> {
        let dir = ctx.stager.provider_dir(Self::ID);
        fsutil::find_home(&dir, "bin/groovy").ok_or(BuildpackError::MissingPriorState {
            provider: Self::ID.to_string(),
            path: dir,
        })
    }

    fn class_path(ctx: &Context<'_>) -> Result<Vec<String>> {
        let mut jars: Vec<PathBuf> = WalkDir::new(ctx.app_dir())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.path().extension().and_then(|x| x.to_str()) == Some("jar")
            })
            .map(|e| e.into_path())
            .collect();
        jars.sort();
        jars.iter()
            .map(|jar| ctx.stager.app_runtime_path(jar))
            .collect()
    }
}

impl Provider for Groovy {
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
        if Self::main_script(ctx.app_dir())?.is_none() {
            return Ok(None);
        }
        let dep = Self::dependency(ctx)?;
        Ok(Some(versioned_tag(Self::ID, &dep.version)))
    }

    fn supply(&self, ctx: &Context<'_>) -> Result<()> {
        let dep = Self::dependency(ctx)?;
        info!("-----> Groovy {} selected", dep.version);
        ctx.install(Self::ID, &dep)
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let home = Self::groovy_home(ctx)?;
        fsutil::set_executable(&home.join("bin/groovy"))
    }
}

impl Container for Groovy {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let script = Self::main_script(ctx.app_dir())?.ok_or(BuildpackError::NoMatch {
            category: Category::Container,
        })?;
        let home = ctx.stager.runtime_path(&Self::groovy_home(ctx)?)?;

        let mut command = format!("JAVA_OPTS=\"$JAVA_OPTS\" exec {}/bin/groovy", home);
        let class_path = Self::class_path(ctx)?;
        if !class_path.is_empty() {
            command.push_str(&format!(" -cp {}", class_path.join(":")));
        }
        command.push_str(&format!(" $HOME/{}", script));
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{config, TestEnv};

    #[test]
    fn test_single_script() {
        let env = TestEnv::new();
        env.app_file("app.groovy", "println 'hello'");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);

        assert_eq!(Groovy.detect(&ctx).unwrap().as_deref(), Some("groovy=4.0.24"));
        Groovy.supply(&ctx).unwrap();
        Groovy.finalize(&ctx).unwrap();
        assert_eq!(
            Groovy.release(&ctx).unwrap(),
            "JAVA_OPTS=\"$JAVA_OPTS\" exec $DEPS_DIR/0/groovy/groovy-4.0.24/bin/groovy $HOME/app.groovy"
        );
    }

    #[test]
    fn test_main_method_wins_over_classes() {
        let env = TestEnv::new();
        env.app_file("Model.groovy", "class Model { String name }");
        env.app_file(
            "Main.groovy",
            "class Main {\n  static void main(String[] args) { println 'x' }\n}",
        );
        env.app_file("lib/helper.jar", "");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);

        Groovy.supply(&ctx).unwrap();
        let release = Groovy.release(&ctx).unwrap();
        assert!(release.contains(" -cp $HOME/lib/helper.jar "));
        assert!(release.ends_with(" $HOME/Main.groovy"));
    }

    #[test]
    fn test_several_scripts_is_ambiguous() {
        let env = TestEnv::new();
        env.app_file("one.groovy", "println 1");
        env.app_file("two.groovy", "println 2");
        let cfg = config(&[]);
        assert!(matches!(
            Groovy.detect(&env.ctx(&cfg)),
            Err(BuildpackError::AmbiguousMatch { .. })
        ));
    }

    #[test]
    fn test_only_classes_is_no_match() {
        let env = TestEnv::new();
        env.app_file("Model.groovy", "class Model {}");
        let cfg = config(&[]);
        assert_eq!(Groovy.detect(&env.ctx(&cfg)).unwrap(), None);
    }

    #[test]
    fn test_finalize_without_supply() {
        let env = TestEnv::new();
        env.app_file("app.groovy", "println 'hello'");
        let cfg = config(&[]);
        assert!(matches!(
            Groovy.finalize(&env.ctx(&cfg)),
            Err(BuildpackError::MissingPriorState { .. })
        ));
    }
}
