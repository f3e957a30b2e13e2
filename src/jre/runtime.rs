use super::{explicit_jres, is_explicit};
use crate::catalog::{java_major, DependencyDescriptor};
use crate::error::{BuildpackError, Category, Result};
use crate::memory::{self, CalculatorSettings, HeapProfile, MemoryCalculation};
use crate::provider::{priority, versioned_tag, Context, Jre, JreId, Provider};
use crate::stager::Translation;
use crate::util::fs as fsutil;
use std::path::PathBuf;
use tracing::{info, warn};

const MEMORY_CALCULATOR_DEPENDENCY: &str = "memory-calculator";
const MEMORY_CALCULATOR_DIR: &str = "memory_calculator";

/// A JRE distribution from the catalog
pub struct JavaRuntime {
    id: JreId,
    dependency: &'static str,
    default: bool,
}

impl JavaRuntime {
    pub fn new(id: JreId, dependency: &'static str, default: bool) -> Self {
        Self {
            id,
            dependency,
            default,
        }
    }

    /// Blob override, then `BP_JAVA_VERSION`, then the catalog default
    fn constraint(&self, ctx: &Context<'_>) -> Option<String> {
        ctx.component(self.id.as_str())
            .string(&["jre", "version"])
            .or_else(|| ctx.config.java_version.clone())
    }

    fn resolve(&self, ctx: &Context<'_>) -> Result<DependencyDescriptor> {
        ctx.catalog
            .resolve_or_default(self.dependency, self.constraint(ctx).as_deref())
    }

    fn install_dir(&self, ctx: &Context<'_>) -> PathBuf {
        ctx.stager.provider_dir(self.id.as_str())
    }

    fn calculator_dir(ctx: &Context<'_>) -> PathBuf {
        ctx.stager.provider_dir(MEMORY_CALCULATOR_DIR)
    }

    fn supply_memory_calculator(&self, ctx: &Context<'_>) {
        let result = ctx
            .catalog
            .default_version(MEMORY_CALCULATOR_DEPENDENCY)
            .and_then(|dep| ctx.install(MEMORY_CALCULATOR_DIR, &dep));
        if let Err(e) = result {
            warn!("Memory calculator not installed, heap sizing will be skipped: {}", e);
        }
    }

    fn java_home(&self, ctx: &Context<'_>) -> Result<PathBuf> {
        let dir = self.install_dir(ctx);
        if !dir.is_dir() {
            return Err(BuildpackError::MissingPriorState {
                provider: self.id.as_str().to_string(),
                path: dir,
            });
        }
        fsutil::find_home(&dir, "bin/java").ok_or_else(|| BuildpackError::MissingPriorState {
            provider: self.id.as_str().to_string(),
            path: dir.join("bin/java"),
        })
    }
}

impl Provider for JavaRuntime {
    fn id(&self) -> &'static str {
        self.id.as_str()
    }

    fn category(&self) -> Category {
        Category::Jre
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(self.id.as_str()).is_disabled() {
            return Ok(None);
        }

        let selected = if self.default {
            let explicit = explicit_jres(ctx.config);
            explicit.is_empty() || explicit.contains(&self.id)
        } else {
            is_explicit(ctx.config, self.id)
        };
        if !selected {
            return Ok(None);
        }

        let dep = self.resolve(ctx)?;
        Ok(Some(versioned_tag(self.id.as_str(), &dep.version)))
    }

    fn supply(&self, ctx: &Context<'_>) -> Result<()> {
        let dep = self.resolve(ctx)?;
        info!("-----> {} {} selected", self.id, dep.version);
        ctx.install(self.id.as_str(), &dep)?;
        self.supply_memory_calculator(ctx);
        Ok(())
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let java_home = self.java_home(ctx)?;
        let deferred = ctx.stager.translate(&java_home, Translation::Deferred)?;
        let early = ctx.stager.translate(&java_home, Translation::Early)?;

        ctx.stager.write_profile_d(
            "jre",
            &format!(
                "export JAVA_HOME={}\nexport PATH=$JAVA_HOME/bin:$PATH\n",
                deferred
            ),
        )?;
        ctx.stager
            .write_env_d("jre", &format!("export JAVA_HOME={}\n", early))?;

        ctx.write_options(
            self.id.as_str(),
            priority::JRE,
            &[
                "-Djava.io.tmpdir=$TMPDIR".to_string(),
                "-XX:ActiveProcessorCount=$(nproc)".to_string(),
                "-XX:+ExitOnOutOfMemoryError".to_string(),
            ],
        )
    }
}

impl Jre for JavaRuntime {
    fn release(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        let Some(binary) = memory::locate_calculator(&Self::calculator_dir(ctx)) else {
            warn!("Memory calculator not found, skipping heap configuration");
            return Ok(None);
        };

        let dep = self.resolve(ctx)?;
        let major = java_major(&dep.version)
            .ok_or_else(|| BuildpackError::InvalidVersion(dep.version.clone()))?;
        let settings = CalculatorSettings::from_component(&ctx.component(self.id.as_str()));
        let profile = HeapProfile::compute(ctx.app_dir(), major, &settings);
        info!(
            "Memory calculator: {} loaded classes, {} threads",
            profile.loaded_class_estimate, profile.thread_budget
        );

        let calculation = MemoryCalculation {
            binary: ctx.stager.runtime_path(&binary)?,
            profile,
        };
        Ok(Some(calculation.command()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildpackError;
    use crate::options;
    use crate::testutil::{config, RecordingInstaller, TestEnv};

    fn openjdk() -> JavaRuntime {
        JavaRuntime::new(JreId::OpenJdk, "openjdk", true)
    }

    fn zulu() -> JavaRuntime {
        JavaRuntime::new(JreId::Zulu, "zulu", false)
    }

    #[test]
    fn test_default_detects_catalog_default() {
        let env = TestEnv::new();
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        assert_eq!(
            openjdk().detect(&ctx).unwrap().as_deref(),
            Some("open-jdk-jre=17.0.13")
        );
        assert_eq!(zulu().detect(&ctx).unwrap(), None);
    }

    #[test]
    fn test_version_precedence() {
        let env = TestEnv::new();
        let cfg = config(&[("BP_JAVA_VERSION", "11")]);
        assert_eq!(
            openjdk().detect(&env.ctx(&cfg)).unwrap().as_deref(),
            Some("open-jdk-jre=11.0.25")
        );

        let cfg = config(&[
            ("BP_JAVA_VERSION", "11"),
            ("JBP_CONFIG_OPEN_JDK_JRE", "{jre: {version: 21.+}}"),
        ]);
        assert_eq!(
            openjdk().detect(&env.ctx(&cfg)).unwrap().as_deref(),
            Some("open-jdk-jre=21.0.5")
        );
    }

    #[test]
    fn test_explicit_jre_displaces_default() {
        let env = TestEnv::new();
        let cfg = config(&[("JBP_CONFIG_COMPONENTS", "{jres: [zulu_jre]}")]);
        let ctx = env.ctx(&cfg);
        assert_eq!(openjdk().detect(&ctx).unwrap(), None);
        assert_eq!(zulu().detect(&ctx).unwrap().as_deref(), Some("zulu-jre=17.0.13"));
    }

    #[test]
    fn test_unknown_version_is_not_found() {
        let env = TestEnv::new();
        let cfg = config(&[("BP_JAVA_VERSION", "42")]);
        let err = openjdk().detect(&env.ctx(&cfg)).unwrap_err();
        assert!(matches!(err, BuildpackError::NotFound { .. }));
        assert!(err.to_string().contains("42.*"));
    }

    #[test]
    fn test_finalize_writes_scripts_and_options() {
        let env = TestEnv::new();
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        let jre = openjdk();
        jre.supply(&ctx).unwrap();
        jre.finalize(&ctx).unwrap();

        let profile =
            std::fs::read_to_string(env.stager.profile_d_dir().join("jre.sh")).unwrap();
        assert!(profile.contains("export JAVA_HOME=$DEPS_DIR/0/open_jdk_jre/jre-17.0.13\n"));
        let early = std::fs::read_to_string(env.stager.env_d_dir().join("jre.sh")).unwrap();
        assert!(early.contains("export JAVA_HOME=/home/vcap/deps/0/open_jdk_jre/jre-17.0.13\n"));

        let fragments = options::read_fragments(&env.stager).unwrap();
        assert_eq!(fragments[0].contributor, "open_jdk_jre");
        assert!(fragments[0].content.contains("-XX:+ExitOnOutOfMemoryError"));
    }

    #[test]
    fn test_finalize_without_supply() {
        let env = TestEnv::new();
        let cfg = config(&[]);
        assert!(matches!(
            openjdk().finalize(&env.ctx(&cfg)),
            Err(BuildpackError::MissingPriorState { .. })
        ));
    }

    #[test]
    fn test_resupply_replaces_previous_version() {
        let env = TestEnv::new();
        let jre = openjdk();
        let first = config(&[("BP_JAVA_VERSION", "17")]);
        jre.supply(&env.ctx(&first)).unwrap();

        let second = config(&[("BP_JAVA_VERSION", "21")]);
        let ctx = env.ctx(&second);
        jre.supply(&ctx).unwrap();
        jre.finalize(&ctx).unwrap();

        let install_dir = env.stager.provider_dir("open_jdk_jre");
        assert!(!install_dir.join("jre-17.0.13").exists());
        let profile =
            std::fs::read_to_string(env.stager.profile_d_dir().join("jre.sh")).unwrap();
        assert!(profile.contains("export JAVA_HOME=$DEPS_DIR/0/open_jdk_jre/jre-21.0.5\n"));
    }

    #[test]
    fn test_finalize_without_java_binary() {
        let env = TestEnv::new();
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        let jre = openjdk();
        jre.supply(&ctx).unwrap();
        std::fs::remove_file(
            env.stager
                .provider_dir("open_jdk_jre")
                .join("jre-17.0.13/bin/java"),
        )
        .unwrap();

        let err = jre.finalize(&ctx).unwrap_err();
        assert!(matches!(err, BuildpackError::MissingPriorState { .. }));
        assert!(err.to_string().contains("bin/java"));
    }

    #[test]
    fn test_release_with_calculator() {
        let env = TestEnv::new();
        env.app_file("com/example/A.class", "");
        env.app_file("com/example/B.class", "");
        let cfg = config(&[(
            "JBP_CONFIG_OPEN_JDK_JRE",
            "{memory_calculator: {stack_threads: 100}}",
        )]);
        let ctx = env.ctx(&cfg);
        let jre = openjdk();
        jre.supply(&ctx).unwrap();

        let prefix = jre.release(&ctx).unwrap().unwrap();
        assert!(prefix.starts_with(
            "CALCULATED_MEMORY=$($DEPS_DIR/0/memory_calculator/java-buildpack-memory-calculator-4.2.0 "
        ));
        // (2 + 42215) * 0.35
        assert!(prefix.contains("--loaded-class-count=14775"));
        assert!(prefix.contains("--thread-count=100"));
    }

    #[test]
    fn test_release_without_calculator() {
        let env = TestEnv::with_installer(RecordingInstaller::failing(&["memory-calculator"]));
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        let jre = openjdk();
        jre.supply(&ctx).unwrap();
        assert_eq!(jre.release(&ctx).unwrap(), None);
    }
}
