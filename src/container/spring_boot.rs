use super::{ambiguous, Manifest, JAVA_BIN};
use crate::error::{Category, Result};
use crate::provider::{plain_tag, versioned_tag, Container, ContainerId, Context, Provider};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

const LEGACY_LOADER: &str = "org.springframework.boot.loader";
const LOADER: &str = "org.springframework.boot.loader.launch";

const KNOWN_LAUNCHERS: &[&str] = &[
    "org.springframework.boot.loader.JarLauncher",
    "org.springframework.boot.loader.WarLauncher",
    "org.springframework.boot.loader.PropertiesLauncher",
    "org.springframework.boot.loader.launch.JarLauncher",
    "org.springframework.boot.loader.launch.WarLauncher",
    "org.springframework.boot.loader.launch.PropertiesLauncher",
];

fn boot_jar_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^spring-boot-(\d+\.\d+\.\d+[^/]*)\.jar$").expect("valid regex")
    })
}

/// Exploded Spring Boot fat JAR or WAR
pub struct SpringBoot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packaging {
    Jar,
    War,
}

impl SpringBoot {
    const ID: &'static str = ContainerId::SpringBoot.as_str();

    fn packaging(app: &Path) -> Result<Option<Packaging>> {
        let boot_inf = app.join("BOOT-INF").is_dir();
        let web_inf = app.join("WEB-INF").is_dir();
        match (boot_inf, web_inf) {
            (true, true) => Err(ambiguous(
                Self::ID,
                "both BOOT-INF (jar) and WEB-INF (war) layouts are present",
            )),
            (true, false) => Ok(Some(Packaging::Jar)),
            (false, true) => Ok(Some(Packaging::War)),
            (false, false) => Ok(None),
        }
    }

    /// Framework version from the manifest, else from the bundled spring-boot jar
    fn version(app: &Path, manifest: Option<&Manifest>) -> Result<Option<String>> {
        if let Some(v) = manifest.and_then(|m| m.get("Spring-Boot-Version")) {
            return Ok(Some(v.to_string()));
        }
        for lib in ["BOOT-INF/lib", "WEB-INF/lib"] {
            for jar in super::jars_in(&app.join(lib))? {
                if let Some(caps) = boot_jar_pattern().captures(&jar) {
                    return Ok(Some(caps[1].to_string()));
                }
            }
        }
        Ok(None)
    }

    fn launcher(packaging: Packaging, version: Option<&str>, manifest: Option<&Manifest>) -> String {
        if let Some(main) = manifest.and_then(|m| m.main_class()) {
            if KNOWN_LAUNCHERS.contains(&main) {
                return main.to_string();
            }
        }

        let major = version
            .and_then(|v| v.split('.').next())
            .and_then(|m| m.parse::<u32>().ok())
            .unwrap_or(2);
        let package = if major >= 3 { LOADER } else { LEGACY_LOADER };
        let class = match packaging {
            Packaging::Jar => "JarLauncher",
            Packaging::War => "WarLauncher",
        };
        format!("{}.{}", package, class)
    }
}

impl Provider for SpringBoot {
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

        let app = ctx.app_dir();
        let manifest = Manifest::read(app)?;
        let declared = manifest
            .as_ref()
            .and_then(|m| m.get("Spring-Boot-Version"))
            .is_some();
        let packaging = Self::packaging(app)?;

        // a WAR without Spring Boot evidence belongs to Tomcat
        let is_boot = match packaging {
            Some(Packaging::Jar) => true,
            Some(Packaging::War) => declared || Self::version(app, manifest.as_ref())?.is_some(),
            None => declared,
        };
        if !is_boot {
            return Ok(None);
        }

        Ok(Some(match Self::version(app, manifest.as_ref())? {
            Some(version) => versioned_tag(Self::ID, &version),
            None => plain_tag(Self::ID),
        }))
    }

    fn supply(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }
}

impl Container for SpringBoot {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let app = ctx.app_dir();
        let manifest = Manifest::read(app)?;
        let packaging = Self::packaging(app)?.unwrap_or(Packaging::Jar);
        let version = Self::version(app, manifest.as_ref())?;
        let launcher = Self::launcher(packaging, version.as_deref(), manifest.as_ref());
        debug!(launcher = %launcher, version = ?version, "Spring Boot launcher");

        Ok(format!(
            "eval exec {} $JAVA_OPTS -cp $HOME/. {}",
            JAVA_BIN, launcher
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildpackError;
    use crate::testutil::{config, TestEnv};

    #[test]
    fn test_detects_boot_inf_with_version() {
        let env = TestEnv::new();
        env.app_dir("BOOT-INF/classes");
        env.app_file(
            "META-INF/MANIFEST.MF",
            "Main-Class: org.springframework.boot.loader.JarLauncher\nSpring-Boot-Version: 2.7.0\n",
        );
        let cfg = config(&[]);
        let tag = SpringBoot.detect(&env.ctx(&cfg)).unwrap();
        assert_eq!(tag.as_deref(), Some("spring-boot=2.7.0"));
    }

    #[test]
    fn test_version_from_bundled_jar() {
        let env = TestEnv::new();
        env.app_file("BOOT-INF/lib/spring-boot-3.2.1.jar", "");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        assert_eq!(
            SpringBoot.detect(&ctx).unwrap().as_deref(),
            Some("spring-boot=3.2.1")
        );
        assert_eq!(
            SpringBoot.release(&ctx).unwrap(),
            "eval exec $JAVA_HOME/bin/java $JAVA_OPTS -cp $HOME/. org.springframework.boot.loader.launch.JarLauncher"
        );
    }

    #[test]
    fn test_legacy_launcher_for_2x() {
        let env = TestEnv::new();
        env.app_dir("BOOT-INF");
        env.app_file("META-INF/MANIFEST.MF", "Spring-Boot-Version: 2.7.0\n");
        let cfg = config(&[]);
        let release = SpringBoot.release(&env.ctx(&cfg)).unwrap();
        assert!(release.ends_with(" org.springframework.boot.loader.JarLauncher"));
    }

    #[test]
    fn test_manifest_launcher_wins() {
        let env = TestEnv::new();
        env.app_dir("BOOT-INF");
        env.app_file(
            "META-INF/MANIFEST.MF",
            "Main-Class: org.springframework.boot.loader.PropertiesLauncher\nSpring-Boot-Version: 3.1.0\n",
        );
        let cfg = config(&[]);
        let release = SpringBoot.release(&env.ctx(&cfg)).unwrap();
        assert!(release.ends_with(" org.springframework.boot.loader.PropertiesLauncher"));
    }

    #[test]
    fn test_war_uses_war_launcher() {
        let env = TestEnv::new();
        env.app_file("WEB-INF/lib/spring-boot-2.5.4.jar", "");
        let cfg = config(&[]);
        let ctx = env.ctx(&cfg);
        assert!(SpringBoot.detect(&ctx).unwrap().is_some());
        assert!(SpringBoot
            .release(&ctx)
            .unwrap()
            .ends_with(" org.springframework.boot.loader.WarLauncher"));
    }

    #[test]
    fn test_plain_war_is_not_spring_boot() {
        let env = TestEnv::new();
        env.app_file("WEB-INF/web.xml", "<web-app/>");
        let cfg = config(&[]);
        assert_eq!(SpringBoot.detect(&env.ctx(&cfg)).unwrap(), None);
    }

    #[test]
    fn test_both_layouts_is_ambiguous() {
        let env = TestEnv::new();
        env.app_dir("BOOT-INF");
        env.app_dir("WEB-INF");
        let cfg = config(&[]);
        assert!(matches!(
            SpringBoot.detect(&env.ctx(&cfg)),
            Err(BuildpackError::AmbiguousMatch { .. })
        ));
    }

    #[test]
    fn test_disabled() {
        let env = TestEnv::new();
        env.app_dir("BOOT-INF");
        let cfg = config(&[("JBP_CONFIG_SPRING_BOOT", "{enabled: false}")]);
        assert_eq!(SpringBoot.detect(&env.ctx(&cfg)).unwrap(), None);
    }
}
