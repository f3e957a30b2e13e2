use crate::catalog::DependencyDescriptor;
use crate::error::{BuildpackError, Category, Result};
use crate::provider::{versioned_tag, Container, ContainerId, Context, Provider};
use crate::util::fs as fsutil;
use std::path::PathBuf;
use tracing::info;

const DEPENDENCY: &str = "tomcat";
const CATALINA: &str = "bin/catalina.sh";

/// `server.xml` with the HTTP port taken from the `http.port` system property
const SERVER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Server port="-1">
  <Listener className="org.apache.catalina.startup.VersionLoggerListener"/>
  <Service name="Catalina">
    <Connector port="${http.port}" protocol="HTTP/1.1" bindOnInit="false" connectionTimeout="20000"/>
    <Engine defaultHost="localhost" name="Catalina">
      <Valve className="org.apache.catalina.valves.RemoteIpValve" protocolHeader="x-forwarded-proto"/>
      <Host name="localhost" appBase="webapps" unpackWARs="false" autoDeploy="false"/>
    </Engine>
  </Service>
</Server>
"#;

/// ROOT context whose document base is resolved from `application.root` at startup
const ROOT_CONTEXT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Context docBase="${application.root}" reloadable="false"/>
"#;

/// Exploded web archive served by Apache Tomcat
pub struct Tomcat;

impl Tomcat {
    const ID: &'static str = ContainerId::Tomcat.as_str();

    fn dependency(ctx: &Context<'_>) -> Result<DependencyDescriptor> {
        let component = ctx.component(Self::ID);
        let constraint = component
            .string(&["tomcat", "version"])
            .or_else(|| component.string(&["version"]));
        ctx.catalog
            .resolve_or_default(DEPENDENCY, constraint.as_deref())
    }

    fn catalina_home(ctx: &Context<'_>) -> Result<PathBuf> {
        let dir = ctx.stager.provider_dir(Self::ID);
        fsutil::find_home(&dir, CATALINA).ok_or(BuildpackError::MissingPriorState {
            provider: Self::ID.to_string(),
            path: dir,
        })
    }
}

impl Provider for Tomcat {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn category(&self) -> Category {
        Category::Container
    }

    fn detect(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        if ctx.component(Self::ID).is_disabled() || !ctx.app_dir().join("WEB-INF").is_dir() {
            return Ok(None);
        }
        let dep = Self::dependency(ctx)?;
        Ok(Some(versioned_tag(Self::ID, &dep.version)))
    }

    fn supply(&self, ctx: &Context<'_>) -> Result<()> {
        let dep = Self::dependency(ctx)?;
        info!("-----> Tomcat {} selected", dep.version);
        ctx.install(Self::ID, &dep)
    }

    fn finalize(&self, ctx: &Context<'_>) -> Result<()> {
        let home = Self::catalina_home(ctx)?;
        fsutil::write_file(&home.join("conf/server.xml"), SERVER_XML)?;
        fsutil::write_file(
            &home.join("conf/Catalina/localhost/ROOT.xml"),
            ROOT_CONTEXT_XML,
        )?;
        fsutil::set_executable(&home.join(CATALINA))
    }
}

impl Container for Tomcat {
    fn release(&self, ctx: &Context<'_>) -> Result<String> {
        let home = ctx.stager.runtime_path(&Self::catalina_home(ctx)?)?;
        Ok(format!(
            "JAVA_OPTS=\"$JAVA_OPTS -Dhttp.port=$PORT -Dapplication.root=$HOME\" exec {}/{} run",
            home, CATALINA
        ))
    }
}
