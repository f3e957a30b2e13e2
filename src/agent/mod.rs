//! Supporting agents
//!
//! Every matching agent is used. Agents are independent of each other: one
//! agent failing to resolve or install is logged and the rest carry on.

mod debug;
mod java_opts;
mod service;

pub use debug::RemoteDebug;
pub use java_opts::JavaOpts;
pub use service::{ServiceAgent, ServiceAgentSpec};

use crate::config::ServiceBinding;
use crate::provider::{Agent, AgentId};
use crate::util::shell;

/// `-Dname=value` with the value kept literal through the `JAVA_OPTS` export
fn property(name: &str, value: &str) -> String {
    format!("-D{}={}", name, shell::literal(value))
}

fn app_dynamics(jar: &str, binding: &ServiceBinding) -> Vec<String> {
    let mut opts = vec![format!("-javaagent:{}", jar)];
    let credentials = [
        ("host-name", "appdynamics.controller.hostName"),
        ("port", "appdynamics.controller.port"),
        ("ssl-enabled", "appdynamics.controller.ssl.enabled"),
        ("account-name", "appdynamics.agent.accountName"),
        ("account-access-key", "appdynamics.agent.accountAccessKey"),
        ("application-name", "appdynamics.agent.applicationName"),
        ("tier-name", "appdynamics.agent.tierName"),
    ];
    for (key, name) in credentials {
        if let Some(value) = binding.credential(key) {
            opts.push(property(name, &value));
        }
    }
    opts.push("-Dappdynamics.agent.nodeName=$(hostname)-$CF_INSTANCE_INDEX".to_string());
    opts
}

fn new_relic(jar: &str, binding: &ServiceBinding) -> Vec<String> {
    let mut opts = vec![format!("-javaagent:{}", jar)];
    if let Some(key) = binding
        .credential("licenseKey")
        .or_else(|| binding.credential("license_key"))
    {
        opts.push(property("newrelic.config.license_key", &key));
    }
    if let Some(app_name) = binding.credential("app_name") {
        opts.push(property("newrelic.config.app_name", &app_name));
    }
    opts.push("-Dnewrelic.config.log_file_name=STDOUT".to_string());
    opts
}

fn jacoco(jar: &str, binding: &ServiceBinding) -> Vec<String> {
    let mut args = vec!["output=tcpclient".to_string()];
    for key in ["address", "port", "includes", "excludes"] {
        if let Some(value) = binding.credential(key) {
            args.push(format!("{}={}", key, shell::literal(&value)));
        }
    }
    vec![format!("-javaagent:{}={}", jar, args.join(","))]
}

fn contrast_security(jar: &str, binding: &ServiceBinding) -> Vec<String> {
    let mut opts = vec![
        format!("-javaagent:{}", jar),
        "-Dcontrast.dir=$TMPDIR".to_string(),
    ];
    if let Some(url) = binding.credential("teamserver_url") {
        opts.push(property(
            "contrast.api.url",
            &format!("{}/Contrast", url.trim_end_matches('/')),
        ));
    }
    for (key, name) in [
        ("api_key", "contrast.api.api_key"),
        ("service_key", "contrast.api.service_key"),
        ("username", "contrast.api.user_name"),
    ] {
        if let Some(value) = binding.credential(key) {
            opts.push(property(name, &value));
        }
    }
    opts
}

/// Binding-driven agents, in registration order
pub fn service_agent_specs() -> Vec<ServiceAgentSpec> {
    vec![
        ServiceAgentSpec {
            id: AgentId::AppDynamics,
            filters: &["appdynamics", "app-dynamics"],
            required_credentials: &["host-name"],
            dependency: "appdynamics",
            jar_pattern: r"^javaagent\.jar$",
            options: app_dynamics,
        },
        ServiceAgentSpec {
            id: AgentId::NewRelic,
            filters: &["newrelic", "new-relic"],
            required_credentials: &["licenseKey"],
            dependency: "newrelic",
            jar_pattern: r"^new-?relic.*\.jar$",
            options: new_relic,
        },
        ServiceAgentSpec {
            id: AgentId::Jacoco,
            filters: &["jacoco"],
            required_credentials: &["address"],
            dependency: "jacoco",
            jar_pattern: r"^jacocoagent\.jar$",
            options: jacoco,
        },
        ServiceAgentSpec {
            id: AgentId::ContrastSecurity,
            filters: &["contrast-security"],
            required_credentials: &["api_key", "service_key", "teamserver_url", "username"],
            dependency: "contrast-security",
            jar_pattern: r"^contrast-agent.*\.jar$",
            options: contrast_security,
        },
    ]
}

/// The agent catalog in registration order
pub fn default_agents() -> Vec<Box<dyn Agent>> {
    let mut agents: Vec<Box<dyn Agent>> = service_agent_specs()
        .into_iter()
        .map(|spec| Box::new(ServiceAgent::new(spec)) as Box<dyn Agent>)
        .collect();
    agents.push(Box::new(RemoteDebug));
    agents.push(Box::new(JavaOpts));
    agents
}
