use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Two-phase buildpack for JVM applications
#[derive(Parser, Debug)]
#[command(
    name = "javapack",
    about = "Two-phase buildpack for JVM applications",
    version,
    author,
    long_about = "javapack stages JVM applications for container platforms. `supply` \
                  installs the JRE, container and agents an application needs into a \
                  dependency slot; `finalize` configures them and writes the start command."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Report whether the application can be staged",
        long_about = "Runs container, JRE and agent detection against a build directory \
                      without installing anything. Exits with 1 when no container matches.\n\n\
                      Examples:\n  \
                      javapack detect /tmp/app\n  \
                      javapack detect /tmp/app --format json"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Install dependencies into the slot",
        long_about = "Detects the container, JRE and agents and installs their dependencies \
                      into <DEPS_DIR>/<INDEX>.\n\n\
                      Example:\n  \
                      javapack supply /tmp/app /tmp/cache /tmp/deps 0"
    )]
    Supply(StageArgs),

    #[command(
        about = "Configure supplied dependencies and write the start command",
        long_about = "Re-runs detection, verifies it matches what supply recorded, writes \
                      profile.d scripts and JAVA_OPTS, and writes release.yml.\n\n\
                      Example:\n  \
                      javapack finalize /tmp/app /tmp/cache /tmp/deps 0"
    )]
    Finalize(StageArgs),

    #[command(about = "Print the release YAML written by finalize")]
    Release(ReleaseArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application directory")]
    pub build_dir: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "tag",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct StageArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application directory")]
    pub build_dir: PathBuf,

    #[arg(value_name = "CACHE_DIR", help = "Cache directory preserved between stagings")]
    pub cache_dir: PathBuf,

    #[arg(value_name = "DEPS_DIR", help = "Root of the dependency slots")]
    pub deps_dir: PathBuf,

    #[arg(value_name = "INDEX", help = "This buildpack's slot index")]
    pub index: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct ReleaseArgs {
    #[arg(value_name = "DEPS_DIR", help = "Root of the dependency slots")]
    pub deps_dir: PathBuf,

    #[arg(value_name = "INDEX", help = "This buildpack's slot index")]
    pub index: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Just the container tag
    Tag,
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Tag => super::output::OutputFormat::Tag,
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
