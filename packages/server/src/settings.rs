use std::path::{Path, PathBuf};
use std::time::Duration;

use marmot_config::constants::{
    JAVA_HOME, JETTY_JAR_NAME, MARMOT_DEFAULT_PORT, MARMOT_JAVA, MARMOT_JETTY_JAR,
    MARMOT_KILL_GRACE_MS,
};
use marmot_config::WorkingContext;

use crate::env::{parse_env_or_default_with_validation, parse_env_path};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_KILL_GRACE_MS: u64 = 5000;

/// Runtime settings for launching and stopping jetty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub java: PathBuf,
    pub jetty_jar: PathBuf,
    pub default_port: u16,
    pub kill_grace: Duration,
}

impl ServerSettings {
    /// Defaults derived from the context: `java` from `PATH`, the jetty jar in
    /// the vendor directory.
    pub fn for_context(context: &WorkingContext) -> Self {
        Self {
            java: PathBuf::from("java"),
            jetty_jar: context.vendor_dir().join(JETTY_JAR_NAME),
            default_port: DEFAULT_PORT,
            kill_grace: Duration::from_millis(DEFAULT_KILL_GRACE_MS),
        }
    }

    /// Defaults overridden by `MARMOT_*` environment variables.
    pub fn from_env(context: &WorkingContext) -> Self {
        let defaults = Self::for_context(context);

        let java = parse_env_path(MARMOT_JAVA)
            .or_else(|| parse_env_path(JAVA_HOME).map(|home| home.join("bin").join(java_binary())))
            .unwrap_or(defaults.java);
        let jetty_jar = parse_env_path(MARMOT_JETTY_JAR).unwrap_or(defaults.jetty_jar);
        let default_port =
            parse_env_or_default_with_validation(MARMOT_DEFAULT_PORT, DEFAULT_PORT, |p| p > 0);
        let grace_ms =
            parse_env_or_default_with_validation(MARMOT_KILL_GRACE_MS, DEFAULT_KILL_GRACE_MS, |ms| {
                ms <= 600_000
            });

        Self {
            java,
            jetty_jar,
            default_port,
            kill_grace: Duration::from_millis(grace_ms),
        }
    }

    /// Marker that identifies our server in a process command line.
    pub fn process_marker(&self) -> String {
        jar_marker(&self.jetty_jar)
    }
}

pub(crate) fn jar_marker(jar: &Path) -> String {
    jar.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| JETTY_JAR_NAME.to_string())
}

fn java_binary() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}
