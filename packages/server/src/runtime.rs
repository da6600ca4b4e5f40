use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::process::{
    detect_java_version, process_command_line, spawn_and_classify, terminate_process, KillOutcome,
};
use crate::settings::ServerSettings;
use crate::types::{ServerError, ServerResult};

/// Everything the lifecycle manager needs from the operating system.
#[async_trait]
pub trait ServerRuntime: Send + Sync {
    /// Version of the Java runtime, or `JavaNotFound`.
    async fn java_version(&self) -> ServerResult<String>;

    /// `ServerBinaryMissing` unless the server binary is installed.
    fn check_binary(&self) -> ServerResult<()>;

    /// Start a server for `webapp_dir` on `port`; returns its pid once it
    /// reports a successful start.
    async fn launch(&self, port: u16, webapp_dir: &Path) -> ServerResult<u32>;

    async fn terminate(&self, pid: u32) -> KillOutcome;

    /// Command line of a live process, `None` when it is not running.
    fn command_line(&self, pid: u32) -> Option<String>;

    /// Text that appears in the command line of every server we launch.
    fn process_marker(&self) -> String;
}

/// Runs webapps with the vendored embedded jetty jar.
#[derive(Debug, Clone)]
pub struct JettyRuntime {
    settings: ServerSettings,
}

impl JettyRuntime {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ServerRuntime for JettyRuntime {
    async fn java_version(&self) -> ServerResult<String> {
        detect_java_version(&self.settings.java).await
    }

    fn check_binary(&self) -> ServerResult<()> {
        let jar = &self.settings.jetty_jar;
        if jar.is_file() {
            Ok(())
        } else {
            Err(ServerError::ServerBinaryMissing { path: jar.clone() })
        }
    }

    async fn launch(&self, port: u16, webapp_dir: &Path) -> ServerResult<u32> {
        self.check_binary()?;
        let jar = &self.settings.jetty_jar;

        let mut command = Command::new(&self.settings.java);
        command
            .arg("-jar")
            .arg(jar)
            .arg("-w")
            .arg(webapp_dir)
            .arg("-p")
            .arg(port.to_string())
            .current_dir(webapp_dir);

        let description = format!(
            "{} -jar {} -w {} -p {}",
            self.settings.java.display(),
            jar.display(),
            webapp_dir.display(),
            port
        );
        debug!("Launching jetty: {}", description);
        spawn_and_classify(command, &description).await
    }

    async fn terminate(&self, pid: u32) -> KillOutcome {
        terminate_process(pid, self.settings.kill_grace).await
    }

    fn command_line(&self, pid: u32) -> Option<String> {
        process_command_line(pid)
    }

    fn process_marker(&self) -> String {
        self.settings.process_marker()
    }
}
