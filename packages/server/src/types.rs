use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder written to the registry when a record has no process.
pub const PID_SENTINEL: &str = "--";

/// Status of a registered webapp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Online,
    Stopped,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Online => "online",
            AppStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One managed webapp as persisted in `apps.json`.
///
/// `pathname` is the natural key: a project directory runs at most one
/// supervised instance. `pid` is only meaningful while the record is online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: u64,
    #[serde(default, alias = "domain")]
    pub name: String,
    pub port: u16,
    #[serde(default, with = "pid_field")]
    pub pid: Option<u32>,
    pub status: AppStatus,
    pub pathname: PathBuf,
}

impl AppRecord {
    pub fn is_online(&self) -> bool {
        self.status == AppStatus::Online
    }

    /// Transition to stopped; the pid always goes with it.
    pub fn mark_stopped(&mut self) {
        self.status = AppStatus::Stopped;
        self.pid = None;
    }

    /// Pid as shown to users, `--` when there is none.
    pub fn pid_display(&self) -> String {
        self.pid
            .map(|pid| pid.to_string())
            .unwrap_or_else(|| PID_SENTINEL.to_string())
    }
}

/// Record contents handed to the registry for an upsert. `id` is `None` for an
/// application the registry has never seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub id: Option<u64>,
    pub name: String,
    pub port: u16,
    pub pid: Option<u32>,
    pub status: AppStatus,
    pub pathname: PathBuf,
}

impl RecordDraft {
    pub fn online(name: impl Into<String>, port: u16, pid: u32, pathname: impl Into<PathBuf>) -> Self {
        Self {
            id: None,
            name: name.into(),
            port,
            pid: Some(pid),
            status: AppStatus::Online,
            pathname: pathname.into(),
        }
    }

    pub fn with_id(mut self, id: Option<u64>) -> Self {
        self.id = id;
        self
    }

    pub fn stopped(mut self) -> Self {
        self.status = AppStatus::Stopped;
        self.pid = None;
        self
    }
}

impl From<AppRecord> for RecordDraft {
    fn from(record: AppRecord) -> Self {
        Self {
            id: Some(record.id),
            name: record.name,
            port: record.port,
            pid: record.pid,
            status: record.status,
            pathname: record.pathname,
        }
    }
}

/// Serde adapter for the registry's pid column: a number while a process is
/// attached, `"--"` otherwise. Legacy files wrote an empty string or `0`.
mod pid_field {
    use super::PID_SENTINEL;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(pid: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match pid {
            Some(pid) => serializer.serialize_u32(*pid),
            None => serializer.serialize_str(PID_SENTINEL),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPid {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawPid>::deserialize(deserializer)?;
        let pid = match raw {
            Some(RawPid::Number(value)) => u32::try_from(value).ok(),
            Some(RawPid::Text(text)) => text.trim().parse::<u32>().ok(),
            None => None,
        };
        Ok(pid.filter(|pid| *pid != 0))
    }
}

/// Error types for webapp registry and lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid port '{value}': expected an integer between 1 and 65535")]
    InvalidPort { value: String },

    #[error("Invalid webapp id '{value}': expected a non-negative integer")]
    InvalidId { value: String },

    #[error("Invalid webapp name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("You must specify the webapp with '--port', '--id' or '--name'")]
    MissingSelector,

    #[error("Please install java in your PATH or set JAVA_HOME ({reason})")]
    JavaNotFound { reason: String },

    #[error("Please initialize the project first ({} not found), run 'marmot init'", .path.display())]
    NotInitialized { path: PathBuf },

    #[error("The marmot installation is incomplete: {} not found", .path.display())]
    ServerBinaryMissing { path: PathBuf },

    #[error("The port {port} is already used by webapp '{owner}' ({})", .pathname.display())]
    PortOwned {
        port: u16,
        owner: String,
        pathname: PathBuf,
    },

    #[error("The port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("Failed to spawn process '{command}': {error}")]
    SpawnFailed { command: String, error: String },

    #[error("Server process {pid} reported an error during startup:\n{output}")]
    StartupFailed { pid: u32, output: String },

    #[error("Server process {pid} exited before it reported a successful start\n{output}")]
    ExitedEarly { pid: u32, output: String },

    #[error("Failed to write webapp registry {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        pid: Option<u32>,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Pid of a process that was spawned but must not outlive the failure.
    pub fn orphan_pid(&self) -> Option<u32> {
        match self {
            ServerError::StartupFailed { pid, .. } | ServerError::ExitedEarly { pid, .. } => {
                Some(*pid)
            }
            ServerError::Persistence { pid, .. } => *pid,
            _ => None,
        }
    }

    /// Attach the pid of a freshly spawned server to a persistence failure.
    pub fn with_orphan(self, orphan: u32) -> Self {
        match self {
            ServerError::Persistence { path, source, .. } => ServerError::Persistence {
                path,
                pid: Some(orphan),
                source,
            },
            other => other,
        }
    }

    /// Whether the error comes from argument validation (nothing was touched).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidPort { .. }
                | ServerError::InvalidId { .. }
                | ServerError::InvalidName { .. }
                | ServerError::MissingSelector
        )
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
