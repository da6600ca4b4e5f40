//! Marmot Server - webapp registry and jetty process lifecycle
//!
//! This crate tracks webapps in a JSON registry under the marmot home
//! directory and starts, stops, restarts and removes their embedded jetty
//! processes, reconciling the registry against the OS process table.

pub mod env;
pub mod manager;
pub mod port;
pub mod process;
pub mod reconcile;
pub mod registry;
pub mod runtime;
pub mod selector;
pub mod settings;
pub mod types;
pub mod urls;
pub mod validation;

// Re-export key types and functions for easier use
pub use manager::{
    AffectedApp, RemoveOutcome, RestartOutcome, ServerManager, StartOutcome, StopOutcome,
};
pub use port::{check_port, probe, PortAvailability};
pub use process::{classify_lines, KillOutcome, StartupClassifier, StartupOutcome};
pub use reconcile::reconcile;
pub use registry::{RegistryFile, RegistryStore};
pub use runtime::{JettyRuntime, ServerRuntime};
pub use selector::Selector;
pub use settings::ServerSettings;
pub use types::{AppRecord, AppStatus, RecordDraft, ServerError, ServerResult};
pub use urls::AccessUrls;
pub use validation::{ServerArgs, ValidatedArgs};

use marmot_config::WorkingContext;

/// Initialize a lifecycle manager for the given working context.
///
/// Runtime settings (java executable, jetty jar, default port, kill grace
/// period) are read from the `MARMOT_*` environment variables.
///
/// # Examples
///
/// ```no_run
/// use marmot_config::WorkingContext;
///
/// #[tokio::main]
/// async fn main() {
///     let context = WorkingContext::from_env().expect("Failed to resolve working context");
///     let manager = marmot_server::init(context);
///     let apps = manager.list().await.expect("Failed to list webapps");
///     println!("{} webapps registered", apps.len());
/// }
/// ```
pub fn init(context: WorkingContext) -> ServerManager<JettyRuntime> {
    ServerManager::from_context(context)
}

/// Version information for the server crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
