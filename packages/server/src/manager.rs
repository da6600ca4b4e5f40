use tracing::{debug, error, info, warn};

use marmot_config::WorkingContext;

use crate::port::check_port;
use crate::process::KillOutcome;
use crate::reconcile::reconcile;
use crate::registry::RegistryStore;
use crate::runtime::{JettyRuntime, ServerRuntime};
use crate::selector::Selector;
use crate::settings::ServerSettings;
use crate::types::{AppRecord, RecordDraft, ServerError, ServerResult};
use crate::urls::AccessUrls;
use crate::validation::{validate_args, ServerArgs};

/// Result of a confirmed start.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// The persisted, online record
    pub record: AppRecord,
    /// Java version detected before launching (not re-checked during restart)
    pub java_version: Option<String>,
    /// Where the webapp can be reached
    pub urls: AccessUrls,
    /// Pid of the directory's previous instance, if one had to be terminated
    pub replaced_pid: Option<u32>,
}

/// A record touched by stop or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedApp {
    /// The record after the operation (before deletion for remove)
    pub record: AppRecord,
    /// `None` when the record had no process to terminate
    pub kill: Option<KillOutcome>,
}

impl AffectedApp {
    pub fn was_running(&self) -> bool {
        self.kill.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(Vec<AffectedApp>),
    NothingFound,
}

impl StopOutcome {
    pub fn stopped(&self) -> Vec<&AppRecord> {
        self.affected().filter(|a| a.was_running()).map(|a| &a.record).collect()
    }

    pub fn already_stopped(&self) -> Vec<&AppRecord> {
        self.affected().filter(|a| !a.was_running()).map(|a| &a.record).collect()
    }

    fn affected(&self) -> impl Iterator<Item = &AffectedApp> {
        let apps: &[AffectedApp] = match self {
            StopOutcome::Stopped(apps) => apps,
            StopOutcome::NothingFound => &[],
        };
        apps.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Vec<AffectedApp>),
    NothingFound,
}

#[derive(Debug, Clone)]
pub struct RestartOutcome {
    pub stopped: StopOutcome,
    pub started: StartOutcome,
}

/// Webapp lifecycle manager.
///
/// Drives start, stop, restart, remove and list against the JSON registry.
/// Every operation is a strictly sequential read-validate-act-persist flow;
/// the registry file is the only state shared between invocations.
pub struct ServerManager<R: ServerRuntime> {
    context: WorkingContext,
    settings: ServerSettings,
    store: RegistryStore,
    runtime: R,
}

impl ServerManager<JettyRuntime> {
    /// Manager backed by the embedded jetty jar, configured from the
    /// environment.
    pub fn from_context(context: WorkingContext) -> Self {
        let settings = ServerSettings::from_env(&context);
        let runtime = JettyRuntime::new(settings.clone());
        Self::new(context, settings, runtime)
    }
}

impl<R: ServerRuntime> ServerManager<R> {
    pub fn new(context: WorkingContext, settings: ServerSettings, runtime: R) -> Self {
        let store = RegistryStore::for_context(&context);
        Self {
            context,
            settings,
            store,
            runtime,
        }
    }

    pub fn context(&self) -> &WorkingContext {
        &self.context
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Start the webapp in the current directory.
    ///
    /// The name defaults to the one already registered for the directory,
    /// then to the directory's basename. The port defaults to the registered
    /// port, then to the configured default. A still-running previous
    /// instance of the directory is terminated first.
    ///
    /// # Errors
    ///
    /// * Validation errors for malformed `--port`, `--id` or `--name`
    /// * `ServerError::JavaNotFound` - `java -version` could not be run
    /// * `ServerError::NotInitialized` - `WEB-INF/web.xml` is missing
    /// * `ServerError::PortOwned` / `ServerError::PortInUse` - port conflicts
    /// * `ServerError::StartupFailed` / `ServerError::ExitedEarly` - jetty did not come up
    /// * `ServerError::Persistence` - the registry could not be written
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use marmot_config::WorkingContext;
    /// use marmot_server::{ServerArgs, ServerManager};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let context = WorkingContext::from_env().unwrap();
    ///     let manager = ServerManager::from_context(context);
    ///
    ///     match manager.start(&ServerArgs::new().port(8080)).await {
    ///         Ok(outcome) => println!("Started at {}", outcome.urls.local),
    ///         Err(e) => eprintln!("Failed to start: {}", e),
    ///     }
    /// }
    /// ```
    pub async fn start(&self, args: &ServerArgs) -> ServerResult<StartOutcome> {
        let args = validate_args(args)?;
        self.start_in(&self.context, args.port, args.name, true).await
    }

    async fn start_in(
        &self,
        context: &WorkingContext,
        port: Option<u16>,
        name: Option<String>,
        check_java: bool,
    ) -> ServerResult<StartOutcome> {
        let pathname = context.cwd().to_path_buf();
        let existing = self.store.find(&Selector::by_pathname(&pathname)).await;

        let name = name
            .or_else(|| {
                existing
                    .as_ref()
                    .map(|r| r.name.clone())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| context.project_name());
        let port = port
            .or_else(|| existing.as_ref().map(|r| r.port))
            .unwrap_or(self.settings.default_port);
        info!("Starting webapp '{}' in {:?} on port {}", name, pathname, port);

        let java_version = if check_java {
            let version = self.runtime.java_version().await?;
            info!("Using java {}", version);
            Some(version)
        } else {
            None
        };

        let web_xml = context.web_xml_path();
        if !web_xml.is_file() {
            return Err(ServerError::NotInitialized { path: web_xml });
        }
        self.runtime.check_binary()?;

        check_port(&self.store, port, &pathname).await?;

        let mut replaced = None;
        if let Some(previous) = existing.as_ref().filter(|r| r.is_online()) {
            if let Some(pid) = previous.pid {
                info!(
                    "Terminating previous instance of '{}' (PID {})",
                    previous.name, pid
                );
                self.runtime.terminate(pid).await;
                replaced = Some(previous.clone());
            }
        }

        let pid = match self.runtime.launch(port, &pathname).await {
            Ok(pid) => pid,
            Err(err) => {
                error!("Failed to start webapp '{}': {}", name, err);
                self.abort_start(&err, replaced.as_ref()).await;
                return Err(err);
            }
        };

        let draft = RecordDraft::online(name, port, pid, pathname)
            .with_id(existing.as_ref().map(|r| r.id));
        let record = match self.store.save(draft).await {
            Ok(record) => record,
            Err(err) => {
                let err = err.with_orphan(pid);
                error!("Webapp started as PID {} but could not be registered: {}", pid, err);
                self.abort_start(&err, None).await;
                return Err(err);
            }
        };

        info!(
            "Webapp '{}' (id {}) started with PID {} on port {}",
            record.name, record.id, pid, record.port
        );
        Ok(StartOutcome {
            urls: AccessUrls::for_port(record.port),
            record,
            java_version,
            replaced_pid: replaced.and_then(|r| r.pid),
        })
    }

    /// Clean up after a failed start: kill the spawned process and make sure
    /// a terminated previous instance is not left looking online.
    async fn abort_start(&self, err: &ServerError, replaced: Option<&AppRecord>) {
        if let Some(orphan) = err.orphan_pid() {
            warn!("Killing orphaned server process {}", orphan);
            self.runtime.terminate(orphan).await;
        }

        if let Some(previous) = replaced {
            let draft = RecordDraft::from(previous.clone()).stopped();
            if let Err(e) = self.store.save(draft).await {
                warn!(
                    "Could not mark previous instance of '{}' as stopped: {}",
                    previous.name, e
                );
            }
        }
    }

    /// Stop every webapp matching the explicit keys, or the current
    /// directory's webapp when none are given.
    ///
    /// Finding nothing is an outcome, not an error.
    pub async fn stop(&self, args: &ServerArgs) -> ServerResult<StopOutcome> {
        let args = validate_args(args)?;
        let selector = args.selector().or_pathname(self.context.cwd());
        self.stop_matching(&selector).await
    }

    async fn stop_matching(&self, selector: &Selector) -> ServerResult<StopOutcome> {
        let matches = self.store.find_all(selector).await;
        if matches.is_empty() {
            info!("No webapp matches {}", selector);
            return Ok(StopOutcome::NothingFound);
        }

        let mut kills = Vec::with_capacity(matches.len());
        for record in &matches {
            let kill = match record.pid {
                Some(pid) => Some(self.runtime.terminate(pid).await),
                None => None,
            };
            kills.push(kill);
        }

        let saved = self
            .store
            .update(|file| {
                matches
                    .into_iter()
                    .map(|record| file.upsert(RecordDraft::from(record).stopped()))
                    .collect::<Vec<_>>()
            })
            .await?;

        let affected = saved
            .into_iter()
            .zip(kills)
            .map(|(record, kill)| AffectedApp { record, kill })
            .collect::<Vec<_>>();
        debug!("Stopped {} webapps", affected.len());
        Ok(StopOutcome::Stopped(affected))
    }

    /// Stop a webapp and start it again in its own directory, keeping its
    /// name and port unless `--port` overrides the port.
    ///
    /// The webapp is selected by `--id` or `--name`, else by the current
    /// directory. Java is checked once, before anything is stopped.
    pub async fn restart(&self, args: &ServerArgs) -> ServerResult<RestartOutcome> {
        let args = validate_args(args)?;
        let lookup = Selector {
            id: args.id,
            name: args.name.clone(),
            ..Selector::default()
        }
        .or_pathname(self.context.cwd());

        let java_version = self.runtime.java_version().await?;
        info!("Using java {}", java_version);

        let target = self.store.find(&lookup).await;
        let (stopped, context, port, name) = match target {
            Some(record) => {
                let stopped = self.stop_matching(&Selector::by_id(record.id)).await?;
                (
                    stopped,
                    self.context.with_cwd(&record.pathname),
                    args.port.or(Some(record.port)),
                    Some(record.name),
                )
            }
            None => {
                debug!("No webapp matches {}, starting fresh", lookup);
                (
                    StopOutcome::NothingFound,
                    self.context.clone(),
                    args.port,
                    args.name,
                )
            }
        };

        let mut started = self.start_in(&context, port, name, false).await?;
        started.java_version = Some(java_version);
        Ok(RestartOutcome { stopped, started })
    }

    /// Terminate and unregister every webapp matching the explicit keys.
    ///
    /// Requires `--id`, `--port` or `--name`; ids are never reused afterwards.
    pub async fn remove(&self, args: &ServerArgs) -> ServerResult<RemoveOutcome> {
        let args = validate_args(args)?;
        let selector = args.selector();
        if selector.is_empty() {
            return Err(ServerError::MissingSelector);
        }

        let matches = self.store.find_all(&selector).await;
        if matches.is_empty() {
            info!("No webapp matches {}", selector);
            return Ok(RemoveOutcome::NothingFound);
        }

        let mut affected = Vec::with_capacity(matches.len());
        for record in matches {
            let kill = match record.pid.filter(|_| record.is_online()) {
                Some(pid) => Some(self.runtime.terminate(pid).await),
                None => None,
            };
            affected.push(AffectedApp { record, kill });
        }

        let removed = self.store.remove_all(&selector).await?;
        info!("Removed {} webapps", removed.len());
        Ok(RemoveOutcome::Removed(affected))
    }

    /// Every registered webapp, after correcting stale online entries.
    pub async fn list(&self) -> ServerResult<Vec<AppRecord>> {
        reconcile(&self.store, &self.runtime).await
    }
}
