use tracing::{debug, info};

use crate::registry::{RegistryFile, RegistryStore};
use crate::runtime::ServerRuntime;
use crate::types::{AppRecord, ServerResult};

/// Mark online records whose process is gone (or whose pid now belongs to
/// something other than our server) as stopped. Returns the corrected ids.
pub fn correct_stale_records<R>(file: &mut RegistryFile, runtime: &R) -> Vec<u64>
where
    R: ServerRuntime + ?Sized,
{
    let marker = runtime.process_marker();
    let mut corrected = Vec::new();

    for record in file.list.iter_mut().filter(|r| r.is_online()) {
        if !is_our_server(record, runtime, &marker) {
            info!(
                "Webapp {} ({}) is no longer running, marking it stopped",
                record.id, record.name
            );
            record.mark_stopped();
            corrected.push(record.id);
        }
    }

    corrected
}

fn is_our_server<R>(record: &AppRecord, runtime: &R, marker: &str) -> bool
where
    R: ServerRuntime + ?Sized,
{
    let Some(pid) = record.pid else {
        return false;
    };

    match runtime.command_line(pid) {
        Some(command_line) if command_line.contains(marker) => true,
        Some(command_line) => {
            debug!(
                "PID {} is alive but runs '{}', not our server (pid reuse)",
                pid, command_line
            );
            false
        }
        None => false,
    }
}

/// Load the registry, correct drift against the process table and persist
/// the corrections in one write.
pub async fn reconcile<R>(store: &RegistryStore, runtime: &R) -> ServerResult<Vec<AppRecord>>
where
    R: ServerRuntime + ?Sized,
{
    let mut file = store.load().await;
    let corrected = correct_stale_records(&mut file, runtime);
    if !corrected.is_empty() {
        store.write(&file).await?;
    }
    Ok(file.list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::KillOutcome;
    use crate::types::{AppStatus, RecordDraft, ServerResult};
    use async_trait::async_trait;
    use mockall::{mock, predicate::*};
    use std::path::Path;

    mock! {
        Runtime {}

        #[async_trait]
        impl ServerRuntime for Runtime {
            async fn java_version(&self) -> ServerResult<String>;
            fn check_binary(&self) -> ServerResult<()>;
            async fn launch(&self, port: u16, webapp_dir: &Path) -> ServerResult<u32>;
            async fn terminate(&self, pid: u32) -> KillOutcome;
            fn command_line(&self, pid: u32) -> Option<String>;
            fn process_marker(&self) -> String;
        }
    }

    fn registry() -> RegistryFile {
        let mut file = RegistryFile::default();
        file.upsert(RecordDraft::online("alive", 8080, 100, "/work/alive"));
        file.upsert(RecordDraft::online("dead", 8081, 200, "/work/dead"));
        file.upsert(RecordDraft::online("reused", 8082, 300, "/work/reused"));
        file.upsert(RecordDraft::online("idle", 8083, 400, "/work/idle").stopped());
        file
    }

    fn runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_process_marker()
            .return_const("embedded-jetty-server-standalone.jar".to_string());
        runtime
            .expect_command_line()
            .with(eq(100))
            .return_const(Some(
                "java -jar /home/me/.marmot/vendor/embedded-jetty-server-standalone.jar -w /work/alive -p 8080"
                    .to_string(),
            ));
        runtime
            .expect_command_line()
            .with(eq(200))
            .return_const(None);
        runtime
            .expect_command_line()
            .with(eq(300))
            .return_const(Some("/usr/sbin/sshd -D".to_string()));
        runtime
    }

    #[test]
    fn test_stale_records_are_corrected() {
        let mut file = registry();
        let corrected = correct_stale_records(&mut file, &runtime());
        assert_eq!(corrected, vec![2, 3]);

        let status: Vec<_> = file.list.iter().map(|r| (r.status, r.pid)).collect();
        assert_eq!(
            status,
            vec![
                (AppStatus::Online, Some(100)),
                (AppStatus::Stopped, None),
                (AppStatus::Stopped, None),
                (AppStatus::Stopped, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_reconcile_persists_corrections() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("apps.json"));
        store.write(&registry()).await.unwrap();

        let records = reconcile(&store, &runtime()).await.unwrap();
        assert_eq!(records.len(), 4);

        let reloaded = store.load().await;
        assert_eq!(reloaded.list, records);
        assert!(!reloaded.list[1].is_online());
    }

    #[tokio::test]
    async fn test_reconcile_without_drift_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("apps.json"));

        let mut runtime = MockRuntime::new();
        runtime.expect_process_marker().return_const("jetty.jar".to_string());
        runtime.expect_command_line().never();

        let records = reconcile(&store, &runtime).await.unwrap();
        assert!(records.is_empty());
        assert!(!store.path().exists());
    }
}
