// ABOUTME: Terminal rendering for marmot commands
// ABOUTME: Status lines, access URLs and the webapp table

use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use marmot_scaffold::{InitNotice, InitReport};
use marmot_server::{AccessUrls, AppRecord, AppStatus, RemoveOutcome, StartOutcome, StopOutcome};

pub fn success(message: impl AsRef<str>) -> String {
    format!("{} {}", "[√]".green(), message.as_ref().green())
}

pub fn notice(message: impl AsRef<str>) -> String {
    format!("{} {}", "[i]".yellow(), message.as_ref().yellow())
}

pub fn status_label(status: AppStatus) -> ColoredString {
    match status {
        AppStatus::Online => status.as_str().green(),
        AppStatus::Stopped => status.as_str().red(),
    }
}

pub fn access_urls(urls: &AccessUrls) -> String {
    let mut out = format!(
        "Access URLs:\n----------------------\n   Local: {}",
        urls.local.magenta()
    );
    if let Some(external) = &urls.external {
        out.push_str(&format!("\nExternal: {}", external.magenta()));
    }
    out
}

pub fn started(outcome: &StartOutcome) -> String {
    let mut lines = Vec::new();
    if let Some(version) = &outcome.java_version {
        lines.push(format!("{} {}", "JRE version:".cyan(), version.magenta()));
    }
    if let Some(pid) = outcome.replaced_pid {
        lines.push(notice(format!(
            "Previous instance of '{}' (PID {}) was terminated",
            outcome.record.name, pid
        )));
    }
    lines.push(String::new());
    lines.push(access_urls(&outcome.urls));
    lines.push(String::new());
    lines.push(success(format!(
        "webapp '{}' on port '{}' has started successfully",
        outcome.record.name, outcome.record.port
    )));
    lines.join("\n")
}

pub fn stopped(outcome: &StopOutcome) -> String {
    if matches!(outcome, StopOutcome::NothingFound) {
        return notice("Didn't find any webapp that can be stopped");
    }

    let mut lines: Vec<String> = outcome
        .stopped()
        .into_iter()
        .map(|record| {
            success(format!(
                "webapp on port '{}' has stopped successfully",
                record.port
            ))
        })
        .collect();
    lines.extend(outcome.already_stopped().into_iter().map(|record| {
        notice(format!(
            "webapp on port '{}' was already stopped",
            record.port
        ))
    }));
    lines.join("\n")
}

pub fn removed(outcome: &RemoveOutcome) -> String {
    match outcome {
        RemoveOutcome::NothingFound => notice("Can't find any webapp that can be deleted"),
        RemoveOutcome::Removed(apps) => apps
            .iter()
            .map(|app| {
                success(format!(
                    "Webapp on port '{}' has removed successfully",
                    app.record.port
                ))
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn records_table(records: &[AppRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["id", "name", "port", "pid", "status", "pathname"]);

    for record in records {
        table.add_row(vec![
            record.id.to_string(),
            record.name.magenta().to_string(),
            record.port.to_string(),
            record.pid_display(),
            status_label(record.status).to_string(),
            record.pathname.display().to_string().cyan().to_string(),
        ]);
    }

    table
}

pub fn initialized(report: &InitReport) -> String {
    let mut lines: Vec<String> = report
        .notices
        .iter()
        .map(|n| match n {
            InitNotice::WebInfExists => notice(
                "WEB-INF directory already exists in the current directory, if you want to force initialize, do 'marmot init -f'",
            ),
            InitNotice::ToolsFileMissing { path } => notice(format!(
                "The {} file does not exist in the current directory, if you want to use it, create it and execute 'marmot init -f' again",
                path
            )),
        })
        .collect();

    for engine in &report.engines_configured {
        lines.push(success(format!("{} initialized is complete", engine)));
    }
    if report.web_xml_written {
        lines.push(success("Project initialized"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marmot_server::{AffectedApp, KillOutcome};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn record(id: u64, status: AppStatus) -> AppRecord {
        AppRecord {
            id,
            name: format!("app{}", id),
            port: 8080 + id as u16,
            pid: (status == AppStatus::Online).then_some(4000 + id as u32),
            status,
            pathname: PathBuf::from(format!("/work/app{}", id)),
        }
    }

    #[test]
    fn test_table_lists_every_record() {
        colored::control::set_override(false);
        let table = records_table(&[record(1, AppStatus::Online), record(2, AppStatus::Stopped)]);
        let rendered = table.to_string();
        assert!(rendered.contains("pathname"));
        assert!(rendered.contains("app1"));
        assert!(rendered.contains("4001"));
        assert!(rendered.contains("online"));
        assert!(rendered.contains("--"));
        assert!(rendered.contains("/work/app2"));
    }

    #[test]
    fn test_stop_messages() {
        colored::control::set_override(false);
        let outcome = StopOutcome::Stopped(vec![
            AffectedApp {
                record: record(1, AppStatus::Stopped),
                kill: Some(KillOutcome::Terminated),
            },
            AffectedApp {
                record: record(2, AppStatus::Stopped),
                kill: None,
            },
        ]);
        assert_eq!(
            stopped(&outcome),
            "[√] webapp on port '8081' has stopped successfully\n[i] webapp on port '8082' was already stopped"
        );
        assert_eq!(
            stopped(&StopOutcome::NothingFound),
            "[i] Didn't find any webapp that can be stopped"
        );
    }

    #[test]
    fn test_access_urls_without_external() {
        colored::control::set_override(false);
        let urls = AccessUrls {
            local: "http://127.0.0.1:8080".to_string(),
            external: None,
        };
        assert_eq!(
            access_urls(&urls),
            "Access URLs:\n----------------------\n   Local: http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_init_report_messages() {
        colored::control::set_override(false);
        let report = InitReport {
            notices: vec![InitNotice::WebInfExists],
            ..InitReport::default()
        };
        let text = initialized(&report);
        assert!(text.starts_with("[i] WEB-INF directory already exists"));
        assert!(!text.contains("[√]"));
    }
}
