use marmot_config::WorkingContext;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::questions::{complete_answers, Prompter};
use crate::rc::{Engine, InitOptions, MarmotRc};
use crate::templates::{velocity_properties, with_leading_slash, ServletTemplate, ROUTER_XML};
use crate::vendor::{
    copy_into, extract_tar_gz, vendored, FREEMARKER_JAR, SKELETON_ARCHIVE, VELOCITY_ARCHIVE,
};
use crate::web_xml::{WebXml, MOCK_FILTER, REWRITE_FILTER};

const WEB_INF_DIR: &str = "WEB-INF";
const LIB_DIR: &str = "WEB-INF/lib";
const VELOCITY_PROPERTIES_FILE: &str = "WEB-INF/velocity.properties";

/// Something `marmot init` wants the user to know without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitNotice {
    /// `WEB-INF/web.xml` was already there; only `.marmotrc` and the
    /// directories were refreshed.
    WebInfExists,
    /// The configured velocity tools file is absent, so the servlet is
    /// configured without it.
    ToolsFileMissing { path: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Directories and files created by this run.
    pub created: Vec<PathBuf>,
    pub notices: Vec<InitNotice>,
    pub engines_configured: Vec<Engine>,
    pub web_xml_written: bool,
}

/// Resolve a project-relative path that may be written with a leading `/`.
fn project_path(project: &Path, relative: &str) -> PathBuf {
    let trimmed = relative.trim().trim_start_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    project.join(trimmed)
}

fn create_dir(path: PathBuf, report: &mut InitReport) -> ScaffoldResult<()> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(&path).map_err(|e| ScaffoldError::io(&path, e))?;
    report.created.push(path);
    Ok(())
}

/// Scaffold the project in `context.cwd()` as a marmot webapp.
pub fn run_init(
    context: &WorkingContext,
    force: bool,
    prompter: &mut dyn Prompter,
) -> ScaffoldResult<InitReport> {
    let project = context.cwd();
    let web_inf = project.join(WEB_INF_DIR);
    let mut report = InitReport::default();

    if force && web_inf.exists() {
        info!("Removing {:?} before re-initializing", web_inf);
        fs::remove_dir_all(&web_inf).map_err(|e| ScaffoldError::io(&web_inf, e))?;
    }

    let rc_path = context.rc_path();
    let stored = MarmotRc::load(&rc_path);
    let answers = complete_answers(stored, prompter)?;
    answers.save(&rc_path)?;
    debug!("Saved answers to {:?}", rc_path);

    let options = InitOptions::from_rc(&answers);

    create_dir(project_path(project, &options.mock), &mut report)?;
    create_dir(project_path(project, &options.template), &mut report)?;

    let router = project_path(project, &options.router);
    if !router.exists() {
        if let Some(parent) = router.parent() {
            fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
        }
        fs::write(&router, ROUTER_XML).map_err(|e| ScaffoldError::io(&router, e))?;
        report.created.push(router);
    }

    let web_xml_path = context.web_xml_path();
    if web_xml_path.exists() {
        warn!("{:?} already exists, skipping WEB-INF setup", web_xml_path);
        report.notices.push(InitNotice::WebInfExists);
        return Ok(report);
    }

    let vendor_dir = context.vendor_dir();
    extract_tar_gz(&vendored(vendor_dir, SKELETON_ARCHIVE)?, project, 0)?;
    report.created.push(web_inf);

    let content = fs::read_to_string(&web_xml_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScaffoldError::WebXmlMissing {
            path: web_xml_path.clone(),
        },
        _ => ScaffoldError::io(&web_xml_path, e),
    })?;
    let mut web_xml = WebXml::new(content);

    web_xml.add_filter_params(REWRITE_FILTER, &[("routerFile", options.router.as_str())]);
    web_xml.add_filter_params(MOCK_FILTER, &[("mockDir", options.mock.as_str())]);
    web_xml.add_filter_url_patterns(MOCK_FILTER, &options.extensions());

    let lib = project.join(LIB_DIR);
    let template_dir = with_leading_slash(&options.template);
    let mut servlets = String::new();

    if options.uses(Engine::Velocity) {
        let tools = match options.tools.as_deref() {
            Some(tools) if project_path(project, tools).is_file() => Some(tools.to_string()),
            Some(tools) => {
                warn!("Velocity tools file {} does not exist", tools);
                report.notices.push(InitNotice::ToolsFileMissing {
                    path: tools.to_string(),
                });
                None
            }
            None => None,
        };

        extract_tar_gz(&vendored(vendor_dir, VELOCITY_ARCHIVE)?, &lib, 1)?;

        let properties = project.join(VELOCITY_PROPERTIES_FILE);
        fs::write(&properties, velocity_properties(&template_dir))
            .map_err(|e| ScaffoldError::io(&properties, e))?;
        report.created.push(properties);

        servlets.push_str(
            &ServletTemplate::Velocity {
                extension: options.vextension.clone(),
                tools,
            }
            .render(),
        );
        report.engines_configured.push(Engine::Velocity);
    }

    if options.uses(Engine::Freemarker) {
        let jar = copy_into(&vendored(vendor_dir, FREEMARKER_JAR)?, &lib)?;
        report.created.push(jar);

        servlets.push_str(
            &ServletTemplate::Freemarker {
                extension: options.fextension.clone(),
                template_path: template_dir.clone(),
                tag_syntax: options.tag_syntax,
            }
            .render(),
        );
        report.engines_configured.push(Engine::Freemarker);
    }

    if !servlets.is_empty() && !web_xml.insert_after_last_filter_mapping(&servlets) {
        warn!("{:?} has no </web-app>, servlets were not added", web_xml_path);
    }

    fs::write(&web_xml_path, web_xml.into_string())
        .map_err(|e| ScaffoldError::io(&web_xml_path, e))?;
    report.web_xml_written = true;

    info!(
        "Initialized {:?} with engines {:?}",
        project, report.engines_configured
    );
    Ok(report)
}
