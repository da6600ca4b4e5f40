// ABOUTME: Integration tests for `marmot init`
// ABOUTME: Runs the scaffolder against temp projects with generated vendor archives

use flate2::write::GzEncoder;
use flate2::Compression;
use marmot_config::WorkingContext;
use marmot_scaffold::{
    run_init, Answer, Engine, InitNotice, MarmotRc, Prompter, Question, ScaffoldError,
    ScaffoldResult, TagSyntax,
};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SKELETON_WEB_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<web-app xmlns="http://java.sun.com/xml/ns/javaee" version="3.0">
  <filter>
    <filter-name>RewriteFilter</filter-name>
    <filter-class>com.marmot.filter.RewriteFilter</filter-class>
  </filter>
  <filter>
    <filter-name>MockFilter</filter-name>
    <filter-class>com.marmot.filter.MockFilter</filter-class>
  </filter>
  <filter-mapping>
    <filter-name>RewriteFilter</filter-name>
    <url-pattern>/*</url-pattern>
  </filter-mapping>
  <filter-mapping>
    <filter-name>MockFilter</filter-name>
    <url-pattern>*.json</url-pattern>
  </filter-mapping>
</web-app>
"#;

/// Replays answers and records which questions were asked.
struct Scripted {
    answers: VecDeque<Answer>,
    asked: Vec<&'static str>,
}

impl Scripted {
    fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            asked: Vec::new(),
        }
    }

    fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl Prompter for Scripted {
    fn ask(&mut self, question: &Question) -> ScaffoldResult<Answer> {
        self.asked.push(question.key);
        Ok(self
            .answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected question '{}'", question.key)))
    }
}

fn write_archive(path: &Path, files: &[(&str, &str)]) {
    let gz = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(gz);
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

struct Harness {
    _root: TempDir,
    project: PathBuf,
    context: WorkingContext,
}

impl Harness {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("shop");
        let vendor = root.path().join("vendor");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&vendor).unwrap();

        write_archive(
            &vendor.join("marmot.tar.gz"),
            &[
                ("WEB-INF/web.xml", SKELETON_WEB_XML),
                ("WEB-INF/lib/marmot-filters.jar", "filters"),
            ],
        );
        write_archive(
            &vendor.join("velocity.tar.gz"),
            &[
                ("velocity/velocity-1.7.jar", "velocity"),
                ("velocity/velocity-tools-2.0.jar", "tools"),
            ],
        );
        fs::write(vendor.join("freemarker-2.3.23.jar"), "freemarker").unwrap();

        let context = WorkingContext::new(&project, root.path())
            .with_marmot_home(root.path().join(".marmot"))
            .with_vendor_dir(&vendor);

        Self {
            _root: root,
            project,
            context,
        }
    }

    fn write_rc(&self, rc: &MarmotRc) {
        rc.save(&self.project.join(".marmotrc")).unwrap();
    }

    fn web_xml(&self) -> String {
        fs::read_to_string(self.project.join("WEB-INF/web.xml")).unwrap()
    }
}

fn answered(engines: Vec<Engine>) -> MarmotRc {
    MarmotRc {
        engines: Some(engines),
        mock: Some("mock".to_string()),
        template: Some("views".to_string()),
        router: Some("/router/main.xml".to_string()),
        vextension: Some(".vm".to_string()),
        tools: Some(String::new()),
        fextension: Some(".ftl".to_string()),
        tag_syntax: Some(TagSyntax::AutoDetect),
        ..MarmotRc::default()
    }
}

#[test]
fn test_init_with_both_engines() {
    let harness = Harness::new();
    harness.write_rc(&answered(vec![Engine::Velocity, Engine::Freemarker]));

    let mut prompter = Scripted::silent();
    let report = run_init(&harness.context, false, &mut prompter).unwrap();

    assert!(prompter.asked.is_empty());
    assert!(report.web_xml_written);
    assert_eq!(
        report.engines_configured,
        vec![Engine::Velocity, Engine::Freemarker]
    );
    assert!(report.notices.is_empty());

    let project = &harness.project;
    assert!(project.join("mock").is_dir());
    assert!(project.join("views").is_dir());
    assert!(project.join("router/main.xml").is_file());
    assert!(project.join("WEB-INF/lib/marmot-filters.jar").is_file());
    assert!(project.join("WEB-INF/lib/velocity-1.7.jar").is_file());
    assert!(project.join("WEB-INF/lib/velocity-tools-2.0.jar").is_file());
    assert!(project.join("WEB-INF/lib/freemarker-2.3.23.jar").is_file());

    let properties = fs::read_to_string(project.join("WEB-INF/velocity.properties")).unwrap();
    assert!(properties.contains("webapp.resource.loader.path = /views"));

    let web_xml = harness.web_xml();
    assert!(web_xml.contains("<param-name>routerFile</param-name>"));
    assert!(web_xml.contains("<param-value>/router/main.xml</param-value>"));
    assert!(web_xml.contains("<param-name>mockDir</param-name>"));
    assert!(web_xml.contains("<url-pattern>*.vm</url-pattern>"));
    assert!(web_xml.contains("<url-pattern>*.ftl</url-pattern>"));
    assert!(web_xml.contains("org.apache.velocity.tools.view.VelocityLayoutServlet"));
    assert!(web_xml.contains("freemarker.ext.servlet.FreemarkerServlet"));
    assert!(web_xml.contains("<param-value>auto_detect</param-value>"));
    assert!(!web_xml.contains("org.apache.velocity.tools</param-name>"));

    let last_mapping = web_xml.rfind("</filter-mapping>").unwrap();
    let first_servlet = web_xml.find("<servlet>").unwrap();
    assert!(first_servlet > last_mapping);
}

#[test]
fn test_init_asks_missing_questions_and_saves_rc() {
    let harness = Harness::new();
    let mut prompter = Scripted::new(vec![
        Answer::Choices(vec!["freemarker".to_string()]),
        Answer::Text("data".to_string()),
        Answer::Text("templates".to_string()),
        Answer::Text("/router/app.xml".to_string()),
        Answer::Text(".ftl".to_string()),
        Answer::Choice("square_bracket".to_string()),
    ]);

    let report = run_init(&harness.context, false, &mut prompter).unwrap();

    assert_eq!(
        prompter.asked,
        vec!["engines", "mock", "template", "router", "fextension", "tagSyntax"]
    );
    assert_eq!(report.engines_configured, vec![Engine::Freemarker]);

    let rc = MarmotRc::load(&harness.project.join(".marmotrc"));
    assert_eq!(rc.engines, Some(vec![Engine::Freemarker]));
    assert_eq!(rc.mock.as_deref(), Some("data"));
    assert_eq!(rc.router.as_deref(), Some("/router/app.xml"));
    assert_eq!(rc.vextension, None);

    assert!(harness.project.join("data").is_dir());
    assert!(harness.project.join("router/app.xml").is_file());
    assert!(!harness.project.join("WEB-INF/velocity.properties").exists());

    let web_xml = harness.web_xml();
    assert!(web_xml.contains("<param-value>/templates</param-value>"));
    assert!(!web_xml.contains("*.vm"));
}

#[test]
fn test_existing_web_inf_is_left_alone() {
    let harness = Harness::new();
    harness.write_rc(&answered(vec![Engine::Velocity]));
    fs::create_dir_all(harness.project.join("WEB-INF")).unwrap();
    fs::write(harness.project.join("WEB-INF/web.xml"), "<web-app/>").unwrap();

    let report = run_init(&harness.context, false, &mut Scripted::silent()).unwrap();

    assert_eq!(report.notices, vec![InitNotice::WebInfExists]);
    assert!(!report.web_xml_written);
    assert_eq!(harness.web_xml(), "<web-app/>");
    assert!(harness.project.join("mock").is_dir());
}

#[test]
fn test_force_recreates_web_inf() {
    let harness = Harness::new();
    harness.write_rc(&answered(vec![Engine::Velocity]));
    fs::create_dir_all(harness.project.join("WEB-INF/classes")).unwrap();
    fs::write(harness.project.join("WEB-INF/web.xml"), "<web-app/>").unwrap();

    let report = run_init(&harness.context, true, &mut Scripted::silent()).unwrap();

    assert!(report.web_xml_written);
    assert!(!harness.project.join("WEB-INF/classes").exists());
    assert!(harness.web_xml().contains("VelocityLayoutServlet"));
}

#[test]
fn test_velocity_tools_are_wired_only_when_present() {
    let harness = Harness::new();
    let mut rc = answered(vec![Engine::Velocity]);
    rc.tools = Some("config/tools.xml".to_string());
    harness.write_rc(&rc);

    let report = run_init(&harness.context, false, &mut Scripted::silent()).unwrap();
    assert_eq!(
        report.notices,
        vec![InitNotice::ToolsFileMissing {
            path: "config/tools.xml".to_string()
        }]
    );
    assert!(!harness.web_xml().contains("org.apache.velocity.tools</param-name>"));

    fs::create_dir_all(harness.project.join("config")).unwrap();
    fs::write(harness.project.join("config/tools.xml"), "<tools/>").unwrap();
    let report = run_init(&harness.context, true, &mut Scripted::silent()).unwrap();
    assert!(report.notices.is_empty());
    assert!(harness
        .web_xml()
        .contains("<param-value>config/tools.xml</param-value>"));
}

#[test]
fn test_missing_vendor_archive_is_reported() {
    let harness = Harness::new();
    harness.write_rc(&answered(vec![]));
    fs::remove_file(harness.context.vendor_dir().join("marmot.tar.gz")).unwrap();

    let err = run_init(&harness.context, false, &mut Scripted::silent()).unwrap_err();
    assert!(matches!(err, ScaffoldError::VendorMissing { .. }));
}

#[test]
fn test_existing_router_file_is_kept() {
    let harness = Harness::new();
    harness.write_rc(&answered(vec![]));
    fs::create_dir_all(harness.project.join("router")).unwrap();
    fs::write(harness.project.join("router/main.xml"), "<router>mine</router>").unwrap();

    run_init(&harness.context, false, &mut Scripted::silent()).unwrap();

    assert_eq!(
        fs::read_to_string(harness.project.join("router/main.xml")).unwrap(),
        "<router>mine</router>"
    );
}
