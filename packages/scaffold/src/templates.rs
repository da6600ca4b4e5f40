// ABOUTME: Text templates for generated project files
// ABOUTME: web.xml fragments, velocity.properties and the router skeleton

use crate::rc::TagSyntax;

pub const VELOCITY_SERVLET_CLASS: &str = "org.apache.velocity.tools.view.VelocityLayoutServlet";
pub const FREEMARKER_SERVLET_CLASS: &str = "freemarker.ext.servlet.FreemarkerServlet";
pub const VELOCITY_PROPERTIES_PATH: &str = "/WEB-INF/velocity.properties";

pub const ROUTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<router>
  <routes>
    <!-- <route rule="/" location="/index.vm"/> -->
  </routes>
  <!-- <import src="product.xml"/> -->
</router>
"#;

/// `<init-param>` elements, one per pair, indented for a `<filter>` or
/// `<servlet>` body.
pub fn xml_params(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "    <init-param>\n      <param-name>{}</param-name>\n      <param-value>{}</param-value>\n    </init-param>\n",
                escape_xml(name),
                escape_xml(value)
            )
        })
        .collect()
}

/// A template engine servlet and its mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServletTemplate {
    Velocity {
        extension: String,
        tools: Option<String>,
    },
    Freemarker {
        extension: String,
        template_path: String,
        tag_syntax: TagSyntax,
    },
}

impl ServletTemplate {
    fn name(&self) -> &'static str {
        match self {
            ServletTemplate::Velocity { .. } => "velocity",
            ServletTemplate::Freemarker { .. } => "freemarker",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            ServletTemplate::Velocity { .. } => VELOCITY_SERVLET_CLASS,
            ServletTemplate::Freemarker { .. } => FREEMARKER_SERVLET_CLASS,
        }
    }

    fn extension(&self) -> &str {
        match self {
            ServletTemplate::Velocity { extension, .. }
            | ServletTemplate::Freemarker { extension, .. } => extension,
        }
    }

    fn params(&self) -> String {
        match self {
            ServletTemplate::Velocity { tools, .. } => {
                let mut params = vec![("org.apache.velocity.properties", VELOCITY_PROPERTIES_PATH)];
                if let Some(tools) = tools {
                    params.push(("org.apache.velocity.tools", tools.as_str()));
                }
                xml_params(&params)
            }
            ServletTemplate::Freemarker {
                template_path,
                tag_syntax,
                ..
            } => xml_params(&[
                ("tag_syntax", tag_syntax.as_str()),
                ("TemplatePath", template_path.as_str()),
                ("template_update_delay", "0"),
                ("NoCache", "true"),
                ("default_encoding", "UTF-8"),
            ]),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "  <servlet>\n    <servlet-name>{name}</servlet-name>\n    <servlet-class>{class}</servlet-class>\n{params}  </servlet>\n  <servlet-mapping>\n    <servlet-name>{name}</servlet-name>\n    <url-pattern>*{extension}</url-pattern>\n  </servlet-mapping>\n",
            name = self.name(),
            class = self.class(),
            params = self.params(),
            extension = escape_xml(self.extension()),
        )
    }
}

pub fn velocity_properties(template_dir: &str) -> String {
    format!(
        "input.encoding = UTF-8
output.encoding = UTF-8
resource.loader = webapp
webapp.resource.loader.class = org.apache.velocity.tools.view.WebappResourceLoader
webapp.resource.loader.path = {}
webapp.resource.loader.cache = false
webapp.resource.loader.modificationCheckInterval = 0
tools.view.servlet.layout.directory = /
velocimacro.library.autoreload = true
velocimacro.permissions.allow.inline.to.replace.global = true
",
        template_dir
    )
}

/// Prefix `/` unless already present.
pub fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
