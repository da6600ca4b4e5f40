// ABOUTME: In-place editing of WEB-INF/web.xml
// ABOUTME: Splices filter parameters, url-patterns and servlets into the descriptor text

use regex::Regex;

use crate::templates::{escape_xml, xml_params};

pub const REWRITE_FILTER: &str = "RewriteFilter";
pub const MOCK_FILTER: &str = "MockFilter";

/// A deployment descriptor being edited as text.
///
/// Edits are string splices located with regular expressions so the rest of
/// the file (comments, formatting, namespaces) is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebXml {
    content: String,
}

impl WebXml {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }

    /// Byte ranges of every `<tag>...</tag>` element, in document order.
    fn elements(&self, tag: &str) -> Vec<(usize, usize)> {
        let pattern = format!(r"(?s)<{tag}(?:\s[^>]*)?>.*?</{tag}\s*>", tag = regex::escape(tag));
        match Regex::new(&pattern) {
            Ok(regex) => regex
                .find_iter(&self.content)
                .map(|m| (m.start(), m.end()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn element_names(element: &str, name_tag: &str) -> Option<String> {
        let pattern = format!(
            r"(?s)<{tag}\s*>\s*(.*?)\s*</{tag}\s*>",
            tag = regex::escape(name_tag)
        );
        Regex::new(&pattern)
            .ok()?
            .captures(element)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Append `<init-param>` entries to every `<filter>` named `filter_name`.
    /// Returns how many filters were changed.
    pub fn add_filter_params(&mut self, filter_name: &str, params: &[(&str, &str)]) -> usize {
        let fragment = xml_params(params);
        let mut changed = 0;

        for (start, end) in self.elements("filter").into_iter().rev() {
            let element = &self.content[start..end];
            if Self::element_names(element, "filter-name").as_deref() != Some(filter_name) {
                continue;
            }
            let Some(close) = element.rfind("</filter") else {
                continue;
            };
            self.content.insert_str(start + close, &fragment);
            changed += 1;
        }

        changed
    }

    /// Add `<url-pattern>*ext</url-pattern>` to every `<filter-mapping>` of
    /// `filter_name`, skipping patterns it already has.
    pub fn add_filter_url_patterns(&mut self, filter_name: &str, extensions: &[&str]) -> usize {
        let mut added = 0;

        for (start, end) in self.elements("filter-mapping").into_iter().rev() {
            let element = &self.content[start..end];
            if Self::element_names(element, "filter-name").as_deref() != Some(filter_name) {
                continue;
            }
            let Some(name_close) = element.find("</filter-name>") else {
                continue;
            };
            let insert_at = start + name_close + "</filter-name>".len();

            let fragment: String = extensions
                .iter()
                .map(|ext| format!("<url-pattern>*{}</url-pattern>", escape_xml(ext)))
                .filter(|pattern| !element.contains(pattern.as_str()))
                .map(|pattern| format!("\n    {}", pattern))
                .collect();
            if fragment.is_empty() {
                continue;
            }

            added += fragment.matches("<url-pattern>").count();
            self.content.insert_str(insert_at, &fragment);
        }

        added
    }

    /// Insert `fragment` after the last `</filter-mapping>`, or before
    /// `</web-app>` when there is no filter mapping.
    pub fn insert_after_last_filter_mapping(&mut self, fragment: &str) -> bool {
        let position = self
            .elements("filter-mapping")
            .last()
            .map(|(_, end)| *end)
            .or_else(|| self.content.rfind("</web-app"));

        match position {
            Some(at) => {
                self.content.insert_str(at, &format!("\n{}", fragment.trim_end()));
                true
            }
            None => false,
        }
    }
}
