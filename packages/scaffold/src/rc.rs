// ABOUTME: The per-project `.marmotrc` answers file
// ABOUTME: Loading, merging and resolving scaffolding answers with their defaults

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ScaffoldError, ScaffoldResult};

pub const DEFAULT_MOCK_DIR: &str = "mock";
pub const DEFAULT_TEMPLATE_DIR: &str = "views";
pub const DEFAULT_ROUTER_FILE: &str = "/router/main.xml";
pub const DEFAULT_VELOCITY_EXTENSION: &str = ".vm";
pub const DEFAULT_FREEMARKER_EXTENSION: &str = ".ftl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Velocity,
    Freemarker,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::Velocity, Engine::Freemarker];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Velocity => "velocity",
            Engine::Freemarker => "freemarker",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == value.trim())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FreeMarker `tag_syntax` servlet parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSyntax {
    #[default]
    SquareBracket,
    AutoDetect,
}

impl TagSyntax {
    pub const ALL: [TagSyntax; 2] = [TagSyntax::SquareBracket, TagSyntax::AutoDetect];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagSyntax::SquareBracket => "square_bracket",
            TagSyntax::AutoDetect => "auto_detect",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value.trim())
    }
}

impl fmt::Display for TagSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers stored in `.marmotrc`. A key that is present counts as answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarmotRc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<Vec<Engine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vextension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fextension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_syntax: Option<TagSyntax>,
    /// Keys this version does not know about, kept on rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MarmotRc {
    /// Read `.marmotrc`; a missing, unreadable or malformed file has no answers.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {:?}, every question will be asked", path);
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(rc) => rc,
            Err(e) => {
                warn!("Ignoring malformed {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> ScaffoldResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ScaffoldError::RcWrite {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|e| ScaffoldError::io(path, e))
    }

    pub fn is_answered(&self, key: &str) -> bool {
        match key {
            "engines" => self.engines.is_some(),
            "mock" => self.mock.is_some(),
            "template" => self.template.is_some(),
            "router" => self.router.is_some(),
            "vextension" => self.vextension.is_some(),
            "tools" => self.tools.is_some(),
            "fextension" => self.fextension.is_some(),
            "tagSyntax" => self.tag_syntax.is_some(),
            other => self.extra.contains_key(other),
        }
    }

    /// Later answers win over earlier ones.
    pub fn merge(self, newer: MarmotRc) -> MarmotRc {
        let mut extra = self.extra;
        extra.extend(newer.extra);
        MarmotRc {
            engines: newer.engines.or(self.engines),
            mock: newer.mock.or(self.mock),
            template: newer.template.or(self.template),
            router: newer.router.or(self.router),
            vextension: newer.vextension.or(self.vextension),
            tools: newer.tools.or(self.tools),
            fextension: newer.fextension.or(self.fextension),
            tag_syntax: newer.tag_syntax.or(self.tag_syntax),
            extra,
        }
    }
}

/// Answers with defaults filled in, ready to drive `marmot init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    pub engines: Vec<Engine>,
    pub mock: String,
    pub template: String,
    pub router: String,
    pub vextension: String,
    pub tools: Option<String>,
    pub fextension: String,
    pub tag_syntax: TagSyntax,
}

impl InitOptions {
    pub fn from_rc(rc: &MarmotRc) -> Self {
        fn or_default(value: &Option<String>, default: &str) -> String {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        }

        Self {
            engines: rc.engines.clone().unwrap_or_default(),
            mock: or_default(&rc.mock, DEFAULT_MOCK_DIR),
            template: or_default(&rc.template, DEFAULT_TEMPLATE_DIR),
            router: or_default(&rc.router, DEFAULT_ROUTER_FILE),
            vextension: or_default(&rc.vextension, DEFAULT_VELOCITY_EXTENSION),
            tools: rc
                .tools
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            fextension: or_default(&rc.fextension, DEFAULT_FREEMARKER_EXTENSION),
            tag_syntax: rc.tag_syntax.unwrap_or_default(),
        }
    }

    pub fn uses(&self, engine: Engine) -> bool {
        self.engines.contains(&engine)
    }

    /// Template extensions of the selected engines.
    pub fn extensions(&self) -> Vec<&str> {
        self.engines
            .iter()
            .map(|engine| match engine {
                Engine::Velocity => self.vextension.as_str(),
                Engine::Freemarker => self.fextension.as_str(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rc_uses_camel_case_keys() {
        let rc: MarmotRc = serde_json::from_str(
            r#"{"engines":["freemarker"],"tagSyntax":"auto_detect","mock":"data","author":"me"}"#,
        )
        .unwrap();
        assert_eq!(rc.engines, Some(vec![Engine::Freemarker]));
        assert_eq!(rc.tag_syntax, Some(TagSyntax::AutoDetect));
        assert!(rc.is_answered("tagSyntax"));
        assert!(rc.is_answered("author"));
        assert!(!rc.is_answered("router"));

        let json = serde_json::to_value(&rc).unwrap();
        assert_eq!(json["tagSyntax"], "auto_detect");
        assert_eq!(json["author"], "me");
        assert!(json.get("router").is_none());
    }

    #[test]
    fn test_merge_prefers_newer_answers() {
        let older = MarmotRc {
            mock: Some("mock".to_string()),
            template: Some("views".to_string()),
            ..MarmotRc::default()
        };
        let newer = MarmotRc {
            template: Some("templates".to_string()),
            ..MarmotRc::default()
        };
        let merged = older.merge(newer);
        assert_eq!(merged.mock.as_deref(), Some("mock"));
        assert_eq!(merged.template.as_deref(), Some("templates"));
    }

    #[test]
    fn test_options_fill_defaults() {
        let options = InitOptions::from_rc(&MarmotRc {
            engines: Some(vec![Engine::Velocity, Engine::Freemarker]),
            tools: Some("  ".to_string()),
            ..MarmotRc::default()
        });
        assert_eq!(options.mock, "mock");
        assert_eq!(options.template, "views");
        assert_eq!(options.router, "/router/main.xml");
        assert_eq!(options.tools, None);
        assert_eq!(options.tag_syntax, TagSyntax::SquareBracket);
        assert_eq!(options.extensions(), vec![".vm", ".ftl"]);
    }

    #[test]
    fn test_load_tolerates_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".marmotrc");
        assert_eq!(MarmotRc::load(&path), MarmotRc::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(MarmotRc::load(&path), MarmotRc::default());

        let rc = MarmotRc {
            router: Some("/router/app.xml".to_string()),
            ..MarmotRc::default()
        };
        rc.save(&path).unwrap();
        assert_eq!(MarmotRc::load(&path), rc);
    }
}
