use crate::types::AppRecord;
use std::fmt;
use std::path::{Path, PathBuf};

/// Lookup key for registry records.
///
/// A record matches when it agrees with *any* of the keys that are set. An
/// empty selector matches nothing. Commands build it with [`Selector::or_pathname`],
/// so explicit keys replace the current-directory match instead of widening it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub id: Option<u64>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub pathname: Option<PathBuf>,
}

impl Selector {
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_port(port: u16) -> Self {
        Self {
            port: Some(port),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_pathname(pathname: impl Into<PathBuf>) -> Self {
        Self {
            pathname: Some(pathname.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.has_explicit_key() && self.pathname.is_none()
    }

    /// Whether an id, port or name was given (the keys a user types).
    pub fn has_explicit_key(&self) -> bool {
        self.id.is_some() || self.port.is_some() || self.name.is_some()
    }

    /// Fall back to the project directory when no explicit key was given.
    /// With an explicit key the directory is not added to the match.
    pub fn or_pathname(self, pathname: &Path) -> Self {
        if self.has_explicit_key() {
            self
        } else {
            Self::by_pathname(pathname)
        }
    }

    pub fn matches(&self, record: &AppRecord) -> bool {
        self.id.is_some_and(|id| record.id == id)
            || self.port.is_some_and(|port| record.port == port)
            || self.name.as_deref().is_some_and(|name| record.name == name)
            || self
                .pathname
                .as_deref()
                .is_some_and(|pathname| record.pathname == pathname)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = self.id {
            parts.push(format!("id={}", id));
        }
        if let Some(port) = self.port {
            parts.push(format!("port={}", port));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(pathname) = &self.pathname {
            parts.push(format!("pathname={}", pathname.display()));
        }
        if parts.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&parts.join(" or "))
        }
    }
}
