// ABOUTME: Explicit working context (project directory, home and marmot state paths)
// ABOUTME: Threaded through every component so nothing captures the process CWD globally

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    APPS_FILE_NAME, MARMOT_DIR_NAME, MARMOT_HOME, MARMOT_VENDOR_DIR, RC_FILE_NAME,
    WEB_XML_RELATIVE_PATH,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the current working directory: {0}")]
    CurrentDirUnavailable(#[source] std::io::Error),

    #[error("Could not determine home directory. Please ensure the HOME environment variable is set.")]
    HomeDirUnavailable,
}

/// Where a marmot command runs and where it keeps its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    cwd: PathBuf,
    home: PathBuf,
    marmot_home: PathBuf,
    vendor_dir: PathBuf,
}

impl WorkingContext {
    /// Build a context with the default state layout (`<home>/.marmot`).
    pub fn new(cwd: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let marmot_home = home.join(MARMOT_DIR_NAME);
        let vendor_dir = marmot_home.join("vendor");
        Self {
            cwd: cwd.into(),
            home,
            marmot_home,
            vendor_dir,
        }
    }

    /// Resolve the context of the running process.
    ///
    /// `MARMOT_HOME` and `MARMOT_VENDOR_DIR` override the state and vendor
    /// directories.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDirUnavailable)?;
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;

        let mut context = Self::new(cwd, home);
        if let Some(dir) = non_empty_env(MARMOT_HOME) {
            context = context.with_marmot_home(dir);
        }
        if let Some(dir) = non_empty_env(MARMOT_VENDOR_DIR) {
            context.vendor_dir = PathBuf::from(dir);
        }

        debug!(
            "Working context: cwd={:?} marmot_home={:?}",
            context.cwd, context.marmot_home
        );
        Ok(context)
    }

    /// Relocate the marmot state directory. The vendor directory follows unless
    /// it was set explicitly.
    pub fn with_marmot_home(mut self, marmot_home: impl Into<PathBuf>) -> Self {
        let marmot_home = marmot_home.into();
        if self.vendor_dir == self.marmot_home.join("vendor") {
            self.vendor_dir = marmot_home.join("vendor");
        }
        self.marmot_home = marmot_home;
        self
    }

    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    /// Same state directories, different project directory.
    pub fn with_cwd(&self, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..self.clone()
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn marmot_home(&self) -> &Path {
        &self.marmot_home
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    /// `<marmot home>/apps.json`
    pub fn registry_path(&self) -> PathBuf {
        self.marmot_home.join(APPS_FILE_NAME)
    }

    pub fn rc_path(&self) -> PathBuf {
        self.cwd.join(RC_FILE_NAME)
    }

    pub fn web_xml_path(&self) -> PathBuf {
        self.cwd.join(WEB_XML_RELATIVE_PATH)
    }

    /// Default webapp name: the project directory's basename.
    pub fn project_name(&self) -> String {
        self.cwd
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.cwd.to_string_lossy().into_owned())
    }
}

fn non_empty_env(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_layout() {
        let ctx = WorkingContext::new("/work/shop", "/home/dev");
        assert_eq!(ctx.marmot_home(), Path::new("/home/dev/.marmot"));
        assert_eq!(ctx.registry_path(), PathBuf::from("/home/dev/.marmot/apps.json"));
        assert_eq!(ctx.vendor_dir(), Path::new("/home/dev/.marmot/vendor"));
        assert_eq!(ctx.web_xml_path(), PathBuf::from("/work/shop/WEB-INF/web.xml"));
        assert_eq!(ctx.rc_path(), PathBuf::from("/work/shop/.marmotrc"));
    }

    #[test]
    fn test_project_name_is_basename() {
        let ctx = WorkingContext::new("/work/shop", "/home/dev");
        assert_eq!(ctx.project_name(), "shop");

        let root = WorkingContext::new("/", "/home/dev");
        assert_eq!(root.project_name(), "/");
    }

    #[test]
    fn test_with_marmot_home_moves_default_vendor_dir() {
        let ctx = WorkingContext::new("/work/shop", "/home/dev").with_marmot_home("/state");
        assert_eq!(ctx.registry_path(), PathBuf::from("/state/apps.json"));
        assert_eq!(ctx.vendor_dir(), Path::new("/state/vendor"));

        let pinned = WorkingContext::new("/work/shop", "/home/dev")
            .with_vendor_dir("/opt/vendor")
            .with_marmot_home("/state");
        assert_eq!(pinned.vendor_dir(), Path::new("/opt/vendor"));
    }

    #[test]
    fn test_with_cwd_keeps_state_dirs() {
        let ctx = WorkingContext::new("/work/shop", "/home/dev");
        let other = ctx.with_cwd("/work/blog");
        assert_eq!(other.cwd(), Path::new("/work/blog"));
        assert_eq!(other.registry_path(), ctx.registry_path());
    }

    #[test]
    #[serial]
    fn test_from_env_honours_overrides() {
        let temp = tempfile::tempdir().unwrap();
        let state = temp.path().join("state");
        std::env::set_var(MARMOT_HOME, &state);
        std::env::remove_var(MARMOT_VENDOR_DIR);

        let ctx = WorkingContext::from_env().unwrap();
        assert_eq!(ctx.marmot_home(), state.as_path());
        assert_eq!(ctx.vendor_dir(), state.join("vendor").as_path());

        std::env::remove_var(MARMOT_HOME);
    }
}
