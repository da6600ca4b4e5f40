// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across marmot

// State directories
pub const MARMOT_HOME: &str = "MARMOT_HOME";
pub const MARMOT_VENDOR_DIR: &str = "MARMOT_VENDOR_DIR";

// Server runtime
pub const MARMOT_JAVA: &str = "MARMOT_JAVA";
pub const JAVA_HOME: &str = "JAVA_HOME";
pub const MARMOT_JETTY_JAR: &str = "MARMOT_JETTY_JAR";
pub const MARMOT_DEFAULT_PORT: &str = "MARMOT_DEFAULT_PORT";
pub const MARMOT_KILL_GRACE_MS: &str = "MARMOT_KILL_GRACE_MS";

// Logging
pub const MARMOT_LOG: &str = "MARMOT_LOG";

/// Directory under the home directory that holds marmot state
pub const MARMOT_DIR_NAME: &str = ".marmot";

/// Registry of managed webapps, relative to the marmot home
pub const APPS_FILE_NAME: &str = "apps.json";

/// Per-project scaffolding answers
pub const RC_FILE_NAME: &str = ".marmotrc";

/// Vendored embedded jetty server
pub const JETTY_JAR_NAME: &str = "embedded-jetty-server-standalone.jar";

/// Deployment descriptor, relative to a project directory
pub const WEB_XML_RELATIVE_PATH: &str = "WEB-INF/web.xml";
