// ABOUTME: Validation utilities for webapp server commands
// ABOUTME: Turns raw command-line values into typed ports, ids and names before anything runs

use crate::selector::Selector;
use crate::types::{ServerError, ServerResult};

/// Raw `--port`, `--id` and `--name` values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerArgs {
    pub port: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ServerArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: impl ToString) -> Self {
        self.port = Some(port.to_string());
        self
    }

    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Arguments that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedArgs {
    pub port: Option<u16>,
    pub id: Option<u64>,
    pub name: Option<String>,
}

impl ValidatedArgs {
    /// Selector built from the explicit keys only.
    pub fn selector(&self) -> Selector {
        Selector {
            id: self.id,
            port: self.port,
            name: self.name.clone(),
            pathname: None,
        }
    }
}

/// Validates a TCP port: an integer between 1 and 65535.
///
/// ```
/// use marmot_server::validation::validate_port;
///
/// assert_eq!(validate_port("8080").unwrap(), 8080);
/// assert!(validate_port("0").is_err());
/// assert!(validate_port("http").is_err());
/// ```
pub fn validate_port(raw: &str) -> ServerResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ServerError::InvalidPort {
            value: raw.to_string(),
        }),
    }
}

/// Validates a registry id: a non-negative integer.
pub fn validate_id(raw: &str) -> ServerResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ServerError::InvalidId {
            value: raw.to_string(),
        })
}

/// Validates a webapp display name.
///
/// Names end up in the registry file and in log lines, so null bytes and
/// control characters are rejected.
pub fn validate_name(name: &str) -> ServerResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServerError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }

    if trimmed.contains('\0') {
        return Err(ServerError::InvalidName {
            name: name.escape_debug().to_string(),
            reason: "contains null byte".to_string(),
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ServerError::InvalidName {
            name: name.escape_debug().to_string(),
            reason: "contains control characters".to_string(),
        });
    }

    Ok(trimmed.to_string())
}

pub fn validate_args(args: &ServerArgs) -> ServerResult<ValidatedArgs> {
    Ok(ValidatedArgs {
        port: args.port.as_deref().map(validate_port).transpose()?,
        id: args.id.as_deref().map(validate_id).transpose()?,
        name: args.name.as_deref().map(validate_name).transpose()?,
    })
}
