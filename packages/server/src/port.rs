use std::path::Path;
use tokio::net::TcpStream;
use tracing::debug;

use crate::registry::RegistryStore;
use crate::selector::Selector;
use crate::types::{ServerError, ServerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAvailability {
    Available,
    InUse,
}

/// Probe a port by connecting to it: a listener answering means it is taken.
pub async fn probe(port: u16) -> PortAvailability {
    match TcpStream::connect(("localhost", port)).await {
        Ok(_) => {
            debug!("Port {} accepted a connection, it is in use", port);
            PortAvailability::InUse
        }
        Err(e) => {
            debug!("Port {} refused a connection ({}), it is free", port, e);
            PortAvailability::Available
        }
    }
}

/// Decide whether `pathname` may start a server on `port`.
///
/// Ports recorded for another project are refused without probing. The
/// project's own online instance is about to be replaced, so its port is not
/// probed either.
pub async fn check_port(store: &RegistryStore, port: u16, pathname: &Path) -> ServerResult<()> {
    let owners = store.find_all(&Selector::by_port(port)).await;

    if let Some(owner) = owners.iter().find(|r| r.pathname != pathname) {
        return Err(ServerError::PortOwned {
            port,
            owner: owner.name.clone(),
            pathname: owner.pathname.clone(),
        });
    }

    if owners.iter().any(|r| r.is_online()) {
        debug!(
            "Port {} belongs to the running instance of {:?}, skipping probe",
            port, pathname
        );
        return Ok(());
    }

    match probe(port).await {
        PortAvailability::Available => Ok(()),
        PortAvailability::InUse => Err(ServerError::PortInUse { port }),
    }
}
