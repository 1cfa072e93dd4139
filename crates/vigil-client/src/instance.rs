use std::net::{Ipv4Addr, SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, warn};

/// Holds a loopback port for the lifetime of the process so a second client
/// cannot start alongside it.
pub struct InstanceGuard {
    listener: TcpListener,
}

impl InstanceGuard {
    pub fn acquire(port: u16) -> std::io::Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        // no SO_REUSEADDR: a live holder must make bind fail
        socket.set_reuse_address(false)?;
        socket.bind(&addr.into())?;
        socket.listen(1)?;
        Ok(Self {
            listener: socket.into(),
        })
    }

    pub fn port(&self) -> std::io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }
}

/// Takes the instance lock, or returns `None` when another client holds it.
/// The caller exits cleanly on `None`.
pub fn single_instance(port: u16) -> Option<InstanceGuard> {
    match InstanceGuard::acquire(port) {
        Ok(guard) => {
            match guard.port() {
                Ok(port) => info!("Instance lock held on 127.0.0.1:{}", port),
                Err(e) => warn!("Instance lock held, local address unavailable: {}", e),
            }
            Some(guard)
        }
        Err(e) => {
            info!("Already running (port {}: {}), exiting duplicate instance", port, e);
            None
        }
    }
}
