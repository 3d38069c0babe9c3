// One request/reply exchange with the Zebra daemon
//
// Disconnected -> Connected -> RequestSent -> Draining -> Closed

use std::io::{self, Write};

use super::message::RouteMessage;
use super::transport::{DaemonStream, Transport};
use super::{Command, Header};
use crate::config::Config;
use crate::error::{ZrouteError, ZrouteResult};

/// Size of the buffer replies are read into
pub const REPLY_BUFFER_SIZE: usize = 420;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    RequestSent,
    Draining,
    Closed,
}

pub struct Session<T: Transport> {
    transport: T,
    header: Header,
    verbose: bool,
    state: SessionState,
}

impl Session<DaemonStream> {
    /// Connect to the configured endpoint and register with the daemon
    pub async fn connect(config: &Config) -> ZrouteResult<Self> {
        tracing::debug!("Connecting to Zebra routing daemon at {}", config.endpoint);
        let stream = DaemonStream::connect(&config.endpoint)
            .await
            .map_err(|source| ZrouteError::Connect {
                endpoint: config.endpoint.to_string(),
                source,
            })?;

        Session::open(stream, config).await
    }
}

impl<T: Transport> Session<T> {
    /// Perform the zclient handshake on an established transport.
    ///
    /// A starting zclient subscribes to interface updates, then to router-id
    /// updates. The daemon's answers are part of the reply stream drained later.
    pub async fn open(transport: T, config: &Config) -> ZrouteResult<Self> {
        let mut session = Session {
            transport,
            header: Header::new(config.protocol_version),
            verbose: config.verbose,
            state: SessionState::Disconnected,
        };

        for command in [Command::InterfaceAdd, Command::RouterIdAdd] {
            let hello = session.header.encode_bare(command);
            session
                .transport
                .write_all(&hello)
                .await
                .map_err(|source| ZrouteError::Connect {
                    endpoint: config.endpoint.to_string(),
                    source,
                })?;
        }

        session.state = SessionState::Connected;
        tracing::debug!("zserv v{} session established", config.protocol_version);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Send the route message; returns 0 on success and -1 if it could not be written
    pub async fn submit(&mut self, message: &RouteMessage) -> i32 {
        let buf = message.encode(self.header);
        tracing::debug!(
            "Calling Zebra to {} route {} ({} bytes)",
            message.operation.keyword(),
            message.prefix,
            buf.len()
        );

        match self.transport.write_all(&buf).await {
            Ok(()) => {
                self.state = SessionState::RequestSent;
                0
            }
            Err(e) => {
                tracing::error!("Failed writing route request to Zebra: {}", e);
                -1
            }
        }
    }

    /// Wait for the daemon to answer, then read until nothing more is queued.
    ///
    /// Returns the number of reply bytes consumed. `WouldBlock` and end of
    /// stream both finish the drain successfully.
    pub async fn drain(&mut self) -> io::Result<usize> {
        self.state = SessionState::Draining;
        tracing::debug!("Awaiting Zebra reply...");
        self.transport.readable().await?;

        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        let mut total = 0;
        loop {
            match self.transport.try_read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    tracing::debug!("Zebra replied with {} bytes of data", n);
                    total += n;
                    if self.verbose {
                        let mut stderr = io::stderr().lock();
                        if let Err(e) = stderr.write_all(&buf[..n]).and_then(|()| stderr.flush()) {
                            tracing::debug!("cannot echo reply: {}", e);
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        tracing::debug!("Communication with Zebra OK, {} bytes drained", total);
        Ok(total)
    }

    /// Shut the connection down. A session dropped without `close` still
    /// closes its socket when the transport is dropped, without the shutdown.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        tracing::debug!("Disconnecting from Zebra");
        if let Err(e) = self.transport.shutdown().await {
            tracing::debug!("shutdown of daemon connection failed: {}", e);
        }
        self.state = SessionState::Closed;
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!("Session dropped in state {:?} without close", self.state);
        }
    }
}
