// Stream to the zserv endpoint, Unix-domain or TCP

use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UnixStream};

use crate::config::DaemonEndpoint;

/// Byte stream the session talks to the daemon over.
///
/// Reads are non-blocking: `try_read` reports `WouldBlock` once the daemon
/// has nothing more queued.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Wait until the stream has data or has been closed
    async fn readable(&self) -> io::Result<()>;

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    async fn shutdown(&mut self) -> io::Result<()>;
}

pub enum DaemonStream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl DaemonStream {
    pub async fn connect(endpoint: &DaemonEndpoint) -> io::Result<Self> {
        match endpoint {
            DaemonEndpoint::Unix(path) => Ok(DaemonStream::Unix(UnixStream::connect(path).await?)),
            DaemonEndpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                Ok(DaemonStream::Tcp(stream))
            }
        }
    }
}

impl Transport for DaemonStream {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            DaemonStream::Unix(stream) => stream.write_all(buf).await,
            DaemonStream::Tcp(stream) => stream.write_all(buf).await,
        }
    }

    async fn readable(&self) -> io::Result<()> {
        match self {
            DaemonStream::Unix(stream) => stream.readable().await,
            DaemonStream::Tcp(stream) => stream.readable().await,
        }
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DaemonStream::Unix(stream) => stream.try_read(buf),
            DaemonStream::Tcp(stream) => stream.try_read(buf),
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            DaemonStream::Unix(stream) => stream.shutdown().await,
            DaemonStream::Tcp(stream) => stream.shutdown().await,
        }
    }
}
