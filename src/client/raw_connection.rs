//! Raw connection to the server
//!
//! One `RawConnection` is opened per collection cycle. Commands are issued
//! strictly one at a time: encode, flush, then block until a single reply is
//! decoded or the read timeout elapses.

use std::fmt;
use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::control_plane::{ControlPlane, ControlPlaneExt};
use crate::utils::{ConnectionError, RespDecoder, RespEncoder, RespValue, Result};

/// Byte stream a connection can run over
pub trait Transport: Read + Write {
    /// Release the underlying stream
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Raw connection wrapper
///
/// Reads go through a `BufReader` so bytes left over from one reply stay
/// buffered for the next. Writes are encoded in full before hitting the socket.
pub struct RawConnection<S: Transport = TcpStream> {
    stream: BufReader<S>,
    encoder: RespEncoder,
}

impl<S: Transport> fmt::Debug for RawConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawConnection")
            .field("buffered", &self.stream.buffer().len())
            .finish_non_exhaustive()
    }
}

impl RawConnection<TcpStream> {
    /// Create new TCP connection
    pub fn connect_tcp(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> std::result::Result<Self, ConnectionError> {
        let connect_failed = |source: io::Error| ConnectionError::ConnectFailed {
            host: host.to_string(),
            port,
            source,
        };

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(connect_failed)?
            .next()
            .ok_or_else(|| {
                connect_failed(io::Error::new(
                    io::ErrorKind::NotFound,
                    "No addresses found",
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(connect_failed)?;
        stream.set_nodelay(true).ok();

        Ok(Self::from_stream(stream))
    }

    /// Set read timeout
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.get_ref().set_read_timeout(timeout)
    }

    /// Set write timeout
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.get_ref().set_write_timeout(timeout)
    }
}

impl<S: Transport> RawConnection<S> {
    /// Wrap an already-connected stream
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: BufReader::with_capacity(16 * 1024, stream),
            encoder: RespEncoder::with_capacity(256),
        }
    }

    /// Read a single RESP response
    fn read_response(&mut self) -> Result<RespValue> {
        RespDecoder::new(&mut self.stream).decode()
    }

    /// Close the connection. Consumes the session so it cannot be reused.
    pub fn close(self) -> io::Result<()> {
        let mut stream = self.stream.into_inner();
        stream.flush()?;
        stream.shutdown()
    }
}

impl<S: Transport> ControlPlane for RawConnection<S> {
    fn execute(&mut self, args: &[&str]) -> Result<RespValue> {
        debug!("Executing {}", args.first().copied().unwrap_or_default());

        self.encoder.clear();
        self.encoder.encode_command_str(args);

        let writer = self.stream.get_mut();
        writer.write_all(self.encoder.as_bytes())?;
        writer.flush()?;

        self.read_response()?.into_result()
    }
}

/// Connection factory: connect, then run the AUTH/SELECT handshake
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub auth_password: Option<String>,
    pub dbnum: u32,
}

impl ConnectionFactory {
    /// Create a new connection to the specified host:port
    pub fn create(&self, host: &str, port: u16) -> Result<RawConnection> {
        let mut conn = RawConnection::connect_tcp(host, port, self.connect_timeout)?;

        conn.set_read_timeout(Some(self.read_timeout))?;
        conn.set_write_timeout(Some(self.write_timeout))?;

        self.handshake(&mut conn)?;
        debug!("Connected to {}:{}", host, port);

        Ok(conn)
    }

    /// Authenticate and select the database, as configured.
    /// An empty password and db 0 both skip their command.
    pub fn handshake<C: ControlPlane>(&self, conn: &mut C) -> Result<()> {
        if let Some(password) = self.auth_password.as_deref().filter(|p| !p.is_empty()) {
            conn.authenticate(password)?;
        }

        if self.dbnum != 0 {
            conn.select_db(self.dbnum)?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Loopback server that writes `replies` once a client connects, then
    /// collects everything the client sends until it disconnects.
    pub fn spawn(replies: Vec<u8>) -> (u16, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(&replies).unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).ok();
            received
        });

        (port, handle)
    }
}
