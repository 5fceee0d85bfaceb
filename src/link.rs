//! Device-side connection management for the bridge socket.
//!
//! The simulator is the device end of a Unix-domain stream socket, addressed
//! either by filesystem path or by an abstract-namespace name (Linux). The
//! link connects lazily on first use and is permanently refused once closed.

use socket2::{Domain, SockAddr, Socket, Type};
use std::fmt;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, trace};

/// One receive pulls at most this many bytes.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Receive deadline, so the loop can observe a shutdown request between
/// chunks. Expiry is a recoverable `Idle` event, not an error.
const READ_DEADLINE: Duration = Duration::from_millis(250);

/// A bridge socket address from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketAddress {
    /// Filesystem-bound socket path.
    Path(PathBuf),
    /// Abstract-namespace name (Linux); the kernel address carries a leading
    /// NUL byte in place of the configured `@`.
    Abstract(Vec<u8>),
}

impl SocketAddress {
    /// Parse a configured address; a leading `@` selects the abstract
    /// namespace.
    pub fn parse(addr: &str) -> Self {
        match addr.strip_prefix('@') {
            Some(name) => SocketAddress::Abstract(name.as_bytes().to_vec()),
            None => SocketAddress::Path(PathBuf::from(addr)),
        }
    }

    fn to_sockaddr(&self) -> io::Result<SockAddr> {
        match self {
            SocketAddress::Path(path) => SockAddr::unix(path),
            SocketAddress::Abstract(name) => abstract_sockaddr(name),
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketAddress::Path(path) => write!(f, "{}", path.display()),
            SocketAddress::Abstract(name) => write!(f, "@{}", String::from_utf8_lossy(name)),
        }
    }
}

/// Build a `sockaddr_un` whose path begins with a NUL byte (the abstract
/// namespace convention).
fn abstract_sockaddr(name: &[u8]) -> io::Result<SockAddr> {
    unsafe {
        SockAddr::try_init(|storage, len| {
            let sun = &mut *storage.cast::<libc::sockaddr_un>();
            if name.len() + 1 > sun.sun_path.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "abstract socket name too long",
                ));
            }
            sun.sun_family = libc::AF_UNIX as libc::sa_family_t;
            sun.sun_path[0] = 0;
            for (dst, &src) in sun.sun_path[1..].iter_mut().zip(name) {
                *dst = src as libc::c_char;
            }
            let path_offset = std::mem::offset_of!(libc::sockaddr_un, sun_path);
            *len = (path_offset + 1 + name.len()) as libc::socklen_t;
            Ok(())
        })
    }
    .map(|((), addr)| addr)
}

/// Connection errors surfaced to callers.
#[derive(Debug)]
pub enum LinkError {
    /// The link was closed; reconnection is permanently refused.
    Closed,
    Io(io::Error),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Closed => write!(f, "link closed"),
            LinkError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Outcome of one receive attempt.
#[derive(Debug)]
pub enum ReadEvent {
    /// One chunk of received bytes.
    Data(Vec<u8>),
    /// Deadline expired with no data; the connection is still up.
    Idle,
    /// End of stream, receive failure, or no connection could be made.
    Closed,
}

/// The device end of the bridge socket.
pub struct DeviceLink {
    addr: SocketAddress,
    stream: Option<UnixStream>,
    closing: bool,
}

impl DeviceLink {
    pub fn new(addr: SocketAddress) -> Self {
        DeviceLink {
            addr,
            stream: None,
            closing: false,
        }
    }

    /// Open the stream socket. Refused once the link is closing.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        if self.closing {
            return Err(LinkError::Closed);
        }

        trace!(addr = %self.addr, "device connect");
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None).map_err(LinkError::Io)?;
        let sockaddr = self.addr.to_sockaddr().map_err(LinkError::Io)?;
        socket.connect(&sockaddr).map_err(LinkError::Io)?;
        socket
            .set_read_timeout(Some(READ_DEADLINE))
            .map_err(LinkError::Io)?;

        self.stream = Some(socket.into());
        Ok(())
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Lazily connect, logging failures. `None` means no connection is
    /// available; the caller may retry later unless the link is closing.
    fn stream(&mut self) -> Option<&mut UnixStream> {
        if self.stream.is_none() {
            if let Err(e) = self.connect() {
                if self.closing {
                    debug!(error = %e, "connect refused while closing");
                } else {
                    error!(error = %e, "connect error");
                }
                return None;
            }
        }
        self.stream.as_mut()
    }

    /// Receive one chunk of up to [`READ_CHUNK_SIZE`] bytes, connecting
    /// first if necessary.
    pub fn read(&mut self) -> ReadEvent {
        let Some(stream) = self.stream() else {
            return ReadEvent::Closed;
        };

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        match stream.read(&mut chunk) {
            Ok(0) => {
                trace!("end of stream");
                self.stream = None;
                ReadEvent::Closed
            }
            Ok(n) => ReadEvent::Data(chunk[..n].to_vec()),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                ) =>
            {
                ReadEvent::Idle
            }
            Err(e) => {
                if !self.closing {
                    error!(error = %e, "recv error");
                }
                self.stream = None;
                ReadEvent::Closed
            }
        }
    }

    /// Send the whole payload, connecting first if necessary. Returns false
    /// on failure; the connection is torn down so the next use reconnects.
    pub fn write(&mut self, payload: &str) -> bool {
        let Some(stream) = self.stream() else {
            return false;
        };

        match stream.write_all(payload.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                if !self.closing {
                    error!(error = %e, "send error");
                }
                self.stream = None;
                false
            }
        }
    }

    /// Close the link. Safe to call repeatedly; afterwards every connect is
    /// refused.
    pub fn close(&mut self) {
        trace!("device close");
        self.closing = true;
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}
