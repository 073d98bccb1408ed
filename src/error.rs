use std::borrow::Cow;
use crate::socket::Socket;

/// What made a socket operation fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCause {
    /// The OS rejected the call; `errno` was read right after it returned.
    #[error("{}", errno_to_str(*.errno))]
    Os { errno: i32 },

    /// A condition detected before reaching the OS (bad address text,
    /// operation called from the wrong state, ...).
    #[error("{0}")]
    Described(Cow<'static, str>),
}

/// Error raised by every failing socket operation.
///
/// There is no way to build one without naming the socket it belongs to,
/// and building one moves that socket into [`State::Failed`]. A caller that
/// catches the error and keeps the socket around still holds a dead handle:
/// every later operation on it raises without touching the OS.
///
/// A socket that is already closed stays closed; its descriptor is gone.
///
/// [`State::Failed`]: crate::State::Failed
#[derive(Debug, thiserror::Error)]
#[error("in 'Socket::{op}': {cause}")]
pub struct SocketError {
    op: &'static str,
    cause: ErrorCause,
}

impl SocketError {
    /// Fails `sock` with a caller-supplied description.
    pub fn new(sock: &mut Socket, op: &'static str, description: impl Into<Cow<'static, str>>) -> Self {
        sock.mark_failed();
        Self { op, cause: ErrorCause::Described(description.into()) }
    }

    /// Fails `sock` with an OS error code captured by the caller.
    ///
    /// The code must be read at the failing call site, before anything else
    /// (logging included) gets a chance to overwrite `errno`.
    pub fn os(sock: &mut Socket, op: &'static str, errno: i32) -> Self {
        sock.mark_failed();
        Self { op, cause: ErrorCause::Os { errno } }
    }

    /// Name of the operation that failed.
    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn cause(&self) -> &ErrorCause {
        &self.cause
    }

    /// The captured OS error code, if the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self.cause {
            ErrorCause::Os { errno } => Some(errno),
            ErrorCause::Described(_) => None,
        }
    }

    /// Human-readable description, without the operation prefix.
    pub fn description(&self) -> String {
        self.cause.to_string()
    }
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
    unsafe { *libc::__errno_location() }
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
    match errno {
        libc::EACCES => "permission denied".into(),
        libc::EADDRINUSE => "address already in use".into(),
        libc::EADDRNOTAVAIL => "address not available".into(),
        libc::EAFNOSUPPORT => "address family not supported".into(),
        libc::EAGAIN => "resource temporarily unavailable".into(),
        libc::EBADF => "bad file descriptor".into(),
        libc::ECONNREFUSED => "connection refused".into(),
        libc::ECONNRESET => "connection reset by peer".into(),
        libc::EINPROGRESS => "operation in progress".into(),
        libc::EINTR => "interrupted by signal".into(),
        libc::EINVAL => "invalid argument".into(),
        libc::EISCONN => "already connected".into(),
        libc::EMFILE => "too many open files".into(),
        libc::ENETUNREACH => "network unreachable".into(),
        libc::ENOBUFS => "no buffer space available".into(),
        libc::ENOTCONN => "not connected".into(),
        libc::EOPNOTSUPP => "operation not supported".into(),
        libc::EPIPE => "broken pipe".into(),
        libc::ETIMEDOUT => "connection timed out".into(),
        _ => std::io::Error::from_raw_os_error(errno).to_string(),
    }
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
    match errno {
        libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
        libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
        libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
        libc::EAGAIN => std::io::ErrorKind::WouldBlock,
        libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
        libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
        libc::EINTR => std::io::ErrorKind::Interrupted,
        libc::EINVAL => std::io::ErrorKind::InvalidInput,
        libc::ENOTCONN => std::io::ErrorKind::NotConnected,
        libc::EPIPE => std::io::ErrorKind::BrokenPipe,
        libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
        _ => std::io::ErrorKind::Other,
    }
}

impl From<SocketError> for std::io::Error {
    fn from(err: SocketError) -> Self {
        let kind = match err.cause {
            ErrorCause::Os { errno } => errno_to_kind(errno),
            ErrorCause::Described(_) => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::State;

    #[test]
    fn known_errno_has_short_text() {
        assert_eq!(errno_to_str(libc::ECONNREFUSED), "connection refused");
        assert_eq!(errno_to_str(libc::EPIPE), "broken pipe");
    }

    #[test]
    fn unknown_errno_falls_back_to_os_text() {
        let text = errno_to_str(libc::ENOSPC);
        assert!(!text.is_empty());
        assert!(!text.starts_with("errno"));
    }

    #[test]
    fn display_names_the_operation() {
        let mut sock = Socket::new().unwrap();
        let err = SocketError::new(&mut sock, "bind", "invalid address 'nope'");
        assert_eq!(err.to_string(), "in 'Socket::bind': invalid address 'nope'");
        assert_eq!(err.op(), "bind");
        assert_eq!(err.raw_os_error(), None);
    }

    #[test]
    fn os_error_keeps_the_captured_code() {
        let mut sock = Socket::new().unwrap();
        let err = SocketError::os(&mut sock, "connect", libc::ECONNREFUSED);
        assert_eq!(err.raw_os_error(), Some(libc::ECONNREFUSED));
        assert_eq!(err.description(), "connection refused");
        assert_eq!(sock.state(), State::Failed);
    }

    #[test]
    fn construction_fails_the_socket() {
        let mut sock = Socket::new().unwrap();
        assert_eq!(sock.state(), State::Uninitialized);
        let _ = SocketError::new(&mut sock, "test", "forced");
        assert_eq!(sock.state(), State::Failed);
    }

    #[test]
    fn closed_socket_stays_closed() {
        let mut sock = Socket::new().unwrap();
        sock.close().unwrap();
        let _ = SocketError::new(&mut sock, "test", "forced");
        assert_eq!(sock.state(), State::Closed);
    }

    #[test]
    fn io_error_kind_follows_errno() {
        let mut sock = Socket::new().unwrap();
        let err: std::io::Error = SocketError::os(&mut sock, "connect", libc::ECONNREFUSED).into();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);

        let mut sock = Socket::new().unwrap();
        let err: std::io::Error = SocketError::new(&mut sock, "listen", "bad state").into();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }
}
