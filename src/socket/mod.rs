mod sys;
mod raw;
mod options;
mod listener;
mod stream;
mod poll;
mod builder;

pub use self::options::{SockOption, Options};
pub use self::listener::Accepted;
pub use self::builder::SocketBuilder;

use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::{Family, SockAddr};
use crate::error::SocketError;

/// Connection type a socket is created with.
///
/// Only stream (TCP) sockets exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnType {
	#[default]
	Tcp,
}

impl ConnType {
	/// Returns the libc constant for this socket type.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			ConnType::Tcp => libc::SOCK_STREAM,
		}
	}
}

/// Lifecycle state of a [`Socket`].
///
/// ```text
///   Closed ──open──▶ Uninitialized ──bind/connect──▶ Ok
///     ▲                   │                          │
///     └──────close────────┴──────────close───────────┘
///
///   any error ──▶ Failed ──close──▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Descriptor allocated, not yet bound or connected.
	Uninitialized,
	/// Bound, listening, connected or accepted.
	Ok,
	/// An error was raised. Only `close()` is still accepted.
	Failed,
	/// Descriptor released.
	Closed,
}

const NOT_OPENED: &str = "impossible operation. Socket is not opened.";
const FAIL_STATE: &str = "impossible operation. Socket is in fail state.";
const NOT_ESTABLISHED: &str = "impossible operation. Socket is not connected or bound.";
const ALREADY_ESTABLISHED: &str = "impossible operation. Socket is already connected or bound.";

/// A TCP socket handle that owns one OS descriptor and enforces the order
/// of the socket lifecycle at runtime.
///
/// The handle is move-only. Dropping it closes the descriptor.
///
/// # Example
/// ```no_run
/// use socklane::{Socket, SockOption};
///
/// let mut server = Socket::new()?;
/// server.set_option(SockOption::ReuseAddr, true)?;
/// server.bind("127.0.0.1", 8080)?;
/// server.listen(Socket::DEFAULT_LISTEN_BACKLOG)?;
///
/// let mut conn = Socket::from_accepted(server.accept()?);
/// let request = conn.recv(Socket::DEFAULT_CHUNK_SIZE)?;
/// conn.send(&request)?;
/// # Ok::<(), socklane::SocketError>(())
/// ```
#[derive(Debug)]
pub struct Socket {
	fd: Option<OwnedFd>,
	addr: Option<SockAddr>,
	conn_type: ConnType,
	family: Family,
	options: Options,
	state: State,
}

impl Socket {
	/// Bytes requested by a receive when the caller has no better size.
	pub const DEFAULT_CHUNK_SIZE: usize = 2048;

	/// Listen backlog used when the caller has no better size.
	pub const DEFAULT_LISTEN_BACKLOG: i32 = libc::SOMAXCONN;

	/// Opens an IPv4 TCP socket.
	pub fn new() -> Result<Self, SocketError> {
		Self::with_type(ConnType::Tcp, Family::Ipv4)
	}

	/// Opens a TCP socket in the given address family.
	pub fn with_family(family: Family) -> Result<Self, SocketError> {
		Self::with_type(ConnType::Tcp, family)
	}

	/// Opens a socket of the given type and family, in `Uninitialized`.
	pub fn with_type(conn_type: ConnType, family: Family) -> Result<Self, SocketError> {
		let mut sock = Self::unopened(conn_type, family);
		sock.open()?;
		Ok(sock)
	}

	fn unopened(conn_type: ConnType, family: Family) -> Self {
		Self {
			fd: None,
			addr: None,
			conn_type,
			family,
			options: Options::empty(),
			state: State::Closed,
		}
	}

	pub fn state(&self) -> State {
		self.state
	}

	#[inline]
	pub fn is_ok(&self) -> bool {
		self.state == State::Ok
	}

	#[inline]
	pub fn is_closed(&self) -> bool {
		self.state == State::Closed
	}

	#[inline]
	pub fn is_failed(&self) -> bool {
		self.state == State::Failed
	}

	pub fn family(&self) -> Family {
		self.family
	}

	pub fn conn_type(&self) -> ConnType {
		self.conn_type
	}

	/// Options applied through [`Socket::set_option`].
	pub fn options(&self) -> Options {
		self.options
	}

	/// The address record: the bound or connected-to address, or the peer of
	/// an accepted connection. `None` before bind/connect.
	pub fn address(&self) -> Option<&SockAddr> {
		self.addr.as_ref()
	}

	/// The address the kernel actually assigned (resolves port 0).
	pub fn local_addr(&mut self) -> Result<SockAddr, SocketError> {
		self.check_state(State::Ok, "local_addr")?;
		match sys::local_addr(self.raw()) {
			Ok(Some(addr)) => Ok(addr),
			Ok(None) => Err(SocketError::new(self, "local_addr", "invalid local address")),
			Err(errno) => Err(SocketError::os(self, "local_addr", errno)),
		}
	}

	/// Releases the descriptor and moves to `Closed`.
	///
	/// Calling it again is a no-op. If the kernel reports a failure, the
	/// descriptor is still gone and the socket ends up `Failed`; a further
	/// `close()` then just settles it to `Closed`.
	pub fn close(&mut self) -> Result<(), SocketError> {
		if self.state == State::Closed {
			return Ok(());
		}
		if let Some(fd) = self.fd.take() {
			if let Err(errno) = sys::release(fd) {
				return Err(SocketError::os(self, "close", errno));
			}
		}
		self.update_state(State::Closed);
		Ok(())
	}

	#[inline]
	fn raw(&self) -> RawFd {
		self.as_raw_fd()
	}

	fn update_state(&mut self, state: State) {
		if self.state != state {
			tracing::debug!(fd = self.raw(), from = ?self.state, to = ?state, "socket state change");
		}
		self.state = state;
	}

	/// Moves a live socket to `Failed`. Called by every `SocketError` constructor.
	pub(crate) fn mark_failed(&mut self) {
		if matches!(self.state, State::Closed | State::Failed) {
			return;
		}
		self.update_state(State::Failed);
	}

	/// Raises unless the socket is currently in exactly `desired`.
	fn check_state(&mut self, desired: State, op: &'static str) -> Result<(), SocketError> {
		if self.state == desired {
			return Ok(());
		}
		let description = match self.state {
			State::Closed => NOT_OPENED,
			State::Failed => FAIL_STATE,
			State::Uninitialized => NOT_ESTABLISHED,
			State::Ok => ALREADY_ESTABLISHED,
		};
		Err(SocketError::new(self, op, description))
	}
}

impl Drop for Socket {
	fn drop(&mut self) {
		if let Err(err) = self.close() {
			tracing::warn!(%err, "failed to close socket on drop");
		}
	}
}

/// Returns `-1` once the descriptor has been released.
impl AsRawFd for Socket {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_ref().map_or(-1, |fd| fd.as_raw_fd())
	}
}

/// Two handles are equal when they hold the same descriptor.
///
/// Live handles never share one, so a live socket only equals itself. Every
/// handle that holds nothing compares as `-1`.
impl PartialEq for Socket {
	fn eq(&self, other: &Self) -> bool {
		self.raw() == other.raw()
	}
}

impl Eq for Socket {}

impl FromRawFd for Socket {
	/// Adopts an already-connected descriptor, starting in `Ok`.
	///
	/// `-1` yields a socket in `Failed` holding nothing.
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		let mut sock = Self::unopened(ConnType::Tcp, Family::Ipv4);
		if fd == -1 {
			sock.state = State::Failed;
			return sock;
		}
		if let Ok(Some(local)) = sys::local_addr(fd) {
			sock.family = local.family();
		}
		sock.addr = sys::peer_addr(fd).ok().flatten();
		sock.fd = Some(unsafe { OwnedFd::from_raw_fd(fd) });
		sock.state = State::Ok;
		sock
	}
}

/// Hands the descriptor to the caller without closing it; `-1` if none is held.
impl IntoRawFd for Socket {
	fn into_raw_fd(mut self) -> RawFd {
		let fd = self.fd.take();
		self.state = State::Closed;
		fd.map_or(-1, IntoRawFd::into_raw_fd)
	}
}
