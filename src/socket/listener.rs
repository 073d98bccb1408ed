use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use crate::addr::SockAddr;
use crate::error::SocketError;
use super::{sys, ConnType, Options, SockOption, Socket, State};

/// A connection taken off a listening socket's queue.
///
/// Owns the new descriptor until it is turned into a [`Socket`] with
/// [`Socket::from_accepted`]. Dropping it closes the connection.
#[derive(Debug)]
pub struct Accepted {
	fd: OwnedFd,
	peer: SockAddr,
	addr_len: libc::socklen_t,
	conn_type: ConnType,
	nonblocking: bool,
}

impl Accepted {
	/// Address of the connecting peer.
	pub fn peer(&self) -> SockAddr {
		self.peer
	}

	/// Length of the raw address the kernel filled in.
	pub fn addr_len(&self) -> libc::socklen_t {
		self.addr_len
	}

	pub fn conn_type(&self) -> ConnType {
		self.conn_type
	}
}

impl AsRawFd for Accepted {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for Accepted {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl Socket {
	/// Marks a bound socket as passive. Does not change state.
	///
	/// `backlog` — maximum pending connections queue size.
	/// [`Socket::DEFAULT_LISTEN_BACKLOG`] is the platform maximum.
	pub fn listen(&mut self, backlog: i32) -> Result<(), SocketError> {
		self.check_state(State::Ok, "listen")?;
		if let Err(errno) = sys::listen(self.raw(), backlog) {
			return Err(SocketError::os(self, "listen", errno));
		}
		tracing::debug!(fd = self.raw(), backlog, "listening");
		Ok(())
	}

	/// Takes the next pending connection.
	///
	/// Blocks on a blocking socket. On a [`NonBlock`] socket with nothing
	/// queued this raises like any other failure; use [`Socket::try_accept`]
	/// to poll instead.
	///
	/// A signal landing while it waits is not a failure: the wait resumes.
	/// `self` keeps its state on success.
	///
	/// [`NonBlock`]: SockOption::NonBlock
	pub fn accept(&mut self) -> Result<Accepted, SocketError> {
		self.check_state(State::Ok, "accept")?;
		loop {
			match sys::accept(self.raw(), 0) {
				Ok(conn) => return self.accepted(conn, false),
				Err(libc::EINTR) => tracing::trace!(fd = self.raw(), "accept interrupted, retrying"),
				Err(errno) => return Err(SocketError::os(self, "accept", errno)),
			}
		}
	}

	/// Non-blocking accept.
	///
	/// Returns `Ok(None)` when no connection is queued (`EAGAIN`) or the call
	/// was interrupted by a signal. Neither is an error and neither changes
	/// state; call again once [`Socket::pollin`] reports readiness.
	///
	/// The accepted descriptor is itself non-blocking, and a socket built
	/// from it reports [`SockOption::NonBlock`].
	pub fn try_accept(&mut self) -> Result<Option<Accepted>, SocketError> {
		self.check_state(State::Ok, "accept")?;
		match sys::accept(self.raw(), libc::SOCK_NONBLOCK) {
			Ok(conn) => self.accepted(conn, true).map(Some),
			Err(errno) if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK || errno == libc::EINTR => Ok(None),
			Err(errno) => Err(SocketError::os(self, "accept", errno)),
		}
	}

	fn accepted(
		&mut self,
		conn: (OwnedFd, Option<SockAddr>, libc::socklen_t),
		nonblocking: bool,
	) -> Result<Accepted, SocketError> {
		let (fd, peer, addr_len) = conn;
		let Some(peer) = peer else {
			return Err(SocketError::new(self, "accept", "invalid client address"));
		};
		tracing::debug!(fd = self.raw(), conn = fd.as_raw_fd(), %peer, "accepted");
		Ok(Accepted { fd, peer, addr_len, conn_type: self.conn_type, nonblocking })
	}

	/// Wraps an accepted connection, starting directly in `Ok`.
	///
	/// The new socket takes ownership of the record's descriptor and records
	/// the peer as its address.
	pub fn from_accepted(conn: Accepted) -> Self {
		let mut options = Options::empty();
		if conn.nonblocking {
			options.set(SockOption::NonBlock, true);
		}
		let sock = Self {
			fd: Some(conn.fd),
			addr: Some(conn.peer),
			conn_type: conn.conn_type,
			family: conn.peer.family(),
			options,
			state: State::Ok,
		};
		tracing::debug!(fd = sock.raw(), peer = %conn.peer, "socket from accepted connection");
		sock
	}
}

impl From<Accepted> for Socket {
	fn from(conn: Accepted) -> Self {
		Socket::from_accepted(conn)
	}
}
