use crate::addr::{Family, SockAddr};
use crate::error::SocketError;
use super::{sys, Socket, SockOption, State, FAIL_STATE};

impl Socket {
	/// Allocates a fresh descriptor and moves to `Uninitialized`.
	///
	/// Only legal on a `Closed` handle: this is how a closed socket is reused.
	/// Options and the address record start over.
	pub fn open(&mut self) -> Result<(), SocketError> {
		match self.state {
			State::Closed => {}
			State::Failed => return Err(SocketError::new(self, "open", FAIL_STATE)),
			State::Uninitialized | State::Ok => {
				return Err(SocketError::new(self, "open", "impossible operation. Socket is already opened."));
			}
		}

		let fd = match sys::create(self.family, self.conn_type) {
			Ok(fd) => fd,
			Err(errno) => return Err(SocketError::os(self, "open", errno)),
		};
		self.fd = Some(fd);
		self.addr = None;
		self.options = Default::default();
		self.update_state(State::Uninitialized);
		Ok(())
	}

	/// Binds to a textual address in this socket's family.
	///
	/// Text that does not parse raises here, not at construction.
	pub fn bind(&mut self, address: &str, port: u16) -> Result<(), SocketError> {
		self.check_state(State::Uninitialized, "bind")?;
		let addr = self.parse_addr("bind", address, port, self.family)?;
		self.addr = Some(addr);

		if let Err(errno) = sys::bind(self.raw(), &addr) {
			return Err(SocketError::os(self, "bind", errno));
		}
		tracing::debug!(fd = self.raw(), %addr, "bound");
		self.update_state(State::Ok);
		Ok(())
	}

	/// Connects to a textual address parsed in `family`.
	///
	/// With [`SockOption::NonBlock`] set, a connection still in progress
	/// counts as success; wait for [`Socket::pollout`] before sending. The
	/// same holds for a blocking connect cut short by a signal.
	pub fn connect(&mut self, address: &str, port: u16, family: Family) -> Result<(), SocketError> {
		self.check_state(State::Uninitialized, "connect")?;
		let addr = self.parse_addr("connect", address, port, family)?;
		self.connect_addr(addr)
	}

	/// Connects to the address recorded on `peer` (where it is bound, or what
	/// it is connected to).
	pub fn connect_to(&mut self, peer: &Socket) -> Result<(), SocketError> {
		self.check_state(State::Uninitialized, "connect")?;
		match peer.addr {
			Some(addr) => self.connect_addr(addr),
			None => Err(SocketError::new(self, "connect", "peer socket has no address")),
		}
	}

	fn connect_addr(&mut self, addr: SockAddr) -> Result<(), SocketError> {
		self.addr = Some(addr);
		match sys::connect(self.raw(), &addr) {
			Ok(()) => tracing::debug!(fd = self.raw(), %addr, "connected"),
			Err(errno) if still_connecting(errno, self.options.contains(SockOption::NonBlock)) => {
				tracing::debug!(fd = self.raw(), %addr, errno, "connection in progress");
			}
			Err(errno) => return Err(SocketError::os(self, "connect", errno)),
		}
		self.update_state(State::Ok);
		Ok(())
	}

	fn parse_addr(&mut self, op: &'static str, text: &str, port: u16, family: Family) -> Result<SockAddr, SocketError> {
		SockAddr::parse(text, port, family)
			.ok_or_else(|| SocketError::new(self, op, format!("invalid address '{text}'")))
	}
}

/// Whether a failed `connect(2)` left the handshake running in the kernel.
///
/// An interrupted connect keeps going in the background whatever the
/// blocking mode; `pollout()` reports when it is done.
fn still_connecting(errno: i32, nonblocking: bool) -> bool {
	match errno {
		libc::EINTR => true,
		libc::EINPROGRESS => nonblocking,
		_ => false,
	}
}
