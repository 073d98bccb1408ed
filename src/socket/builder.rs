use crate::addr::Family;
use crate::error::SocketError;
use super::{Socket, SockOption};

/// Builder that walks a socket through open → options → bind/connect.
///
/// # Example
/// ```no_run
/// use socklane::{Family, SocketBuilder};
///
/// let server = SocketBuilder::new()
///     .family(Family::Ipv4)
///     .reuse_addr(true)
///     .backlog(1024)
///     .listen("0.0.0.0", 8080)?;
///
/// let client = SocketBuilder::new()
///     .nonblocking(true)
///     .connect("127.0.0.1", 8080)?;
/// # Ok::<(), socklane::SocketError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SocketBuilder {
	family: Family,
	nonblocking: bool,
	reuse_addr: bool,
	backlog: i32,
}

impl Default for SocketBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SocketBuilder {
	pub fn new() -> Self {
		Self {
			family: Family::Ipv4,
			nonblocking: false,
			reuse_addr: true,  // Almost always want this for servers
			backlog: Socket::DEFAULT_LISTEN_BACKLOG,
		}
	}

	/// Address family. Default: IPv4.
	pub fn family(mut self, family: Family) -> Self {
		self.family = family;
		self
	}

	/// Set non-blocking mode. Default: off.
	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.nonblocking = enable;
		self
	}

	/// Set SO_REUSEADDR on listeners. Default: on.
	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	/// Set listen backlog. Default: the platform maximum.
	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Opens, binds and starts listening.
	pub fn listen(&self, address: &str, port: u16) -> Result<Socket, SocketError> {
		let mut sock = Socket::with_family(self.family)?;
		if self.reuse_addr {
			sock.set_option(SockOption::ReuseAddr, true)?;
		}
		if self.nonblocking {
			sock.set_option(SockOption::NonBlock, true)?;
		}
		sock.bind(address, port)?;
		sock.listen(self.backlog)?;
		Ok(sock)
	}

	/// Opens and connects. Address reuse is not applied to outgoing sockets.
	pub fn connect(&self, address: &str, port: u16) -> Result<Socket, SocketError> {
		let mut sock = Socket::with_family(self.family)?;
		if self.nonblocking {
			sock.set_option(SockOption::NonBlock, true)?;
		}
		sock.connect(address, port, self.family)?;
		Ok(sock)
	}
}
