use crate::error::SocketError;
use super::sys::{self, SysResult};
use super::{Socket, State};

impl Socket {
	/// Whether a read would return something right now.
	///
	/// Single shot, zero timeout: never sleeps and never retries. Returns
	/// `false` without side effects unless the socket is `Ok`. If the peer
	/// has shut down, the socket moves to `Closed` and this returns `false`.
	pub fn pollin(&mut self) -> Result<bool, SocketError> {
		self.ready(libc::POLLIN, "pollin")
	}

	/// Whether a write would be accepted right now. Same rules as
	/// [`Socket::pollin`].
	pub fn pollout(&mut self) -> Result<bool, SocketError> {
		self.ready(libc::POLLOUT, "pollout")
	}

	/// One-byte look at the receive queue that consumes nothing and never
	/// blocks. `Ok(0)` only on an orderly peer shutdown.
	fn peek(&self) -> SysResult<usize> {
		let mut byte = [0u8; 1];
		sys::recv(self.raw(), &mut byte, libc::MSG_PEEK | libc::MSG_DONTWAIT)
	}

	fn ready(&mut self, events: libc::c_short, op: &'static str) -> Result<bool, SocketError> {
		if self.state != State::Ok {
			return Ok(false);
		}

		// poll() alone reports a shut-down peer as readable; the peek is what
		// tells "closed" apart from "data waiting".
		if let Ok(0) = self.peek() {
			tracing::debug!(fd = self.raw(), op, "peer shut down");
			self.close()?;
			return Ok(false);
		}

		let revents = match sys::poll(self.raw(), events) {
			Ok(revents) => revents,
			Err(libc::EINTR) => 0,
			Err(errno) => return Err(SocketError::os(self, op, errno)),
		};
		let ready = revents & events != 0;
		tracing::trace!(fd = self.raw(), op, revents, ready, "polled");
		Ok(ready)
	}
}
