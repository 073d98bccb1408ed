use crate::error::SocketError;
use super::{sys, Socket, State};

/// Options that can be toggled before a socket is bound or connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockOption {
	/// `O_NONBLOCK`: transfers return "nothing yet" instead of waiting.
	NonBlock = 1,
	/// `SO_REUSEADDR`: allow binding an address still in TIME_WAIT.
	ReuseAddr = 2,
}

impl SockOption {
	#[inline]
	fn bit(self) -> u8 {
		self as u8
	}

	pub fn name(self) -> &'static str {
		match self {
			SockOption::NonBlock => "O_NONBLOCK",
			SockOption::ReuseAddr => "SO_REUSEADDR",
		}
	}
}

/// Bitmask of the options currently applied to a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options(u8);

impl Options {
	pub const fn empty() -> Self {
		Self(0)
	}

	pub fn contains(self, option: SockOption) -> bool {
		self.0 & option.bit() != 0
	}

	pub fn bits(self) -> u8 {
		self.0
	}

	pub(crate) fn set(&mut self, option: SockOption, enable: bool) {
		if enable {
			self.0 |= option.bit();
		} else {
			self.0 &= !option.bit();
		}
	}
}

impl Socket {
	/// Turns an option on or off.
	///
	/// Must happen between `open()` and `bind()`/`connect()`; afterwards the
	/// call is rejected and the socket fails.
	pub fn set_option(&mut self, option: SockOption, enable: bool) -> Result<(), SocketError> {
		self.check_state(State::Uninitialized, "set_option")?;

		let result = match option {
			SockOption::NonBlock => sys::set_nonblocking(self.raw(), enable),
			SockOption::ReuseAddr => sys::set_reuse_addr(self.raw(), enable),
		};
		if let Err(errno) = result {
			return Err(SocketError::os(self, "set_option", errno));
		}

		self.options.set(option, enable);
		tracing::trace!(fd = self.raw(), option = option.name(), enable, "option set");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bitmask_tracks_each_option_independently() {
		let mut options = Options::empty();
		options.set(SockOption::NonBlock, true);
		options.set(SockOption::ReuseAddr, true);
		assert_eq!(options.bits(), 3);

		options.set(SockOption::NonBlock, false);
		assert!(!options.contains(SockOption::NonBlock));
		assert!(options.contains(SockOption::ReuseAddr));
	}

	#[test]
	fn option_is_recorded_after_it_is_applied() {
		let mut sock = Socket::new().unwrap();
		sock.set_option(SockOption::NonBlock, true).unwrap();
		assert!(sock.options().contains(SockOption::NonBlock));

		let flags = unsafe { libc::fcntl(sock.raw(), libc::F_GETFL) };
		assert_ne!(flags & libc::O_NONBLOCK, 0);
	}
}
