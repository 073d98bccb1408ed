use crate::error::SocketError;
use super::sys::{self, SysResult};
use super::{Socket, State};

/*
Every transfer makes one syscall attempt and sorts the outcome into one of
four buckets:

  ┌──────────────────────────────┬──────────────┬──────────────────┐
  │           Outcome            │   Returns    │      State       │
  ├──────────────────────────────┼──────────────┼──────────────────┤
  │ n > 0 bytes                  │ n            │ Ok               │
  ├──────────────────────────────┼──────────────┼──────────────────┤
  │ 0, ECONNRESET, EPIPE         │ 0            │ Closed           │
  ├──────────────────────────────┼──────────────┼──────────────────┤
  │ EAGAIN / EWOULDBLOCK, EINTR  │ 0            │ Ok               │
  ├──────────────────────────────┼──────────────┼──────────────────┤
  │ anything else                │ SocketError  │ Failed           │
  └──────────────────────────────┴──────────────┴──────────────────┘

Callers tell "peer gone" from "nothing yet" by checking is_closed().
The std::io impls keep the errno of the third bucket so that EINTR surfaces
as Interrupted (which std retries) rather than WouldBlock.
*/

/// Sorted result of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
	Moved(usize),
	PeerClosed,
	/// Nothing moved; carries `EAGAIN`/`EWOULDBLOCK` or `EINTR`.
	Pending(i32),
}

impl Transfer {
	fn bytes(self) -> usize {
		match self {
			Transfer::Moved(n) => n,
			Transfer::PeerClosed | Transfer::Pending(_) => 0,
		}
	}

	/// `std::io` view for a reader: peer closure is end of stream.
	fn into_read(self) -> std::io::Result<usize> {
		match self {
			Transfer::Moved(n) => Ok(n),
			Transfer::PeerClosed => Ok(0),
			Transfer::Pending(libc::EINTR) => Err(std::io::ErrorKind::Interrupted.into()),
			Transfer::Pending(_) => Err(std::io::ErrorKind::WouldBlock.into()),
		}
	}

	/// `std::io` view for a writer: peer closure is a broken pipe.
	fn into_write(self) -> std::io::Result<usize> {
		match self {
			Transfer::PeerClosed => Err(std::io::ErrorKind::BrokenPipe.into()),
			other => other.into_read(),
		}
	}
}

impl Socket {
	/// Writes `data` with a single `send(2)` attempt and returns the number
	/// of bytes the kernel took, which may be fewer than `data.len()`.
	///
	/// Returns 0 without raising when the peer has gone away (the socket is
	/// then `Closed`) or when a non-blocking socket would block.
	pub fn send(&mut self, data: &[u8]) -> Result<usize, SocketError> {
		self.send_with("send", data).map(Transfer::bytes)
	}

	/// Reads at most `max_bytes` and returns exactly what arrived.
	///
	/// An empty buffer means either the peer closed (check
	/// [`Socket::is_closed`]) or a non-blocking socket had nothing to read.
	pub fn recv(&mut self, max_bytes: usize) -> Result<Vec<u8>, SocketError> {
		let mut buf = vec![0u8; max_bytes];
		let n = self.recv_with("recv", &mut buf)?.bytes();
		buf.truncate(n);
		Ok(buf)
	}

	/// Like [`Socket::recv`], into a caller-provided buffer.
	pub fn recv_into(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
		self.recv_with("recv", buf).map(Transfer::bytes)
	}

	/// Checks that **`self`** is `Ok`, then sends on **`peer`**.
	///
	/// The state check and the transfer target are different sockets: a
	/// closed `peer` fails `peer`, while a closed `self` fails `self` and
	/// nothing is sent.
	pub fn send_to(&mut self, peer: &mut Socket, data: &[u8]) -> Result<usize, SocketError> {
		self.check_state(State::Ok, "send_to")?;
		peer.send(data)
	}

	/// Checks that **`self`** is `Ok`, then receives from **`peer`**.
	///
	/// Same asymmetry as [`Socket::send_to`].
	pub fn recv_from(&mut self, peer: &mut Socket, max_bytes: usize) -> Result<Vec<u8>, SocketError> {
		self.check_state(State::Ok, "recv_from")?;
		peer.recv(max_bytes)
	}

	fn send_with(&mut self, op: &'static str, data: &[u8]) -> Result<Transfer, SocketError> {
		self.check_state(State::Ok, op)?;
		if data.is_empty() {
			return Ok(Transfer::Moved(0));
		}
		let result = sys::send(self.raw(), data, libc::MSG_NOSIGNAL);
		self.settle(op, result)
	}

	fn recv_with(&mut self, op: &'static str, buf: &mut [u8]) -> Result<Transfer, SocketError> {
		self.check_state(State::Ok, op)?;
		if buf.is_empty() {
			return Ok(Transfer::Moved(0));
		}
		let result = sys::recv(self.raw(), buf, 0);
		self.settle(op, result)
	}

	fn settle(&mut self, op: &'static str, result: SysResult<usize>) -> Result<Transfer, SocketError> {
		match result {
			Ok(0) | Err(libc::ECONNRESET) | Err(libc::EPIPE) => {
				tracing::debug!(fd = self.raw(), op, "peer closed connection");
				self.close()?;
				Ok(Transfer::PeerClosed)
			}
			Ok(n) => {
				tracing::trace!(fd = self.raw(), op, bytes = n, "transfer");
				Ok(Transfer::Moved(n))
			}
			Err(errno) if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK || errno == libc::EINTR => {
				tracing::trace!(fd = self.raw(), op, errno, "transfer would block");
				Ok(Transfer::Pending(errno))
			}
			Err(errno) => Err(SocketError::os(self, op, errno)),
		}
	}
}

/// Reads through the same path as [`Socket::recv_into`].
///
/// A would-block read surfaces as `ErrorKind::WouldBlock` so that `Ok(0)`
/// keeps meaning end of stream. A read cut short by a signal surfaces as
/// `ErrorKind::Interrupted`.
impl std::io::Read for Socket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.recv_with("recv", buf)?.into_read()
	}
}

/// A write on a closed peer surfaces as `ErrorKind::BrokenPipe`.
impl std::io::Write for Socket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.send_with("send", buf)?.into_write()
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())  // nothing buffered at this level
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::ErrorKind;

	#[test]
	fn benign_outcomes_move_no_bytes() {
		assert_eq!(Transfer::Moved(7).bytes(), 7);
		assert_eq!(Transfer::PeerClosed.bytes(), 0);
		assert_eq!(Transfer::Pending(libc::EINTR).bytes(), 0);
	}

	#[test]
	fn interrupted_is_not_would_block() {
		let err = Transfer::Pending(libc::EINTR).into_read().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Interrupted);
		let err = Transfer::Pending(libc::EAGAIN).into_read().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::WouldBlock);
		let err = Transfer::Pending(libc::EINTR).into_write().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Interrupted);
	}

	#[test]
	fn peer_close_is_eof_on_read_and_broken_pipe_on_write() {
		assert_eq!(Transfer::PeerClosed.into_read().unwrap(), 0);
		let err = Transfer::PeerClosed.into_write().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::BrokenPipe);
	}
}
