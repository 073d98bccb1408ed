//! Address families and address records.
//!
//! Two families are supported:
//! - `Ipv4` — Internet Protocol version 4
//! - `Ipv6` — Internet Protocol version 6

mod ipv4;
mod ipv6;
pub use self::ipv4::SocketAddrV4;
pub use self::ipv6::SocketAddrV6;

/// Address family a socket is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Family {
	#[default]
	Ipv4,
	Ipv6,
}

impl Family {
	/// Returns the libc constant for this address family.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			Family::Ipv4 => libc::AF_INET,
			Family::Ipv6 => libc::AF_INET6,
		}
	}

	pub(crate) fn from_raw(raw: libc::c_int) -> Option<Self> {
		match raw {
			libc::AF_INET => Some(Family::Ipv4),
			libc::AF_INET6 => Some(Family::Ipv6),
			_ => None,
		}
	}
}

/// Address record of a socket: family, IP and port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockAddr {
	V4(SocketAddrV4),
	V6(SocketAddrV6),
}

impl SockAddr {
	/// Parses a textual address in the given family.
	///
	/// Returns `None` when the text is not a literal of that family; no name
	/// resolution is attempted.
	pub fn parse(text: &str, port: u16, family: Family) -> Option<Self> {
		match family {
			Family::Ipv4 => SocketAddrV4::parse(text, port).map(SockAddr::V4),
			Family::Ipv6 => SocketAddrV6::parse(text, port).map(SockAddr::V6),
		}
	}

	pub fn family(&self) -> Family {
		match self {
			SockAddr::V4(_) => Family::Ipv4,
			SockAddr::V6(_) => Family::Ipv6,
		}
	}

	pub fn port(&self) -> u16 {
		match self {
			SockAddr::V4(addr) => addr.port(),
			SockAddr::V6(addr) => addr.port(),
		}
	}

	/// Reads an address the kernel wrote into `storage`.
	pub(crate) fn from_storage(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> Option<Self> {
		let ptr = storage as *const _ as *const libc::sockaddr;
		// SAFETY: sockaddr_storage is large and aligned enough for every family,
		// and each from_sockaddr checks `len` before reading.
		unsafe {
			match Family::from_raw(storage.ss_family as libc::c_int)? {
				Family::Ipv4 => SocketAddrV4::from_sockaddr(ptr, len).map(SockAddr::V4),
				Family::Ipv6 => SocketAddrV6::from_sockaddr(ptr, len).map(SockAddr::V6),
			}
		}
	}
}

impl std::fmt::Display for SockAddr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SockAddr::V4(addr) => std::fmt::Display::fmt(addr, f),
			SockAddr::V6(addr) => std::fmt::Display::fmt(addr, f),
		}
	}
}

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}
/*
Why a closure pattern? sockaddr_in and sockaddr_in6 are different sizes and
we can't return a pointer to a local variable. The closure lets the syscall
use the stack-allocated struct while it's still alive.
 */

impl ToSockAddr for SockAddr {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		match self {
			SockAddr::V4(addr) => addr.with_raw(f),
			SockAddr::V6(addr) => addr.with_raw(f),
		}
	}
}

/// Trait for address types that can be created from raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates address from raw sockaddr storage.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes, and the sockaddr
	/// must be of the correct family for this type.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_ipv4_literal() {
		let addr = SockAddr::parse("127.0.0.1", 8080, Family::Ipv4).unwrap();
		assert_eq!(addr, SockAddr::V4(SocketAddrV4::new([127, 0, 0, 1], 8080)));
		assert_eq!(addr.family(), Family::Ipv4);
		assert_eq!(addr.to_string(), "127.0.0.1:8080");
	}

	#[test]
	fn parses_ipv6_literal() {
		let addr = SockAddr::parse("::1", 443, Family::Ipv6).unwrap();
		let mut ip = [0u8; 16];
		ip[15] = 1;
		assert_eq!(addr, SockAddr::V6(SocketAddrV6::new(ip, 443)));
		assert_eq!(addr.to_string(), "[::1]:443");
	}

	#[test]
	fn rejects_text_of_the_wrong_family() {
		assert!(SockAddr::parse("::1", 80, Family::Ipv4).is_none());
		assert!(SockAddr::parse("10.0.0.1", 80, Family::Ipv6).is_none());
	}

	#[test]
	fn rejects_garbage_and_hostnames() {
		assert!(SockAddr::parse("", 80, Family::Ipv4).is_none());
		assert!(SockAddr::parse("256.0.0.1", 80, Family::Ipv4).is_none());
		assert!(SockAddr::parse("localhost", 80, Family::Ipv4).is_none());
	}

	#[test]
	fn raw_round_trip_keeps_byte_order() {
		let addr = SocketAddrV4::new([192, 168, 1, 20], 5000);
		let raw = addr.to_raw();
		assert_eq!(u16::from_be(raw.sin_port), 5000);
		assert_eq!(SocketAddrV4::from_raw(&raw), addr);

		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, raw);
		}
		assert_eq!(SockAddr::from_storage(&storage, SocketAddrV4::RAW_LEN), Some(SockAddr::V4(addr)));
	}

	#[test]
	fn short_storage_is_rejected() {
		let addr = SocketAddrV4::new([10, 0, 0, 1], 1);
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, addr.to_raw());
		}
		assert_eq!(SockAddr::from_storage(&storage, 2), None);
	}
}
