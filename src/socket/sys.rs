//! The OS boundary.
//!
//! Every function here makes exactly one kind of syscall and reports failure
//! as the `errno` read immediately after it, before any other code can run.

use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::{Family, SockAddr, ToSockAddr};
use crate::error::errno;
use super::ConnType;

pub(crate) type SysResult<T> = Result<T, i32>;

#[inline]
fn cvt(result: libc::c_int) -> SysResult<libc::c_int> {
	if result == -1 { Err(errno()) } else { Ok(result) }
}

#[inline]
fn cvt_size(result: libc::ssize_t) -> SysResult<usize> {
	if result == -1 { Err(errno()) } else { Ok(result as usize) }
}

/// `socket(2)` with `SOCK_CLOEXEC`.
pub(crate) fn create(family: Family, conn_type: ConnType) -> SysResult<OwnedFd> {
	let fd = cvt(unsafe {
		libc::socket(family.raw(), conn_type.raw() | libc::SOCK_CLOEXEC, 0)
	})?;
	Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

pub(crate) fn bind(fd: RawFd, addr: &SockAddr) -> SysResult<()> {
	cvt(addr.with_raw(|ptr, len| unsafe { libc::bind(fd, ptr, len) })).map(drop)
}

pub(crate) fn listen(fd: RawFd, backlog: i32) -> SysResult<()> {
	cvt(unsafe { libc::listen(fd, backlog) }).map(drop)
}

/// `accept4(2)`; the peer address is `None` if the kernel handed back a
/// family this crate does not model.
pub(crate) fn accept(fd: RawFd, flags: libc::c_int) -> SysResult<(OwnedFd, Option<SockAddr>, libc::socklen_t)> {
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

	let conn = cvt(unsafe {
		libc::accept4(
			fd,
			&mut storage as *mut _ as *mut libc::sockaddr,
			&mut len,
			flags | libc::SOCK_CLOEXEC,
		)
	})?;

	let conn = unsafe { OwnedFd::from_raw_fd(conn) };
	Ok((conn, SockAddr::from_storage(&storage, len), len))
}

pub(crate) fn connect(fd: RawFd, addr: &SockAddr) -> SysResult<()> {
	cvt(addr.with_raw(|ptr, len| unsafe { libc::connect(fd, ptr, len) })).map(drop)
}

pub(crate) fn send(fd: RawFd, buf: &[u8], flags: libc::c_int) -> SysResult<usize> {
	cvt_size(unsafe {
		libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), flags)
	})
}

pub(crate) fn recv(fd: RawFd, buf: &mut [u8], flags: libc::c_int) -> SysResult<usize> {
	cvt_size(unsafe {
		libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), flags)
	})
}

/// Zero-timeout `poll(2)` on a single descriptor. Returns `revents`.
pub(crate) fn poll(fd: RawFd, events: libc::c_short) -> SysResult<libc::c_short> {
	let mut polled = [libc::pollfd { fd, events, revents: 0 }];
	cvt(unsafe { libc::poll(polled.as_mut_ptr(), 1, 0) })?;
	Ok(polled[0].revents)
}

pub(crate) fn set_nonblocking(fd: RawFd, nonblocking: bool) -> SysResult<()> {
	let flags = cvt(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;

	let new_flags = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};

	cvt(unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) }).map(drop)
}

/// Sets SO_REUSEADDR.
///
/// Allows binding to an address that's in TIME_WAIT state.
pub(crate) fn set_reuse_addr(fd: RawFd, enable: bool) -> SysResult<()> {
	let val: libc::c_int = if enable { 1 } else { 0 };
	cvt(unsafe {
		libc::setsockopt(
			fd,
			libc::SOL_SOCKET,
			libc::SO_REUSEADDR,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	}).map(drop)
}

/// Closes the descriptor. Ownership is consumed whether or not the kernel
/// reports an error, so the descriptor is never released twice.
pub(crate) fn release(fd: OwnedFd) -> SysResult<()> {
	let raw = fd.into_raw_fd();
	cvt(unsafe { libc::close(raw) }).map(drop)
}

/// `getsockname(2)`.
pub(crate) fn local_addr(fd: RawFd) -> SysResult<Option<SockAddr>> {
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

	cvt(unsafe {
		libc::getsockname(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len)
	})?;

	Ok(SockAddr::from_storage(&storage, len))
}

/// `getpeername(2)`.
pub(crate) fn peer_addr(fd: RawFd) -> SysResult<Option<SockAddr>> {
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

	cvt(unsafe {
		libc::getpeername(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len)
	})?;

	Ok(SockAddr::from_storage(&storage, len))
}
