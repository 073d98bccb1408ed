//! Signals landing on a thread blocked in a socket call.
//!
//! The handler is installed without `SA_RESTART`, so the kernel hands
//! `EINTR` back to whatever syscall was waiting.

use std::io::{ErrorKind, Read};
use std::sync::{mpsc, Once};
use std::thread;
use std::time::Duration;
use socklane::{Family, SockOption, Socket, State};

extern "C" fn on_signal(_: libc::c_int) {}

fn install_handler() {
	static INSTALL: Once = Once::new();
	INSTALL.call_once(|| unsafe {
		let mut action: libc::sigaction = std::mem::zeroed();
		action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
		action.sa_flags = 0;
		libc::sigemptyset(&mut action.sa_mask);
		assert_eq!(libc::sigaction(libc::SIGUSR1, &action, std::ptr::null_mut()), 0);
	});
}

fn listener() -> (Socket, u16) {
	let mut server = Socket::new().unwrap();
	server.set_option(SockOption::ReuseAddr, true).unwrap();
	server.bind("127.0.0.1", 0).unwrap();
	server.listen(4).unwrap();
	let port = server.local_addr().unwrap().port();
	(server, port)
}

fn pair() -> (Socket, Socket, Socket) {
	let (mut server, port) = listener();
	let mut client = Socket::new().unwrap();
	client.connect("127.0.0.1", port, Family::Ipv4).unwrap();
	let conn = Socket::from_accepted(server.accept().unwrap());
	(server, client, conn)
}

/// Signals `target` repeatedly until `done` holds, so that at least one
/// signal lands while it is blocked.
fn interrupt_until(target: libc::pthread_t, mut done: impl FnMut() -> bool) {
	for _ in 0..200 {
		if done() {
			return;
		}
		unsafe { libc::pthread_kill(target, libc::SIGUSR1) };
		thread::sleep(Duration::from_millis(5));
	}
}

#[test]
fn blocking_accept_resumes_after_signal() {
	install_handler();
	let (mut server, port) = listener();

	let (tx, rx) = mpsc::channel();
	let waiter = thread::spawn(move || {
		tx.send(unsafe { libc::pthread_self() }).unwrap();
		let result = server.accept().map(|conn| conn.peer().port());
		(server, result)
	});
	let tid = rx.recv().unwrap();

	// accept() never returns on its own here, so signal a fixed number of times.
	let mut rounds = 0;
	interrupt_until(tid, || {
		rounds += 1;
		rounds > 20
	});

	let mut client = Socket::new().unwrap();
	client.connect("127.0.0.1", port, Family::Ipv4).unwrap();

	let (server, result) = waiter.join().unwrap();
	assert_eq!(result.unwrap(), client.local_addr().unwrap().port());
	assert_eq!(server.state(), State::Ok);
}

#[test]
fn blocking_read_reports_interrupted() {
	install_handler();
	let (_server, mut client, mut conn) = pair();

	let (tx, rx) = mpsc::channel();
	let reader = thread::spawn(move || {
		tx.send(unsafe { libc::pthread_self() }).unwrap();
		let mut buf = [0u8; 16];
		let result = client.read(&mut buf).map_err(|err| err.kind());
		(client, result)
	});
	let tid = rx.recv().unwrap();
	interrupt_until(tid, || reader.is_finished());
	if !reader.is_finished() {
		// Unblock the reader so the assertion below reports the failure.
		conn.send(b"x").unwrap();
	}

	let (client, result) = reader.join().unwrap();
	assert_eq!(result, Err(ErrorKind::Interrupted));
	assert_eq!(client.state(), State::Ok);
}

#[test]
fn read_exact_retries_across_signals() {
	install_handler();
	let (_server, mut client, mut conn) = pair();

	let (tx, rx) = mpsc::channel();
	let reader = thread::spawn(move || {
		tx.send(unsafe { libc::pthread_self() }).unwrap();
		let mut buf = [0u8; 4];
		let result = client.read_exact(&mut buf).map(|()| buf).map_err(|err| err.kind());
		(client, result)
	});
	let tid = rx.recv().unwrap();

	let mut rounds = 0;
	interrupt_until(tid, || {
		rounds += 1;
		rounds > 20 || reader.is_finished()
	});
	conn.send(b"data").unwrap();

	let (client, result) = reader.join().unwrap();
	assert_eq!(result, Ok(*b"data"));
	assert!(client.is_ok());
}
