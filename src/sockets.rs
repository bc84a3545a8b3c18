// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::os::fd::AsFd;
use std::os::raw::c_int;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::time::TimeSpec;
use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

/// File status flags of a socket as they were before the capture engine
/// touched them, plus the flags it switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedFlags {
    original: OFlag,
    non_blocking: OFlag,
}

impl SavedFlags {
    pub fn original(&self) -> c_int {
        return self.original.bits();
    }

    /// Whether enabling non-blocking mode actually changed anything.
    pub fn changed(&self) -> bool {
        return self.original != self.non_blocking;
    }
}

/// Binds a socket on every interface at the camera's port and connects
/// it to the camera, the way a caller of the capture engine sets up.
pub fn get_camera_socket(camera: SocketAddrV4) -> Result<UdpSocket, io::Error> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, camera.port()))?;
    socket.connect(camera)?;
    return Ok(socket);
}

pub fn status_flags(socket: &impl AsFd) -> io::Result<c_int> {
    return Ok(fcntl(socket, FcntlArg::F_GETFL)?);
}

/// Puts the socket in non-blocking mode, returning what is needed to
/// undo it. No flags are written if the socket is already non-blocking.
pub fn enable_non_blocking(socket: &impl AsFd) -> io::Result<SavedFlags> {
    let original = OFlag::from_bits_retain(status_flags(socket)?);
    let non_blocking = original | OFlag::O_NONBLOCK;
    if non_blocking != original {
        fcntl(socket, FcntlArg::F_SETFL(non_blocking))?;
    }
    return Ok(SavedFlags {
        original,
        non_blocking,
    });
}

pub fn restore_blocking_mode(socket: &impl AsFd, saved: &SavedFlags) -> io::Result<()> {
    if saved.changed() {
        fcntl(socket, FcntlArg::F_SETFL(saved.original))?;
    }
    return Ok(());
}

/// Applies `timeout` as both the receive and the send timeout. A zero
/// duration clears both timeouts.
pub fn set_timeout(socket: &UdpSocket, timeout: Duration) -> io::Result<()> {
    let timeout = if timeout.is_zero() {
        None
    } else {
        Some(timeout)
    };
    socket.set_read_timeout(timeout)?;
    socket.set_write_timeout(timeout)?;
    return Ok(());
}

/// Waits until the socket has a datagram (or an error) pending.
///
/// Returns `Ok(false)` if nothing arrived within `timeout`, which is
/// rounded up to whole milliseconds. Interrupted waits are reported as
/// errors rather than retried.
pub fn wait_readable(socket: &impl AsFd, timeout: Duration) -> io::Result<bool> {
    let timeout_ms = timeout.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as u32;
    let timeout = PollTimeout::try_from(timeout_ms)
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;

    let mut poll_fds = [PollFd::new(
        socket.as_fd(),
        PollFlags::POLLIN | PollFlags::POLLERR,
    )];
    let ready = poll(&mut poll_fds, timeout)?;
    return Ok(ready > 0);
}

/// Sleeps for `duration`, picking up where it left off when a signal
/// interrupts the sleep.
pub fn sleep(duration: Duration) -> io::Result<()> {
    let deadline = clock_gettime(ClockId::CLOCK_MONOTONIC)? + TimeSpec::from_duration(duration);
    loop {
        match clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            &deadline,
        ) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
