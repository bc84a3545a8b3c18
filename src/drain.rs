// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::io::{self, ErrorKind};
use std::net::UdpSocket;
use std::time::Duration;

use log::trace;

use crate::{sockets, DATA_PACKET_SIZE};

/// Throws away every datagram already queued on the socket.
///
/// Sleeps `settle_delay` first so that whatever the camera still has in
/// flight lands in the queue. The socket must already be non-blocking:
/// the drain stops at the first receive that would block. Returns the
/// number of datagrams discarded.
pub fn drain_stale_packets(socket: &UdpSocket, settle_delay: Duration) -> io::Result<usize> {
    let mut scratch = [0u8; DATA_PACKET_SIZE];

    sockets::sleep(settle_delay)?;

    let mut dropped = 0;
    loop {
        match socket.recv_from(&mut scratch) {
            Ok(_) => dropped += 1,
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }
    trace!("Dropped {dropped} stale datagrams");
    return Ok(dropped);
}
