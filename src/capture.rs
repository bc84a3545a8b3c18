// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

//! Drives one capture session against the camera.
//!
//! A session runs the startup sequence, collects datagrams into a
//! [`PacketBuffer`] until a stop condition, then always runs the
//! shutdown sequence before handing the socket back. The socket stays
//! owned by the caller throughout; only its blocking flag and timeouts
//! are changed, and those are put back before returning.
//!
//! When the socket was blocking going in, its receive and send timeouts
//! come back set to `read_timeout`, whatever they were before. Callers
//! that need a different timeout have to set it again afterwards.

use std::io;
use std::net::UdpSocket;

use log::{debug, warn};

use crate::command::{send_command, Command};
use crate::config::CaptureConfig;
use crate::drain::drain_stale_packets;
use crate::incoming_packet_parser::{classify_packet, Classification, PacketFilter};
use crate::packet_buffer::{PacketBuffer, PacketKind};
use crate::sockets::{self, SavedFlags};
use crate::DATA_PACKET_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    Stop,
    Drain,
    Start,
    SetExposure,
}

/// Runs before any datagram is collected.
///
/// The exposure has to be set immediately after the stream starts. The
/// camera calibrates brightness against that moment, so setting it
/// anywhere else gives a visibly different image.
pub const STARTUP_SEQUENCE: [StartupStep; 4] = [
    StartupStep::Stop,
    StartupStep::Drain,
    StartupStep::Start,
    StartupStep::SetExposure,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStep {
    Stop,
    Settle,
    Drain,
    Restore,
}

/// Runs after collection ends, however it ended.
pub const SHUTDOWN_SEQUENCE: [ShutdownStep; 4] = [
    ShutdownStep::Stop,
    ShutdownStep::Settle,
    ShutdownStep::Drain,
    ShutdownStep::Restore,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Success,
    Timeout,
    TooManyMalformed,
    SystemError,
}

/// How a capture ended. Each variant except `SystemError` carries the
/// number of slots filled.
#[derive(Debug)]
pub enum CaptureResult {
    /// Either every requested frame arrived or the buffer is full.
    Success(usize),
    /// No datagram arrived within the read timeout.
    Timeout(usize),
    /// Too many wrongly-sized datagrams in a row.
    TooManyMalformed(usize),
    /// A socket operation failed. The buffer contents can't be trusted.
    SystemError(io::Error),
}

impl CaptureResult {
    pub fn status(&self) -> CaptureStatus {
        return match self {
            CaptureResult::Success(_) => CaptureStatus::Success,
            CaptureResult::Timeout(_) => CaptureStatus::Timeout,
            CaptureResult::TooManyMalformed(_) => CaptureStatus::TooManyMalformed,
            CaptureResult::SystemError(_) => CaptureStatus::SystemError,
        };
    }

    /// Slots filled, or 0 after a system error.
    pub fn packets_received(&self) -> usize {
        return match self {
            CaptureResult::Success(count)
            | CaptureResult::Timeout(count)
            | CaptureResult::TooManyMalformed(count) => *count,
            CaptureResult::SystemError(_) => 0,
        };
    }

    /// Numeric status as existing consumers expect it: 0 success,
    /// 1 timeout, 2 too many malformed, -1 system error.
    pub fn code(&self) -> i32 {
        return match self.status() {
            CaptureStatus::Success => 0,
            CaptureStatus::Timeout => 1,
            CaptureStatus::TooManyMalformed => 2,
            CaptureStatus::SystemError => -1,
        };
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        return match self {
            CaptureResult::SystemError(error) => error.raw_os_error(),
            _ => None,
        };
    }
}

/// Counts consecutive datagrams of a size the protocol never uses.
struct MalformedRun {
    count: u32,
    threshold: u32,
}

impl MalformedRun {
    fn new(threshold: u32) -> MalformedRun {
        return MalformedRun {
            count: 0,
            threshold,
        };
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    /// Returns true once the run is longer than the threshold.
    fn record(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        return self.count > self.threshold;
    }
}

/// Captures datagrams from the camera into `buffer`.
///
/// Slots are filled in arrival order starting from slot 0. Only the kind
/// markers are reset up front; slots past the returned count keep
/// whatever payload they had.
pub fn capture_packets(
    socket: &UdpSocket,
    config: &CaptureConfig,
    buffer: &mut PacketBuffer,
) -> CaptureResult {
    let saved = match sockets::enable_non_blocking(socket) {
        Ok(saved) => saved,
        Err(e) => return CaptureResult::SystemError(e),
    };
    buffer.reset_markers();

    run_startup(socket, config);
    let outcome = receive_packets(socket, config, buffer);
    let outcome = run_shutdown(socket, config, &saved, outcome);

    debug!("Capture from {} finished: {outcome:?}", config.camera);
    return outcome;
}

fn run_startup(socket: &UdpSocket, config: &CaptureConfig) {
    for step in STARTUP_SEQUENCE {
        debug!("Startup: {step:?}");
        let result = match step {
            StartupStep::Stop => {
                send_command(socket, config.camera, Command::STOP, config.command_delay)
            }
            StartupStep::Drain => {
                drain_stale_packets(socket, config.drain_settle_delay).map(|_| ())
            }
            StartupStep::Start => send_command(
                socket,
                config.camera,
                Command::start(config.video_format),
                config.command_delay,
            ),
            StartupStep::SetExposure => send_command(
                socket,
                config.camera,
                Command::set_exposure(config.exposure),
                config.command_delay,
            ),
        };
        // Nothing the camera does is acknowledged, so a failed step is
        // no reason to skip receiving.
        if let Err(e) = result {
            warn!("Startup step {step:?} failed: {e}");
        }
    }
}

fn receive_packets(
    socket: &UdpSocket,
    config: &CaptureConfig,
    buffer: &mut PacketBuffer,
) -> CaptureResult {
    let filter = PacketFilter::from_config(config);
    let mut malformed = MalformedRun::new(config.max_malformed);
    let mut scratch = [0u8; DATA_PACKET_SIZE];
    let mut received = 0;

    while received < buffer.len() {
        match sockets::wait_readable(socket, config.read_timeout) {
            Ok(true) => {}
            Ok(false) => return CaptureResult::Timeout(received),
            Err(e) => return CaptureResult::SystemError(e),
        }

        let (len, src) = match socket.recv_from(&mut scratch) {
            Ok(result) => result,
            Err(e) => return CaptureResult::SystemError(e),
        };
        let datagram = &scratch[..len];

        let kind = match classify_packet(datagram, &src, &filter) {
            Classification::Foreign => continue,
            Classification::Discarded(_) => {
                malformed.reset();
                continue;
            }
            Classification::FrameComplete => return CaptureResult::Success(received),
            Classification::Data(_) => PacketKind::Data,
            Classification::Config => PacketKind::Config,
            Classification::Malformed => {
                if malformed.record() {
                    return CaptureResult::TooManyMalformed(received);
                }
                continue;
            }
        };

        malformed.reset();
        buffer.store(received, kind, datagram);
        received += 1;
    }

    return CaptureResult::Success(received);
}

fn run_shutdown(
    socket: &UdpSocket,
    config: &CaptureConfig,
    saved: &SavedFlags,
    outcome: CaptureResult,
) -> CaptureResult {
    let mut outcome = outcome;
    for step in SHUTDOWN_SEQUENCE {
        debug!("Shutdown: {step:?}");
        let result = match step {
            ShutdownStep::Stop => {
                send_command(socket, config.camera, Command::STOP, config.command_delay)
            }
            ShutdownStep::Settle => sockets::sleep(config.stop_settle_delay),
            ShutdownStep::Drain => {
                drain_stale_packets(socket, config.drain_settle_delay).map(|_| ())
            }
            ShutdownStep::Restore => restore_socket(socket, config, saved),
        };
        let error = match result {
            Ok(()) => continue,
            Err(e) => e,
        };
        if step != ShutdownStep::Restore {
            warn!("Shutdown step {step:?} failed: {error}");
            continue;
        }
        // A socket left non-blocking breaks the caller, so this outranks
        // whatever happened while receiving. An earlier system error is
        // kept since it came first.
        outcome = match outcome {
            CaptureResult::SystemError(first) => CaptureResult::SystemError(first),
            _ => CaptureResult::SystemError(error),
        };
    }
    return outcome;
}

/// Puts back the blocking flag and leaves `read_timeout` on the socket.
/// Does nothing if the socket was already non-blocking when the capture
/// began.
fn restore_socket(socket: &UdpSocket, config: &CaptureConfig, saved: &SavedFlags) -> io::Result<()> {
    if !saved.changed() {
        return Ok(());
    }
    sockets::restore_blocking_mode(socket, saved)?;
    return sockets::set_timeout(socket, config.read_timeout);
}
