// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::net::{SocketAddrV4, UdpSocket};
use std::time::Duration;

use log::trace;

use crate::sockets;

/// Every control datagram sent to the camera is exactly this long.
pub const COMMAND_SIZE: usize = 8;

const OPCODE_STREAM: u8 = 0x5A;
const OPCODE_EXPOSURE: u8 = 0xC0;
const STREAM_START_FLAG: u8 = 0x80;

/// A control command for the camera.
///
/// On the wire a command is `[opcode][payload][0; 5][checksum]`, where
/// the checksum is the sum of opcode and payload modulo 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub opcode: u8,
    pub payload: u8,
}

impl Command {
    /// Stops the video stream.
    pub const STOP: Command = Command {
        opcode: OPCODE_STREAM,
        payload: 0x00,
    };

    /// Starts the video stream in the given video format.
    pub fn start(video_format: u8) -> Command {
        return Command {
            opcode: OPCODE_STREAM,
            payload: video_format | STREAM_START_FLAG,
        };
    }

    pub fn set_exposure(exposure: u8) -> Command {
        return Command {
            opcode: OPCODE_EXPOSURE,
            payload: exposure,
        };
    }

    pub fn checksum(&self) -> u8 {
        return self.opcode.wrapping_add(self.payload);
    }

    pub fn to_bytes(&self) -> [u8; COMMAND_SIZE] {
        return [
            self.opcode,
            self.payload,
            0,
            0,
            0,
            0,
            0,
            self.checksum(),
        ];
    }

    /// Decodes a command datagram as the camera would see it. Anything
    /// that isn't exactly 8 bytes with zero padding and a matching
    /// checksum is rejected.
    pub fn from_bytes(datagram: &[u8]) -> Option<Command> {
        if datagram.len() != COMMAND_SIZE {
            return None;
        }
        if datagram[2..7].iter().any(|byte| *byte != 0) {
            return None;
        }
        let command = Command {
            opcode: datagram[0],
            payload: datagram[1],
        };
        if command.checksum() != datagram[7] {
            return None;
        }
        return Some(command);
    }
}

/// Sends `command` to the camera and then waits out `pacing_delay`.
///
/// The delay is skipped when the send itself fails.
pub fn send_command(
    socket: &UdpSocket,
    camera: SocketAddrV4,
    command: Command,
    pacing_delay: Duration,
) -> std::io::Result<()> {
    trace!("Sending {command:?} to {camera}");
    socket.send_to(&command.to_bytes(), camera)?;
    return sockets::sleep(pacing_delay);
}
