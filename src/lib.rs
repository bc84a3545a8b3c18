// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

pub mod capture;
pub mod command;
pub mod config;
pub mod drain;
pub mod incoming_packet_parser;
pub mod packet_buffer;
pub mod sockets;

/// Size of a data datagram from the camera: a 4 byte header followed
/// by pixel data.
pub const DATA_PACKET_SIZE: usize = 1472;

/// Size of a config datagram. Its contents are opaque at this layer.
pub const CONFIG_PACKET_SIZE: usize = 48;

/// Pixel bytes carried by one data packet. Every pixel offset the
/// camera sends is a multiple of this.
pub const PIXEL_BYTES_PER_PACKET: u32 = (DATA_PACKET_SIZE - 4) as u32;

/// One output slot: a kind marker byte followed by a full data packet.
pub const SLOT_SIZE: usize = DATA_PACKET_SIZE + 1;

/// Version of the capture engine, as (major, minor, bugfix).
pub const VERSION: (u32, u32, u32) = (1, 0, 0);
