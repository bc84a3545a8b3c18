// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use arbitrary_int::u24;
use bitter::{BigEndianReader, BitReader};
use log::{max_level, trace, LevelFilter};

use crate::config::CaptureConfig;
use crate::{CONFIG_PACKET_SIZE, DATA_PACKET_SIZE, PIXEL_BYTES_PER_PACKET};

/// The header at the start of every data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    /// 1-255 for real frames. 0 marks packets the camera wants thrown
    /// away, usually the overexposed frame right after a start.
    pub frame_number: u8,
    /// Byte position of this packet's pixel data within its frame.
    pub pixel_offset: u24,
}

impl DataHeader {
    pub fn is_sentinel(&self) -> bool {
        return self.frame_number == 0;
    }
}

/// Reads the 4 byte data packet header:
/// `[frame number][offset hi][offset mid][offset lo]`.
pub fn parse_data_header(packet: &[u8]) -> Option<DataHeader> {
    let mut bits = BigEndianReader::new(packet);

    let frame_number = bits.read_u8()?;
    let pixel_offset = bits.read_bits(24)? as u32;

    return Some(DataHeader {
        frame_number,
        pixel_offset: u24::new(pixel_offset),
    });
}

/// Why a data packet from the camera was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    Sentinel,
    MisalignedOffset,
    OffsetOutOfRange,
}

/// What to do with one received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Right size, wrong sender. Not ours, so it changes nothing.
    Foreign,
    /// A data packet from the camera that must not reach the buffer.
    Discarded(Discard),
    /// The camera has moved past the last requested frame.
    FrameComplete,
    Data(DataHeader),
    Config,
    /// Matches neither protocol size.
    Malformed,
}

/// Everything the classifier needs to know about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketFilter {
    pub camera_ip: Ipv4Addr,
    pub frames: u32,
    pub packets_per_frame: u32,
}

impl PacketFilter {
    pub fn from_config(config: &CaptureConfig) -> PacketFilter {
        return PacketFilter {
            camera_ip: *config.camera.ip(),
            frames: config.frames,
            packets_per_frame: config.packets_per_frame,
        };
    }

    fn from_camera(&self, src: &SocketAddr) -> bool {
        return src.ip() == IpAddr::V4(self.camera_ip);
    }

    fn check_offset(&self, pixel_offset: u24) -> Result<(), Discard> {
        let offset = pixel_offset.value();
        if offset % PIXEL_BYTES_PER_PACKET != 0 {
            return Err(Discard::MisalignedOffset);
        }
        // A frame of N packets has its last packet at 1468 * (N - 1).
        let last_offset = match self.packets_per_frame.checked_sub(1) {
            Some(last_packet) => PIXEL_BYTES_PER_PACKET as u64 * last_packet as u64,
            None => return Err(Discard::OffsetOutOfRange),
        };
        if offset as u64 > last_offset {
            return Err(Discard::OffsetOutOfRange);
        }
        return Ok(());
    }
}

/// Decides what a received datagram is.
///
/// `packet` is the received bytes only, so its length is the datagram
/// size as reported by the receive call. The sender is checked by IP
/// address alone.
pub fn classify_packet(packet: &[u8], src: &SocketAddr, filter: &PacketFilter) -> Classification {
    let classification = match packet.len() {
        DATA_PACKET_SIZE => classify_data(packet, src, filter),
        CONFIG_PACKET_SIZE if filter.from_camera(src) => Classification::Config,
        CONFIG_PACKET_SIZE => Classification::Foreign,
        _ => Classification::Malformed,
    };
    if max_level() >= LevelFilter::Trace {
        let len = packet.len();
        trace!("{len} bytes from {src}: {classification:?}");
    }
    return classification;
}

fn classify_data(packet: &[u8], src: &SocketAddr, filter: &PacketFilter) -> Classification {
    if !filter.from_camera(src) {
        return Classification::Foreign;
    }
    let header = match parse_data_header(packet) {
        Some(header) => header,
        None => return Classification::Malformed,
    };
    if header.is_sentinel() {
        return Classification::Discarded(Discard::Sentinel);
    }
    if let Err(reason) = filter.check_offset(header.pixel_offset) {
        return Classification::Discarded(reason);
    }
    if header.frame_number as u32 > filter.frames {
        return Classification::FrameComplete;
    }
    return Classification::Data(header);
}
