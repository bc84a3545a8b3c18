// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;

/// Port the camera listens on unless told otherwise.
pub const DEFAULT_CAMERA_PORT: u16 = 1024;

/// Expected ratio of datagrams received to unique packets needed. Covers
/// the config packet and duplicates on a busy network.
pub const DEFAULT_REDUNDANCY: f64 = 1.5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid camera address {0:?}, expected an IPv4 host[:port]")]
    Address(String),

    #[error("unknown video format code {0}")]
    VideoFormat(u8),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Video formats the camera can stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VideoFormat {
    Format960x600 = 0,
    Format1920x1200 = 1,
    Format960x600TenBit = 2,
    Format1920x1200TenBit = 3,
}

impl VideoFormat {
    pub fn code(&self) -> u8 {
        return *self as u8;
    }

    pub fn width(&self) -> u32 {
        return match self {
            VideoFormat::Format960x600 | VideoFormat::Format960x600TenBit => 960,
            VideoFormat::Format1920x1200 | VideoFormat::Format1920x1200TenBit => 1920,
        };
    }

    pub fn height(&self) -> u32 {
        return match self {
            VideoFormat::Format960x600 | VideoFormat::Format960x600TenBit => 600,
            VideoFormat::Format1920x1200 | VideoFormat::Format1920x1200TenBit => 1200,
        };
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        return match self {
            VideoFormat::Format960x600 | VideoFormat::Format1920x1200 => 1,
            VideoFormat::Format960x600TenBit | VideoFormat::Format1920x1200TenBit => 2,
        };
    }

    /// Data packets the camera sends for one frame in this format.
    pub fn packets_per_frame(&self) -> u32 {
        return match self {
            VideoFormat::Format960x600 => 393,
            VideoFormat::Format1920x1200 => 1570,
            VideoFormat::Format960x600TenBit => 785,
            VideoFormat::Format1920x1200TenBit => 3139,
        };
    }
}

impl TryFrom<u8> for VideoFormat {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        return match code {
            0 => Ok(VideoFormat::Format960x600),
            1 => Ok(VideoFormat::Format1920x1200),
            2 => Ok(VideoFormat::Format960x600TenBit),
            3 => Ok(VideoFormat::Format1920x1200TenBit),
            _ => Err(ConfigError::VideoFormat(code)),
        };
    }
}

/// Settings for one capture. Nothing here changes while a capture runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Commands go here. Only packets from this IP are accepted; the
    /// source port is not checked.
    pub camera: SocketAddrV4,
    /// Stop once a packet from a frame past this one arrives.
    pub frames: u32,
    pub packets_per_frame: u32,
    /// Sent as the payload of the start command.
    pub video_format: u8,
    pub exposure: u8,
    /// Pause after every command sent.
    pub command_delay: Duration,
    /// Pause between the final stop command and the final drain.
    pub stop_settle_delay: Duration,
    /// Pause before a drain starts reading.
    pub drain_settle_delay: Duration,
    /// How long to wait for each datagram. Also left on the socket as its
    /// receive and send timeout once the capture is over.
    pub read_timeout: Duration,
    /// Consecutive wrongly-sized datagrams tolerated before giving up.
    pub max_malformed: u32,
}

impl CaptureConfig {
    pub fn new(camera: SocketAddrV4, format: VideoFormat) -> CaptureConfig {
        return CaptureConfig {
            camera,
            frames: 1,
            packets_per_frame: format.packets_per_frame(),
            video_format: format.code(),
            exposure: 0x01,
            command_delay: Duration::from_millis(20),
            stop_settle_delay: Duration::from_millis(20),
            drain_settle_delay: Duration::from_millis(100),
            read_timeout: Duration::from_millis(1000),
            max_malformed: 100,
        };
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames == 0 {
            return Err(ConfigError::Zero("frames"));
        }
        if self.packets_per_frame == 0 {
            return Err(ConfigError::Zero("packets_per_frame"));
        }
        return Ok(());
    }

    /// Buffer size that should hold every packet of the requested frames.
    pub fn slot_count(&self, redundancy: f64) -> usize {
        return slot_count_for(self.frames, self.packets_per_frame, redundancy);
    }
}

/// Slots needed for `frames` frames: each frame's data packets plus one
/// config packet, scaled by `redundancy` for duplicates.
pub fn slot_count_for(frames: u32, packets_per_frame: u32, redundancy: f64) -> usize {
    let unique = frames as f64 * (packets_per_frame as f64 + 1.0);
    return (unique * redundancy).max(0.0) as usize;
}

/// Parses `host` or `host:port`. The host has to be an IPv4 address.
pub fn parse_camera_address(address: &str) -> Result<SocketAddrV4, ConfigError> {
    let invalid = || ConfigError::Address(address.to_string());

    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
        None => (address, DEFAULT_CAMERA_PORT),
    };
    let ip = host.parse::<Ipv4Addr>().map_err(|_| invalid())?;
    return Ok(SocketAddrV4::new(ip, port));
}
