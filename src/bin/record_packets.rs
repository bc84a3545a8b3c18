// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

// This program captures one frame from the camera given as the first
// argument and saves the filled slots to a file called camera_packets
// in your current directory.

use vac_capture_rust_lib::capture::{capture_packets, CaptureResult};
use vac_capture_rust_lib::config::{parse_camera_address, CaptureConfig, VideoFormat, DEFAULT_REDUNDANCY};
use vac_capture_rust_lib::packet_buffer::PacketBuffer;
use vac_capture_rust_lib::{sockets, SLOT_SIZE};

use std::{
    fs::File,
    io::{BufWriter, Write},
};

use log::{error, info};

fn main() -> std::io::Result<()> {
    simple_logger::init_with_env().unwrap();
    {
        let address = std::env::args().nth(1).unwrap_or("192.168.1.10".to_string());
        let camera = match parse_camera_address(&address) {
            Ok(camera) => camera,
            Err(e) => {
                error!("{e}");
                return Ok(());
            }
        };

        let camera_socket = sockets::get_camera_socket(camera)?;
        let config = CaptureConfig::new(camera, VideoFormat::Format1920x1200);
        let mut buffer = PacketBuffer::new(config.slot_count(DEFAULT_REDUNDANCY));

        let received = match capture_packets(&camera_socket, &config, &mut buffer) {
            CaptureResult::SystemError(e) => return Err(e),
            result => result.packets_received(),
        };

        let mut file_writer = BufWriter::new(File::create_new("camera_packets")?);
        file_writer.write_all(&buffer.as_bytes()[..received * SLOT_SIZE])?;
        file_writer.flush()?;
        info!("Saved {received} packets");
    }
    Ok(())
}
