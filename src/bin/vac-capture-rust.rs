// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

// Captures from the camera given as the first argument (host[:port])
// and logs what came back. An optional second argument sets the number
// of frames.

use vac_capture_rust_lib::capture::capture_packets;
use vac_capture_rust_lib::config::{parse_camera_address, CaptureConfig, VideoFormat, DEFAULT_REDUNDANCY};
use vac_capture_rust_lib::packet_buffer::{PacketBuffer, PacketKind};
use vac_capture_rust_lib::{sockets, VERSION};

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

        let mut config = CaptureConfig::new(camera, VideoFormat::Format1920x1200);
        if let Some(frames) = std::env::args().nth(2) {
            config.frames = frames.parse().unwrap_or(0);
        }
        if let Err(e) = config.validate() {
            error!("{e}");
            return Ok(());
        }

        let (major, minor, bugfix) = VERSION;
        info!("Capture engine {major}.{minor}.{bugfix}, camera {camera}");
        let camera_socket = sockets::get_camera_socket(camera)?;
        let mut buffer = PacketBuffer::new(config.slot_count(DEFAULT_REDUNDANCY));

        let result = capture_packets(&camera_socket, &config, &mut buffer);
        let received = result.packets_received();

        let mut data = 0;
        let mut configs = 0;
        for slot in buffer.filled(received) {
            match slot.kind() {
                Some(PacketKind::Data) => data += 1,
                Some(PacketKind::Config) => configs += 1,
                None => {}
            }
        }
        info!("{:?}: {received} packets, {data} data and {configs} config", result.status());
        if let Some(code) = result.raw_os_error() {
            error!("System error {code}");
        }
    }
    Ok(())
}
