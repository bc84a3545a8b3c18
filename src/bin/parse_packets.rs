// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use std::fs;

use log::{error, info, trace};
use vac_capture_rust_lib::packet_buffer::{PacketBuffer, PacketKind};

fn main() -> std::io::Result<()> {
    simple_logger::init_with_env().unwrap();
    {
        // record_packets saves slots back to back, 1473 bytes each.
        let bytes = fs::read("camera_packets")?;
        let buffer = match PacketBuffer::from_bytes(&bytes) {
            None => {
                error!("camera_packets is not a whole number of slots");
                return Ok(());
            }
            Some(val) => val,
        };

        for (index, slot) in buffer.filled(buffer.len()).enumerate() {
            match slot.kind() {
                Some(PacketKind::Data) => {
                    if let Some(header) = slot.data_header() {
                        trace!("{index}: {header:?}");
                    }
                }
                Some(PacketKind::Config) => trace!("{index}: config"),
                None => error!("{index}: unknown marker {}", slot.marker()),
            }
        }
        info!("Read {} packets", buffer.len());
    }
    Ok(())
}
