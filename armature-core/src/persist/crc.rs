//! CRC-16/CCITT-FALSE

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Checksum a byte slice (poly 0x1021, init 0xFFFF, no reflection)
pub fn crc16(data: &[u8]) -> u16 {
    crc16_update(INIT, data)
}

fn crc16_update(crc: u16, data: &[u8]) -> u16 {
    let mut crc = crc;

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
