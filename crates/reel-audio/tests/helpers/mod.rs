//! Hand-built FLAC fixtures: 16-bit mono, verbatim subframes, fixed blocking.

use std::path::Path;

pub const FLAC_BLOCK_SIZE: usize = 4096;

/// 16-bit signal whose big-endian bytes never contain 0xFF, so sample data
/// cannot be mistaken for a frame sync code.
pub fn flac_safe_signal(frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| i16::from_be_bytes([((i * 7) % 255) as u8, ((i * 13 + 5) % 255) as u8]))
        .collect()
}

/// CRC-8, polynomial 0x07, as used by FLAC frame headers.
fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |mut crc, &byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 == 0 { crc << 1 } else { (crc << 1) ^ 0x07 };
        }
        crc
    })
}

/// CRC-16, polynomial 0x8005, as used by FLAC frame footers.
fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |mut crc, &byte| {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 { crc << 1 } else { (crc << 1) ^ 0x8005 };
        }
        crc
    })
}

/// 34-byte STREAMINFO body for a 16-bit mono stream. This is the stream's
/// magic cookie.
pub fn flac_stream_info(sample_rate: u32, total_samples: u64) -> Vec<u8> {
    let block = FLAC_BLOCK_SIZE as u16;
    let mut info = Vec::with_capacity(34);
    info.extend_from_slice(&block.to_be_bytes());
    info.extend_from_slice(&block.to_be_bytes());
    // Frame sizes unknown.
    info.extend_from_slice(&[0; 6]);
    let packed = (u64::from(sample_rate) << 44) | (15 << 36) | total_samples;
    info.extend_from_slice(&packed.to_be_bytes());
    // No MD5.
    info.extend_from_slice(&[0; 16]);
    info
}

/// One FLAC frame per block of `FLAC_BLOCK_SIZE` samples; the last may be short.
pub fn flac_frames(samples: &[i16]) -> Vec<Vec<u8>> {
    samples
        .chunks(FLAC_BLOCK_SIZE)
        .enumerate()
        .map(|(number, block)| {
            let full = block.len() == FLAC_BLOCK_SIZE;
            // Fixed blocking; 44.1 kHz; mono, 16 bits.
            let mut frame = vec![0xFF, 0xF8, if full { 0xC9 } else { 0x79 }, 0x08];
            frame.push(number as u8);
            if !full {
                frame.extend_from_slice(&(block.len() as u16 - 1).to_be_bytes());
            }
            frame.push(crc8(&frame));

            // Verbatim subframe.
            frame.push(0x02);
            for sample in block {
                frame.extend_from_slice(&sample.to_be_bytes());
            }
            let crc = crc16(&frame);
            frame.extend_from_slice(&crc.to_be_bytes());
            frame
        })
        .collect()
}

/// Write a 44.1 kHz mono FLAC file holding `samples`.
pub fn write_flac(path: &Path, samples: &[i16]) {
    let mut file = b"fLaC".to_vec();
    // Last metadata block, STREAMINFO, 34 bytes.
    file.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    file.extend_from_slice(&flac_stream_info(44100, samples.len() as u64));
    for frame in flac_frames(samples) {
        file.extend_from_slice(&frame);
    }
    std::fs::write(path, file).unwrap();
}

#[test]
fn test_crc_check_values() {
    assert_eq!(crc8(b"123456789"), 0xF4);
    assert_eq!(crc16(b"123456789"), 0xFEE8);
}
