// Binary DFA format: header parsing, validation

use crate::DfaError;

/// Header magic constants (little-endian).
const COOKIE1: u32 = 0x4446_5446;
const COOKIE2: u32 = 0x0A0D_0A1A;

/// Current layout version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Parsed DFA file header.
///
/// The header occupies the first 16 bytes of a serialized DFA:
/// - bytes 0..4: cookie1 (magic number)
/// - bytes 4..8: cookie2 (magic number)
/// - byte 8: layout version
/// - bytes 9..16: reserved (must be zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfaHeader {
    pub version: u8,
}

/// Parses and validates the 16-byte header.
pub fn parse_header(data: &[u8]) -> Result<DfaHeader, DfaError> {
    if data.len() < HEADER_SIZE {
        return Err(DfaError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(DfaError::InvalidMagic);
    }

    let version = data[8];
    if version != FORMAT_VERSION {
        return Err(DfaError::UnsupportedVersion(version));
    }
    if data[9..HEADER_SIZE].iter().any(|&b| b != 0) {
        return Err(DfaError::InvalidTable("reserved header bytes are not zero".to_string()));
    }

    Ok(DfaHeader { version })
}

/// Append a header for the current layout version.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&COOKIE1.to_le_bytes());
    out.extend_from_slice(&COOKIE2.to_le_bytes());
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&[0u8; HEADER_SIZE - 9]);
}
