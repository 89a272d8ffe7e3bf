// Message framing: a big-endian length prefix and zero padding that stretch
// a message to the exact plaintext size a capacity bucket needs.
//
//   +----------------+-----------------+------------------+
//   | len: u32 (BE)  | message (len)   | zero padding     |
//   +----------------+-----------------+------------------+

use crate::FteError;

/// Size of the length prefix.
pub const LENGTH_PREFIX: usize = 4;

/// Frame `message` into exactly `frame_len` bytes.
pub fn seal_frame(message: &[u8], frame_len: usize) -> Result<Vec<u8>, FteError> {
    let needed = LENGTH_PREFIX + message.len();
    let declared = u32::try_from(message.len()).map_err(|_| FteError::CapacityExceeded {
        needed,
        available: frame_len,
    })?;
    if needed > frame_len {
        return Err(FteError::CapacityExceeded {
            needed,
            available: frame_len,
        });
    }

    let mut frame = Vec::with_capacity(frame_len);
    frame.extend_from_slice(&declared.to_be_bytes());
    frame.extend_from_slice(message);
    frame.resize(frame_len, 0);
    Ok(frame)
}

/// Recover the message from a frame, checking the declared length and that
/// every padding byte is zero.
pub fn open_frame(frame: &[u8]) -> Result<Vec<u8>, FteError> {
    let Some((prefix, body)) = frame.split_first_chunk::<LENGTH_PREFIX>() else {
        return Err(FteError::Padding);
    };
    let declared = u32::from_be_bytes(*prefix) as usize;
    if declared > body.len() {
        return Err(FteError::Padding);
    }
    let (message, padding) = body.split_at(declared);
    // Inspect all of the padding rather than stopping at the first bad byte.
    if padding.iter().fold(0u8, |acc, &b| acc | b) != 0 {
        return Err(FteError::Padding);
    }
    Ok(message.to_vec())
}
