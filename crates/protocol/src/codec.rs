use anyhow::{Context, Result};
use bincode::config;
use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, Read, Write};

/// Length (u32) + CRC32 (u32).
pub const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on a single payload. Anything larger is treated as garbage.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Outcome of reading one frame from a log.
#[derive(Debug)]
pub enum FrameRead<T> {
    /// A complete, checksummed frame and the number of bytes it occupied.
    Frame(T, usize),
    /// Clean end of input on a frame boundary.
    End,
    /// Partial, oversized or corrupt frame. Everything from here on is unusable.
    Torn,
}

/// Encode `msg` into a single frame.
///
/// Wire format:
///   - 4-byte big-endian payload length (u32)
///   - 4-byte big-endian CRC32 of the payload
///   - bincode payload
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(msg, config::standard())?;
    if payload.len() > MAX_FRAME_LEN {
        anyhow::bail!(
            "frame payload of {} bytes exceeds limit of {MAX_FRAME_LEN}",
            payload.len()
        );
    }
    let len: u32 = payload
        .len()
        .try_into()
        .context("frame payload too large for u32 length prefix")?;

    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Write `msg` as one frame with a single `write_all`, returning the bytes written.
pub fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<usize>
where
    W: Write,
    T: Serialize,
{
    let frame = encode_frame(msg)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(frame.len())
}

/// Read the next frame from `reader`.
pub fn read_frame<R, T>(reader: &mut R) -> Result<FrameRead<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    match read_full(reader, &mut header)? {
        0 => return Ok(FrameRead::End),
        n if n < FRAME_HEADER_LEN => return Ok(FrameRead::Torn),
        _ => {}
    }

    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    if len > MAX_FRAME_LEN {
        return Ok(FrameRead::Torn);
    }

    let mut payload = vec![0u8; len];
    if read_full(reader, &mut payload)? < len {
        return Ok(FrameRead::Torn);
    }
    if crc32fast::hash(&payload) != crc {
        return Ok(FrameRead::Torn);
    }

    match bincode::serde::decode_from_slice::<T, _>(&payload, config::standard()) {
        Ok((msg, _)) => Ok(FrameRead::Frame(msg, FRAME_HEADER_LEN + len)),
        Err(_) => Ok(FrameRead::Torn),
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF instead of failing.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
