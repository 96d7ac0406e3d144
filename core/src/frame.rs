//! Wire frame: magic, length-prefixed body, CRC, trailing magic — plus
//! the byte-level resynchronization that lets a receiver recover from
//! garbage injected ahead of a valid frame.
//!
//! ```text
//! offset  size  field
//! 0       2     magic = 0xCA 0xFE
//! 2       2     body_length L (uint16 LE)
//! 4       L     body = varint(len) || message-body-bytes
//! 4+L     2     crc16(bytes[0 .. 4+L))  (uint16 LE)
//! 4+L+2   2     trailing magic = 0xFA 0xDE
//! ```

use crate::crc::crc16;
use crate::error::{Error, Result};
use crate::message::MAX_DELIMITED_SIZE;
use crate::transport::{FrameReader, FrameWriter};

pub const HEADER_SIZE: usize = 4;
pub const FOOTER_SIZE: usize = 4;
pub const HEADER_MAGIC: [u8; 2] = [0xCA, 0xFE];
pub const TRAILER_MAGIC: [u8; 2] = [0xFA, 0xDE];

/// Largest body (including its own delimited-length prefix) this codec
/// will build or accept.
pub const MAX_BODY_LEN: usize = MAX_DELIMITED_SIZE;

/// Slack above the largest possible frame, mirroring the headroom the
/// original C buffer sizing carried for scratch-space safety.
pub const HEADROOM: usize = 8;

/// Minimum scratch buffer size a caller must provide to
/// [`read_frame`]/[`write_frame`].
pub const FRAME_SCRATCH_SIZE: usize = HEADER_SIZE + MAX_BODY_LEN + FOOTER_SIZE + HEADROOM;

/// Writes one frame wrapping `body` to `write`, using `scratch` to build
/// the frame bytes before a single transport write.
///
/// `scratch` must be at least `HEADER_SIZE + body.len() + FOOTER_SIZE`
/// bytes; `FRAME_SCRATCH_SIZE` is always sufficient.
pub fn write_frame<W: FrameWriter>(write: &mut W, body: &[u8], scratch: &mut [u8]) -> Result<()> {
    if body.len() > MAX_BODY_LEN {
        return Err(Error::MessageTooLarge);
    }
    let total = HEADER_SIZE + body.len() + FOOTER_SIZE;
    let frame = scratch.get_mut(..total).ok_or(Error::EncodeFailed)?;

    frame[0..2].copy_from_slice(&HEADER_MAGIC);
    frame[2..4].copy_from_slice(&(body.len() as u16).to_le_bytes());
    frame[HEADER_SIZE..HEADER_SIZE + body.len()].copy_from_slice(body);

    let crc = crc16(&frame[..HEADER_SIZE + body.len()]);
    let crc_at = HEADER_SIZE + body.len();
    frame[crc_at..crc_at + 2].copy_from_slice(&crc.to_le_bytes());
    frame[crc_at + 2..crc_at + 4].copy_from_slice(&TRAILER_MAGIC);

    write.write_all(frame)
}

/// Reads one frame from `read`, resynchronizing past any leading garbage,
/// verifying its CRC and trailing magic, and returning the body's length.
/// The body itself ends up in `scratch[HEADER_SIZE..HEADER_SIZE + L]`.
///
/// `scratch` must be at least `FRAME_SCRATCH_SIZE` bytes.
pub fn read_frame<R: FrameReader>(read: &mut R, scratch: &mut [u8]) -> Result<usize> {
    if scratch.len() < HEADER_SIZE {
        return Err(Error::DecodeFailed);
    }
    let mut window = [0u8; HEADER_SIZE];
    read.read_exact(&mut window)?;
    while window[0..2] != HEADER_MAGIC {
        window.copy_within(1..HEADER_SIZE, 0);
        read.read_exact(&mut window[HEADER_SIZE - 1..])?;
    }

    let body_len = u16::from_le_bytes([window[2], window[3]]) as usize;
    if body_len > MAX_BODY_LEN {
        return Err(Error::MessageTooLarge);
    }

    let total = HEADER_SIZE + body_len + FOOTER_SIZE;
    let frame = scratch.get_mut(..total).ok_or(Error::MessageTooLarge)?;
    frame[..HEADER_SIZE].copy_from_slice(&window);
    read.read_exact(&mut frame[HEADER_SIZE..total])?;

    let trailer_at = HEADER_SIZE + body_len + 2;
    if frame[trailer_at..total] != TRAILER_MAGIC {
        return Err(Error::DecodeFailed);
    }

    let expected = crc16(&frame[..HEADER_SIZE + body_len]);
    let crc_at = HEADER_SIZE + body_len;
    let actual = u16::from_le_bytes([frame[crc_at], frame[crc_at + 1]]);
    if expected != actual {
        return Err(Error::DecodeFailed);
    }

    Ok(body_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pipe {
        bytes: std::collections::VecDeque<u8>,
    }

    impl Pipe {
        fn new(bytes: &[u8]) -> Self {
            Self { bytes: bytes.iter().copied().collect() }
        }
    }

    impl FrameReader for Pipe {
        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.bytes.len() < buf.len() {
                return Err(Error::ReadTimeout);
            }
            for slot in buf.iter_mut() {
                *slot = self.bytes.pop_front().unwrap();
            }
            Ok(())
        }
    }

    struct Collector {
        written: Vec<u8>,
    }

    impl FrameWriter for Collector {
        fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            self.written.extend_from_slice(buf);
            Ok(())
        }
    }

    fn build_frame(body: &[u8]) -> Vec<u8> {
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        let mut out = Collector { written: Vec::new() };
        write_frame(&mut out, body, &mut scratch).unwrap();
        out.written
    }

    #[test]
    fn round_trips_a_frame() {
        let body = b"hello frame";
        let bytes = build_frame(body);
        let mut pipe = Pipe::new(&bytes);
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        let len = read_frame(&mut pipe, &mut scratch).unwrap();
        assert_eq!(&scratch[HEADER_SIZE..HEADER_SIZE + len], body);
    }

    #[test]
    fn resyncs_past_leading_garbage() {
        let body = b"payload";
        let mut stream = vec![0xDE, 0xAD, 0xBE, 0xEF];
        stream.extend(build_frame(body));
        let mut pipe = Pipe::new(&stream);
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        let len = read_frame(&mut pipe, &mut scratch).unwrap();
        assert_eq!(&scratch[HEADER_SIZE..HEADER_SIZE + len], body);
    }

    #[test]
    fn rejects_bad_crc() {
        let mut bytes = build_frame(b"abc");
        let crc_offset = HEADER_SIZE + 3;
        bytes[crc_offset] ^= 0x01;
        let mut pipe = Pipe::new(&bytes);
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        assert!(matches!(read_frame(&mut pipe, &mut scratch), Err(Error::DecodeFailed)));
    }

    #[test]
    fn rejects_bad_trailer() {
        let mut bytes = build_frame(b"abc");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let mut pipe = Pipe::new(&bytes);
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        assert!(matches!(read_frame(&mut pipe, &mut scratch), Err(Error::DecodeFailed)));
    }

    #[test]
    fn rejects_oversize_length_without_reading_a_fake_body() {
        let mut stream = vec![0xCA, 0xFE, 0xFF, 0xFF];
        stream.extend_from_slice(&[0u8; 4]);
        let mut pipe = Pipe::new(&stream);
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        assert!(matches!(read_frame(&mut pipe, &mut scratch), Err(Error::MessageTooLarge)));
    }

    #[test]
    fn resync_advances_exactly_one_byte_on_false_magic() {
        // 0xCA followed by a non-0xFE byte must not be treated as a match.
        let mut stream = vec![0xCA, 0x00, 0xCA, 0xFE];
        let body = b"x";
        let mut scratch = [0u8; FRAME_SCRATCH_SIZE];
        let mut out = Collector { written: Vec::new() };
        write_frame(&mut out, body, &mut scratch).unwrap();
        stream.extend(out.written[2..].iter().copied());
        let mut pipe = Pipe::new(&stream);
        let len = read_frame(&mut pipe, &mut scratch).unwrap();
        assert_eq!(&scratch[HEADER_SIZE..HEADER_SIZE + len], body);
    }
}
