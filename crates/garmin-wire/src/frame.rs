//! Frame encoding/decoding utilities.
//!
//! Every protocol exchange travels in a framed message with a fixed 7-byte
//! header followed by the payload:
//!
//! ```text
//! +--------+--------+--------+-------+-------+-------+-------+-----------------+
//! | opcode | len_lo | len_hi | crc_0 | crc_1 | crc_2 | crc_3 | payload[0..len] |
//! +--------+--------+--------+-------+-------+-------+-------+-----------------+
//! ```
//!
//! The CRC-32 covers opcode + length + payload (everything except the CRC
//! field itself). Both length and CRC are little-endian.

use bytes::{Buf, BytesMut};

use crate::checksum::Crc32;
use crate::constants::{FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD};
use crate::error::WireError;

/// Encode a frame for transmission.
///
/// Pure function; fails only when the payload exceeds [`MAX_FRAME_PAYLOAD`].
pub fn encode_frame(opcode: u8, payload: &[u8]) -> Result<Vec<u8>, WireError> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(WireError::FrameTooLarge {
            max: MAX_FRAME_PAYLOAD,
            actual: payload.len(),
        });
    }

    let len = (payload.len() as u16).to_le_bytes();
    let mut digest = Crc32::new();
    digest.update(&[opcode]);
    digest.update(&len);
    digest.update(payload);
    let crc = digest.finalize();

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.push(opcode);
    buf.extend_from_slice(&len);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decode a single complete frame from a byte slice.
///
/// Fails with [`WireError::Truncated`] when fewer bytes are present than the
/// header declares. Bytes beyond the declared frame are ignored.
pub fn decode_frame(bytes: &[u8]) -> Result<(u8, Vec<u8>), WireError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(WireError::Truncated {
            expected: FRAME_HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let opcode = bytes[0];
    let len = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
    if len > MAX_FRAME_PAYLOAD {
        return Err(WireError::FrameTooLarge {
            max: MAX_FRAME_PAYLOAD,
            actual: len,
        });
    }
    if bytes.len() < FRAME_HEADER_SIZE + len {
        return Err(WireError::Truncated {
            expected: FRAME_HEADER_SIZE + len,
            actual: bytes.len(),
        });
    }

    let expected = u32::from_le_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]);
    let payload = &bytes[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + len];
    let mut digest = Crc32::new();
    digest.update(&bytes[..3]);
    digest.update(payload);
    let actual = digest.finalize();
    if actual != expected {
        return Err(WireError::ChecksumMismatch { expected, actual });
    }

    Ok((opcode, payload.to_vec()))
}

/// A resumable decoder for framed messages arriving in arbitrary chunks.
///
/// Bytes are fed in with [`push`](FrameCodec::push) as they arrive from the
/// transport; [`decode`](FrameCodec::decode) yields at most one complete
/// frame per call and never blocks on a guess about stream boundaries.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(FRAME_HEADER_SIZE + MAX_FRAME_PAYLOAD),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete frame from the buffer.
    ///
    /// Returns `Ok(Some((opcode, payload)))` once a full frame (header plus
    /// declared payload length) is buffered, `Ok(None)` if more data is
    /// needed, or an error for a corrupt frame. A frame that fails its
    /// checksum is consumed from the buffer before the error is returned.
    pub fn decode(&mut self) -> Result<Option<(u8, Vec<u8>)>, WireError> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let len = u16::from_le_bytes([self.buffer[1], self.buffer[2]]) as usize;
        if len > MAX_FRAME_PAYLOAD {
            // A corrupt length field leaves no way to find the next frame
            // boundary; the caller must reset the stream.
            return Err(WireError::FrameTooLarge {
                max: MAX_FRAME_PAYLOAD,
                actual: len,
            });
        }

        if self.buffer.len() < FRAME_HEADER_SIZE + len {
            return Ok(None);
        }

        let opcode = self.buffer[0];
        let expected = u32::from_le_bytes([
            self.buffer[3],
            self.buffer[4],
            self.buffer[5],
            self.buffer[6],
        ]);

        let mut digest = Crc32::new();
        digest.update(&self.buffer[..3]);
        digest.update(&self.buffer[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + len]);
        let actual = digest.finalize();

        self.buffer.advance(FRAME_HEADER_SIZE);
        let payload = self.buffer.split_to(len).to_vec();

        if actual != expected {
            return Err(WireError::ChecksumMismatch { expected, actual });
        }

        Ok(Some((opcode, payload)))
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{OP_IDENTIFY, OP_LIST_INSTALLED};

    #[test]
    fn test_pinned_identify_frame() {
        // Captured host → device identify frame: opcode 0x01, payload 2.0.
        let encoded = encode_frame(OP_IDENTIFY, &[2, 0]).unwrap();
        assert_eq!(encoded, hex::decode("010200a4747d630200").unwrap());
    }

    #[test]
    fn test_pinned_empty_payload_frame() {
        let encoded = encode_frame(OP_LIST_INSTALLED, &[]).unwrap();
        assert_eq!(encoded, hex::decode("0200007c0dc5fc").unwrap());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"segment data";
        let encoded = encode_frame(0x11, payload).unwrap();
        assert_eq!(encoded.len(), FRAME_HEADER_SIZE + payload.len());
        assert_eq!(encoded[0], 0x11);
        assert_eq!(encoded[1], payload.len() as u8);
        assert_eq!(encoded[2], 0);

        let (opcode, decoded) = decode_frame(&encoded).unwrap();
        assert_eq!(opcode, 0x11);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_encode_too_large() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert!(matches!(
            encode_frame(0x11, &payload),
            Err(WireError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = encode_frame(0x11, b"payload").unwrap();
        let err = decode_frame(&encoded[..encoded.len() - 1]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));
    }

    #[test]
    fn test_checksum_sensitivity() {
        // Flipping any single payload bit must be caught by the CRC.
        let encoded = encode_frame(0x11, b"abc").unwrap();
        for i in FRAME_HEADER_SIZE..encoded.len() {
            for bit in 0..8 {
                let mut corrupted = encoded.clone();
                corrupted[i] ^= 1 << bit;
                assert!(matches!(
                    decode_frame(&corrupted),
                    Err(WireError::ChecksumMismatch { .. })
                ));
            }
        }
    }

    #[test]
    fn test_codec_single_byte_chunks() {
        let frames = [
            encode_frame(0x01, &[2, 0]).unwrap(),
            encode_frame(0x11, b"first segment").unwrap(),
            encode_frame(0x12, &[]).unwrap(),
        ];
        let stream: Vec<u8> = frames.iter().flatten().copied().collect();

        let mut codec = FrameCodec::new();
        let mut decoded = Vec::new();
        for byte in stream {
            codec.push(&[byte]);
            while let Some(frame) = codec.decode().unwrap() {
                decoded.push(frame);
            }
        }

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], (0x01, vec![2, 0]));
        assert_eq!(decoded[1], (0x11, b"first segment".to_vec()));
        assert_eq!(decoded[2], (0x12, vec![]));
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_codec_all_at_once_matches_chunked() {
        let frames = [
            encode_frame(0x02, &[]).unwrap(),
            encode_frame(0x03, &[1, 2, 3]).unwrap(),
        ];
        let stream: Vec<u8> = frames.iter().flatten().copied().collect();

        let mut codec = FrameCodec::new();
        codec.push(&stream);
        assert_eq!(codec.decode().unwrap(), Some((0x02, vec![])));
        assert_eq!(codec.decode().unwrap(), Some((0x03, vec![1, 2, 3])));
        assert_eq!(codec.decode().unwrap(), None);
    }

    #[test]
    fn test_codec_partial_frame_yields_none() {
        let encoded = encode_frame(0x11, b"data").unwrap();
        let mut codec = FrameCodec::new();
        codec.push(&encoded[..FRAME_HEADER_SIZE + 1]);
        assert_eq!(codec.decode().unwrap(), None);
        codec.push(&encoded[FRAME_HEADER_SIZE + 1..]);
        assert_eq!(codec.decode().unwrap(), Some((0x11, b"data".to_vec())));
    }

    #[test]
    fn test_codec_consumes_corrupt_frame() {
        let mut corrupted = encode_frame(0x11, b"abc").unwrap();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0x01;
        let good = encode_frame(0x12, &[]).unwrap();

        let mut codec = FrameCodec::new();
        codec.push(&corrupted);
        codec.push(&good);
        assert!(matches!(
            codec.decode(),
            Err(WireError::ChecksumMismatch { .. })
        ));
        // The corrupt frame is consumed; the following frame still decodes.
        assert_eq!(codec.decode().unwrap(), Some((0x12, vec![])));
    }
}
