//! Protocol encoding/decoding traits and size-validation helpers.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtoError;

/// Largest frame (header included) either side may send.
pub const PACKET_BUFFER_SIZE: usize = 4096;

/// Frame header: `u32` payload length followed by `u32` packet type.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Records with a constant on-wire size.
pub trait FixedSize {
    const SIZE: usize;
}

/// Fail with `BufferTooShort` unless `needed` bytes remain.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Decode a fixed-size record whose payload must match its size exactly.
pub fn decode_fixed<T: ProtoDecode + FixedSize>(payload: &[u8]) -> Result<T, ProtoError> {
    if payload.len() != T::SIZE {
        return Err(ProtoError::SizeMismatch {
            expected: T::SIZE,
            got: payload.len(),
        });
    }
    let mut buf = payload;
    T::proto_decode(&mut buf)
}

/// Check an inbound variable packet: `base + count * stride` must equal the
/// declared payload size, computed without overflow.
pub fn validate_in_var_packet(base: usize, count: usize, stride: usize, declared: usize) -> bool {
    count
        .checked_mul(stride)
        .and_then(|body| body.checked_add(base))
        .is_some_and(|total| total == declared)
}

/// Check that an outbound variable packet of `count` elements fits the
/// packet buffer once framed.
pub fn validate_out_var_packet(base: usize, count: usize, stride: usize) -> bool {
    count
        .checked_mul(stride)
        .and_then(|body| body.checked_add(base))
        .is_some_and(|total| total <= PACKET_BUFFER_SIZE - FRAME_HEADER_SIZE)
}

/// Frame an outbound packet: payload length, packet type, payload.
pub fn encode_frame(packet_type: u32, body: &impl ProtoEncode) -> Result<Bytes, ProtoError> {
    let mut buf = BytesMut::with_capacity(PACKET_BUFFER_SIZE);
    buf.put_u32_le(0);
    buf.put_u32_le(packet_type);
    body.proto_encode(&mut buf);
    if buf.len() > PACKET_BUFFER_SIZE {
        return Err(ProtoError::FrameTooLarge(buf.len()));
    }
    let payload_len = (buf.len() - FRAME_HEADER_SIZE) as u32;
    buf[..4].copy_from_slice(&payload_len.to_le_bytes());
    Ok(buf.freeze())
}

/// Parse a frame header into `(payload_len, packet_type)`.
pub fn decode_frame_header(header: [u8; FRAME_HEADER_SIZE]) -> Result<(usize, u32), ProtoError> {
    let mut buf = &header[..];
    let payload_len = buf.get_u32_le() as usize;
    let packet_type = buf.get_u32_le();
    if payload_len > PACKET_BUFFER_SIZE - FRAME_HEADER_SIZE {
        return Err(ProtoError::FrameTooLarge(payload_len + FRAME_HEADER_SIZE));
    }
    Ok((payload_len, packet_type))
}

/// Encode a packet into a standalone byte vector.
pub fn encode_to_vec(value: &impl ProtoEncode) -> Vec<u8> {
    let mut buf = Vec::new();
    value.proto_encode(&mut buf);
    buf
}
