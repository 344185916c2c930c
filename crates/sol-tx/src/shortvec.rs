//! Compact length prefix ("shortvec") used before every variable-size
//! section of a message or transaction.
//!
//! Each byte carries seven payload bits, low group first. The high bit is a
//! continuation flag:
//!
//! - `0x00..=0x7f`      -> 1 byte
//! - `0x80..=0x3fff`    -> 2 bytes
//! - `0x4000..=0x1fffff` -> 3 bytes
//!
//! Decoding accepts anything that fits in a `u32`.

use crate::error::{Result, TxError};
use crate::reader::ByteReader;

/// Encode `len` as a shortvec prefix.
pub fn encode_length(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(3);
    encode_length_into(&mut out, len);
    out
}

/// Append the shortvec encoding of `len` to `buf`.
pub fn encode_length_into(buf: &mut Vec<u8>, len: usize) {
    let mut rem = len;

    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if rem == 0 {
            break;
        }
    }
}

/// Decode a shortvec prefix from `reader`.
pub fn decode_length(reader: &mut ByteReader<'_>) -> Result<usize> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = reader.read_u8().map_err(|_| {
            TxError::MalformedInput("unexpected end of input while decoding shortvec".into())
        })?;

        value |= u64::from(byte & 0x7f) << shift;
        if value > u64::from(u32::MAX) {
            return Err(TxError::MalformedInput("shortvec value overflow".into()));
        }

        if byte & 0x80 == 0 {
            break;
        }

        shift += 7;
        if shift >= 35 {
            return Err(TxError::MalformedInput("shortvec value overflow".into()));
        }
    }

    Ok(value as usize)
}

/// Decode a shortvec prefix from the start of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_length_from_slice(data: &[u8]) -> Result<(usize, usize)> {
    let mut reader = ByteReader::new(data);
    let value = decode_length(&mut reader)?;
    Ok((value, reader.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_zero_is_single_zero_byte() {
        assert_eq!(encode_length(0), vec![0x00]);
    }

    #[test]
    fn encode_one_byte_max() {
        assert_eq!(encode_length(0x7f), vec![0x7f]);
    }

    #[test]
    fn encode_128_sets_continuation_bit() {
        let encoded = encode_length(128);
        assert_eq!(encoded, vec![0x80, 0x01]);
        assert_ne!(encoded[0] & 0x80, 0);
    }

    #[test]
    fn encode_two_byte_max() {
        assert_eq!(encode_length(0x3fff), vec![0xff, 0x7f]);
    }

    #[test]
    fn encode_three_bytes() {
        assert_eq!(encode_length(0x4000), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_length(0xffff), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn encode_into_appends() {
        let mut buf = vec![0xAA];
        encode_length_into(&mut buf, 300);
        assert_eq!(buf, vec![0xAA, 0xac, 0x02]);
    }

    #[test]
    fn decode_known_values() {
        assert_eq!(decode_length_from_slice(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_length_from_slice(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(decode_length_from_slice(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_length_from_slice(&[0xff, 0x7f]).unwrap(), (16383, 2));
        assert_eq!(
            decode_length_from_slice(&[0x80, 0x80, 0x01]).unwrap(),
            (16384, 3)
        );
    }

    #[test]
    fn decode_stops_at_first_terminal_byte() {
        let data = [0x05, 0xff, 0xff];
        let mut reader = ByteReader::new(&data);
        assert_eq!(decode_length(&mut reader).unwrap(), 5);
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn decode_matches_encode() {
        for value in [0usize, 1, 127, 128, 255, 256, 16383, 16384, 65535, 1 << 21] {
            let encoded = encode_length(value);
            let (decoded, len) = decode_length_from_slice(&encoded).unwrap();
            assert_eq!(decoded, value, "mismatch for {value}");
            assert_eq!(len, encoded.len());
        }
    }

    #[test]
    fn decode_u32_max() {
        let encoded = encode_length(u32::MAX as usize);
        assert_eq!(encoded.len(), 5);
        let (decoded, _) = decode_length_from_slice(&encoded).unwrap();
        assert_eq!(decoded, u32::MAX as usize);
    }

    #[test]
    fn decode_empty_input_fails() {
        let err = decode_length_from_slice(&[]).unwrap_err();
        assert!(matches!(err, TxError::MalformedInput(_)));
    }

    #[test]
    fn decode_truncated_continuation_fails() {
        assert!(decode_length_from_slice(&[0x80]).is_err());
        assert!(decode_length_from_slice(&[0xff, 0xff]).is_err());
    }

    #[test]
    fn decode_overflow_fails() {
        let err = decode_length_from_slice(&[0xff, 0xff, 0xff, 0xff, 0x7f]).unwrap_err();
        assert!(err.to_string().contains("overflow"));
        assert!(decode_length_from_slice(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).is_err());
    }
}
