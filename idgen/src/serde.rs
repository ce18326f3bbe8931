//! Storage encoding for counter records.
//!
//! ```text
//! Key:   | version (u8) | record_tag (u8) | counter key (UTF-8 bytes) |
//! Value: | total (u64 BE) |
//! ```
//!
//! A missing record means the counter has never been incremented and its
//! total is 0.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::model::CounterKey;

/// Key format version.
pub const KEY_VERSION: u8 = 0x01;

/// Record tag for counter records: type 0x1 in the high 4 bits, reserved 0x0
/// in the low 4 bits.
pub const COUNTER_RECORD_TAG: u8 = 0x10;

const COUNTER_VALUE_LEN: usize = 8;

/// Encodes the storage key of a counter record.
pub fn encode_counter_key(key: &CounterKey) -> Bytes {
    let name = key.as_str().as_bytes();
    let mut buf = BytesMut::with_capacity(2 + name.len());
    buf.put_u8(KEY_VERSION);
    buf.put_u8(COUNTER_RECORD_TAG);
    buf.extend_from_slice(name);
    buf.freeze()
}

/// Encodes a counter total.
pub fn encode_counter_value(total: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(COUNTER_VALUE_LEN);
    buf.put_u64(total);
    buf.freeze()
}

/// Decodes a counter total.
pub fn decode_counter_value(data: &[u8]) -> Result<u64> {
    let bytes: [u8; COUNTER_VALUE_LEN] = data.try_into().map_err(|_| {
        Error::Encoding(format!(
            "invalid counter value: need {} bytes, got {}",
            COUNTER_VALUE_LEN,
            data.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn should_encode_counter_key_with_prefix() {
        // given
        let key = CounterKey::new("global").unwrap();

        // when
        let encoded = encode_counter_key(&key);

        // then
        assert_eq!(encoded.len(), 8); // 2 prefix + 6 key
        assert_eq!(encoded[0], KEY_VERSION);
        assert_eq!(encoded[1], COUNTER_RECORD_TAG);
        assert_eq!(&encoded[2..], b"global");
    }

    #[test]
    fn should_encode_value_in_big_endian() {
        // given
        let total = 0x0102030405060708;

        // when
        let encoded = encode_counter_value(total);

        // then
        assert_eq!(
            encoded.as_ref(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(100)]
    #[case(u64::MAX)]
    fn should_decode_encoded_value(#[case] total: u64) {
        // when
        let decoded = decode_counter_value(&encode_counter_value(total)).unwrap();

        // then
        assert_eq!(decoded, total);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0u8; 7])]
    #[case(vec![0u8; 9])]
    fn should_reject_value_with_wrong_length(#[case] data: Vec<u8>) {
        // when
        let result = decode_counter_value(&data);

        // then
        assert!(
            matches!(result, Err(Error::Encoding(msg)) if msg.contains("invalid counter value"))
        );
    }
}
