//! Frame codec for the file-backed command log
//!
//! The only place where the on-disk record representation is decided.
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │ Len (4, BE)  │  JSON payload: {"op","key"[,"value"]} │
//! └──────────────┴──────────────────────────────────────┘
//! ```
//!
//! Payloads above [`MAX_FRAME_PAYLOAD`] bytes are refused on encode and
//! treated as corruption on decode; the bound is shared so the writer can
//! never produce a frame the replay would reject.

use crate::error::{KvError, Result};
use crate::record::MutationRecord;

/// Size of the big-endian length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// Safety bound on a frame's payload, in bytes
pub const MAX_FRAME_PAYLOAD: usize = 1024;

/// Encode one record as a self-delimited frame
pub fn encode_frame(record: &MutationRecord) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(record)
        .map_err(|e| KvError::Serialization(format!("encode record: {e}")))?;

    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(KvError::RecordTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(LEN_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode one complete frame, returning the record and the bytes consumed
///
/// Fails on a short buffer, an oversized length prefix, or a payload that is
/// not a well-formed record.
pub fn decode_frame(bytes: &[u8]) -> Result<(MutationRecord, usize)> {
    if bytes.len() < LEN_PREFIX_SIZE {
        return Err(KvError::LogCorruption(format!(
            "incomplete length prefix: {} bytes",
            bytes.len()
        )));
    }

    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if len > MAX_FRAME_PAYLOAD {
        return Err(oversized(len));
    }

    let total = LEN_PREFIX_SIZE + len;
    if bytes.len() < total {
        return Err(KvError::LogCorruption(format!(
            "incomplete payload: expected {len} bytes, got {}",
            bytes.len() - LEN_PREFIX_SIZE
        )));
    }

    let record = decode_payload(&bytes[LEN_PREFIX_SIZE..total])?;
    Ok((record, total))
}

/// Decode a frame payload that has already been fully read
pub(crate) fn decode_payload(payload: &[u8]) -> Result<MutationRecord> {
    serde_json::from_slice(payload)
        .map_err(|e| KvError::LogCorruption(format!("bad frame payload: {e}")))
}

/// Error for a length prefix beyond the safety bound
pub(crate) fn oversized(len: usize) -> KvError {
    KvError::LogCorruption(format!(
        "frame length {len} exceeds the {MAX_FRAME_PAYLOAD}-byte bound"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_variants() {
        let records = vec![
            MutationRecord::Put {
                key: "a".to_string(),
                value: "1".to_string(),
            },
            MutationRecord::Swap {
                key: "a".to_string(),
                value: "2".to_string(),
            },
            MutationRecord::Delete {
                key: "a".to_string(),
            },
        ];

        for record in records {
            let frame = encode_frame(&record).unwrap();
            let (decoded, consumed) = decode_frame(&frame).unwrap();
            assert_eq!(decoded, record);
            assert_eq!(consumed, frame.len());
        }
    }

    #[test]
    fn test_length_prefix_is_big_endian() {
        let record = MutationRecord::Delete {
            key: "k".to_string(),
        };
        let frame = encode_frame(&record).unwrap();
        let payload_len = frame.len() - LEN_PREFIX_SIZE;
        assert_eq!(
            &frame[..LEN_PREFIX_SIZE],
            &(payload_len as u32).to_be_bytes()
        );
    }

    #[test]
    fn test_oversized_record_refused_on_encode() {
        let record = MutationRecord::Put {
            key: "k".to_string(),
            value: "v".repeat(2 * MAX_FRAME_PAYLOAD),
        };
        let err = encode_frame(&record).unwrap_err();
        assert!(matches!(err, KvError::RecordTooLarge(_)));
    }

    #[test]
    fn test_oversized_length_prefix_is_corruption() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&(MAX_FRAME_PAYLOAD as u32 + 1).to_be_bytes());
        frame.extend_from_slice(&[0u8; 8]);
        let err = decode_frame(&frame).unwrap_err();
        assert!(matches!(err, KvError::LogCorruption(_)));
    }

    #[test]
    fn test_garbage_payload_is_corruption() {
        let payload = b"not json at all";
        let mut frame = Vec::new();
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(payload);
        let err = decode_frame(&frame).unwrap_err();
        assert!(matches!(err, KvError::LogCorruption(_)));
    }
}
