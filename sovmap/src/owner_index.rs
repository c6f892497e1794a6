//! Owner-index byte format (`SOVNV1.0`).
//!
//! Magic, `i32` big-endian width and height, then width x height `i64`
//! entries in column-major order. `-1` marks an unowned cell; in memory the
//! unowned sentinel is `0`.

use crate::common::Buffer2;
use crate::MapError;

const MAGIC: &[u8; 8] = b"SOVNV1.0";
const HEADER_LEN: usize = MAGIC.len() + 8;

/// Serialize the owner index.
pub(crate) fn encode_owner_index(index: &Buffer2<u64>) -> Vec<u8> {
    let width = index.width();
    let height = index.height();
    let mut out = Vec::with_capacity(HEADER_LEN + width * height * 8);

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(width as i32).to_be_bytes());
    out.extend_from_slice(&(height as i32).to_be_bytes());
    for x in 0..width {
        for y in 0..height {
            let value = match *index.get(x, y) {
                0 => -1i64,
                id => id as i64,
            };
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
    out
}

/// Deserialize an owner index, enforcing the expected dimensions.
pub(crate) fn decode_owner_index(
    bytes: &[u8],
    expected_width: u32,
    expected_height: u32,
) -> Result<Buffer2<u64>, MapError> {
    if bytes.len() < HEADER_LEN {
        return Err(MapError::DataCorrupt(
            "owner index shorter than its header".into(),
        ));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(MapError::DataCorrupt(format!(
            "bad owner index magic {:?}",
            &bytes[..MAGIC.len()]
        )));
    }

    let width = i32::from_be_bytes(bytes[8..12].try_into().unwrap());
    let height = i32::from_be_bytes(bytes[12..16].try_into().unwrap());
    if width < 0 || height < 0 {
        return Err(MapError::DataCorrupt(format!(
            "negative owner index dimensions {}x{}",
            width, height
        )));
    }
    if width as u32 != expected_width || height as u32 != expected_height {
        return Err(MapError::DimensionMismatch {
            expected_width,
            expected_height,
            found_width: width as u32,
            found_height: height as u32,
        });
    }

    let width = width as usize;
    let height = height as usize;
    let expected_len = HEADER_LEN + width * height * 8;
    if bytes.len() < expected_len {
        return Err(MapError::DataCorrupt(format!(
            "truncated owner index: {} bytes, expected {}",
            bytes.len(),
            expected_len
        )));
    }

    let mut index = Buffer2::new_filled(width, height, 0u64);
    let mut offset = HEADER_LEN;
    for x in 0..width {
        for y in 0..height {
            let value = i64::from_be_bytes(bytes[offset..offset + 8].try_into().unwrap());
            offset += 8;
            *index.get_mut(x, y) = match value {
                -1 => 0,
                id if id >= 0 => id as u64,
                id => {
                    return Err(MapError::DataCorrupt(format!(
                        "impossible owner id {} at cell ({}, {})",
                        id, x, y
                    )))
                }
            };
        }
    }
    Ok(index)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> Buffer2<u64> {
        let mut index = Buffer2::new_filled(3, 2, 0u64);
        *index.get_mut(0, 0) = 10;
        *index.get_mut(2, 1) = 99;
        index
    }

    #[test]
    fn test_round_trip() {
        let index = sample_index();
        let bytes = encode_owner_index(&index);
        let decoded = decode_owner_index(&bytes, 3, 2).unwrap();
        assert_eq!(decoded, index);
    }

    #[test]
    fn test_layout_is_column_major_with_sentinel() {
        let index = sample_index();
        let bytes = encode_owner_index(&index);
        assert_eq!(&bytes[..8], b"SOVNV1.0");
        assert_eq!(bytes.len(), 16 + 3 * 2 * 8);

        let entry = |i: usize| {
            i64::from_be_bytes(bytes[16 + i * 8..24 + i * 8].try_into().unwrap())
        };
        // Column 0: (0,0), (0,1); column 1; column 2.
        assert_eq!(entry(0), 10);
        assert_eq!(entry(1), -1);
        assert_eq!(entry(2), -1);
        assert_eq!(entry(3), -1);
        assert_eq!(entry(4), -1);
        assert_eq!(entry(5), 99);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode_owner_index(&sample_index());
        bytes[0] = b'X';
        let err = decode_owner_index(&bytes, 3, 2).unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let bytes = encode_owner_index(&sample_index());
        let err = decode_owner_index(&bytes, 4, 2).unwrap_err();
        assert!(matches!(
            err,
            MapError::DimensionMismatch {
                expected_width: 4,
                expected_height: 2,
                found_width: 3,
                found_height: 2,
            }
        ));
    }

    #[test]
    fn test_truncated_entries() {
        let bytes = encode_owner_index(&sample_index());
        let err = decode_owner_index(&bytes[..bytes.len() - 1], 3, 2).unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }

    #[test]
    fn test_impossible_negative_id() {
        let mut bytes = encode_owner_index(&sample_index());
        bytes[16..24].copy_from_slice(&(-2i64).to_be_bytes());
        let err = decode_owner_index(&bytes, 3, 2).unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }
}
