//! Decoding of the big-endian IDX files MNIST is distributed in.

use crate::DatasetError;

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

/// A decoded IDX3 image file: `count` images of `rows x cols` bytes, stored
/// back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

fn read_u32(bytes: &[u8], offset: usize, file: &str) -> Result<u32, DatasetError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DatasetError::Truncated {
            file: file.to_string(),
            expected: offset + 4,
            actual: bytes.len(),
        })
}

fn check_magic(found: u32, expected: u32, file: &str) -> Result<(), DatasetError> {
    if found != expected {
        return Err(DatasetError::InvalidMagic {
            file: file.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Parses an IDX3 (unsigned byte, 3 dimensions) image file.
///
/// The 16-byte header holds the magic number, image count, rows and columns.
pub fn parse_images(bytes: &[u8], file: &str) -> Result<IdxImages, DatasetError> {
    check_magic(read_u32(bytes, 0, file)?, IMAGES_MAGIC, file)?;
    let count = read_u32(bytes, 4, file)? as usize;
    let rows = read_u32(bytes, 8, file)? as usize;
    let cols = read_u32(bytes, 12, file)? as usize;

    let expected = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .unwrap_or(usize::MAX);
    let body = &bytes[16..];
    if body.len() < expected {
        return Err(DatasetError::Truncated {
            file: file.to_string(),
            expected,
            actual: body.len(),
        });
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: body[..expected].to_vec(),
    })
}

/// Parses an IDX1 (unsigned byte, 1 dimension) label file.
///
/// The 8-byte header holds the magic number and label count.
pub fn parse_labels(bytes: &[u8], file: &str) -> Result<Vec<u8>, DatasetError> {
    check_magic(read_u32(bytes, 0, file)?, LABELS_MAGIC, file)?;
    let count = read_u32(bytes, 4, file)? as usize;

    let body = &bytes[8..];
    if body.len() < count {
        return Err(DatasetError::Truncated {
            file: file.to_string(),
            expected: count,
            actual: body.len(),
        });
    }
    Ok(body[..count].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_images_header() {
        let mut bytes = vec![0, 0, 8, 3, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 3];
        bytes.extend(1..=12u8);
        let images = parse_images(&bytes, "imgs").unwrap();
        assert_eq!((images.count, images.rows, images.cols), (2, 2, 3));
        assert_eq!(images.pixels, (1..=12u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_images_rejects_label_magic() {
        let bytes = vec![0, 0, 8, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = parse_images(&bytes, "imgs").unwrap_err();
        assert!(matches!(err, DatasetError::InvalidMagic { found: 0x0801, .. }));
    }

    #[test]
    fn test_parse_images_rejects_short_body() {
        let mut bytes = vec![0, 0, 8, 3, 0, 0, 0, 1, 0, 0, 0, 28, 0, 0, 0, 28];
        bytes.extend([0u8; 100]);
        let err = parse_images(&bytes, "imgs").unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { expected: 784, actual: 100, .. }));
    }

    #[test]
    fn test_parse_images_rejects_short_header() {
        let err = parse_images(&[0, 0, 8, 3, 0, 0], "imgs").unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { .. }));
    }

    #[test]
    fn test_parse_labels() {
        let bytes = [0, 0, 8, 1, 0, 0, 0, 3, 5, 0, 4];
        assert_eq!(parse_labels(&bytes, "lbls").unwrap(), vec![5, 0, 4]);

        let short = [0, 0, 8, 1, 0, 0, 0, 4, 5];
        assert!(matches!(
            parse_labels(&short, "lbls"),
            Err(DatasetError::Truncated { expected: 4, actual: 1, .. })
        ));
    }
}
