//! Plain text decoding.

use crate::Result;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode UTF-8 text, dropping a leading byte order mark.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        assert_eq!(extract("Zoé Martin".as_bytes()).unwrap(), "Zoé Martin");
    }

    #[test]
    fn test_bom_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(extract(&bytes).unwrap(), "hello");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(extract(&[0x66, 0xff, 0x6f]).is_err());
    }
}
