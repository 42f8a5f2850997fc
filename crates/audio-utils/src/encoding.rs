use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_to_bytes(encoded: &str) -> crate::Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_standard_alphabet() {
        assert_eq!(bytes_to_base64(b"hello"), "aGVsbG8=");
        assert_eq!(bytes_to_base64(&[]), "");
        assert_eq!(bytes_to_base64(&[0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn decodes_payload_with_surrounding_whitespace() {
        assert_eq!(base64_to_bytes("aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn rejects_malformed_payload() {
        let err = base64_to_bytes("not base64!").unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[quickcheck_macros::quickcheck]
    fn prop_roundtrip(bytes: Vec<u8>) -> bool {
        base64_to_bytes(&bytes_to_base64(&bytes)).unwrap() == bytes
    }
}
