/// Key layout for the `handlers` partition:
/// `handler:{id}` -> full encoded record (UTF-16LE bytes)

/// Encode a handler key: handler:{id}
pub fn encode_handler_key(id: &str) -> Vec<u8> {
    format!("handler:{}", id).into_bytes()
}

/// Decode a handler key: handler:{id} -> id
pub fn decode_handler_key(key: &[u8]) -> Option<String> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("handler:").map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_key_encoding() {
        let key = encode_handler_key("com.acme:viewer");
        assert_eq!(key, b"handler:com.acme:viewer");
        assert_eq!(decode_handler_key(&key), Some("com.acme:viewer".to_string()));
    }

    #[test]
    fn test_decode_foreign_key() {
        assert_eq!(decode_handler_key(b"job:1"), None);
        assert_eq!(decode_handler_key(&[0xff, 0xfe]), None);
    }
}
