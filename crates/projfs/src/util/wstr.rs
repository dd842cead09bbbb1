//! Wide string conversion utilities.

/// Convert a Rust string to a null-terminated wide string.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn string_to_wide(s: &str) -> Vec<u16> {
    let mut wide: Vec<u16> = s.encode_utf16().collect();
    wide.push(0);
    wide
}

/// Convert a wide string slice (without terminator) to a Rust string.
#[allow(dead_code)] // Used in tests
pub fn wide_to_string(wide: &[u16]) -> Result<String, crate::error::ProviderError> {
    String::from_utf16(wide).map_err(|e| crate::error::ProviderError::PathConversion(e.to_string()))
}

/// Convert a PCWSTR to a Rust string with stack allocation for common path
/// lengths. Unpaired surrogates are replaced with `?`.
#[cfg(windows)]
pub fn pcwstr_to_string(s: windows::core::PCWSTR) -> Result<String, crate::error::ProviderError> {
    use smallvec::SmallVec;

    if s.is_null() {
        return Ok(String::new());
    }

    unsafe {
        let mut len: usize = 0;
        let mut ptr: *const u16 = s.as_ptr();
        while *ptr != 0 {
            len += 1;
            ptr = ptr.add(1);
        }

        if len == 0 {
            return Ok(String::new());
        }

        // 512 bytes of stack covers 256 UTF-16 units.
        let mut buffer: SmallVec<[u8; 512]> = SmallVec::new();

        let wide_slice: &[u16] = std::slice::from_raw_parts(s.as_ptr(), len);
        for c in char::decode_utf16(wide_slice.iter().copied()) {
            match c {
                Ok(ch) => {
                    let mut buf: [u8; 4] = [0; 4];
                    buffer.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                Err(_) => buffer.push(b'?'),
            }
        }

        String::from_utf8(buffer.to_vec())
            .map_err(|e| crate::error::ProviderError::PathConversion(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_wide() {
        assert_eq!(
            string_to_wide("Hello"),
            vec![0x0048, 0x0065, 0x006C, 0x006C, 0x006F, 0x0000]
        );
        assert_eq!(string_to_wide(""), vec![0x0000]);
    }

    #[test]
    fn test_wide_roundtrip_unicode() {
        let s: &str = "chats/日本語.txt";
        let wide: Vec<u16> = string_to_wide(s);
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(wide_to_string(&wide[..wide.len() - 1]).unwrap(), s);
    }
}
