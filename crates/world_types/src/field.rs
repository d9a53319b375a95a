//! Component field values.
//!
//! Component data is stored as a flat sequence of [`Field`]s. Offsets and
//! lengths passed to the storage gateway count fields, not bytes.

/// A single component field value.
pub type Field = u64;

/// Pack an ASCII string of at most 8 bytes into a field, big-endian.
///
/// This is how textual values such as role names are stored in a single
/// field. Returns `None` if the string does not fit.
#[must_use]
pub const fn short_string(s: &str) -> Option<Field> {
    let bytes = s.as_bytes();
    if bytes.len() > 8 {
        return None;
    }
    let mut value: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = (value << 8) | bytes[i] as u64;
        i += 1;
    }
    Some(value)
}

/// Unpack a field produced by [`short_string`]. Non-UTF-8 bytes are replaced.
#[must_use]
pub fn short_string_lossy(field: Field) -> String {
    let bytes = field.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_packs_big_endian() {
        assert_eq!(short_string("A"), Some(0x41));
        assert_eq!(short_string("AB"), Some(0x4142));
        assert_eq!(short_string(""), Some(0));
    }

    #[test]
    fn test_short_string_rejects_long_input() {
        assert_eq!(short_string("Administrator"), None);
        assert!(short_string("12345678").is_some());
    }

    #[test]
    fn test_short_string_unpacks() {
        let admin = short_string("Admin").unwrap();
        assert_eq!(short_string_lossy(admin), "Admin");
        assert_eq!(short_string_lossy(0), "");
    }
}
