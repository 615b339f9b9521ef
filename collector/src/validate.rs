//! Upload content validation.
//!
//! A submission is accepted only if its extension is on the task's
//! allow-list and the first bytes carry the signature that extension
//! promises, so a renamed binary cannot masquerade as a spreadsheet.

/// Validation contract the versioned writer calls before finalizing a write.
pub trait FileValidator: Send + Sync {
    /// Whether `extension` (leading dot, any case) is on the allow-list.
    fn extension_allowed(&self, extension: &str, allow_list: &[String]) -> bool;

    /// Whether the leading bytes match the magic signature expected for
    /// `extension`.
    fn magic_matches(&self, bytes: &[u8], extension: &str) -> bool;
}

/// Signature table for the formats the collection tasks accept.
#[derive(Debug, Clone, Default)]
pub struct SignatureValidator;

impl FileValidator for SignatureValidator {
    fn extension_allowed(&self, extension: &str, allow_list: &[String]) -> bool {
        allow_list
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    fn magic_matches(&self, bytes: &[u8], extension: &str) -> bool {
        match extension.to_ascii_lowercase().as_str() {
            // OOXML spreadsheets are zip containers.
            ".xlsx" | ".zip" => bytes.starts_with(b"PK\x03\x04"),
            ".xls" => bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
            ".pdf" => bytes.starts_with(b"%PDF"),
            ".png" => bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
            ".jpg" | ".jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            // Text formats have no signature; require valid UTF-8.
            ".csv" | ".json" | ".txt" => std::str::from_utf8(bytes).is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(exts: &[&str]) -> Vec<String> {
        exts.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let v = SignatureValidator;
        assert!(v.extension_allowed(".XLSX", &allow(&[".xlsx", ".csv"])));
        assert!(!v.extension_allowed(".exe", &allow(&[".xlsx", ".csv"])));
    }

    #[test]
    fn garbage_bytes_fail_the_signature_check() {
        let v = SignatureValidator;
        assert!(v.magic_matches(b"PK\x03\x04rest", ".xlsx"));
        assert!(!v.magic_matches(b"invalid content", ".xlsx"));
        assert!(v.magic_matches(b"a,b,c\n1,2,3\n", ".csv"));
        assert!(!v.magic_matches(&[0xFF, 0xFE, 0x00], ".csv"));
    }
}
