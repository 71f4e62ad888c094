//! Input sanitization and upload validation.

/// Maximum free-text length (cover letters, notes, descriptions).
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Maximum stored file name length.
pub const MAX_FILE_NAME_LENGTH: usize = 200;

/// CV file extensions accepted for upload.
pub const ALLOWED_CV_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Sanitize a user-provided string for safe logging and storage.
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_TEXT_LENGTH)
        .collect()
}

/// Sanitize an uploaded file name: strip any path components, drop control
/// characters, and cap the length.
pub fn sanitize_file_name(input: &str) -> String {
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .take(MAX_FILE_NAME_LENGTH)
        .collect()
}

/// Check whether a file name carries an accepted CV extension.
pub fn is_allowed_cv_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            ALLOWED_CV_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_string_strips_control_chars() {
        assert_eq!(sanitize_string("hello\u{0}world"), "helloworld");
        assert_eq!(sanitize_string("line1\nline2"), "line1\nline2");
    }

    #[test]
    fn test_sanitize_file_name_strips_paths() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name("my cv (final).pdf"), "my cv final.pdf");
    }

    #[test]
    fn test_cv_extension_allow_list() {
        assert!(is_allowed_cv_file("cv.pdf"));
        assert!(is_allowed_cv_file("resume.DOCX"));
        assert!(!is_allowed_cv_file("malware.exe"));
        assert!(!is_allowed_cv_file("noextension"));
        assert!(!is_allowed_cv_file(".pdf"));
    }
}
