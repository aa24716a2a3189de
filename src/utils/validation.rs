use anyhow::{Result, anyhow};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Reduces a client-supplied filename to a single safe key segment
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Browsers on Windows may still send the full path
    let last = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' | '#')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(anyhow!(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        }));
    }

    Ok(sanitized)
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                size, max_size
            ),
        }));
    }
    Ok(())
}

/// Declared content type of an upload, else sniffed from its magic bytes
pub fn resolve_content_type(declared: Option<&str>, data: &[u8]) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .or_else(|| infer::get(data).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("face.png").unwrap(), "face.png");
        assert_eq!(sanitize_filename("my face.jpg").unwrap(), "my face.jpg");
        assert_eq!(
            sanitize_filename("face<1>.png").unwrap(),
            "face_1_.png"
        );
        assert_eq!(sanitize_filename("wajah.jpeg").unwrap(), "wajah.jpeg");

        // Path traversal
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\photo.png").unwrap(),
            "photo.png"
        );

        // Empty and hidden
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("uploads/").is_err());
        assert!(sanitize_filename(".env").is_err());
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let sanitized = sanitize_filename(&long).unwrap();
        assert!(sanitized.len() <= 255);
        assert!(sanitized.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(validate_file_size(2049, 2048).is_err());
    }

    #[test]
    fn test_resolve_content_type() {
        assert_eq!(resolve_content_type(Some("image/png"), b""), "image/png");
        assert_eq!(
            resolve_content_type(None, &[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            "image/jpeg"
        );
        assert_eq!(
            resolve_content_type(Some("  "), b"plain words"),
            "application/octet-stream"
        );
    }
}
