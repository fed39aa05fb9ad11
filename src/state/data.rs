/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the Gemini client, the raster pipeline and the UI layer.

use std::fmt;
use std::path::Path;

/// An encoded image: raw bytes plus their MIME type.
///
/// Immutable once produced. Components that need to change an image make a
/// new one; the bytes are never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageObject {
    /// Encoded image bytes (PNG, JPEG, WebP)
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. "image/png")
    pub mime_type: String,
}

impl ImageObject {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// PNG-encoded image bytes.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/png")
    }
}

// Manual Debug so a multi-megabyte poster doesn't end up in log output
impl fmt::Debug for ImageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageObject")
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

/// A user-picked image file, loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Filename only (e.g. "sneaker.png"), for display in the controls panel
    pub file_name: String,
    /// The loaded, still-encoded image
    pub image: ImageObject,
}

/// MIME type for a picked file, judged by extension.
/// Returns `None` for extensions the Gemini API does not accept.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b/photo.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("poster.png")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("ref.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(&PathBuf::from("noextension")), None);
    }

    #[test]
    fn test_debug_hides_bytes() {
        let image = ImageObject::png(vec![0u8; 4096]);
        let rendered = format!("{image:?}");
        assert!(rendered.contains("4096 bytes"));
        assert!(rendered.contains("image/png"));
    }
}
