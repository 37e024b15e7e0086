use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::text_ops::current_timestamp_millis;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedImage {
    /// Absolute path of the written file.
    pub path: String,
    /// Path to reference from markdown, relative to the document directory.
    pub markdown_path: String,
}

/// Decode raw base64 or a `data:image/png;base64,` URL into PNG bytes.
pub fn decode_png(data: &str) -> Result<Vec<u8>> {
    let payload = match data.strip_prefix("data:") {
        Some(url) => {
            let (meta, body) = url
                .split_once(',')
                .ok_or_else(|| AppError::InvalidArgument("malformed data URL".to_string()))?;
            if !meta.ends_with(";base64") {
                return Err(AppError::InvalidArgument("data URL is not base64".to_string()));
            }
            body
        }
        None => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| AppError::InvalidArgument(format!("invalid base64 image: {}", e)))?;
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(AppError::InvalidArgument("image is not a PNG".to_string()));
    }
    Ok(bytes)
}

/// Write a pasted image to `<base_dir>/images/pasted-<timestamp>.png`.
pub fn save_png(base_dir: &Path, data: &str) -> Result<SavedImage> {
    let bytes = decode_png(data)?;
    let dir = base_dir.join(IMAGES_DIR);
    fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;

    let stamp = current_timestamp_millis();
    let mut name = format!("pasted-{}.png", stamp);
    let mut suffix = 1;
    while dir.join(&name).exists() {
        name = format!("pasted-{}-{}.png", stamp, suffix);
        suffix += 1;
    }
    let path: PathBuf = dir.join(&name);
    fs::write(&path, &bytes).map_err(|e| AppError::io(&path, e))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "clipboard image saved");

    Ok(SavedImage {
        path: path.to_string_lossy().into_owned(),
        markdown_path: format!("{}/{}", IMAGES_DIR, name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tiny_png() -> String {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"rest-of-image");
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_raw_and_data_url() {
        let raw = tiny_png();
        assert!(decode_png(&raw).is_ok());
        let url = format!("data:image/png;base64,{}", raw);
        assert_eq!(decode_png(&url).unwrap(), decode_png(&raw).unwrap());
    }

    #[test]
    fn test_rejects_non_png() {
        let jpeg = STANDARD.encode([0xff, 0xd8, 0xff, 0xe0]);
        assert_eq!(decode_png(&jpeg).unwrap_err().code(), "INVALID_ARGUMENT");
        assert_eq!(decode_png("not base64!").unwrap_err().code(), "INVALID_ARGUMENT");
        assert!(decode_png("data:image/png,abc").is_err());
    }

    #[test]
    fn test_save_writes_under_images() {
        let dir = TempDir::new().unwrap();
        let first = save_png(dir.path(), &tiny_png()).unwrap();
        let second = save_png(dir.path(), &tiny_png()).unwrap();
        assert_ne!(first.path, second.path);
        assert!(first.markdown_path.starts_with("images/pasted-"));
        assert!(Path::new(&first.path).exists());
        assert!(fs::read(&second.path).unwrap().starts_with(&PNG_SIGNATURE));
    }
}
