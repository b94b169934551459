use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{DecodeError, UploadError};

static IMAGE_MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
];

/// Returns the MIME type for a supported image extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy();
    IMAGE_MIME_TYPES
        .iter()
        .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        .map(|(_, mime)| *mime)
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Returns `true` if the path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    mime_for_path(path).is_some_and(is_image_mime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A user-selected image on disk, typed by its extension.
pub struct ImageFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
}

impl ImageFile {
    /// Accepts `path` only if it looks like an image.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let Some(mime) = mime_for_path(&path).filter(|m| is_image_mime(m)) else {
            return Err(UploadError::NotAnImage(path));
        };
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        Ok(Self {
            path,
            name,
            mime_type: mime.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Base64 image payload ready to be sent to the AI service.
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: String,
}

pub fn to_data_url(mime_type: &str, base64: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64)
}

/// Splits `data:<mime>;base64,<payload>` into its MIME type and payload.
pub fn split_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64").unwrap_or(header);
    Some((mime, payload))
}

/// Reads the whole file into a base64 data URL.
pub fn read_data_url(file: &ImageFile) -> Result<String, DecodeError> {
    let bytes = std::fs::read(&file.path)?;
    Ok(to_data_url(&file.mime_type, &STANDARD.encode(bytes)))
}

/// Reads `file` and returns its bare base64 payload and MIME type.
pub fn encode_file(file: &ImageFile) -> Result<EncodedImage, DecodeError> {
    let url = read_data_url(file)?;
    let base64 = url
        .split_once(',')
        .map(|(_, payload)| payload)
        .filter(|payload| !payload.is_empty())
        .ok_or(DecodeError::EmptyPayload)?;
    Ok(EncodedImage {
        base64: base64.to_string(),
        mime_type: file.mime_type.clone(),
    })
}

pub fn decode_payload(base64: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(base64)?)
}
