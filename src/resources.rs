//! Attachment bytes turned into ENEX resources.
//!
//! A resource is keyed by the MD5 of its raw bytes. The same hash goes into the
//! `<en-media>` tag in the note content, which is how the importer ties the
//! inline reference to the embedded data.

use crate::error::ProbeError;
use crate::markup::Markup;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Image formats whose pixel size we try to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Ico,
    Heif,
    Avif,
}

impl ImageKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let kind = match mime.to_ascii_lowercase().as_str() {
            "image/png" | "image/apng" => ImageKind::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageKind::Jpeg,
            "image/gif" => ImageKind::Gif,
            "image/webp" => ImageKind::Webp,
            "image/bmp" | "image/x-ms-bmp" => ImageKind::Bmp,
            "image/tiff" => ImageKind::Tiff,
            "image/x-icon" | "image/vnd.microsoft.icon" => ImageKind::Ico,
            "image/heif" | "image/heic" => ImageKind::Heif,
            "image/avif" => ImageKind::Avif,
            _ => return None,
        };
        Some(kind)
    }
}

/// A media type sniffed from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    mime: String,
    image: Option<ImageKind>,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Self {
        Self {
            mime: mime.to_string(),
            image: ImageKind::from_mime(mime),
        }
    }

    /// Detect the media type from magic bytes.
    ///
    /// `declared` is consulted only when the bytes are not recognised.
    pub fn sniff(bytes: &[u8], declared: Option<&str>) -> Self {
        match infer::get(bytes) {
            Some(kind) => Self::from_mime(kind.mime_type()),
            None => Self::from_mime(
                declared
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(FALLBACK_MIME),
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.mime
    }

    pub fn image_kind(&self) -> Option<ImageKind> {
        self.image
    }

    pub fn is_image(&self) -> bool {
        self.image.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    let size = imagesize::blob_size(bytes)?;
    Ok(Dimensions {
        width: size.width,
        height: size.height,
    })
}

/// Lowercase hex MD5 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// An attachment ready to be written as `<resource>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The attachment's `filePath` as referenced by the note.
    pub file_name: String,
    pub media_type: MediaType,
    pub hash: String,
    /// Base64 of the raw bytes.
    pub data: String,
    pub dimensions: Option<Dimensions>,
}

impl Resource {
    /// Build a resource from raw bytes.
    ///
    /// A failed dimension probe is returned alongside the resource, which is
    /// still complete apart from its width and height.
    pub fn from_bytes(
        file_name: &str,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> (Self, Option<ProbeError>) {
        let media_type = MediaType::sniff(bytes, declared_mime);

        let (dimensions, probe_error) = if media_type.is_image() {
            match probe_dimensions(bytes) {
                Ok(d) => (Some(d), None),
                Err(e) => (None, Some(e)),
            }
        } else {
            (None, None)
        };

        let resource = Self {
            file_name: file_name.to_string(),
            media_type,
            hash: content_hash(bytes),
            data: STANDARD.encode(bytes),
            dimensions,
        };
        (resource, probe_error)
    }

    /// The `<en-media>` tag placed in the note content.
    pub fn media_reference(&self) -> Markup {
        let mut m = Markup::new();
        m.push_empty_element(
            "en-media",
            &[
                ("alt", ""),
                ("type", self.media_type.as_str()),
                ("hash", &self.hash),
            ],
        );
        m
    }
}
