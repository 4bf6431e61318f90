//! Photo files on disk. Records reference files by a path relative to the static root.

use std::fs;
use std::io;
use std::path::PathBuf;

use uuid::Uuid;

/// Prefix stored in image records; files live directly under the upload directory.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Accepted photo formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExtension {
    Png,
    Jpg,
    Jpeg,
    Webp,
}

impl ImageExtension {
    /// Extension of the client-supplied name, case-insensitive. Anything else is refused.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    pub fn mime(&self) -> mime::Mime {
        match self {
            Self::Png => mime::IMAGE_PNG,
            Self::Jpg | Self::Jpeg => mime::IMAGE_JPEG,
            // The mime crate ships no WebP constant.
            Self::Webp => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        }
    }
}

/// A file received in an upload batch, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Keep only candidates with a name and an allowed extension; the rest are silently dropped.
pub fn accepted_uploads(candidates: Vec<UploadCandidate>) -> Vec<(UploadCandidate, ImageExtension)> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let extension = ImageExtension::from_file_name(candidate.file_name.trim())?;
            Some((candidate, extension))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("image storage i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("'{0}' is not a stored image path")]
    InvalidPath(String),
}

/// Where photo bytes go. Implementations must name files independently of the client name.
pub trait ImageStore: Send + Sync {
    /// Persist bytes and return the relative path recorded on the image.
    fn save(&self, bytes: &[u8], extension: ImageExtension) -> Result<String, StorageError>;
    /// Remove a previously saved file. A file that is already gone is not an error.
    fn remove(&self, path: &str) -> Result<(), StorageError>;
}

/// Filesystem-backed store writing `<upload_dir>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Open the store, creating the upload directory when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Map a bare stored file name to its location on disk. Names that could escape the
    /// upload directory resolve to `None`.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let (stem, _) = file_name.rsplit_once('.')?;
        let stem_ok = !stem.is_empty() && stem.chars().all(|c| c.is_ascii_alphanumeric());
        if !stem_ok || ImageExtension::from_file_name(file_name).is_none() {
            return None;
        }
        Some(self.root.join(file_name))
    }

    fn locate(&self, path: &str) -> Result<PathBuf, StorageError> {
        path.strip_prefix(UPLOAD_PREFIX)
            .and_then(|name| self.resolve(name))
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))
    }
}

impl ImageStore for FsImageStore {
    fn save(&self, bytes: &[u8], extension: ImageExtension) -> Result<String, StorageError> {
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension.as_str());
        fs::write(self.root.join(&file_name), bytes)?;
        Ok(format!("{UPLOAD_PREFIX}{file_name}"))
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        let location = self.locate(path)?;
        match fs::remove_file(location) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
