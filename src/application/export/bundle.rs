//! Media files shipped next to `article.json`.

use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use imagesize::ImageType;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME types the remote API accepts for bundle parts.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "font/ttf",
    "font/otf",
    "font/woff",
    "font/woff2",
    "application/font-sfnt",
    "application/x-font-truetype",
    "application/vnd.ms-opentype",
    "application/font-woff",
];

const SNIFF_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Absolute path of the original file.
    pub source: PathBuf,
    /// File name inside the workspace; referenced as `bundle://<name>`.
    pub name: String,
}

/// Ordered set of media files for one export.
#[derive(Debug, Clone, Default)]
pub struct MediaBundle {
    files: Vec<BundleFile>,
    names: BTreeSet<String>,
}

impl MediaBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `source` and return its `bundle://` reference. Adding the same path
    /// twice returns the existing reference; distinct files sharing a file name
    /// get a numeric suffix.
    pub fn add(&mut self, source: impl Into<PathBuf>) -> String {
        let source = source.into();
        if let Some(existing) = self.files.iter().find(|file| file.source == source) {
            return bundle_url(&existing.name);
        }

        let name = self.unique_name(&source);
        self.names.insert(name.clone());
        self.files.push(BundleFile { source, name: name.clone() });
        bundle_url(&name)
    }

    fn unique_name(&self, source: &Path) -> String {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "media".to_string());
        if !self.names.contains(&file_name) {
            return file_name;
        }

        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let extension = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        (2..)
            .map(|n| format!("{stem}-{n}{extension}"))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or(file_name)
    }

    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

pub fn bundle_url(name: &str) -> String {
    format!("bundle://{name}")
}

/// Content type for a bundle part.
///
/// Image magic bytes win over the file extension; anything outside the
/// allow-list is sent as `application/octet-stream`.
pub fn sniff_mime(path: &Path) -> io::Result<&'static str> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;

    let sniffed = match imagesize::image_type(&header) {
        Ok(ImageType::Jpeg) => Some("image/jpeg"),
        Ok(ImageType::Png) => Some("image/png"),
        Ok(ImageType::Gif) => Some("image/gif"),
        _ => None,
    };
    if let Some(mime) = sniffed {
        return Ok(mime);
    }

    let guessed = mime_guess::from_path(path)
        .iter()
        .map(|mime| mime.essence_str().to_string())
        .find_map(|essence| allowed(&essence));
    Ok(guessed.unwrap_or(OCTET_STREAM))
}

fn allowed(essence: &str) -> Option<&'static str> {
    ALLOWED_MIME_TYPES
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(essence))
}
