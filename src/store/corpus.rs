use crate::config::MaskOptions;
use crate::error::{Result, TearMatchingError};
use crate::image::loader::FragmentMask;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions the directory corpus treats as images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "gif", "webp"];

/// One fragment yielded by a corpus, already decoded or failed to decode.
#[derive(Debug)]
pub struct CorpusEntry {
    pub identifier: String,
    pub source: Option<String>,
    pub mask: Result<FragmentMask>,
}

impl CorpusEntry {
    pub fn new(identifier: impl Into<String>, mask: FragmentMask) -> Self {
        Self {
            identifier: identifier.into(),
            source: None,
            mask: Ok(mask),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Every image file below a directory, in path order.
///
/// Identifiers are the path relative to the root without its extension,
/// using `/` separators (`notebook/page-3`).
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
    options: MaskOptions,
}

impl DirectoryCorpus {
    pub fn new<P: AsRef<Path>>(root: P, options: MaskOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn identifier_for(root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl IntoIterator for DirectoryCorpus {
    type Item = CorpusEntry;
    type IntoIter = Box<dyn Iterator<Item = CorpusEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        let DirectoryCorpus { root, options } = self;
        debug!("Scanning corpus directory {}", root.display());

        let entries = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() && Self::is_image(entry.path()) => {
                    let path = entry.path();
                    Some(CorpusEntry {
                        identifier: Self::identifier_for(&root, path),
                        source: Some(path.display().to_string()),
                        mask: FragmentMask::from_file(path, &options),
                    })
                }
                Ok(_) => None,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf);
                    Some(CorpusEntry {
                        identifier: path
                            .as_deref()
                            .map(|p| Self::identifier_for(&root, p))
                            .unwrap_or_else(|| "<unreadable>".to_string()),
                        source: path.map(|p| p.display().to_string()),
                        mask: Err(TearMatchingError::IoError(e.into())),
                    })
                }
            });

        Box::new(entries)
    }
}
