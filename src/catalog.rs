//! The card catalog: an ordered JSON list of identifiers and artwork paths.

use std::fs::OpenOptions;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// One physical token: an artwork front and a code back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub identifier: String,
    pub image: PathBuf,
}

impl Card {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(identifier: S, image: P) -> Self {
        Self {
            identifier: identifier.into(),
            image: image.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {index} in catalog has an empty id")]
    EmptyIdentifier { index: usize },
    #[error("catalog {0} contains no entries")]
    Empty(PathBuf),
}

/// Raw record as written in the catalog file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    image: PathBuf,
}

/// Ordered card list plus the directory artwork paths are resolved against.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub cards: Vec<Card>,
    pub base_dir: PathBuf,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| CatalogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let catalog = Self::from_entries(entries, base_dir, path)?;
        log::info!(
            "loaded {} card(s) from {}",
            catalog.cards.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from an in-memory JSON document.
    pub fn from_json(json: &str, base_dir: PathBuf) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                path: PathBuf::from("<memory>"),
                source,
            })?;
        Self::from_entries(entries, base_dir, Path::new("<memory>"))
    }

    fn from_entries(
        entries: Vec<CatalogEntry>,
        base_dir: PathBuf,
        origin: &Path,
    ) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty(origin.to_path_buf()));
        }
        let mut cards = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.id.is_empty() {
                return Err(CatalogError::EmptyIdentifier { index });
            }
            cards.push(Card::new(entry.id, entry.image));
        }
        Ok(Self { cards, base_dir })
    }

    /// SHA-256 over the ordered card list, used to compare regenerated batches.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for card in &self.cards {
            hasher.update(card.identifier.as_bytes());
            hasher.update([0u8]);
            hasher.update(card.image.to_string_lossy().as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
