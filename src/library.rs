//! A directory-backed document library.
//!
//! The library root holds one folder per entry. A folder is an entry when it
//! contains an `info.yaml` file with the entry's metadata:
//!
//! ```text
//! papers/
//!   shannon1948/
//!     info.yaml      # title, author, files: [paper.pdf], notes: notes.md
//!     paper.pdf
//!     notes.md
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::config::DEFAULT_NOTES_NAME;
use crate::error::{Error, Result};
use crate::model::{Document, INFO_FILE_NAME};

/// All entries found under a library root.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    notes_name: String,
    documents: Vec<Document>,
}

impl Library {
    /// Read every entry folder directly below `root`, sorted by folder name.
    ///
    /// Folders without `info.yaml` are ignored; unreadable metadata is logged
    /// and the entry skipped.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut folders: Vec<PathBuf> = fs::read_dir(&root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.join(INFO_FILE_NAME).is_file())
            .collect();
        folders.sort();

        let documents = folders
            .into_iter()
            .filter_map(|folder| match load_document(&folder) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log::error!("Skipping {}: {e}", folder.display());
                    None
                }
            })
            .collect();

        Ok(Self {
            root,
            notes_name: DEFAULT_NOTES_NAME.to_string(),
            documents,
        })
    }

    /// File name given to newly created notes files.
    pub fn with_notes_name(mut self, name: impl Into<String>) -> Self {
        self.notes_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes_name(&self) -> &str {
        &self.notes_name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Documents matching every whitespace-separated term of `query`.
    ///
    /// A `key:value` term matches when field `key` contains `value`; a bare
    /// term matches when any field contains it. Matching ignores case. An
    /// empty query or `*` matches everything.
    pub fn query(&self, query: &str) -> Vec<Document> {
        let terms: Vec<String> = query
            .split_whitespace()
            .filter(|term| *term != "*")
            .map(str::to_lowercase)
            .collect();
        self.documents
            .iter()
            .filter(|doc| terms.iter().all(|term| matches_term(doc, term)))
            .cloned()
            .collect()
    }

    /// See [`ensure_notes_file`].
    pub fn ensure_notes_file(&self, document: &mut Document) -> Result<PathBuf> {
        ensure_notes_file(document, &self.notes_name)
    }
}

fn matches_term(doc: &Document, term: &str) -> bool {
    if let Some((key, value)) = term.split_once(':')
        && !key.is_empty()
    {
        return doc
            .get(key)
            .is_some_and(|field| field.to_lowercase().contains(value));
    }
    doc.mapping().values().any(|value| match scalar(value) {
        Some(text) => text.to_lowercase().contains(term),
        None => match value {
            Value::Sequence(items) => items
                .iter()
                .filter_map(scalar)
                .any(|text| text.to_lowercase().contains(term)),
            _ => false,
        },
    })
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read the entry stored in `folder`.
pub fn load_document(folder: &Path) -> Result<Document> {
    let contents = fs::read_to_string(folder.join(INFO_FILE_NAME))?;
    let data: Mapping = serde_yaml::from_str(&contents)?;
    Ok(Document::from_mapping(Some(folder.to_path_buf()), data))
}

/// Write the document's metadata back to its `info.yaml`.
pub fn save_document(document: &Document) -> Result<()> {
    let path = document
        .info_file()
        .ok_or_else(|| Error::NoFolder(document.describe()))?;
    fs::write(path, serde_yaml::to_string(document.mapping())?)?;
    Ok(())
}

/// Path of the document's notes file, creating it if needed.
///
/// When the `notes` field is unset it is set to `notes_name` and the metadata
/// is saved. The file itself is created empty when missing.
pub fn ensure_notes_file(document: &mut Document, notes_name: &str) -> Result<PathBuf> {
    if document.folder().is_none() {
        return Err(Error::NoFolder(document.describe()));
    }
    if document.get("notes").is_none() {
        document.set("notes", notes_name);
        save_document(document)?;
    }
    let path = document
        .notes_file()
        .ok_or_else(|| Error::NoFolder(document.describe()))?;
    if !path.exists() {
        OpenOptions::new().create(true).append(true).open(&path)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_entry(root: &Path, name: &str, info: &str) -> PathBuf {
        let folder = root.join(name);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(INFO_FILE_NAME), info).unwrap();
        folder
    }

    fn library() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        write_entry(
            dir.path(),
            "b-shannon",
            "title: A Mathematical Theory of Communication\nauthor: Shannon, Claude\nyear: 1948\n",
        );
        write_entry(
            dir.path(),
            "a-turing",
            "title: Computing Machinery and Intelligence\nauthor: Turing, Alan\ntags: [ai, philosophy]\n",
        );
        write_entry(dir.path(), "c-broken", "title: [unclosed\n");
        fs::create_dir_all(dir.path().join("not-an-entry")).unwrap();
        let library = Library::open(dir.path()).unwrap();
        (dir, library)
    }

    #[test]
    fn test_open_sorted_and_skips_broken() {
        let (_dir, library) = library();
        let titles: Vec<_> = library
            .documents()
            .iter()
            .filter_map(|d| d.get("author"))
            .collect();
        assert_eq!(titles, vec!["Turing, Alan", "Shannon, Claude"]);
    }

    #[test]
    fn test_query() {
        let (_dir, library) = library();
        assert_eq!(library.query("").len(), 2);
        assert_eq!(library.query("*").len(), 2);
        assert_eq!(library.query("author:shannon").len(), 1);
        assert_eq!(library.query("year:1948")[0].get("author").as_deref(), Some("Shannon, Claude"));
        assert_eq!(library.query("philosophy").len(), 1);
        assert_eq!(library.query("theory shannon").len(), 1);
        assert!(library.query("author:turing theory").is_empty());
    }

    #[test]
    fn test_ensure_notes_file() {
        let (dir, library) = library();
        let mut doc = library.query("author:turing").remove(0);
        let path = library.ensure_notes_file(&mut doc).unwrap();

        assert_eq!(path, dir.path().join("a-turing").join("notes.md"));
        assert!(path.is_file());
        let reloaded = load_document(&dir.path().join("a-turing")).unwrap();
        assert_eq!(reloaded.get("notes").as_deref(), Some("notes.md"));
        assert_eq!(reloaded.get("title"), doc.get("title"));

        // existing notes are kept as they are
        fs::write(&path, "my notes\n").unwrap();
        let again = library.ensure_notes_file(&mut doc).unwrap();
        assert_eq!(again, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "my notes\n");
    }

    #[test]
    fn test_custom_notes_name() {
        let dir = TempDir::new().unwrap();
        let folder = write_entry(dir.path(), "x", "title: X\nnotes: existing.org\n");
        let mut doc = load_document(&folder).unwrap();
        let path = ensure_notes_file(&mut doc, "notes.md").unwrap();
        assert_eq!(path, folder.join("existing.org"));
    }

    #[test]
    fn test_document_without_folder() {
        let mut doc = Document::new().with_field("title", "loose");
        let err = ensure_notes_file(&mut doc, "notes.md").unwrap_err();
        assert!(matches!(err, Error::NoFolder(_)));
    }
}
