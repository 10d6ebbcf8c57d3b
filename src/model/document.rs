use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use super::Annotation;

/// Metadata file expected in every library entry folder.
pub const INFO_FILE_NAME: &str = "info.yaml";

/// A library entry: its folder and its `info.yaml` fields.
///
/// The raw mapping is kept whole so that it can be written back without
/// losing fields this crate does not know about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    folder: Option<PathBuf>,
    data: Mapping,
}

impl Document {
    /// An empty document without a folder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(folder: Option<PathBuf>, data: Mapping) -> Self {
        Self { folder, data }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style list of attached files (relative to the folder).
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|f| Value::String(f.into()))
            .collect();
        self.data
            .insert(Value::String("files".into()), Value::Sequence(files));
        self
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Scalar field as a string. Empty values read as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let text = match self.data.get(key)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.data
            .insert(Value::String(key.into()), Value::String(value.into()));
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.data
    }

    /// Attached files, resolved against the folder.
    pub fn files(&self) -> Vec<PathBuf> {
        let names: Vec<&str> = match self.data.get("files") {
            Some(Value::Sequence(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) => vec![single.as_str()],
            _ => Vec::new(),
        };
        names.into_iter().map(|name| self.resolve(name)).collect()
    }

    /// Path of the metadata file, when the document lives in a folder.
    pub fn info_file(&self) -> Option<PathBuf> {
        self.folder.as_ref().map(|f| f.join(INFO_FILE_NAME))
    }

    /// Path of the notes file named by the `notes` field, if set.
    pub fn notes_file(&self) -> Option<PathBuf> {
        self.get("notes").map(|name| self.resolve(&name))
    }

    /// Short human-readable description, e.g. `Title - Author`.
    pub fn describe(&self) -> String {
        match (self.get("title"), self.get("author")) {
            (Some(title), Some(author)) => format!("{title} - {author}"),
            (Some(title), None) => title,
            (None, Some(author)) => author,
            (None, None) => self
                .get("ref")
                .or_else(|| {
                    self.folder
                        .as_ref()
                        .and_then(|f| f.file_name())
                        .map(|n| n.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "<unnamed document>".to_string()),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match &self.folder {
            Some(folder) if path.is_relative() => folder.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// A document together with the annotations extracted from its files.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedDocument {
    pub document: Document,
    pub annotations: Vec<Annotation>,
}

impl AnnotatedDocument {
    pub fn new(document: Document, annotations: Vec<Annotation>) -> Self {
        Self {
            document,
            annotations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
