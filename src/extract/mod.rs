//! Source-format extractors.
//!
//! An [`Extractor`] turns one file into a list of [`Annotation`]s. Every
//! extractor offers a cheap sniff (`can_process`) that must not parse the
//! whole file, and the full parse (`run`). A file the extractor does not
//! recognize is not an error: `can_process` simply says no.
//!
//! Extractors are kept in an ordered [`ExtractorRegistry`]; new formats are
//! added by registering another implementation.

mod content;
mod pdf;
mod pocketbook;

pub use content::{normalize_whitespace, resolve_content};
pub use pdf::PdfExtractor;
pub use pocketbook::{GENERATOR_MARKER, PocketBookExtractor};

use std::path::Path;

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::model::Annotation;

/// Polymorphic interface for format-specific annotation sources.
pub trait Extractor {
    /// Identifier used to select the extractor, e.g. `pdf`.
    fn name(&self) -> &'static str;

    /// Whether this extractor understands `path`.
    ///
    /// Sniffs the content type only. Unreadable files are logged and
    /// rejected.
    fn can_process(&self, path: &Path) -> bool;

    /// Extract all usable annotations from `path`.
    ///
    /// Returns [`Error::Extraction`] when the file is recognized but its
    /// structure is broken.
    fn run(&self, path: &Path, config: &ExtractConfig) -> Result<Vec<Annotation>>;
}

/// Ordered set of available extractors.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorRegistry {
    /// Registry with every built-in extractor: `pdf`, then `pocketbook`.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PdfExtractor::new()));
        registry.register(Box::new(PocketBookExtractor::new()));
        registry
    }
}

impl ExtractorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Add an extractor, replacing any previous one with the same name.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        if let Some(existing) = self
            .extractors
            .iter_mut()
            .find(|e| e.name() == extractor.name())
        {
            *existing = extractor;
        } else {
            self.extractors.push(extractor);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// All extractors, in registration order.
    pub fn all(&self) -> Vec<&dyn Extractor> {
        self.extractors.iter().map(|e| e.as_ref()).collect()
    }

    /// The named extractors, in the order given. An empty selection means all.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&dyn Extractor>> {
        if names.is_empty() {
            return Ok(self.all());
        }
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| Error::UnknownExtractor(name.as_ref().to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Extractor for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn can_process(&self, _path: &Path) -> bool {
            false
        }

        fn run(&self, _path: &Path, _config: &ExtractConfig) -> Result<Vec<Annotation>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_default_order() {
        assert_eq!(ExtractorRegistry::default().names(), vec!["pdf", "pocketbook"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ExtractorRegistry::default();
        registry.register(Box::new(Named("epub")));
        registry.register(Box::new(Named("pdf")));
        assert_eq!(registry.names(), vec!["pdf", "pocketbook", "epub"]);
    }

    #[test]
    fn test_select() {
        let registry = ExtractorRegistry::default();
        let picked = registry.select(&["pocketbook"]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name(), "pocketbook");

        let none: [&str; 0] = [];
        assert_eq!(registry.select(&none).unwrap().len(), 2);

        let err = registry.select(&["djvu"]).err().unwrap();
        assert!(matches!(err, Error::UnknownExtractor(name) if name == "djvu"));
    }
}
