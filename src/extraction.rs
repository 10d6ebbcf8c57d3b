//! Running extractors over library documents.
//!
//! Extraction never fails as a whole: broken files are logged and skipped,
//! documents without any usable file yield an empty annotation list.

use crate::config::ExtractConfig;
use crate::extract::Extractor;
use crate::model::{AnnotatedDocument, Annotation, Document};

/// Extract the annotations of every file attached to `document`.
///
/// Each file is offered to every extractor in order; all extractors that
/// accept it contribute. Returns `None` when no extractor accepted any file.
pub fn extract_document(
    document: &Document,
    extractors: &[&dyn Extractor],
    config: &ExtractConfig,
) -> Option<Vec<Annotation>> {
    let mut annotations = Vec::new();
    let mut file_available = false;

    for file in document.files() {
        for extractor in extractors {
            if !extractor.can_process(&file) {
                continue;
            }
            file_available = true;

            match extractor.run(&file, config) {
                Ok(found) => annotations.extend(found),
                Err(e) => log::error!(
                    "File extraction errors for {}. File may be damaged.\n{e}",
                    file.display()
                ),
            }
        }
    }

    file_available.then_some(annotations)
}

/// Extract annotations for a batch of documents, in order.
pub fn extract_documents(
    documents: &[Document],
    extractors: &[&dyn Extractor],
    config: &ExtractConfig,
) -> Vec<AnnotatedDocument> {
    documents
        .iter()
        .map(|document| {
            let annotations =
                extract_document(document, extractors, config).unwrap_or_else(|| {
                    log::warn!(
                        "Did not find suitable file for document: {}",
                        document.describe()
                    );
                    Vec::new()
                });
            AnnotatedDocument::new(document.clone(), annotations)
        })
        .collect()
}
