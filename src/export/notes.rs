use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::config::{DEFAULT_MINIMUM_SIMILARITY, DEFAULT_NOTES_NAME};
use crate::error::Result;
use crate::format::Formatter;
use crate::library::ensure_notes_file;
use crate::model::{AnnotatedDocument, Document};

use super::command::{commit_files, open_in_editor};
use super::dedup::{append_blocks, drop_existing, split_blocks};
use super::Exporter;

/// Appends new annotations to each document's notes file.
///
/// Annotations already recorded in the file are skipped unless `force` is
/// set. Optionally opens the file in an editor afterwards and commits the
/// change with git.
pub struct NotesExporter {
    formatter: Box<dyn Formatter>,
    notes_name: String,
    minimum_similarity: f64,
    force: bool,
    edit: bool,
    git: bool,
}

impl NotesExporter {
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        Self {
            formatter,
            notes_name: DEFAULT_NOTES_NAME.to_string(),
            minimum_similarity: DEFAULT_MINIMUM_SIMILARITY,
            force: false,
            edit: false,
            git: false,
        }
    }

    /// File name used when a document has no notes file yet.
    pub fn with_notes_name(mut self, name: impl Into<String>) -> Self {
        self.notes_name = name.into();
        self
    }

    pub fn with_minimum_similarity(mut self, threshold: f64) -> Self {
        self.minimum_similarity = threshold;
        self
    }

    /// Append every block, even those already in the file.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Open each notes file in the editor after writing.
    pub fn with_edit(mut self, edit: bool) -> Self {
        self.edit = edit;
        self
    }

    /// Commit changed notes files.
    pub fn with_git(mut self, git: bool) -> Self {
        self.git = git;
        self
    }

    /// Append the new blocks of `annotated`; returns how many were written.
    fn write_notes(&self, document: &mut Document, annotated: &AnnotatedDocument) -> Result<usize> {
        let path = ensure_notes_file(document, &self.notes_name)?;
        let blocks = split_blocks(&self.formatter.format_document(annotated));

        let existing = fs::read_to_string(&path)?;
        let blocks = if self.force {
            blocks
        } else {
            let lines: Vec<&str> = existing.lines().collect();
            drop_existing(blocks, &lines, self.minimum_similarity)
        };
        if blocks.is_empty() {
            log::debug!("No new annotations for {}", document.describe());
            return Ok(0);
        }

        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(append_blocks(&existing, &blocks).as_bytes())?;
        log::info!(
            "Wrote {} {} to {}",
            blocks.len(),
            if blocks.len() == 1 { "block" } else { "blocks" },
            document.describe()
        );
        Ok(blocks.len())
    }

    fn commit(&self, document: &Document) -> Result<()> {
        let (Some(folder), Some(notes), Some(info)) =
            (document.folder(), document.notes_file(), document.info_file())
        else {
            return Ok(());
        };
        let message = format!("Update notes for '{}'", document.describe());
        commit_files(folder, &[notes.as_path(), info.as_path()], &message)
    }
}

impl Exporter for NotesExporter {
    fn export(&mut self, docs: &[AnnotatedDocument]) -> Result<()> {
        for annotated in docs {
            let mut document = annotated.document.clone();
            let mut changed = false;

            if !annotated.is_empty() {
                changed = self.write_notes(&mut document, annotated)? > 0;
            }

            if self.edit {
                let path = ensure_notes_file(&mut document, &self.notes_name)?;
                open_in_editor(&path)?;
                changed = true;
            }

            if self.git && changed {
                self.commit(&document)?;
            }
        }
        Ok(())
    }
}
