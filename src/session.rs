//! Per-file analysis state for a batch of images.
//!
//! Files are identified by name and size, so selecting the same photo twice
//! is a no-op. Each file moves through [`FileStatus`] independently of the
//! others; a failed file can be analyzed again.

use std::path::PathBuf;

use crate::ai::AnalysisResult;
use crate::config::Limits;

/// The only image type accepted for analysis.
pub const ACCEPTED_MIME_TYPE: &str = "image/jpeg";

/// Identity of a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    pub name: String,
    pub size: u64,
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.size)
    }
}

/// A file offered to the session.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Pending,
    Analyzing,
    Analyzed(AnalysisResult),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: FileId,
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Selected files, in selection order, with their analysis state.
#[derive(Debug, Clone)]
pub struct Session {
    limits: Limits,
    files: Vec<FileEntry>,
}

impl Session {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            files: Vec::new(),
        }
    }

    /// Add files to the session.
    ///
    /// Duplicates are skipped silently. Oversized files and non-JPEG files
    /// are rejected, and anything past `max_files` is discarded. Returns one
    /// message per rejection.
    pub fn add_files(&mut self, incoming: impl IntoIterator<Item = IncomingFile>) -> Vec<String> {
        let mut errors = Vec::new();
        let mut accepted: Vec<FileEntry> = Vec::new();
        let max_mb = self.limits.max_file_size / (1024 * 1024);

        for file in incoming {
            let id = FileId {
                name: file.name.clone(),
                size: file.size,
            };
            if self.contains(&id) || accepted.iter().any(|f| f.id == id) {
                continue;
            }
            if file.size > self.limits.max_file_size {
                errors.push(format!("{}: File is too large (max {max_mb}MB)", file.name));
                continue;
            }
            if file.mime_type != ACCEPTED_MIME_TYPE {
                errors.push(format!("{}: Invalid file type (must be JPG)", file.name));
                continue;
            }
            accepted.push(FileEntry {
                id,
                path: file.path,
                status: FileStatus::Pending,
            });
        }

        self.files.extend(accepted);
        if self.files.len() > self.limits.max_files {
            let discarded = self.files.len() - self.limits.max_files;
            errors.push(format!(
                "You can only upload {} files. {discarded} additional files were discarded.",
                self.limits.max_files
            ));
            self.files.truncate(self.limits.max_files);
        }

        errors
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.files.iter().any(|f| &f.id == id)
    }

    pub fn remove(&mut self, id: &FileId) -> Option<FileEntry> {
        let idx = self.files.iter().position(|f| &f.id == id)?;
        Some(self.files.remove(idx))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn status(&self, id: &FileId) -> Option<&FileStatus> {
        self.entry(id).map(|f| &f.status)
    }

    /// Files without a result yet (pending, in flight, or failed).
    pub fn pending(&self) -> Vec<FileId> {
        self.files
            .iter()
            .filter(|f| !matches!(f.status, FileStatus::Analyzed(_)))
            .map(|f| f.id.clone())
            .collect()
    }

    /// Move every file without a result into [`FileStatus::Analyzing`].
    /// Returns the files that were moved.
    pub fn start_analysis(&mut self) -> Vec<FileEntry> {
        let mut started = Vec::new();
        for file in &mut self.files {
            if !matches!(file.status, FileStatus::Analyzed(_)) {
                file.status = FileStatus::Analyzing;
                started.push(file.clone());
            }
        }
        started
    }

    pub fn mark_analyzing(&mut self, id: &FileId) {
        self.set_status(id, FileStatus::Analyzing);
    }

    pub fn mark_analyzed(&mut self, id: &FileId, result: AnalysisResult) {
        self.set_status(id, FileStatus::Analyzed(result));
    }

    pub fn mark_failed(&mut self, id: &FileId, error: impl Into<String>) {
        self.set_status(id, FileStatus::Failed(error.into()));
    }

    /// `true` once every file has a result.
    pub fn all_analyzed(&self) -> bool {
        !self.files.is_empty()
            && self
                .files
                .iter()
                .all(|f| matches!(f.status, FileStatus::Analyzed(_)))
    }

    /// `true` while any file is in flight.
    pub fn is_busy(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.status, FileStatus::Analyzing))
    }

    fn entry(&self, id: &FileId) -> Option<&FileEntry> {
        self.files.iter().find(|f| &f.id == id)
    }

    fn set_status(&mut self, id: &FileId, status: FileStatus) {
        match self.files.iter_mut().find(|f| &f.id == id) {
            Some(file) => file.status = status,
            None => log::debug!("Status update for unknown file {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str, size: u64) -> IncomingFile {
        IncomingFile {
            path: PathBuf::from(name),
            name: name.to_string(),
            size,
            mime_type: ACCEPTED_MIME_TYPE.to_string(),
        }
    }

    fn result(title: &str) -> AnalysisResult {
        AnalysisResult {
            title: title.into(),
            description: "desc".into(),
            ..Default::default()
        }
    }

    // ── add_files ────────────────────────────────────────────────────

    #[test]
    fn accepts_jpegs() {
        let mut session = Session::new(Limits::default());
        let errors = session.add_files([jpeg("a.jpg", 10), jpeg("b.jpg", 20)]);
        assert!(errors.is_empty());
        assert_eq!(session.len(), 2);
        assert_eq!(session.files()[0].status, FileStatus::Pending);
    }

    #[test]
    fn duplicates_skipped_silently() {
        let mut session = Session::new(Limits::default());
        session.add_files([jpeg("a.jpg", 10)]);
        let errors = session.add_files([jpeg("a.jpg", 10), jpeg("a.jpg", 10)]);
        assert!(errors.is_empty());
        assert_eq!(session.len(), 1);

        // same name, different size is a different file
        session.add_files([jpeg("a.jpg", 11)]);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn rejects_oversized() {
        let mut session = Session::new(Limits::default());
        let errors = session.add_files([jpeg("big.jpg", 3 * 1024 * 1024)]);
        assert_eq!(errors, ["big.jpg: File is too large (max 2MB)"]);
        assert!(session.is_empty());
    }

    #[test]
    fn rejects_wrong_type() {
        let mut session = Session::new(Limits::default());
        let png = IncomingFile {
            mime_type: "image/png".into(),
            ..jpeg("shot.png", 10)
        };
        let errors = session.add_files([png]);
        assert_eq!(errors, ["shot.png: Invalid file type (must be JPG)"]);
    }

    #[test]
    fn discards_past_limit() {
        let mut session = Session::new(Limits::default());
        session.add_files((0..3).map(|i| jpeg(&format!("{i}.jpg"), 1)));
        let errors = session.add_files((3..8).map(|i| jpeg(&format!("{i}.jpg"), 1)));

        assert_eq!(session.len(), 5);
        assert_eq!(
            errors,
            ["You can only upload 5 files. 3 additional files were discarded."]
        );
        // earliest selections are kept
        assert_eq!(session.files()[0].id.name, "0.jpg");
        assert_eq!(session.files()[4].id.name, "4.jpg");
    }

    // ── status transitions ───────────────────────────────────────────

    #[test]
    fn analysis_lifecycle() {
        let mut session = Session::new(Limits::default());
        session.add_files([jpeg("a.jpg", 1), jpeg("b.jpg", 2)]);
        let a = session.files()[0].id.clone();
        let b = session.files()[1].id.clone();

        let started = session.start_analysis();
        assert_eq!(started.len(), 2);
        assert!(session.is_busy());

        session.mark_analyzed(&a, result("A"));
        session.mark_failed(&b, "Failed to analyze image: timeout");
        assert!(!session.is_busy());
        assert!(!session.all_analyzed());
        assert_eq!(session.pending(), [b.clone()]);
        assert_eq!(
            session.status(&b),
            Some(&FileStatus::Failed("Failed to analyze image: timeout".into()))
        );

        // retry only touches the failed file
        let retried = session.start_analysis();
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].id, b);

        session.mark_analyzed(&b, result("B"));
        assert!(session.all_analyzed());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn single_file_retry() {
        let mut session = Session::new(Limits::default());
        session.add_files([jpeg("a.jpg", 1)]);
        let a = session.files()[0].id.clone();

        session.mark_failed(&a, "boom");
        session.mark_analyzing(&a);
        assert_eq!(session.status(&a), Some(&FileStatus::Analyzing));
        assert!(session.is_busy());
    }

    #[test]
    fn remove_and_clear() {
        let mut session = Session::new(Limits::default());
        session.add_files([jpeg("a.jpg", 1), jpeg("b.jpg", 2)]);
        let a = session.files()[0].id.clone();

        assert!(session.remove(&a).is_some());
        assert!(session.remove(&a).is_none());
        assert!(!session.contains(&a));
        assert_eq!(session.len(), 1);

        session.clear();
        assert!(session.is_empty());
        assert!(!session.all_analyzed());
    }

    #[test]
    fn unknown_file_updates_ignored() {
        let mut session = Session::new(Limits::default());
        let ghost = FileId {
            name: "ghost.jpg".into(),
            size: 1,
        };
        session.mark_failed(&ghost, "nope");
        assert!(session.status(&ghost).is_none());
    }

    #[test]
    fn file_id_display() {
        let id = FileId {
            name: "a.jpg".into(),
            size: 42,
        };
        assert_eq!(id.to_string(), "a.jpg-42");
    }
}
