use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use spdlog::{error, info, warn};

use crate::automation::{Browser, UiError};
use crate::config::Paths;
use crate::content::post_file::PostFile;
use crate::post::PostDescriptor;
use crate::publisher::{Outcome, Publisher};
use crate::util::fs_helper::move_file;

/// Anything that can take a compiled post and put it online.
pub trait PostSink {
    fn publish(&mut self, post: &PostDescriptor) -> Result<Outcome, UiError>;
}

impl<B: Browser> PostSink for Publisher<B> {
    fn publish(&mut self, post: &PostDescriptor) -> Result<Outcome, UiError> {
        self.create_post(post)
    }
}

/// File names of the documents of one run, by result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn log(&self, failed_dir: &Path) {
        info!("Processed {} documents: {} succeeded, {} failed", self.total(), self.succeeded.len(), self.failed.len());
        if self.has_failures() {
            warn!("Failed documents moved to {}: {}", failed_dir.display(), self.failed.join(", "));
        }
    }
}

enum Disposition {
    Succeeded,
    Failed(String),
    Fatal(UiError),
}

/// Post documents of `dir`, sorted by name.
pub fn list_post_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| PostFile::is_post_file(path))
        .collect();
    files.sort();
    Ok(files)
}

fn process_document<S: PostSink + ?Sized>(sink: &mut S, path: &Path) -> Disposition {
    let post_file = match PostFile::from_file(path.to_path_buf()) {
        Ok(file) => file,
        Err(e) => return Disposition::Failed(format!("Error reading file: {}", e)),
    };

    let post = match post_file.compile() {
        Ok(post) => post,
        Err(e) => return Disposition::Failed(e.to_string()),
    };

    match sink.publish(&post) {
        Ok(outcome) if outcome.success => Disposition::Succeeded,
        Ok(outcome) => Disposition::Failed(outcome.reason.unwrap_or_else(|| "unknown reason".to_string())),
        Err(e) => Disposition::Fatal(e),
    }
}

fn archive(path: &Path, target_dir: &Path) {
    match move_file(path, target_dir) {
        Ok(target) => info!("Moved {} to {}", path.display(), target.display()),
        Err(e) => error!("Could not move {} to {}: {}", path.display(), target_dir.display(), e),
    }
}

/// Publishes every document of the input directory in name order and
/// archives each one. A bad document never stops the run; a dead browser
/// session does, after archiving the document it happened on.
pub fn process_files<S: PostSink + ?Sized>(sink: &mut S, paths: &Paths, interrupted: &AtomicBool) -> Result<Summary, UiError> {
    let mut summary = Summary::default();

    let files = match list_post_files(&paths.input_dir) {
        Ok(files) => files,
        Err(e) => {
            error!("Could not list {}: {}", paths.input_dir.display(), e);
            return Ok(summary);
        }
    };
    if files.is_empty() {
        info!("No documents to publish in {}", paths.input_dir.display());
        return Ok(summary);
    }

    for (i, path) in files.iter().enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            warn!("Interrupted, leaving {} documents in {}", files.len() - i, paths.input_dir.display());
            break;
        }

        let name = path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        info!("Processing {} ({}/{})", name, i + 1, files.len());

        match process_document(sink, path) {
            Disposition::Succeeded => {
                archive(path, &paths.processed_dir);
                summary.succeeded.push(name);
            }
            Disposition::Failed(reason) => {
                error!("Failed to publish {}: {}", name, reason);
                archive(path, &paths.failed_dir);
                summary.failed.push(name);
            }
            Disposition::Fatal(e) => {
                error!("Browser session lost while publishing {}: {}", name, e);
                archive(path, &paths.failed_dir);
                summary.failed.push(name);
                summary.log(&paths.failed_dir);
                return Err(e);
            }
        }
    }

    summary.log(&paths.failed_dir);
    Ok(summary)
}
