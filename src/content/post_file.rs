use std::{fs, io};
use std::path::{Path, PathBuf};

use crate::content::{compile, CompileError};
use crate::post::PostDescriptor;

const POST_EXTENSION: &str = "txt";

pub struct PostFile {
    pub file_path: PathBuf,
    pub raw_content: String,
}

impl PostFile {
    pub fn from_file(file_path: PathBuf) -> io::Result<PostFile> {
        let raw_content = fs::read_to_string(&file_path)?;

        Ok(PostFile {
            file_path,
            raw_content,
        })
    }

    pub fn is_post_file(path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|ext| ext == POST_EXTENSION)
    }

    pub fn file_name(&self) -> String {
        self.file_path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn compile(&self) -> Result<PostDescriptor, CompileError> {
        compile(&self.raw_content)
    }
}
