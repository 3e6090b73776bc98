use crate::storage::StorageResult;
use std::path::{Path, PathBuf};

/// Side-directory archive of raw fetched pages
///
/// Purely a debugging aid: one HTML file per fetched page, named by page
/// index. Has no effect on extraction or pagination.
pub struct PageArchive {
    dir: PathBuf,
}

impl PageArchive {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Writes one page's raw document to the archive directory
    pub fn save_page(&self, page: u32, body: &str) -> StorageResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("page-{page}.html"));
        std::fs::write(path, body)?;
        Ok(())
    }
}
