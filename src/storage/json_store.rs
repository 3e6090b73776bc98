use crate::model::Post;
use crate::storage::{PostStore, StorageResult};
use std::path::{Path, PathBuf};

/// JSON-file collection store
///
/// The whole collection lives in one pretty-printed JSON array, the format
/// the rest of the toolchain around these harvests already reads.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PostStore for JsonStore {
    fn load(&self) -> StorageResult<Vec<Post>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let posts = serde_json::from_str(&data)?;
        Ok(posts)
    }

    fn save(&self, posts: &[Post]) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(posts)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
