use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Repository paths that should be open once they appear in the tree.
///
/// Filled from the nodes open before a refresh, from the saved state, or by
/// a deep link. A path is removed when its node is reopened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionMemory {
    paths: BTreeSet<String>,
}

impl ExpansionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    pub fn extend<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
    }

    /// Remove `path` if remembered, reporting whether it was.
    pub fn take(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

/// Format written by the current release.
pub const STATE_VERSION: u32 = 1;

/// On-disk record of the open tree paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionState {
    pub version: u32,
    #[serde(default)]
    pub open_paths: Vec<String>,
}

impl ExpansionState {
    pub fn new(open_paths: Vec<String>) -> Self {
        Self {
            version: STATE_VERSION,
            open_paths,
        }
    }

    /// Read saved paths. A missing file or version 0 means nothing was saved.
    pub fn load(path: &Path) -> Result<Vec<String>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let state: ExpansionState = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        if state.version == 0 {
            debug!(path = %path.display(), "expansion state has version 0");
            return Ok(Vec::new());
        }
        info!(path = %path.display(), count = state.open_paths.len(), "loaded expansion state");
        Ok(state.open_paths)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(path, json)?;
        info!(path = %path.display(), count = self.open_paths.len(), "saved expansion state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn take_removes_once() {
        let mut memory = ExpansionMemory::new();
        memory.extend(["/trunk", "/trunk/lib"]);
        assert!(memory.take("/trunk/lib"));
        assert!(!memory.take("/trunk/lib"));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        ExpansionState::new(vec!["/trunk".into(), "/trunk/lib".into()])
            .save(&path)
            .unwrap();
        assert_eq!(
            ExpansionState::load(&path).unwrap(),
            vec!["/trunk".to_string(), "/trunk/lib".to_string()]
        );
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(ExpansionState::load(&dir.path().join("none.json"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn version_zero_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"version":0,"open_paths":["/trunk"]}"#).unwrap();
        assert!(ExpansionState::load(&path).unwrap().is_empty());
    }

    #[test]
    fn later_versions_read_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"version":7,"open_paths":["/b","/a"]}"#).unwrap();
        assert_eq!(ExpansionState::load(&path).unwrap(), vec!["/b", "/a"]);
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ExpansionState::load(&path),
            Err(AppError::Config(_))
        ));
    }
}
