//! High score persistence

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait HighScoreStore {
    fn load(&self) -> Result<u32>;
    fn save(&self, score: u32) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u32,
}

// --- JSON file ---

/// `{"high_score": n}` on disk. A missing file reads as 0.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn load(&self) -> Result<u32> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let file: HighScoreFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(file.high_score)
    }

    fn save(&self, score: u32) -> Result<()> {
        let json = serde_json::to_string_pretty(&HighScoreFile { high_score: score })?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

// --- In memory ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    score: Mutex<u32>,
}

impl MemoryStore {
    pub fn new(score: u32) -> Self {
        Self {
            score: Mutex::new(score),
        }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> Result<u32> {
        Ok(*self.score.lock())
    }

    fn save(&self, score: u32) -> Result<()> {
        *self.score.lock() = score;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pose_runner_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_is_zero() {
        let store = JsonFileStore::new(temp_path("missing"));
        let _ = fs::remove_file(store.path());
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let store = JsonFileStore::new(temp_path("save"));
        store.save(42).unwrap();
        assert_eq!(store.load().unwrap(), 42);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"high_score\": 42"));
        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new(3);
        assert_eq!(store.load().unwrap(), 3);
        store.save(9).unwrap();
        assert_eq!(store.load().unwrap(), 9);
    }
}
