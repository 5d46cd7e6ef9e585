use super::{Item, ItemFilter, ItemStore, Result};
use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Append-only document store, one JSON document per line
pub struct JsonlStorage {
    path: PathBuf,
    // Held for the whole write so concurrent appends never interleave
    write_lock: Mutex<()>,
}

impl JsonlStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the file (and its parent directory) if missing
    pub fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        info!(path = ?self.path, "JSONL storage initialized");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one document and return its line number
    pub fn append(&self, item: &Item) -> Result<usize> {
        let mut line = serde_json::to_string(item)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let line_no = self.count_lines()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(line_no)
    }

    pub fn count_lines(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut count = 0;
        for line in reader.lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Scan every document and keep the ones matching the filter
    pub fn scan(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut matches = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Item>(&line) {
                Ok(item) if filter.matches(&item) => matches.push(item),
                Ok(_) => {}
                Err(e) => warn!(line = line_no + 1, error = %e, "Skipping malformed document"),
            }
        }

        Ok(matches)
    }
}

#[async_trait]
impl ItemStore for JsonlStorage {
    fn backend(&self) -> &'static str {
        "jsonl"
    }

    async fn insert(&self, item: &Item) -> Result<()> {
        let line_no = self.append(item)?;
        info!(upc = %item.upc, line = line_no, "Item appended");
        Ok(())
    }

    async fn find(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.scan(filter)
    }

    async fn count(&self) -> Result<usize> {
        self.count_lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Location, Price};
    use chrono::Utc;
    use tempfile::tempdir;

    fn item(upc: &str, name: &str, price: f64) -> Item {
        Item::reported(
            upc.to_string(),
            name.to_string(),
            "CornerMart".to_string(),
            Location { lat: 1.0, long: 2.0 },
            Price::new("u1".to_string(), price, Utc::now()),
        )
    }

    #[test]
    fn initialize_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let storage = JsonlStorage::new(dir.path().join("nested/data/items.jsonl"));

        storage.initialize().unwrap();

        assert!(storage.path().exists());
        assert_eq!(storage.count_lines().unwrap(), 0);
    }

    #[test]
    fn append_returns_sequential_line_numbers() {
        let dir = tempdir().unwrap();
        let storage = JsonlStorage::new(dir.path().join("items.jsonl"));
        storage.initialize().unwrap();

        assert_eq!(storage.append(&item("1", "Milk", 3.5)).unwrap(), 0);
        assert_eq!(storage.append(&item("2", "Eggs", 2.0)).unwrap(), 1);
        assert_eq!(storage.count_lines().unwrap(), 2);
    }

    #[tokio::test]
    async fn find_returns_exact_matches_in_order() {
        let dir = tempdir().unwrap();
        let storage = JsonlStorage::new(dir.path().join("items.jsonl"));
        storage.initialize().unwrap();

        storage.insert(&item("1", "Milk", 3.5)).await.unwrap();
        storage.insert(&item("2", "Milk Chocolate", 1.0)).await.unwrap();
        storage.insert(&item("1", "Milk", 3.25)).await.unwrap();

        let found = storage
            .find(&ItemFilter::Name("Milk".to_string()))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].stores[0].price[0].price, 3.5);
        assert_eq!(found[1].stores[0].price[0].price, 3.25);

        let by_upc = storage
            .find(&ItemFilter::Upc("2".to_string()))
            .await
            .unwrap();
        assert_eq!(by_upc.len(), 1);
        assert_eq!(by_upc[0].name, "Milk Chocolate");
    }

    #[tokio::test]
    async fn find_on_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = JsonlStorage::new(dir.path().join("never-created.jsonl"));

        let found = storage
            .find(&ItemFilter::Name("Milk".to_string()))
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.jsonl");
        let storage = JsonlStorage::new(&path);
        storage.insert(&item("1", "Milk", 3.5)).await.unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        let found = storage
            .find(&ItemFilter::Name("Milk".to_string()))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
