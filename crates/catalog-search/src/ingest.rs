//! Product files on disk: every `*.json` file under a directory holds either
//! one product or an array of products.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use catalog_core::{Error, Product, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductFile {
    Many(Vec<Product>),
    One(Product),
}

/// All `.json` files under `root`, sorted.
pub fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let raw = fs::read(path).map_err(|e| Error::Operation(format!("read {}: {e}", path.display())))?;
    let parsed: ProductFile = serde_json::from_slice(&raw)?;
    let products = match parsed {
        ProductFile::Many(products) => products,
        ProductFile::One(product) => vec![product],
    };
    debug!(path = %path.display(), count = products.len(), "read product file");
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_and_array_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let one = r#"{"id":"a","name":"A","description":"d","category":"c","price":1.5,"image_url":"u"}"#;
        fs::write(dir.path().join("one.json"), one).expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested/many.json"), format!("[{one},{one}]")).expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let files = list_json_files(dir.path());
        assert_eq!(files.len(), 2);
        let counts: Vec<usize> = files.iter().map(|f| read_products(f).expect("read").len()).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"id":"a"}"#).expect("write");
        assert!(matches!(read_products(&path), Err(Error::Json(_))));
    }
}
