//! Load a product book from JSON
//!
//! A book is a JSON array of product documents. Individual documents that
//! fail to parse are skipped with a warning so one malformed product cannot
//! take down a whole batch run.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::EngineError;
use super::data::Product;

/// Load every product in a JSON book file
pub fn load_book(path: &Path) -> Result<Vec<Product>, EngineError> {
    let raw = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    let documents: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    let mut products = Vec::with_capacity(documents.len());
    for (idx, document) in documents.into_iter().enumerate() {
        match serde_json::from_value::<Product>(document) {
            Ok(product) => products.push(product),
            Err(e) => warn!("skipping product at index {} in {}: {}", idx, path.display(), e),
        }
    }
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_malformed_document_is_skipped() {
        let mut file = tempfile_path("book.json");
        write!(
            file.1,
            r#"[
                {{"id": "good", "productType": "orion", "underlyings": []}},
                {{"id": "bad", "productType": "unknown_family"}}
            ]"#
        )
        .unwrap();

        let products = load_book(&file.0).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "good");
    }

    fn tempfile_path(name: &str) -> (std::path::PathBuf, std::fs::File) {
        let dir = std::env::temp_dir().join(format!("valuation_engine_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
