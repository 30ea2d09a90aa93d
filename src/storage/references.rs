//! Reference files supplied alongside a question

use crate::models::Reference;
use crate::utils::error::AppResult;
use std::path::Path;
use tracing::debug;

/// Load references from a JSON file holding either an array of records or a single record
pub fn load_references(path: &Path) -> AppResult<Vec<Reference>> {
    let data = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&data)?;

    let references: Vec<Reference> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };

    debug!("Loaded {} references from {:?}", references.len(), path);
    Ok(references)
}

/// Render references as a prompt block
pub fn references_context(references: &[Reference]) -> String {
    references
        .iter()
        .map(|r| {
            format!(
                "Title: {}\nAuthor: {}\nYear: {}\nPages: {}\n\n",
                r.title.as_deref().unwrap_or("Unknown title"),
                r.author.as_deref().unwrap_or("Unknown author"),
                r.year.as_deref().unwrap_or("Unknown year"),
                r.page.as_deref().unwrap_or("Unknown page"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_context_fills_gaps() {
        let refs = vec![Reference {
            title: Some("The Rust Programming Language".to_string()),
            author: None,
            year: Some("2018".to_string()),
            page: None,
        }];

        assert_eq!(
            references_context(&refs),
            "Title: The Rust Programming Language\nAuthor: Unknown author\nYear: 2018\nPages: Unknown page\n\n"
        );
    }
}
