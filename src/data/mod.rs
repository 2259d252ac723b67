//! Core data model for the pollen dashboard
//!
//! This module contains the data types shared between the scraping client and
//! the HTTP frontend, and re-exports the client itself.

pub mod pollen;

pub use pollen::{PollenClient, PollenError, DEFAULT_BASE_URL};

use serde::{Deserialize, Serialize};

/// One row of the upstream pollen table
///
/// Rows keep the order in which they appear in the source table. The first
/// cell of each row holds a pictogram and is skipped when naming the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollenRow {
    /// Pollen type name, taken from the second table cell
    pub name: String,
    /// Trimmed text of every cell in the row, in document order
    pub columns: Vec<String>,
    /// Count parsed from the last cell; malformed content degrades to 0
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollen_row_serialization_roundtrip() {
        let row = PollenRow {
            name: "Grassen".to_string(),
            columns: vec![
                String::new(),
                "Grassen".to_string(),
                "12".to_string(),
                "42".to_string(),
            ],
            total: 42,
        };

        let json = serde_json::to_string(&row).expect("Failed to serialize PollenRow");
        let deserialized: PollenRow =
            serde_json::from_str(&json).expect("Failed to deserialize PollenRow");

        assert_eq!(deserialized, row);
    }

    #[test]
    fn test_pollen_row_json_field_names() {
        let row = PollenRow {
            name: "Berk".to_string(),
            columns: vec!["Berk".to_string()],
            total: 7,
        };

        let json = serde_json::to_string(&row).expect("Failed to serialize PollenRow");
        assert!(json.contains("\"name\""));
        assert!(json.contains("\"columns\""));
        assert!(json.contains("\"total\""));
    }
}
