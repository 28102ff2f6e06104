use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::lenient::{deserialize_category_paths, deserialize_optional_text};
use crate::catalog::{CatalogError, Result, NOT_AVAILABLE};

/// A product row of the `items` table.
///
/// Every textual field is present; values missing from the source record are
/// stored as [`NOT_AVAILABLE`]. `categories` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub asin: String,
    pub title: String,
    pub image_url: String,
    pub categories: BTreeSet<String>,
    pub description: String,
}

/// One line of the items corpus. Unknown keys are ignored; optional fields
/// of an unexpected type are converted rather than rejected.
#[derive(Debug, Deserialize)]
struct ItemRecord {
    asin: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    title: Option<String>,
    #[serde(rename = "imUrl", default, deserialize_with = "deserialize_optional_text")]
    im_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_category_paths")]
    categories: Vec<String>,
}

impl ItemRow {
    /// Parses one JSON line of the items corpus.
    pub fn from_json_line(line: &str) -> Result<Self> {
        let record: ItemRecord = serde_json::from_str(line)?;
        let asin = record.asin.ok_or(CatalogError::MissingField {
            record: "item",
            field: "asin",
        })?;

        let mut categories: BTreeSet<String> = record.categories.into_iter().collect();
        if categories.is_empty() {
            categories.insert(NOT_AVAILABLE.to_string());
        }

        Ok(Self {
            asin,
            title: or_not_available(record.title),
            image_url: or_not_available(record.im_url),
            categories,
            description: or_not_available(record.description),
        })
    }
}

pub(crate) fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_collapse_sorted_unique() {
        let item = ItemRow::from_json_line(
            r#"{"asin":"B001","title":"T","imUrl":"U","categories":[["A","B"],["B","C"]],"description":"D"}"#,
        )
        .unwrap();
        assert_eq!(item.asin, "B001");
        assert_eq!(item.image_url, "U");
        assert_eq!(
            item.categories.iter().map(String::as_str).collect::<Vec<_>>(),
            ["A", "B", "C"]
        );
    }

    #[test]
    fn test_missing_fields_default_to_na() {
        let item = ItemRow::from_json_line(r#"{"asin":"B002","salesRank":{"Books":3}}"#).unwrap();
        assert_eq!(item.title, "na");
        assert_eq!(item.image_url, "na");
        assert_eq!(item.description, "na");
        assert_eq!(item.categories, BTreeSet::from(["na".to_string()]));
    }

    #[test]
    fn test_empty_category_paths_become_na() {
        let item = ItemRow::from_json_line(r#"{"asin":"B003","categories":[[]]}"#).unwrap();
        assert_eq!(item.categories, BTreeSet::from(["na".to_string()]));
    }

    #[test]
    fn test_wrongly_typed_fields_are_kept() {
        let item = ItemRow::from_json_line(
            r#"{"asin":"B004","title":1984,"description":null,"categories":[["Books",2]]}"#,
        )
        .unwrap();
        assert_eq!(item.title, "1984");
        assert_eq!(item.description, "na");
        assert_eq!(
            item.categories.iter().map(String::as_str).collect::<Vec<_>>(),
            ["2", "Books"]
        );
    }

    #[test]
    fn test_missing_asin_is_rejected() {
        let err = ItemRow::from_json_line(r#"{"title":"orphan"}"#).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                record: "item",
                field: "asin"
            }
        ));
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let err = ItemRow::from_json_line("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
