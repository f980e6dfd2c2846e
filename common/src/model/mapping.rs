use crate::model::placeholder::Placeholder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    /// A saved visualization record; its query is resolved and executed.
    Visualization,
    /// A saved analytics-engine question, executed by id.
    SavedQuery,
    /// A native SQL query carried inline in the mapping.
    InlineQuery,
}

/// Selection of one result column for a table placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column name in the query result.
    pub source_column: String,
    /// Header text written instead of the source column name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_label: Option<String>,
    /// Number format code applied to the column's cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Binding of one placeholder to a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceMapping {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    /// Visualization or saved-query id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    /// Inline SQL, for `inline_query` mappings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Target database for inline SQL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    /// Column selection and ordering for table placeholders; the query
    /// result's natural order is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnMapping>>,
    #[serde(default = "default_include_header")]
    pub include_header: bool,
    /// Chart rendering configuration for chart placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_height: Option<u32>,
}

fn default_include_header() -> bool {
    true
}

impl DataSourceMapping {
    pub fn visualization(source_id: i64) -> Self {
        DataSourceMapping {
            source_type: DataSourceType::Visualization,
            source_id: Some(source_id),
            query: None,
            database_id: None,
            columns: None,
            include_header: true,
            chart_type: None,
            chart_width: None,
            chart_height: None,
        }
    }
}

/// The full mapping set of a report, keyed by placeholder id.
///
/// Absence of a key means "unmapped". The set only changes through explicit
/// user action; rescanning a template never prunes or populates it, so an
/// entry whose placeholder no longer exists is simply inert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mappings(BTreeMap<String, DataSourceMapping>);

impl Mappings {
    pub fn new() -> Self {
        Mappings::default()
    }

    /// Inserts or replaces the mapping for a placeholder id.
    pub fn set(&mut self, placeholder_id: impl Into<String>, mapping: DataSourceMapping) {
        self.0.insert(placeholder_id.into(), mapping);
    }

    /// Removes the mapping for a placeholder id; clearing an absent entry
    /// is a no-op.
    pub fn clear(&mut self, placeholder_id: &str) {
        self.0.remove(placeholder_id);
    }

    pub fn get(&self, placeholder_id: &str) -> Option<&DataSourceMapping> {
        self.0.get(placeholder_id)
    }

    /// True iff every placeholder in the given scan has a mapping. Advisory
    /// only; generation is never gated on it.
    pub fn is_complete(&self, placeholders: &[Placeholder]) -> bool {
        placeholders.iter().all(|p| self.0.contains_key(&p.id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataSourceMapping)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::placeholder::PlaceholderType;

    fn placeholder(id: &str) -> Placeholder {
        Placeholder {
            id: id.to_string(),
            placeholder: "{{value:x}}".to_string(),
            placeholder_type: PlaceholderType::Value,
            name: "x".to_string(),
            sheet_name: "Sheet1".to_string(),
            cell_reference: "A1".to_string(),
        }
    }

    #[test]
    fn get_returns_absent_without_prior_set() {
        let mappings = Mappings::new();
        assert!(mappings.get("missing").is_none());
    }

    #[test]
    fn set_replaces_and_clear_is_idempotent() {
        let mut mappings = Mappings::new();
        mappings.set("a", DataSourceMapping::visualization(1));
        mappings.set("a", DataSourceMapping::visualization(2));
        assert_eq!(mappings.get("a").and_then(|m| m.source_id), Some(2));

        mappings.clear("a");
        assert!(mappings.get("a").is_none());
        // clearing again must not panic or error
        mappings.clear("a");
        assert!(mappings.is_empty());
    }

    #[test]
    fn is_complete_requires_every_placeholder() {
        let placeholders = vec![placeholder("a"), placeholder("b")];
        let mut mappings = Mappings::new();
        assert!(!mappings.is_complete(&placeholders));

        mappings.set("a", DataSourceMapping::visualization(1));
        assert!(!mappings.is_complete(&placeholders));

        mappings.set("b", DataSourceMapping::visualization(2));
        assert!(mappings.is_complete(&placeholders));
    }

    #[test]
    fn orphaned_mappings_do_not_affect_completeness() {
        let placeholders = vec![placeholder("a")];
        let mut mappings = Mappings::new();
        mappings.set("a", DataSourceMapping::visualization(1));
        mappings.set("gone", DataSourceMapping::visualization(9));
        assert!(mappings.is_complete(&placeholders));
    }

    #[test]
    fn include_header_defaults_to_true() {
        let mapping: DataSourceMapping =
            serde_json::from_str(r#"{"type":"visualization","source_id":3}"#).unwrap();
        assert!(mapping.include_header);
        assert_eq!(mapping.source_id, Some(3));
    }
}
