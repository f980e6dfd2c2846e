use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderType {
    /// Full table data written from the anchor cell downward.
    Table,
    /// A single scalar replacing the cell content.
    Value,
    /// A chart image anchored at the cell.
    Chart,
}

/// A `{{type:name}}` token detected in a template cell.
///
/// Placeholders are derived fresh on every scan of a template and are never
/// persisted on their own. The id is deterministic for a given location so
/// repeated scans of an unmodified template agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub id: String,
    /// The raw token, e.g. `"{{table:sales_by_region}}"`.
    pub placeholder: String,
    #[serde(rename = "type")]
    pub placeholder_type: PlaceholderType,
    pub name: String,
    pub sheet_name: String,
    pub cell_reference: String,
}
