//! Placeholder scanner.
//!
//! Walks a parsed template structure and emits every `{{type:name}}` token
//! that occupies a whole cell. Output order is sheet order, then row-major
//! within a sheet, so repeated scans of an unmodified template produce the
//! same list. Ids are derived from the token's location, never random.

use crate::engine::EngineError;
use common::model::placeholder::{Placeholder, PlaceholderType};
use common::model::structure::{Sheet, TemplateStructure};
use rayon::prelude::*;
use regex::Regex;
use umya_spreadsheet::helper::coordinate::index_from_coordinate;

/// A cell value must match this in full; tokens mixed with other text are
/// plain text. Unknown types are not emitted.
const TOKEN_PATTERN: &str = r"^\{\{(table|value|chart):([^:}]+)\}\}$";

pub fn scan_placeholders(
    structure: &TemplateStructure,
) -> Result<Vec<Placeholder>, EngineError> {
    if structure.sheets.is_empty() {
        return Err(EngineError::EmptyStructure);
    }
    let pattern = Regex::new(TOKEN_PATTERN)?;

    let per_sheet: Vec<Vec<Placeholder>> = structure
        .sheets
        .par_iter()
        .map(|sheet| scan_sheet(sheet, &pattern))
        .collect();

    Ok(per_sheet.into_iter().flatten().collect())
}

fn scan_sheet(sheet: &Sheet, pattern: &Regex) -> Vec<Placeholder> {
    // Cell keys sort lexicographically ("A10" before "A2"), so order by the
    // parsed coordinates instead.
    let mut positioned: Vec<(u32, u32, &String, &str)> = Vec::new();
    for (reference, cell) in &sheet.cells {
        let Some(text) = cell.value.as_ref().and_then(|v| v.as_text()) else {
            continue;
        };
        let (Some(column), Some(row), ..) = index_from_coordinate(reference.as_str()) else {
            continue;
        };
        positioned.push((row, column, reference, text));
    }
    positioned.sort_by_key(|&(row, column, ..)| (row, column));

    positioned
        .into_iter()
        .filter_map(|(_, _, reference, text)| {
            let captures = pattern.captures(text)?;
            let placeholder_type = match &captures[1] {
                "table" => PlaceholderType::Table,
                "chart" => PlaceholderType::Chart,
                _ => PlaceholderType::Value,
            };
            Some(Placeholder {
                id: placeholder_id(&sheet.name, reference),
                placeholder: text.to_string(),
                placeholder_type,
                name: captures[2].to_string(),
                sheet_name: sheet.name.clone(),
                cell_reference: reference.clone(),
            })
        })
        .collect()
}

/// Deterministic id for a placeholder location, stable across rescans.
pub fn placeholder_id(sheet_name: &str, cell_reference: &str) -> String {
    format!(
        "{:x}",
        md5::compute(format!("{}!{}", sheet_name, cell_reference))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::structure::{Cell, CellValue};

    fn text_cell(text: &str) -> Cell {
        Cell {
            value: Some(CellValue::Text(text.to_string())),
            formula: None,
            style: None,
        }
    }

    fn sheet_with(name: &str, cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet {
            name: name.to_string(),
            ..Default::default()
        };
        for (reference, text) in cells {
            sheet
                .cells
                .insert(reference.to_string(), text_cell(text));
        }
        sheet
    }

    #[test]
    fn whole_cell_token_is_detected() {
        let structure = TemplateStructure {
            sheets: vec![sheet_with("Sheet1", &[("A1", "{{table:sales}}")])],
        };
        let placeholders = scan_placeholders(&structure).unwrap();
        assert_eq!(placeholders.len(), 1);
        let found = &placeholders[0];
        assert_eq!(found.placeholder_type, PlaceholderType::Table);
        assert_eq!(found.name, "sales");
        assert_eq!(found.placeholder, "{{table:sales}}");
        assert_eq!(found.sheet_name, "Sheet1");
        assert_eq!(found.cell_reference, "A1");
    }

    #[test]
    fn mixed_content_is_plain_text() {
        let structure = TemplateStructure {
            sheets: vec![sheet_with("Sheet1", &[("A1", "Total: {{value:x}}")])],
        };
        assert!(scan_placeholders(&structure).unwrap().is_empty());
    }

    #[test]
    fn malformed_and_unknown_tokens_are_ignored() {
        let structure = TemplateStructure {
            sheets: vec![sheet_with(
                "Sheet1",
                &[
                    ("A1", "{{table:sales}"),
                    ("A2", "{{tablesales}}"),
                    ("A3", "{{image:logo}}"),
                    ("A4", "{{value:}}"),
                ],
            )],
        };
        assert!(scan_placeholders(&structure).unwrap().is_empty());
    }

    #[test]
    fn scanning_twice_yields_identical_lists() {
        let structure = TemplateStructure {
            sheets: vec![
                sheet_with("First", &[("B2", "{{value:total}}"), ("A5", "{{chart:trend}}")]),
                sheet_with("Second", &[("C1", "{{table:rows}}")]),
            ],
        };
        let first = scan_placeholders(&structure).unwrap();
        let second = scan_placeholders(&structure).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn order_is_sheet_then_row_major() {
        let structure = TemplateStructure {
            sheets: vec![
                sheet_with(
                    "First",
                    &[
                        ("B10", "{{value:late}}"),
                        ("C2", "{{value:right}}"),
                        ("A2", "{{value:left}}"),
                    ],
                ),
                sheet_with("Second", &[("A1", "{{value:next_sheet}}")]),
            ],
        };
        let names: Vec<String> = scan_placeholders(&structure)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["left", "right", "late", "next_sheet"]);
    }

    #[test]
    fn ids_are_deterministic_per_location() {
        assert_eq!(
            placeholder_id("Sheet1", "A1"),
            placeholder_id("Sheet1", "A1")
        );
        assert_ne!(
            placeholder_id("Sheet1", "A1"),
            placeholder_id("Sheet1", "A2")
        );
    }

    #[test]
    fn empty_structure_is_an_error() {
        let structure = TemplateStructure { sheets: vec![] };
        assert!(matches!(
            scan_placeholders(&structure),
            Err(EngineError::EmptyStructure)
        ));
    }
}
