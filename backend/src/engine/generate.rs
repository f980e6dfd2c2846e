//! Generation engine.
//!
//! Produces a populated workbook from the stored template file, the current
//! placeholder scan, the mapping set, and prefetched query data. The
//! template is reloaded from disk so every untouched cell keeps its
//! original styling. All query executions resolve before the single,
//! sequential write pass over the output document.
//!
//! Failure policy: one placeholder failing never aborts the batch. The
//! affected cell receives a visible `#ERROR` marker and the failure is
//! reported alongside the generated bytes. Unmapped placeholders keep
//! their literal token so gaps stay visible in the output file.

use crate::engine::chart;
use crate::engine::fetch::DataFetcher;
use crate::engine::EngineError;
use common::model::mapping::{DataSourceMapping, Mappings};
use common::model::placeholder::{Placeholder, PlaceholderType};
use common::model::query::QueryResult;
use common::requests::GenerationFailure;
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use umya_spreadsheet::helper::coordinate::{coordinate_from_index, index_from_coordinate};
use umya_spreadsheet::{Cell as XlsxCell, Spreadsheet};

const ERROR_MARKER: &str = "#ERROR";

/// Query data per placeholder id; an `Err` becomes a per-placeholder
/// failure during the write pass.
pub type ResolvedData = HashMap<String, Result<QueryResult, String>>;

/// Executes every mapped placeholder's query concurrently. Placeholders
/// without a mapping are skipped entirely.
pub async fn resolve_mapping_data<F: DataFetcher>(
    placeholders: &[Placeholder],
    mappings: &Mappings,
    fetcher: &F,
) -> ResolvedData {
    let futures = placeholders.iter().filter_map(|placeholder| {
        let mapping = mappings.get(&placeholder.id)?;
        Some(async move {
            let outcome = fetcher.fetch(mapping).await.map_err(|e| e.to_string());
            (placeholder.id.clone(), outcome)
        })
    });
    join_all(futures).await.into_iter().collect()
}

/// Loads the template, fills every placeholder, and serializes the result.
/// Returns the workbook bytes together with the per-placeholder failures.
pub fn generate_workbook(
    template_path: &Path,
    placeholders: &[Placeholder],
    mappings: &Mappings,
    data: &ResolvedData,
) -> Result<(Vec<u8>, Vec<GenerationFailure>), EngineError> {
    if !template_path.exists() {
        return Err(EngineError::TemplateMissing);
    }
    let mut book = umya_spreadsheet::reader::xlsx::read(template_path)
        .map_err(|e| EngineError::Workbook(e.to_string()))?;

    let failures = fill_workbook(&mut book, placeholders, mappings, data);

    let out = tempfile::Builder::new()
        .prefix("report")
        .suffix(".xlsx")
        .tempfile()?;
    umya_spreadsheet::writer::xlsx::write(&book, out.path())
        .map_err(|e| EngineError::Workbook(e.to_string()))?;
    let bytes = std::fs::read(out.path())?;

    Ok((bytes, failures))
}

/// The sequential write pass. Public for direct use against an already
/// loaded workbook.
pub fn fill_workbook(
    book: &mut Spreadsheet,
    placeholders: &[Placeholder],
    mappings: &Mappings,
    data: &ResolvedData,
) -> Vec<GenerationFailure> {
    let mut failures = Vec::new();

    for placeholder in placeholders {
        // No mapping: leave the literal token in place.
        let Some(mapping) = mappings.get(&placeholder.id) else {
            continue;
        };

        let result = match data.get(&placeholder.id) {
            Some(Ok(result)) => result,
            Some(Err(message)) => {
                mark_error(book, placeholder);
                failures.push(GenerationFailure {
                    placeholder_id: placeholder.id.clone(),
                    error: message.clone(),
                });
                continue;
            }
            None => continue,
        };

        let outcome = match placeholder.placeholder_type {
            PlaceholderType::Value => write_value(book, placeholder, result),
            PlaceholderType::Table => write_table(book, placeholder, mapping, result),
            PlaceholderType::Chart => write_chart(book, placeholder, mapping, result),
        };

        if let Err(message) = outcome {
            mark_error(book, placeholder);
            failures.push(GenerationFailure {
                placeholder_id: placeholder.id.clone(),
                error: message,
            });
        }
    }

    failures
}

/// Report name to a deterministic download filename: non-alphanumeric
/// characters become underscores, then the `.xlsx` suffix.
pub fn download_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.xlsx", sanitized)
}

fn write_value(
    book: &mut Spreadsheet,
    placeholder: &Placeholder,
    result: &QueryResult,
) -> Result<(), String> {
    let sheet = sheet_mut(book, placeholder)?;
    let cell = sheet.get_cell_mut(placeholder.cell_reference.as_str());
    match result.first_scalar() {
        Some(scalar) => write_scalar(cell, scalar),
        // An empty result is an empty cell, not an error.
        None => {
            cell.set_value(String::new());
        }
    }
    Ok(())
}

struct ColumnPlan {
    source_index: Option<usize>,
    header: String,
    format: Option<String>,
}

fn write_table(
    book: &mut Spreadsheet,
    placeholder: &Placeholder,
    mapping: &DataSourceMapping,
    result: &QueryResult,
) -> Result<(), String> {
    let (Some(anchor_column), Some(anchor_row), ..) =
        index_from_coordinate(placeholder.cell_reference.as_str())
    else {
        return Err(format!(
            "invalid cell reference '{}'",
            placeholder.cell_reference
        ));
    };

    let plan: Vec<ColumnPlan> = match &mapping.columns {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .map(|column| ColumnPlan {
                source_index: result.columns.iter().position(|rc| {
                    rc.name == column.source_column || rc.display_name == column.source_column
                }),
                header: column
                    .header_label
                    .clone()
                    .unwrap_or_else(|| column.source_column.clone()),
                format: column.format.clone(),
            })
            .collect(),
        _ => result
            .columns
            .iter()
            .enumerate()
            .map(|(index, rc)| ColumnPlan {
                source_index: Some(index),
                header: rc.display_name.clone(),
                format: None,
            })
            .collect(),
    };

    let sheet = sheet_mut(book, placeholder)?;
    // New cells inherit the anchor cell's styling.
    let anchor_style = sheet
        .get_cell(placeholder.cell_reference.as_str())
        .map(|cell| cell.get_style().clone());

    // Clear the token; an empty result leaves an empty anchor cell.
    sheet
        .get_cell_mut(placeholder.cell_reference.as_str())
        .set_value(String::new());

    let mut current_row = anchor_row;

    if mapping.include_header {
        for (offset, column) in plan.iter().enumerate() {
            let reference =
                coordinate_from_index(&(anchor_column + offset as u32), &current_row);
            let cell = sheet.get_cell_mut(reference.as_str());
            if let Some(style) = &anchor_style {
                cell.set_style(style.clone());
            }
            cell.set_value(column.header.clone());
            sheet
                .get_style_mut(reference.as_str())
                .get_font_mut()
                .set_bold(true);
        }
        current_row += 1;
    }

    // Row count is unbounded; existing cells in the way are overwritten
    // (last write wins).
    for row in &result.rows {
        for (offset, column) in plan.iter().enumerate() {
            let reference =
                coordinate_from_index(&(anchor_column + offset as u32), &current_row);
            let cell = sheet.get_cell_mut(reference.as_str());
            if let Some(style) = &anchor_style {
                cell.set_style(style.clone());
            }
            match column.source_index.and_then(|index| row.get(index)) {
                Some(value) => write_scalar(cell, value),
                None => {
                    cell.set_value(String::new());
                }
            }
            if let Some(format) = &column.format {
                sheet
                    .get_style_mut(reference.as_str())
                    .get_number_format_mut()
                    .set_format_code(format.clone());
            }
        }
        current_row += 1;
    }

    Ok(())
}

fn write_chart(
    book: &mut Spreadsheet,
    placeholder: &Placeholder,
    mapping: &DataSourceMapping,
    result: &QueryResult,
) -> Result<(), String> {
    let width = mapping.chart_width.unwrap_or(chart::DEFAULT_WIDTH);
    let height = mapping.chart_height.unwrap_or(chart::DEFAULT_HEIGHT);
    let kind = mapping.chart_type.as_deref().unwrap_or("bar");

    let file = tempfile::Builder::new()
        .prefix("chart")
        .suffix(".png")
        .tempfile()
        .map_err(|e| e.to_string())?;
    chart::render_chart(result, kind, &placeholder.name, width, height, file.path())?;
    let image_path = file
        .path()
        .to_str()
        .ok_or_else(|| "chart image path is not valid UTF-8".to_string())?;

    let sheet = sheet_mut(book, placeholder)?;
    sheet
        .get_cell_mut(placeholder.cell_reference.as_str())
        .set_value(String::new());

    let mut marker = umya_spreadsheet::structs::drawing::spreadsheet::MarkerType::default();
    marker.set_coordinate(placeholder.cell_reference.as_str());
    let mut image = umya_spreadsheet::structs::Image::default();
    image.new_image(image_path, marker);
    sheet.add_image(image);

    Ok(())
}

fn sheet_mut<'a>(
    book: &'a mut Spreadsheet,
    placeholder: &Placeholder,
) -> Result<&'a mut umya_spreadsheet::Worksheet, String> {
    book.get_sheet_by_name_mut(&placeholder.sheet_name)
        .ok_or_else(|| format!("sheet '{}' not found", placeholder.sheet_name))
}

fn write_scalar(cell: &mut XlsxCell, value: &Value) {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(n) => {
                cell.set_value_number(n);
            }
            None => {
                cell.set_value(number.to_string());
            }
        },
        Value::String(text) => {
            cell.set_value(text.clone());
        }
        Value::Bool(flag) => {
            cell.set_value_bool(*flag);
        }
        Value::Null => {
            cell.set_value(String::new());
        }
        other => {
            cell.set_value(other.to_string());
        }
    }
}

fn mark_error(book: &mut Spreadsheet, placeholder: &Placeholder) {
    if let Some(sheet) = book.get_sheet_by_name_mut(&placeholder.sheet_name) {
        sheet
            .get_cell_mut(placeholder.cell_reference.as_str())
            .set_value(ERROR_MARKER.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fetch::{DataFetcher, FetchError};
    use crate::engine::scan::scan_placeholders;
    use crate::engine::structure::structure_from_workbook;
    use common::model::query::ResultColumn;
    use serde_json::json;
    use tempfile::TempDir;

    struct StubFetcher {
        result: Option<QueryResult>,
    }

    impl DataFetcher for StubFetcher {
        async fn fetch(&self, _mapping: &DataSourceMapping) -> Result<QueryResult, FetchError> {
            self.result
                .clone()
                .ok_or(FetchError::MissingVisualization(99))
        }
    }

    fn columns(names: &[&str]) -> Vec<ResultColumn> {
        names
            .iter()
            .map(|name| ResultColumn {
                name: name.to_string(),
                display_name: name.to_string(),
                base_type: None,
            })
            .collect()
    }

    fn template_with(cells: &[(&str, &str)]) -> (TempDir, std::path::PathBuf, Spreadsheet) {
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
            for (reference, text) in cells {
                sheet.get_cell_mut(*reference).set_value(text.to_string());
            }
        }
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("template.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        (temp, path, book)
    }

    fn read_output(bytes: &[u8]) -> Spreadsheet {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.xlsx");
        std::fs::write(&path, bytes).unwrap();
        umya_spreadsheet::reader::xlsx::read(&path).unwrap()
    }

    fn scan(book: &Spreadsheet) -> Vec<Placeholder> {
        scan_placeholders(&structure_from_workbook(book)).unwrap()
    }

    #[test]
    fn download_filename_replaces_non_alphanumerics() {
        assert_eq!(download_filename("Q1 Report!"), "Q1_Report_.xlsx");
        assert_eq!(download_filename("plain"), "plain.xlsx");
    }

    #[test]
    fn unmapped_placeholder_keeps_literal_token_and_style() {
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
            sheet.get_cell_mut("A1").set_value("{{value:name}}");
            sheet.get_style_mut("A1").get_font_mut().set_italic(true);
        }
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("template.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let placeholders = scan(&book);
        let mappings = Mappings::new();
        let data = ResolvedData::new();

        let (bytes, failures) =
            generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        assert!(failures.is_empty());

        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();
        let cell = sheet.get_cell("A1").unwrap();
        assert_eq!(cell.get_value().to_string(), "{{value:name}}");
        assert!(*cell.get_style().get_font().unwrap().get_italic());
    }

    #[test]
    fn value_placeholder_takes_first_scalar_and_keeps_style() {
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
            sheet.get_cell_mut("B2").set_value("{{value:total}}");
            let style = sheet.get_style_mut("B2");
            style.get_font_mut().set_bold(true);
            style.get_font_mut().set_size(14.0);
        }
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("template.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let placeholders = scan(&book);
        let mut mappings = Mappings::new();
        mappings.set(
            placeholders[0].id.clone(),
            DataSourceMapping::visualization(1),
        );
        let mut data = ResolvedData::new();
        data.insert(
            placeholders[0].id.clone(),
            Ok(QueryResult {
                columns: columns(&["total"]),
                rows: vec![vec![json!(1234.5)], vec![json!(99)]],
            }),
        );

        let (bytes, failures) =
            generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        assert!(failures.is_empty());

        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();
        let cell = sheet.get_cell("B2").unwrap();
        assert_eq!(cell.get_value().to_string(), "1234.5");
        let font = cell.get_style().get_font().unwrap();
        assert!(*font.get_bold());
        assert_eq!(*font.get_size(), 14.0);
    }

    #[test]
    fn empty_result_writes_empty_string() {
        let (_temp, path, book) = template_with(&[("A1", "{{value:nothing}}")]);
        let placeholders = scan(&book);
        let mut mappings = Mappings::new();
        mappings.set(
            placeholders[0].id.clone(),
            DataSourceMapping::visualization(1),
        );
        let mut data = ResolvedData::new();
        data.insert(
            placeholders[0].id.clone(),
            Ok(QueryResult {
                columns: columns(&["x"]),
                rows: vec![],
            }),
        );

        let (bytes, failures) =
            generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        assert!(failures.is_empty());

        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();
        let value = sheet
            .get_cell("A1")
            .map(|c| c.get_value().to_string())
            .unwrap_or_default();
        assert_eq!(value, "");
    }

    #[test]
    fn table_expands_with_header_from_anchor() {
        let (_temp, path, book) = template_with(&[("B5", "{{table:sales}}")]);
        let placeholders = scan(&book);
        let mut mappings = Mappings::new();
        mappings.set(
            placeholders[0].id.clone(),
            DataSourceMapping::visualization(1),
        );

        let rows: Vec<Vec<Value>> = (0..10)
            .map(|i| vec![json!(format!("row{}", i)), json!(i), json!(i as f64 * 1.5)])
            .collect();
        let mut data = ResolvedData::new();
        data.insert(
            placeholders[0].id.clone(),
            Ok(QueryResult {
                columns: columns(&["name", "count", "amount"]),
                rows,
            }),
        );

        let (bytes, failures) =
            generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        assert!(failures.is_empty());

        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();

        // Header at row 5, columns B through D.
        assert_eq!(sheet.get_cell("B5").unwrap().get_value(), "name");
        assert_eq!(sheet.get_cell("C5").unwrap().get_value(), "count");
        assert_eq!(sheet.get_cell("D5").unwrap().get_value(), "amount");
        // Data rows 6 through 15.
        assert_eq!(sheet.get_cell("B6").unwrap().get_value(), "row0");
        assert_eq!(sheet.get_cell("C6").unwrap().get_value(), "0");
        assert_eq!(sheet.get_cell("B15").unwrap().get_value(), "row9");
        assert_eq!(sheet.get_cell("D15").unwrap().get_value(), "13.5");
    }

    #[test]
    fn table_respects_column_selection_and_labels() {
        let (_temp, path, book) = template_with(&[("A1", "{{table:t}}")]);
        let placeholders = scan(&book);
        let mut mappings = Mappings::new();
        let mut mapping = DataSourceMapping::visualization(1);
        mapping.columns = Some(vec![
            common::model::mapping::ColumnMapping {
                source_column: "amount".to_string(),
                header_label: Some("Amount (USD)".to_string()),
                format: None,
            },
            common::model::mapping::ColumnMapping {
                source_column: "name".to_string(),
                header_label: None,
                format: None,
            },
        ]);
        mappings.set(placeholders[0].id.clone(), mapping);

        let mut data = ResolvedData::new();
        data.insert(
            placeholders[0].id.clone(),
            Ok(QueryResult {
                columns: columns(&["name", "amount"]),
                rows: vec![vec![json!("widget"), json!(10)]],
            }),
        );

        let (bytes, _) = generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(sheet.get_cell("A1").unwrap().get_value(), "Amount (USD)");
        assert_eq!(sheet.get_cell("B1").unwrap().get_value(), "name");
        assert_eq!(sheet.get_cell("A2").unwrap().get_value(), "10");
        assert_eq!(sheet.get_cell("B2").unwrap().get_value(), "widget");
    }

    #[test]
    fn failing_placeholder_is_isolated() {
        let (_temp, path, book) = template_with(&[
            ("A1", "{{value:good}}"),
            ("A2", "{{value:bad}}"),
        ]);
        let placeholders = scan(&book);
        let good = placeholders
            .iter()
            .find(|p| p.name == "good")
            .unwrap()
            .id
            .clone();
        let bad = placeholders
            .iter()
            .find(|p| p.name == "bad")
            .unwrap()
            .id
            .clone();

        let mut mappings = Mappings::new();
        mappings.set(good.clone(), DataSourceMapping::visualization(1));
        mappings.set(bad.clone(), DataSourceMapping::visualization(404));

        let mut data = ResolvedData::new();
        data.insert(
            good.clone(),
            Ok(QueryResult {
                columns: columns(&["v"]),
                rows: vec![vec![json!("fine")]],
            }),
        );
        data.insert(bad.clone(), Err("visualization 404 not found".to_string()));

        let (bytes, failures) =
            generate_workbook(&path, &placeholders, &mappings, &data).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].placeholder_id, bad);

        let output = read_output(&bytes);
        let sheet = output.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(sheet.get_cell("A1").unwrap().get_value(), "fine");
        assert_eq!(sheet.get_cell("A2").unwrap().get_value(), "#ERROR");
    }

    #[test]
    fn missing_template_file_aborts_generation() {
        let temp = TempDir::new().unwrap();
        let result = generate_workbook(
            &temp.path().join("gone.xlsx"),
            &[],
            &Mappings::new(),
            &ResolvedData::new(),
        );
        assert!(matches!(result, Err(EngineError::TemplateMissing)));
    }

    #[tokio::test]
    async fn resolve_mapping_data_skips_unmapped_and_collects_errors() {
        let (_temp, _path, book) = template_with(&[
            ("A1", "{{value:mapped}}"),
            ("A2", "{{value:unmapped}}"),
        ]);
        let placeholders = scan(&book);
        let mapped = placeholders
            .iter()
            .find(|p| p.name == "mapped")
            .unwrap()
            .id
            .clone();

        let mut mappings = Mappings::new();
        mappings.set(mapped.clone(), DataSourceMapping::visualization(7));

        let fetcher = StubFetcher { result: None };
        let data = resolve_mapping_data(&placeholders, &mappings, &fetcher).await;
        assert_eq!(data.len(), 1);
        assert!(data.get(&mapped).unwrap().is_err());
    }

    #[tokio::test]
    async fn resolve_mapping_data_returns_fetched_rows() {
        let (_temp, _path, book) = template_with(&[("A1", "{{value:x}}")]);
        let placeholders = scan(&book);
        let mut mappings = Mappings::new();
        mappings.set(
            placeholders[0].id.clone(),
            DataSourceMapping::visualization(7),
        );

        let fetcher = StubFetcher {
            result: Some(QueryResult {
                columns: columns(&["x"]),
                rows: vec![vec![json!(5)]],
            }),
        };
        let data = resolve_mapping_data(&placeholders, &mappings, &fetcher).await;
        let result = data.get(&placeholders[0].id).unwrap().as_ref().unwrap();
        assert_eq!(result.rows[0][0], json!(5));
    }
}
