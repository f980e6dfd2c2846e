//! Rasterizes a query result into a PNG for chart placeholders.
//!
//! The first column supplies category labels; the first numeric column
//! after it supplies the series. The image is written to the given path so
//! the generation engine can embed it anchored at the placeholder cell.

use common::model::query::QueryResult;
use plotters::prelude::*;
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_WIDTH: u32 = 480;
pub const DEFAULT_HEIGHT: u32 = 288;

pub fn render_chart(
    result: &QueryResult,
    kind: &str,
    title: &str,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), String> {
    let (categories, values) = chart_series(result)?;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let upper = values.iter().cloned().fold(f64::MIN, f64::max).max(0.0);
    let lower = values.iter().cloned().fold(f64::MAX, f64::min).min(0.0);
    // Flat series still need a non-empty y range.
    let upper = if upper == lower { upper + 1.0 } else { upper };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(24)
        .y_label_area_size(48)
        .build_cartesian_2d(0f64..values.len() as f64, lower..upper)
        .map_err(|e| e.to_string())?;

    let labels = categories.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len().min(12))
        .x_label_formatter(&move |x| {
            labels
                .get(*x as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| e.to_string())?;

    match kind {
        "line" => {
            chart
                .draw_series(LineSeries::new(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (i as f64 + 0.5, *v)),
                    &BLUE,
                ))
                .map_err(|e| e.to_string())?;
        }
        _ => {
            chart
                .draw_series(values.iter().enumerate().map(|(i, v)| {
                    Rectangle::new(
                        [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *v)],
                        BLUE.filled(),
                    )
                }))
                .map_err(|e| e.to_string())?;
        }
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

/// Category labels plus the first numeric series found in the rows.
fn chart_series(result: &QueryResult) -> Result<(Vec<String>, Vec<f64>), String> {
    if result.rows.is_empty() {
        return Err("chart query returned no rows".to_string());
    }

    let column_count = result.columns.len().max(
        result
            .rows
            .iter()
            .map(|row| row.len())
            .max()
            .unwrap_or(0),
    );

    let has_numeric = |index: usize| {
        result
            .rows
            .iter()
            .any(|row| row.get(index).and_then(numeric).is_some())
    };
    let value_column = (1..column_count)
        .find(|&index| has_numeric(index))
        .or_else(|| (0..column_count).find(|&index| has_numeric(index)))
        .ok_or_else(|| "chart query returned no numeric column".to_string())?;

    let label_column = if value_column == 0 { 1 } else { 0 };

    let mut categories = Vec::with_capacity(result.rows.len());
    let mut values = Vec::with_capacity(result.rows.len());
    for (index, row) in result.rows.iter().enumerate() {
        let value = row.get(value_column).and_then(numeric);
        values.push(value.unwrap_or(0.0));
        let label = row
            .get(label_column)
            .map(label_text)
            .unwrap_or_else(|| (index + 1).to_string());
        categories.push(label);
    }
    Ok((categories, values))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::query::ResultColumn;
    use serde_json::json;
    use tempfile::TempDir;

    fn result(rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: vec![
                ResultColumn {
                    name: "region".to_string(),
                    display_name: "Region".to_string(),
                    base_type: Some("type/Text".to_string()),
                },
                ResultColumn {
                    name: "total".to_string(),
                    display_name: "Total".to_string(),
                    base_type: Some("type/Float".to_string()),
                },
            ],
            rows,
        }
    }

    #[test]
    fn renders_bar_chart_png() {
        let data = result(vec![
            vec![json!("north"), json!(10.0)],
            vec![json!("south"), json!(4.5)],
        ]);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chart.png");
        render_chart(&data, "bar", "sales", 320, 200, &path).unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        assert!(written > 0);
    }

    #[test]
    fn renders_line_chart_png() {
        let data = result(vec![
            vec![json!("jan"), json!(1)],
            vec![json!("feb"), json!(3)],
            vec![json!("mar"), json!(2)],
        ]);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chart.png");
        render_chart(&data, "line", "trend", 320, 200, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_rows_are_an_error() {
        let data = result(vec![]);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chart.png");
        assert!(render_chart(&data, "bar", "empty", 320, 200, &path).is_err());
    }

    #[test]
    fn series_extraction_finds_numeric_column() {
        let data = result(vec![
            vec![json!("a"), json!(7)],
            vec![json!("b"), json!("8.5")],
        ]);
        let (categories, values) = chart_series(&data).unwrap();
        assert_eq!(categories, vec!["a", "b"]);
        assert_eq!(values, vec![7.0, 8.5]);
    }
}
