//! Reads an uploaded workbook into the structural model the rest of the
//! engine works against: cell values and formulas, per-cell styling,
//! merges, and column/row dimensions.

use crate::engine::EngineError;
use common::model::structure::{
    AlignmentStyle, BorderSide, BorderStyles, Cell, CellStyle, CellValue, FillStyle, FontStyle,
    Sheet, TemplateStructure,
};
use std::path::Path;
use umya_spreadsheet::helper::coordinate::coordinate_from_index;
use umya_spreadsheet::{Border, EnumTrait, NumberingFormat, Spreadsheet, Style, Worksheet};

/// Column widths are stored in character units; the UI expects approximate
/// pixels.
const COLUMN_WIDTH_PX_FACTOR: f64 = 7.0;

/// Parses the workbook at `path` into a `TemplateStructure`.
pub fn parse_template(path: &Path) -> Result<TemplateStructure, EngineError> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| EngineError::Workbook(e.to_string()))?;
    Ok(structure_from_workbook(&book))
}

pub fn structure_from_workbook(book: &Spreadsheet) -> TemplateStructure {
    TemplateStructure {
        sheets: book
            .get_sheet_collection_no_check()
            .iter()
            .map(sheet_model)
            .collect(),
    }
}

fn sheet_model(worksheet: &Worksheet) -> Sheet {
    let mut sheet = Sheet {
        name: worksheet.get_name().to_string(),
        ..Default::default()
    };

    for range in worksheet.get_merge_cells() {
        sheet.merges.push(range.get_range());
    }

    for column in worksheet.get_column_dimensions() {
        let width = *column.get_width();
        if width > 0.0 {
            sheet
                .column_widths
                .insert(column.get_col_num() - 1, width * COLUMN_WIDTH_PX_FACTOR);
        }
    }

    for row in worksheet.get_row_dimensions() {
        let height = *row.get_height();
        if height > 0.0 {
            sheet.row_heights.insert(row.get_row_num() - 1, height);
        }
    }

    for cell in worksheet.get_cell_collection() {
        let coordinate = cell.get_coordinate();
        let reference =
            coordinate_from_index(coordinate.get_col_num(), coordinate.get_row_num());

        let formula = if cell.is_formula() {
            Some(cell.get_formula().to_string())
        } else {
            None
        };
        let value = if formula.is_some() {
            None
        } else {
            cell_value(&cell.get_value())
        };
        let style = style_model(cell.get_style());

        if value.is_none() && formula.is_none() && style.is_none() {
            continue;
        }
        sheet.cells.insert(
            reference,
            Cell {
                value,
                formula,
                style,
            },
        );
    }

    sheet
}

fn cell_value(text: &str) -> Option<CellValue> {
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(CellValue::Number(number)),
        _ => Some(CellValue::Text(text.to_string())),
    }
}

fn style_model(style: &Style) -> Option<CellStyle> {
    let mut out = CellStyle::default();

    if let Some(font) = style.get_font() {
        let mut model = FontStyle::default();
        let name = font.get_name();
        if !name.is_empty() {
            model.name = Some(name.to_string());
        }
        let size = *font.get_size();
        if size > 0.0 {
            model.size = Some(size);
        }
        if *font.get_bold() {
            model.bold = Some(true);
        }
        if *font.get_italic() {
            model.italic = Some(true);
        }
        model.color = hex_color(font.get_color().get_argb());
        if model != FontStyle::default() {
            out.font = Some(model);
        }
    }

    if let Some(fill) = style.get_fill() {
        if let Some(pattern) = fill.get_pattern_fill() {
            let color = pattern
                .get_foreground_color()
                .and_then(|c| hex_color(c.get_argb()));
            if let Some(color) = color {
                out.fill = Some(FillStyle { color: Some(color) });
            }
        }
    }

    if let Some(borders) = style.get_borders() {
        let model = BorderStyles {
            top: border_side(borders.get_top()),
            bottom: border_side(borders.get_bottom()),
            left: border_side(borders.get_left()),
            right: border_side(borders.get_right()),
        };
        if model != BorderStyles::default() {
            out.border = Some(model);
        }
    }

    if let Some(alignment) = style.get_alignment() {
        let mut model = AlignmentStyle::default();
        let horizontal = alignment.get_horizontal().get_value_string();
        if horizontal != "general" {
            model.horizontal = Some(horizontal.to_string());
        }
        let vertical = alignment.get_vertical().get_value_string();
        if !vertical.is_empty() {
            model.vertical = Some(vertical.to_string());
        }
        if *alignment.get_wrap_text() {
            model.wrap_text = Some(true);
        }
        if model != AlignmentStyle::default() {
            out.alignment = Some(model);
        }
    }

    if let Some(number_format) = style.get_number_format() {
        let code = number_format.get_format_code();
        if !code.is_empty() && code != NumberingFormat::FORMAT_GENERAL {
            out.number_format = Some(code.to_string());
        }
    }

    if out == CellStyle::default() {
        None
    } else {
        Some(out)
    }
}

fn border_side(border: &Border) -> Option<BorderSide> {
    let style = border.get_border_style();
    if style.is_empty() || style == Border::BORDER_NONE {
        return None;
    }
    Some(BorderSide {
        style: Some(style.to_string()),
        color: hex_color(border.get_color().get_argb()),
    })
}

/// ARGB (`"FF336699"`) or RGB hex to a `#RRGGBB` string.
fn hex_color(argb: &str) -> Option<String> {
    match argb.len() {
        8 => Some(format!("#{}", &argb[2..])),
        6 => Some(format!("#{}", argb)),
        _ => None,
    }
}
