//! The template report engine: workbook parsing, placeholder scanning,
//! data fetching, and spreadsheet generation.

pub mod chart;
pub mod fetch;
pub mod generate;
pub mod scan;
pub mod structure;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("template structure has no sheets")]
    EmptyStructure,
    #[error("template file not found")]
    TemplateMissing,
    #[error("workbook error: {0}")]
    Workbook(String),
    #[error("placeholder pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
