//! excel2csv - Convert Excel (XLSX) worksheets to CSV
//!
//! This crate reads one worksheet of an XLSX workbook and writes it as CSV,
//! rendering every cell the way Excel displays it: number formats, dates,
//! booleans and error values. Missing rows and columns are kept as empty lines
//! and fields so the CSV lines up with the sheet.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use excel2csv::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings (first sheet, Excel CSV dialect)
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let input = File::open("report.xlsx")?;
//!     let output = File::create("report.csv")?;
//!     let summary = converter.convert(input, output)?;
//!     println!("{}: {} rows", summary.sheet_name, summary.rows);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use excel2csv::{ConverterBuilder, DateFormat, LineTerminator, MergeStrategy, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Sales".to_string()))
//!         .with_merge_strategy(MergeStrategy::Duplicate)
//!         .with_date_format(DateFormat::Iso8601)
//!         .with_line_terminator(LineTerminator::Lf)
//!         .with_range_a1("A1:F200")
//!         .build()?;
//!
//!     let csv = converter.convert_to_string(File::open("report.xlsx")?)?;
//!     print!("{}", csv);
//!
//!     Ok(())
//! }
//! ```
//!
//! # All Sheets
//!
//! ```rust,no_run
//! use std::fs::File;
//! use excel2csv::{ConverterBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::All)
//!         .build()?;
//!
//!     // Sheets are converted in parallel and returned in workbook order
//!     for sheet in converter.convert_all(File::open("report.xlsx")?)? {
//!         std::fs::write(format!("{}.csv", sheet.summary.sheet_name), &sheet.csv)?;
//!     }
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod error;
mod format;
mod formatter;
mod grid;
mod output;
mod parser;
mod security;
mod types;

pub mod cli;

// 公開API
pub use api::{
    ConversionSummary, DateFormat, FormulaMode, LineTerminator, MergeStrategy, QuoteMode,
    SheetOutput, SheetSelector,
};
pub use builder::{Converter, ConverterBuilder};
pub use error::{Excel2CsvError, Result};
