//! Output Module
//!
//! グリッドをCSVとして書き出す出力層を提供するモジュール。
//! 区切り文字、行末、クォート方針、BOMの有無は`ConversionConfig`から決まります。

mod csv_formatter;

pub(crate) use csv_formatter::CsvFormatter;
