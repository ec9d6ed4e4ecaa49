//! Formatter Module
//!
//! セル値をExcelの表示どおりの文字列に変換するモジュール。
//! 数値は書式文字列、日付は`DateFormat`設定に従って描画します。

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use tracing::warn;

use crate::api::{DateFormat, FormulaMode};
use crate::builder::ConversionConfig;
use crate::error::{Excel2CsvError, Result};
use crate::format::{format_general, serial_to_datetime, FormatParser};
use crate::parser::is_builtin_date_format;
use crate::types::{CellValue, RawCellData};

/// セルフォーマッター
///
/// セル値のフォーマット処理のファサードとして機能します。
/// 1シートの変換中に使い回し、解析済みの書式をキャッシュします。
#[derive(Debug)]
pub(crate) struct CellFormatter {
    formula_mode: FormulaMode,

    /// 日付フォーマッター
    date_formatter: DateFormatter,

    /// 解析済み書式のキャッシュ
    formats: FormatCache,
}

impl CellFormatter {
    /// 変換設定からCellFormatterを生成
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            formula_mode: config.formula_mode,
            date_formatter: DateFormatter {
                date_format: config.date_format.clone(),
            },
            formats: FormatCache::default(),
        }
    }

    /// セル値をフォーマット
    ///
    /// # 引数
    ///
    /// * `raw_cell` - パーサーから抽出された生のセルデータ
    /// * `is_1904` - 1904年エポックを使用するかどうか
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - フォーマット済み文字列
    /// * `Err(Excel2CsvError)` - カスタム日付形式の描画に失敗した場合
    pub fn format_cell(&mut self, raw_cell: &RawCellData, is_1904: bool) -> Result<String> {
        if self.formula_mode == FormulaMode::Formula {
            if let Some(ref formula) = raw_cell.formula {
                return Ok(formula.clone());
            }
        }

        match &raw_cell.value {
            CellValue::Number(n) => self.format_numeric(*n, raw_cell, is_1904, false),
            CellValue::DateTime(n) => self.format_numeric(*n, raw_cell, is_1904, true),
            CellValue::String(s) => Ok(s.clone()),
            CellValue::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Error(e) => Ok(format!("ERROR:{}", e)),
            CellValue::Empty => Ok(String::new()),
        }
    }

    /// 数値セルをフォーマット
    ///
    /// 日付書式かつ有効なExcel日付（0以上）なら日付として、
    /// それ以外はセルの数値書式（なければGeneral）で描画する。
    fn format_numeric(
        &mut self,
        value: f64,
        raw_cell: &RawCellData,
        is_1904: bool,
        flagged_as_date: bool,
    ) -> Result<String> {
        let parser = raw_cell
            .format_string
            .as_deref()
            .and_then(|format| self.formats.get(format));

        let is_date = raw_cell.format_id.is_some_and(is_builtin_date_format)
            || parser.is_some_and(FormatParser::is_date_format)
            || (flagged_as_date && parser.is_none());

        if is_date && value >= 0.0 {
            if let Some(formatted) = self.date_formatter.format(value, parser, is_1904)? {
                return Ok(formatted);
            }
        }

        Ok(match parser {
            Some(parser) => parser.format_number(value, is_1904),
            None => format_general(value),
        })
    }
}

/// 書式文字列ごとに解析結果を保持する
#[derive(Debug, Default)]
struct FormatCache {
    parsers: HashMap<String, Option<FormatParser>>,
}

impl FormatCache {
    /// 解析済みの書式を取得（未解析なら解析してキャッシュ）
    ///
    /// 解析できない書式は警告を出して`None`（General扱い）とする。
    fn get(&mut self, format: &str) -> Option<&FormatParser> {
        if !self.parsers.contains_key(format) {
            let parsed = match FormatParser::parse(format) {
                Ok(parser) => Some(parser),
                Err(e) => {
                    warn!(format, error = %e, "unsupported number format, using General");
                    None
                }
            };
            self.parsers.insert(format.to_string(), parsed);
        }
        self.parsers.get(format).and_then(Option::as_ref)
    }
}

/// 日付フォーマッター
///
/// Excelのシリアル日付値を`DateFormat`に従って文字列に変換します。
#[derive(Debug)]
pub(crate) struct DateFormatter {
    date_format: DateFormat,
}

impl DateFormatter {
    /// 日付値をフォーマット
    ///
    /// # 引数
    ///
    /// * `serial_value` - Excelのシリアル日付値（0以上）
    /// * `parser` - セルの書式（存在する場合）
    /// * `is_1904` - 1904年エポックを使用するかどうか
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(String))` - フォーマット済み日付文字列
    /// * `Ok(None)` - 日付として表現できない値（数値として描画する）
    /// * `Err(Excel2CsvError::Config)` - カスタム形式の描画に失敗した場合
    ///
    /// # エポックシステム
    ///
    /// - 1900年システム: シリアル値1 = 1900-01-01、60と61は1900-03-01
    /// - 1904年システム: シリアル値0 = 1904-01-01
    pub fn format(
        &self,
        serial_value: f64,
        parser: Option<&FormatParser>,
        is_1904: bool,
    ) -> Result<Option<String>> {
        // 経過時間は時計の時刻に変換すると意味が変わるため、常にセルの書式で描画
        let use_cell_format = matches!(self.date_format, DateFormat::CellFormat)
            || parser.is_some_and(FormatParser::has_elapsed);

        if use_cell_format {
            if let Some(parser) = parser {
                return Ok(Some(parser.format_number(serial_value, is_1904)));
            }
        }

        let Some(datetime) = serial_to_datetime(serial_value, is_1904, 0) else {
            return Ok(None);
        };

        let pattern = match &self.date_format {
            DateFormat::Custom(pattern) => pattern.as_str(),
            _ => iso_pattern(serial_value, parser),
        };
        render_chrono(&datetime, pattern).map(Some)
    }
}

/// 書式が持つ要素に応じたISO 8601パターン
fn iso_pattern(serial_value: f64, parser: Option<&FormatParser>) -> &'static str {
    let (has_date, has_time) = match parser {
        Some(parser) => (parser.has_date_part(), parser.has_time_part()),
        None => (serial_value >= 1.0, serial_value.fract() != 0.0),
    };
    match (has_date, has_time) {
        (true, true) => "%Y-%m-%dT%H:%M:%S",
        (false, true) => "%H:%M:%S",
        _ => "%Y-%m-%d",
    }
}

/// chrono互換パターンが有効かどうか
pub(crate) fn validate_chrono_pattern(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn render_chrono(datetime: &NaiveDateTime, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", datetime.format(pattern)).map_err(|_| {
        Excel2CsvError::Config(format!("Invalid date format: '{}'", pattern))
    })?;
    Ok(out)
}
