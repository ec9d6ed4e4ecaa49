//! CSV Formatter
//!
//! `csv`クレートによるCSV出力の実装を提供するモジュール。

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::api::{LineTerminator, QuoteMode};
use crate::builder::ConversionConfig;
use crate::error::Result;
use crate::grid::LogicalGrid;

/// UTF-8のBOM
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV形式のフォーマッター
///
/// 既定ではExcel互換の方言（`,`区切り、CRLF、必要な場合のみクォート）で出力します。
#[derive(Debug, Clone, Copy)]
pub(crate) struct CsvFormatter {
    delimiter: u8,
    line_terminator: LineTerminator,
    quote_mode: QuoteMode,
    bom: bool,
}

impl CsvFormatter {
    /// 変換設定からフォーマッターを生成
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            line_terminator: config.line_terminator,
            quote_mode: config.quote_mode,
            bom: config.bom,
        }
    }

    fn terminator(&self) -> &'static [u8] {
        match self.line_terminator {
            LineTerminator::CrLf => b"\r\n",
            LineTerminator::Lf => b"\n",
        }
    }

    /// グリッドをCSVとして出力
    ///
    /// 行ごとのフィールド数は揃えません（行末の空フィールドは出力しない）。
    /// フィールドを持たない行は行末文字のみを出力します。
    ///
    /// # 引数
    ///
    /// * `grid` - 出力するグリッド
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(Excel2CsvError)` - 書き込みに失敗した場合
    pub fn render<W: Write>(&self, grid: &LogicalGrid, mut writer: W) -> Result<()> {
        if self.bom {
            writer.write_all(UTF8_BOM)?;
        }

        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .flexible(true)
            .terminator(match self.line_terminator {
                LineTerminator::CrLf => Terminator::CRLF,
                LineTerminator::Lf => Terminator::Any(b'\n'),
            })
            .quote_style(match self.quote_mode {
                QuoteMode::Necessary => QuoteStyle::Necessary,
                QuoteMode::Always => QuoteStyle::Always,
            });

        let mut rows = grid.iter_rows().peekable();
        while let Some(row) = rows.next() {
            // 空のレコードは`""`として書かれるため、行末文字を直接書き込む
            if row.is_empty() {
                writer.write_all(self.terminator())?;
                continue;
            }

            // 連続する空でない行はひとつのCSVライターで書き込む
            let mut csv_writer = builder.from_writer(&mut writer);
            csv_writer.write_record(row)?;
            while let Some(next) = rows.next_if(|next| !next.is_empty()) {
                csv_writer.write_record(next)?;
            }
            csv_writer.flush()?;
        }

        writer.flush()?;
        Ok(())
    }
}
