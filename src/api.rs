//! Public API Types
//!
//! 公開APIで使用する列挙型と変換結果の型を定義するモジュール。

use serde::Serialize;

/// セル結合の処理戦略
///
/// Excelの結合セルをCSVに変換する際の処理方法を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum MergeStrategy {
    /// 親セル（左上）にのみ値を出力し、残りのセルは空フィールドとする（デフォルト）
    ///
    /// Excelが結合セルを保存する形そのままの出力です。
    ///
    /// ```csv
    /// Header,,
    /// a,b,c
    /// ```
    #[default]
    Keep,

    /// 結合セル範囲内のすべてのセルに親セルの値を複製
    ///
    /// ```csv
    /// Header,Header,Header
    /// a,b,c
    /// ```
    Duplicate,
}

/// 日付の出力形式
///
/// 日付書式が設定された数値セルをCSVに変換する際の出力形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DateFormat {
    /// セル自身の書式文字列（例: `yyyy/m/d`）で表示どおりに出力（デフォルト）
    #[default]
    CellFormat,

    /// ISO 8601形式
    ///
    /// 書式に含まれる要素に応じて`2025-11-20`、`13:45:00`、
    /// `2025-11-20T13:45:00`のいずれかになります。
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # フォーマット指定子（主要なもの）
    ///
    /// - `%Y`: 4桁の年（例: 2025）
    /// - `%m`: 2桁の月（01-12）
    /// - `%d`: 2桁の日（01-31）
    /// - `%H`: 24時間形式の時（00-23）
    /// - `%M`: 分（00-59）
    /// - `%S`: 秒（00-59）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use excel2csv::{ConverterBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y年%m月%d日".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

/// 数式セルの出力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum FormulaMode {
    /// キャッシュされた結果値を出力（デフォルト）
    ///
    /// 例: `=SUM(A1:A10)` → `100`
    #[default]
    CachedValue,

    /// 数式文字列を出力
    ///
    /// 例: `=SUM(A1:A10)` → `=SUM(A1:A10)`
    Formula,
}

/// シート選択方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// ワークブック順で最初のシート（デフォルト）
    #[default]
    First,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    ///
    /// 存在しない場合は`Excel2CsvError::SheetNotFound`になります。
    Name(String),

    /// 複数のインデックス指定（`Converter::convert_all`用）
    Indices(Vec<usize>),

    /// 複数のシート名指定（`Converter::convert_all`用）
    Names(Vec<String>),

    /// すべてのシート（`Converter::convert_all`用）
    All,
}

/// CSVレコードの終端文字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum LineTerminator {
    /// `\r\n`（Excel互換、デフォルト）
    #[default]
    CrLf,

    /// `\n`
    Lf,
}

/// フィールドのクォート方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QuoteMode {
    /// 区切り文字・引用符・改行を含むフィールドのみクォート（デフォルト）
    #[default]
    Necessary,

    /// すべてのフィールドをクォート
    Always,
}

/// 1シート分の変換結果の概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// シート名
    pub sheet_name: String,
    /// 出力した行数（空行を含む）
    pub rows: usize,
    /// 最も長い行のフィールド数
    pub columns: usize,
    /// 値を出力したセル数
    pub cells: usize,
}

/// `Converter::convert_all`が返す1シート分の出力
#[derive(Debug, Clone)]
pub struct SheetOutput {
    /// 変換結果の概要
    pub summary: ConversionSummary,
    /// CSVのバイト列（UTF-8）
    pub csv: Vec<u8>,
}
