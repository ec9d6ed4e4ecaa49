//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;

use thiserror::Error;

/// excel2csvクレート全体で使用するエラー型
///
/// XLSXファイルの読み込み、メタデータ解析、セル書式の適用、CSV書き出しの
/// 各段階で発生するエラーを統一的に扱います。
///
/// # 使用例
///
/// ```rust,no_run
/// use excel2csv::Excel2CsvError;
/// use std::fs::File;
///
/// fn open_workbook(path: &str) -> Result<File, Excel2CsvError> {
///     let file = File::open(path)?; // Ioエラーへ自動変換
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Excel2CsvError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XLSXパッケージ内のXML解析エラー
    #[error("XML error: {0}")]
    Xml(String),

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// CSV書き出し中のエラー
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時に無効な設定が検出された場合や、
    /// 範囲外のシートインデックスが指定された場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use excel2csv::{ConverterBuilder, Excel2CsvError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_range((10, 0), (0, 0))
    ///     .build();
    ///
    /// if let Err(Excel2CsvError::Config(msg)) = result {
    ///     eprintln!("設定エラー: {}", msg);
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 指定された名前のシートがワークブックに存在しない
    #[error("not found sheet: {0}")]
    SheetNotFound(String),

    /// 入力ファイルが存在しない、ディレクトリである、または拡張子が`.xlsx`でない
    #[error("not found a file: {}", .0.display())]
    InputNotFound(PathBuf),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb、パストラバーサル、入力サイズ上限などの制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// クレート共通の`Result`型
pub type Result<T> = std::result::Result<T, Excel2CsvError>;

impl From<zip::result::ZipError> for Excel2CsvError {
    fn from(err: zip::result::ZipError) -> Self {
        Excel2CsvError::Zip(err.to_string())
    }
}

impl From<quick_xml::Error> for Excel2CsvError {
    fn from(err: quick_xml::Error) -> Self {
        Excel2CsvError::Xml(err.to_string())
    }
}
