//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::io::{Read, Write};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::api::{
    ConversionSummary, DateFormat, FormulaMode, LineTerminator, MergeStrategy, QuoteMode,
    SheetOutput, SheetSelector,
};
use crate::error::{Excel2CsvError, Result};
use crate::formatter::{validate_chrono_pattern, CellFormatter};
use crate::grid::LogicalGrid;
use crate::output::CsvFormatter;
use crate::parser::{WorkbookParser, XlsxMetadataParser};
use crate::security::SecurityConfig;
use crate::types::{CellCoord, CellRange};

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// セル結合戦略
    pub merge_strategy: MergeStrategy,

    /// 日付形式
    pub date_format: DateFormat,

    /// 数式出力モード
    pub formula_mode: FormulaMode,

    /// 非表示要素を含めるか
    pub include_hidden: bool,

    /// セル範囲制限（Option: Noneの場合は全範囲）
    pub range: Option<CellRange>,

    /// フィールドの区切り文字
    pub delimiter: u8,

    /// レコードの終端文字
    pub line_terminator: LineTerminator,

    /// クォート方針
    pub quote_mode: QuoteMode,

    /// 先頭にUTF-8 BOMを出力するか
    pub bom: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::First,
            merge_strategy: MergeStrategy::Keep,
            date_format: DateFormat::CellFormat,
            formula_mode: FormulaMode::CachedValue,
            include_hidden: true,
            range: None,
            delimiter: b',',
            line_terminator: LineTerminator::CrLf,
            quote_mode: QuoteMode::Necessary,
            bom: false,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use excel2csv::{ConverterBuilder, SheetSelector, MergeStrategy};
///
/// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("Sales".to_string()))
///     .with_merge_strategy(MergeStrategy::Duplicate)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,

    /// A1形式で指定された範囲（`build()`時に解析）
    range_a1: Option<String>,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 最初のシート
    /// - セル結合戦略: 親セルのみ（`MergeStrategy::Keep`）
    /// - 日付形式: セルの書式どおり
    /// - 非表示要素: 含める
    /// - 数式モード: キャッシュ値を出力
    /// - CSV方言: `,`区切り、CRLF、必要な場合のみクォート、BOMなし
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
            range_a1: None,
        }
    }

    /// 変換対象のシートを選択する
    ///
    /// # 引数
    ///
    /// * `selector: SheetSelector`: シート選択方式
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use excel2csv::{ConverterBuilder, SheetSelector};
    ///
    /// // 単一シートをインデックスで指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Index(1));
    ///
    /// // すべてのシート（`Converter::convert_all`用）
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::All);
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// セル結合の処理戦略を指定する
    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.config.merge_strategy = strategy;
        self
    }

    /// 日付の出力形式を指定する
    ///
    /// # 引数
    ///
    /// * `format: DateFormat`: 日付形式
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use excel2csv::{ConverterBuilder, DateFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Iso8601);
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y/%m/%d %H:%M".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 数式セルの出力モードを指定する
    pub fn with_formula_mode(mut self, mode: FormulaMode) -> Self {
        self.config.formula_mode = mode;
        self
    }

    /// 非表示要素（非表示シート、行、列）を出力に含めるかを指定する
    ///
    /// # 引数
    ///
    /// * `include: bool`:
    ///   * `true`: 非表示要素を含める（デフォルト）
    ///   * `false`: 非表示の行・列を詰めて出力し、`First`/`All`の選択から非表示シートを除く
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// 処理対象のセル範囲を制限する
    ///
    /// 範囲外のセルは無視され、出力は範囲の左上を原点とします。
    ///
    /// # 引数
    ///
    /// * `start: (u32, u32)`: 開始セル座標 (row, col)（0始まり）
    /// * `end: (u32, u32)`: 終了セル座標 (row, col)（0始まり）
    ///
    /// # 制約
    ///
    /// * `start.0 <= end.0` かつ `start.1 <= end.1` でなければならない
    /// * 制約違反の場合、`build()`時に`Excel2CsvError::Config`を返す
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use excel2csv::ConverterBuilder;
    ///
    /// // A1:C10の範囲を処理（0始まりなので、row 0-9, col 0-2）
    /// let builder = ConverterBuilder::new()
    ///     .with_range((0, 0), (9, 2));
    /// ```
    pub fn with_range(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.config.range = Some(CellRange::new(
            CellCoord::new(start.0, start.1),
            CellCoord::new(end.0, end.1),
        ));
        self.range_a1 = None;
        self
    }

    /// 処理対象のセル範囲をA1形式（例: `"B2:D20"`）で指定する
    ///
    /// 文字列の解析は`build()`時に行われます。
    pub fn with_range_a1(mut self, range: &str) -> Self {
        self.range_a1 = Some(range.to_string());
        self
    }

    /// フィールドの区切り文字を指定する（デフォルト: `b','`）
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// レコードの終端文字を指定する（デフォルト: CRLF）
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.config.line_terminator = terminator;
        self
    }

    /// フィールドのクォート方針を指定する
    pub fn with_quote_mode(mut self, mode: QuoteMode) -> Self {
        self.config.quote_mode = mode;
        self
    }

    /// 出力の先頭にUTF-8 BOMを付けるかを指定する
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.config.bom = bom;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)`: 設定が有効な場合、Converterインスタンス
    /// * `Err(Excel2CsvError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `Excel2CsvError::Config(String)`: 設定の検証に失敗した場合
    ///   * A1形式の範囲が解析できない
    ///   * 範囲指定の開始座標が終了座標より大きい
    ///   * カスタム日付形式が空、または不正な書式文字列
    ///   * 区切り文字がASCIIでない、または`"`・CR・LF
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use excel2csv::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_range_a1("A1:D100")
    ///     .with_delimiter(b';')
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(mut self) -> Result<Converter> {
        // 1. A1形式の範囲を解析
        if let Some(text) = self.range_a1.take() {
            let range = CellRange::from_a1_notation(text.trim()).map_err(|e| {
                Excel2CsvError::Config(format!("Invalid range '{}': {}", text, e))
            })?;
            self.config.range = Some(range);
        }

        // 2. セル範囲の検証
        if let Some(range) = &self.config.range {
            if range.start.row > range.end.row {
                return Err(Excel2CsvError::Config(format!(
                    "Invalid range: start row ({}) > end row ({})",
                    range.start.row, range.end.row
                )));
            }

            if range.start.col > range.end.col {
                return Err(Excel2CsvError::Config(format!(
                    "Invalid range: start col ({}) > end col ({})",
                    range.start.col, range.end.col
                )));
            }
        }

        // 3. カスタム日付形式の検証
        if let DateFormat::Custom(ref pattern) = self.config.date_format {
            if !validate_chrono_pattern(pattern) {
                return Err(Excel2CsvError::Config(format!(
                    "Invalid date format string: '{}'",
                    pattern
                )));
            }
        }

        // 4. 区切り文字の検証
        let delimiter = self.config.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, b'"' | b'\r' | b'\n') {
            return Err(Excel2CsvError::Config(format!(
                "Invalid delimiter: {:?}",
                delimiter as char
            )));
        }

        Ok(Converter {
            config: self.config,
        })
    }
}

/// 変換処理のファサード
///
/// ExcelファイルをCSV形式に変換するためのメインエントリーポイントです。
/// `ConverterBuilder`を使用して構築された設定に基づいて変換処理を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use excel2csv::ConverterBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
/// let converter = ConverterBuilder::new().build()?;
/// let input = File::open("report.xlsx")?;
/// let output = File::create("report.csv")?;
/// let summary = converter.convert(input, output)?;
/// println!("{} rows", summary.rows);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,
}

impl Converter {
    /// 選択された1シートをCSVに変換
    ///
    /// # 引数
    ///
    /// * `input` - Excelファイルを読み込むためのリーダー
    /// * `output` - CSV出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(ConversionSummary)` - 変換に成功した場合
    /// * `Err(Excel2CsvError::SheetNotFound)` - 指定名のシートが存在しない場合
    /// * `Err(Excel2CsvError::Config)` - 選択結果が1シートでない場合（`SheetSelector::All`など）
    /// * `Err(Excel2CsvError)` - その他のエラーが発生した場合
    ///
    /// # 処理フロー
    ///
    /// 1. 入力をメモリに読み込む（サイズ上限を検証）
    /// 2. XMLメタデータとワークブックを開く
    /// 3. シート選択
    /// 4. セルの抽出、フォーマット、グリッドの構築、CSV出力
    /// 5. 出力をフラッシュ
    pub fn convert<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<ConversionSummary> {
        if self.config.sheet_selector == SheetSelector::All {
            return Err(Excel2CsvError::Config(
                "SheetSelector::All converts several sheets; use convert_all".to_string(),
            ));
        }

        let data = read_input(input)?;
        let metadata = XlsxMetadataParser::new(&data)?;
        let mut parser = WorkbookParser::open(&data, &metadata)?;

        let sheet_names =
            parser.select_sheets(&self.config.sheet_selector, self.config.include_hidden)?;
        let [sheet_name] = sheet_names.as_slice() else {
            return Err(Excel2CsvError::Config(format!(
                "convert requires exactly one sheet but {} were selected; use convert_all",
                sheet_names.len()
            )));
        };

        let sheet = self.convert_sheet(&mut parser, sheet_name)?;
        output.write_all(&sheet.csv)?;
        output.flush()?;

        Ok(sheet.summary)
    }

    /// 選択された1シートをCSV文字列に変換
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use excel2csv::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let input = File::open("report.xlsx")?;
    /// let csv = converter.convert_to_string(input)?;
    /// print!("{}", csv);
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_to_string<R: Read>(&self, input: R) -> Result<String> {
        let mut buffer = Vec::new();
        self.convert(input, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| e.utf8_error().into())
    }

    /// 選択されたすべてのシートを並列にCSVへ変換
    ///
    /// 結果はシートの選択順（`All`の場合はワークブック順）に並びます。
    /// `SheetSelector::First`の場合は1シートのみを変換します。
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use excel2csv::{ConverterBuilder, SheetSelector};
    ///
    /// # fn main() -> Result<(), excel2csv::Excel2CsvError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::All)
    ///     .build()?;
    /// for sheet in converter.convert_all(File::open("report.xlsx")?)? {
    ///     std::fs::write(format!("{}.csv", sheet.summary.sheet_name), &sheet.csv)?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_all<R: Read>(&self, input: R) -> Result<Vec<SheetOutput>> {
        let data = read_input(input)?;
        let metadata = XlsxMetadataParser::new(&data)?;

        let sheet_names = WorkbookParser::open(&data, &metadata)?
            .select_sheets(&self.config.sheet_selector, self.config.include_hidden)?;

        // メタデータは1回だけ解析して全ワーカーで共有し、
        // ワークブックはワーカーごとに開く
        sheet_names
            .par_iter()
            .map(|sheet_name| {
                let mut parser = WorkbookParser::open(&data, &metadata)?;
                self.convert_sheet(&mut parser, sheet_name)
            })
            .collect()
    }

    /// 1シート分の変換（抽出、フォーマット、グリッド構築、CSV出力）
    fn convert_sheet(&self, parser: &mut WorkbookParser<'_>, sheet_name: &str) -> Result<SheetOutput> {
        let (metadata, raw_cells) = parser.parse_sheet(sheet_name)?;
        if let Some(range) = &self.config.range {
            debug!(sheet = sheet_name, %range, "restricting output to range");
        }

        let mut formatter = CellFormatter::new(&self.config);
        let formatted_cells = raw_cells
            .iter()
            .map(|raw_cell| {
                formatter
                    .format_cell(raw_cell, metadata.is_1904)
                    .map(|content| (raw_cell.coord, content))
            })
            .collect::<Result<Vec<_>>>()?;

        let grid = LogicalGrid::build(
            formatted_cells,
            &metadata,
            self.config.merge_strategy,
            self.config.include_hidden,
            self.config.range.as_ref(),
        );

        let mut csv = Vec::new();
        CsvFormatter::from_config(&self.config).render(&grid, &mut csv)?;

        let summary = ConversionSummary {
            sheet_name: metadata.name,
            rows: grid.get_rows(),
            columns: grid.get_cols(),
            cells: grid.get_cell_count(),
        };
        info!(
            sheet = %summary.sheet_name,
            index = metadata.index,
            hidden = metadata.hidden,
            rows = summary.rows,
            columns = summary.columns,
            "converted sheet"
        );

        Ok(SheetOutput { summary, csv })
    }
}

/// 入力をメモリに読み込む
///
/// 入力サイズの上限を超えた場合は`SecurityViolation`を返します。
fn read_input<R: Read>(input: R) -> Result<Vec<u8>> {
    let security_config = SecurityConfig::default();
    let mut buffer = Vec::new();
    // 上限+1バイトまで読めば超過を検出できる
    let bytes_read = input
        .take(security_config.max_input_file_size.saturating_add(1))
        .read_to_end(&mut buffer)?;

    if bytes_read as u64 > security_config.max_input_file_size {
        return Err(Excel2CsvError::SecurityViolation(format!(
            "Input file size exceeds maximum: {} bytes (max: {} bytes)",
            bytes_read, security_config.max_input_file_size
        )));
    }

    debug!(bytes = bytes_read, "read input workbook");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_builder_new() {
        let builder = ConverterBuilder::new();
        assert_eq!(builder.config.sheet_selector, SheetSelector::First);
        assert_eq!(builder.config.merge_strategy, MergeStrategy::Keep);
        assert_eq!(builder.config.date_format, DateFormat::CellFormat);
        assert_eq!(builder.config.formula_mode, FormulaMode::CachedValue);
        assert!(builder.config.include_hidden);
        assert!(builder.config.range.is_none());
        assert_eq!(builder.config.delimiter, b',');
        assert_eq!(builder.config.line_terminator, LineTerminator::CrLf);
        assert_eq!(builder.config.quote_mode, QuoteMode::Necessary);
        assert!(!builder.config.bom);
    }

    #[test]
    fn test_with_sheet_selector() {
        let builder =
            ConverterBuilder::new().with_sheet_selector(SheetSelector::Name("Sheet1".to_string()));
        assert!(matches!(
            builder.config.sheet_selector,
            SheetSelector::Name(ref name) if name == "Sheet1"
        ));
    }

    #[test]
    fn test_with_range() {
        let builder = ConverterBuilder::new().with_range((0, 0), (9, 2));
        let range = builder.config.range.unwrap();
        assert_eq!(range.start, CellCoord::new(0, 0));
        assert_eq!(range.end, CellCoord::new(9, 2));
    }

    #[test]
    fn test_with_range_a1() {
        let converter = ConverterBuilder::new().with_range_a1("B2:D10").build().unwrap();
        let range = converter.config.range.unwrap();
        assert_eq!(range.start, CellCoord::new(1, 1));
        assert_eq!(range.end, CellCoord::new(9, 3));
    }

    #[test]
    fn test_build_with_invalid_range_a1() {
        match ConverterBuilder::new().with_range_a1("B2:??").build() {
            Err(Excel2CsvError::Config(msg)) => assert!(msg.contains("Invalid range")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_with_invalid_range_row() {
        match ConverterBuilder::new().with_range((10, 0), (0, 0)).build() {
            Err(Excel2CsvError::Config(msg)) => assert!(msg.contains("start row")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_with_invalid_range_col() {
        match ConverterBuilder::new().with_range_a1("C1:A5").build() {
            Err(Excel2CsvError::Config(msg)) => assert!(msg.contains("start col")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_with_custom_date_format() {
        assert!(ConverterBuilder::new()
            .with_date_format(DateFormat::Custom("%Y-%m-%d".to_string()))
            .build()
            .is_ok());

        for pattern in ["", "%Y-%Q"] {
            match ConverterBuilder::new()
                .with_date_format(DateFormat::Custom(pattern.to_string()))
                .build()
            {
                Err(Excel2CsvError::Config(msg)) => assert!(msg.contains("Invalid date format")),
                other => panic!("Expected Config error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_build_with_invalid_delimiter() {
        for delimiter in [b'"', b'\n', b'\r', 0xE3] {
            assert!(matches!(
                ConverterBuilder::new().with_delimiter(delimiter).build(),
                Err(Excel2CsvError::Config(_))
            ));
        }
        assert!(ConverterBuilder::new().with_delimiter(b'\t').build().is_ok());
    }

    #[test]
    fn test_builder_method_chaining() {
        let converter = ConverterBuilder::new()
            .with_sheet_selector(SheetSelector::Index(1))
            .with_merge_strategy(MergeStrategy::Duplicate)
            .with_date_format(DateFormat::Iso8601)
            .with_formula_mode(FormulaMode::Formula)
            .include_hidden(false)
            .with_range((0, 0), (10, 5))
            .with_delimiter(b';')
            .with_line_terminator(LineTerminator::Lf)
            .with_quote_mode(QuoteMode::Always)
            .with_bom(true)
            .build()
            .unwrap();

        let config = &converter.config;
        assert_eq!(config.sheet_selector, SheetSelector::Index(1));
        assert_eq!(config.merge_strategy, MergeStrategy::Duplicate);
        assert_eq!(config.date_format, DateFormat::Iso8601);
        assert_eq!(config.formula_mode, FormulaMode::Formula);
        assert!(!config.include_hidden);
        assert!(config.range.is_some());
        assert_eq!(config.delimiter, b';');
        assert_eq!(config.line_terminator, LineTerminator::Lf);
        assert_eq!(config.quote_mode, QuoteMode::Always);
        assert!(config.bom);
    }

    #[test]
    fn test_convert_rejects_all_selector() {
        let converter = ConverterBuilder::new()
            .with_sheet_selector(SheetSelector::All)
            .build()
            .unwrap();
        let result = converter.convert(std::io::Cursor::new(Vec::new()), Vec::new());
        assert!(matches!(result, Err(Excel2CsvError::Config(_))));
    }

    #[test]
    fn test_convert_to_string_with_invalid_input() {
        let converter = ConverterBuilder::new().build().unwrap();
        let result = converter.convert_to_string(&b"not an xlsx file"[..]);
        assert!(matches!(result, Err(Excel2CsvError::Zip(_))));
    }
}
