//! Command Line Module
//!
//! `excel2csv`コマンドの引数定義と実行処理を提供するモジュール。
//! 引数は`clap`のderiveで定義し、エラーは`anyhow`で文脈を付けて返します。

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, ValueEnum};
use thiserror::Error;
use tracing::info;

use crate::api::{
    ConversionSummary, DateFormat, FormulaMode, LineTerminator, MergeStrategy, QuoteMode,
    SheetSelector,
};
use crate::builder::{Converter, ConverterBuilder};
use crate::error::Excel2CsvError;

/// 入力ファイルの拡張子
const INPUT_EXTENSION: &str = ".xlsx";

/// 入力ファイルが指定されていない
#[derive(Debug, Error)]
#[error("please provide an excel file to convert.")]
pub struct MissingInput;

/// セル結合の出力方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MergeArg {
    /// 左上のセルにのみ値を出力する
    Keep,
    /// 結合範囲のすべてのセルに値を複製する
    Duplicate,
}

impl From<MergeArg> for MergeStrategy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Keep => MergeStrategy::Keep,
            MergeArg::Duplicate => MergeStrategy::Duplicate,
        }
    }
}

/// Convert an Excel worksheet (.xlsx) to CSV.
///
/// By default the first sheet of INPUT is written next to it with the .csv
/// extension, using the Excel CSV dialect (comma, CRLF, minimal quoting).
#[derive(Debug, Parser)]
#[command(name = "excel2csv", version)]
pub struct Args {
    /// Excel workbook to convert (.xlsx)
    pub input: Option<PathBuf>,

    /// Name of the sheet to convert (default: the first sheet)
    pub sheet: Option<String>,

    /// Output file, or '-' for stdout (with --all-sheets: output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Convert the sheet at this 0-based index
    #[arg(long, conflicts_with_all = ["sheet", "all_sheets"])]
    pub sheet_index: Option<usize>,

    /// Convert every sheet into <stem>_<sheet>.csv
    #[arg(long, conflicts_with = "sheet")]
    pub all_sheets: bool,

    /// Field delimiter (a single ASCII character, or 'tab')
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Use tab as the field delimiter
    #[arg(long, conflicts_with = "delimiter")]
    pub tab: bool,

    /// Terminate records with LF instead of CRLF
    #[arg(long)]
    pub lf: bool,

    /// Quote every field
    #[arg(long)]
    pub always_quote: bool,

    /// Write a UTF-8 byte order mark before the first record
    #[arg(long)]
    pub bom: bool,

    /// Write formulas instead of their cached values
    #[arg(long)]
    pub formulas: bool,

    /// Date output: 'cell' (cell number format), 'iso8601', or a chrono pattern
    #[arg(long, env = "EXCEL2CSV_DATE_FORMAT", default_value = "cell")]
    pub date_format: String,

    /// Leave out hidden rows, columns and sheets
    #[arg(long)]
    pub skip_hidden: bool,

    /// Only convert this cell range (e.g. A1:D20)
    #[arg(long)]
    pub range: Option<String>,

    /// How merged cells are written
    #[arg(long, value_enum, default_value_t = MergeArg::Keep)]
    pub merge: MergeArg,

    /// Print conversion summaries as JSON on stdout
    #[arg(long)]
    pub summary_json: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// `RUST_LOG`が未設定のときに使うログフィルター
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "excel2csv=error";
        }
        match self.verbose {
            0 => "excel2csv=warn",
            1 => "excel2csv=info",
            _ => "excel2csv=debug",
        }
    }

    /// 引数から`Converter`を構築
    pub fn converter(&self) -> Result<Converter, Excel2CsvError> {
        let selector = if self.all_sheets {
            SheetSelector::All
        } else if let Some(index) = self.sheet_index {
            SheetSelector::Index(index)
        } else if let Some(name) = &self.sheet {
            SheetSelector::Name(name.clone())
        } else {
            SheetSelector::First
        };

        let mut builder = ConverterBuilder::new()
            .with_sheet_selector(selector)
            .with_date_format(parse_date_format(&self.date_format))
            .with_merge_strategy(self.merge.into())
            .include_hidden(!self.skip_hidden)
            .with_delimiter(if self.tab { b'\t' } else { self.delimiter })
            .with_bom(self.bom);

        if self.formulas {
            builder = builder.with_formula_mode(FormulaMode::Formula);
        }
        if self.lf {
            builder = builder.with_line_terminator(LineTerminator::Lf);
        }
        if self.always_quote {
            builder = builder.with_quote_mode(QuoteMode::Always);
        }
        if let Some(range) = &self.range {
            builder = builder.with_range_a1(range);
        }

        builder.build()
    }
}

/// 出力先
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

/// コマンドを実行
///
/// # 戻り値
///
/// * `Ok(())` - すべてのシートの書き出しに成功した場合
/// * `Err(anyhow::Error)` - 入力の検証、変換、書き出しのいずれかに失敗した場合
pub fn run(args: Args) -> anyhow::Result<()> {
    let input = args.input.clone().ok_or(MissingInput)?;
    validate_input(&input)?;

    let converter = args.converter()?;

    let summaries = if args.all_sheets {
        convert_all_sheets(&converter, &input, args.output.as_deref())?
    } else {
        let destination = destination(&input, args.output.as_deref());
        vec![convert_single_sheet(&converter, &input, &destination)?]
    };

    if args.summary_json {
        let json = serde_json::to_string_pretty(&summaries)?;
        println!("{}", json);
    }
    Ok(())
}

/// エラーを標準エラー出力向けの文字列にする
///
/// 入力ファイルに関するエラーはそのまま、それ以外は`error. `を前置します。
pub fn error_message(error: &anyhow::Error) -> String {
    if error.is::<MissingInput>() {
        return error.to_string();
    }
    if let Some(e @ Excel2CsvError::InputNotFound(_)) = error.downcast_ref::<Excel2CsvError>() {
        return e.to_string();
    }
    format!("error. {:#}", error)
}

/// 入力ファイルを検証（存在し、ディレクトリでなく、`.xlsx`で終わる）
fn validate_input(input: &Path) -> Result<(), Excel2CsvError> {
    let is_xlsx = input
        .to_str()
        .is_some_and(|path| path.ends_with(INPUT_EXTENSION));
    if !input.exists() || input.is_dir() || !is_xlsx {
        return Err(Excel2CsvError::InputNotFound(input.to_path_buf()));
    }
    Ok(())
}

/// 単一シートの出力先（未指定なら入力と同じ場所の`.csv`）
fn destination(input: &Path, output: Option<&Path>) -> Destination {
    match output {
        Some(path) if path == Path::new("-") => Destination::Stdout,
        Some(path) => Destination::File(path.to_path_buf()),
        None => Destination::File(input.with_extension("csv")),
    }
}

fn convert_single_sheet(
    converter: &Converter,
    input: &Path,
    destination: &Destination,
) -> anyhow::Result<ConversionSummary> {
    let reader =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;

    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            let summary = converter.convert(reader, BufWriter::new(stdout.lock()))?;
            Ok(summary)
        }
        Destination::File(path) => {
            // 変換に成功した場合のみ出力ファイルを作成する
            let mut buffer = Vec::new();
            let summary = converter.convert(reader, &mut buffer)?;
            write_file(path, &buffer)?;
            info!(path = %path.display(), rows = summary.rows, "wrote csv");
            Ok(summary)
        }
    }
}

fn convert_all_sheets(
    converter: &Converter,
    input: &Path,
    output_dir: Option<&Path>,
) -> anyhow::Result<Vec<ConversionSummary>> {
    if output_dir == Some(Path::new("-")) {
        bail!("--all-sheets writes one file per sheet and cannot write to stdout");
    }

    let reader =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let sheets = converter.convert_all(reader)?;

    let directory = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_names =
        sheet_file_names(&stem, sheets.iter().map(|sheet| sheet.summary.sheet_name.as_str()));

    let mut summaries = Vec::with_capacity(sheets.len());
    for (sheet, file_name) in sheets.into_iter().zip(file_names) {
        let path = directory.join(file_name);
        write_file(&path, &sheet.csv)?;
        info!(path = %path.display(), rows = sheet.summary.rows, "wrote csv");
        summaries.push(sheet.summary);
    }
    Ok(summaries)
}

fn write_file(path: &Path, csv: &[u8]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(csv)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// `<stem>_<sheet>.csv`（ファイル名に使えない文字は`_`に置き換える）
fn sheet_file_name(stem: &str, sheet_name: &str) -> String {
    let sheet: String = sheet_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}_{}.csv", stem, sheet)
}

/// シートごとの出力ファイル名を重複しないように決める
///
/// 置き換え後の名前が既出の場合は`<stem>_<sheet>_2.csv`のように番号を付けます。
/// 大文字小文字を区別しないファイルシステムを考慮し、比較は小文字で行います。
fn sheet_file_names<'a>(
    stem: &str,
    sheet_names: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut used = HashSet::new();
    sheet_names
        .into_iter()
        .map(|sheet_name| {
            let base = sheet_file_name(stem, sheet_name);
            let mut file_name = base.clone();
            let mut n = 2;
            while !used.insert(file_name.to_lowercase()) {
                file_name = format!("{}_{}.csv", base.trim_end_matches(".csv"), n);
                n += 1;
            }
            file_name
        })
        .collect()
}

fn parse_date_format(value: &str) -> DateFormat {
    match value.to_ascii_lowercase().as_str() {
        "cell" => DateFormat::CellFormat,
        "iso8601" | "iso" => DateFormat::Iso8601,
        _ => DateFormat::Custom(value.to_string()),
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be a single ASCII character: '{}'", value)),
        },
    }
}
