//! Workbook Parser Module
//!
//! calamineのラッパーとして、シート選択とセルデータの抽出を提供します。
//! calamineで取得できない書式・非表示情報は`XlsxMetadataParser`から補います。

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::api::SheetSelector;
use crate::error::{Excel2CsvError, Result};
use crate::parser::XlsxMetadataParser;
use crate::types::{CellCoord, CellRange, CellValue, MergedRegion, RawCellData, SheetMetadata};

/// ワークブックパーサー
///
/// 入力のバイト列を借用し、並列変換時はワーカーごとに生成します。
pub(crate) struct WorkbookParser<'a> {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<&'a [u8]>>,
    /// XMLメタデータ（全ワーカーで共有）
    metadata: &'a XlsxMetadataParser<'a>,
}

impl<'a> WorkbookParser<'a> {
    /// ワークブックを開く
    ///
    /// # 引数
    ///
    /// * `data` - XLSXファイルのバイト列
    /// * `metadata` - 同じバイト列から解析済みのメタデータ
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(Excel2CsvError::Parse)` - XLSXとして読み込めない場合
    pub fn open(data: &'a [u8], metadata: &'a XlsxMetadataParser<'a>) -> Result<Self> {
        let workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(data)).map_err(|e| Excel2CsvError::Parse(e.into()))?;
        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名をワークブック順に取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 引数
    ///
    /// * `selector` - シート選択方式
    /// * `include_hidden` - 非表示シートを`First`/`All`の対象に含めるかどうか
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト（ワークブック順または指定順）
    /// * `Err(Excel2CsvError::SheetNotFound)` - 指定名のシートが存在しない場合
    /// * `Err(Excel2CsvError::Config)` - インデックスが範囲外、または対象シートがない場合
    pub fn select_sheets(
        &self,
        selector: &SheetSelector,
        include_hidden: bool,
    ) -> Result<Vec<String>> {
        let all_sheet_names = self.sheet_names();
        let visible = || {
            all_sheet_names
                .iter()
                .filter(|name| include_hidden || !self.metadata.is_sheet_hidden(name))
                .cloned()
        };

        let selected = match selector {
            SheetSelector::First => match visible().next() {
                Some(name) => vec![name],
                None => {
                    return Err(Excel2CsvError::Config(
                        "Workbook contains no sheet to convert".to_string(),
                    ))
                }
            },

            SheetSelector::All => visible().collect(),

            SheetSelector::Index(index) => vec![sheet_at(&all_sheet_names, *index)?],

            SheetSelector::Indices(indices) => indices
                .iter()
                .map(|&index| sheet_at(&all_sheet_names, index))
                .collect::<Result<Vec<_>>>()?,

            SheetSelector::Name(name) => vec![sheet_named(&all_sheet_names, name)?],

            SheetSelector::Names(names) => names
                .iter()
                .map(|name| sheet_named(&all_sheet_names, name))
                .collect::<Result<Vec<_>>>()?,
        };

        debug!(?selector, include_hidden, sheets = ?selected, "selected sheets");
        Ok(selected)
    }

    /// シートをパースして、メタデータとセルデータを抽出
    ///
    /// セルは行優先の順で、シート上の絶対座標を持ちます。
    /// 値が空でも数式を持つセルは含まれます。
    ///
    /// # 引数
    ///
    /// * `sheet_name` - パースするシート名
    ///
    /// # 戻り値
    ///
    /// * `Ok((SheetMetadata, Vec<RawCellData>))` - メタデータとセルデータのペア
    /// * `Err(Excel2CsvError)` - パースエラーが発生した場合
    pub fn parse_sheet(&mut self, sheet_name: &str) -> Result<(SheetMetadata, Vec<RawCellData>)> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| Excel2CsvError::Parse(e.into()))?;
        let layout = self.metadata.sheet_layout(sheet_name)?;

        let mut cells: BTreeMap<CellCoord, RawCellData> = BTreeMap::new();

        // calamineのused_cellsは範囲の左上からの相対座標
        if let Some((start_row, start_col)) = range.start() {
            for (row, col, data) in range.used_cells() {
                let Some(value) = convert_value(data) else {
                    continue;
                };
                let coord = CellCoord::new(start_row + row as u32, start_col + col as u32);
                cells.insert(coord, RawCellData::new(coord, value));
            }
        }

        // 数式は一括で取得して全セルで再利用する（セルごとの取得は非常に遅い）
        if let Ok(formulas) = self.workbook.worksheet_formula(sheet_name) {
            if let Some((start_row, start_col)) = formulas.start() {
                for (row, col, formula) in formulas.used_cells() {
                    let coord = CellCoord::new(start_row + row as u32, start_col + col as u32);
                    let formula = if formula.starts_with('=') {
                        formula.clone()
                    } else {
                        format!("={}", formula)
                    };
                    cells
                        .entry(coord)
                        .or_insert_with(|| RawCellData::new(coord, CellValue::Empty))
                        .formula = Some(formula);
                }
            }
        }

        for cell in cells.values_mut() {
            if let Some((format_id, format_string)) = layout
                .styles
                .get(&cell.coord)
                .and_then(|&style| self.metadata.number_format(style))
            {
                cell.format_id = Some(format_id);
                cell.format_string = format_string.map(str::to_string);
            }
        }

        let index = self
            .workbook
            .sheet_names()
            .iter()
            .position(|name| name == sheet_name)
            .ok_or_else(|| Excel2CsvError::SheetNotFound(sheet_name.to_string()))?;

        let metadata = SheetMetadata {
            name: sheet_name.to_string(),
            index,
            hidden: self.metadata.is_sheet_hidden(sheet_name),
            merged_regions: self.merged_regions(sheet_name)?,
            hidden_rows: layout.hidden_rows.into_iter().collect(),
            hidden_cols: layout.hidden_cols.into_iter().collect(),
            is_1904: self.metadata.is_1904(),
        };

        debug!(
            sheet = sheet_name,
            index,
            cells = cells.len(),
            merged_regions = metadata.merged_regions.len(),
            "extracted sheet cells"
        );

        Ok((metadata, cells.into_values().collect()))
    }

    /// 結合セル範囲を取得
    fn merged_regions(&mut self, sheet_name: &str) -> Result<Vec<MergedRegion>> {
        self.workbook
            .load_merged_regions()
            .map_err(|e| Excel2CsvError::Parse(e.into()))?;

        let regions = match self.workbook.worksheet_merge_cells(sheet_name) {
            Some(Ok(regions)) => regions
                .iter()
                .map(|dims| {
                    let start = CellCoord::new(dims.start.0, dims.start.1);
                    let end = CellCoord::new(dims.end.0, dims.end.1);
                    MergedRegion::new(CellRange::new(start, end))
                })
                .collect(),
            Some(Err(e)) => return Err(Excel2CsvError::Parse(e.into())),
            None => Vec::new(),
        };
        Ok(regions)
    }
}

/// calamineの値を`CellValue`に変換（空セルは`None`）
fn convert_value(data: &Data) -> Option<CellValue> {
    let value = match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => return None,
    };
    Some(value)
}

fn sheet_at(names: &[String], index: usize) -> Result<String> {
    names.get(index).cloned().ok_or_else(|| {
        Excel2CsvError::Config(format!(
            "Sheet index {} is out of range (total: {})",
            index,
            names.len()
        ))
    })
}

fn sheet_named(names: &[String], name: &str) -> Result<String> {
    if names.iter().any(|n| n == name) {
        Ok(name.to_string())
    } else {
        Err(Excel2CsvError::SheetNotFound(name.to_string()))
    }
}


// ワークブック全体の変換は統合テスト（tests/）で検証します。
