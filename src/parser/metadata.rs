//! XML Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得不可能な情報を抽出するモジュール。
//! セルごとのスタイル（Number Format String）、非表示シート・行・列、
//! 1904年エポック判定などを提供します。

use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Excel2CsvError, Result};
use crate::security::{validate_zip_path, SecurityConfig};
use crate::types::{CellCoord, MAX_COLUMNS};

/// カスタム書式IDの開始値（これ未満はビルトイン書式）
const FIRST_CUSTOM_FORMAT_ID: u16 = 164;

/// ワークブック内のシート定義（`<sheet>`要素）
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    hidden: bool,
    /// ZIPアーカイブ内のワークシートXMLのパス
    path: Option<String>,
}

/// ワークシートXMLから取得したシートのレイアウト情報
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetLayout {
    /// セル座標 -> スタイルインデックス（`<c s="…">`）
    pub styles: HashMap<CellCoord, u32>,
    /// 非表示行（0始まり）
    pub hidden_rows: BTreeSet<u32>,
    /// 非表示列（0始まり）
    pub hidden_cols: BTreeSet<u32>,
}

/// XLSXメタデータパーサー
///
/// XLSXファイル（ZIPアーカイブ）からXMLを直接解析し、
/// calamineで取得できない情報を抽出します。
/// ワークブック全体の情報は生成時に解析し、シートごとの情報は
/// `sheet_layout`で必要になった時点で解析します。
#[derive(Debug)]
pub(crate) struct XlsxMetadataParser<'a> {
    /// XLSXファイルのバイト列
    data: &'a [u8],
    /// numFmtId -> formatCode のマッピング
    num_formats: HashMap<u16, String>,
    /// styleId -> numFmtId（cellXfs要素の順）
    cell_xfs: Vec<u16>,
    /// ワークブック順のシート定義
    sheets: Vec<SheetEntry>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl<'a> XlsxMetadataParser<'a> {
    /// XLSXファイル（ZIPアーカイブ）からメタデータを解析
    ///
    /// # 引数
    ///
    /// * `data` - XLSXファイルのバイト列
    ///
    /// # 戻り値
    ///
    /// * `Ok(XlsxMetadataParser)` - メタデータの解析に成功した場合
    /// * `Err(Excel2CsvError::SecurityViolation)` - アーカイブが制限を超えている場合
    /// * `Err(Excel2CsvError)` - ZIP/XMLの解析エラーが発生した場合
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        check_archive(&mut archive, &SecurityConfig::default())?;

        let (num_formats, cell_xfs) = match read_entry(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => (HashMap::new(), Vec::new()),
        };

        let (mut sheets, is_1904) = match read_entry(&mut archive, "xl/workbook.xml")? {
            Some(xml) => parse_workbook(&xml)?,
            None => (Vec::new(), false),
        };

        // r:id -> ワークシートXMLのパス
        if let Some(xml) = read_entry(&mut archive, "xl/_rels/workbook.xml.rels")? {
            let targets = parse_relationships(&xml)?;
            for sheet in &mut sheets {
                if let Some(rel_id) = sheet.path.take() {
                    sheet.path = targets.get(&rel_id).map(|target| resolve_target(target));
                }
            }
        }

        debug!(
            sheets = sheets.len(),
            custom_formats = num_formats.len(),
            cell_styles = cell_xfs.len(),
            is_1904,
            "parsed workbook metadata"
        );

        Ok(Self {
            data,
            num_formats,
            cell_xfs,
            sheets,
            is_1904,
        })
    }

    /// 1904年エポックを使用するかどうかを取得
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// シートが非表示（`hidden`または`veryHidden`）かどうか
    pub fn is_sheet_hidden(&self, sheet_name: &str) -> bool {
        self.sheets
            .iter()
            .any(|sheet| sheet.name == sheet_name && sheet.hidden)
    }

    /// スタイルインデックスから書式IDと書式文字列を取得
    ///
    /// # 引数
    ///
    /// * `style_id` - スタイルID（`<c s="…">`、0始まり）
    ///
    /// # 戻り値
    ///
    /// * `Some((num_fmt_id, Some(format)))` - 書式文字列が見つかった場合
    /// * `Some((num_fmt_id, None))` - 書式IDはあるが文字列が不明な場合（ロケール依存のビルトイン書式など）
    /// * `None` - スタイルIDが範囲外の場合
    pub fn number_format(&self, style_id: u32) -> Option<(u16, Option<&str>)> {
        let num_fmt_id = *self.cell_xfs.get(style_id as usize)?;
        // ワークブック定義の書式がビルトインより優先
        let format = self
            .num_formats
            .get(&num_fmt_id)
            .map(String::as_str)
            .or_else(|| get_builtin_format(num_fmt_id));
        Some((num_fmt_id, format))
    }

    /// シートのワークシートXMLを解析し、スタイルと非表示行・列を取得
    ///
    /// # 引数
    ///
    /// * `sheet_name` - シート名
    ///
    /// # 戻り値
    ///
    /// * `Ok(SheetLayout)` - シートのレイアウト情報（ワークシートXMLが見つからない場合は空）
    /// * `Err(Excel2CsvError)` - ZIP/XMLの解析エラーが発生した場合
    pub fn sheet_layout(&self, sheet_name: &str) -> Result<SheetLayout> {
        let Some(path) = self
            .sheets
            .iter()
            .find(|sheet| sheet.name == sheet_name)
            .and_then(|sheet| sheet.path.as_deref())
        else {
            return Ok(SheetLayout::default());
        };

        // 並列変換時はスレッドごとにアーカイブを開く
        let mut archive = ZipArchive::new(Cursor::new(self.data))?;
        match read_entry(&mut archive, path)? {
            Some(xml) => {
                let layout = parse_worksheet(&xml)?;
                debug!(
                    sheet = sheet_name,
                    styled_cells = layout.styles.len(),
                    hidden_rows = layout.hidden_rows.len(),
                    hidden_cols = layout.hidden_cols.len(),
                    "parsed worksheet layout"
                );
                Ok(layout)
            }
            None => Ok(SheetLayout::default()),
        }
    }
}

/// アーカイブのセキュリティチェック
///
/// ファイル数、各ファイルのサイズ、展開後の合計サイズ、パスを検証します。
fn check_archive<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    config: &SecurityConfig,
) -> Result<()> {
    if archive.len() > config.max_file_count {
        return Err(Excel2CsvError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            config.max_file_count
        )));
    }

    let mut total_decompressed_size = 0u64;
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;

        let file_name = file.name();
        validate_zip_path(file_name).map_err(|e| {
            Excel2CsvError::SecurityViolation(format!("Invalid ZIP path: {}", e))
        })?;

        let file_size = file.size();
        if file_size > config.max_file_size {
            return Err(Excel2CsvError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                file_name, file_size, config.max_file_size
            )));
        }

        total_decompressed_size = total_decompressed_size
            .checked_add(file_size)
            .ok_or_else(|| {
                Excel2CsvError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

        if total_decompressed_size > config.max_decompressed_size {
            return Err(Excel2CsvError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_decompressed_size, config.max_decompressed_size
            )));
        }
    }

    Ok(())
}

/// アーカイブ内のファイルを読み込む（存在しない場合は`None`）
fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

/// 属性値を取得（XMLエスケープを解除）
///
/// キーは名前空間プレフィックスを除いたローカル名で比較します（`r:id` -> `id`）。
fn attr_value<R>(
    reader: &Reader<R>,
    element: &BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Excel2CsvError::Xml(format!("attribute error: {}", e)))?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.decode_and_unescape_value(reader)?.into_owned()));
        }
    }
    Ok(None)
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// xl/styles.xml の解析
///
/// `<numFmts>`と`<cellXfs>`を解析し、書式IDのマッピングを構築します。
/// `<cellStyleXfs>`内の`<xf>`は対象外です。
fn parse_styles(xml: &[u8]) -> Result<(HashMap<u16, String>, Vec<u16>)> {
    let mut num_formats = HashMap::new();
    let mut cell_xfs = Vec::new();

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    // <numFmt numFmtId="165" formatCode="0.000"/>
                    let id = attr_value(&reader, &e, b"numFmtId")?;
                    let code = attr_value(&reader, &e, b"formatCode")?;
                    if let (Some(id), Some(code)) = (id, code) {
                        num_formats.insert(id.parse()?, code);
                    }
                }
                b"cellXfs" => {
                    in_cell_xfs = true;
                }
                b"xf" if in_cell_xfs => {
                    // <xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
                    let id = match attr_value(&reader, &e, b"numFmtId")? {
                        Some(id) => id.parse()?,
                        None => 0,
                    };
                    cell_xfs.push(id);
                }
                _ => {}
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"cellXfs" {
                    in_cell_xfs = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((num_formats, cell_xfs))
}

/// xl/workbook.xml の解析
///
/// `<sheet>`要素（名前、表示状態、r:id）と`<workbookPr date1904="1"/>`を取得します。
/// 戻り値の`SheetEntry::path`には、この時点ではr:idが入っています。
fn parse_workbook(xml: &[u8]) -> Result<(Vec<SheetEntry>, bool)> {
    let mut sheets = Vec::new();
    let mut is_1904 = false;

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    is_1904 = is_truthy(attr_value(&reader, &e, b"date1904")?.as_deref());
                }
                b"sheet" => {
                    let name = attr_value(&reader, &e, b"name")?.unwrap_or_default();
                    let state = attr_value(&reader, &e, b"state")?;
                    let hidden = matches!(state.as_deref(), Some("hidden") | Some("veryHidden"));
                    sheets.push(SheetEntry {
                        name,
                        hidden,
                        path: attr_value(&reader, &e, b"id")?,
                    });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, is_1904))
}

/// xl/_rels/workbook.xml.rels の解析（Id -> Target）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (attr_value(&reader, &e, b"Id")?, attr_value(&reader, &e, b"Target")?)
                    {
                        targets.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// リレーションシップのTargetをアーカイブ内のパスに変換
///
/// `worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`、
/// `/xl/worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// ワークシートXMLの解析
///
/// `<col hidden>`、`<row hidden>`、`<c s>`を収集します。
/// `r`属性のない行・セルは直前の位置の次として扱います。
fn parse_worksheet(xml: &[u8]) -> Result<SheetLayout> {
    let mut layout = SheetLayout::default();

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut next_row = 0u32;
    let mut current_row = 0u32;
    let mut next_col = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" => {
                    // <col min="3" max="5" hidden="1"/>（1始まり）
                    if is_truthy(attr_value(&reader, &e, b"hidden")?.as_deref()) {
                        let min = attr_value(&reader, &e, b"min")?;
                        let max = attr_value(&reader, &e, b"max")?;
                        if let (Some(min), Some(max)) = (min, max) {
                            let min: u32 = min.parse()?;
                            let max: u32 = max.parse()?;
                            for col in min.max(1)..=max.min(MAX_COLUMNS) {
                                layout.hidden_cols.insert(col - 1);
                            }
                        }
                    }
                }
                b"row" => {
                    // <row r="15" hidden="1">（1始まり）
                    current_row = match attr_value(&reader, &e, b"r")? {
                        Some(r) => r.parse::<u32>()?.saturating_sub(1),
                        None => next_row,
                    };
                    next_row = current_row + 1;
                    next_col = 0;

                    if is_truthy(attr_value(&reader, &e, b"hidden")?.as_deref()) {
                        layout.hidden_rows.insert(current_row);
                    }
                }
                b"c" => {
                    // <c r="B2" s="3" t="n">
                    let coord = match attr_value(&reader, &e, b"r")? {
                        Some(reference) => CellCoord::from_a1_notation(&reference)?,
                        None => CellCoord::new(current_row, next_col),
                    };
                    next_col = coord.col + 1;

                    if let Some(style) = attr_value(&reader, &e, b"s")? {
                        layout.styles.insert(coord, style.parse()?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(layout)
}

/// 日付・時刻を表すビルトイン書式IDか
///
/// 14-22と45-47は標準の日付・時刻書式、27-36と50-58はロケール依存の日付書式です。
pub(crate) fn is_builtin_date_format(id: u16) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// ビルトイン書式ID（0-163）のマッピング
///
/// Excelの標準書式IDとフォーマット文字列の対応表です。
/// ロケール依存の書式（27-36、50-58など）は`None`を返します。
fn get_builtin_format(id: u16) -> Option<&'static str> {
    if id >= FIRST_CUSTOM_FORMAT_ID {
        return None;
    }
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        5 => Some("\"$\"#,##0_);(\"$\"#,##0)"),
        6 => Some("\"$\"#,##0_);[Red](\"$\"#,##0)"),
        7 => Some("\"$\"#,##0.00_);(\"$\"#,##0.00)"),
        8 => Some("\"$\"#,##0.00_);[Red](\"$\"#,##0.00)"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("m/d/yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0_);(#,##0)"),
        38 => Some("#,##0_);[Red](#,##0)"),
        39 => Some("#,##0.00_);(#,##0.00)"),
        40 => Some("#,##0.00_);[Red](#,##0.00)"),
        41 => Some("_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
        42 => Some("_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)"),
        43 => Some("_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
        44 => Some("_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mm:ss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_builtin_format() {
        assert_eq!(get_builtin_format(0), Some("General"));
        assert_eq!(get_builtin_format(1), Some("0"));
        assert_eq!(get_builtin_format(14), Some("m/d/yy"));
        assert_eq!(get_builtin_format(49), Some("@"));
        assert_eq!(get_builtin_format(50), None);
        assert_eq!(get_builtin_format(163), None);
        assert_eq!(get_builtin_format(164), None);
    }

    #[test]
    fn test_is_builtin_date_format() {
        for id in [14, 15, 22, 27, 36, 45, 46, 47, 50, 58] {
            assert!(is_builtin_date_format(id), "id {}", id);
        }
        for id in [0, 1, 13, 23, 26, 37, 44, 48, 49, 59, 164] {
            assert!(!is_builtin_date_format(id), "id {}", id);
        }
    }

    #[test]
    fn test_parse_styles_ignores_cell_style_xfs() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="2">
    <numFmt numFmtId="164" formatCode="yyyy/m/d"/>
    <numFmt numFmtId="165" formatCode="&quot;JPY&quot;#,##0"/>
  </numFmts>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="0" applyNumberFormat="1"><alignment horizontal="left"/></xf>
    <xf numFmtId="165" fontId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;
        let (formats, xfs) = parse_styles(xml).unwrap();
        assert_eq!(xfs, vec![0, 164, 165]);
        assert_eq!(formats.get(&164).map(String::as_str), Some("yyyy/m/d"));
        assert_eq!(formats.get(&165).map(String::as_str), Some("\"JPY\"#,##0"));
    }

    #[test]
    fn test_parse_workbook_sheets_and_epoch() {
        let xml = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="1"/>
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId1"/>
    <sheet name="Secret" sheetId="2" state="hidden" r:id="rId2"/>
    <sheet name="Deep &amp; Hidden" sheetId="3" state="veryHidden" r:id="rId3"/>
  </sheets>
</workbook>"#;
        let (sheets, is_1904) = parse_workbook(xml).unwrap();
        assert!(is_1904);
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].name, "Data");
        assert!(!sheets[0].hidden);
        assert_eq!(sheets[0].path.as_deref(), Some("rId1"));
        assert!(sheets[1].hidden);
        assert_eq!(sheets[2].name, "Deep & Hidden");
        assert!(sheets[2].hidden);
    }

    #[test]
    fn test_parse_relationships_and_resolve_target() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="worksheet" Target="/xl/worksheets/sheet2.xml"/>
</Relationships>"#;
        let targets = parse_relationships(xml).unwrap();
        assert_eq!(resolve_target(&targets["rId1"]), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target(&targets["rId2"]), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_parse_worksheet_layout() {
        let xml = br#"<worksheet>
  <cols>
    <col min="2" max="3" width="0" hidden="1"/>
    <col min="5" max="5" width="12"/>
  </cols>
  <sheetData>
    <row r="1"><c r="A1" s="1"><v>45658</v></c><c r="D1"><v>1</v></c></row>
    <row r="3" hidden="1"><c r="A3" s="2" t="s"><v>0</v></c></row>
    <row><c s="4"><v>1</v></c><c s="5"><v>2</v></c></row>
  </sheetData>
</worksheet>"#;
        let layout = parse_worksheet(xml).unwrap();
        assert_eq!(layout.hidden_cols.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(layout.hidden_rows.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(layout.styles.get(&CellCoord::new(0, 0)), Some(&1));
        assert_eq!(layout.styles.get(&CellCoord::new(0, 3)), None);
        assert_eq!(layout.styles.get(&CellCoord::new(2, 0)), Some(&2));
        // r属性のない行とセルは位置を推定する
        assert_eq!(layout.styles.get(&CellCoord::new(3, 0)), Some(&4));
        assert_eq!(layout.styles.get(&CellCoord::new(3, 1)), Some(&5));
    }

    #[test]
    fn test_escaped_sheet_name_resolves_layout() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "visible").unwrap();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("R&D <\"Q1\">").unwrap();
        worksheet.write_string(0, 0, "x").unwrap();
        worksheet.set_row_hidden(1).unwrap();
        worksheet.write_string(1, 0, "y").unwrap();
        worksheet.set_hidden(true);
        let data = workbook.save_to_buffer().unwrap();

        let parser = XlsxMetadataParser::new(&data).unwrap();
        assert!(parser.is_sheet_hidden("R&D <\"Q1\">"));
        let layout = parser.sheet_layout("R&D <\"Q1\">").unwrap();
        assert_eq!(layout.hidden_rows.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_invalid_archive_is_error() {
        let result = XlsxMetadataParser::new(b"not a zip file");
        assert!(matches!(result, Err(Excel2CsvError::Zip(_))));
    }
}
