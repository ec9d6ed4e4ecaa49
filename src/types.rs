//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;

use crate::error::{Excel2CsvError, Result};

/// Excelの最大列数（XFD列）
pub(crate) const MAX_COLUMNS: u32 = 16_384;

/// Excelの最大行数
pub(crate) const MAX_ROWS: u32 = 1_048_576;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 日付として読み込まれたシリアル値
    DateTime(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", Self::col_index_to_letter(self.col), self.row + 1)
    }

    /// A1形式の文字列から座標を生成（例: "C7" -> (6, 2)）
    ///
    /// `$`による絶対参照記号は無視します。
    pub fn from_a1_notation(reference: &str) -> Result<Self> {
        let cleaned: String = reference.trim().chars().filter(|&c| c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| invalid_reference(reference))?;
        let (letters, digits) = cleaned.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid_reference(reference));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid_reference(reference));
        }

        let col = Self::letter_to_col_index(letters).ok_or_else(|| invalid_reference(reference))?;
        let row: u32 = digits.parse()?;
        if row == 0 || row > MAX_ROWS {
            return Err(invalid_reference(reference));
        }

        Ok(Self::new(row - 1, col))
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }

    /// 列文字列をインデックスに変換（"A" -> 0, "AA" -> 26）
    fn letter_to_col_index(letters: &str) -> Option<u32> {
        let mut col: u32 = 0;
        for ch in letters.chars() {
            let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
            col = col.checked_mul(26)?.checked_add(digit)?;
            if col > MAX_COLUMNS {
                return None;
            }
        }
        Some(col - 1)
    }
}

fn invalid_reference(reference: &str) -> Excel2CsvError {
    Excel2CsvError::Config(format!("Invalid cell reference: '{}'", reference))
}

/// セル範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// "A1:C10"形式（または単一セル"B2"）の文字列から範囲を生成
    pub fn from_a1_notation(text: &str) -> Result<Self> {
        match text.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellCoord::from_a1_notation(start)?,
                CellCoord::from_a1_notation(end)?,
            )),
            None => {
                let coord = CellCoord::from_a1_notation(text)?;
                Ok(Self::new(coord, coord))
            }
        }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start.to_a1_notation())
        } else {
            write!(f, "{}:{}", self.start.to_a1_notation(), self.end.to_a1_notation())
        }
    }
}

/// セル結合範囲の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedRegion {
    /// 結合範囲
    pub range: CellRange,

    /// 親セル（左上セル）の座標
    pub parent: CellCoord,
}

impl MergedRegion {
    /// 新しい結合範囲を生成
    pub fn new(range: CellRange) -> Self {
        Self {
            parent: range.start,
            range,
        }
    }
}

/// パーサーから抽出された生のセルデータ
#[derive(Debug, Clone)]
pub(crate) struct RawCellData {
    /// セル座標（シート上の絶対座標）
    pub coord: CellCoord,

    /// セルの値
    pub value: CellValue,

    /// 数値書式ID（セルスタイルの`numFmtId`）
    pub format_id: Option<u16>,

    /// 書式文字列（ワークブック定義または組み込み書式）
    pub format_string: Option<String>,

    /// 数式文字列（`=`付き）
    pub formula: Option<String>,
}

impl RawCellData {
    /// 書式・数式なしのセルデータを生成
    pub fn new(coord: CellCoord, value: CellValue) -> Self {
        Self {
            coord,
            value,
            format_id: None,
            format_string: None,
            formula: None,
        }
    }
}

/// シートのメタデータ
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetMetadata {
    /// シート名
    pub name: String,

    /// ワークブック内のシート位置（0始まり）
    pub index: usize,

    /// シートが非表示かどうか
    pub hidden: bool,

    /// セル結合範囲のリスト
    pub merged_regions: Vec<MergedRegion>,

    /// 非表示行のインデックスリスト
    pub hidden_rows: Vec<u32>,

    /// 非表示列のインデックスリスト
    pub hidden_cols: Vec<u32>,

    /// 1904年エポックを使用するか（ワークブック全体の設定）
    pub is_1904: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coord_to_a1_notation() {
        assert_eq!(CellCoord::new(0, 0).to_a1_notation(), "A1");
        assert_eq!(CellCoord::new(0, 25).to_a1_notation(), "Z1");
        assert_eq!(CellCoord::new(0, 26).to_a1_notation(), "AA1");
        assert_eq!(CellCoord::new(99, 701).to_a1_notation(), "ZZ100");
        assert_eq!(CellCoord::new(0, 16_383).to_a1_notation(), "XFD1");
    }

    #[test]
    fn test_cell_coord_from_a1_notation() {
        assert_eq!(CellCoord::from_a1_notation("A1").unwrap(), CellCoord::new(0, 0));
        assert_eq!(CellCoord::from_a1_notation("c7").unwrap(), CellCoord::new(6, 2));
        assert_eq!(CellCoord::from_a1_notation("$AA$10").unwrap(), CellCoord::new(9, 26));
        assert_eq!(
            CellCoord::from_a1_notation("XFD1048576").unwrap(),
            CellCoord::new(1_048_575, 16_383)
        );
    }

    #[test]
    fn test_cell_coord_from_a1_notation_invalid() {
        for text in ["", "A", "12", "A0", "1A", "A1B", "XFE1", "A1048577", "Ä1"] {
            assert!(
                CellCoord::from_a1_notation(text).is_err(),
                "'{}' should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_cell_range_from_a1_notation() {
        let range = CellRange::from_a1_notation("B2:D10").unwrap();
        assert_eq!(range.start, CellCoord::new(1, 1));
        assert_eq!(range.end, CellCoord::new(9, 3));
        assert_eq!(range.to_string(), "B2:D10");

        let single = CellRange::from_a1_notation("C3").unwrap();
        assert_eq!(single.start, single.end);
        assert_eq!(single.to_string(), "C3");

        assert!(CellRange::from_a1_notation("A1:").is_err());
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(10, 5));

        assert!(range.contains(CellCoord::new(0, 0)));
        assert!(range.contains(CellCoord::new(10, 5)));
        assert!(!range.contains(CellCoord::new(11, 5)));
        assert!(!range.contains(CellCoord::new(5, 6)));
    }

    #[test]
    fn test_merged_region_parent_is_top_left() {
        let range = CellRange::new(CellCoord::new(2, 1), CellCoord::new(3, 4));
        let merged = MergedRegion::new(range);
        assert_eq!(merged.parent, CellCoord::new(2, 1));
        assert_eq!(merged.range.end, CellCoord::new(3, 4));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_a1_notation_round_trip(row in 0u32..MAX_ROWS, col in 0u32..MAX_COLUMNS) {
                let coord = CellCoord::new(row, col);
                let a1 = coord.to_a1_notation();
                prop_assert_eq!(CellCoord::from_a1_notation(&a1).unwrap(), coord);
            }

            #[test]
            fn test_a1_notation_column_order(col in 0u32..MAX_COLUMNS - 1) {
                // 列番号の増加はA1記法の列部分の（長さ, 辞書順）の増加と一致する
                let a = CellCoord::new(0, col).to_a1_notation();
                let b = CellCoord::new(0, col + 1).to_a1_notation();
                let key = |s: &str| {
                    let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
                    (letters.len(), letters)
                };
                prop_assert!(key(&a) < key(&b));
            }
        }
    }
}
