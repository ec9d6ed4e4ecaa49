//! Grid Module
//!
//! スパースなセルデータから、CSVの行構造への変換を提供するモジュール。
//! 行・列の欠落の補完、非表示行・列の除外、範囲指定、セル結合の処理戦略を実装します。

use std::collections::BTreeMap;

use crate::api::MergeStrategy;
use crate::types::{CellCoord, CellRange, MergedRegion, SheetMetadata};

/// 論理的なグリッド構造
///
/// 各行は最後の値を持つセルまでのフィールドを持ちます（行末の空フィールドは持たない）。
/// 最後の値を持つ行より後の行は含まれません。
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LogicalGrid {
    /// グリッドデータ（行ごとに長さが異なる）
    rows: Vec<Vec<String>>,
}

impl LogicalGrid {
    /// フォーマット済みのスパースなセルデータからグリッドを構築
    ///
    /// # 引数
    ///
    /// * `formatted_cells` - フォーマット済みセルデータ（シート上の絶対座標と内容のペア）
    /// * `metadata` - シートのメタデータ（結合セル、非表示行・列）
    /// * `merge_strategy` - セル結合の処理戦略
    /// * `include_hidden` - 非表示行・列を出力に含めるかどうか
    /// * `range` - 出力範囲（指定時は範囲の左上が出力の原点になる）
    ///
    /// # 戻り値
    ///
    /// 構築されたグリッド
    pub fn build(
        formatted_cells: Vec<(CellCoord, String)>,
        metadata: &SheetMetadata,
        merge_strategy: MergeStrategy,
        include_hidden: bool,
        range: Option<&CellRange>,
    ) -> Self {
        let mut cells: BTreeMap<CellCoord, String> = formatted_cells
            .into_iter()
            .filter(|(_, content)| !content.is_empty())
            .collect();

        if merge_strategy == MergeStrategy::Duplicate {
            apply_data_duplication(&mut cells, &metadata.merged_regions, range);
        }

        let origin = range.map_or(CellCoord::new(0, 0), |r| r.start);
        let (hidden_rows, hidden_cols): (&[u32], &[u32]) = if include_hidden {
            (&[], &[])
        } else {
            (&metadata.hidden_rows, &metadata.hidden_cols)
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (coord, content) in cells {
            if range.is_some_and(|r| !r.contains(coord)) {
                continue;
            }
            let (Some(row), Some(col)) = (
                compact_index(coord.row, origin.row, hidden_rows),
                compact_index(coord.col, origin.col, hidden_cols),
            ) else {
                continue;
            };

            let (row, col) = (row as usize, col as usize);
            if rows.len() <= row {
                rows.resize_with(row + 1, Vec::new);
            }
            let fields = &mut rows[row];
            if fields.len() <= col {
                fields.resize_with(col + 1, String::new);
            }
            fields[col] = content;
        }

        Self { rows }
    }

    /// 行数を取得（途中の空行を含む）
    pub(crate) fn get_rows(&self) -> usize {
        self.rows.len()
    }

    /// 最も長い行のフィールド数を取得
    pub(crate) fn get_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 値を持つセルの数を取得
    pub(crate) fn get_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|content| !content.is_empty())
            .count()
    }

    /// 行ごとのフィールドを取得
    pub(crate) fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// 出力上のインデックスを計算
///
/// 原点より前、または非表示の場合は`None`。
/// 原点から対象までにある非表示のインデックスの数だけ詰める。
fn compact_index(index: u32, origin: u32, hidden: &[u32]) -> Option<u32> {
    if index < origin || hidden.binary_search(&index).is_ok() {
        return None;
    }
    let hidden_before =
        hidden.partition_point(|&h| h < index) - hidden.partition_point(|&h| h < origin);
    Some(index - origin - hidden_before as u32)
}

/// データ重複フィル戦略を適用
///
/// 結合セル範囲内のすべてのセルに親セル（左上）の値を複製します。
/// 出力範囲が指定されている場合は、その範囲と重なる部分のみを埋めます。
fn apply_data_duplication(
    cells: &mut BTreeMap<CellCoord, String>,
    merged_regions: &[MergedRegion],
    range: Option<&CellRange>,
) {
    for region in merged_regions {
        let Some(parent_content) = cells.get(&region.parent).cloned() else {
            continue;
        };

        let mut start = region.range.start;
        let mut end = region.range.end;
        if let Some(range) = range {
            start = CellCoord::new(start.row.max(range.start.row), start.col.max(range.start.col));
            end = CellCoord::new(end.row.min(range.end.row), end.col.min(range.end.col));
        }

        for row in start.row..=end.row {
            for col in start.col..=end.col {
                let coord = CellCoord::new(row, col);
                if coord != region.parent {
                    cells.insert(coord, parent_content.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32, content: &str) -> (CellCoord, String) {
        (CellCoord::new(row, col), content.to_string())
    }

    fn metadata() -> SheetMetadata {
        SheetMetadata {
            name: "Sheet1".to_string(),
            ..Default::default()
        }
    }

    fn rows(grid: &LogicalGrid) -> Vec<Vec<&str>> {
        grid.iter_rows()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect()
    }

    fn build(cells: Vec<(CellCoord, String)>, metadata: &SheetMetadata) -> LogicalGrid {
        LogicalGrid::build(cells, metadata, MergeStrategy::Keep, true, None)
    }

    #[test]
    fn test_build_empty_grid() {
        let grid = build(vec![], &metadata());
        assert_eq!(grid.get_rows(), 0);
        assert_eq!(grid.get_cols(), 0);
        assert_eq!(grid.get_cell_count(), 0);
    }

    #[test]
    fn test_leading_and_intermediate_rows_are_empty() {
        let grid = build(vec![cell(1, 0, "a"), cell(3, 1, "b")], &metadata());
        assert_eq!(rows(&grid), vec![vec![], vec!["a"], vec![], vec!["", "b"]]);
    }

    #[test]
    fn test_rows_are_ragged() {
        let grid = build(
            vec![cell(0, 0, "a"), cell(0, 2, "c"), cell(1, 0, "x")],
            &metadata(),
        );
        assert_eq!(rows(&grid), vec![vec!["a", "", "c"], vec!["x"]]);
        assert_eq!(grid.get_cols(), 3);
        assert_eq!(grid.get_cell_count(), 3);
    }

    #[test]
    fn test_empty_content_is_trimmed() {
        let grid = build(
            vec![cell(0, 0, "a"), cell(0, 1, ""), cell(1, 0, "")],
            &metadata(),
        );
        assert_eq!(rows(&grid), vec![vec!["a"]]);
    }

    #[test]
    fn test_merge_keep_leaves_cells_empty() {
        let mut meta = metadata();
        meta.merged_regions = vec![MergedRegion::new(CellRange::new(
            CellCoord::new(0, 0),
            CellCoord::new(0, 2),
        ))];
        let cells = vec![cell(0, 0, "Header"), cell(1, 0, "a"), cell(1, 2, "c")];
        let grid = LogicalGrid::build(cells, &meta, MergeStrategy::Keep, true, None);
        assert_eq!(rows(&grid), vec![vec!["Header"], vec!["a", "", "c"]]);
    }

    #[test]
    fn test_merge_duplicate_fills_region() {
        let mut meta = metadata();
        meta.merged_regions = vec![MergedRegion::new(CellRange::new(
            CellCoord::new(0, 0),
            CellCoord::new(1, 1),
        ))];
        let cells = vec![cell(0, 0, "M"), cell(2, 0, "z")];
        let grid = LogicalGrid::build(cells, &meta, MergeStrategy::Duplicate, true, None);
        assert_eq!(rows(&grid), vec![vec!["M", "M"], vec!["M", "M"], vec!["z"]]);
    }

    #[test]
    fn test_merge_duplicate_with_empty_anchor() {
        let mut meta = metadata();
        meta.merged_regions = vec![MergedRegion::new(CellRange::new(
            CellCoord::new(0, 0),
            CellCoord::new(0, 1),
        ))];
        let grid = LogicalGrid::build(vec![], &meta, MergeStrategy::Duplicate, true, None);
        assert_eq!(grid.get_rows(), 0);
    }

    #[test]
    fn test_hidden_rows_and_cols_are_removed() {
        let mut meta = metadata();
        meta.hidden_rows = vec![1];
        meta.hidden_cols = vec![0];
        let cells = vec![
            cell(0, 0, "a0"),
            cell(0, 1, "b0"),
            cell(1, 1, "b1"),
            cell(2, 2, "c2"),
        ];

        let grid = LogicalGrid::build(cells.clone(), &meta, MergeStrategy::Keep, false, None);
        assert_eq!(rows(&grid), vec![vec!["b0"], vec!["", "c2"]]);

        // include_hidden = true ではそのまま出力される
        let grid = LogicalGrid::build(cells, &meta, MergeStrategy::Keep, true, None);
        assert_eq!(
            rows(&grid),
            vec![vec!["a0", "b0"], vec!["", "b1"], vec!["", "", "c2"]]
        );
    }

    #[test]
    fn test_range_is_relative_to_top_left() {
        let range = CellRange::from_a1_notation("B2:C3").unwrap();
        let cells = vec![
            cell(0, 0, "out"),
            cell(1, 1, "b2"),
            cell(2, 2, "c3"),
            cell(3, 3, "out"),
            cell(2, 0, "out"),
        ];
        let grid = LogicalGrid::build(cells, &metadata(), MergeStrategy::Keep, true, Some(&range));
        assert_eq!(rows(&grid), vec![vec!["b2"], vec!["", "c3"]]);
    }

    #[test]
    fn test_range_starts_with_empty_rows() {
        let range = CellRange::from_a1_notation("A1:B5").unwrap();
        let grid = LogicalGrid::build(
            vec![cell(2, 1, "x")],
            &metadata(),
            MergeStrategy::Keep,
            true,
            Some(&range),
        );
        assert_eq!(rows(&grid), vec![vec![], vec![], vec!["", "x"]]);
    }

    #[test]
    fn test_range_with_hidden_rows_and_duplicate_merge() {
        let mut meta = metadata();
        meta.hidden_rows = vec![0, 2];
        meta.merged_regions = vec![MergedRegion::new(CellRange::new(
            CellCoord::new(1, 0),
            CellCoord::new(3, 0),
        ))];
        let range = CellRange::from_a1_notation("A2:B4").unwrap();
        let cells = vec![cell(1, 0, "m"), cell(3, 1, "x")];
        let grid =
            LogicalGrid::build(cells, &meta, MergeStrategy::Duplicate, false, Some(&range));
        // 2行目→出力0、3行目は非表示、4行目→出力1（結合の複製先も詰められる）
        assert_eq!(rows(&grid), vec![vec!["m"], vec!["m", "x"]]);
    }

    #[test]
    fn test_compact_index() {
        let hidden = [1, 3, 4];
        assert_eq!(compact_index(0, 0, &hidden), Some(0));
        assert_eq!(compact_index(1, 0, &hidden), None);
        assert_eq!(compact_index(2, 0, &hidden), Some(1));
        assert_eq!(compact_index(5, 0, &hidden), Some(2));
        assert_eq!(compact_index(5, 2, &hidden), Some(1));
        assert_eq!(compact_index(1, 2, &hidden), None);
    }
}
