//! Parser Module
//!
//! calamineとXMLメタデータ解析を組み合わせて、シートのセルデータを抽出します。

mod metadata;
mod workbook;

pub(crate) use metadata::{is_builtin_date_format, XlsxMetadataParser};
pub(crate) use workbook::WorkbookParser;
