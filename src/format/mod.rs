//! Format Module
//!
//! Excel Number Format Stringの構文解析と適用を提供します。

mod datetime;
mod general;
mod parser;
mod sections;
mod tokens;

pub(crate) use datetime::serial_to_datetime;
pub(crate) use general::format_general;
pub(crate) use parser::FormatParser;
