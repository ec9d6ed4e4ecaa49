//! General Format Module
//!
//! Excelの"General"書式による数値の表示を提供します。

/// 指数表記に切り替える上限
const SCIENTIFIC_UPPER: f64 = 1e11;

/// 指数表記に切り替える下限
const SCIENTIFIC_LOWER: f64 = 1e-9;

/// "General"書式で数値を文字列化
///
/// - 有効桁数は10桁、末尾の0は表示しない
/// - 絶対値が1e11以上、または1e-9未満の場合は指数表記（例: `1.23457E+11`）
pub(crate) fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if abs >= SCIENTIFIC_UPPER || abs < SCIENTIFIC_LOWER {
        return format_scientific(value);
    }

    let magnitude = abs.log10().floor() as i32;
    let text = if magnitude >= 10 {
        // 11桁の整数部を10桁に丸める
        format!("{:.0}", (value / 10.0).round() * 10.0)
    } else {
        let decimals = (9 - magnitude).clamp(0, 10) as usize;
        format!("{:.*}", decimals, value)
    };

    trim_fraction(&text)
}

/// 仮数部は最大6桁（小数5桁）、指数部は符号付き2桁以上
fn format_scientific(value: f64) -> String {
    let text = format!("{:.5e}", value);
    let (mantissa, exponent) = match text.split_once('e') {
        Some(parts) => parts,
        None => return text,
    };

    let mantissa = trim_fraction(mantissa);
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", mantissa, sign, exponent.abs())
}

/// 小数部末尾の0と小数点を取り除く
fn trim_fraction(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
