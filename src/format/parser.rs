//! FormatParser Module
//!
//! Excel Number Format Stringの構文解析と適用を提供します。

use crate::error::{Excel2CsvError, Result};

use super::datetime::{render_datetime, serial_to_datetime};
use super::general::format_general;
use super::sections::{Condition, FormatSection, SectionKind};
use super::tokens::{AmPmStyle, DigitKind, ElapsedUnit, FormatToken};

/// Number Format Stringパーサー
///
/// Excel Number Format Stringを解析し、数値をフォーマットします。
///
/// # 使用例
///
/// ```rust,ignore
/// let parser = FormatParser::parse("#,##0.00")?;
/// assert_eq!(parser.format_number(1234.5, false), "1,234.50");
/// ```
#[derive(Debug, Clone)]
pub(crate) struct FormatParser {
    /// パースされたセクション（最低1つ）
    sections: Vec<FormatSection>,
}

impl FormatParser {
    /// フォーマット文字列をパース
    ///
    /// 空文字列と"General"は"General"書式として扱います。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Self)` - パース成功
    /// * `Err(Excel2CsvError::Config)` - 引用符やブラケットが閉じていない場合
    pub fn parse(format_string: &str) -> Result<Self> {
        let trimmed = format_string.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("General") {
            let mut section = FormatSection::new(SectionKind::Positive);
            section.tokens.push(FormatToken::General);
            return Ok(Self {
                sections: vec![section],
            });
        }

        let mut sections = Vec::new();
        for (idx, section_str) in Self::split_sections(format_string)
            .iter()
            .enumerate()
            .take(4)
        {
            let kind = match idx {
                0 => SectionKind::Positive,
                1 => SectionKind::Negative,
                2 => SectionKind::Zero,
                _ => SectionKind::Text,
            };

            let mut section = Self::parse_section(section_str, kind)?;
            if idx > 0 && section.is_text_only() {
                section.kind = SectionKind::Text;
            }
            sections.push(section);
        }

        Ok(Self { sections })
    }

    /// セクションに分割
    ///
    /// 引用符・ブラケット内とエスケープされた`;`は区切りとみなしません。
    /// 空のセクションも保持します（"0;;"はゼロを空文字で表示する）。
    fn split_sections(format_string: &str) -> Vec<String> {
        let mut sections = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_brackets = false;
        let mut chars = format_string.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '"' if !in_brackets => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '\\' if !in_quotes && !in_brackets => {
                    current.push(ch);
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '[' if !in_quotes => {
                    in_brackets = true;
                    current.push(ch);
                }
                ']' if !in_quotes => {
                    in_brackets = false;
                    current.push(ch);
                }
                ';' if !in_quotes && !in_brackets => {
                    sections.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }

        sections.push(current);
        sections
    }

    /// セクションをパース
    ///
    /// # 引数
    ///
    /// * `section_str` - セクション文字列
    /// * `kind` - セクションの種類
    fn parse_section(section_str: &str, kind: SectionKind) -> Result<FormatSection> {
        let mut section = FormatSection::new(kind);
        let chars: Vec<char> = section_str.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            match ch {
                '"' => {
                    let end = chars[i + 1..]
                        .iter()
                        .position(|&c| c == '"')
                        .ok_or_else(|| invalid_format(section_str, "unterminated quote"))?;
                    let literal: String = chars[i + 1..i + 1 + end].iter().collect();
                    section.tokens.push(FormatToken::Literal(literal));
                    i += end + 2;
                    continue;
                }
                '[' => {
                    let end = chars[i + 1..]
                        .iter()
                        .position(|&c| c == ']')
                        .ok_or_else(|| invalid_format(section_str, "unterminated bracket"))?;
                    let content: String = chars[i + 1..i + 1 + end].iter().collect();
                    Self::parse_bracket(&content, &mut section);
                    i += end + 2;
                    continue;
                }
                '\\' => {
                    if let Some(&next) = chars.get(i + 1) {
                        section.tokens.push(FormatToken::Literal(next.to_string()));
                    }
                    i += 2;
                    continue;
                }
                // "_x"は文字xの幅の空白、"*x"は繰り返し埋め（CSVでは無視）
                '_' => {
                    section.tokens.push(FormatToken::Literal(" ".to_string()));
                    i += 2;
                    continue;
                }
                '*' => {
                    i += 2;
                    continue;
                }
                '@' => section.tokens.push(FormatToken::TextPlaceholder),
                '0' => section.tokens.push(FormatToken::Digit(DigitKind::Zero)),
                '#' => section.tokens.push(FormatToken::Digit(DigitKind::Hash)),
                '?' => section.tokens.push(FormatToken::Digit(DigitKind::Question)),
                '.' => {
                    let after_seconds = section
                        .tokens
                        .iter()
                        .rev()
                        .find(|t| t.is_datetime())
                        .is_some_and(|t| {
                            matches!(
                                t,
                                FormatToken::Second(_)
                                    | FormatToken::Elapsed(ElapsedUnit::Seconds, _)
                            )
                        });
                    let zeros = count_run(&chars, i + 1, '0');
                    if after_seconds && zeros > 0 {
                        section.tokens.push(FormatToken::SubSecond(zeros));
                        i += 1 + zeros;
                        continue;
                    }
                    if in_datetime(&section) {
                        section.tokens.push(FormatToken::Literal(".".to_string()));
                    } else {
                        section.tokens.push(FormatToken::DecimalPoint);
                    }
                }
                ',' => {
                    if in_datetime(&section) {
                        section.tokens.push(FormatToken::Literal(",".to_string()));
                    } else {
                        section.tokens.push(FormatToken::ThousandSeparator);
                    }
                }
                '%' => section.tokens.push(FormatToken::Percent),
                '/' => {
                    if section.tokens.iter().any(|t| matches!(t, FormatToken::Digit(_))) {
                        section.tokens.push(FormatToken::FractionSlash);
                    } else {
                        section.tokens.push(FormatToken::Literal("/".to_string()));
                    }
                }
                'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                    section
                        .tokens
                        .push(FormatToken::Exponent(chars[i + 1] == '+'));
                    i += 2;
                    continue;
                }
                'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => {
                    let lower = ch.to_ascii_lowercase();
                    let count = count_run(&chars, i, lower);
                    let token = match lower {
                        'y' => FormatToken::Year(count),
                        // 分か月かは全トークンが揃ってから判定する
                        'm' => FormatToken::Month(count),
                        'd' => FormatToken::Day(count),
                        'h' => FormatToken::Hour(count),
                        _ => FormatToken::Second(count),
                    };
                    section.tokens.push(token);
                    i += count;
                    continue;
                }
                'A' | 'a' if starts_with_ignore_case(&chars[i..], "AM/PM") => {
                    section.tokens.push(FormatToken::AmPm(AmPmStyle::Full {
                        lowercase: ch.is_ascii_lowercase(),
                    }));
                    i += 5;
                    continue;
                }
                'A' | 'a' if starts_with_ignore_case(&chars[i..], "A/P") => {
                    section.tokens.push(FormatToken::AmPm(AmPmStyle::Short {
                        lowercase: ch.is_ascii_lowercase(),
                    }));
                    i += 3;
                    continue;
                }
                'G' | 'g' if starts_with_ignore_case(&chars[i..], "General") => {
                    section.tokens.push(FormatToken::General);
                    i += 7;
                    continue;
                }
                _ => section.tokens.push(FormatToken::Literal(ch.to_string())),
            }
            i += 1;
        }

        Self::resolve_minutes(&mut section.tokens);
        Ok(section)
    }

    /// ブラケット内の指定を解析
    ///
    /// `[$€-407]`の通貨記号はリテラル、ロケール指定のみ（`[$-411]`）は無視。
    fn parse_bracket(content: &str, section: &mut FormatSection) {
        if let Some(currency) = content.strip_prefix('$') {
            let symbol = currency.split('-').next().unwrap_or_default();
            if !symbol.is_empty() {
                section.tokens.push(FormatToken::Literal(symbol.to_string()));
            }
            return;
        }

        let lower = content.to_ascii_lowercase();
        if let Some(first) = lower.chars().next() {
            if matches!(first, 'h' | 'm' | 's') && lower.chars().all(|c| c == first) {
                let unit = match first {
                    'h' => ElapsedUnit::Hours,
                    'm' => ElapsedUnit::Minutes,
                    _ => ElapsedUnit::Seconds,
                };
                section.tokens.push(FormatToken::Elapsed(unit, lower.len()));
                return;
            }
        }

        if let Some(condition) = Condition::parse(content) {
            section.condition = Some(condition);
        } else if content.starts_with(|c: char| c.is_alphabetic()) {
            section.tokens.push(FormatToken::Color(content.to_string()));
        }
    }

    /// "m"/"mm"を、直前が時または直後が秒の場合に分として扱う
    fn resolve_minutes(tokens: &mut [FormatToken]) {
        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_datetime())
            .map(|(i, _)| i)
            .collect();

        for (k, &pos) in positions.iter().enumerate() {
            if let FormatToken::Month(count) = tokens[pos] {
                if count > 2 {
                    continue;
                }
                let after_hour = k > 0
                    && matches!(
                        tokens[positions[k - 1]],
                        FormatToken::Hour(_) | FormatToken::Elapsed(ElapsedUnit::Hours, _)
                    );
                let before_second = positions.get(k + 1).is_some_and(|&next| {
                    matches!(
                        tokens[next],
                        FormatToken::Second(_) | FormatToken::Elapsed(ElapsedUnit::Seconds, _)
                    )
                });
                if after_hour || before_second {
                    tokens[pos] = FormatToken::Minute(count);
                }
            }
        }
    }

    /// 日付書式かどうか（先頭セクションが日付・時刻トークンのみで構成される）
    pub fn is_date_format(&self) -> bool {
        self.sections.first().is_some_and(|s| s.is_datetime())
    }

    /// 先頭セクションに年月日の要素があるか
    pub fn has_date_part(&self) -> bool {
        self.sections
            .first()
            .is_some_and(|s| s.tokens.iter().any(|t| t.is_date_part()))
    }

    /// 先頭セクションに時刻の要素があるか
    pub fn has_time_part(&self) -> bool {
        self.sections
            .first()
            .is_some_and(|s| s.tokens.iter().any(|t| t.is_time_part()))
    }

    /// 先頭セクションが経過時間（`[h]`など）を含むか
    pub fn has_elapsed(&self) -> bool {
        self.sections.first().is_some_and(|s| {
            s.tokens
                .iter()
                .any(|t| matches!(t, FormatToken::Elapsed(..)))
        })
    }

    /// 数値をフォーマット
    ///
    /// # 引数
    ///
    /// * `value` - フォーマットする数値（日付書式ではExcelシリアル値）
    /// * `is_1904` - ワークブックが1904年方式か
    pub fn format_number(&self, value: f64, is_1904: bool) -> String {
        let Some((section, keep_sign)) = self.select_section(value) else {
            return format_general(value);
        };
        let value = if keep_sign { value } else { value.abs() };

        if section.is_general() {
            return render_with_literals(&section.tokens, &format_general(value));
        }
        if section.is_text_only() {
            return format_general(value);
        }
        if section.is_datetime() {
            return match serial_to_datetime(value, is_1904, section.sub_second_digits()) {
                Some(datetime) => render_datetime(&section.tokens, value, &datetime),
                None => format_general(value),
            };
        }
        if section.is_numeric() {
            return render_numeric(section, value);
        }

        // リテラルのみのセクション（例: ゼロを"-"で表示）
        render_with_literals(&section.tokens, "")
    }

    /// 値に対応するセクションを選択
    ///
    /// # 戻り値
    ///
    /// 選択されたセクションと、負号を出力に含めるかどうか。
    /// 負数用セクション・ゼロ用セクションが選ばれた場合は絶対値で表示する。
    fn select_section(&self, value: f64) -> Option<(&FormatSection, bool)> {
        let numeric: Vec<&FormatSection> = self
            .sections
            .iter()
            .filter(|s| s.kind != SectionKind::Text)
            .collect();
        let first = *numeric.first()?;

        if numeric.iter().any(|s| s.condition.is_some()) {
            for section in numeric.iter().take(3) {
                match section.condition {
                    Some(condition) if condition.matches(value) => return Some((*section, true)),
                    Some(_) => continue,
                    None => return Some((*section, true)),
                }
            }
            return Some((first, true));
        }

        if value < 0.0 {
            return Some(match numeric.get(1) {
                Some(section) => (*section, false),
                None => (first, true),
            });
        }
        if value == 0.0 {
            if let Some(section) = numeric.get(2) {
                return Some((*section, false));
            }
        }
        Some((first, true))
    }
}

/// 日付・時刻トークンの後（数値プレースホルダーなし）では`.`と`,`を区切り文字として扱う
fn in_datetime(section: &FormatSection) -> bool {
    section.tokens.iter().any(|t| t.is_datetime())
        && !section.tokens.iter().any(|t| matches!(t, FormatToken::Digit(_)))
}

fn invalid_format(format: &str, reason: &str) -> Excel2CsvError {
    Excel2CsvError::Config(format!("Invalid number format '{}': {}", format, reason))
}

/// `start`位置から`target`（大文字小文字無視）が連続する数
fn count_run(chars: &[char], start: usize, target: char) -> usize {
    chars[start.min(chars.len())..]
        .iter()
        .take_while(|c| c.to_ascii_lowercase() == target)
        .count()
}

fn starts_with_ignore_case(chars: &[char], pattern: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    chars.len() >= pattern.len()
        && chars
            .iter()
            .zip(pattern.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// "General"や"@"の位置に`text`を埋め込み、リテラルを連結する
fn render_with_literals(tokens: &[FormatToken], text: &str) -> String {
    let mut result = String::new();
    for token in tokens {
        match token {
            FormatToken::General | FormatToken::TextPlaceholder => result.push_str(text),
            FormatToken::Literal(s) => result.push_str(s),
            _ => {}
        }
    }
    result
}

/// 数値トークン以外の装飾（リテラル、パーセント記号）を出力
fn push_decoration(out: &mut String, token: &FormatToken) {
    match token {
        FormatToken::Literal(s) => out.push_str(s),
        FormatToken::Percent => out.push('%'),
        _ => {}
    }
}

fn count_digits(tokens: &[FormatToken]) -> usize {
    tokens
        .iter()
        .filter(|t| matches!(t, FormatToken::Digit(_)))
        .count()
}

fn render_numeric(section: &FormatSection, value: f64) -> String {
    let tokens = &section.tokens;
    if tokens.iter().any(|t| matches!(t, FormatToken::Exponent(_))) {
        render_scientific(tokens, value)
    } else if tokens.contains(&FormatToken::FractionSlash) {
        render_fraction(section, value)
    } else {
        render_fixed(tokens, value)
    }
}

/// 小数点の前後でトークン列を分割
fn split_at_point(tokens: &[FormatToken]) -> (&[FormatToken], &[FormatToken]) {
    match tokens.iter().position(|t| *t == FormatToken::DecimalPoint) {
        Some(pos) => (&tokens[..pos], &tokens[pos + 1..]),
        None => (tokens, &[]),
    }
}

/// `,`を解析し、(桁区切りの有無, 1000で割る回数)を返す
///
/// 整数部の数字の間にある`,`は桁区切り、最後のプレースホルダー直後に続く`,`は
/// 1つにつき1000での除算になる。
fn thousands(tokens: &[FormatToken]) -> (bool, i32) {
    let (int_tokens, _) = split_at_point(tokens);
    let last_int_digit = int_tokens
        .iter()
        .rposition(|t| matches!(t, FormatToken::Digit(_)));
    let grouping = last_int_digit.is_some_and(|last| {
        int_tokens[..last].contains(&FormatToken::ThousandSeparator)
    });

    let scale = tokens
        .iter()
        .rposition(|t| matches!(t, FormatToken::Digit(_)))
        .map_or(0, |last| {
            tokens[last + 1..]
                .iter()
                .take_while(|t| **t == FormatToken::ThousandSeparator)
                .count()
        });
    (grouping, scale as i32)
}

/// 有効数字15桁に揃えた後、小数点以下`decimals`桁で四捨五入する
///
/// # 戻り値
///
/// (整数部の数字列, 小数部の数字列)。整数部に先頭の0は含まない（ゼロなら空）。
fn round_decimal(abs: f64, decimals: usize) -> (String, String) {
    let text = format!("{:.14e}", abs);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
    let exponent: i64 = exponent.parse().unwrap_or(0);
    let mut digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    let mut point = exponent + 1;
    if point <= 0 {
        let mut padded = vec![0; (-point) as usize];
        padded.append(&mut digits);
        digits = padded;
        point = 0;
    }
    let mut point = point as usize;
    if digits.len() < point {
        digits.resize(point, 0);
    }

    let keep = point + decimals;
    if keep < digits.len() {
        let round_up = digits[keep] >= 5;
        digits.truncate(keep);
        if round_up {
            let mut idx = keep;
            loop {
                if idx == 0 {
                    digits.insert(0, 1);
                    point += 1;
                    break;
                }
                idx -= 1;
                if digits[idx] == 9 {
                    digits[idx] = 0;
                } else {
                    digits[idx] += 1;
                    break;
                }
            }
        }
    } else {
        digits.resize(keep, 0);
    }

    let to_text = |ds: &[u8]| ds.iter().map(|d| (b'0' + d) as char).collect::<String>();
    let integer = to_text(&digits[..point]);
    let integer = integer.trim_start_matches('0').to_string();
    (integer, to_text(&digits[point..]))
}

/// 整数部のプレースホルダーに数字を右詰めで割り当てて出力
fn render_integer(out: &mut String, tokens: &[FormatToken], integer: &str, grouping: bool) {
    let digits: Vec<char> = integer.chars().collect();
    let n = count_digits(tokens);
    let m = digits.len();

    let push_digit = |out: &mut String, ch: char, pos: usize| {
        out.push(ch);
        if grouping && pos > 0 && pos % 3 == 0 {
            out.push(',');
        }
    };

    let mut k = 0;
    for token in tokens {
        match token {
            FormatToken::Digit(kind) => {
                let pos = n - 1 - k;
                if k == 0 && m > n {
                    for (j, &ch) in digits[..=m - n].iter().enumerate() {
                        push_digit(out, ch, m - 1 - j);
                    }
                } else if m + k >= n {
                    push_digit(out, digits[m + k - n], pos);
                } else {
                    match kind {
                        DigitKind::Zero => push_digit(out, '0', pos),
                        DigitKind::Question => out.push(' '),
                        DigitKind::Hash => {}
                    }
                }
                k += 1;
            }
            other => push_decoration(out, other),
        }
    }

    if n == 0 {
        out.push_str(integer);
    }
}

/// 小数部のプレースホルダーに数字を左詰めで割り当てて出力
fn render_fraction_digits(out: &mut String, tokens: &[FormatToken], fraction: &str) {
    let digits: Vec<char> = fraction.chars().collect();
    let kinds: Vec<DigitKind> = tokens
        .iter()
        .filter_map(|t| match t {
            FormatToken::Digit(kind) => Some(*kind),
            _ => None,
        })
        .collect();
    // 末尾の0は`#`と`?`の位置では表示しない
    let significant = (0..kinds.len())
        .rev()
        .find(|&q| kinds[q] == DigitKind::Zero || digits.get(q).is_some_and(|&d| d != '0'))
        .map_or(0, |q| q + 1);

    let mut q = 0;
    for token in tokens {
        match token {
            FormatToken::Digit(kind) => {
                if q < significant {
                    out.push(digits.get(q).copied().unwrap_or('0'));
                } else if *kind == DigitKind::Question {
                    out.push(' ');
                }
                q += 1;
            }
            other => push_decoration(out, other),
        }
    }
}

fn render_fixed(tokens: &[FormatToken], value: f64) -> String {
    let (int_tokens, frac_tokens) = split_at_point(tokens);
    let has_point = tokens.contains(&FormatToken::DecimalPoint);
    let (grouping, scale) = thousands(tokens);
    let percents = tokens.iter().filter(|t| **t == FormatToken::Percent).count() as i32;

    let scaled = value * 100f64.powi(percents) / 1000f64.powi(scale);
    let decimals = count_digits(frac_tokens);
    let (integer, fraction) = round_decimal(scaled.abs(), decimals);

    // 0に丸められる負の値も符号を残す（例: -0.04 -> "-0.0"）
    let mut out = String::new();
    if scaled < 0.0 {
        out.push('-');
    }

    render_integer(&mut out, int_tokens, &integer, grouping);
    if has_point {
        out.push('.');
        render_fraction_digits(&mut out, frac_tokens, &fraction);
    }
    out
}

fn render_scientific(tokens: &[FormatToken], value: f64) -> String {
    let exp_pos = tokens
        .iter()
        .position(|t| matches!(t, FormatToken::Exponent(_)))
        .unwrap_or(tokens.len());
    let (mantissa_tokens, rest) = tokens.split_at(exp_pos);
    let plus = matches!(rest.first(), Some(FormatToken::Exponent(true)));
    let exponent_tokens = rest.get(1..).unwrap_or_default();

    let (int_tokens, frac_tokens) = split_at_point(mantissa_tokens);
    let has_point = mantissa_tokens.contains(&FormatToken::DecimalPoint);
    let int_places = count_digits(int_tokens).max(1) as i32;
    let engineering = int_places > 1
        && int_tokens.contains(&FormatToken::Digit(DigitKind::Hash));
    let decimals = count_digits(frac_tokens);
    let abs = value.abs();

    let exponent_for = |magnitude: i32| {
        if engineering {
            magnitude - magnitude.rem_euclid(int_places)
        } else {
            magnitude - (int_places - 1)
        }
    };

    let mut exponent = if abs == 0.0 {
        0
    } else {
        exponent_for(abs.log10().floor() as i32)
    };
    let (mut integer, mut fraction) = round_decimal(abs / 10f64.powi(exponent), decimals);
    // 丸めで桁が繰り上がった場合（9.99 -> 10.0）は指数を調整
    if abs != 0.0 && integer.len() as i32 > int_places {
        exponent = exponent_for(exponent + integer.len() as i32 - 1);
        (integer, fraction) = round_decimal(abs / 10f64.powi(exponent), decimals);
    }

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    render_integer(&mut out, int_tokens, &integer, false);
    if has_point {
        out.push('.');
        render_fraction_digits(&mut out, frac_tokens, &fraction);
    }

    out.push('E');
    if exponent < 0 {
        out.push('-');
    } else if plus {
        out.push('+');
    }
    let width = count_digits(exponent_tokens).max(1);
    out.push_str(&format!("{:0width$}", exponent.abs(), width = width));
    for token in exponent_tokens {
        push_decoration(&mut out, token);
    }
    out
}

/// 分数書式（"# ?/?", "?/8"）で出力
fn render_fraction(section: &FormatSection, value: f64) -> String {
    let tokens = &section.tokens;
    let slash = tokens
        .iter()
        .position(|t| *t == FormatToken::FractionSlash)
        .unwrap_or(tokens.len());
    let (before, after) = tokens.split_at(slash);
    let after = after.get(1..).unwrap_or_default();

    // 分子は"/"直前の連続したプレースホルダー、それより前にあれば整数部
    let numerator_len = before
        .iter()
        .rev()
        .take_while(|t| matches!(t, FormatToken::Digit(_)))
        .count();
    let has_integer = count_digits(before) > numerator_len;

    let fixed_denominator: String = after
        .iter()
        .map_while(|t| match t {
            FormatToken::Literal(s) if s.chars().all(|c| c.is_ascii_digit()) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    let denominator_places = after
        .iter()
        .take_while(|t| matches!(t, FormatToken::Digit(_)))
        .count()
        .clamp(1, 4);

    let abs = value.abs();
    let mut whole = if has_integer { abs.floor() } else { 0.0 };
    let fraction = abs - whole;

    let (mut numerator, denominator) = match fixed_denominator.parse::<u32>() {
        Ok(den) if den > 0 => ((fraction * f64::from(den)).round() as u64, u64::from(den)),
        _ => closest_fraction(fraction, 10u64.pow(denominator_places as u32) - 1),
    };
    if has_integer && numerator == denominator {
        whole += 1.0;
        numerator = 0;
    }

    let mut out = String::new();
    if value < 0.0 && (whole != 0.0 || numerator != 0) {
        out.push('-');
    }
    if has_integer && (whole != 0.0 || numerator == 0) {
        out.push_str(&format!("{:.0}", whole));
        if numerator != 0 {
            out.push(' ');
        }
    }
    if numerator != 0 {
        out.push_str(&format!("{}/{}", numerator, denominator));
    } else if !has_integer {
        out.push('0');
    }
    out
}

/// 分母が`max_denominator`以下で最も近い分数
fn closest_fraction(value: f64, max_denominator: u64) -> (u64, u64) {
    let mut best = (value.round() as u64, 1);
    let mut best_error = (value - value.round()).abs();
    for denominator in 2..=max_denominator.max(1) {
        let numerator = (value * denominator as f64).round();
        let error = (value - numerator / denominator as f64).abs();
        if error < best_error - f64::EPSILON {
            best = (numerator as u64, denominator);
            best_error = error;
        }
    }
    best
}
