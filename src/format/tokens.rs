//! FormatToken Module
//!
//! Excel Number Format Stringのトークン定義を提供します。

/// 数値プレースホルダーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DigitKind {
    /// `0`: 桁がなければ0を表示
    Zero,
    /// `#`: 桁がなければ何も表示しない
    Hash,
    /// `?`: 桁がなければ空白を表示
    Question,
}

/// 経過時間の単位（`[h]`, `[mm]`, `[ss]`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElapsedUnit {
    Hours,
    Minutes,
    Seconds,
}

/// 午前/午後表記
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AmPmStyle {
    /// `AM/PM`
    Full { lowercase: bool },
    /// `A/P`
    Short { lowercase: bool },
}

/// フォーマットトークン
///
/// Excel Number Format Stringを解析した際に生成されるトークンです。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FormatToken {
    /// 年（"yy" -> 2桁, "yyyy" -> 4桁）
    Year(usize),

    /// 月（"m", "mm", "mmm", "mmmm", "mmmmm"）
    Month(usize),

    /// 日（"d", "dd", "ddd"は曜日略称, "dddd"は曜日）
    Day(usize),

    /// 時（"h", "hh"）
    Hour(usize),

    /// 分
    ///
    /// 字句解析の段階では"m"はすべて`Month`になり、
    /// 前後の時・秒トークンを見て`Minute`に置き換えられる。
    Minute(usize),

    /// 秒（"s", "ss"）
    Second(usize),

    /// 秒の小数部（"ss.00"の".00" -> 2桁）
    SubSecond(usize),

    /// 午前/午後
    AmPm(AmPmStyle),

    /// 経過時間（例: "[h]", "[mm]"）
    Elapsed(ElapsedUnit, usize),

    /// 数値プレースホルダー（1文字ごとに1トークン）
    Digit(DigitKind),

    /// 小数点
    DecimalPoint,

    /// 千の位区切り（数値プレースホルダー末尾の場合は1000での除算）
    ThousandSeparator,

    /// パーセント記号
    Percent,

    /// 指数表記（`true`なら正の指数にも`+`を付ける）
    Exponent(bool),

    /// 分数の区切り（"# ?/?"の"/"）
    FractionSlash,

    /// リテラル文字列（例: "$", "-", " "）
    Literal(String),

    /// 色指定（例: "[Red]"）。出力では無視される
    Color(String),

    /// テキストプレースホルダー（"@"）
    TextPlaceholder,

    /// "General"
    General,
}

impl FormatToken {
    /// トークンが日付・時刻関連かどうかを判定
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            FormatToken::Year(_)
                | FormatToken::Month(_)
                | FormatToken::Day(_)
                | FormatToken::Hour(_)
                | FormatToken::Minute(_)
                | FormatToken::Second(_)
                | FormatToken::SubSecond(_)
                | FormatToken::Elapsed(..)
        )
    }

    /// 日付（年月日）部分のトークンか
    pub fn is_date_part(&self) -> bool {
        matches!(
            self,
            FormatToken::Year(_) | FormatToken::Month(_) | FormatToken::Day(_)
        )
    }

    /// 時刻部分のトークンか
    pub fn is_time_part(&self) -> bool {
        matches!(
            self,
            FormatToken::Hour(_)
                | FormatToken::Minute(_)
                | FormatToken::Second(_)
                | FormatToken::SubSecond(_)
                | FormatToken::Elapsed(..)
        )
    }

    /// トークンが数値関連かどうかを判定
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FormatToken::Digit(_)
                | FormatToken::DecimalPoint
                | FormatToken::Percent
                | FormatToken::Exponent(_)
                | FormatToken::FractionSlash
        )
    }
}
