//! FormatSection Module
//!
//! Excel Number Format Stringのセクションと条件の定義を提供します。

use super::tokens::FormatToken;

/// セクションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    /// 正数
    Positive,
    /// 負数
    Negative,
    /// ゼロ
    Zero,
    /// テキスト
    Text,
}

/// 条件の比較演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

/// 条件付き書式の条件（例: `[>100]`, `[<=0]`）
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Condition {
    pub op: Comparison,
    pub operand: f64,
}

impl Condition {
    /// ブラケット内の文字列（`>100`など）から条件を生成
    pub fn parse(content: &str) -> Option<Self> {
        let content = content.trim();
        let (op, rest) = if let Some(rest) = content.strip_prefix("<=") {
            (Comparison::LessOrEqual, rest)
        } else if let Some(rest) = content.strip_prefix(">=") {
            (Comparison::GreaterOrEqual, rest)
        } else if let Some(rest) = content.strip_prefix("<>") {
            (Comparison::NotEqual, rest)
        } else if let Some(rest) = content.strip_prefix('<') {
            (Comparison::Less, rest)
        } else if let Some(rest) = content.strip_prefix('>') {
            (Comparison::Greater, rest)
        } else if let Some(rest) = content.strip_prefix('=') {
            (Comparison::Equal, rest)
        } else {
            return None;
        };

        let operand = rest.trim().parse::<f64>().ok()?;
        Some(Self { op, operand })
    }

    /// 値が条件を満たすか
    pub fn matches(&self, value: f64) -> bool {
        match self.op {
            Comparison::Less => value < self.operand,
            Comparison::LessOrEqual => value <= self.operand,
            Comparison::Greater => value > self.operand,
            Comparison::GreaterOrEqual => value >= self.operand,
            Comparison::Equal => value == self.operand,
            Comparison::NotEqual => value != self.operand,
        }
    }
}

/// フォーマットのセクション（正数、負数、ゼロ、テキスト）
///
/// Excel Number Format Stringは最大4つのセクションに分割されます:
/// 1. 正数
/// 2. 負数
/// 3. ゼロ
/// 4. テキスト
#[derive(Debug, Clone)]
pub(crate) struct FormatSection {
    /// セクションの種類
    pub kind: SectionKind,

    /// 条件（例: [>100]）
    pub condition: Option<Condition>,

    /// フォーマットトークン
    pub tokens: Vec<FormatToken>,
}

impl FormatSection {
    /// 新しいセクションを生成
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            condition: None,
            tokens: Vec::new(),
        }
    }

    /// セクションが日付・時刻書式かどうかを判定
    ///
    /// 数値プレースホルダーを含むセクションは日付書式とみなさない。
    pub fn is_datetime(&self) -> bool {
        self.tokens.iter().any(|t| t.is_datetime()) && !self.is_numeric()
    }

    /// セクションが数値書式かどうかを判定
    pub fn is_numeric(&self) -> bool {
        self.tokens.iter().any(|t| t.is_numeric())
    }

    /// "General"を含むか
    pub fn is_general(&self) -> bool {
        self.tokens.contains(&FormatToken::General)
    }

    /// "@"のみで構成されるテキスト書式か
    pub fn is_text_only(&self) -> bool {
        self.tokens.contains(&FormatToken::TextPlaceholder)
            && !self.is_numeric()
            && !self.tokens.iter().any(|t| t.is_datetime())
    }

    /// 秒の小数部として表示する桁数
    pub fn sub_second_digits(&self) -> usize {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                FormatToken::SubSecond(n) => Some(*n),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
