//! Security Module
//!
//! 信頼できないXLSX入力に対する制限を定義するモジュール。
//! 入力サイズ、ZIP展開後のサイズとファイル数、アーカイブ内パスを検証します。

/// 入力ワークブックに対する制限値
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の合計サイズの上限（バイト、既定 1GB）
    pub max_decompressed_size: u64,
    /// アーカイブ内のエントリ数の上限（既定 10000）
    pub max_file_count: usize,
    /// 単一エントリの展開後サイズの上限（バイト、既定 100MB）
    pub max_file_size: u64,
    /// 入力バイト列の上限（バイト、既定 2GB）
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1 << 30,
            max_file_count: 10_000,
            max_file_size: 100 << 20,
            max_input_file_size: 2 << 30,
        }
    }
}

/// アーカイブ内のエントリパスを検証
///
/// 空のパス、絶対パス（`/`始まり、ドライブレター付き）、`..`セグメント、
/// バックスラッシュを含むパスを拒否します。
///
/// # 戻り値
///
/// * `Ok(())` - 安全なパスの場合
/// * `Err(String)` - 拒否理由
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    let bytes = path.as_bytes();
    let has_drive_letter = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive_letter {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    Ok(())
}
