//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse("判定値が不正です".to_string());
        assert_eq!(format!("{}", error), "Parse error: 判定値が不正です");
    }

    #[test]
    fn test_error_from_regex() {
        let regex_error = regex::Regex::new("(").unwrap_err();
        let error: Error = regex_error.into();
        assert!(matches!(error, Error::Pattern(_)));
    }
}
