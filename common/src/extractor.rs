//! 関連行の抽出
//!
//! 最高スコアのページから、型番またはキーワードを含む行だけを残す。
//! 刻印表は型番全体を繰り返さないことが多い
//! （例: 型番 "STM32F103C8T6" に対して "Top Mark: F103C8T6"）ため、
//! キーワード一致の行も残す。

use crate::error::Result;
use crate::scorer::RELEVANCE_KEYWORDS;
use regex::{Regex, RegexBuilder};

/// 型番を大文字小文字無視で検索するパターンを生成
///
/// 型番はエスケープしてからパターン化する（`.` や `+` を含む型番対策）。
/// 空の型番は `None`。
pub fn identifier_pattern(identifier: &str) -> Result<Option<Regex>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }

    let pattern = RegexBuilder::new(&regex::escape(identifier))
        .case_insensitive(true)
        .build()?;
    Ok(Some(pattern))
}

fn contains_keyword(line: &str) -> bool {
    let upper = line.to_uppercase();
    RELEVANCE_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

/// ページテキストから関連行を抽出（改行区切り）
pub fn extract_passage(text: &str, identifier: &str) -> String {
    // エスケープ済みなのでビルド失敗はサイズ上限超過のみ。その場合はキーワードのみで判定
    let pattern = identifier_pattern(identifier).ok().flatten();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            pattern.as_ref().is_some_and(|re| re.is_match(line)) || contains_keyword(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
