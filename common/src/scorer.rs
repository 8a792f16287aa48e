//! ページ関連度スコアリング
//!
//! 数十ページある仕様書のうち、刻印表を含むページを見つけるための
//! ヒューリスティック。

/// 刻印・型番表に現れやすいキーワード（部分一致、大文字で比較）
pub const RELEVANCE_KEYWORDS: &[&str] = &["MARK", "ORDER", "PART", "DEVICE", "IDENT", "TOP"];

/// ページ冒頭にあれば除外する語（改訂履歴・目次など）
pub const DENYLIST_TERMS: &[&str] = &["REVISION", "HISTORY", "CHANGE", "TABLE OF CONTENTS"];

/// 型番一致の加点
pub const IDENTIFIER_WEIGHT: u32 = 5;

/// 除外語を探す範囲（先頭の 1/N）
const LEADING_FRACTION: usize = 5;

/// ページ冒頭（先頭1/5）を大文字で返す
fn leading_section(text: &str) -> String {
    let len = text.chars().count() / LEADING_FRACTION;
    text.chars().take(len).collect::<String>().to_uppercase()
}

/// ページのスコアを計算
///
/// - 先頭1/5に除外語があれば 0
/// - 型番を含めば +5
/// - キーワードごとに +1（繰り返しは数えない）
pub fn score_page(text: &str, identifier: &str) -> u32 {
    let head = leading_section(text);
    if DENYLIST_TERMS.iter().any(|term| head.contains(term)) {
        return 0;
    }

    let upper = text.to_uppercase();
    let mut score = 0;

    let identifier = identifier.trim().to_uppercase();
    if !identifier.is_empty() && upper.contains(&identifier) {
        score += IDENTIFIER_WEIGHT;
    }

    score += RELEVANCE_KEYWORDS
        .iter()
        .filter(|keyword| upper.contains(*keyword))
        .count() as u32;

    score
}

/// 最高スコアのページを選ぶ
///
/// 同点は先に現れたページを優先。スコア 0 のページは選ばない。
pub fn best_page(scores: &[u32]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;

    for (index, &score) in scores.iter().enumerate() {
        if score == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best
}
