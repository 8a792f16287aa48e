//! プロンプト生成モジュール
//!
//! - SYSTEM_PROMPT: 推論サービスへのシステム指示
//! - build_verification_prompt: 刻印照合用のユーザープロンプト
//! - build_search_query: 仕様書検索クエリ

/// 推論サービスへのシステム指示
///
/// JSONオブジェクトのみを返すよう指示する。コードフェンスで包まれる逸脱は
/// 応答検証側で吸収する。
pub const SYSTEM_PROMPT: &str = r#"System Role:
You are an automated Quality Assurance (QA) validation engine for high-volume electronic component inspection. Your sole purpose is to compare text extracted from a physical component marking via OCR against the official manufacturer (OEM) datasheet specification.

PRIME DIRECTIVE: ZERO HALLUCINATION & STRICT VALIDATION
1. Never guess, assume, or fabricate missing characters.
2. If either the OCR text or the OEM specification is missing, incomplete, or illegible, answer INDETERMINATE.
3. Output must be strictly machine-readable JSON only. No conversational filler, no markdown.

Decision Rules:
1. Exact match: the OCR marking and the OEM specification are identical -> MATCH (confidence 95-100).
2. Optical confusion: a single-character difference that is a known OCR confusion (0 vs O, 1 vs I, 8 vs B, 5 vs S) -> MATCH (confidence 75-90).
3. Structural mismatch: wrong manufacturer prefix, wrong suffix, missing or altered alphanumeric blocks -> MISMATCH (confidence 80-100).
4. Unverifiable: the OCR text is noise or the OEM specification does not describe the marking -> INDETERMINATE (confidence 0).

Output Protocol:
Return ONLY this exact JSON object, nothing else:
{
  "result": "MATCH" | "MISMATCH" | "INDETERMINATE",
  "confidence": <integer 0-100>,
  "reasoning": "<1-2 sentence technical explanation>"
}"#;

/// 仕様書検索の最大件数（既定値）
pub const DEFAULT_SEARCH_RESULTS: usize = 5;

/// 刻印照合用ユーザープロンプト
///
/// # Arguments
/// * `scanned_text` - OCRで読み取った刻印テキスト
/// * `reference_text` - 仕様書から抽出した参照テキスト
/// * `identifier` - 照合対象の型番
pub fn build_verification_prompt(
    scanned_text: &str,
    reference_text: &str,
    identifier: &str,
) -> String {
    let scanned_text = scanned_text.trim();
    let reference_text = reference_text.trim();
    let identifier = identifier.trim();

    format!(
        r#"Evaluate the following component marking:
- Extracted OCR text from the component: {scanned_text}
- Expected OEM specification from the datasheet:
{reference_text}
- Part number being verified: {identifier}"#
    )
}

/// 仕様書検索クエリ
pub fn build_search_query(identifier: &str) -> String {
    format!("{} datasheet pdf", identifier.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_all_results() {
        for name in crate::types::VerdictResult::CANONICAL {
            assert!(SYSTEM_PROMPT.contains(name), "{} missing", name);
        }
        assert!(SYSTEM_PROMPT.contains("\"confidence\""));
        assert!(SYSTEM_PROMPT.contains("\"reasoning\""));
    }

    #[test]
    fn test_build_verification_prompt() {
        let prompt = build_verification_prompt(
            "STM32F1O3C8T6 ",
            "Top Mark: STM32F103C8T6\n",
            " STM32F103C8T6",
        );
        assert!(prompt.contains("Extracted OCR text from the component: STM32F1O3C8T6\n"));
        assert!(prompt.contains("Top Mark: STM32F103C8T6\n- Part number"));
        assert!(prompt.ends_with("Part number being verified: STM32F103C8T6"));
    }

    #[test]
    fn test_build_search_query() {
        assert_eq!(build_search_query("NE555P"), "NE555P datasheet pdf");
        assert_eq!(build_search_query("  XR2206 "), "XR2206 datasheet pdf");
    }
}
