//! 推論APIレスポンスの検証
//!
//! 推論サービスの生テキストを厳密な判定形式に変換する。
//! 一部だけ受け付けることはしない。

use crate::types::{Verdict, VerdictResult};
use serde_json::Value;
use thiserror::Error;

/// 検証失敗の理由
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("response is empty")]
    Empty,

    #[error("response is not JSON: {0}")]
    NotJson(String),

    #[error("response is not a JSON object")]
    NotObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("`result` must be one of MATCH, MISMATCH, INDETERMINATE (got {0})")]
    InvalidResult(String),

    #[error("`confidence` must be an integer between 0 and 100 (got {0})")]
    InvalidConfidence(String),

    #[error("`reasoning` must be a non-empty string (got {0})")]
    InvalidReasoning(String),
}

/// 外側のコードフェンスを1層だけ除去
///
/// 言語タグ（`json` など）は省略可。閉じフェンスより後ろの説明文は捨てる。
/// 閉じフェンスがなくても開きフェンスは外す。
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // JSONオブジェクトは英数字で始まらないので、先頭の英数字列は言語タグ
    let tag_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let body = &inner[tag_len..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// 推論レスポンスを検証して判定に変換
///
/// 有効条件:
/// - `result` が MATCH / MISMATCH / INDETERMINATE のいずれか（完全一致）
/// - `confidence` が 0〜100 の整数（文字列・小数は不可）
/// - `reasoning` が空でない文字列
///
/// INDETERMINATE の信頼度は 0 に正規化する。
pub fn validate_response(raw: &str) -> Result<Verdict, ValidationError> {
    let payload = strip_code_fence(raw);
    if payload.is_empty() {
        return Err(ValidationError::Empty);
    }

    let value: Value =
        serde_json::from_str(payload).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationError::NotObject)?;

    let result = match object.get("result") {
        None => return Err(ValidationError::MissingField("result")),
        Some(Value::String(s)) => VerdictResult::from_canonical(s)
            .ok_or_else(|| ValidationError::InvalidResult(s.clone()))?,
        Some(other) => return Err(ValidationError::InvalidResult(other.to_string())),
    };

    let confidence = match object.get("confidence") {
        None => return Err(ValidationError::MissingField("confidence")),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|c| *c <= u64::from(Verdict::MAX_CONFIDENCE))
            .map(|c| c as u8)
            .ok_or_else(|| ValidationError::InvalidConfidence(n.to_string()))?,
        Some(other) => return Err(ValidationError::InvalidConfidence(other.to_string())),
    };

    let reasoning = match object.get("reasoning") {
        None => return Err(ValidationError::MissingField("reasoning")),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(other) => return Err(ValidationError::InvalidReasoning(other.to_string())),
    };

    Ok(Verdict::new(result, confidence, reasoning))
}
