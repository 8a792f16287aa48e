//! 判定エンジン
//!
//! 判定の流れ:
//! 1. メモ（同一入力）→ そのまま返す
//! 2. 人による確認結果キャッシュ → 信頼度99で返す
//! 3. 参照テキストなし → INDETERMINATE（推論APIは呼ばない）
//! 4. 推論API呼び出し → 応答検証
//! 5. 検証失敗時のみ1回だけ再試行（通信失敗は再試行しない）
//!
//! どの経路でも必ず3項目の判定を返し、エラーを呼び出し側へ伝播しない。

use super::cache::{CacheEntry, VerdictCache};
use super::memo::{MemoKey, VerdictMemo};
use super::reasoning::ReasoningService;
use crate::context::AppContext;
use crate::error::{MarkingError, Result};
use marking_verify_common::{
    build_verification_prompt, validate_response, ReferenceText, ValidationError, Verdict,
    VerdictResult, SYSTEM_PROMPT,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 確認済みキャッシュ由来の判定の信頼度
pub const CONFIRMED_CONFIDENCE: u8 = 99;

/// 推論API 1回分の結果
#[derive(Debug)]
enum AttemptOutcome {
    /// 応答が判定形式として有効
    Parsed(Verdict),
    /// 応答はあったが使えない（再試行対象）
    Unreadable(ValidationError),
    /// 通信失敗（再試行しない）
    TransportFailed(MarkingError),
}

/// メモに残すかどうか付きの判定
struct Decision {
    verdict: Verdict,
    memoize: bool,
}

impl Decision {
    fn keep(verdict: Verdict) -> Self {
        Self {
            verdict,
            memoize: true,
        }
    }

    /// 通信失敗はメモしない（回復後の同一照会を通すため）
    fn transient(verdict: Verdict) -> Self {
        Self {
            verdict,
            memoize: false,
        }
    }
}

pub struct VerdictEngine {
    cache: VerdictCache,
    reasoning: Arc<dyn ReasoningService>,
    memo: Arc<VerdictMemo>,
}

impl VerdictEngine {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            cache: ctx.cache.clone(),
            reasoning: Arc::clone(&ctx.reasoning),
            memo: Arc::clone(&ctx.memo),
        }
    }

    pub fn memo(&self) -> &VerdictMemo {
        &self.memo
    }

    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// 刻印テキストと参照テキストを照合して判定を返す
    pub async fn verdict(
        &self,
        scanned_text: &str,
        reference: &ReferenceText,
        identifier: &str,
    ) -> Verdict {
        let key = MemoKey::new(scanned_text, reference.as_str(), identifier);
        if let Some(verdict) = self.memo.get(&key) {
            debug!("メモヒット: {} ({})", identifier, key.to_hex());
            return verdict;
        }

        let decision = self.decide(scanned_text, reference, identifier).await;
        if decision.memoize {
            self.memo.insert(key, identifier, decision.verdict.clone());
        }
        decision.verdict
    }

    async fn decide(
        &self,
        scanned_text: &str,
        reference: &ReferenceText,
        identifier: &str,
    ) -> Decision {
        // 1. 人による確認結果
        if let Some(entry) = self.cache.get(identifier) {
            info!("キャッシュヒット: {} — 確認済みの結果を返します", identifier);
            return Decision::keep(confirmed_verdict(&entry));
        }

        // 2. 参照テキストがなければ判定しない
        if reference.is_absent() {
            info!("参照テキストなし: {} — INDETERMINATE", identifier);
            return Decision::keep(Verdict::indeterminate(format!(
                "Reference evidence missing: no OEM specification text is available for {}. \
                 Cannot verify the marking without evidence.",
                display_identifier(identifier)
            )));
        }

        // 3. 推論API
        let prompt = build_verification_prompt(scanned_text, reference.as_str(), identifier);

        let first_error = match self.attempt(&prompt).await {
            AttemptOutcome::Parsed(verdict) => return Decision::keep(verdict),
            AttemptOutcome::TransportFailed(e) => {
                warn!("推論API呼び出し失敗: {}", e);
                return Decision::transient(Verdict::indeterminate(format!(
                    "Reasoning service call failed: {}",
                    e
                )));
            }
            AttemptOutcome::Unreadable(e) => e,
        };

        // 4. 応答が読めなかった場合のみ1回だけ再試行
        warn!("推論APIの応答が不正、再試行します: {}", first_error);
        match self.attempt(&prompt).await {
            AttemptOutcome::Parsed(verdict) => Decision::keep(verdict),
            AttemptOutcome::TransportFailed(e) => {
                warn!("推論API再試行で通信失敗: {}", e);
                Decision::transient(Verdict::indeterminate(format!(
                    "Reasoning service call failed on retry: {}",
                    e
                )))
            }
            AttemptOutcome::Unreadable(e) => {
                warn!("推論APIの応答が2回とも不正: {}", e);
                Decision::keep(Verdict::indeterminate(format!(
                    "Reasoning service response unreadable after two attempts ({}).",
                    e
                )))
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> AttemptOutcome {
        match self.reasoning.complete(SYSTEM_PROMPT, prompt).await {
            Err(e) => AttemptOutcome::TransportFailed(e),
            Ok(raw) => match validate_response(&raw) {
                Ok(verdict) => AttemptOutcome::Parsed(verdict),
                Err(e) => {
                    let preview: String = raw.chars().take(200).collect();
                    debug!("不正な応答 ({}): {}", self.reasoning.name(), preview);
                    AttemptOutcome::Unreadable(e)
                }
            },
        }
    }

    /// 人による確認結果を保存し、その型番のメモを破棄する
    pub fn confirm(
        &self,
        identifier: &str,
        result: VerdictResult,
        evidence: &str,
        notes: &str,
    ) -> Result<CacheEntry> {
        let entry = self.cache.put(identifier, result, evidence, notes)?;
        let dropped = self.memo.invalidate_identifier(identifier);
        if dropped > 0 {
            debug!("メモを破棄: {} ({}件)", identifier, dropped);
        }
        info!("確認結果を保存: {} → {}", identifier.trim(), entry.result);
        Ok(entry)
    }
}

/// 確認済みエントリから判定を生成
pub fn confirmed_verdict(entry: &CacheEntry) -> Verdict {
    let when = if entry.timestamp.trim().is_empty() {
        String::new()
    } else {
        format!(" on {}", entry.timestamp.trim())
    };
    let reasoning = format!("Previously confirmed by human QA{}. {}", when, entry.notes);

    Verdict {
        result: entry.result.into(),
        confidence: CONFIRMED_CONFIDENCE,
        reasoning: reasoning.trim().to_string(),
    }
}

fn display_identifier(identifier: &str) -> &str {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        "the requested part"
    } else {
        identifier
    }
}
