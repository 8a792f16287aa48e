//! 刻印照合の一連の流れ
//!
//! 刻印テキスト（OCR結果）→ 型番 → 参照文書探索 → 判定

use crate::context::AppContext;
use crate::retrieval::EvidenceAgent;
use crate::verifier::VerdictEngine;
use marking_verify_common::{derive_identifier, EvidenceCandidate, ReferenceText, Verdict};
use serde::Serialize;
use tracing::info;

/// 照合結果
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub identifier: Option<String>,
    /// 判定に使った参照箇所（見つからなければ `None`）
    pub evidence: Option<EvidenceCandidate>,
    pub verdict: Verdict,
}

/// 刻印テキストを照合する
///
/// `identifier` が `None` なら刻印テキストの先頭トークンから導出する。
/// 型番が得られなければ探索せずに INDETERMINATE を返す。
pub async fn verify_marking(
    ctx: &AppContext,
    scanned_text: &str,
    identifier: Option<&str>,
) -> VerificationReport {
    let identifier = identifier
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(|| derive_identifier(scanned_text));

    let Some(identifier) = identifier else {
        return VerificationReport {
            identifier: None,
            evidence: None,
            verdict: Verdict::indeterminate(
                "No part identifier could be derived from the scanned marking.",
            ),
        };
    };

    info!("照合開始: {}", identifier);
    let engine = VerdictEngine::new(ctx);

    // 確認済みならダウンロードせずに判定する
    if engine.cache().get(&identifier).is_some() {
        let verdict = engine
            .verdict(scanned_text, &ReferenceText::absent(), &identifier)
            .await;
        return VerificationReport {
            identifier: Some(identifier),
            evidence: None,
            verdict,
        };
    }

    let agent = EvidenceAgent::new(ctx);
    let evidence = agent.retrieve_candidate(&identifier).await;
    let reference = evidence
        .as_ref()
        .map(|c| ReferenceText::new(c.text.clone()))
        .unwrap_or_else(ReferenceText::absent);

    let verdict = engine.verdict(scanned_text, &reference, &identifier).await;
    info!("判定: {} ({}%)", verdict.result, verdict.confidence);

    VerificationReport {
        identifier: Some(identifier),
        evidence,
        verdict,
    }
}
