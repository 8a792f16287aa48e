//! 一連の照合テスト

mod support;

use marking_verify::common::{EvidenceSource, VerdictResult};
use marking_verify::pipeline::verify_marking;
use std::sync::Arc;
use support::{test_context, FakeFetcher, FakeReasoning, FakeSearch, TextReader, PDF};
use tempfile::tempdir;

const STM32_PAGES: &[&str] = &[
    "Table of contents\n1 Introduction\n2 Description",
    "7 Package information\nDevice marking for LQFP48\nTop Mark: STM32F103C8T6\nOrdering information on page 96",
];

/// 刻印テキストから型番を導出し、見つけた仕様書で判定する
#[tokio::test]
async fn test_verify_marking_end_to_end() {
    let dir = tempdir().expect("Failed to create temp dir");
    let search = Arc::new(FakeSearch::returning(&["https://st.example/stm32f103c8.pdf"]));
    let fetcher = Arc::new(FakeFetcher::new().with("https://st.example/stm32f103c8.pdf", Some(PDF), STM32_PAGES));
    let reasoning = Arc::new(FakeReasoning::new().reply(
        r#"{"result":"MATCH","confidence":94,"reasoning":"Top mark matches the LQFP48 marking table."}"#,
    ));
    let ctx = test_context(
        dir.path(),
        Arc::clone(&search),
        Arc::clone(&fetcher),
        Arc::new(TextReader::default()),
        Arc::clone(&reasoning),
    );

    let report = verify_marking(&ctx, "STM32F103C8T6 GH22K 93 MYS 802", None).await;

    assert_eq!(report.identifier.as_deref(), Some("STM32F103C8T6"));
    let evidence = report.evidence.expect("参照が見つからない");
    assert_eq!(evidence.page, 2);
    assert!(matches!(evidence.source, EvidenceSource::Online { .. }));
    assert_eq!(report.verdict.result, VerdictResult::Match);
    assert_eq!(report.verdict.confidence, 94);

    let prompt = &reasoning.prompts()[0];
    assert!(prompt.contains("Top Mark: STM32F103C8T6"));
    assert!(prompt.contains("Part number being verified: STM32F103C8T6"));
}

/// 指定した型番を優先
#[tokio::test]
async fn test_explicit_identifier() {
    let dir = tempdir().expect("Failed to create temp dir");
    let search = Arc::new(FakeSearch::returning(&[]));
    let ctx = test_context(
        dir.path(),
        Arc::clone(&search),
        Arc::new(FakeFetcher::new()),
        Arc::new(TextReader::default()),
        Arc::new(FakeReasoning::new()),
    );

    let report = verify_marking(&ctx, "ST 32F103 C8T6", Some(" STM32F103C8T6 ")).await;

    assert_eq!(report.identifier.as_deref(), Some("STM32F103C8T6"));
    assert!(report.evidence.is_none());
    assert_eq!(report.verdict.result, VerdictResult::Indeterminate);
    assert_eq!(
        search.queries.lock().unwrap().as_slice(),
        ["STM32F103C8T6 datasheet pdf"]
    );
}

/// 型番が導出できなければ探索せずに INDETERMINATE
#[tokio::test]
async fn test_no_identifier() {
    let dir = tempdir().expect("Failed to create temp dir");
    let search = Arc::new(FakeSearch::returning(&["https://example.com/a.pdf"]));
    let reasoning = Arc::new(FakeReasoning::new());
    let ctx = test_context(
        dir.path(),
        Arc::clone(&search),
        Arc::new(FakeFetcher::new()),
        Arc::new(TextReader::default()),
        Arc::clone(&reasoning),
    );

    let report = verify_marking(&ctx, "  *** ", None).await;

    assert!(report.identifier.is_none());
    assert_eq!(report.verdict.result, VerdictResult::Indeterminate);
    assert_eq!(report.verdict.confidence, 0);
    assert_eq!(search.calls(), 0);
    assert_eq!(reasoning.calls(), 0);
}

/// 確認済みの型番は探索も推論もしない
#[tokio::test]
async fn test_confirmed_identifier_skips_retrieval() {
    let dir = tempdir().expect("Failed to create temp dir");
    let search = Arc::new(FakeSearch::returning(&["https://example.com/a.pdf"]));
    let reasoning = Arc::new(FakeReasoning::new());
    let ctx = test_context(
        dir.path(),
        Arc::clone(&search),
        Arc::new(FakeFetcher::new()),
        Arc::new(TextReader::default()),
        Arc::clone(&reasoning),
    );
    ctx.cache
        .put("NE555P", VerdictResult::Match, "Top side marking: NE555P", "")
        .expect("キャッシュ保存失敗");

    let report = verify_marking(&ctx, "NE555P 94K", None).await;

    assert_eq!(report.verdict.result, VerdictResult::Match);
    assert_eq!(report.verdict.confidence, 99);
    assert_eq!(search.calls(), 0);
    assert_eq!(reasoning.calls(), 0);
}

/// 結果はJSONに出力できる
#[tokio::test]
async fn test_report_serializes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let ctx = test_context(
        dir.path(),
        Arc::new(FakeSearch::failing()),
        Arc::new(FakeFetcher::new()),
        Arc::new(TextReader::default()),
        Arc::new(FakeReasoning::new()),
    );

    let report = verify_marking(&ctx, "XR2206", None).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["identifier"], "XR2206");
    assert_eq!(json["verdict"]["result"], "INDETERMINATE");
    assert_eq!(json["verdict"]["confidence"], 0);
    assert!(json["evidence"].is_null());
}
