//! 判定エンジンと関連部品
//!
//! - `engine`: 判定の状態遷移（キャッシュ → ガード → 推論 → 検証 → 再試行）
//! - `cache`: 人による確認結果の永続キャッシュ
//! - `memo`: 同一入力の判定メモ
//! - `reasoning`: 推論サービス連携

pub mod cache;
pub mod engine;
pub mod memo;
pub mod reasoning;

pub use cache::{CacheEntry, VerdictCache};
pub use engine::{confirmed_verdict, VerdictEngine, CONFIRMED_CONFIDENCE};
pub use memo::{MemoKey, VerdictMemo};
pub use reasoning::{ChatCompletionsClient, ReasoningService, UnconfiguredReasoning};
