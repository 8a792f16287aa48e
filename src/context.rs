//! アプリケーションコンテキスト
//!
//! 設定から外部連携（検索・取得・読み込み・推論）とキャッシュを一度だけ組み立て、
//! `EvidenceAgent::new` / `VerdictEngine::new` に渡す。テストでは各フィールドに
//! 偽物を差し込む。

use crate::config::Config;
use crate::error::Result;
use crate::retrieval::{DocumentFetcher, DocumentReader, DuckDuckGoProvider, HttpFetcher, PdfReader, SearchProvider};
use crate::verifier::{ChatCompletionsClient, ReasoningService, UnconfiguredReasoning, VerdictCache, VerdictMemo};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AppContext {
    pub config: Config,
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub reader: Arc<dyn DocumentReader>,
    pub reasoning: Arc<dyn ReasoningService>,
    pub cache: VerdictCache,
    pub memo: Arc<VerdictMemo>,
}

impl AppContext {
    /// 本番用の連携先で組み立てる
    ///
    /// APIキーがなくても失敗しない（判定は INDETERMINATE になる）。
    pub fn new(config: Config) -> Result<Self> {
        let reasoning: Arc<dyn ReasoningService> = match config.get_api_key() {
            Ok(key) => Arc::new(ChatCompletionsClient::new(config.reasoning.clone(), key)?),
            Err(e) => {
                warn!("{}", e);
                Arc::new(UnconfiguredReasoning)
            }
        };

        let ctx = Self {
            search: Arc::new(DuckDuckGoProvider::new(&config.search)?),
            fetcher: Arc::new(HttpFetcher::new(&config.download)?),
            reader: Arc::new(PdfReader),
            reasoning,
            cache: VerdictCache::new(config.cache_file.clone()),
            memo: Arc::new(VerdictMemo::new(config.memo_capacity)),
            config,
        };

        debug!(
            "コンテキスト: 推論={}, 検索={}, キャッシュ={}",
            ctx.reasoning.name(),
            ctx.search.name(),
            ctx.cache.path().display()
        );
        Ok(ctx)
    }
}
