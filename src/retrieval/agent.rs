//! 参照文書探索エージェント
//!
//! 1. 「<型番> datasheet pdf」で検索し、PDFらしいリンクを上から順に試す
//! 2. ダウンロード → ページ採点 → 最良ページから抜粋（最初に成功したものを採用）
//! 3. 見つからなければ検証済み仕様書フォルダを同じ手順で探す
//! 4. それでもなければ空の参照テキスト
//!
//! 文書単位の失敗（通信・形式・破損）はログに残して次へ進む。

use super::document::{best_passage, list_local_documents, DocumentReader};
use super::download::DocumentFetcher;
use super::search::SearchProvider;
use crate::context::AppContext;
use crate::error::{MarkingError, Result};
use marking_verify_common::{build_search_query, EvidenceCandidate, EvidenceSource, ReferenceText};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct EvidenceAgent {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn DocumentFetcher>,
    reader: Arc<dyn DocumentReader>,
    max_results: usize,
    parse_timeout: Duration,
    work_dir: PathBuf,
    fallback_dir: PathBuf,
}

impl EvidenceAgent {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            search: Arc::clone(&ctx.search),
            fetcher: Arc::clone(&ctx.fetcher),
            reader: Arc::clone(&ctx.reader),
            max_results: ctx.config.search.max_results,
            parse_timeout: Duration::from_secs(ctx.config.download.parse_timeout_seconds),
            work_dir: ctx.config.download.work_dir.clone(),
            fallback_dir: ctx.config.fallback_dir.clone(),
        }
    }

    /// 参照テキストを探す（見つからなければ空）
    pub async fn retrieve(&self, identifier: &str) -> ReferenceText {
        match self.retrieve_candidate(identifier).await {
            Some(candidate) => ReferenceText::new(candidate.text),
            None => ReferenceText::absent(),
        }
    }

    /// 出典付きで参照テキストを探す
    pub async fn retrieve_candidate(&self, identifier: &str) -> Option<EvidenceCandidate> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            warn!("型番が空のため参照文書を探しません");
            return None;
        }

        if let Some(candidate) = self.search_online(identifier).await {
            return Some(candidate);
        }

        if let Some(candidate) = self.search_local(identifier).await {
            return Some(candidate);
        }

        info!("参照文書が見つかりません: {}", identifier);
        None
    }

    async fn search_online(&self, identifier: &str) -> Option<EvidenceCandidate> {
        let query = build_search_query(identifier);
        let hits = match self.search.search(&query, self.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("検索失敗 ({}): {}", self.search.name(), e);
                return None;
            }
        };

        let links: Vec<String> = hits
            .into_iter()
            .map(|hit| hit.url)
            .filter(|url| url.to_lowercase().contains(".pdf"))
            .collect();
        debug!("PDF候補: {}件", links.len());

        for url in links {
            match self.try_online(&url, identifier).await {
                Ok(Some(candidate)) => {
                    info!("参照文書を採用: {} (p.{}, score {})", url, candidate.page, candidate.score);
                    return Some(candidate);
                }
                Ok(None) => debug!("関連箇所なし: {}", url),
                Err(e) => warn!("スキップ: {} ({})", url, e),
            }
        }

        None
    }

    async fn try_online(&self, url: &str, identifier: &str) -> Result<Option<EvidenceCandidate>> {
        let document = self.fetcher.fetch(url).await?;
        if !document.is_document() {
            return Err(MarkingError::ContentRejected {
                url: url.to_string(),
                content_type: document.content_type.unwrap_or_else(|| "(なし)".into()),
            });
        }

        // ドロップ時に削除される一時ファイル
        let artifact = self.write_artifact(identifier, &document.bytes)?;
        let pages = self.read_pages(artifact.path().to_path_buf()).await;
        drop(artifact);

        let source = EvidenceSource::Online {
            url: url.to_string(),
        };
        Ok(best_passage(&pages?, identifier, source))
    }

    async fn search_local(&self, identifier: &str) -> Option<EvidenceCandidate> {
        let documents = list_local_documents(&self.fallback_dir);
        if documents.is_empty() {
            debug!("検証済み仕様書なし: {}", self.fallback_dir.display());
            return None;
        }
        info!("検証済み仕様書フォルダを確認: {}件", documents.len());

        for path in documents {
            let pages = match self.read_pages(path.clone()).await {
                Ok(pages) => pages,
                Err(e) => {
                    warn!("スキップ: {} ({})", path.display(), e);
                    continue;
                }
            };

            let source = EvidenceSource::Local { path: path.clone() };
            if let Some(candidate) = best_passage(&pages, identifier, source) {
                info!("検証済み仕様書を採用: {} (p.{})", path.display(), candidate.page);
                return Some(candidate);
            }
            debug!("関連箇所なし: {}", path.display());
        }

        None
    }

    /// 解析はブロッキングなので専用スレッドで行う（パニック・時間切れも失敗として扱う）
    ///
    /// 時間切れの解析スレッドは止められないので、結果を待たずに次の候補へ進む。
    async fn read_pages(&self, path: PathBuf) -> Result<Vec<String>> {
        let reader = Arc::clone(&self.reader);
        let display = path.display().to_string();

        let task = tokio::task::spawn_blocking(move || reader.read_pages(&path));
        match tokio::time::timeout(self.parse_timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| MarkingError::DocumentUnreadable(format!("{}: {}", display, e)))?,
            Err(_) => Err(MarkingError::DocumentUnreadable(format!(
                "{} (解析が{}秒以内に終わらない)",
                display,
                self.parse_timeout.as_secs()
            ))),
        }
    }

    fn write_artifact(&self, identifier: &str, bytes: &[u8]) -> Result<tempfile::NamedTempFile> {
        std::fs::create_dir_all(&self.work_dir)?;

        let prefix = format!(
            "{}-{}-",
            sanitize_file_stem(identifier),
            chrono::Local::now().format("%Y%m%d%H%M%S")
        );
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".pdf")
            .tempfile_in(&self.work_dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!("一時ファイル: {}", file.path().display());
        Ok(file)
    }
}

/// ファイル名に使えない文字を `_` に置き換える
fn sanitize_file_stem(identifier: &str) -> String {
    let stem: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "document".into()
    } else {
        stem
    }
}
