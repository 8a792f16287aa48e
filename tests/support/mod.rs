//! テスト用の偽の連携先

#![allow(dead_code)]

use async_trait::async_trait;
use marking_verify::config::Config;
use marking_verify::context::AppContext;
use marking_verify::error::{MarkingError, Result};
use marking_verify::retrieval::{DocumentFetcher, DocumentReader, FetchedDocument, SearchHit, SearchProvider};
use marking_verify::verifier::{ReasoningService, VerdictCache, VerdictMemo};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PDF: &str = "application/pdf";

/// `SLOW` 文書の解析にかかる時間
pub const SLOW_READ: Duration = Duration::from_secs(3);

/// 決まったURLを返す検索
pub struct FakeSearch {
    urls: Vec<String>,
    fail: bool,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn returning(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &str {
        "fake-search"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(MarkingError::Transport("search unavailable".into()));
        }
        Ok(self
            .urls
            .iter()
            .take(max_results)
            .map(|url| SearchHit { url: url.clone() })
            .collect())
    }
}

/// URLごとに決まった応答を返す取得
#[derive(Default)]
pub struct FakeFetcher {
    documents: HashMap<String, FetchedDocument>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// ページを `\x0c` でつないだ本文を登録
    pub fn with(mut self, url: &str, content_type: Option<&str>, pages: &[&str]) -> Self {
        self.documents.insert(
            url.to_string(),
            FetchedDocument {
                bytes: pages.join("\x0c").into_bytes(),
                content_type: content_type.map(|c| c.to_string()),
            },
        );
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| MarkingError::Transport(format!("404: {}", url)))
    }
}

/// UTF-8テキストを `\x0c` でページ分割するリーダー
///
/// 本文が `CORRUPT` で始まれば読み込み失敗、`PANIC` で始まればパニック、
/// `SLOW` で始まれば [`SLOW_READ`] だけ止まる。
#[derive(Default)]
pub struct TextReader {
    pub seen: Mutex<Vec<PathBuf>>,
}

impl TextReader {
    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl DocumentReader for TextReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        let text = std::fs::read_to_string(path)?;
        if text.starts_with("CORRUPT") {
            return Err(MarkingError::DocumentUnreadable(path.display().to_string()));
        }
        if text.starts_with("PANIC") {
            panic!("reader crashed on {}", path.display());
        }
        if text.starts_with("SLOW") {
            std::thread::sleep(SLOW_READ);
        }
        Ok(text.split('\x0c').map(|p| p.to_string()).collect())
    }
}

/// 順番に応答を返す推論サービス（尽きたら通信失敗）
#[derive(Default)]
pub struct FakeReasoning {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeReasoning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, raw: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(raw.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for FakeReasoning {
    fn name(&self) -> &str {
        "fake-reasoning"
    }

    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(message)) => Err(MarkingError::Transport(message)),
            None => Err(MarkingError::Transport("no scripted reply".into())),
        }
    }
}

/// テスト用の設定（すべて `root` 以下）
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.api_key = None;
    config.cache_file = root.join("verified_cache.json");
    config.fallback_dir = root.join("sample_datasheets");
    config.download.work_dir = root.join("work");
    config
}

pub fn test_context(
    root: &Path,
    search: Arc<FakeSearch>,
    fetcher: Arc<FakeFetcher>,
    reader: Arc<TextReader>,
    reasoning: Arc<FakeReasoning>,
) -> AppContext {
    let config = test_config(root);
    AppContext {
        search,
        fetcher,
        reader,
        reasoning,
        cache: VerdictCache::new(config.cache_file.clone()),
        memo: Arc::new(VerdictMemo::new(config.memo_capacity)),
        config,
    }
}

/// 推論だけ差し替えたコンテキスト（探索はしない）
pub fn reasoning_context(root: &Path, reasoning: Arc<FakeReasoning>) -> AppContext {
    test_context(
        root,
        Arc::new(FakeSearch::returning(&[])),
        Arc::new(FakeFetcher::new()),
        Arc::new(TextReader::default()),
        reasoning,
    )
}

/// 作業ディレクトリに残っているファイル数
pub fn leftover_artifacts(root: &Path) -> usize {
    match std::fs::read_dir(root.join("work")) {
        Ok(entries) => entries.filter_map(|e| e.ok()).count(),
        Err(_) => 0,
    }
}

/// 1行ずつテキストを置いた本物のPDFを書き出す（Helvetica、1ページ目から順に）
pub fn write_text_pdf(path: &Path, pages: &[&[&str]]) {
    let count = pages.len();
    let kids: Vec<String> = (0..count).map(|i| format!("{} 0 R", 4 + i * 2)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), count),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    ];

    for (i, lines) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + i * 2
        ));

        let mut stream = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
        for (j, line) in lines.iter().enumerate() {
            if j > 0 {
                stream.push_str("0 -16 Td\n");
            }
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            stream.push_str(&format!("({}) Tj\n", escaped));
        }
        stream.push_str("ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));

    std::fs::write(path, out).unwrap();
}
