//! 仕様書検索
//!
//! DuckDuckGo の HTML 版を使う（APIキー不要）。
//! 検索結果ページから結果リンクだけを取り出し、リダイレクトURLを展開する。

use crate::config::SearchConfig;
use crate::error::{MarkingError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

lazy_static! {
    static ref RESULT_ANCHOR: Regex = Regex::new(r#"<a\b[^>]*class="[^"]*\bresult__a\b[^"]*"[^>]*>"#).unwrap();
    static ref HREF_ATTR: Regex = Regex::new(r#"href="([^"]+)""#).unwrap();
}

/// 検索結果1件
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
}

/// 検索プロバイダ
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// 上位 `max_results` 件のURLを検索順で返す
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

pub struct DuckDuckGoProvider {
    client: Client,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MarkingError::Config(format!("HTTPクライアント生成エラー: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}?q={}", DDG_HTML_ENDPOINT, urlencoding::encode(query));
        debug!("検索: {}", query);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarkingError::Transport(format!(
                "検索エラー ({}): {}",
                status.as_u16(),
                query
            )));
        }

        let html = response.text().await?;
        let hits = parse_result_links(&html, max_results);
        debug!("検索結果: {}件", hits.len());
        Ok(hits)
    }
}

/// 検索結果HTMLから結果リンクを取り出す
///
/// 重複は除き、http(s) 以外のリンクは捨てる。
pub fn parse_result_links(html: &str, max_results: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = Vec::new();

    for anchor in RESULT_ANCHOR.find_iter(html) {
        if hits.len() >= max_results {
            break;
        }
        let Some(href) = HREF_ATTR
            .captures(anchor.as_str())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };
        let Some(url) = resolve_result_url(href) else {
            continue;
        };
        if hits.iter().any(|h| h.url == url) {
            continue;
        }
        hits.push(SearchHit { url });
    }

    hits
}

/// `//duckduckgo.com/l/?uddg=<エンコード済みURL>&rut=...` を展開
fn resolve_result_url(href: &str) -> Option<String> {
    let href = html_escape::decode_html_entities(href).to_string();

    let url = match href.split_once("uddg=") {
        Some((_, rest)) => {
            let encoded = rest.split('&').next().unwrap_or_default();
            urlencoding::decode(encoded).ok()?.into_owned()
        }
        None if href.starts_with("//") => format!("https:{}", href),
        None => href,
    };

    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url)
    } else {
        None
    }
}
