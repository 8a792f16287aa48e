//! 仕様書ダウンロード

use crate::config::DownloadConfig;
use crate::error::{MarkingError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// 文書として受け付ける Content-Type
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/x-pdf",
    "application/acrobat",
    "application/octet-stream",
];

/// ダウンロード結果
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    /// 応答ヘッダの Content-Type（なければ `None`）
    pub content_type: Option<String>,
}

impl FetchedDocument {
    pub fn is_document(&self) -> bool {
        self.content_type
            .as_deref()
            .map(is_document_content_type)
            .unwrap_or(false)
    }
}

/// 文書取得
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

/// Content-Type が文書かどうか（パラメータと大文字小文字は無視）
pub fn is_document_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    DOCUMENT_CONTENT_TYPES.contains(&mime.as_str())
}

pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MarkingError::Config(format!("HTTPクライアント生成エラー: {}", e)))?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        info!("ダウンロード: {}", url);

        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarkingError::Transport(format!(
                "ダウンロードエラー ({}): {}",
                status.as_u16(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // 本文を受信する前に判定する（ログインページなどを読み込まない）
        if !content_type.as_deref().map(is_document_content_type).unwrap_or(false) {
            return Err(MarkingError::ContentRejected {
                url: url.to_string(),
                content_type: content_type.unwrap_or_else(|| "(なし)".into()),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(MarkingError::Transport(format!(
                    "ファイルが大きすぎます: {} bytes (上限: {})",
                    length, self.max_bytes
                )));
            }
        }

        // Content-Length がない応答もあるので受信中にも上限を確認
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(MarkingError::Transport(format!(
                    "ダウンロードが上限を超えました: {} bytes",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!("受信: {} bytes ({:?})", bytes.len(), content_type);
        Ok(FetchedDocument {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_content_types() {
        assert!(is_document_content_type("application/pdf"));
        assert!(is_document_content_type("Application/PDF; charset=binary"));
        assert!(is_document_content_type("application/octet-stream"));
        assert!(!is_document_content_type("text/html; charset=utf-8"));
        assert!(!is_document_content_type(""));
    }

    #[test]
    fn test_missing_content_type_is_rejected() {
        let doc = FetchedDocument {
            bytes: b"%PDF-1.4".to_vec(),
            content_type: None,
        };
        assert!(!doc.is_document());
    }

    /// 1回だけ応答するローカルHTTPサーバー（本文は `sent_body` バイトだけ送って接続を保持）
    async fn serve_once(headers: String, sent_body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket.write_all(headers.as_bytes()).await.unwrap();
            socket.write_all(&sent_body).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{}/datasheet.pdf", addr)
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&DownloadConfig {
            timeout_seconds: 10,
            ..DownloadConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_html_rejected_before_body() {
        // 本文は届かないので、受信を待てばタイムアウトになる
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 100000\r\n\r\n"
                .to_string(),
            b"<html>".to_vec(),
        )
        .await;

        let started = std::time::Instant::now();
        let result = fetcher().fetch(&url).await;

        assert!(matches!(
            result,
            Err(MarkingError::ContentRejected { ref content_type, .. }) if content_type.starts_with("text/html")
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_pdf_body_received() {
        let body = b"%PDF-1.4 test".to_vec();
        let url = serve_once(
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\n\r\n",
                body.len()
            ),
            body.clone(),
        )
        .await;

        let document = fetcher().fetch(&url).await.unwrap();
        assert_eq!(document.bytes, body);
        assert!(document.is_document());
    }
}
