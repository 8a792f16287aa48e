use marking_verify_common::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkingError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`marking-verify config --set-api-key YOUR_KEY` または GROQ_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("通信エラー: {0}")]
    Transport(String),

    #[error("文書ではない応答を拒否: {url} (Content-Type: {content_type})")]
    ContentRejected { url: String, content_type: String },

    #[error("文書を読み込めません: {0}")]
    DocumentUnreadable(String),

    #[error("推論レスポンスが不正: {0}")]
    Validation(#[from] ValidationError),

    #[error("参照文書が見つかりません: {0}")]
    EvidenceAbsent(String),

    #[error("確認結果が不正: {0}")]
    InvalidConfirmation(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for MarkingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MarkingError::Transport(format!("タイムアウト: {}", e))
        } else {
            MarkingError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkingError>;
