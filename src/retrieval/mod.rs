//! 参照文書の探索
//!
//! - `search`: 検索プロバイダ
//! - `download`: 文書取得
//! - `document`: 文書の読み込み・採点・抜粋
//! - `agent`: 上記をつなぐ探索エージェント

pub mod agent;
pub mod document;
pub mod download;
pub mod search;

pub use agent::EvidenceAgent;
pub use document::{best_passage, list_local_documents, DocumentReader, PdfReader};
pub use download::{is_document_content_type, DocumentFetcher, FetchedDocument, HttpFetcher};
pub use search::{parse_result_links, DuckDuckGoProvider, SearchHit, SearchProvider};
