//! Marking Verify Common Library
//!
//! 刻印照合の純粋ロジック（I/Oなし）:
//! ページ採点、関連行抽出、推論応答の検証、プロンプト生成、共有型

pub mod error;
pub mod extractor;
pub mod parser;
pub mod prompts;
pub mod scorer;
pub mod types;

pub use error::{Error, Result};
pub use extractor::{extract_passage, identifier_pattern};
pub use parser::{strip_code_fence, validate_response, ValidationError};
pub use prompts::{build_search_query, build_verification_prompt, SYSTEM_PROMPT};
pub use scorer::{best_page, score_page, DENYLIST_TERMS, RELEVANCE_KEYWORDS};
pub use types::{
    derive_identifier, ConfirmedResult, EvidenceCandidate, EvidenceSource, ReferenceText,
    Verdict, VerdictResult,
};
