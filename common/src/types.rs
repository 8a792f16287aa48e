//! 照合データ型定義
//!
//! CLIと検証エンジンで共有される型:
//! - VerdictResult / ConfirmedResult: 判定区分
//! - Verdict: 外部へ返す唯一の判定オブジェクト
//! - ReferenceText: 仕様書から抽出した参照テキスト
//! - EvidenceCandidate: 文書ごとの抽出候補

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 判定区分
///
/// 旧ツールのキャッシュ (`GENUINE` / `FAKE` / `UNVERIFIABLE`) も読み込めるよう
/// エイリアスを受け付ける。応答検証ではエイリアスを使わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictResult {
    #[serde(rename = "MATCH", alias = "GENUINE")]
    Match,
    #[serde(rename = "MISMATCH", alias = "FAKE")]
    Mismatch,
    #[serde(rename = "INDETERMINATE", alias = "UNVERIFIABLE")]
    Indeterminate,
}

impl VerdictResult {
    /// 応答検証で受け付ける正式名称
    pub const CANONICAL: [&'static str; 3] = ["MATCH", "MISMATCH", "INDETERMINATE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictResult::Match => "MATCH",
            VerdictResult::Mismatch => "MISMATCH",
            VerdictResult::Indeterminate => "INDETERMINATE",
        }
    }

    /// 正式名称のみを受け付ける厳密な変換
    pub fn from_canonical(s: &str) -> Option<Self> {
        match s {
            "MATCH" => Some(VerdictResult::Match),
            "MISMATCH" => Some(VerdictResult::Mismatch),
            "INDETERMINATE" => Some(VerdictResult::Indeterminate),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "MATCH" | "GENUINE" => Ok(VerdictResult::Match),
            "MISMATCH" | "FAKE" => Ok(VerdictResult::Mismatch),
            "INDETERMINATE" | "UNVERIFIABLE" => Ok(VerdictResult::Indeterminate),
            _ => Err(Error::Parse(format!(
                "Unknown result: {}. Use match, mismatch, or indeterminate",
                s
            ))),
        }
    }
}

/// 人による確認結果（INDETERMINATE は存在しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmedResult {
    #[serde(rename = "MATCH", alias = "GENUINE")]
    Match,
    #[serde(rename = "MISMATCH", alias = "FAKE")]
    Mismatch,
}

impl From<ConfirmedResult> for VerdictResult {
    fn from(result: ConfirmedResult) -> Self {
        match result {
            ConfirmedResult::Match => VerdictResult::Match,
            ConfirmedResult::Mismatch => VerdictResult::Mismatch,
        }
    }
}

impl TryFrom<VerdictResult> for ConfirmedResult {
    type Error = Error;

    fn try_from(result: VerdictResult) -> Result<Self> {
        match result {
            VerdictResult::Match => Ok(ConfirmedResult::Match),
            VerdictResult::Mismatch => Ok(ConfirmedResult::Mismatch),
            VerdictResult::Indeterminate => Err(Error::Parse(
                "INDETERMINATE cannot be confirmed; use MATCH or MISMATCH".into(),
            )),
        }
    }
}

impl fmt::Display for ConfirmedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(VerdictResult::from(*self).as_str())
    }
}

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub result: VerdictResult,
    pub confidence: u8,
    pub reasoning: String,
}

impl Verdict {
    pub const MAX_CONFIDENCE: u8 = 100;

    /// 不変条件を満たす判定を生成
    ///
    /// - 信頼度は 100 で頭打ち
    /// - INDETERMINATE の信頼度は常に 0
    /// - 理由が空なら判定区分名で補う
    pub fn new(result: VerdictResult, confidence: u8, reasoning: impl Into<String>) -> Self {
        let confidence = match result {
            VerdictResult::Indeterminate => 0,
            _ => confidence.min(Self::MAX_CONFIDENCE),
        };
        let reasoning = reasoning.into().trim().to_string();
        let reasoning = if reasoning.is_empty() {
            format!("Verdict {} returned without explanation.", result)
        } else {
            reasoning
        };

        Self {
            result,
            confidence,
            reasoning,
        }
    }

    pub fn indeterminate(reasoning: impl Into<String>) -> Self {
        Self::new(VerdictResult::Indeterminate, 0, reasoning)
    }
}

/// 仕様書から抽出した参照テキスト
///
/// 空文字・空白のみ・未取得はすべて「根拠なし」を意味する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceText(String);

impl ReferenceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn absent() -> Self {
        Self(String::new())
    }

    pub fn is_absent(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReferenceText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for ReferenceText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<Option<String>> for ReferenceText {
    fn from(text: Option<String>) -> Self {
        Self(text.unwrap_or_default())
    }
}

impl fmt::Display for ReferenceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参照文書の取得元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EvidenceSource {
    /// 検索で見つけたオンライン文書
    Online { url: String },
    /// ローカルの検証済み文書
    Local { path: PathBuf },
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceSource::Online { url } => write!(f, "{}", url),
            EvidenceSource::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

/// 文書1件から得られた抽出候補
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceCandidate {
    pub source: EvidenceSource,
    /// 1始まりのページ番号
    pub page: usize,
    pub score: u32,
    pub text: String,
}

/// OCRテキストから型番を導出
///
/// 先頭トークンを取り、OCR許可文字（英数字と `-`）のみ残す。
/// 大文字小文字はそのまま保持する。
pub fn derive_identifier(scanned_text: &str) -> Option<String> {
    let token = scanned_text.split_whitespace().next()?;
    let identifier: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let identifier = identifier.trim_matches('-').to_string();

    if identifier.is_empty() {
        None
    } else {
        Some(identifier)
    }
}
