//! 人による確認結果キャッシュ
//!
//! 型番をキーに、QA担当者が確定した MATCH / MISMATCH を保存する。
//! 自動判定の結果は書き込まない。期限切れはなく、同じ型番の再確認で上書きする。
//!
//! ファイル形式は旧ツールの `verified_cache.json` と互換:
//! `{ "<型番>": { "result", "verified_by", "oem_spec", "timestamp", "notes" } }`

use crate::error::{MarkingError, Result};
use fs2::FileExt;
use marking_verify_common::{ConfirmedResult, VerdictResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const VERIFIED_BY_HUMAN: &str = "human";

/// キャッシュエントリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: ConfirmedResult,
    #[serde(default)]
    pub verified_by: String,
    /// 確認時に使った仕様書テキスト
    #[serde(default)]
    pub oem_spec: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub notes: String,
}

/// ディスク上の確認結果キャッシュ
///
/// 参照のたびに全体を読み込み、更新のたびに全体を書き戻す。
#[derive(Debug, Clone)]
pub struct VerdictCache {
    path: PathBuf,
}

impl VerdictCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// キャッシュファイルを読み込み
    ///
    /// ファイルがない・壊れている場合は空として扱う。
    /// 個別に壊れたエントリは読み飛ばす。
    pub fn entries(&self) -> BTreeMap<String, CacheEntry> {
        if !self.path.exists() {
            return BTreeMap::new();
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                warn!("キャッシュを開けません ({}): {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        let raw: BTreeMap<String, serde_json::Value> =
            match serde_json::from_reader(BufReader::new(file)) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("キャッシュが破損しています、空として扱います ({}): {}", self.path.display(), e);
                    return BTreeMap::new();
                }
            };

        raw.into_iter()
            .filter_map(|(identifier, value)| match serde_json::from_value(value) {
                Ok(entry) => Some((identifier, entry)),
                Err(e) => {
                    warn!("不正なキャッシュエントリを無視: {} ({})", identifier, e);
                    None
                }
            })
            .collect()
    }

    /// キャッシュをルックアップ（型番の大文字小文字は区別しない）
    pub fn get(&self, identifier: &str) -> Option<CacheEntry> {
        let identifier = identifier.trim();
        let entries = self.entries();

        if let Some(entry) = entries.get(identifier) {
            return Some(entry.clone());
        }

        entries
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(identifier))
            .map(|(_, entry)| entry)
    }

    /// 人による確認結果を保存
    ///
    /// INDETERMINATE と空の型番は書き込まずにエラーを返す。
    pub fn put(
        &self,
        identifier: &str,
        result: VerdictResult,
        evidence: &str,
        notes: &str,
    ) -> Result<CacheEntry> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(MarkingError::InvalidConfirmation("型番が空です".into()));
        }
        let result = ConfirmedResult::try_from(result)
            .map_err(|e| MarkingError::InvalidConfirmation(e.to_string()))?;

        let entry = CacheEntry {
            result,
            verified_by: VERIFIED_BY_HUMAN.into(),
            oem_spec: evidence.to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            notes: notes.trim().to_string(),
        };

        let _lock = self.lock()?;
        let mut entries = self.entries();
        entries.retain(|key, _| !key.eq_ignore_ascii_case(identifier));
        entries.insert(identifier.to_string(), entry.clone());
        self.write_entries(&entries)?;

        debug!("キャッシュに保存: {} → {}", identifier, result);
        Ok(entry)
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// キャッシュファイルを削除（存在しなければ `Ok(false)`）
    pub fn clear(&self) -> Result<bool> {
        let _lock = self.lock()?;
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// 他プロセスとの同時更新を防ぐ排他ロック（ドロップで解放）
    fn lock(&self) -> Result<File> {
        std::fs::create_dir_all(self.parent_dir())?;

        let mut lock_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "verified_cache.json".into());
        lock_name.push(".lock");

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.parent_dir().join(lock_name))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// 一時ファイルに書いてから置き換える
    fn write_entries(&self, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
        let tmp = tempfile::NamedTempFile::new_in(self.parent_dir())?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
