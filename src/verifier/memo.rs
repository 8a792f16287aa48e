//! 判定メモ（LRU）
//!
//! 同一セッションで同じ入力を繰り返し照合したときに推論APIを呼ばないための
//! 上限付きメモ。永続キャッシュ（人による確認結果）とは別物で、
//! 正しさには関与しない。

use lru::LruCache;
use marking_verify_common::Verdict;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// 正規化した (刻印テキスト, 参照テキスト, 型番) のダイジェスト
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey([u8; 32]);

impl MemoKey {
    pub fn new(scanned_text: &str, reference_text: &str, identifier: &str) -> Self {
        let identifier = identifier.trim().to_uppercase();
        let mut hasher = Sha256::new();
        for part in [scanned_text.trim(), reference_text.trim(), identifier.as_str()] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug)]
struct MemoEntry {
    identifier: String,
    verdict: Verdict,
}

/// 上限付きLRUメモ
#[derive(Debug)]
pub struct VerdictMemo {
    /// 上限 0 なら `None`（無効）
    entries: Option<Mutex<LruCache<MemoKey, MemoEntry>>>,
}

impl VerdictMemo {
    /// `capacity` が 0 ならメモは常に空
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    fn entries(&self) -> Option<MutexGuard<'_, LruCache<MemoKey, MemoEntry>>> {
        self.entries
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    pub fn get(&self, key: &MemoKey) -> Option<Verdict> {
        // get は最近使用に更新する
        self.entries()?.get(key).map(|e| e.verdict.clone())
    }

    pub fn insert(&self, key: MemoKey, identifier: &str, verdict: Verdict) {
        if let Some(mut entries) = self.entries() {
            entries.put(
                key,
                MemoEntry {
                    identifier: identifier.trim().to_uppercase(),
                    verdict,
                },
            );
        }
    }

    /// 型番に紐づくメモをすべて破棄（確認結果の更新時）
    pub fn invalidate_identifier(&self, identifier: &str) -> usize {
        let Some(mut entries) = self.entries() else {
            return 0;
        };
        let identifier = identifier.trim().to_uppercase();

        let stale: Vec<MemoKey> = entries
            .iter()
            .filter(|(_, e)| e.identifier == identifier)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.entries() {
            entries.clear();
        }
    }
}

impl Default for VerdictMemo {
    fn default() -> Self {
        Self::new(128)
    }
}
