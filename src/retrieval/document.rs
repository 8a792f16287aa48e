//! 仕様書の読み込みと関連箇所の抽出

use crate::error::{MarkingError, Result};
use marking_verify_common::{best_page, extract_passage, score_page, EvidenceCandidate, EvidenceSource};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DOCUMENT_EXTENSION: &str = "pdf";

/// 文書をページ単位のテキストにする
pub trait DocumentReader: Send + Sync {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDFリーダー（pdf-extract）
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>> {
        if !path.exists() {
            return Err(MarkingError::FileNotFound(path.display().to_string()));
        }

        // 壊れたPDFで pdf-extract がパニックすることがある
        panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)))
            .map_err(|_| {
                MarkingError::DocumentUnreadable(format!("{} (パーサーが異常終了)", path.display()))
            })?
            .map_err(|e| MarkingError::DocumentUnreadable(format!("{}: {}", path.display(), e)))
    }
}

/// 文書中で最も関連度の高いページから抜粋を作る
///
/// 採点対象ページがない、または抜粋が空なら `None`。
pub fn best_passage(
    pages: &[String],
    identifier: &str,
    source: EvidenceSource,
) -> Option<EvidenceCandidate> {
    // 順序を保つ collect なので同点時は先のページが残る
    let scores: Vec<u32> = pages
        .par_iter()
        .map(|page| score_page(page, identifier))
        .collect();

    let (index, score) = best_page(&scores)?;
    let text = extract_passage(&pages[index], identifier);
    if text.trim().is_empty() {
        return None;
    }

    Some(EvidenceCandidate {
        source,
        page: index + 1,
        score,
        text,
    })
}

/// 検証済み仕様書フォルダ直下のPDFをファイル名順に列挙
///
/// フォルダがなければ空。
pub fn list_local_documents(folder: &Path) -> Vec<PathBuf> {
    if !folder.is_dir() {
        return Vec::new();
    }

    let mut documents: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_document_path(path))
        .collect();

    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    documents
}

fn is_document_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        .unwrap_or(false)
}
