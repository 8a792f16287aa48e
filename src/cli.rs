use clap::{Parser, Subcommand};
use marking_verify_common::VerdictResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marking-verify")]
#[command(about = "電子部品の刻印を仕様書と照合するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 刻印テキストを仕様書と照合
    Verify {
        /// 刻印テキスト（OCR結果）
        #[arg(required_unless_present = "file")]
        text: Option<String>,

        /// 刻印テキストをファイルから読む
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// 型番（省略時は刻印テキストの先頭トークン）
        #[arg(short, long)]
        identifier: Option<String>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 仕様書を探して関連箇所を表示（判定はしない）
    Retrieve {
        /// 型番
        #[arg(required = true)]
        identifier: String,
    },

    /// 人による確認結果を保存
    Confirm {
        /// 型番
        #[arg(required = true)]
        identifier: String,

        /// 確認結果 (match/mismatch、省略時は対話入力)
        #[arg(short, long)]
        result: Option<VerdictResult>,

        /// 確認に使った仕様書テキスト
        #[arg(short, long)]
        evidence: Option<String>,

        /// 仕様書テキストをファイルから読む
        #[arg(long, conflicts_with = "evidence")]
        evidence_file: Option<PathBuf>,

        /// メモ
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// 確認結果キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 確認済みの型番を一覧表示
        #[arg(long)]
        list: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
