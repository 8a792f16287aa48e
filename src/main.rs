use clap::Parser;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use marking_verify::{cli, config, context, error, pipeline, retrieval, verifier};
use marking_verify::common::{EvidenceSource, VerdictResult};
use cli::{Cli, Commands};
use config::Config;
use context::AppContext;
use error::{MarkingError, Result};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Verify { text, file, identifier, json } => {
            let scanned_text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => {
                    if !path.exists() {
                        return Err(MarkingError::FileNotFound(path.display().to_string()));
                    }
                    std::fs::read_to_string(&path)?
                }
                (None, None) => String::new(),
            };

            let ctx = AppContext::new(config)?;
            let spinner = spinner("仕様書を検索・照合中...");
            let report = pipeline::verify_marking(&ctx, &scanned_text, identifier.as_deref()).await;
            spinner.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("🔍 marking-verify - 刻印照合\n");
                println!("  型番: {}", report.identifier.as_deref().unwrap_or("(不明)"));
                match &report.evidence {
                    Some(candidate) => println!("  参照: {} (p.{})", describe_source(&candidate.source), candidate.page),
                    None => println!("  参照: なし"),
                }
                println!("\n  判定: {}", report.verdict.result);
                println!("  信頼度: {}%", report.verdict.confidence);
                println!("  理由: {}", report.verdict.reasoning);
            }
        }

        Commands::Retrieve { identifier } => {
            let ctx = AppContext::new(config)?;
            let agent = retrieval::EvidenceAgent::new(&ctx);

            let spinner = spinner(&format!("{} の仕様書を検索中...", identifier));
            let candidate = agent.retrieve_candidate(&identifier).await;
            spinner.finish_and_clear();

            match candidate {
                Some(candidate) => {
                    println!("✔ 参照: {} (p.{}, score {})\n", describe_source(&candidate.source), candidate.page, candidate.score);
                    println!("{}", candidate.text);
                }
                None => {
                    return Err(MarkingError::EvidenceAbsent(identifier));
                }
            }
        }

        Commands::Confirm { identifier, result, evidence, evidence_file, notes } => {
            let result = match result {
                Some(result) => result,
                None => prompt_result(&identifier)?,
            };

            let evidence = match (evidence, evidence_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => String::new(),
            };

            let ctx = AppContext::new(config)?;
            let engine = verifier::VerdictEngine::new(&ctx);
            let entry = engine.confirm(&identifier, result, &evidence, &notes)?;

            println!("✔ 確認結果を保存しました: {} → {}", identifier.trim(), entry.result);
            println!("  保存先: {}", ctx.cache.path().display());
        }

        Commands::Cache { clear, list } => {
            let cache = verifier::VerdictCache::new(config.cache_file.clone());

            if clear {
                match cache.clear() {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache.path().display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            } else {
                let entries = cache.entries();
                println!("キャッシュ情報:");
                println!("  パス: {}", cache.path().display());
                println!("  件数: {}", entries.len());

                if list {
                    for (identifier, entry) in &entries {
                        println!("  {} → {} ({})", identifier, entry.result, entry.timestamp);
                    }
                }
            }
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  推論API: {}", config.reasoning.base_url);
                println!("  モデル: {}", config.reasoning.model);
                println!("  検索件数: {}", config.search.max_results);
                println!("  検証済み仕様書: {}", config.fallback_dir.display());
                println!("  キャッシュ: {}", config.cache_file.display());
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

/// ログは stderr に出す（stdout は結果出力用）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// 確認結果を対話入力
fn prompt_result(identifier: &str) -> Result<VerdictResult> {
    let choices = [VerdictResult::Match, VerdictResult::Mismatch];
    let labels: Vec<&str> = choices.iter().map(|c| c.as_str()).collect();

    let selection = Select::new()
        .with_prompt(format!("{} の確認結果", identifier.trim()))
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| MarkingError::InvalidConfirmation(e.to_string()))?;

    Ok(choices[selection])
}

fn describe_source(source: &EvidenceSource) -> String {
    match source {
        EvidenceSource::Online { url } => url.clone(),
        EvidenceSource::Local { path } => format!("{} (検証済み)", path.display()),
    }
}
