//! Analyze media files from the command line.
//!
//! `dfscan-analyze <file>...` prints one JSON response per file.
//! `dfscan-analyze --check` verifies FFmpeg, configuration and the work dir.

use std::path::Path;

use anyhow::Context;
use dfscan_pipeline::{init_tracing, AnalyzerConfig, MediaAnalyzer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: dfscan-analyze <file>... | --check");
        std::process::exit(2);
    }

    let config = AnalyzerConfig::from_env().context("invalid configuration")?;

    if args.iter().any(|a| a == "--check") {
        return self_check(&config).await;
    }

    let analyzer = MediaAnalyzer::from_config(config)?;
    for arg in &args {
        let response = analyzer.analyze(Path::new(arg)).await;
        println!("{}", serde_json::to_string(&response)?);
    }
    Ok(())
}

async fn self_check(config: &AnalyzerConfig) -> anyhow::Result<()> {
    println!(
        "dfscan-analyze: checking with work_dir={}",
        config.pipeline.work_dir.display()
    );
    tokio::fs::create_dir_all(&config.pipeline.work_dir)
        .await
        .context("work dir is not writable")?;
    dfscan_media::check_ffmpeg()?;
    dfscan_media::check_ffprobe()?;

    println!("dfscan-analyze: ok");
    Ok(())
}
