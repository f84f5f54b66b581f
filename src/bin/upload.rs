use astral_nft_tools::config::Config;
use astral_nft_tools::logging;
use astral_nft_tools::upload::{UploadError, upload_from_config};

use anyhow::Result;
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::error;

/// 画像フォルダを Pinata にアップロードし、CID を保存する
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// 対象ディレクトリ（images.directory を上書き）
    #[arg(long)]
    dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let cfg = Config::load_or_default(&args.config)?;
    let dir = args.dir.unwrap_or_else(|| cfg.images.directory.clone());

    if let Err(err) = run(&cfg, &dir) {
        error!(error = %err, "upload failed");
        eprintln!("❌ Upload failed: {}", error_chain(&err));
        eprintln!("   No CID was written; fix the problem above and run again.");
        std::process::exit(1);
    }

    Ok(())
}

fn run(cfg: &Config, dir: &Path) -> Result<(), UploadError> {
    println!("Uploading images from {:?} to Pinata...", dir);
    match upload_from_config(&cfg.pinning, dir)? {
        Some(pinned) => {
            println!(
                "✅ Uploaded {} images. CID: {}",
                pinned.files, pinned.cid
            );
            println!("CID saved to {:?}", cfg.pinning.cid_file);
        }
        None => println!("Uploaded 0 images (nothing to do)"),
    }
    Ok(())
}

fn error_chain(err: &UploadError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
