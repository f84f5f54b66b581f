use astral_nft_tools::config::Config;
use astral_nft_tools::logging;
use astral_nft_tools::rename::rename_images;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// 画像ファイルを "<prefix> #001.png" 形式にリネームする
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
    let count = rename_images(&dir, &cfg.images.prefix)?;

    println!("Renamed {} images in {:?}", count, dir);
    Ok(())
}
