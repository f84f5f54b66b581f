use astral_nft_tools::config::Config;
use astral_nft_tools::logging;
use astral_nft_tools::metadata::generate_metadata;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// NFT メタデータ（JSON）を一括生成する
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// 乱数シード（指定すると同じ結果を再現できる）
    #[arg(long)]
    seed: Option<u64>,

    /// 生成数（metadata.count を上書き）
    #[arg(long)]
    count: Option<u32>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut cfg = Config::load_or_default(&args.config)?;
    if let Some(count) = args.count {
        cfg.metadata.count = count;
    }

    let cid = cfg
        .resolve_cid()
        .context("画像フォルダの CID を決定できませんでした")?;

    let mut rng = match args.seed.or(cfg.metadata.seed) {
        Some(seed) => {
            tracing::info!(seed, "using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    println!(
        "Generating {} metadata files (cid: {})...",
        cfg.metadata.count, cid
    );

    let records = generate_metadata(&cfg, &cid, &mut rng)?;
    for record in &records {
        println!("Generated metadata for {}", record.name);
    }

    println!(
        "✅ Metadata files saved in {:?} ({} records)",
        cfg.metadata.output_dir,
        records.len()
    );

    Ok(())
}
