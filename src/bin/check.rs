use anyhow::Result;
use astral_nft_tools::audit::audit_metadata_dir;
use astral_nft_tools::config::Config;
use astral_nft_tools::logging;
use clap::Parser;
use std::path::PathBuf;

/// 生成済みメタデータを出荷前にチェックする
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// metadata ディレクトリ（metadata.output_dir を上書き）
    #[arg(long)]
    dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let cfg = Config::load_or_default(&args.config)?;
    let metadata_dir = args.dir.unwrap_or_else(|| cfg.metadata.output_dir.clone());

    // CID が分からなくても形式チェックはできる
    let cid = cfg.resolve_cid().ok();
    let max_examples = 20usize;

    let report = audit_metadata_dir(&metadata_dir, Some(cfg.metadata.count), cid.as_deref())?;

    println!("==============================");
    println!(" NFT Metadata Check");
    println!(" Total records: {} (expected {})", report.total, cfg.metadata.count);
    println!("==============================\n");

    println!("▶ Theme");
    for (theme, count) in &report.themes {
        let ratio = *count as f64 / report.total.max(1) as f64 * 100.0;
        println!("  {:30} {:5} ({:.2}%)", theme, count, ratio);
    }
    println!();
    println!("▶ Duplicated descriptions: {}", report.duplicate_descriptions);
    println!();

    if !report.missing_numbers.is_empty() {
        println!("❌ Missing numbers: {:?}", report.missing_numbers);
    }
    if !report.duplicate_numbers.is_empty() {
        println!("❌ Duplicated numbers: {:?}", report.duplicate_numbers);
    }
    if !report.out_of_range_numbers.is_empty() {
        println!("❌ Numbers out of range: {:?}", report.out_of_range_numbers);
    }

    if !report.warnings.is_empty() {
        println!("⚠ Warnings: {} (showing up to {})", report.warnings.len(), max_examples);
        for (file, msg) in report.warnings.iter().take(max_examples) {
            println!("  - {} : {}", file, msg);
        }
    }

    if report.violations.is_empty() {
        println!("✅ No violations found");
    } else {
        println!(
            "❌ Violations: {} (showing up to {})",
            report.violations.len(),
            max_examples
        );
        for (file, msg) in report.violations.iter().take(max_examples) {
            println!("  - {} : {}", file, msg);
        }
    }

    if !report.is_ok() {
        std::process::exit(1);
    }

    Ok(())
}
