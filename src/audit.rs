use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::metadata::{NftMetadata, TraitValue};

/// 出荷前チェックの結果
#[derive(Debug, Default)]
pub struct AuditReport {
    pub total: usize,
    pub expected: Option<u32>,
    pub missing_numbers: Vec<u64>,
    pub duplicate_numbers: Vec<u64>,
    /// 1..=N（N は期待件数、未指定なら実際の件数）の外にある Number
    pub out_of_range_numbers: Vec<u64>,
    /// (ファイル名, 理由)
    pub violations: Vec<(String, String)>,
    pub warnings: Vec<(String, String)>,
    pub themes: BTreeMap<String, usize>,
    pub duplicate_descriptions: usize,
}

impl AuditReport {
    pub fn is_ok(&self) -> bool {
        let count_ok = self
            .expected
            .map(|n| n as usize == self.total)
            .unwrap_or(true);
        count_ok
            && self.missing_numbers.is_empty()
            && self.duplicate_numbers.is_empty()
            && self.out_of_range_numbers.is_empty()
            && self.violations.is_empty()
    }
}

/// "ipfs://<cid>/<path>" を (cid, path) に分解
pub fn split_ipfs_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("ipfs://")?;
    let (cid, path) = rest.split_once('/')?;
    if cid.is_empty() || path.is_empty() {
        return None;
    }
    Some((cid, path))
}

/// metadata ディレクトリ内の JSON を全件検査する
pub fn audit_metadata_dir(
    dir: &Path,
    expected: Option<u32>,
    expected_cid: Option<&str>,
) -> Result<AuditReport> {
    let mut report = AuditReport {
        expected,
        ..Default::default()
    };
    let mut number_counts: BTreeMap<u64, usize> = BTreeMap::new();
    let mut descriptions: HashMap<String, usize> = HashMap::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("metadata ディレクトリが読めません: {:?}", dir))?
    {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let file = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<unknown>")
            .to_string();

        let text = fs::read_to_string(&path)
            .with_context(|| format!("JSON 読み込み失敗: {:?}", path))?;
        let meta: NftMetadata = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(err) => {
                report.total += 1;
                report.violations.push((file, format!("JSON パース失敗: {}", err)));
                continue;
            }
        };

        report.total += 1;

        if file != format!("{}.json", meta.name) {
            report
                .violations
                .push((file.clone(), format!("ファイル名が name ({}) と一致しません", meta.name)));
        }

        match meta.number() {
            Some(n) => *number_counts.entry(n).or_insert(0) += 1,
            None => report
                .violations
                .push((file.clone(), "Number 属性がありません".into())),
        }

        match split_ipfs_uri(&meta.image) {
            Some((cid, path)) => {
                if let Some(want) = expected_cid {
                    if cid != want {
                        report
                            .violations
                            .push((file.clone(), format!("image の CID が違います: {}", cid)));
                    }
                }
                if path.contains(' ') {
                    report
                        .warnings
                        .push((file.clone(), "image のパスにスペースが含まれています".into()));
                }
            }
            None => report
                .violations
                .push((file.clone(), format!("image が ipfs://<cid>/<path> 形式ではありません: {}", meta.image))),
        }

        for attr in &meta.attributes {
            if let ("Theme", TraitValue::Text(theme)) = (&attr.trait_type[..], &attr.value) {
                *report.themes.entry(theme.clone()).or_insert(0) += 1;
            }
        }
        *descriptions.entry(meta.description).or_insert(0) += 1;
    }

    report.duplicate_numbers = number_counts
        .iter()
        .filter(|(_, c)| **c > 1)
        .map(|(n, _)| *n)
        .collect();

    // 範囲はファイルの中身ではなく件数で決める
    let upper = expected.map(|n| n as u64).unwrap_or(report.total as u64);
    let present: BTreeSet<u64> = number_counts.keys().copied().collect();
    report.out_of_range_numbers = present
        .iter()
        .copied()
        .filter(|n| *n == 0 || *n > upper)
        .collect();
    report.missing_numbers = (1..=upper).filter(|n| !present.contains(n)).collect();

    report.duplicate_descriptions = descriptions.values().filter(|c| **c > 1).map(|c| c - 1).sum();

    Ok(report)
}
