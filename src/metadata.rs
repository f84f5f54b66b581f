use anyhow::{Context, Result, anyhow, bail};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use url::Url;

use crate::config::Config;
use crate::descriptions::generate_descriptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: TraitValue,
}

/// Number は数値、Theme は文字列として出力する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Number(u64),
    Text(String),
}

impl NftMetadata {
    /// attributes 中の "Number" の値
    pub fn number(&self) -> Option<u64> {
        self.attributes.iter().find_map(|a| match (&a.trait_type[..], &a.value) {
            ("Number", TraitValue::Number(n)) => Some(*n),
            _ => None,
        })
    }
}

/// 生成1回分に必要な値
#[derive(Debug, Clone)]
pub struct RecordParams<'a> {
    pub base_name: &'a str,
    pub image_name: &'a str,
    pub image_extension: &'a str,
    pub cid: &'a str,
    pub theme: &'a str,
    pub encode_image_path: bool,
}

impl<'a> RecordParams<'a> {
    pub fn from_config(cfg: &'a Config, cid: &'a str) -> Self {
        Self {
            base_name: &cfg.metadata.base_name,
            image_name: cfg.image_name(),
            image_extension: &cfg.metadata.image_extension,
            cid,
            theme: &cfg.metadata.theme,
            encode_image_path: cfg.metadata.encode_image_path,
        }
    }
}

/// "<base> #001" 形式の表示名
pub fn display_name(base: &str, index: u32) -> String {
    format!("{} #{:03}", base, index)
}

/// "ipfs://<cid>/<image_name> #001.jpg"
pub fn image_uri(params: &RecordParams, index: u32) -> Result<String> {
    let path = format!("{}{}", display_name(params.image_name, index), params.image_extension);
    let path = if params.encode_image_path {
        encode_path_segment(&path)?
    } else {
        path
    };
    Ok(format!("ipfs://{}/{}", params.cid, path))
}

/// パス1セグメント分をパーセントエンコードする（空白、#、?、%、/ など）
pub fn encode_path_segment(segment: &str) -> Result<String> {
    let mut url = Url::parse("ipfs://cid/")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("ipfs URL にパスを追加できません"))?
        .push(segment);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// NFT メタデータを構築
pub fn build_metadata(index: u32, params: &RecordParams, description: String) -> Result<NftMetadata> {
    Ok(NftMetadata {
        name: display_name(params.base_name, index),
        description,
        image: image_uri(params, index)?,
        attributes: vec![
            Attribute {
                trait_type: "Number".into(),
                value: TraitValue::Number(index as u64),
            },
            Attribute {
                trait_type: "Theme".into(),
                value: TraitValue::Text(params.theme.to_string()),
            },
        ],
    })
}

/// count 件のメタデータをまとめて作る（description はシャッフル済みプールから順に割り当て）
pub fn build_collection<R: Rng + ?Sized>(
    count: u32,
    params: &RecordParams,
    rng: &mut R,
) -> Result<Vec<NftMetadata>> {
    let descriptions = generate_descriptions(count as usize, rng);
    (1..=count)
        .zip(descriptions)
        .map(|(index, description)| build_metadata(index, params, description))
        .collect()
}

/// インデント4スペースの JSON
pub fn to_pretty_json(metadata: &NftMetadata) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    metadata
        .serialize(&mut ser)
        .context("メタデータのJSONシリアライズに失敗しました")?;
    Ok(String::from_utf8(buf)?)
}

/// 全件を書き出す。
///
/// まず全件を出力ディレクトリ内の一時ファイルに書き、全て成功してから最終名へ差し替える。
/// 差し替え中に失敗した場合は、既存ファイルを退避先から戻して元のセットを復元する。
pub fn write_collection(output_dir: &Path, records: &[NftMetadata]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("メタデータ出力ディレクトリの作成に失敗しました: {:?}", output_dir))?;

    // 1段目: 一時ファイルへ。失敗しても NamedTempFile の drop で消えるだけで既存には触れない
    let mut staged: Vec<(NamedTempFile, PathBuf)> = Vec::with_capacity(records.len());
    for record in records {
        let path = output_dir.join(format!("{}.json", record.name));
        if path.exists() && !path.is_file() {
            bail!("メタデータの出力先がファイルではありません: {:?}", path);
        }

        let json = to_pretty_json(record)?;
        let mut tmp = NamedTempFile::new_in(output_dir)
            .with_context(|| format!("一時ファイルの作成に失敗しました: {:?}", output_dir))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("メタデータの書き込みに失敗しました: {:?}", path))?;
        staged.push((tmp, path));
    }

    // 2段目: 既存ファイルを退避してから差し替え
    let mut journal: Vec<(PathBuf, Option<TempPath>)> = Vec::with_capacity(staged.len());
    for (tmp, path) in staged {
        if let Err(err) = swap_into_place(output_dir, tmp, &path, &mut journal) {
            restore(journal);
            return Err(err);
        }
    }

    // 退避していた旧ファイルは TempPath の drop で削除される
    Ok(journal.into_iter().map(|(path, _)| path).collect())
}

fn swap_into_place(
    output_dir: &Path,
    tmp: NamedTempFile,
    path: &Path,
    journal: &mut Vec<(PathBuf, Option<TempPath>)>,
) -> Result<()> {
    let backup = if path.exists() {
        let backup = NamedTempFile::new_in(output_dir)
            .with_context(|| format!("一時ファイルの作成に失敗しました: {:?}", output_dir))?
            .into_temp_path();
        fs::rename(path, &backup)
            .with_context(|| format!("既存メタデータの退避に失敗しました: {:?}", path))?;
        Some(backup)
    } else {
        None
    };

    // 先に記録しておき、persist 失敗時も退避分を戻せるようにする
    journal.push((path.to_path_buf(), backup));
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("メタデータの書き込みに失敗しました: {:?}", path))?;
    Ok(())
}

fn restore(journal: Vec<(PathBuf, Option<TempPath>)>) {
    let count = journal.len();
    for (path, backup) in journal.into_iter().rev() {
        match backup {
            Some(backup) => {
                if let Err(err) = fs::rename(&backup, &path) {
                    tracing::error!(path = ?path, error = %err, "failed to restore metadata file");
                    // 戻せなかった旧ファイルは消さずに残す
                    if let Ok(kept) = backup.keep() {
                        tracing::warn!(path = ?kept, "previous metadata left in place");
                    }
                }
            }
            None => {
                if let Err(err) = fs::remove_file(&path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        tracing::error!(path = ?path, error = %err, "failed to remove new metadata file");
                    }
                }
            }
        }
    }
    if count > 0 {
        tracing::warn!(files = count, "metadata write rolled back");
    }
}

/// 設定に従ってコレクション全体を生成・保存する
pub fn generate_metadata<R: Rng + ?Sized>(
    cfg: &Config,
    cid: &str,
    rng: &mut R,
) -> Result<Vec<NftMetadata>> {
    if cfg.metadata.count == 0 {
        bail!("metadata.count は1以上を指定してください");
    }

    let params = RecordParams::from_config(cfg, cid);
    let records = build_collection(cfg.metadata.count, &params, rng)?;
    write_collection(&cfg.metadata.output_dir, &records)?;
    Ok(records)
}
