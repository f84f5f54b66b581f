//! 画像ファイルを "<prefix> #001.png" 形式の連番にリネームする
//!
//! まず全件の old -> new を計画して検証し、その後2段階で移動する。
//! 途中で失敗した場合は実行済みの移動を逆順に戻す。

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::images::{collect_images, file_name, lowercase_extension};

/// 1ファイル分の移動
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl Rename {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug)]
pub struct RenamePlan {
    dir: PathBuf,
    renames: Vec<Rename>,
}

/// 連番ファイル名（拡張子は小文字化したものを付ける）
pub fn numbered_name(prefix: &str, index: usize, extension: &str) -> String {
    format!("{} #{:03}{}", prefix, index, extension)
}

/// リネーム計画を立てる。ファイルには一切触らない
pub fn plan_renames(dir: &Path, prefix: &str) -> Result<RenamePlan> {
    let sources = collect_images(dir)?;

    let renames: Vec<Rename> = sources
        .into_iter()
        .enumerate()
        .map(|(i, from)| {
            let to = dir.join(numbered_name(prefix, i + 1, &lowercase_extension(&from)));
            Rename { from, to }
        })
        .collect();

    let plan = RenamePlan {
        dir: dir.to_path_buf(),
        renames,
    };
    plan.validate()?;
    Ok(plan)
}

impl RenamePlan {
    pub fn renames(&self) -> &[Rename] {
        &self.renames
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// 移動先の重複と、計画外の既存ファイルとの衝突を検出
    fn validate(&self) -> Result<()> {
        let sources: HashSet<String> = self
            .renames
            .iter()
            .map(|r| file_name(&r.from).to_lowercase())
            .collect();

        // 大文字小文字を区別しない FS も想定して小文字で比較する
        let mut targets = HashSet::new();
        for r in &self.renames {
            let target = file_name(&r.to).to_lowercase();
            if !targets.insert(target.clone()) {
                bail!("リネーム先が重複しています: {:?}", r.to);
            }
            if r.to.exists() && !sources.contains(&target) {
                bail!(
                    "リネーム先に計画外のファイルが既に存在します: {:?} ({:?} から)",
                    r.to,
                    r.from
                );
            }
        }
        Ok(())
    }

    fn staging_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!(".rename-staging-{}-{:05}", std::process::id(), index))
    }

    /// 計画を実行する。失敗時はディレクトリを元の状態に戻してエラーを返す
    pub fn execute(&self) -> Result<usize> {
        let moves: Vec<&Rename> = self.renames.iter().filter(|r| !r.is_noop()).collect();
        let mut journal: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(moves.len() * 2);

        let result = self.run_moves(&moves, &mut journal);
        if let Err(err) = result {
            rollback(&journal);
            return Err(err);
        }

        for r in &self.renames {
            println!("Renamed: {} -> {}", file_name(&r.from), file_name(&r.to));
        }
        Ok(self.len())
    }

    fn run_moves(&self, moves: &[&Rename], journal: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
        // 1段目: 一時名へ退避（連番同士の入れ替わりに対応するため）
        let mut staged = Vec::with_capacity(moves.len());
        for (i, r) in moves.iter().enumerate() {
            let staging = self.staging_path(i);
            if staging.exists() {
                bail!("一時ファイル名が既に存在します: {:?}", staging);
            }
            move_file(&r.from, &staging, journal)?;
            staged.push((staging, &r.to));
        }

        // 2段目: 最終名へ
        for (staging, to) in staged {
            move_file(&staging, to, journal)?;
        }
        Ok(())
    }
}

fn move_file(from: &Path, to: &Path, journal: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
    fs::rename(from, to)
        .with_context(|| format!("リネームに失敗しました: {:?} -> {:?}", from, to))?;
    journal.push((from.to_path_buf(), to.to_path_buf()));
    Ok(())
}

fn rollback(journal: &[(PathBuf, PathBuf)]) {
    for (from, to) in journal.iter().rev() {
        if let Err(err) = fs::rename(to, from) {
            tracing::error!(from = ?to, to = ?from, error = %err, "rollback failed");
        }
    }
    if !journal.is_empty() {
        tracing::warn!(moves = journal.len(), "rename batch rolled back");
    }
}

/// ディレクトリ内の画像を連番にリネームし、件数を返す
pub fn rename_images(dir: &Path, prefix: &str) -> Result<usize> {
    if !dir.is_dir() {
        bail!("画像ディレクトリが存在しません: {:?}", dir);
    }
    let plan = plan_renames(dir, prefix)?;
    if plan.is_empty() {
        tracing::info!(dir = ?dir, "no images to rename");
        return Ok(0);
    }
    plan.execute()
}
