use anyhow::{Result, bail};
use image::ImageFormat;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 対象とする画像拡張子（大文字小文字は区別しない）
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// ディレクトリ直下の画像ファイルを列挙し、ファイル名順に並べる
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("画像ディレクトリが存在しません: {:?}", dir);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if is_image(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| compare_file_names(a, b));
    Ok(files)
}

/// 大文字小文字を無視した辞書順。同じになった場合は元のバイト順で決める
pub fn compare_file_names(a: &Path, b: &Path) -> Ordering {
    let a = file_name(a);
    let b = file_name(b);
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 拡張子を小文字・ドット付きで返す（例: ".jpg"）
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// アップロード時の Content-Type
pub fn mime_type(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
