use serde::Deserialize;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    /// 設定ファイルが無ければデフォルト値で動かす（壊れている場合はエラー）
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            tracing::warn!(path, "config file not found, using defaults");
            return Ok(Config::default());
        }
        Config::load(path).with_context(|| format!("{} の読み込みに失敗しました", path))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub images: ImagesConfig,
    pub metadata: MetadataConfig,
    pub pinning: PinningConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub directory: PathBuf,
    pub prefix: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("images"),
            prefix: "Astral Pack Legends".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub output_dir: PathBuf,
    pub count: u32,
    pub base_name: String,
    /// 画像 URI に使う名前。未指定なら images.prefix（リネーム後のファイル名）と同じ
    pub image_name: Option<String>,
    pub image_extension: String,
    /// 未指定なら pinning.cid_file から読む
    pub cid: Option<String>,
    pub theme: String,
    pub seed: Option<u64>,
    pub encode_image_path: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("metadata"),
            count: 104,
            base_name: "Astral Pack Legend".into(),
            image_name: None,
            image_extension: ".jpg".into(),
            cid: None,
            theme: "Cosmic Fantasy".into(),
            seed: None,
            encode_image_path: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PinningConfig {
    pub api_url: String,
    /// JWT を読む環境変数名。トークン自体は設定ファイルに書かない
    pub jwt_env: String,
    pub cid_file: PathBuf,
    pub pin_name: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.pinata.cloud/pinning/pinFileToIPFS".into(),
            jwt_env: "PINATA_JWT".into(),
            cid_file: PathBuf::from("image_folder_cid.txt"),
            pin_name: None,
            timeout_secs: 300,
        }
    }
}

impl PinningConfig {
    /// 環境変数から Bearer トークンを取得（空文字は未設定扱い）
    pub fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.jwt_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl Config {
    /// 画像 URI 用の名前。リネーム時の prefix と揃える
    pub fn image_name(&self) -> &str {
        self.metadata
            .image_name
            .as_deref()
            .unwrap_or(&self.images.prefix)
    }

    /// メタデータに埋め込む画像フォルダの CID を決める
    pub fn resolve_cid(&self) -> Result<String> {
        if let Some(cid) = self.metadata.cid.as_deref() {
            let cid = cid.trim();
            if !cid.is_empty() {
                return Ok(cid.to_string());
            }
        }

        let path = &self.pinning.cid_file;
        if !path.exists() {
            bail!(
                "画像フォルダの CID が不明です。metadata.cid を設定するか、先に upload を実行して {:?} を作成してください",
                path
            );
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("CID ファイルの読み込みに失敗しました: {:?}", path))?;
        let cid = text.trim();
        if cid.is_empty() {
            bail!("CID ファイルが空です: {:?}", path);
        }
        Ok(cid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "metadata:\n  count: 12\n  cid: bafyabc\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.metadata.count, 12);
        assert_eq!(cfg.metadata.base_name, "Astral Pack Legend");
        assert_eq!(cfg.images.prefix, "Astral Pack Legends");
        assert_eq!(cfg.pinning.jwt_env, "PINATA_JWT");
        assert_eq!(cfg.resolve_cid().unwrap(), "bafyabc");
    }

    #[test]
    fn image_name_defaults_to_prefix() {
        let mut cfg = Config::default();
        assert_eq!(cfg.image_name(), "Astral Pack Legends");
        cfg.metadata.image_name = Some("Other".into());
        assert_eq!(cfg.image_name(), "Other");
    }

    #[test]
    fn cid_falls_back_to_cid_file() {
        let dir = tempfile::tempdir().unwrap();
        let cid_file = dir.path().join("cid.txt");
        std::fs::write(&cid_file, "bafyfromfile\n").unwrap();

        let mut cfg = Config::default();
        cfg.pinning.cid_file = cid_file.clone();
        assert_eq!(cfg.resolve_cid().unwrap(), "bafyfromfile");

        std::fs::write(&cid_file, "  ").unwrap();
        assert!(cfg.resolve_cid().is_err());

        cfg.pinning.cid_file = dir.path().join("missing.txt");
        assert!(cfg.resolve_cid().is_err());
    }

    #[test]
    fn missing_jwt_env_is_none() {
        let mut cfg = PinningConfig::default();
        cfg.jwt_env = "ASTRAL_NFT_TOOLS_TEST_UNSET_JWT".into();
        assert!(cfg.bearer_token().is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "metadata: [unclosed").unwrap();
        assert!(Config::load_or_default(path.to_str().unwrap()).is_err());
    }
}
