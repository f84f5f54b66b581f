//! 画像フォルダを Pinata（pinFileToIPFS）にまとめてアップロードする

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PinningConfig;
use crate::images::{collect_images, file_name, mime_type};

const FILE_FIELD: &str = "pinataFiles";
const METADATA_FIELD: &str = "pinataMetadata";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("画像ディレクトリが存在しません: {0:?}")]
    MissingDirectory(PathBuf),
    #[error("認証トークンが未設定です（環境変数 {0}）")]
    MissingCredential(String),
    #[error("画像一覧の取得に失敗しました: {0}")]
    Listing(String),
    #[error("ファイル操作に失敗しました: {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Pinata へのリクエストに失敗しました")]
    Http(#[from] reqwest::Error),
    #[error("Pinata がエラーを返しました ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("Pinata のレスポンスを解釈できません: {0}")]
    Response(String),
    #[error("Pinata のレスポンスに CID (IpfsHash) が含まれていません")]
    MissingCid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinResponse {
    ipfs_hash: Option<String>,
    pin_size: Option<u64>,
    timestamp: Option<String>,
}

/// アップロード成功時の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pinned {
    pub cid: String,
    pub files: usize,
    pub pin_size: Option<u64>,
}

pub struct PinataClient {
    http: Client,
    api_url: String,
    jwt: String,
    pin_name: Option<String>,
}

impl PinataClient {
    pub fn new(api_url: &str, jwt: &str, timeout: Duration) -> Result<Self, UploadError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            jwt: jwt.to_string(),
            pin_name: None,
        })
    }

    /// 設定から作る。トークンは jwt_env の環境変数から読む
    pub fn from_config(cfg: &PinningConfig) -> Result<Self, UploadError> {
        let jwt = cfg
            .bearer_token()
            .ok_or_else(|| UploadError::MissingCredential(cfg.jwt_env.clone()))?;
        let client = Self::new(&cfg.api_url, &jwt, Duration::from_secs(cfg.timeout_secs))?;
        Ok(client.with_pin_name(cfg.pin_name.clone()))
    }

    pub fn with_pin_name(mut self, pin_name: Option<String>) -> Self {
        self.pin_name = pin_name;
        self
    }

    /// ディレクトリ直下の画像を1回の multipart POST で送る。
    /// 画像が0枚ならリクエストせず None を返す
    pub fn upload_folder(&self, dir: &Path) -> Result<Option<Pinned>, UploadError> {
        if !dir.is_dir() {
            return Err(UploadError::MissingDirectory(dir.to_path_buf()));
        }
        let files = collect_images(dir).map_err(|e| UploadError::Listing(format!("{:#}", e)))?;
        if files.is_empty() {
            info!(dir = ?dir, "no images to upload");
            return Ok(None);
        }

        // ファイルハンドルは Form が保持し、送信後（失敗時も）Form と一緒に閉じられる
        let form = self.build_form(&files)?;

        info!(files = files.len(), url = %self.api_url, "uploading images");
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        let body: PinResponse = response
            .json()
            .map_err(|e| UploadError::Response(e.to_string()))?;
        debug!(pin_size = ?body.pin_size, timestamp = ?body.timestamp, "pin response");

        let cid = body
            .ipfs_hash
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(UploadError::MissingCid)?;

        Ok(Some(Pinned {
            cid,
            files: files.len(),
            pin_size: body.pin_size,
        }))
    }

    fn build_form(&self, files: &[PathBuf]) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for path in files {
            let part = Part::file(path)
                .map_err(|source| UploadError::Io {
                    path: path.clone(),
                    source,
                })?
                .file_name(file_name(path))
                .mime_str(mime_type(path))?;
            form = form.part(FILE_FIELD, part);
        }
        if let Some(name) = &self.pin_name {
            form = form.text(METADATA_FIELD, serde_json::json!({ "name": name }).to_string());
        }
        Ok(form)
    }
}

/// CID をファイルに保存（上書き）
pub fn save_cid(path: &Path, cid: &str) -> Result<(), UploadError> {
    fs::write(path, cid).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// アップロードして、成功した場合のみ CID ファイルを書く
pub fn upload_and_save(
    client: &PinataClient,
    dir: &Path,
    cid_file: &Path,
) -> Result<Option<Pinned>, UploadError> {
    let pinned = client.upload_folder(dir)?;
    if let Some(p) = &pinned {
        save_cid(cid_file, &p.cid)?;
        info!(cid = %p.cid, path = ?cid_file, "CID saved");
    }
    Ok(pinned)
}

/// 設定どおりにアップロードする。
/// 送る画像が無ければトークンを確認せずに None を返す
pub fn upload_from_config(cfg: &PinningConfig, dir: &Path) -> Result<Option<Pinned>, UploadError> {
    if !dir.is_dir() {
        return Err(UploadError::MissingDirectory(dir.to_path_buf()));
    }
    let files = collect_images(dir).map_err(|e| UploadError::Listing(format!("{:#}", e)))?;
    if files.is_empty() {
        info!(dir = ?dir, "no images to upload");
        return Ok(None);
    }

    let client = PinataClient::from_config(cfg)?;
    upload_and_save(&client, dir, &cfg.cid_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> PinataClient {
        PinataClient::new(url, "jwt", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn missing_credential() {
        let mut cfg = PinningConfig::default();
        cfg.jwt_env = "ASTRAL_NFT_TOOLS_TEST_NO_SUCH_JWT".into();
        let err = PinataClient::from_config(&cfg).err().unwrap();
        assert!(matches!(err, UploadError::MissingCredential(ref v) if v == "ASTRAL_NFT_TOOLS_TEST_NO_SUCH_JWT"));
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = client("http://127.0.0.1:9/")
            .upload_folder(&dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, UploadError::MissingDirectory(_)));
    }

    #[test]
    fn empty_directory_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let cid_file = dir.path().join("cid.txt");

        // 到達不能な URL でもリクエストしないので成功する
        let result = upload_and_save(&client("http://127.0.0.1:9/"), dir.path(), &cid_file).unwrap();
        assert!(result.is_none());
        assert!(!cid_file.exists());
    }

    #[test]
    fn empty_directory_needs_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let mut cfg = PinningConfig::default();
        cfg.jwt_env = "ASTRAL_NFT_TOOLS_TEST_NO_SUCH_JWT".into();
        cfg.cid_file = dir.path().join("cid.txt");

        assert!(upload_from_config(&cfg, dir.path()).unwrap().is_none());
        assert!(!cfg.cid_file.exists());
    }

    #[test]
    fn images_without_credential_fail_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        let mut cfg = PinningConfig::default();
        cfg.jwt_env = "ASTRAL_NFT_TOOLS_TEST_NO_SUCH_JWT".into();
        cfg.cid_file = dir.path().join("cid.txt");

        let err = upload_from_config(&cfg, dir.path()).unwrap_err();
        assert!(matches!(err, UploadError::MissingCredential(_)));
        assert!(!cfg.cid_file.exists());
    }

    #[test]
    fn pin_response_parsing() {
        let body: PinResponse = serde_json::from_str(
            r#"{"IpfsHash":"bafyabc","PinSize":1234,"Timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(body.ipfs_hash.as_deref(), Some("bafyabc"));
        assert_eq!(body.pin_size, Some(1234));
    }
}
