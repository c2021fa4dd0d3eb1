use async_trait::async_trait;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// `<unix-millis>-<short-uuid>.<ext>`
pub fn image_key(extension: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        &uuid[..8],
        extension
    )
}

pub fn public_url(key: &str) -> String {
    format!("{}/{}", PUBLIC_PREFIX, key)
}

/// Storage key behind a public image URL, if the URL points into our uploads.
pub fn key_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| is_plain_key(key))
}

// Keys are flat file names; anything that could walk out of the base dir is refused.
fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('/') && !key.contains('\\') && key != "." && key != ".."
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        if !is_plain_key(key) {
            return Err(AppError::bad_request(format!("Invalid storage key: {}", key)));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
