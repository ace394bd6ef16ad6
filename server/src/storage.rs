use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sketchshare_shared::ImageRecord;
use thiserror::Error;
use tokio::sync::Mutex;

const INDEX_FILE_MAGIC: [u8; 4] = *b"SKIX";
const INDEX_FILE_VERSION: u32 = 1;
const INDEX_HEADER_LEN: usize = 8;
const INDEX_FILE_NAME: &str = "index.bin";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("image {0} not found")]
    NotFound(String),
    #[error("image {0} already exists")]
    AlreadyExists(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid image index: {0}")]
    InvalidIndex(String),
    #[error("s3 error: {0}")]
    S3(String),
}

/// Per-user image store: PNG bytes plus an index of their metadata.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `AlreadyExists` rather than replacing an image.
    async fn save_image(
        &self,
        uid: &str,
        record: &ImageRecord,
        png: &[u8],
    ) -> Result<(), StorageError>;
    /// Newest first.
    async fn list_images(&self, uid: &str) -> Result<Vec<ImageRecord>, StorageError>;
    async fn get_image(&self, uid: &str, id: &str) -> Result<ImageRecord, StorageError>;
    async fn load_image_bytes(&self, uid: &str, id: &str) -> Result<Vec<u8>, StorageError>;
}

pub struct FileStorage {
    root: PathBuf,
    index_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            index_lock: Mutex::new(()),
        }
    }

    fn user_dir(&self, uid: &str) -> PathBuf {
        self.root.join(uid)
    }

    async fn read_index(&self, uid: &str) -> Result<Vec<ImageRecord>, StorageError> {
        match tokio::fs::read(self.user_dir(uid).join(INDEX_FILE_NAME)).await {
            Ok(payload) => decode_index(&payload),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save_image(
        &self,
        uid: &str,
        record: &ImageRecord,
        png: &[u8],
    ) -> Result<(), StorageError> {
        let _guard = self.index_lock.lock().await;
        let mut records = self.read_index(uid).await?;
        ensure_new_id(&records, &record.id)?;

        let dir = self.user_dir(uid);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(format!("{}.png", record.id)), png).await?;
        records.push(record.clone());
        let payload = encode_index(&records)?;
        tokio::fs::write(dir.join(INDEX_FILE_NAME), payload).await?;
        Ok(())
    }

    async fn list_images(&self, uid: &str) -> Result<Vec<ImageRecord>, StorageError> {
        let mut records = self.read_index(uid).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_image(&self, uid: &str, id: &str) -> Result<ImageRecord, StorageError> {
        self.read_index(uid)
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn load_image_bytes(&self, uid: &str, id: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.user_dir(uid).join(format!("{id}.png"));
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }
}

fn ensure_new_id(records: &[ImageRecord], id: &str) -> Result<(), StorageError> {
    if records.iter().any(|existing| existing.id == id) {
        return Err(StorageError::AlreadyExists(id.to_string()));
    }
    Ok(())
}

fn sort_newest_first(records: &mut [ImageRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn encode_index(records: &[ImageRecord]) -> Result<Vec<u8>, StorageError> {
    let body = bincode::encode_to_vec(records, bincode::config::standard())
        .map_err(|e| StorageError::InvalidIndex(format!("failed to encode: {e}")))?;
    let mut payload = Vec::with_capacity(INDEX_HEADER_LEN + body.len());
    payload.extend_from_slice(&INDEX_FILE_MAGIC);
    payload.extend_from_slice(&INDEX_FILE_VERSION.to_le_bytes());
    payload.extend_from_slice(&body);
    Ok(payload)
}

fn decode_index(payload: &[u8]) -> Result<Vec<ImageRecord>, StorageError> {
    if !(payload.starts_with(&INDEX_FILE_MAGIC) && payload.len() >= INDEX_HEADER_LEN) {
        return Err(StorageError::InvalidIndex("bad header".into()));
    }

    let version = u32::from_le_bytes(
        payload[4..8]
            .try_into()
            .map_err(|e| StorageError::InvalidIndex(format!("bad version: {e}")))?,
    );
    let body = &payload[INDEX_HEADER_LEN..];
    match version {
        1 => bincode::decode_from_slice(body, bincode::config::standard())
            .map(|(records, _)| records)
            .map_err(|e| StorageError::InvalidIndex(format!("failed to decode: {e}"))),
        _ => Err(StorageError::InvalidIndex(format!(
            "unsupported version {version}"
        ))),
    }
}

#[derive(Clone, Debug)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

pub struct S3Storage {
    bucket: String,
    prefix: String,
    client: Client,
    index_lock: Mutex<()>,
}

impl S3Storage {
    pub async fn new(config: S3StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let (Some(access_key_id), Some(secret_access_key)) = (
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
        ) {
            let creds = Credentials::new(access_key_id, secret_access_key, None, None, "static");
            loader = loader.credentials_provider(creds);
        }
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint_url) = config.endpoint_url.as_ref() {
            builder = builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        Self {
            bucket: config.bucket,
            prefix: normalize_prefix(config.prefix),
            client,
            index_lock: Mutex::new(()),
        }
    }

    fn object_key(&self, uid: &str, name: &str) -> String {
        object_key(&self.prefix, uid, name)
    }

    /// `Ok(None)` when the object does not exist.
    async fn get_bytes(&self, key: String) -> Result<Option<Vec<u8>>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;
        let output = match response {
            Ok(output) => output,
            Err(error) => {
                if let Some(service_error) = error.as_service_error() {
                    if service_error.is_no_such_key() {
                        return Ok(None);
                    }
                }
                return Err(StorageError::S3(format!("get {key}: {error:?}")));
            }
        };
        let collected = output
            .body
            .collect()
            .await
            .map_err(|error| StorageError::S3(format!("read {key}: {error:?}")))?;
        Ok(Some(collected.into_bytes().to_vec()))
    }

    async fn put_bytes(
        &self,
        key: String,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|error| StorageError::S3(format!("put {key}: {error:?}")))?;
        Ok(())
    }

    async fn read_index(&self, uid: &str) -> Result<Vec<ImageRecord>, StorageError> {
        match self.get_bytes(self.object_key(uid, INDEX_FILE_NAME)).await? {
            Some(payload) => decode_index(&payload),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn save_image(
        &self,
        uid: &str,
        record: &ImageRecord,
        png: &[u8],
    ) -> Result<(), StorageError> {
        let _guard = self.index_lock.lock().await;
        let mut records = self.read_index(uid).await?;
        ensure_new_id(&records, &record.id)?;

        self.put_bytes(
            self.object_key(uid, &format!("{}.png", record.id)),
            png.to_vec(),
            "image/png",
        )
        .await?;
        records.push(record.clone());
        let payload = encode_index(&records)?;
        self.put_bytes(
            self.object_key(uid, INDEX_FILE_NAME),
            payload,
            "application/octet-stream",
        )
        .await
    }

    async fn list_images(&self, uid: &str) -> Result<Vec<ImageRecord>, StorageError> {
        let mut records = self.read_index(uid).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_image(&self, uid: &str, id: &str) -> Result<ImageRecord, StorageError> {
        self.read_index(uid)
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn load_image_bytes(&self, uid: &str, id: &str) -> Result<Vec<u8>, StorageError> {
        self.get_bytes(self.object_key(uid, &format!("{id}.png")))
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

fn normalize_prefix(prefix: Option<String>) -> String {
    prefix.unwrap_or_default().trim_matches('/').to_string()
}

fn object_key(prefix: &str, uid: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{uid}/{name}")
    } else {
        format!("{prefix}/{uid}/{name}")
    }
}
