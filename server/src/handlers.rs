use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use sketchshare_shared::{image_url, ImageRecord, SignInResponse, UploadedImage};
use thiserror::Error;
use uuid::Uuid;

use crate::state::AppState;
use crate::storage::{Storage, StorageError};

pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const MAX_IMAGE_ID_LEN: usize = 32;
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("image larger than 8 MiB")]
    PayloadTooLarge,
    #[error("could not allocate an image id")]
    Conflict,
    #[error("storage failure")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ApiError::NotFound,
            StorageError::AlreadyExists(_) => ApiError::Conflict,
            other => ApiError::Storage(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(error) = &self {
            tracing::error!(%error, "storage request failed");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/anonymous", post(sign_in_anonymously))
        .route(
            "/api/users/:uid/images",
            get(list_images)
                .post(upload_image)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/users/:uid/images/:id", get(get_image))
        .route("/images/:uid/:file", get(image_file))
}

pub async fn sign_in_anonymously() -> Json<SignInResponse> {
    let uid = Uuid::new_v4().to_string();
    tracing::info!(%uid, "anonymous sign-in");
    Json(SignInResponse { uid })
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadedImage>, ApiError> {
    let uid = normalize_uid(&uid).ok_or(ApiError::NotFound)?;
    if body.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge);
    }
    let (width, height) = png_dimensions(&body)
        .ok_or_else(|| ApiError::BadRequest("body is not a PNG image".into()))?;
    if params.width.is_some_and(|w| w != width) || params.height.is_some_and(|h| h != height) {
        return Err(ApiError::BadRequest(format!(
            "image is {width}x{height}, not the declared size"
        )));
    }

    let record = store_upload(
        state.storage.as_ref(),
        &uid,
        now_ms(),
        (width, height),
        &body,
        random_suffix,
    )
    .await?;
    tracing::info!(%uid, id = %record.id, width, height, bytes = body.len(), "image uploaded");

    Ok(Json(UploadedImage {
        id: record.id,
        url: record.url,
    }))
}

/// Saves under a fresh id, drawing another suffix whenever the id is taken.
async fn store_upload(
    storage: &dyn Storage,
    uid: &str,
    created_at: u64,
    (width, height): (u32, u32),
    png: &[u8],
    mut next_suffix: impl FnMut() -> u32,
) -> Result<ImageRecord, ApiError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = new_image_id(created_at, next_suffix());
        let record = ImageRecord {
            url: image_url(uid, &id),
            id,
            created_at,
            width,
            height,
        };
        match storage.save_image(uid, &record, png).await {
            Ok(()) => return Ok(record),
            Err(StorageError::AlreadyExists(id)) => {
                tracing::debug!(%uid, %id, "image id taken, drawing another");
            }
            Err(error) => return Err(error.into()),
        }
    }
    Err(ApiError::Conflict)
}

pub async fn list_images(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let uid = normalize_uid(&uid).ok_or(ApiError::NotFound)?;
    Ok(Json(state.storage.list_images(&uid).await?))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path((uid, id)): Path<(String, String)>,
) -> Result<Json<ImageRecord>, ApiError> {
    let uid = normalize_uid(&uid).ok_or(ApiError::NotFound)?;
    if !is_valid_image_id(&id) {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.storage.get_image(&uid, &id).await?))
}

/// `GET /images/:uid/:id.png`
pub async fn image_file(
    State(state): State<AppState>,
    Path((uid, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let uid = normalize_uid(&uid).ok_or(ApiError::NotFound)?;
    let id = file
        .strip_suffix(".png")
        .filter(|id| is_valid_image_id(id))
        .ok_or(ApiError::NotFound)?;
    let bytes = state.storage.load_image_bytes(&uid, id).await?;
    Ok((
        [
            (CONTENT_TYPE, "image/png"),
            (CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}

pub fn normalize_uid(value: &str) -> Option<String> {
    let parsed = Uuid::parse_str(value).ok()?;
    Some(parsed.to_string())
}

/// Ids are generated digits only, so anything else can never name a file.
pub fn is_valid_image_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_IMAGE_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

/// Unix milliseconds followed by a zero-padded four digit suffix.
pub fn new_image_id(created_at_ms: u64, suffix: u32) -> String {
    format!("{created_at_ms}{:04}", suffix % 10_000)
}

fn random_suffix() -> u32 {
    (Uuid::new_v4().as_u128() % 10_000) as u32
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Width and height from the IHDR chunk, if `bytes` is a PNG.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
#[path = "handlers_test.rs"]
mod tests;
