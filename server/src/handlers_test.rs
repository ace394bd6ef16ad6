use std::sync::Arc;

use super::*;
use crate::storage::{FileStorage, Storage};

const UID: &str = "0b6c9d8e-2f4a-4b1c-9d3e-5f6a7b8c9d0e";

fn fake_png(width: u32, height: u32) -> Bytes {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0; 4]);
    Bytes::from(bytes)
}

fn test_state(dir: &tempfile::TempDir) -> AppState {
    AppState::new(Arc::new(FileStorage::new(dir.path().to_path_buf())))
}

async fn upload(state: &AppState, uid: &str, body: Bytes) -> Result<UploadedImage, ApiError> {
    upload_image(
        State(state.clone()),
        Path(uid.to_string()),
        Query(UploadParams::default()),
        body,
    )
    .await
    .map(|Json(uploaded)| uploaded)
}

#[tokio::test]
async fn sign_in_issues_a_fresh_uuid() {
    let Json(first) = sign_in_anonymously().await;
    let Json(second) = sign_in_anonymously().await;
    assert_eq!(normalize_uid(&first.uid), Some(first.uid.clone()));
    assert_ne!(first.uid, second.uid);
}

#[tokio::test]
async fn upload_then_get_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let uploaded = upload(&state, UID, fake_png(320, 240)).await.unwrap();
    assert_eq!(uploaded.url, format!("/images/{UID}/{}.png", uploaded.id));

    let Json(record) = get_image(
        State(state.clone()),
        Path((UID.to_string(), uploaded.id.clone())),
    )
    .await
    .unwrap();
    assert_eq!(record.id, uploaded.id);
    assert_eq!(record.url, uploaded.url);
    assert_eq!((record.width, record.height), (320, 240));

    let Json(listed) = list_images(State(state.clone()), Path(UID.to_string()))
        .await
        .unwrap();
    assert_eq!(listed, vec![record]);
}

#[tokio::test]
async fn uploaded_bytes_are_served_as_png() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let uploaded = upload(&state, UID, fake_png(2, 2)).await.unwrap();

    let response = image_file(
        State(state),
        Path((UID.to_string(), format!("{}.png", uploaded.id))),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn non_png_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let result = upload(&state, UID, Bytes::from_static(b"GIF89a not a png at all")).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    let Json(listed) = list_images(State(state), Path(UID.to_string()))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn declared_size_must_match_image() {
    let dir = tempfile::tempdir().unwrap();
    let result = upload_image(
        State(test_state(&dir)),
        Path(UID.to_string()),
        Query(UploadParams {
            width: Some(100),
            height: Some(240),
        }),
        fake_png(320, 240),
    )
    .await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let mut body = fake_png(1, 1).to_vec();
    body.resize(MAX_UPLOAD_BYTES + 1, 0);

    let result = upload(&state, UID, Bytes::from(body)).await;
    assert!(matches!(result, Err(ApiError::PayloadTooLarge)));
}

#[tokio::test]
async fn unknown_image_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let result = get_image(
        State(state.clone()),
        Path((UID.to_string(), "17000000000000000".to_string())),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound)));

    let result = image_file(
        State(state),
        Path((UID.to_string(), "17000000000000000.png".to_string())),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let result = list_images(State(state.clone()), Path("not-a-uuid".to_string())).await;
    assert!(matches!(result, Err(ApiError::NotFound)));

    let result = image_file(
        State(state.clone()),
        Path((UID.to_string(), "../index.bin".to_string())),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound)));

    let result = get_image(State(state), Path((UID.to_string(), "abc".to_string()))).await;
    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn same_millisecond_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().to_path_buf());
    let created_at = 1_700_000_000_000;
    let first = store_upload(&storage, UID, created_at, (2, 2), b"first", || 42)
        .await
        .unwrap();

    let mut suffixes = [42, 42, 43].into_iter();
    let second = store_upload(&storage, UID, created_at, (2, 2), b"second", || {
        suffixes.next().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(first.id, "17000000000000042");
    assert_eq!(second.id, "17000000000000043");
    assert_eq!(
        storage.load_image_bytes(UID, &first.id).await.unwrap(),
        b"first"
    );
    assert_eq!(storage.list_images(UID).await.unwrap().len(), 2);
}

#[tokio::test]
async fn exhausted_id_attempts_are_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().to_path_buf());
    store_upload(&storage, UID, 5, (1, 1), b"x", || 1)
        .await
        .unwrap();

    let result = store_upload(&storage, UID, 5, (1, 1), b"y", || 1).await;
    assert!(matches!(result, Err(ApiError::Conflict)));
    assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
}

#[test]
fn api_error_maps_to_status() {
    assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        ApiError::BadRequest("x".into()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::PayloadTooLarge.status(),
        StatusCode::PAYLOAD_TOO_LARGE
    );
    assert_eq!(
        ApiError::from(StorageError::InvalidIndex("bad".into()))
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn storage_not_found_becomes_api_not_found() {
    let err = ApiError::from(StorageError::NotFound("1".into()));
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn image_ids_are_timestamp_then_padded_suffix() {
    assert_eq!(new_image_id(1_700_000_000_000, 7), "17000000000000007");
    assert_eq!(new_image_id(1_700_000_000_000, 12_345), "17000000000002345");
    assert!(is_valid_image_id(&new_image_id(1, 9999)));
    assert!(!is_valid_image_id(""));
    assert!(!is_valid_image_id("12.png"));
}

#[test]
fn png_dimensions_reads_ihdr() {
    assert_eq!(png_dimensions(&fake_png(640, 480)), Some((640, 480)));
    assert_eq!(png_dimensions(&fake_png(0, 480)), None);
    assert_eq!(png_dimensions(&PNG_SIGNATURE), None);
}

#[test]
fn uid_is_normalized_to_lowercase_hyphenated() {
    assert_eq!(
        normalize_uid("0B6C9D8E2F4A4B1C9D3E5F6A7B8C9D0E"),
        Some(UID.to_string())
    );
    assert_eq!(normalize_uid("nope"), None);
}
