//! Backend calls. Every failure comes back as a [`NetError`] for the status
//! line; nothing here panics.

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::{Blob, Window};

use sketchshare_shared::{ImageRecord, SignInResponse, UploadedImage};

const UID_STORAGE_KEY: &str = "sketchshare.uid";

#[derive(Debug, Error)]
pub enum NetError {
    #[error("request failed: {0}")]
    Request(#[from] gloo_net::Error),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, NetError> {
    if !response.ok() {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => response.status_text(),
        };
        return Err(NetError::Status { status, message });
    }
    Ok(response.json::<T>().await?)
}

pub async fn sign_in_anonymously() -> Result<SignInResponse, NetError> {
    let response = Request::post("/api/auth/anonymous").send().await?;
    read_json(response).await
}

/// Reuses the uid remembered in local storage, signing in when there is none.
pub async fn current_user(window: &Window) -> Result<String, NetError> {
    let storage = window.local_storage().ok().flatten();
    if let Some(uid) = storage
        .as_ref()
        .and_then(|storage| storage.get_item(UID_STORAGE_KEY).ok().flatten())
    {
        return Ok(uid);
    }
    let SignInResponse { uid } = sign_in_anonymously().await?;
    if let Some(storage) = storage {
        let _ = storage.set_item(UID_STORAGE_KEY, &uid);
    }
    log::info!("signed in as {uid}");
    Ok(uid)
}

pub async fn upload_image(
    uid: &str,
    png: &Blob,
    width: u32,
    height: u32,
) -> Result<UploadedImage, NetError> {
    let url = format!("/api/users/{uid}/images?width={width}&height={height}");
    let response = Request::post(&url)
        .header("Content-Type", "image/png")
        .body(JsValue::from(png.clone()))?
        .send()
        .await?;
    read_json(response).await
}

pub async fn list_images(uid: &str) -> Result<Vec<ImageRecord>, NetError> {
    let response = Request::get(&format!("/api/users/{uid}/images"))
        .send()
        .await?;
    read_json(response).await
}

pub async fn get_image(uid: &str, id: &str) -> Result<ImageRecord, NetError> {
    let response = Request::get(&format!("/api/users/{uid}/images/{id}"))
        .send()
        .await?;
    read_json(response).await
}
