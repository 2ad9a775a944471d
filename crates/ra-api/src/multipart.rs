//! Reads the multipart ad form into an `AdInput`.

use actix_multipart::{Field, Multipart};
use futures_util::TryStreamExt;
use ra_core::error::AppError;
use ra_core::forms::{AdInput, TEXT_MAX_BYTES};
use ra_core::models::Picture;

use crate::error::ApiResult;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub(crate) struct AdSubmission {
    pub input: AdInput,
    pub csrf_token: String,
}

/// Collects the ad form fields. Unknown fields are drained and ignored.
///
/// At most `max_upload_bytes + 1` picture bytes and `TEXT_MAX_BYTES + 1`
/// bytes per text field are kept: enough for validation to see a value is
/// too large without buffering all of it.
pub(crate) async fn read_ad_form(mut payload: Multipart, max_upload_bytes: u64) -> ApiResult<AdSubmission> {
    let mut input = AdInput::default();
    let mut csrf_token = String::new();

    while let Some(field) = payload.try_next().await? {
        let name = field.name().to_string();
        match name.as_str() {
            "title" => input.title = read_text(field).await?,
            "price" => input.price = read_text(field).await?,
            "text" => input.text = read_text(field).await?,
            "tags" => input.tags = read_text(field).await?,
            "csrf_token" => csrf_token = read_text(field).await?,
            "picture" => input.picture = read_picture(field, max_upload_bytes).await?,
            _ => drain(field).await?,
        }
    }

    Ok(AdSubmission { input, csrf_token })
}

async fn read_text(mut field: Field) -> ApiResult<String> {
    let keep = TEXT_MAX_BYTES + 1;
    let mut buf = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = field.try_next().await? {
        let room = keep.saturating_sub(buf.len());
        truncated |= chunk.len() > room;
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    // A cut value may end mid-character; it only has to stay over the cap.
    if truncated {
        return Ok(String::from_utf8_lossy(&buf).into_owned());
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::ValidationError(format!("field '{}' is not valid UTF-8", field.name())).into())
}

/// An empty file input (no file chosen) yields `None`.
async fn read_picture(mut field: Field, max_upload_bytes: u64) -> ApiResult<Option<Picture>> {
    let content_type = field
        .content_type()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    let keep = usize::try_from(max_upload_bytes.saturating_add(1)).unwrap_or(usize::MAX);

    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        let room = keep.saturating_sub(data.len());
        data.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(Picture { content_type, data }))
}

async fn drain(mut field: Field) -> ApiResult<()> {
    while field.try_next().await?.is_some() {}
    Ok(())
}
