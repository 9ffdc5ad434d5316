use axum::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::web::error::AppError;

/// The two parts of a `POST /render` upload.
#[derive(Debug)]
pub struct RenderForm {
    pub image: Bytes,
    pub spec: String,
}

impl RenderForm {
    /// Reads every part of the upload. Unknown parts are skipped; when a part
    /// name repeats, the last one wins.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut image: Option<Bytes> = None;
        let mut spec: Option<String> = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("image") => {
                    if field.file_name().is_none() {
                        return Err(AppError::Unprocessable(
                            "Form field 'image' must be a file upload".to_string(),
                        ));
                    }
                    image = Some(field.bytes().await?);
                }
                Some("spec") => {
                    spec = Some(field.text().await?);
                }
                other => {
                    debug!(field = ?other, "Ignoring unknown form field.");
                }
            }
        }

        let image = image.ok_or_else(|| AppError::Unprocessable("Missing required form field: image".to_string()))?;
        let spec = spec.ok_or_else(|| AppError::Unprocessable("Missing required form field: spec".to_string()))?;
        Ok(RenderForm { image, spec })
    }
}
