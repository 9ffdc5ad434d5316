use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::header,
    response::IntoResponse,
    routing::post,
};
use std::sync::Arc;
use tokio::task;
use tracing::info;

use crate::render::RenderSpec;
use crate::web::{AppState, error::AppError, models::RenderForm};

pub fn create_render_router() -> Router<Arc<AppState>> {
    Router::new().route("/render", post(render_handler))
}

async fn render_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let form = RenderForm::from_multipart(&mut multipart).await?;
    let spec = RenderSpec::from_json(&form.spec)?;
    let annotation_count = spec.annotations.len();
    let image_bytes = form.image.len();

    let renderer = app_state.renderer.clone();
    let png = task::spawn_blocking(move || renderer.render(&form.image, &spec))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;

    info!(
        annotations = annotation_count,
        input_bytes = image_bytes,
        output_bytes = png.len(),
        "Rendered annotated image."
    );
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
