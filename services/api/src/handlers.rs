//! Axum Handlers for the REST API
//!
//! The REST surface exposes the static exam catalog so the browser can
//! render the exam selection screen and dashboard before opening its
//! WebSocket. It uses `utoipa` doc comments to generate OpenAPI docs.

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use certprep_core::catalog::{self, Track};
use tracing::error;

use crate::models::{ErrorResponse, ModuleInfo, TrackInfo};

pub enum ApiError {
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// List the available exam tracks.
#[utoipa::path(
    get,
    path = "/tracks",
    responses(
        (status = 200, description = "List of exam tracks", body = [TrackInfo])
    )
)]
pub async fn list_tracks() -> Json<Vec<TrackInfo>> {
    Json(Track::ALL.into_iter().map(TrackInfo::from).collect())
}

/// List the study modules for one exam track.
#[utoipa::path(
    get,
    path = "/tracks/{track}/modules",
    responses(
        (status = 200, description = "Modules for the track", body = [ModuleInfo]),
        (status = 404, description = "Unknown track", body = ErrorResponse)
    ),
    params(
        ("track" = String, Path, description = "Track identifier, e.g. 'pmp'")
    )
)]
pub async fn list_track_modules(
    Path(track): Path<String>,
) -> Result<Json<Vec<ModuleInfo>>, ApiError> {
    let track: Track = track
        .parse()
        .map_err(|e: catalog::UnknownTrack| ApiError::NotFound(e.to_string()))?;
    Ok(Json(
        catalog::modules_for(track).iter().map(ModuleInfo::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_all_three_tracks() {
        let Json(tracks) = list_tracks().await;
        assert_eq!(tracks.len(), 3);
        assert!(tracks.iter().any(|t| t.id == "pmp"));
    }

    #[tokio::test]
    async fn lists_modules_for_known_track() {
        let Ok(Json(modules)) = list_track_modules(Path("leed_v5".to_string())).await else {
            panic!("expected modules for leed_v5");
        };
        assert_eq!(modules.len(), 9);
        assert_eq!(modules[0].id, "integrative-process");
    }

    #[tokio::test]
    async fn unknown_track_is_not_found() {
        let err = list_track_modules(Path("cissp".to_string())).await.err();
        assert!(matches!(err, Some(ApiError::NotFound(_))));
    }
}
