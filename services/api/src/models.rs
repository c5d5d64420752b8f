//! REST API Models
//!
//! Data structures for the catalog endpoints, annotated for OpenAPI
//! generation with `utoipa`.

use certprep_core::catalog::{ModuleDef, Track};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TrackInfo {
    #[schema(example = "leed_v41")]
    pub id: String,
    #[schema(example = "LEED AP v4.1")]
    pub name: String,
    pub module_count: usize,
}

impl From<Track> for TrackInfo {
    fn from(track: Track) -> Self {
        Self {
            id: track.as_str().to_string(),
            name: track.name().to_string(),
            module_count: certprep_core::catalog::modules_for(track).len(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ModuleInfo {
    #[schema(example = "water-efficiency")]
    pub id: String,
    #[schema(example = "Water Efficiency (WE)")]
    pub name: String,
}

impl From<&ModuleDef> for ModuleInfo {
    fn from(module: &ModuleDef) -> Self {
        Self {
            id: module.id.to_string(),
            name: module.name.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_info_from_track() {
        let info = TrackInfo::from(Track::Pmp);
        assert_eq!(info.id, "pmp");
        assert_eq!(info.name, "PMP");
        assert_eq!(info.module_count, 10);
    }

    #[test]
    fn test_module_info_serialization() {
        let module = certprep_core::catalog::module(Track::LeedV5, "innovation").unwrap();
        let info = ModuleInfo::from(module);
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"id":"innovation","name":"Innovation (IN)"}"#);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Track not found".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Track not found"}"#);
    }
}
