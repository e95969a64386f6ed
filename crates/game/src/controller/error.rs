use crate::prelude::*;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The entity meant to carry the camera is missing a required component
    #[error("camera attachment {entity:?} has no {component} component")]
    MissingAttachment {
        entity: Entity,
        component: &'static str,
    },

    #[error("invalid controller config: {0}")]
    InvalidConfig(String),

    #[error("failed to read controller config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse controller config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
