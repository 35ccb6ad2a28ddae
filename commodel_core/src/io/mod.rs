//! Module for reading and writing Models
use std::path::Path;

use thiserror::Error;

use crate::io::json::JsonError;
use crate::io::sbml::SbmlError;
use crate::metabolic_model::model::Model;

pub mod gpr_parse;
pub mod json;
pub mod sbml;

/// Supported model file formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Sbml,
    Json,
}

impl ModelFormat {
    /// Guess the format of a model file from its extension (`.xml`/`.sbml` or `.json`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<ModelFormat> {
        let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xml" | "sbml" => Some(ModelFormat::Sbml),
            "json" => Some(ModelFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Unable to determine the model format of {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Sbml(#[from] SbmlError),
    #[error(transparent)]
    Json(#[from] JsonError),
}

/// Read a model from a file, choosing the reader by the file extension
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        Some(ModelFormat::Sbml) => Ok(Model::read_sbml(path)?),
        Some(ModelFormat::Json) => Ok(Model::read_json(path)?),
        None => Err(IoError::UnknownFormat(path.display().to_string())),
    }
}

/// Write a model to a file, choosing the writer by the file extension
pub fn write_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<(), IoError> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        Some(ModelFormat::Sbml) => Ok(model.write_sbml(path)?),
        Some(ModelFormat::Json) => Ok(model.write_json(path)?),
        None => Err(IoError::UnknownFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ModelFormat::from_path("model.XML"), Some(ModelFormat::Sbml));
        assert_eq!(ModelFormat::from_path("a/b/model.json"), Some(ModelFormat::Json));
        assert_eq!(ModelFormat::from_path("model.mat"), None);
        assert_eq!(ModelFormat::from_path("model"), None);
    }

    #[test]
    fn unknown_format() {
        assert!(matches!(
            read_model("model.txt"),
            Err(IoError::UnknownFormat(_))
        ));
    }
}
