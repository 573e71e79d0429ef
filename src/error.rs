use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the graphics device while creating a resource.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Out of GPU memory")]
    OutOfMemory,
    #[error("Failed to create buffer: {0}")]
    BufferCreation(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Failed to parse model: {0}")]
    ParseFailed(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl LoadError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::Device(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generator returned an empty occluder")]
    EmptyResult,
    #[error("Invalid generation config: {0}")]
    InvalidConfig(&'static str),
    #[error("Generator returned a malformed occluder: {0}")]
    InvalidResult(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl GenerationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerationError::Device(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that stop the viewer, at startup or from inside the event loop.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Graphics device error: {0}")]
    Gpu(String),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_device_failures_are_fatal() {
        assert!(!LoadError::UnknownModel("x".into()).is_fatal());
        assert!(!LoadError::ParseFailed("x".into()).is_fatal());
        assert!(LoadError::from(DeviceError::OutOfMemory).is_fatal());

        assert!(!GenerationError::EmptyResult.is_fatal());
        assert!(!GenerationError::InvalidConfig("no box types").is_fatal());
        assert!(!GenerationError::InvalidResult("index 9".into()).is_fatal());
        assert!(GenerationError::from(DeviceError::OutOfMemory).is_fatal());
    }

    #[test]
    fn config_failures_stop_the_viewer_with_the_path() {
        let err = ViewerError::from(ConfigError::Io {
            path: PathBuf::from("viewer.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });

        assert!(matches!(err, ViewerError::Config(ConfigError::Io { .. })));
        assert_eq!(err.to_string(), "Failed to read viewer.toml: missing");
    }
}
