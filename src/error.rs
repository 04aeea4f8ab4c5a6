// One error type for the whole crate.
// Every variant states *which* collaborator failed; none of them ever
// touches the text layer or a drag in progress.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The segmentation collaborator could not isolate a subject. Retryable.
    #[error("Segmentation failed: {0}")]
    SegmentationFailed(String),
    /// Source bytes were not a decodable image. No ImagePair is installed.
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    /// The drawing surface could not be acquired or sized for this render.
    #[error("Surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Font error: {0}")]
    Font(String),
    /// Creating or updating the preview window failed.
    #[error("Window error: {0}")]
    Window(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Failures the user can retry without restarting the session.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SegmentationFailed(_) | Error::SurfaceUnavailable(_) | Error::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
