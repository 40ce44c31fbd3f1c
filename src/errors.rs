use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewfinderError {
    #[error("No active session. Run: viewfinder start")]
    NoActiveSession,

    #[error("Capture target not found: {0}")]
    TargetNotFound(String),

    #[error("Unknown direction: {input}. Valid: {valid}")]
    UnknownDirection { input: String, valid: String },

    #[error("Template not found: {0}. Run: viewfinder list")]
    TemplateNotFound(String),

    #[error("Could not locate template on screen and no saved coordinates: {0}")]
    LocateFailed(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ViewfinderError {
    /// Stable machine-readable tag used in failure result documents.
    pub fn kind(&self) -> &'static str {
        match self {
            ViewfinderError::NoActiveSession => "no_active_session",
            ViewfinderError::TargetNotFound(_) => "target_not_found",
            ViewfinderError::UnknownDirection { .. } => "unknown_direction",
            ViewfinderError::TemplateNotFound(_) => "template_not_found",
            ViewfinderError::LocateFailed(_) => "locate_failed",
            ViewfinderError::CaptureFailed(_) => "capture_failed",
            ViewfinderError::Input(_) => "input_error",
            ViewfinderError::Config(_) => "config_error",
            ViewfinderError::Io(_) => "io_error",
            ViewfinderError::Json(_) => "json_error",
            ViewfinderError::TomlDe(_) => "toml_error",
            ViewfinderError::Image(_) => "image_error",
        }
    }
}

impl serde::Serialize for ViewfinderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type ViewfinderResult<T> = Result<T, ViewfinderError>;
