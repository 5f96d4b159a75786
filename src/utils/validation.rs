use anyhow::{Result, anyhow};

/// Image types accepted for question/explanation images.
pub const ALLOWED_IMAGE_MIMES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates that an uploaded filename carries a `.csv` extension
/// (case-insensitive). Runs before any parsing or persistence.
pub fn validate_csv_filename(filename: &str) -> Result<()> {
    if filename.to_lowercase().ends_with(".csv") {
        return Ok(());
    }
    Err(anyhow!(ValidationError {
        code: "INVALID_EXTENSION",
        message: "Only CSV files are allowed".to_string(),
    }))
}

/// Validates an uploaded image by size and by sniffing its actual content
/// type (the declared Content-Type header is not trusted). Returns the
/// detected MIME type.
pub fn validate_image(data: &[u8], max_size: usize) -> Result<&'static str> {
    if data.len() > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!("File size exceeds {}MB limit", max_size / 1024 / 1024),
        }));
    }

    let detected = infer::get(data).map(|kind| kind.mime_type());

    match detected {
        Some(mime) if ALLOWED_IMAGE_MIMES.contains(&mime) => Ok(mime),
        _ => Err(anyhow!(ValidationError {
            code: "INVALID_IMAGE_TYPE",
            message: "Invalid file type. Only JPG, PNG, GIF, and WebP are allowed.".to_string(),
        })),
    }
}
