//! Error types and handling for the `FireWatch` application

use thiserror::Error;

/// Main error type for the `FireWatch` application
#[derive(Error, Debug)]
pub enum FireWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Geocoding service timed out or was unavailable
    #[error("Geocoding error: {message}")]
    Geocoding { message: String },

    /// Geocoding succeeded but returned nothing for the query
    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    /// Remote-sensing platform errors
    #[error("Remote sensing error: {message}")]
    RemoteSensing { message: String },

    /// Model artifact loading or inference errors
    #[error("Model error: {message}")]
    Model { message: String },

    /// Fire feed download returned a non-OK status
    #[error("Download failed with status {status}: {body}")]
    Download { status: u16, body: String },

    /// Other HTTP API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// CSV reading or writing errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

impl FireWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new geocoding error
    pub fn geocoding<S: Into<String>>(message: S) -> Self {
        Self::Geocoding {
            message: message.into(),
        }
    }

    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    /// Create a new remote sensing error
    pub fn remote_sensing<S: Into<String>>(message: S) -> Self {
        Self::RemoteSensing {
            message: message.into(),
        }
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FireWatchError::Config { .. } => {
                "Configuration error. Please check your config file and credentials.".to_string()
            }
            FireWatchError::Validation { message } => format!("Invalid input: {message}"),
            FireWatchError::Geocoding { .. } => "Geocoding failed. Try again later.".to_string(),
            FireWatchError::LocationNotFound { .. } => "Invalid location".to_string(),
            FireWatchError::RemoteSensing { .. } => {
                "Satellite data is currently unavailable. Please try again later.".to_string()
            }
            FireWatchError::Model { .. } => {
                "The prediction model could not be used. Please check the model file.".to_string()
            }
            FireWatchError::Download { status, body } => {
                format!("Failed to download. Status code: {status}\n{body}")
            }
            FireWatchError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            FireWatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            FireWatchError::Csv { .. } => {
                "CSV file could not be processed. Please check the input files.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FireWatchError {
    fn from(err: reqwest::Error) -> Self {
        FireWatchError::api(err.to_string())
    }
}

impl From<serde_json::Error> for FireWatchError {
    fn from(err: serde_json::Error) -> Self {
        FireWatchError::api(format!("invalid JSON: {err}"))
    }
}
