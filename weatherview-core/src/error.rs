use thiserror::Error;

/// Every way a pipeline step can fail.
///
/// Errors are cloneable so a single failure can fill more than one view-state slot
/// (a denied permission fails both the conditions and the forecast slot of a flow).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {reason}")]
    LocationUnavailable { reason: String },

    #[error("Invalid API key (provider status 401)")]
    InvalidCredential,

    #[error("No weather found for '{query}'")]
    PlaceNotFound { query: String },

    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },
}

impl WeatherError {
    pub fn location_unavailable(reason: impl Into<String>) -> Self {
        Self::LocationUnavailable { reason: reason.into() }
    }

    pub fn place_not_found(query: impl Into<String>) -> Self {
        Self::PlaceNotFound { query: query.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse { message: message.into() }
    }

    /// Short machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::LocationUnavailable { .. } => "location_unavailable",
            Self::InvalidCredential => "invalid_credential",
            Self::PlaceNotFound { .. } => "place_not_found",
            Self::NetworkFailure { .. } => "network_failure",
            Self::Provider { .. } => "provider_error",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Text shown in place of the weather card.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Permission to access location was denied. Enable it and refresh.".to_string()
            }
            Self::LocationUnavailable { .. } => {
                "Could not determine your location. Check your location settings and refresh."
                    .to_string()
            }
            Self::InvalidCredential => {
                "The weather service rejected the API key. Run `weatherview configure` to update it."
                    .to_string()
            }
            Self::PlaceNotFound { query } => format!("Could not find weather for \"{query}\""),
            Self::NetworkFailure { .. } => {
                "Unable to reach the weather service. Check your internet connection.".to_string()
            }
            Self::Provider { status, .. } => {
                format!("The weather service failed to answer (status {status}).")
            }
            Self::MalformedResponse { .. } => {
                "The weather service sent a response that could not be read.".to_string()
            }
        }
    }

    /// Permission and location failures are shown with a warning icon instead of a card.
    pub fn is_location_failure(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::LocationUnavailable { .. })
    }
}
