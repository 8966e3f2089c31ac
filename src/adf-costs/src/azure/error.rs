use std::fmt;

/// Token exchange against the identity endpoint failed.
///
/// Fatal for a scan: without a token no further query can be issued.
#[derive(Debug)]
pub enum AuthError {
    /// Network request failed
    Network(reqwest::Error),

    /// Identity endpoint returned non-2XX status code
    Rejected { status: u16, body: String },

    /// Body was not a token response
    Decode(serde_json::Error),

    /// Response parsed, but carried no access token
    MissingToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(e) => write!(f, "Token request failed: {}", e),
            AuthError::Rejected { status, body } => {
                write!(f, "Identity endpoint rejected credentials ({}): {}", status, body)
            }
            AuthError::Decode(e) => write!(f, "Failed to decode token response: {}", e),
            AuthError::MissingToken => write!(f, "Identity endpoint returned no access token"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Network(e) => Some(e),
            AuthError::Decode(e) => Some(e),
            AuthError::Rejected { .. } | AuthError::MissingToken => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Decode(err)
    }
}

/// A pipeline-run or activity-run query failed.
///
/// Recovered by the collector: the affected page or run is skipped.
#[derive(Debug)]
pub enum FetchError {
    /// Network request failed
    Network(reqwest::Error),

    /// Server returned non-2XX status code
    Server { status: u16, body: String },

    /// Body was not a query response
    Decode(serde_json::Error),

    /// Endpoint URL could not be built from the configured coordinates
    Url(url::ParseError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(e) => write!(f, "Network request failed: {}", e),
            FetchError::Server { status, body } => {
                write!(f, "Server error {}: {}", status, body)
            }
            FetchError::Decode(e) => write!(f, "Failed to decode query response: {}", e),
            FetchError::Url(e) => write!(f, "Invalid query url: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Network(e) => Some(e),
            FetchError::Server { .. } => None,
            FetchError::Decode(e) => Some(e),
            FetchError::Url(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err)
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::Url(err)
    }
}

impl FetchError {
    pub fn server_error(status: u16, body: String) -> Self {
        FetchError::Server { status, body }
    }
}

/// The nested billing block of an activity run is present but unusable.
///
/// Recovered by discarding the single record.
#[derive(Debug)]
pub enum RecordShapeError {
    /// Candidate or billing block did not match the expected shape
    Malformed(serde_json::Error),

    /// `billableDuration` was an empty list
    NoBillableDuration,
}

impl fmt::Display for RecordShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordShapeError::Malformed(e) => write!(f, "Malformed billing record: {}", e),
            RecordShapeError::NoBillableDuration => {
                write!(f, "Billing reference has no billable duration")
            }
        }
    }
}

impl std::error::Error for RecordShapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordShapeError::Malformed(e) => Some(e),
            RecordShapeError::NoBillableDuration => None,
        }
    }
}

impl From<serde_json::Error> for RecordShapeError {
    fn from(err: serde_json::Error) -> Self {
        RecordShapeError::Malformed(err)
    }
}
