pub mod models;

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PublicErrorType {
    InternalServerError,

    NotFound,

    Unauthorized,
    AuthorizationRequired,
    InvalidToken,

    Validation,

    SearchUnavailable,
}

impl From<&PublicErrorType> for &'static str {
    fn from(value: &PublicErrorType) -> Self {
        match value {
            PublicErrorType::InternalServerError => "internal-server-error",
            PublicErrorType::NotFound => "not-found",
            PublicErrorType::Unauthorized => "unauthorized",
            PublicErrorType::AuthorizationRequired => "authorization-required",
            PublicErrorType::InvalidToken => "invalid-token",
            PublicErrorType::Validation => "validation",
            PublicErrorType::SearchUnavailable => "search-unavailable",
        }
    }
}

impl std::fmt::Debug for PublicErrorType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let s: &'static str = self.into();
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for PublicErrorType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let s: &'static str = self.into();
        write!(f, "{}", s)
    }
}

/// JSON body of every non-2xx response produced by the registry.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error: PublicErrorType,
    pub error_description: Option<String>,
}

impl ErrorResponse {
    pub fn internal() -> Self {
        Self {
            error: PublicErrorType::InternalServerError,
            error_description: None,
        }
    }

    pub fn from_public_error(
        error: PublicErrorType,
        desc: Option<String>,
    ) -> Self {
        Self {
            error,
            error_description: desc,
        }
    }
}
