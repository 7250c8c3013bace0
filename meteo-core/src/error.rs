use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while answering a rain/wind request.
///
/// Inner components return these unchanged; only the request boundary turns
/// them into status codes via [`Error::status_code`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("city '{0}' not found")]
    CityNotFound(String),

    #[error("geocoding service unavailable: {0}")]
    GeocodingUnavailable(String),

    #[error("malformed geocoding response: {0}")]
    GeocodingMalformed(String),

    #[error("forecast service unavailable: {0}")]
    ForecastUnavailable(String),

    #[error("malformed forecast response: {0}")]
    ForecastMalformed(String),

    #[error(
        "No API key configured for provider '{0}'.\nHint: run `meteo configure {0}` and enter your API key."
    )]
    MissingApiKey(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Coarse error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    CityNotFound,
    UpstreamUnavailable,
    UpstreamDataInvalid,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::CityNotFound(_) => ErrorKind::CityNotFound,
            Error::GeocodingUnavailable(_) | Error::ForecastUnavailable(_) => {
                ErrorKind::UpstreamUnavailable
            }
            Error::GeocodingMalformed(_) | Error::ForecastMalformed(_) => {
                ErrorKind::UpstreamDataInvalid
            }
            Error::MissingApiKey(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status the request boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::CityNotFound => 404,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::UpstreamDataInvalid | ErrorKind::Internal => 500,
        }
    }

    /// Message safe to show to end users.
    ///
    /// Internal failures are reported generically; their cause only goes to the logs.
    pub fn public_detail(&self) -> String {
        match self {
            Error::InvalidInput(msg) => msg.clone(),
            Error::CityNotFound(city) => format!("Città '{city}' non trovata."),
            Error::GeocodingUnavailable(_) => "Servizio di geocodifica non disponibile.".into(),
            Error::GeocodingMalformed(_) => "Errore nell'elaborazione dati geocoding.".into(),
            Error::ForecastUnavailable(_) => "Servizio meteo non disponibile.".into(),
            Error::ForecastMalformed(_) => "Risposta API meteo non valida.".into(),
            Error::MissingApiKey(_) | Error::Internal(_) => "Errore interno del server.".into(),
        }
    }
}
