use snack_client::ClientError;
use thiserror::Error;

/// Errors returned by [`crate::Session::request_recommendations`].
///
/// Neither is fatal: the session is usable again right after either one.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A previous request has not resolved yet; this one was not sent
    #[error("A recommendation request is already in flight")]
    AlreadyInFlight,

    /// The prediction service failed; `message` is what the user sees
    #[error("{message}")]
    PredictionFailure {
        message: String,
        #[source]
        source: ClientError,
    },
}
