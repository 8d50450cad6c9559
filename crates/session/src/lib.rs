//! Recommendation session controller.
//!
//! This crate provides:
//! - `SessionState`: the fetched list, cursor, loading/error flags and the
//!   accepted ids, with the cursor and acceptance operations
//! - `Session`: the coordinator that owns the state and talks to the
//!   prediction and feedback collaborators
//! - `view`: pure projections (current pick, alternatives, has-next)
//!
//! ## Example Usage
//! ```ignore
//! use std::sync::Arc;
//! use session::{Session, DEFAULT_ALTERNATIVES};
//! use snack_client::{ClientConfig, HttpSnackClient};
//!
//! let client = Arc::new(HttpSnackClient::new(&ClientConfig::from_env())?);
//! let session = Session::new(client.clone(), client);
//!
//! session.request_recommendations(form.submit()).await?;
//! let view = session.view(DEFAULT_ALTERNATIVES);
//!
//! // User liked it: local first, remote in the background
//! session.accept_current();
//! // User wants something else
//! session.advance_cursor();
//! ```

pub mod coordinator;
pub mod error;
pub mod store;
pub mod view;

pub use coordinator::{FeedbackStats, Session, PREDICTION_FAILED_MESSAGE};
pub use error::SessionError;
pub use store::{SessionPhase, SessionState};
pub use view::{SessionView, DEFAULT_ALTERNATIVES};
