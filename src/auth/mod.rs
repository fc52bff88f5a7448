// Authentication module

pub mod callback;
pub mod oauth2;
pub mod token;

pub use callback::{CallbackListener, CallbackResult};
pub use oauth2::{AuthError, ClientSecrets, GoogleAuth};
pub use token::{CredentialManager, Credentials};

pub const CALENDAR_SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];
pub const MAIL_SCOPES: &[&str] = &["https://mail.google.com/"];
