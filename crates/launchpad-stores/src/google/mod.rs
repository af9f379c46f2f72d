//! Google destinations: Firebase App Distribution and Play Console

pub mod auth;
pub mod firebase;
pub mod play_console;

pub use auth::{GoogleAuth, ServiceAccountKey};
pub use firebase::FirebaseClient;
pub use play_console::PlayConsoleClient;
