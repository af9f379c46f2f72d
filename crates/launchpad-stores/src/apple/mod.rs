//! Apple destinations: TestFlight and the App Store

pub mod api;
pub mod app_store;
pub mod auth;
pub mod testflight;
pub mod transporter;

pub use api::AppStoreConnectApi;
pub use app_store::AppStoreClient;
pub use auth::ApiKey;
pub use testflight::TestFlightClient;
pub use transporter::Transporter;
