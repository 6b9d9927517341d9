pub mod auth;
pub mod purchase;
pub mod raffle;
pub mod settings;
pub mod upload;

pub use auth::auth_config;
pub use purchase::purchase_config;
pub use raffle::raffle_config;
pub use settings::settings_config;
pub use upload::upload_config;
