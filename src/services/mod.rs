pub mod auth_service;
pub mod availability;
pub mod purchase_service;
pub mod raffle_service;
pub mod settings_service;

pub use auth_service::*;
pub use purchase_service::*;
pub use raffle_service::*;
pub use settings_service::*;
