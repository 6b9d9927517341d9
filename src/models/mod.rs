pub mod common;
pub mod purchase;
pub mod raffle;
pub mod user;

pub use common::*;
pub use purchase::*;
pub use raffle::*;
pub use user::*;
