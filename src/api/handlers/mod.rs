pub mod auth;
pub use self::auth::{login, logout};

pub mod health;
pub use self::health::health;

pub mod pages;
pub use self::pages::page;

pub mod runtime_config;
pub use self::runtime_config::runtime_config;
