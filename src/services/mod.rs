pub mod access;
pub use access::{AccessError, AccessGate, AllowList};

pub mod bot;
pub use bot::{Dispatcher, Inbound, Reply};

pub mod cache;
pub use cache::{CacheStats, ResultCache};

pub mod paginator;
pub use paginator::{PageError, Paginator};

pub mod throttle;
pub use throttle::Cooldown;
