pub mod errors;
pub mod id;
pub mod types;

pub use errors::{BazaarError, ConfigError};
pub use id::{new_id, ConnectionId};
pub use types::{ClientKey, CountingPolicy};

pub type Result<T> = std::result::Result<T, BazaarError>;
