pub mod client;
pub mod error;
pub mod tokens;

pub use client::{CLOCKS_PATH, Dentifrice, EXCHANGE_PATH, ExchangeMode};
pub use error::{ClientError, ErrorKind};
pub use tokens::{FileTokenStore, MemoryTokenStore, StoreError, TokenPair, TokenStore};

use crate::clock::Clock;

/// Remote clock operations, as seen by the editor and listing code.
pub trait ClockApi: Send + Sync {
    /// `None` when the list is unavailable; the user has been told why.
    fn list_clocks(&self) -> Option<Vec<Clock>>;

    fn create_clock(&self, clock: &Clock) -> Result<(), ClientError>;
}
