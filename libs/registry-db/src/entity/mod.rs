pub mod factory_cursor;
pub mod pair;
pub mod token;

// Re-exports for convenience
pub use factory_cursor::FactoryCursor;
pub use pair::{NewPair, Pair};
pub use token::{MarketData, NewToken, Token};
