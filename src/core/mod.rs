//! Rate cache and currency resolution engine

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod log;
pub mod parser;
pub mod rates;
pub mod resolver;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use convert::{ConversionEngine, ConversionResult, ConvertedAmount};
pub use error::{ConversionError, RateError};
pub use rates::{RateSource, RateTable};
