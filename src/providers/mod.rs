pub mod cbr;

pub use cbr::CbrRateSource;
