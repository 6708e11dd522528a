//! Market-data adapters.

mod http;

pub use http::HttpCandleSource;
