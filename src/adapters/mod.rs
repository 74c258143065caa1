// Adapters layer: concrete implementations of the domain ports.

pub mod clock;
pub mod http;
pub mod storage;

pub use clock::TokioDelay;
pub use http::HttpStockSource;
pub use storage::LocalStorage;
