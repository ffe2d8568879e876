pub mod binance;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod paper;
pub mod signer;
