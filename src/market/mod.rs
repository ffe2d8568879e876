pub mod account;
pub mod feed;
pub mod store;
pub mod ticker;
pub mod websocket;
