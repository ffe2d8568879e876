pub mod binance_models;
pub mod opportunity;
pub mod symbol;
pub mod symbol_map;
pub mod triangle;
