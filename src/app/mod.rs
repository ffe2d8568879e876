pub mod bootstrap;
pub mod keepalive;
pub mod normal_mode;
pub mod scan_mode;
