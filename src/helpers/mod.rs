pub mod converter;
pub mod precision;
pub mod validator;
