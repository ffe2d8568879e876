pub mod direction;
pub mod fee_kind;
pub mod side;
