use serde::{ Deserialize, Serialize };
use strum_macros::{ Display, EnumString };

/// Which side of the fee schedule is charged on every leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FeeKind {
    Maker,
    /// All legs are market orders, so the taker fee is the usual choice
    #[default]
    Taker,
}
