use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use strum_macros::Display;
use uuid::Uuid;

use crate::enums::direction::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OpportunityKind {
    /// Triangle crossed the threshold during evaluation
    Candidate,
    /// All three legs filled
    Executed,
    /// A leg failed and the remaining legs were skipped
    Aborted,
    /// Cross-quote spread seen by the spread monitor (never traded)
    Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub price: f64,
}

impl PricePoint {
    pub fn new(ticker: impl Into<String>, price: f64) -> Self {
        Self { ticker: ticker.into(), price }
    }
}

/// One row handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: Uuid,
    pub kind: OpportunityKind,
    pub high: PricePoint,
    pub low: PricePoint,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OpportunityRecord {
    pub fn new(kind: OpportunityKind, high: PricePoint, low: PricePoint, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            high,
            low,
            value,
            direction: None,
            path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_route(mut self, direction: Direction, path: impl Into<String>) -> Self {
        self.direction = Some(direction);
        self.path = Some(path.into());
        self
    }
}
