use std::sync::Arc;

use crate::models::binance_models::BookTickerEvent;

use super::feed::{ FeedError, FeedHandler };

/// Receives every decoded top-of-book update
pub trait QuoteListener: Send + Sync {
    fn on_quote(&self, ticker: &str, bid: f64, ask: f64);
}

/// Decodes `<symbol>@bookTicker` payloads for one ticker
pub struct BookTickerHandler {
    ticker: Arc<str>,
    listener: Arc<dyn QuoteListener>,
}

impl BookTickerHandler {
    pub fn new(ticker: Arc<str>, listener: Arc<dyn QuoteListener>) -> Self {
        Self { ticker, listener }
    }
}

#[inline]
fn parse_price(value: &str, field: &str) -> Result<f64, FeedError> {
    value.parse::<f64>().map_err(|e| FeedError::Decode(format!("{} '{}': {}", field, value, e)))
}

impl FeedHandler for BookTickerHandler {
    fn on_text(&mut self, text: &str) -> Result<(), FeedError> {
        let event: BookTickerEvent = serde_json
            ::from_str(text)
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        if event.symbol != self.ticker.as_ref() {
            return Err(
                FeedError::Decode(format!("expected {} but stream delivered {}", self.ticker, event.symbol))
            );
        }

        let bid = parse_price(&event.bid, "bid")?;
        let ask = parse_price(&event.ask, "ask")?;
        self.listener.on_quote(&self.ticker, bid, ask);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        quotes: Mutex<Vec<(String, f64, f64)>>,
    }

    impl QuoteListener for Recorder {
        fn on_quote(&self, ticker: &str, bid: f64, ask: f64) {
            self.quotes.lock().push((ticker.to_string(), bid, ask));
        }
    }

    #[test]
    fn publishes_decoded_quote() {
        let recorder = Arc::new(Recorder::default());
        let mut handler = BookTickerHandler::new("BNBUSDT".into(), recorder.clone());
        handler
            .on_text(
                r#"{"u":400900217,"s":"BNBUSDT","b":"25.35190000","B":"31.21000000","a":"25.36520000","A":"40.66000000"}"#
            )
            .unwrap();
        assert_eq!(recorder.quotes.lock()[0], ("BNBUSDT".to_string(), 25.3519, 25.3652));
    }

    #[test]
    fn malformed_or_foreign_payloads_are_fatal() {
        let recorder = Arc::new(Recorder::default());
        let mut handler = BookTickerHandler::new("BNBUSDT".into(), recorder.clone());

        assert!(matches!(handler.on_text("{not json"), Err(FeedError::Decode(_))));
        assert!(
            matches!(
                handler.on_text(r#"{"s":"ETHUSDT","b":"1","a":"2"}"#),
                Err(FeedError::Decode(_))
            )
        );
        assert!(
            matches!(
                handler.on_text(r#"{"s":"BNBUSDT","b":"x","a":"2"}"#),
                Err(FeedError::Decode(_))
            )
        );
        assert!(recorder.quotes.lock().is_empty());
    }
}
