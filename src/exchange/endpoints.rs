use anyhow::{ Context, Result };
use url::Url;

/// REST and stream locations of the exchange
#[derive(Debug, Clone)]
pub struct Endpoints {
    rest: Url,
    ws: Url,
}

impl Endpoints {
    pub fn new(rest_url: &str, ws_url: &str) -> Result<Self> {
        let rest = Url::parse(rest_url).with_context(|| format!("Invalid REST URL: {}", rest_url))?;
        let ws = Url::parse(ws_url).with_context(|| format!("Invalid websocket URL: {}", ws_url))?;
        Ok(Self { rest, ws })
    }

    #[inline]
    fn rest_path(&self, path: &str) -> Result<Url> {
        self.rest.join(path).with_context(|| format!("Failed to build URL for {}", path))
    }

    pub fn exchange_info(&self) -> Result<Url> {
        self.rest_path("api/v3/exchangeInfo")
    }

    pub fn book_ticker(&self) -> Result<Url> {
        self.rest_path("api/v3/ticker/bookTicker")
    }

    pub fn trade_fee(&self) -> Result<Url> {
        self.rest_path("sapi/v1/asset/tradeFee")
    }

    pub fn user_asset(&self) -> Result<Url> {
        self.rest_path("sapi/v3/asset/getUserAsset")
    }

    pub fn user_data_stream(&self) -> Result<Url> {
        self.rest_path("api/v3/userDataStream")
    }

    pub fn order(&self) -> Result<Url> {
        self.rest_path("api/v3/order")
    }

    /// `<ws>/ws/<ticker>@bookTicker`, ticker lowercased
    pub fn book_ticker_stream(&self, ticker: &str) -> Result<Url> {
        let path = format!("ws/{}@bookTicker", ticker.to_lowercase());
        self.ws.join(&path).with_context(|| format!("Failed to build stream URL for {}", ticker))
    }

    /// `<ws>/ws/<listenKey>`
    pub fn user_stream(&self, listen_key: &str) -> Result<Url> {
        self.ws
            .join(&format!("ws/{}", listen_key))
            .context("Failed to build user data stream URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_rest_and_stream_urls() {
        let endpoints = Endpoints::new("https://api.binance.com", "wss://stream.binance.com:9443").unwrap();
        assert_eq!(endpoints.exchange_info().unwrap().as_str(), "https://api.binance.com/api/v3/exchangeInfo");
        assert_eq!(
            endpoints.user_asset().unwrap().as_str(),
            "https://api.binance.com/sapi/v3/asset/getUserAsset"
        );
        assert_eq!(
            endpoints.book_ticker_stream("BTCUSDT").unwrap().as_str(),
            "wss://stream.binance.com:9443/ws/btcusdt@bookTicker"
        );
        assert_eq!(
            endpoints.user_stream("abc123").unwrap().as_str(),
            "wss://stream.binance.com:9443/ws/abc123"
        );
    }

    #[test]
    fn rejects_garbage_urls() {
        assert!(Endpoints::new("not a url", "wss://stream.binance.com:9443").is_err());
    }
}
