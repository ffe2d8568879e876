use hmac::{ Hmac, Mac };
use sha2::Sha256;

use crate::exchange::error::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 request signer producing the hex `signature` parameter
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: &str) -> Self {
        Self { secret: secret.as_bytes().to_vec() }
    }

    pub fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e|
            ExchangeError::Signing(e.to_string())
        )?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Signer(***)")
    }
}
