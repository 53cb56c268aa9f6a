use crate::{config::GatewayCredentials, error::CheckoutError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEX_LEN: usize = 64;

/// Signs and verifies gateway messages of the form
/// `{timestamp}.{clientKey}.{orderId}.{amount}` with HMAC-SHA256.
#[derive(Clone)]
pub struct SignatureService {
    client_key: String,
    keyed: HmacSha256,
}

impl SignatureService {
    pub fn new(credentials: &GatewayCredentials) -> Result<Self, CheckoutError> {
        if credentials.client_key.is_empty() {
            return Err(CheckoutError::Configuration(
                "gateway client key is not set".to_string(),
            ));
        }
        if credentials.secret_key.is_empty() {
            return Err(CheckoutError::Configuration(
                "gateway secret key is not set".to_string(),
            ));
        }

        let keyed = HmacSha256::new_from_slice(credentials.secret_key.as_bytes())
            .map_err(|e| CheckoutError::Configuration(format!("invalid gateway secret key: {}", e)))?;

        Ok(Self {
            client_key: credentials.client_key.clone(),
            keyed,
        })
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn sign(&self, timestamp: i64, order_id: &str, amount: u64) -> String {
        hex::encode(self.mac(timestamp, order_id, amount).finalize().into_bytes())
    }

    /// Constant-time check of a hex signature against the recomputed tag.
    /// Only the exact lowercase form produced by [`Self::sign`] is accepted.
    pub fn verify(
        &self,
        timestamp: i64,
        order_id: &str,
        amount: u64,
        signature: &str,
    ) -> Result<(), CheckoutError> {
        let mismatch = || CheckoutError::SignatureMismatch {
            order_id: order_id.to_string(),
        };

        if !is_lowercase_hex(signature) {
            return Err(mismatch());
        }
        let supplied = hex::decode(signature).map_err(|_| mismatch())?;

        self.mac(timestamp, order_id, amount)
            .verify_slice(&supplied)
            .map_err(|_| mismatch())
    }

    fn mac(&self, timestamp: i64, order_id: &str, amount: u64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(signing_message(timestamp, &self.client_key, order_id, amount).as_bytes());
        mac
    }
}

fn is_lowercase_hex(signature: &str) -> bool {
    signature.len() == SIGNATURE_HEX_LEN
        && signature
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

pub fn signing_message(timestamp: i64, client_key: &str, order_id: &str, amount: u64) -> String {
    format!("{}.{}.{}.{}", timestamp, client_key, order_id, amount)
}
