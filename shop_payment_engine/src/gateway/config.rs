use spg_common::Secret;

use crate::gateway::CheckMacCodec;

/// The ECPay staging checkout page.
pub const DEFAULT_CHECKOUT_URL: &str = "https://payment-stage.ecpay.com.tw/Cashier/AioCheckOut/V5";
pub const DEFAULT_TRADE_DESC: &str = "Mini Ecommerce Order";

/// Merchant credentials and endpoints for the ECPay all-in-one checkout.
#[derive(Debug, Clone)]
pub struct EcpayConfig {
    pub merchant_id: String,
    pub hash_key: Secret<String>,
    pub hash_iv: Secret<String>,
    /// Where the buyer's browser posts the signed checkout form.
    pub checkout_url: String,
    /// The absolute URL the gateway posts payment notifications to.
    pub return_url: String,
    pub trade_desc: String,
}

impl Default for EcpayConfig {
    /// The publicly documented ECPay staging merchant. Only useful against the staging gateway.
    fn default() -> Self {
        Self {
            merchant_id: "3002607".to_string(),
            hash_key: Secret::new("pwFHCqoQZGmho4w6".to_string()),
            hash_iv: Secret::new("EkRm7iFT261dpevs".to_string()),
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
            return_url: "http://localhost:8360/webhooks/ecpay".to_string(),
            trade_desc: DEFAULT_TRADE_DESC.to_string(),
        }
    }
}

impl EcpayConfig {
    pub fn codec(&self) -> CheckMacCodec {
        CheckMacCodec::new(self.hash_key.clone(), self.hash_iv.clone())
    }
}
