use crate::{db_types::OrderId, gateway::GatewayParams};

/// The fields of an ECPay payment notification that the engine acts on.
///
/// Building the view does not check anything. Only use it on parameters that have passed
/// [`CheckMacCodec::verify`](crate::gateway::CheckMacCodec::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    /// Parsed from `CustomField1`. `None` if the field is missing or is not an order id.
    pub order_id: Option<OrderId>,
    pub rtn_code: Option<String>,
    pub rtn_msg: Option<String>,
    /// `SimulatePaid=1` is sent when a payment is simulated from the merchant back office.
    pub simulated: bool,
    pub trade_no: Option<String>,
    pub merchant_trade_no: Option<String>,
}

impl PaymentCallback {
    pub fn from_params(params: &GatewayParams) -> Self {
        let field = |key: &str| params.get(key).map(str::to_string);
        Self {
            order_id: params.get("CustomField1").and_then(|v| v.parse::<OrderId>().ok()),
            rtn_code: field("RtnCode"),
            rtn_msg: field("RtnMsg"),
            simulated: params.get("SimulatePaid") == Some("1"),
            trade_no: field("TradeNo"),
            merchant_trade_no: field("MerchantTradeNo"),
        }
    }

    /// `RtnCode=1` is the only code that means the payment went through.
    pub fn is_successful(&self) -> bool {
        self.rtn_code.as_deref() == Some("1")
    }
}
