//! Payment notifications as the ECPay staging gateway sends them.
use spg_common::Twd;

use crate::{
    db_types::OrderId,
    gateway::{CheckMacCodec, EcpayConfig, GatewayParams},
};

pub fn test_gateway_config() -> EcpayConfig {
    EcpayConfig { return_url: "https://shop.example.com/webhooks/ecpay".to_string(), ..EcpayConfig::default() }
}

/// An unsigned credit card payment notification for the order.
pub fn payment_callback(order_id: OrderId, amount: Twd, rtn_code: &str, simulate_paid: bool) -> GatewayParams {
    let rtn_msg = if rtn_code == "1" { "Succeeded" } else { "Failed" };
    GatewayParams::new()
        .with("CustomField1", order_id)
        .with("MerchantID", "3002607")
        .with("MerchantTradeNo", format!("O{order_id}T1718000000000"))
        .with("PaymentDate", "2024/06/10 14:20:00")
        .with("PaymentType", "Credit_CreditCard")
        .with("PaymentTypeChargeFee", "3")
        .with("RtnCode", rtn_code)
        .with("RtnMsg", rtn_msg)
        .with("SimulatePaid", if simulate_paid { "1" } else { "0" })
        .with("TradeAmt", amount.value())
        .with("TradeDate", "2024/06/10 14:13:20")
        .with("TradeNo", format!("24061014132{:05}", order_id.value()))
}

/// A successful payment notification for the order, signed with the codec.
pub fn signed_payment_callback(codec: &CheckMacCodec, order_id: OrderId, amount: Twd) -> GatewayParams {
    let mut params = payment_callback(order_id, amount, "1", false);
    codec.sign_in_place(&mut params);
    params
}
