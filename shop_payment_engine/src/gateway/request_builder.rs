use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use spg_common::Twd;

use crate::{
    db_types::OrderId,
    gateway::{CheckMacCodec, EcpayConfig, GatewayParams},
};

/// The gateway rejects `MerchantTradeNo` values longer than this.
pub const MAX_TRADE_NO_LENGTH: usize = 20;

/// Builds the signed parameter set that sends a buyer to the ECPay checkout page.
#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    config: EcpayConfig,
    codec: CheckMacCodec,
}

impl PaymentRequestBuilder {
    pub fn new(config: EcpayConfig) -> Self {
        let codec = config.codec();
        Self { config, codec }
    }

    pub fn config(&self) -> &EcpayConfig {
        &self.config
    }

    pub fn codec(&self) -> &CheckMacCodec {
        &self.codec
    }

    pub fn build(&self, order_id: OrderId, amount: Twd, item_name: &str) -> GatewayParams {
        self.build_at(order_id, amount, item_name, Local::now())
    }

    /// Builds the request as if it were made at `now`. `MerchantTradeDate` is rendered in `now`'s time zone.
    pub fn build_at<Tz>(&self, order_id: OrderId, amount: Twd, item_name: &str, now: DateTime<Tz>) -> GatewayParams
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let trade_no = merchant_trade_no(order_id, now.timestamp_millis());
        let mut params = GatewayParams::new()
            .with("MerchantID", &self.config.merchant_id)
            .with("MerchantTradeNo", &trade_no)
            .with("MerchantTradeDate", now.format("%Y/%m/%d %H:%M:%S"))
            .with("PaymentType", "aio")
            .with("TotalAmount", amount.value())
            .with("TradeDesc", &self.config.trade_desc)
            .with("ItemName", item_name)
            .with("ReturnURL", &self.config.return_url)
            .with("ChoosePayment", "ALL")
            .with("EncryptType", 1)
            .with("CustomField1", order_id);
        self.codec.sign_in_place(&mut params);
        debug!("🔐️ Signed payment request {trade_no} for order #{order_id} ({amount})");
        params
    }
}

/// `O<order id>T<unix millis>`, padded with random alphanumerics to the gateway's length limit so that repeated
/// checkouts of the same order in the same millisecond still get distinct trade numbers. For very large order ids the
/// leading digits of the timestamp are dropped to make room.
fn merchant_trade_no(order_id: OrderId, millis: i64) -> String {
    let mut trade_no = format!("O{order_id}T");
    let millis = millis.to_string();
    let room = MAX_TRADE_NO_LENGTH.saturating_sub(trade_no.len());
    trade_no.push_str(&millis[millis.len().saturating_sub(room)..]);
    let fill = MAX_TRADE_NO_LENGTH.saturating_sub(trade_no.len());
    trade_no.extend(thread_rng().sample_iter(&Alphanumeric).take(fill).map(char::from));
    trade_no
}
