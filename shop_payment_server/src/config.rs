//! Server configuration.
//!
//! Everything is read from environment variables (a `.env` file in the working directory is loaded first). Missing
//! or invalid values fall back to defaults that are suitable for running against the ECPay staging gateway, with a
//! log entry saying so. Run the server with any command line argument to see the full list of variables.
use std::{env, net::IpAddr};

use log::*;
use shop_payment_engine::gateway::{EcpayConfig, DEFAULT_CHECKOUT_URL, DEFAULT_TRADE_DESC};
use spg_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_store.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 10;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8360";
/// The path that the payment gateway posts notifications to. `SPG_PUBLIC_URL` is prepended to build the
/// `ReturnURL` that is sent with each checkout request.
pub const ECPAY_WEBHOOK_PATH: &str = "/webhooks/ecpay";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// The number of payment events that can be queued for the settlement worker before publishers have to wait.
    pub event_buffer_size: usize,
    /// The externally reachable base URL of this server, e.g. `https://shop.example.com`.
    pub public_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, requests against /webhooks endpoints will be checked against this list of addresses.
    pub gateway_whitelist: Option<Vec<IpAddr>>,
    pub ecpay: EcpayConfig,
    pub mail: MailConfig,
}

/// Where payment confirmation emails go.
#[derive(Clone, Debug, Default)]
pub struct MailConfig {
    /// An HTTP endpoint that accepts a JSON email message. If this is `None`, emails are only logged.
    pub relay_url: Option<String>,
    pub api_key: Secret<String>,
    pub from: String,
    pub to: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let public_url = DEFAULT_PUBLIC_URL.to_string();
        let ecpay = EcpayConfig { return_url: webhook_url(&public_url), ..EcpayConfig::default() };
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            public_url,
            use_x_forwarded_for: false,
            use_forwarded: false,
            gateway_whitelist: None,
            ecpay,
            mail: MailConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = parse_number_var("SPG_PORT", DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}, instead.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_db_connections = parse_number_var("SPG_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let event_buffer_size = parse_number_var("SPG_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let public_url = env::var("SPG_PUBLIC_URL").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ SPG_PUBLIC_URL is not set. Using {DEFAULT_PUBLIC_URL}, which the payment gateway will not be able \
                 to reach."
            );
            DEFAULT_PUBLIC_URL.into()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SPG_USE_FORWARDED").ok(), false);
        let gateway_whitelist = env::var("SPG_GATEWAY_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &gateway_whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The payment gateway IP whitelist was configured, but is empty. The server will run, but won't \
                     accept any payment notifications."
                );
            },
            Some(whitelist) => {
                info!("🪛️ Payment notifications will only be accepted from {whitelist:?}");
            },
            None => {
                info!("🪛️ No payment gateway IP whitelist is configured. Notifications are checked by signature only.");
            },
        }
        let ecpay = ecpay_config_from_env(&public_url);
        let mail = MailConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            event_buffer_size,
            public_url,
            use_x_forwarded_for,
            use_forwarded,
            gateway_whitelist,
            ecpay,
            mail,
        }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let relay_url = env::var("SPG_MAIL_RELAY_URL").ok().filter(|s| !s.trim().is_empty());
        if relay_url.is_none() {
            info!("🪛️ SPG_MAIL_RELAY_URL is not set. Payment confirmation emails will be logged, not sent.");
        }
        let api_key = Secret::new(env::var("SPG_MAIL_API_KEY").ok().unwrap_or_default());
        let from = env::var("SPG_MAIL_FROM").ok().unwrap_or_else(|| "shop@localhost".into());
        let to = env::var("SPG_MAIL_TO").ok().unwrap_or_else(|| "buyer@localhost".into());
        Self { relay_url, api_key, from, to }
    }
}

fn ecpay_config_from_env(public_url: &str) -> EcpayConfig {
    let defaults = EcpayConfig::default();
    let merchant_id = env::var("SPG_ECPAY_MERCHANT_ID").ok().unwrap_or_else(|| {
        warn!("🪛️ SPG_ECPAY_MERCHANT_ID is not set. Using the ECPay staging merchant, {}.", defaults.merchant_id);
        defaults.merchant_id.clone()
    });
    let hash_key = env::var("SPG_ECPAY_HASH_KEY").ok().map(Secret::new).unwrap_or_else(|| {
        warn!("🪛️ SPG_ECPAY_HASH_KEY is not set. Using the ECPay staging HashKey.");
        defaults.hash_key.clone()
    });
    let hash_iv = env::var("SPG_ECPAY_HASH_IV").ok().map(Secret::new).unwrap_or_else(|| {
        warn!("🪛️ SPG_ECPAY_HASH_IV is not set. Using the ECPay staging HashIV.");
        defaults.hash_iv.clone()
    });
    let checkout_url = env::var("SPG_ECPAY_CHECKOUT_URL").ok().unwrap_or_else(|| DEFAULT_CHECKOUT_URL.into());
    let trade_desc = env::var("SPG_ECPAY_TRADE_DESC").ok().unwrap_or_else(|| DEFAULT_TRADE_DESC.into());
    EcpayConfig { merchant_id, hash_key, hash_iv, checkout_url, return_url: webhook_url(public_url), trade_desc }
}

/// The absolute URL of the ECPay webhook for a server reachable at `public_url`.
pub fn webhook_url(public_url: &str) -> String {
    format!("{}{ECPAY_WEBHOOK_PATH}", public_url.trim_end_matches('/'))
}

/// Parses a comma-separated list of IP addresses. "none", "false" or "0" explicitly disable the whitelist, in which
/// case `None` is returned. Invalid entries are skipped.
pub fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Payment gateway IP whitelist is disabled. If this is not what you want, set SPG_GATEWAY_IP_WHITELIST \
             to a comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| {
                    warn!("🪛️ Ignoring invalid IP address ({s}) in SPG_GATEWAY_IP_WHITELIST: {e}");
                })
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn parse_number_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    env::var(name)
        .map(|s| {
            s.trim().parse::<T>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}
