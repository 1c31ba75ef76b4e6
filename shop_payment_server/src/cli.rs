use std::{env, fmt::Write};

const HELP: &str = include_str!("./cli-help.txt");

/// Settings that are safe to echo back, grouped the way the help text groups them. Hash keys, IVs and the mail relay
/// API key are deliberately absent.
const VISIBLE_SETTINGS: [(&str, &[&str]); 4] = [
    ("Server", &["RUST_LOG", "SPG_HOST", "SPG_PORT", "SPG_DATABASE_URL", "SPG_MAX_DB_CONNECTIONS"]),
    ("Webhooks", &[
        "SPG_PUBLIC_URL",
        "SPG_EVENT_BUFFER_SIZE",
        "SPG_USE_X_FORWARDED_FOR",
        "SPG_USE_FORWARDED",
        "SPG_GATEWAY_IP_WHITELIST",
    ]),
    ("ECPay", &["SPG_ECPAY_MERCHANT_ID", "SPG_ECPAY_CHECKOUT_URL", "SPG_ECPAY_TRADE_DESC"]),
    ("Mail", &["SPG_MAIL_RELAY_URL", "SPG_MAIL_FROM", "SPG_MAIL_TO"]),
];

/// The server takes no arguments. If any are given, print the help and the current settings, and tell the caller not
/// to start the server.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("{}", settings_report(|name| env::var(name).map_err(|e| e.to_string())));
    true
}

fn settings_report<F>(lookup: F) -> String
where F: Fn(&str) -> Result<String, String> {
    let mut report = String::from("Current settings (secrets are never shown):\n");
    for (section, names) in VISIBLE_SETTINGS {
        let _ = writeln!(report, "  [{section}]");
        for name in names {
            let value = lookup(name).unwrap_or_else(|e| format!("<{e}>"));
            let _ = writeln!(report, "    {name:<30} {value}");
        }
    }
    report
}
