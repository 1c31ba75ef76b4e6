//! The page that hands the buyer over to the payment gateway.
//!
//! The gateway's checkout takes a signed form POST, so the server answers `POST /orders` with a tiny HTML page that
//! holds the signed parameters in hidden inputs and submits itself on load.
use shop_payment_engine::gateway::GatewayParams;

/// Renders the auto-submitting checkout form. Every value is HTML-escaped.
pub fn render_checkout_page(checkout_url: &str, params: &GatewayParams) -> String {
    let inputs = params
        .iter()
        .map(|(k, v)| format!("    <input type=\"hidden\" name=\"{}\" value=\"{}\">\n", escape_html(k), escape_html(v)))
        .collect::<String>();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Redirecting to payment</title></head>\n<body \
         onload=\"document.forms[0].submit()\">\n  <form method=\"post\" action=\"{}\">\n{inputs}    <noscript><button \
         type=\"submit\">Continue to payment</button></noscript>\n  </form>\n</body>\n</html>\n",
        escape_html(checkout_url)
    )
}

pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
