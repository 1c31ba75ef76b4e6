//! Primitives shared by the shop payment gateway crates.
pub mod helpers;
mod secret;
mod twd;

pub use secret::Secret;
pub use twd::Twd;
