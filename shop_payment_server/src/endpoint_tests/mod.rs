mod helpers;
mod orders;
mod products;
mod webhooks;
