use cucumber::{then, when};
use shop_payment_engine::{
    db_types::{Order, OrderStatusType},
    order_objects::{NotificationOutcome, SettlementResult},
    test_utils::callbacks::{payment_callback, signed_payment_callback},
    OrderFlowError,
    ProductManagement,
};
use spg_common::Twd;

use crate::cucumber::{shop_world::ShopSystem, ShopWorld};

#[when(regex = r#"^(?:a|another) buyer orders a "([^"]*)"$"#)]
async fn place_order(world: &mut ShopWorld, name: String) {
    let system = world.system();
    let product_id = system.product_id(&name);
    let checkout = system.orders.checkout(product_id).await.expect("Error placing order");
    assert_eq!(checkout.params.get("CustomField1"), Some(checkout.order.id.to_string().as_str()));
    system.placed_orders.push(checkout.order);
}

#[when(expr = "a buyer tries to order a {string}")]
async fn try_order(world: &mut ShopWorld, name: String) {
    let system = world.system();
    let product_id = system.product_id(&name);
    system.last_checkout_error = system.orders.checkout(product_id).await.err();
}

async fn notify(system: &mut ShopSystem, order: &Order) {
    let params = signed_payment_callback(&system.codec, order.id, order.amount);
    let outcome = system.orders.process_payment_notification(&params).await;
    system.last_outcome = Some(outcome);
}

#[when("the gateway confirms payment for the order")]
async fn confirm_payment(world: &mut ShopWorld) {
    let system = world.system();
    let order = system.last_order().clone();
    notify(system, &order).await;
}

#[when("the gateway confirms payment for both orders")]
async fn confirm_all_payments(world: &mut ShopWorld) {
    let system = world.system();
    for order in system.placed_orders.clone() {
        notify(system, &order).await;
    }
}

#[when("the gateway sends a simulated payment for the order")]
async fn simulated_payment(world: &mut ShopWorld) {
    let system = world.system();
    let order = system.last_order().clone();
    let mut params = payment_callback(order.id, order.amount, "1", true);
    system.codec.sign_in_place(&mut params);
    let outcome = system.orders.process_payment_notification(&params).await;
    system.last_outcome = Some(outcome);
}

#[when("the gateway confirms payment for the order with a tampered amount")]
async fn tampered_payment(world: &mut ShopWorld) {
    let system = world.system();
    let order = system.last_order().clone();
    let mut params = signed_payment_callback(&system.codec, order.id, order.amount);
    params.insert("TradeAmt", order.amount.value() - 99);
    let outcome = system.orders.process_payment_notification(&params).await;
    system.last_outcome = Some(outcome);
}

#[when("the settlement worker processes pending events")]
async fn run_settlement(world: &mut ShopWorld) {
    world.system().run_settlement().await;
}

#[then(expr = "the gateway is told {string}")]
async fn gateway_response(world: &mut ShopWorld, expected: String) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification has been sent");
    assert_eq!(outcome.gateway_response(), expected);
}

#[then("the last notification outcome is \"already paid\"")]
async fn already_paid(world: &mut ShopWorld) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification has been sent");
    assert!(matches!(outcome, NotificationOutcome::AlreadyPaid(_)), "Outcome was {outcome:?}");
}

#[then(expr = "the order is pending for {int}")]
async fn order_is_pending(world: &mut ShopWorld, amount: i64) {
    let system = world.system();
    let id = system.last_order().id;
    let order = system.orders.fetch_order(id).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.amount, Twd::from(amount));
}

#[then("the order is paid")]
async fn order_is_paid(world: &mut ShopWorld) {
    let system = world.system();
    let id = system.last_order().id;
    let order = system.orders.fetch_order(id).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(order.status, OrderStatusType::Paid);
}

#[then(expr = "{string} has {int} in stock")]
async fn stock_level(world: &mut ShopWorld, name: String, stock: i64) {
    let system = world.system();
    let product_id = system.product_id(&name);
    let product = system.db.fetch_product(product_id).await.expect("Error fetching product").expect("No product");
    assert_eq!(product.stock, stock);
}

#[then(expr = "{int} notification(s) was/were sent")]
async fn notifications_sent(world: &mut ShopWorld, count: usize) {
    assert_eq!(world.system().notifications.len(), count);
}

#[then(expr = "{int} notification(s) was/were sent for {int}")]
async fn notifications_sent_for(world: &mut ShopWorld, count: usize, amount: i64) {
    let notifications = &world.system().notifications;
    assert_eq!(notifications.len(), count);
    assert!(notifications.iter().all(|n| n.amount == Twd::from(amount)));
}

#[then(expr = "{int} order(s) is/are recorded as oversold")]
async fn oversold(world: &mut ShopWorld, count: usize) {
    let system = world.system();
    let oversold = system.settlement.oversold_settlements().await.expect("Error fetching oversold orders");
    assert_eq!(oversold.len(), count);
    let reported = system.settlement_results.iter().filter(|r| matches!(r, SettlementResult::Oversold(_))).count();
    assert_eq!(reported, count);
}

#[then("the order is refused because the product is out of stock")]
async fn refused(world: &mut ShopWorld) {
    let err = world.system().last_checkout_error.as_ref().expect("The order was accepted");
    assert!(matches!(err, OrderFlowError::OutOfStock(_)), "Unexpected error: {err}");
}
