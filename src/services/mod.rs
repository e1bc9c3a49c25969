pub mod cart_service;
pub mod coupon_grants;
pub mod coupon_policy;
pub mod inventory;
pub mod ledger;
pub mod order_service;
pub mod payment_service;
pub mod platform_config;
