pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod coupons;
pub mod dishes;
pub mod merchants;
pub mod order_items;
pub mod orders;
pub mod platform_config;
pub mod refunds;
pub mod students;
pub mod user_coupons;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use coupons::Entity as Coupons;
pub use dishes::Entity as Dishes;
pub use merchants::Entity as Merchants;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use platform_config::Entity as PlatformConfig;
pub use refunds::Entity as Refunds;
pub use students::Entity as Students;
pub use user_coupons::Entity as UserCoupons;
