use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartLine, CartList, UpdateCartRequest},
        orders::{
            CreateOrderRequest, OrderList, OrderWithItems, PaymentResponse, PlacedOrderResponse,
            RefundRequest, UpdateOrderStatusRequest,
        },
    },
    entity::{coupons::CouponKind, orders::OrderStatus},
    models::{CartItem, Dish, Order, OrderItem, Refund},
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::pay_order,
        orders::cancel_order,
        orders::update_order_status,
        orders::request_refund,
    ),
    components(
        schemas(
            Dish,
            CartItem,
            Order,
            OrderItem,
            Refund,
            OrderStatus,
            CouponKind,
            AddToCartRequest,
            UpdateCartRequest,
            CartLine,
            CartList,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            RefundRequest,
            OrderList,
            OrderWithItems,
            PlacedOrderResponse,
            PaymentResponse,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<PlacedOrderResponse>,
            ApiResponse<PaymentResponse>,
            ApiResponse<CartList>,
            ApiResponse<CartItem>,
            ApiResponse<Refund>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order, payment and cancellation endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
