use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::orders::OrderStatus,
    response::{ApiResponse, Meta},
};

/// Failures of the ordering and settlement workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid coupon: {0}")]
    InvalidCoupon(String),

    #[error("delivery address not found")]
    AddressNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("order is {current}, cannot move to {requested}")]
    InvalidOrderState {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("insufficient wallet balance")]
    InsufficientFunds,

    #[error("merchant balance cannot cover the reversal")]
    InsufficientMerchantFunds,

    #[error("student not found")]
    StudentNotFound,

    #[error("dish {0} is not available")]
    DishUnavailable(Uuid),

    #[error("not enough stock for dish {0}")]
    InsufficientStock(Uuid),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("order amount is out of range")]
    AmountOverflow,

    #[error("cart item not found")]
    CartItemNotFound,

    #[error("a refund was already requested for this order")]
    RefundAlreadyRequested,

    #[error("refund reason is required")]
    MissingRefundReason,

    #[error("platform configuration {0} is not a valid amount")]
    Config(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

pub type OrderResult<T> = Result<T, OrderError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

fn order_status_code(err: &OrderError) -> StatusCode {
    match err {
        OrderError::OrderNotFound
        | OrderError::StudentNotFound
        | OrderError::CartItemNotFound
        | OrderError::AddressNotFound => StatusCode::NOT_FOUND,
        OrderError::InvalidOrderState { .. }
        | OrderError::RefundAlreadyRequested
        | OrderError::InsufficientMerchantFunds
        | OrderError::InsufficientStock(_) => StatusCode::CONFLICT,
        OrderError::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
        OrderError::EmptyCart
        | OrderError::InvalidCoupon(_)
        | OrderError::DishUnavailable(_)
        | OrderError::InvalidQuantity
        | OrderError::AmountOverflow
        | OrderError::MissingRefundReason => StatusCode::BAD_REQUEST,
        OrderError::Config(_) | OrderError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Order(err) => order_status_code(err),
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OrmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage details stay in the logs.
        let message = match &self {
            AppError::Order(OrderError::Db(_)) => "Database error".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
