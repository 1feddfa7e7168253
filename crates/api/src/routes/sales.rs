//! Sale lifecycle routes.
//!
//! Exposes the five lifecycle operations (create, cancel/restore sale,
//! cancel/restore item) plus the sale-history reads. Cancel and restore are
//! admin-only; the engine itself trusts this layer to have checked the
//! role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use ventra_core::sale::CartLine;
use ventra_db::entities::{
    sale_items, sale_logs,
    sea_orm_active_enums::{SaleAction, SaleItemStatus, SaleStatus},
};
use ventra_db::repositories::sale::{CreateSaleInput, SaleError, SaleRepository, SaleWithItems};
use ventra_shared::AppError;
use ventra_shared::types::{PageRequest, PageResponse, ProductId, SaleId, SaleItemId};

/// Creates the sale routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales))
        .route("/sales", post(create_sale))
        .route("/sales/{sale_id}", get(get_sale))
        .route("/sales/{sale_id}/logs", get(get_sale_logs))
        .route("/sales/{sale_id}/cancel", post(cancel_sale))
        .route("/sales/{sale_id}/restore", post(restore_sale))
        .route("/sales/{sale_id}/items/{item_id}/cancel", post(cancel_sale_item))
        .route("/sales/{sale_id}/items/{item_id}/restore", post(restore_sale_item))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a sale.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    /// Cart lines.
    pub items: Vec<CreateSaleLineRequest>,
    /// Payment method tag (opaque).
    pub payment_method: String,
}

/// One cart line in a create-sale request.
///
/// Amounts travel as decimal strings so no client float ever touches
/// money or weights.
#[derive(Debug, Deserialize)]
pub struct CreateSaleLineRequest {
    /// Product ID.
    pub product_id: ProductId,
    /// Quantity in the product's unit granularity.
    pub quantity: String,
    /// Unit price at checkout time.
    pub price: String,
}

/// Optional body for cancel/restore endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LifecycleActionRequest {
    /// Free-text reason recorded in the audit log.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response for a sale with its items.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    /// Sale ID.
    pub id: Uuid,
    /// User who rang up the sale.
    pub user_id: Uuid,
    /// Sum of active item subtotals.
    pub total: String,
    /// Payment method tag.
    pub payment_method: String,
    /// Sale status.
    pub status: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
    /// Line items.
    pub items: Vec<SaleItemResponse>,
}

/// Response for a sale line item.
#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Product ID.
    pub product_id: Uuid,
    /// Quantity.
    pub quantity: String,
    /// Snapshot unit price.
    pub unit_price: String,
    /// Stored subtotal.
    pub subtotal: String,
    /// Item status.
    pub status: String,
}

/// Response for an audit log entry.
#[derive(Debug, Serialize)]
pub struct SaleLogResponse {
    /// Log entry ID.
    pub id: Uuid,
    /// Affected item, when the action was item-level.
    pub sale_item_id: Option<Uuid>,
    /// Acting user.
    pub user_id: Uuid,
    /// Action tag.
    pub action: String,
    /// Affected quantity, when the action was item-level.
    pub quantity: Option<String>,
    /// Operator-supplied reason.
    pub reason: Option<String>,
    /// Entry timestamp.
    pub created_at: String,
}

fn sale_response(result: SaleWithItems) -> SaleResponse {
    let SaleWithItems { sale, items } = result;
    SaleResponse {
        id: sale.id,
        user_id: sale.user_id,
        total: sale.total.to_string(),
        payment_method: sale.payment_method,
        status: sale_status_to_string(&sale.status),
        created_at: sale.created_at.to_rfc3339(),
        updated_at: sale.updated_at.to_rfc3339(),
        items: items.into_iter().map(item_response).collect(),
    }
}

fn item_response(item: sale_items::Model) -> SaleItemResponse {
    SaleItemResponse {
        id: item.id,
        product_id: item.product_id,
        quantity: item.quantity.to_string(),
        unit_price: item.unit_price.to_string(),
        subtotal: item.subtotal.to_string(),
        status: item_status_to_string(&item.status),
    }
}

fn log_response(log: sale_logs::Model) -> SaleLogResponse {
    SaleLogResponse {
        id: log.id,
        sale_item_id: log.sale_item_id,
        user_id: log.user_id,
        action: action_to_string(&log.action),
        quantity: log.quantity.map(|q| q.to_string()),
        reason: log.reason,
        created_at: log.created_at.to_rfc3339(),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/sales` - List sales with items, newest first.
async fn list_sales(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = SaleRepository::new((*state.db).clone());

    match repo.list_sales(page).await {
        Ok(page) => {
            let response = PageResponse {
                data: page.data.into_iter().map(sale_response).collect::<Vec<_>>(),
                meta: page.meta,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list sales");
            sale_error_response(&e)
        }
    }
}

/// POST `/sales` - Create a new sale from a cart.
async fn create_sale(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> impl IntoResponse {
    let lines = match parse_lines(&payload.items) {
        Ok(lines) => lines,
        Err(response) => return response,
    };

    let repo = SaleRepository::new((*state.db).clone());
    let input = CreateSaleInput {
        lines,
        payment_method: payload.payment_method,
        created_by: auth.user_id(),
    };

    match repo.create_sale(input).await {
        Ok(result) => {
            info!(
                sale_id = %result.sale.id,
                user_id = %auth.user_id(),
                total = %result.sale.total,
                "Sale created"
            );
            (StatusCode::CREATED, Json(sale_response(result))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create sale");
            sale_error_response(&e)
        }
    }
}

/// GET `/sales/{sale_id}` - Get a sale with its items.
async fn get_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(sale_id): Path<SaleId>,
) -> impl IntoResponse {
    let repo = SaleRepository::new((*state.db).clone());

    match repo.get_sale(sale_id.into_inner()).await {
        Ok(result) => (StatusCode::OK, Json(sale_response(result))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get sale");
            sale_error_response(&e)
        }
    }
}

/// GET `/sales/{sale_id}/logs` - Audit trail for a sale (admin only).
async fn get_sale_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(sale_id): Path<SaleId>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = SaleRepository::new((*state.db).clone());

    match repo.list_logs(sale_id.into_inner()).await {
        Ok(logs) => {
            let entries: Vec<SaleLogResponse> = logs.into_iter().map(log_response).collect();
            (StatusCode::OK, Json(json!({ "logs": entries }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to read sale logs");
            sale_error_response(&e)
        }
    }
}

/// POST `/sales/{sale_id}/cancel` - Cancel a whole sale (admin only).
async fn cancel_sale(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(sale_id): Path<SaleId>,
    payload: Option<Json<LifecycleActionRequest>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let sale_id = sale_id.into_inner();
    let reason = payload.and_then(|Json(p)| p.reason);
    let repo = SaleRepository::new((*state.db).clone());

    match repo.cancel_sale(sale_id, auth.user_id(), reason).await {
        Ok(sale) => {
            info!(sale_id = %sale_id, user_id = %auth.user_id(), "Sale cancelled");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Sale cancelled successfully",
                    "status": sale_status_to_string(&sale.status),
                    "total": sale.total.to_string()
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, sale_id = %sale_id, "Failed to cancel sale");
            sale_error_response(&e)
        }
    }
}

/// POST `/sales/{sale_id}/restore` - Restore a cancelled sale (admin only).
async fn restore_sale(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(sale_id): Path<SaleId>,
    payload: Option<Json<LifecycleActionRequest>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let sale_id = sale_id.into_inner();
    let reason = payload.and_then(|Json(p)| p.reason);
    let repo = SaleRepository::new((*state.db).clone());

    match repo.restore_sale(sale_id, auth.user_id(), reason).await {
        Ok(sale) => {
            info!(sale_id = %sale_id, user_id = %auth.user_id(), "Sale restored");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Sale restored successfully",
                    "status": sale_status_to_string(&sale.status),
                    "total": sale.total.to_string()
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, sale_id = %sale_id, "Failed to restore sale");
            sale_error_response(&e)
        }
    }
}

/// POST `/sales/{sale_id}/items/{item_id}/cancel` - Cancel one item (admin only).
async fn cancel_sale_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((sale_id, item_id)): Path<(SaleId, SaleItemId)>,
    payload: Option<Json<LifecycleActionRequest>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let (sale_id, item_id) = (sale_id.into_inner(), item_id.into_inner());
    let reason = payload.and_then(|Json(p)| p.reason);
    let repo = SaleRepository::new((*state.db).clone());

    match repo
        .cancel_sale_item(sale_id, item_id, auth.user_id(), reason)
        .await
    {
        Ok(change) => {
            info!(
                sale_id = %sale_id,
                item_id = %item_id,
                user_id = %auth.user_id(),
                new_total = %change.new_total,
                "Sale item cancelled"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Item cancelled successfully",
                    "new_total": change.new_total.to_string(),
                    "sale_status": sale_status_to_string(&change.sale_status)
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, sale_id = %sale_id, item_id = %item_id, "Failed to cancel item");
            sale_error_response(&e)
        }
    }
}

/// POST `/sales/{sale_id}/items/{item_id}/restore` - Restore one item (admin only).
async fn restore_sale_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((sale_id, item_id)): Path<(SaleId, SaleItemId)>,
    payload: Option<Json<LifecycleActionRequest>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let (sale_id, item_id) = (sale_id.into_inner(), item_id.into_inner());
    let reason = payload.and_then(|Json(p)| p.reason);
    let repo = SaleRepository::new((*state.db).clone());

    match repo
        .restore_sale_item(sale_id, item_id, auth.user_id(), reason)
        .await
    {
        Ok(change) => {
            info!(
                sale_id = %sale_id,
                item_id = %item_id,
                user_id = %auth.user_id(),
                new_total = %change.new_total,
                "Sale item restored"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Item restored successfully",
                    "new_total": change.new_total.to_string(),
                    "sale_status": sale_status_to_string(&change.sale_status)
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, sale_id = %sale_id, item_id = %item_id, "Failed to restore item");
            sale_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Rejects non-admin callers: cancel/restore are elevated operations.
fn require_admin(auth: &AuthUser) -> Result<(), Response> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(app_error_response(&AppError::Forbidden(
            "Administrator role required".to_string(),
        )))
    }
}

/// Renders a shared `AppError` with its canonical status and code.
fn app_error_response(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// Parses the request's decimal strings into cart lines.
fn parse_lines(items: &[CreateSaleLineRequest]) -> Result<Vec<CartLine>, Response> {
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let Ok(quantity) = Decimal::from_str(&item.quantity) else {
            return Err(invalid_amount("Invalid quantity format"));
        };
        let Ok(price) = Decimal::from_str(&item.price) else {
            return Err(invalid_amount("Invalid price format"));
        };

        lines.push(CartLine::new(item.product_id, quantity, price));
    }

    Ok(lines)
}

fn invalid_amount(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_amount",
            "message": message
        })),
    )
        .into_response()
}

/// Maps engine errors to HTTP responses.
fn sale_error_response(e: &SaleError) -> Response {
    match e {
        SaleError::SaleNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "sale_not_found",
                "message": "Sale not found"
            })),
        )
            .into_response(),
        SaleError::ItemNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "item_not_found",
                "message": "Item not found in this sale"
            })),
        )
            .into_response(),
        SaleError::ProductNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "product_not_found",
                "message": format!("Product not found: {id}")
            })),
        )
            .into_response(),
        SaleError::InvalidCart(reason) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_cart",
                "message": reason.to_string()
            })),
        )
            .into_response(),
        SaleError::AlreadyCancelled => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "already_cancelled",
                "message": "Sale or item is already cancelled"
            })),
        )
            .into_response(),
        SaleError::NotCancelled => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "not_cancelled",
                "message": "Sale or item is not cancelled"
            })),
        )
            .into_response(),
        SaleError::InsufficientStock { name, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "insufficient_stock",
                "message": format!("Insufficient stock for product: {name}")
            })),
        )
            .into_response(),
        SaleError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

fn sale_status_to_string(status: &SaleStatus) -> String {
    match status {
        SaleStatus::Completed => "completed".to_string(),
        SaleStatus::Cancelled => "cancelled".to_string(),
    }
}

fn item_status_to_string(status: &SaleItemStatus) -> String {
    match status {
        SaleItemStatus::Active => "active".to_string(),
        SaleItemStatus::Cancelled => "cancelled".to_string(),
    }
}

fn action_to_string(action: &SaleAction) -> String {
    match action {
        SaleAction::CancelSale => "CANCEL_SALE".to_string(),
        SaleAction::CancelItem => "CANCEL_ITEM".to_string(),
        SaleAction::RestoreSale => "RESTORE_SALE".to_string(),
        SaleAction::RestoreItem => "RESTORE_ITEM".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use ventra_core::sale::CartError;

    fn line_request(quantity: &str, price: &str) -> CreateSaleLineRequest {
        CreateSaleLineRequest {
            product_id: ProductId::new(),
            quantity: quantity.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn test_parse_lines_decimal_strings() {
        let lines = parse_lines(&[line_request("0.350", "12.00")]).unwrap();
        assert_eq!(lines[0].quantity, dec!(0.350));
        assert_eq!(lines[0].unit_price, dec!(12.00));
    }

    #[test]
    fn test_parse_lines_rejects_garbage() {
        assert!(parse_lines(&[line_request("two", "5.00")]).is_err());
        assert!(parse_lines(&[line_request("2", "five")]).is_err());
    }

    #[rstest]
    #[case(SaleError::SaleNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
    #[case(SaleError::ItemNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
    #[case(SaleError::ProductNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
    #[case(SaleError::InvalidCart(CartError::EmptyCart), StatusCode::BAD_REQUEST)]
    #[case(SaleError::AlreadyCancelled, StatusCode::CONFLICT)]
    #[case(SaleError::NotCancelled, StatusCode::CONFLICT)]
    #[case(
        SaleError::InsufficientStock {
            name: "Inka Cola 500ml".to_string(),
            product_id: Uuid::nil(),
        },
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    fn test_sale_error_status_codes(#[case] error: SaleError, #[case] expected: StatusCode) {
        assert_eq!(sale_error_response(&error).status(), expected);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(sale_status_to_string(&SaleStatus::Completed), "completed");
        assert_eq!(item_status_to_string(&SaleItemStatus::Cancelled), "cancelled");
        assert_eq!(action_to_string(&SaleAction::CancelSale), "CANCEL_SALE");
    }
}
