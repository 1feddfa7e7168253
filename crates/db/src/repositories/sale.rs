//! Sale repository: the sale lifecycle engine.
//!
//! Owns creation, cancellation, and restoration of sales and their line
//! items. Every operation runs as one database transaction: stock
//! adjustments, status flips, total recomputation, and the audit entry
//! become visible together or not at all.
//!
//! Two invariants are re-established by every write path here:
//! - a sale's total equals the sum of subtotals over its active items;
//! - a sale is cancelled exactly when it has zero active items.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use ventra_core::sale::{
    CartError, CartLine, LineState, StatusError, active_total, cart_total, derive_status,
    ensure_item_active, ensure_item_cancelled, ensure_sale_cancelled, ensure_sale_not_cancelled,
    ensure_unit_granularity, line_subtotal, validate_cart,
};
use ventra_shared::types::{PageRequest, PageResponse};

use super::product::ProductRepository;
use crate::entities::{
    sale_items, sale_logs, sales,
    sea_orm_active_enums::{SaleAction, SaleItemStatus, SaleStatus},
};

/// Error types for sale lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    /// Item not found under the given sale.
    #[error("Item not found in this sale: {0}")]
    ItemNotFound(Uuid),

    /// Product referenced by a cart line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// The submitted cart failed validation.
    #[error("Invalid cart: {0}")]
    InvalidCart(#[from] CartError),

    /// The sale or item is already cancelled.
    #[error("Already cancelled")]
    AlreadyCancelled,

    /// The sale or item is not cancelled, so it cannot be restored.
    #[error("Not cancelled")]
    NotCancelled,

    /// A stock decrement would drive the product below zero.
    #[error("Insufficient stock for product: {name}")]
    InsufficientStock {
        /// Product display name, surfaced to the operator.
        name: String,
        /// Product identifier.
        product_id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StatusError> for SaleError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::AlreadyCancelled => Self::AlreadyCancelled,
            StatusError::NotCancelled => Self::NotCancelled,
        }
    }
}

/// Input for creating a sale.
#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    /// Cart lines with caller-supplied snapshot prices.
    pub lines: Vec<CartLine>,
    /// Opaque payment method tag.
    pub payment_method: String,
    /// User who rang up the sale.
    pub created_by: Uuid,
}

/// A sale with its line items.
#[derive(Debug, Clone)]
pub struct SaleWithItems {
    /// Sale header.
    pub sale: sales::Model,
    /// Line items, in insertion order.
    pub items: Vec<sale_items::Model>,
}

/// Result of cancelling or restoring a single item.
#[derive(Debug, Clone)]
pub struct ItemChange {
    /// The sale's recomputed total.
    pub new_total: Decimal,
    /// The sale's status after re-derivation.
    pub sale_status: SaleStatus,
}

/// Sale repository driving the sale lifecycle.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
}

impl SaleRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a sale from a cart, decrementing stock per line.
    ///
    /// All-or-nothing: either every line is persisted and every decrement
    /// applied, or the transaction rolls back and stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cart is empty or carries a non-positive quantity
    /// - A referenced product does not exist
    /// - Any product has less stock than its line quantity
    /// - The database transaction fails
    pub async fn create_sale(&self, input: CreateSaleInput) -> Result<SaleWithItems, SaleError> {
        validate_cart(&input.lines)?;

        // Caller-supplied prices, not the catalog's current price: operators
        // may adjust prices at checkout time.
        let total = cart_total(&input.lines);

        let txn = self.db.begin().await?;
        let now = Utc::now().into();
        let sale_id = Uuid::new_v4();

        let sale = sales::ActiveModel {
            id: Set(sale_id),
            user_id: Set(input.created_by),
            total: Set(total),
            payment_method: Set(input.payment_method.clone()),
            status: Set(SaleStatus::Completed),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(input.lines.len());

        for line in &input.lines {
            let product_id = line.product_id.into_inner();

            let product = ProductRepository::find_by_id(&txn, product_id)
                .await?
                .ok_or(SaleError::ProductNotFound(product_id))?;

            ensure_unit_granularity(product.unit.clone().into(), line.quantity)?;

            if !ProductRepository::try_take_stock(&txn, product_id, line.quantity).await? {
                // Dropping the transaction rolls back the sale header and
                // every earlier line.
                return Err(SaleError::InsufficientStock {
                    name: product.name,
                    product_id,
                });
            }

            let item = sale_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                subtotal: Set(line_subtotal(line.quantity, line.unit_price)),
                status: Set(SaleItemStatus::Active),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            items.push(item);
        }

        txn.commit().await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Cancels a whole sale: restores stock for every active item, marks
    /// the items cancelled, and zeroes the sale total.
    ///
    /// # Errors
    ///
    /// Returns an error if the sale does not exist, is already cancelled,
    /// or the database transaction fails.
    pub async fn cancel_sale(
        &self,
        sale_id: Uuid,
        acting_user: Uuid,
        reason: Option<String>,
    ) -> Result<sales::Model, SaleError> {
        let txn = self.db.begin().await?;

        let sale = Self::load_sale_locked(&txn, sale_id).await?;
        ensure_sale_not_cancelled(sale_core_status(&sale))?;

        // Authoritative guard: the conditional update loses exactly one of
        // two racing cancels, so stock is never restored twice.
        let guarded = sales::Entity::update_many()
            .set(sales::ActiveModel {
                status: Set(SaleStatus::Cancelled),
                total: Set(Decimal::ZERO),
                ..Default::default()
            })
            .filter(sales::Column::Id.eq(sale_id))
            .filter(sales::Column::Status.eq(SaleStatus::Completed))
            .exec(&txn)
            .await?;
        if guarded.rows_affected == 0 {
            return Err(SaleError::AlreadyCancelled);
        }

        let items = Self::load_items(&txn, sale_id).await?;

        // Only active items are restored, so an item cancelled individually
        // beforehand is not credited back a second time.
        for item in &items {
            if item.status == SaleItemStatus::Active
                && Self::flip_item(&txn, item.id, SaleItemStatus::Active, SaleItemStatus::Cancelled)
                    .await?
            {
                ProductRepository::put_back_stock(&txn, item.product_id, item.quantity).await?;
            }
        }

        Self::append_log(&txn, sale_id, None, acting_user, SaleAction::CancelSale, None, reason)
            .await?;

        let updated = Self::load_sale(&txn, sale_id).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Cancels a single line item: restores its stock, recomputes the sale
    /// total, and cancels the sale if no active items remain.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist under the sale, is
    /// already cancelled, or the database transaction fails.
    pub async fn cancel_sale_item(
        &self,
        sale_id: Uuid,
        item_id: Uuid,
        acting_user: Uuid,
        reason: Option<String>,
    ) -> Result<ItemChange, SaleError> {
        let txn = self.db.begin().await?;

        Self::load_sale_locked(&txn, sale_id).await?;
        let item = Self::load_item(&txn, sale_id, item_id).await?;
        ensure_item_active(item.status.clone().into())?;

        // The flip doubles as the race-safe guard: a concurrent cancel of
        // the same item leaves zero affected rows here.
        if !Self::flip_item(&txn, item_id, SaleItemStatus::Active, SaleItemStatus::Cancelled)
            .await?
        {
            return Err(SaleError::AlreadyCancelled);
        }

        ProductRepository::put_back_stock(&txn, item.product_id, item.quantity).await?;

        let change = Self::rederive_sale(&txn, sale_id).await?;

        Self::append_log(
            &txn,
            sale_id,
            Some(item_id),
            acting_user,
            SaleAction::CancelItem,
            Some(item.quantity),
            reason,
        )
        .await?;

        txn.commit().await?;

        Ok(change)
    }

    /// Restores a cancelled line item, re-consuming stock exactly as a new
    /// sale would. A restored item always reactivates its parent sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist under the sale, is not
    /// cancelled, its product lacks stock, or the database transaction
    /// fails.
    pub async fn restore_sale_item(
        &self,
        sale_id: Uuid,
        item_id: Uuid,
        acting_user: Uuid,
        reason: Option<String>,
    ) -> Result<ItemChange, SaleError> {
        let txn = self.db.begin().await?;

        Self::load_sale_locked(&txn, sale_id).await?;
        let item = Self::load_item(&txn, sale_id, item_id).await?;
        ensure_item_cancelled(item.status.clone().into())?;

        let product = ProductRepository::find_by_id(&txn, item.product_id)
            .await?
            .ok_or(SaleError::ProductNotFound(item.product_id))?;

        if !ProductRepository::try_take_stock(&txn, item.product_id, item.quantity).await? {
            return Err(SaleError::InsufficientStock {
                name: product.name,
                product_id: item.product_id,
            });
        }

        if !Self::flip_item(&txn, item_id, SaleItemStatus::Cancelled, SaleItemStatus::Active)
            .await?
        {
            return Err(SaleError::NotCancelled);
        }

        let change = Self::rederive_sale(&txn, sale_id).await?;

        Self::append_log(
            &txn,
            sale_id,
            Some(item_id),
            acting_user,
            SaleAction::RestoreItem,
            Some(item.quantity),
            reason,
        )
        .await?;

        txn.commit().await?;

        Ok(change)
    }

    /// Restores a cancelled sale by reactivating its full original item
    /// set, re-consuming stock for every item.
    ///
    /// Stock is verified for all items before any becomes active again; a
    /// single short product aborts the whole restore.
    ///
    /// # Errors
    ///
    /// Returns an error if the sale does not exist, is not cancelled, any
    /// product lacks stock for its item, or the database transaction fails.
    pub async fn restore_sale(
        &self,
        sale_id: Uuid,
        acting_user: Uuid,
        reason: Option<String>,
    ) -> Result<sales::Model, SaleError> {
        let txn = self.db.begin().await?;

        let sale = Self::load_sale_locked(&txn, sale_id).await?;
        ensure_sale_cancelled(sale_core_status(&sale))?;

        let items = Self::load_items(&txn, sale_id).await?;

        let mut new_total = Decimal::ZERO;
        for item in &items {
            let product = ProductRepository::find_by_id(&txn, item.product_id)
                .await?
                .ok_or(SaleError::ProductNotFound(item.product_id))?;

            if !ProductRepository::try_take_stock(&txn, item.product_id, item.quantity).await? {
                // First offending product aborts the whole restore; the
                // rollback returns every decrement taken so far.
                return Err(SaleError::InsufficientStock {
                    name: product.name,
                    product_id: item.product_id,
                });
            }

            new_total += item.subtotal;
        }

        sale_items::Entity::update_many()
            .set(sale_items::ActiveModel {
                status: Set(SaleItemStatus::Active),
                ..Default::default()
            })
            .filter(sale_items::Column::SaleId.eq(sale_id))
            .exec(&txn)
            .await?;

        // Conditional for the same reason as cancel_sale: of two racing
        // restores, exactly one re-consumes the stock.
        let guarded = sales::Entity::update_many()
            .set(sales::ActiveModel {
                status: Set(SaleStatus::Completed),
                total: Set(new_total),
                ..Default::default()
            })
            .filter(sales::Column::Id.eq(sale_id))
            .filter(sales::Column::Status.eq(SaleStatus::Cancelled))
            .exec(&txn)
            .await?;
        if guarded.rows_affected == 0 {
            return Err(SaleError::NotCancelled);
        }

        Self::append_log(&txn, sale_id, None, acting_user, SaleAction::RestoreSale, None, reason)
            .await?;

        let updated = Self::load_sale(&txn, sale_id).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Lists sales with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_sales(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<SaleWithItems>, SaleError> {
        let total = sales::Entity::find().count(&self.db).await?;

        let sale_models = sales::Entity::find()
            .order_by_desc(sales::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let sale_ids: Vec<Uuid> = sale_models.iter().map(|s| s.id).collect();
        let all_items = sale_items::Entity::find()
            .filter(sale_items::Column::SaleId.is_in(sale_ids))
            .order_by_asc(sale_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let data = sale_models
            .into_iter()
            .map(|sale| {
                let items = all_items
                    .iter()
                    .filter(|item| item.sale_id == sale.id)
                    .cloned()
                    .collect();
                SaleWithItems { sale, items }
            })
            .collect();

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Gets a sale with its items.
    ///
    /// # Errors
    ///
    /// Returns an error if the sale is not found or the query fails.
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleWithItems, SaleError> {
        let sale = sales::Entity::find_by_id(sale_id)
            .one(&self.db)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))?;

        let items = Self::load_items(&self.db, sale_id).await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Reads a sale's audit trail, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns an error if the sale is not found or the query fails.
    pub async fn list_logs(&self, sale_id: Uuid) -> Result<Vec<sale_logs::Model>, SaleError> {
        sales::Entity::find_by_id(sale_id)
            .one(&self.db)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))?;

        let logs = sale_logs::Entity::find()
            .filter(sale_logs::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_logs::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(logs)
    }

    // ========================================================================
    // Transaction-scoped helpers
    // ========================================================================

    async fn load_sale(txn: &DatabaseTransaction, sale_id: Uuid) -> Result<sales::Model, SaleError> {
        sales::Entity::find_by_id(sale_id)
            .one(txn)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))
    }

    /// Loads a sale with `FOR UPDATE`, serializing every lifecycle
    /// operation on the same sale. Item flips and the total recomputation
    /// then run one-at-a-time per sale regardless of request interleaving.
    async fn load_sale_locked(
        txn: &DatabaseTransaction,
        sale_id: Uuid,
    ) -> Result<sales::Model, SaleError> {
        sales::Entity::find_by_id(sale_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))
    }

    async fn load_item(
        txn: &DatabaseTransaction,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> Result<sale_items::Model, SaleError> {
        sale_items::Entity::find_by_id(item_id)
            .filter(sale_items::Column::SaleId.eq(sale_id))
            .one(txn)
            .await?
            .ok_or(SaleError::ItemNotFound(item_id))
    }

    async fn load_items<C: sea_orm::ConnectionTrait>(
        conn: &C,
        sale_id: Uuid,
    ) -> Result<Vec<sale_items::Model>, SaleError> {
        let items = sale_items::Entity::find()
            .filter(sale_items::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_items::Column::CreatedAt)
            .all(conn)
            .await?;

        Ok(items)
    }

    /// Flips one item's status, conditioned on its current value. The
    /// affected-row count tells the caller whether it won the flip.
    async fn flip_item(
        txn: &DatabaseTransaction,
        item_id: Uuid,
        from: SaleItemStatus,
        to: SaleItemStatus,
    ) -> Result<bool, DbErr> {
        let result = sale_items::Entity::update_many()
            .set(sale_items::ActiveModel {
                status: Set(to),
                ..Default::default()
            })
            .filter(sale_items::Column::Id.eq(item_id))
            .filter(sale_items::Column::Status.eq(from))
            .exec(txn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Recomputes a sale's total and status from its items' current states
    /// and persists both.
    async fn rederive_sale(
        txn: &DatabaseTransaction,
        sale_id: Uuid,
    ) -> Result<ItemChange, SaleError> {
        let items = Self::load_items(txn, sale_id).await?;
        let states = line_states(&items);

        let new_total = active_total(&states);
        let sale_status: SaleStatus = derive_status(&states).into();

        sales::Entity::update_many()
            .set(sales::ActiveModel {
                total: Set(new_total),
                status: Set(sale_status.clone()),
                ..Default::default()
            })
            .filter(sales::Column::Id.eq(sale_id))
            .exec(txn)
            .await?;

        Ok(ItemChange {
            new_total,
            sale_status,
        })
    }

    /// Appends one audit entry inside the operation's unit of work.
    async fn append_log(
        txn: &DatabaseTransaction,
        sale_id: Uuid,
        sale_item_id: Option<Uuid>,
        user_id: Uuid,
        action: SaleAction,
        quantity: Option<Decimal>,
        reason: Option<String>,
    ) -> Result<(), DbErr> {
        sale_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            sale_item_id: Set(sale_item_id),
            user_id: Set(user_id),
            action: Set(action),
            quantity: Set(quantity),
            reason: Set(reason),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await?;

        Ok(())
    }
}

/// Projects stored items into the pure (status, subtotal) states the core
/// invariant functions consume.
fn line_states(items: &[sale_items::Model]) -> Vec<LineState> {
    items
        .iter()
        .map(|item| LineState::new(item.status.clone().into(), item.subtotal))
        .collect()
}

const fn sale_core_status(sale: &sales::Model) -> ventra_core::sale::SaleStatus {
    match sale.status {
        SaleStatus::Completed => ventra_core::sale::SaleStatus::Completed,
        SaleStatus::Cancelled => ventra_core::sale::SaleStatus::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use ventra_core::sale::{ItemStatus, SaleStatus as CoreSaleStatus};

    fn make_item(status: SaleItemStatus, subtotal: Decimal) -> sale_items::Model {
        sale_items::Model {
            id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: dec!(1),
            unit_price: subtotal,
            subtotal,
            status,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_line_states_projection() {
        let items = vec![
            make_item(SaleItemStatus::Active, dec!(10.00)),
            make_item(SaleItemStatus::Cancelled, dec!(3.00)),
        ];

        let states = line_states(&items);

        assert_eq!(states[0].status, ItemStatus::Active);
        assert_eq!(states[0].subtotal, dec!(10.00));
        assert_eq!(states[1].status, ItemStatus::Cancelled);
        assert_eq!(states[1].subtotal, dec!(3.00));
    }

    #[test]
    fn test_rederived_total_skips_cancelled_items() {
        let items = vec![
            make_item(SaleItemStatus::Active, dec!(10.00)),
            make_item(SaleItemStatus::Cancelled, dec!(3.00)),
        ];

        let states = line_states(&items);
        assert_eq!(active_total(&states), dec!(10.00));
        assert_eq!(derive_status(&states), CoreSaleStatus::Completed);
    }

    #[test]
    fn test_rederived_status_all_cancelled() {
        let items = vec![
            make_item(SaleItemStatus::Cancelled, dec!(10.00)),
            make_item(SaleItemStatus::Cancelled, dec!(3.00)),
        ];

        let states = line_states(&items);
        assert_eq!(active_total(&states), Decimal::ZERO);
        assert_eq!(derive_status(&states), CoreSaleStatus::Cancelled);
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = SaleError::InsufficientStock {
            name: "Inka Cola 500ml".to_string(),
            product_id: Uuid::new_v4(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product: Inka Cola 500ml"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            SaleError::from(StatusError::AlreadyCancelled),
            SaleError::AlreadyCancelled
        ));
        assert!(matches!(
            SaleError::from(StatusError::NotCancelled),
            SaleError::NotCancelled
        ));
    }

    #[test]
    fn test_empty_cart_maps_through() {
        let err = SaleError::from(CartError::EmptyCart);
        assert!(matches!(err, SaleError::InvalidCart(CartError::EmptyCart)));
        assert_eq!(err.to_string(), "Invalid cart: Cart must have at least one line");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn item_strategy() -> impl Strategy<Value = sale_items::Model> {
            (any::<bool>(), 1i64..1_000_000i64).prop_map(|(active, cents)| {
                let status = if active {
                    SaleItemStatus::Active
                } else {
                    SaleItemStatus::Cancelled
                };
                make_item(status, Decimal::new(cents, 2))
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// The projection feeding total recomputation preserves exactly
            /// the active subtotals.
            #[test]
            fn prop_projection_preserves_active_sum(
                items in prop::collection::vec(item_strategy(), 0..12),
            ) {
                let expected: Decimal = items
                    .iter()
                    .filter(|item| item.status == SaleItemStatus::Active)
                    .map(|item| item.subtotal)
                    .sum();

                let states = line_states(&items);
                prop_assert_eq!(active_total(&states), expected);
            }

            /// Status re-derivation matches the zero-active-items rule no
            /// matter how item states are arranged.
            #[test]
            fn prop_rederived_status_matches_active_count(
                items in prop::collection::vec(item_strategy(), 0..12),
            ) {
                let any_active = items.iter().any(|item| item.status == SaleItemStatus::Active);
                let derived: SaleStatus = derive_status(&line_states(&items)).into();

                if any_active {
                    prop_assert_eq!(derived, SaleStatus::Completed);
                } else {
                    prop_assert_eq!(derived, SaleStatus::Cancelled);
                }
            }
        }
    }
}
