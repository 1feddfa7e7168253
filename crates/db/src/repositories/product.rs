//! Product repository: the catalog-store operations the sale engine needs.
//!
//! All functions are generic over `ConnectionTrait` so they run against the
//! pool or inside a caller's open transaction. Stock mutation is a single
//! conditional statement: check-and-decrement must never be two separate
//! steps visible to other transactions.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::products;

/// Catalog stock operations.
///
/// Stateless: every function borrows the caller's connection, which is how
/// the sale engine keeps stock adjustments inside its own unit of work.
#[derive(Debug, Clone, Copy)]
pub struct ProductRepository;

impl ProductRepository {
    /// Finds a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
    ) -> Result<Option<products::Model>, DbErr> {
        products::Entity::find_by_id(product_id).one(conn).await
    }

    /// Atomically takes `quantity` from a product's stock.
    ///
    /// Issues `UPDATE products SET stock = stock - qty WHERE id = ? AND
    /// stock >= qty` and reports success via the affected-row count, so two
    /// operations racing for the last unit cannot both succeed.
    ///
    /// Returns `false` when the product is missing or its stock is short;
    /// the caller decides which of the two it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn try_take_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<bool, DbErr> {
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).sub(quantity),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Returns `quantity` to a product's stock.
    ///
    /// Used when a sale or item is cancelled. Unconditional: stock only
    /// grows here, so there is no availability check to race on.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn put_back_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), DbErr> {
        products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(quantity),
            )
            .filter(products::Column::Id.eq(product_id))
            .exec(conn)
            .await?;

        Ok(())
    }
}
