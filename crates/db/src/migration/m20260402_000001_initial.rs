//! Initial database migration.
//!
//! Creates the enums, tables, indexes, and triggers for the catalog, sale
//! ledger, and audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USER DIRECTORY
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: CATALOG
        // ============================================================
        db.execute_unprepared(PRODUCTS_SQL).await?;

        // ============================================================
        // PART 4: SALE LEDGER
        // ============================================================
        db.execute_unprepared(SALES_SQL).await?;
        db.execute_unprepared(SALE_ITEMS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT LOG
        // ============================================================
        db.execute_unprepared(SALE_LOGS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- User roles
CREATE TYPE user_role AS ENUM (
    'admin',
    'cashier'
);

-- Product stock granularity
CREATE TYPE unit_kind AS ENUM (
    'unit',
    'weight'
);

-- Sale status: derived from item statuses, stored for cheap reads
CREATE TYPE sale_status AS ENUM (
    'completed',
    'cancelled'
);

-- Sale line-item status
CREATE TYPE sale_item_status AS ENUM (
    'active',
    'cancelled'
);

-- Audit log action tags
CREATE TYPE sale_action AS ENUM (
    'CANCEL_SALE',
    'CANCEL_ITEM',
    'RESTORE_SALE',
    'RESTORE_ITEM'
);
";

const USERS_SQL: &str = r"
-- User directory: the sale engine only reads identities from it
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(50) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'cashier',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PRODUCTS_SQL: &str = r"
-- Catalog store. stock >= 0 is the storage-level backstop; the engine
-- enforces availability with a conditional decrement before this fires.
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(150) NOT NULL,
    price NUMERIC(12, 2) NOT NULL DEFAULT 0,
    stock NUMERIC(12, 3) NOT NULL DEFAULT 0,
    unit unit_kind NOT NULL DEFAULT 'unit',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_products_stock_non_negative CHECK (stock >= 0),
    CONSTRAINT chk_products_price_non_negative CHECK (price >= 0)
);

CREATE INDEX idx_products_name ON products(name);
";

const SALES_SQL: &str = r"
-- Sale headers. total always equals the sum of active item subtotals.
CREATE TABLE sales (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id),
    total NUMERIC(12, 2) NOT NULL DEFAULT 0,
    payment_method VARCHAR(32) NOT NULL,
    status sale_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Sale history listing (newest first)
CREATE INDEX idx_sales_created ON sales(created_at DESC);

-- Reporting filters by status
CREATE INDEX idx_sales_status ON sales(status);
";

const SALE_ITEMS_SQL: &str = r"
-- Sale line items. unit_price and subtotal are snapshots taken at sale
-- creation; status is the only column that mutates afterwards.
CREATE TABLE sale_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    quantity NUMERIC(12, 3) NOT NULL,
    unit_price NUMERIC(12, 2) NOT NULL,
    subtotal NUMERIC(12, 2) NOT NULL,
    status sale_item_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sale_items_quantity_positive CHECK (quantity > 0)
);

CREATE INDEX idx_sale_items_sale ON sale_items(sale_id);
CREATE INDEX idx_sale_items_product ON sale_items(product_id);
";

const SALE_LOGS_SQL: &str = r"
-- Append-only audit log: one row per state-changing sale operation.
CREATE TABLE sale_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id),
    sale_item_id UUID REFERENCES sale_items(id),
    user_id UUID NOT NULL REFERENCES users(id),
    action sale_action NOT NULL,
    quantity NUMERIC(12, 3),
    reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sale_logs_sale ON sale_logs(sale_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- Keep updated_at current on row updates
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_products_updated_at
    BEFORE UPDATE ON products
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_sales_updated_at
    BEFORE UPDATE ON sales
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS sale_logs CASCADE;
DROP TABLE IF EXISTS sale_items CASCADE;
DROP TABLE IF EXISTS sales CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;

DROP TYPE IF EXISTS sale_action;
DROP TYPE IF EXISTS sale_item_status;
DROP TYPE IF EXISTS sale_status;
DROP TYPE IF EXISTS unit_kind;
DROP TYPE IF EXISTS user_role;
";
