//! Initial database migration.
//!
//! Creates the expense module tables, enums, and indexes.

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
        // PART 2: REFERENCE TABLES
        // ============================================================
        db.execute_unprepared(EXPENSE_CATEGORIES_SQL).await?;
        db.execute_unprepared(SUPPLIERS_SQL).await?;

        // ============================================================
        // PART 3: EXPENSES & NUMBERING
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(EXPENSE_COUNTERS_SQL).await?;

        // ============================================================
        // PART 4: SETTINGS & RECURRING TEMPLATES
        // ============================================================
        db.execute_unprepared(EXPENSE_SETTINGS_SQL).await?;
        db.execute_unprepared(RECURRING_EXPENSES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE expense_status AS ENUM ('draft', 'pending', 'approved', 'paid', 'rejected');
CREATE TYPE recurrence_frequency AS ENUM ('weekly', 'monthly', 'quarterly', 'yearly');
";

const EXPENSE_CATEGORIES_SQL: &str = r"
-- Self-referential category hierarchy (acyclicity enforced at write time)
CREATE TABLE expense_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    icon VARCHAR(50) NOT NULL DEFAULT 'folder-outline',
    color VARCHAR(7) NOT NULL DEFAULT '#6366f1',
    description TEXT,
    parent_id UUID REFERENCES expense_categories(id) ON DELETE SET NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    sort_order INTEGER NOT NULL DEFAULT 0,
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Default listing order is (sort_order, name) within a hub
CREATE INDEX idx_expense_categories_hub ON expense_categories(hub_id, sort_order, name)
    WHERE is_deleted = FALSE;
CREATE INDEX idx_expense_categories_parent ON expense_categories(parent_id);
";

const SUPPLIERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    contact_name VARCHAR(255),
    email VARCHAR(255),
    phone VARCHAR(50),
    tax_id VARCHAR(50),
    address TEXT,
    city VARCHAR(100),
    postal_code VARCHAR(20),
    country VARCHAR(100) NOT NULL DEFAULT 'España',
    website VARCHAR(255),
    notes TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    -- Derived caches, written only by aggregate recomputation
    total_spent NUMERIC(12, 2) NOT NULL DEFAULT 0.00,
    last_purchase_date DATE,
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_suppliers_hub_name ON suppliers(hub_id, name) WHERE is_deleted = FALSE;
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    expense_number VARCHAR(50) NOT NULL,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    category_id UUID REFERENCES expense_categories(id) ON DELETE SET NULL,
    supplier_id UUID REFERENCES suppliers(id) ON DELETE SET NULL,
    amount NUMERIC(10, 2) NOT NULL,
    tax_rate NUMERIC(5, 2) NOT NULL DEFAULT 21.00,
    -- Derived, recomputed from amount/tax_rate on every save
    tax_amount NUMERIC(10, 2) NOT NULL DEFAULT 0.00,
    total_amount NUMERIC(10, 2) NOT NULL DEFAULT 0.00,
    expense_date DATE NOT NULL,
    due_date DATE,
    status expense_status NOT NULL DEFAULT 'draft',
    payment_method VARCHAR(50),
    reference_number VARCHAR(100),
    receipt_ref VARCHAR(255),
    notes TEXT,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    paid_at TIMESTAMPTZ,
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_non_negative CHECK (amount >= 0)
);

-- Backstop for the numbering invariant; the counter serialization
-- should make violations unreachable
CREATE UNIQUE INDEX uq_expenses_hub_number ON expenses(hub_id, expense_number);

CREATE INDEX idx_expenses_hub_status_date ON expenses(hub_id, status, expense_date DESC)
    WHERE is_deleted = FALSE;
CREATE INDEX idx_expenses_hub_category ON expenses(hub_id, category_id, expense_date DESC)
    WHERE is_deleted = FALSE;
CREATE INDEX idx_expenses_hub_supplier ON expenses(hub_id, supplier_id)
    WHERE is_deleted = FALSE;
";

const EXPENSE_COUNTERS_SQL: &str = r"
-- Serialization point for expense number assignment: one row per
-- (hub, period key), incremented atomically inside the insert
-- transaction
CREATE TABLE expense_counters (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    period_key VARCHAR(30) NOT NULL,
    last_number BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX uq_expense_counters_scope ON expense_counters(hub_id, period_key);
";

const EXPENSE_SETTINGS_SQL: &str = r"
-- Per-hub singleton, created lazily on first access
CREATE TABLE expense_settings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    require_approval BOOLEAN NOT NULL DEFAULT FALSE,
    approval_threshold NUMERIC(10, 2) NOT NULL DEFAULT 0.00,
    default_tax_rate NUMERIC(5, 2) NOT NULL DEFAULT 21.00,
    default_currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
    auto_numbering BOOLEAN NOT NULL DEFAULT TRUE,
    number_prefix VARCHAR(10) NOT NULL DEFAULT 'EXP',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX uq_expense_settings_hub ON expense_settings(hub_id);
";

const RECURRING_EXPENSES_SQL: &str = r"
CREATE TABLE recurring_expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    hub_id UUID NOT NULL,
    title VARCHAR(255) NOT NULL,
    category_id UUID REFERENCES expense_categories(id) ON DELETE SET NULL,
    supplier_id UUID REFERENCES suppliers(id) ON DELETE SET NULL,
    amount NUMERIC(10, 2) NOT NULL,
    tax_rate NUMERIC(5, 2) NOT NULL DEFAULT 21.00,
    frequency recurrence_frequency NOT NULL DEFAULT 'monthly',
    next_due_date DATE NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    auto_create BOOLEAN NOT NULL DEFAULT FALSE,
    last_generated_date DATE,
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_recurring_expenses_hub_due ON recurring_expenses(hub_id, next_due_date)
    WHERE is_deleted = FALSE;
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS recurring_expenses CASCADE;
DROP TABLE IF EXISTS expense_settings CASCADE;
DROP TABLE IF EXISTS expense_counters CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;
DROP TABLE IF EXISTS expense_categories CASCADE;
DROP TYPE IF EXISTS recurrence_frequency;
DROP TYPE IF EXISTS expense_status;
";
