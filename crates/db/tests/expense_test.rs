//! Integration tests for the expense repositories.
//!
//! These tests need a Postgres instance; they skip when neither
//! `DATABASE_URL` nor `OUTLAY__DATABASE__URL` is set. Each test works
//! in a fresh random hub, so a shared database is fine.

#![allow(clippy::uninlined_format_args)]

use std::env;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use outlay_core::expense::{ExpenseError, ExpenseStatus};
use outlay_core::recurring::Frequency;
use outlay_db::migration::{Migrator, MigratorTrait};
use outlay_db::repositories::{
    CreateExpenseInput, CreateRecurringInput, CreateSupplierInput, ExpenseFilter,
    ExpenseRepository, RecurringRepository, SettingsRepository, SupplierRepository,
    UpdateSettingsInput,
};
use outlay_shared::types::PageRequest;

// Tests run in parallel within one binary; migrate exactly once.
static MIGRATED: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

async fn try_connect() -> Option<DatabaseConnection> {
    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("OUTLAY__DATABASE__URL"))
        .ok()?;
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("Failed to migrate");
        })
        .await;
    Some(db)
}

macro_rules! require_db {
    () => {
        match try_connect().await {
            Some(db) => db,
            None => {
                eprintln!("skipping: DATABASE_URL not set");
                return;
            }
        }
    };
}

fn expense_input(hub_id: Uuid, title: &str) -> CreateExpenseInput {
    CreateExpenseInput {
        hub_id,
        title: title.to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        amount: dec!(100.00),
        tax_rate: Some(dec!(10.00)),
        expense_date: Utc::now().date_naive(),
        due_date: None,
        status: None,
        payment_method: None,
        reference_number: None,
        receipt_ref: None,
        notes: None,
    }
}

// ============================================================================
// Test: Settings get-or-create
// ============================================================================
#[tokio::test]
async fn test_settings_get_or_create_defaults() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let repo = SettingsRepository::new(db);

    let settings = repo.get_or_create(hub_id).await.unwrap();
    assert!(!settings.require_approval);
    assert_eq!(settings.approval_threshold, dec!(0.00));
    assert_eq!(settings.default_tax_rate, dec!(21.00));
    assert_eq!(settings.default_currency, "EUR");
    assert!(settings.auto_numbering);
    assert_eq!(settings.number_prefix, "EXP");

    // Second call returns the same row, not a duplicate.
    let again = repo.get_or_create(hub_id).await.unwrap();
    assert_eq!(again.id, settings.id);
}

// ============================================================================
// Test: End-to-end create with derived amounts and numbering
// ============================================================================
#[tokio::test]
async fn test_create_expense_derives_amounts_and_number() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db);

    let expense = repo
        .create(expense_input(hub_id, "Office chairs"), &settings)
        .await
        .unwrap();

    assert_eq!(expense.tax_amount, dec!(10.00));
    assert_eq!(expense.total_amount, dec!(110.00));
    assert_eq!(
        expense.status,
        outlay_db::entities::sea_orm_active_enums::ExpenseStatus::Draft
    );
    let today = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert!(
        expense.expense_number.starts_with(&format!("EXP-{today}-")),
        "unexpected number {}",
        expense.expense_number
    );
}

// ============================================================================
// Test: Sequential numbers increase by one
// ============================================================================
#[tokio::test]
async fn test_sequential_numbers_increase() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db);

    let first = repo
        .create(expense_input(hub_id, "First"), &settings)
        .await
        .unwrap();
    let second = repo
        .create(expense_input(hub_id, "Second"), &settings)
        .await
        .unwrap();

    let seq = |n: &str| -> i64 { n.rsplit('-').next().unwrap().parse().unwrap() };
    assert_eq!(seq(&second.expense_number), seq(&first.expense_number) + 1);
}

// ============================================================================
// Test: Concurrent creation never collides (counter property)
// ============================================================================
#[tokio::test]
async fn test_concurrent_creation_unique_numbers() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let repo = ExpenseRepository::new(db.clone());
            let settings = settings.clone();
            tokio::spawn(async move {
                repo.create(expense_input(hub_id, &format!("Concurrent {i}")), &settings)
                    .await
                    .unwrap()
                    .expense_number
            })
        })
        .collect();

    let mut numbers: Vec<String> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 20, "expense numbers collided: {numbers:?}");
}

// ============================================================================
// Test: Soft-delete scoping
// ============================================================================
#[tokio::test]
async fn test_soft_delete_scoping() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db);

    let expense = repo
        .create(expense_input(hub_id, "Disposable"), &settings)
        .await
        .unwrap();
    repo.soft_delete(hub_id, expense.id).await.unwrap();

    // Gone from the default scope, and from listings.
    assert!(matches!(
        repo.find_by_id(hub_id, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));
    let page = repo
        .list(hub_id, &ExpenseFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert!(page.data.iter().all(|e| e.id != expense.id));

    // Still reachable through the all-inclusive scope.
    let raw = repo
        .find_by_id_any_scope(hub_id, expense.id)
        .await
        .unwrap();
    assert!(raw.is_deleted);
    assert!(raw.deleted_at.is_some());
}

// ============================================================================
// Test: Lifecycle end-to-end with supplier aggregates
// ============================================================================
#[tokio::test]
async fn test_lifecycle_updates_supplier_totals() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let supplier = SupplierRepository::new(db.clone())
        .create(CreateSupplierInput {
            hub_id,
            name: "Acme Supplies".to_string(),
            contact_name: None,
            email: None,
            phone: None,
            tax_id: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            website: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(supplier.total_spent, dec!(0.00));

    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db.clone());

    let mut input = expense_input(hub_id, "Printer paper");
    input.tax_rate = Some(dec!(21.00));
    input.supplier_id = Some(supplier.id);
    let expense = repo.create(input, &settings).await.unwrap();
    assert_eq!(expense.total_amount, dec!(121.00));

    let pending = repo.submit(hub_id, expense.id).await.unwrap();
    assert_eq!(
        pending.status,
        outlay_db::entities::sea_orm_active_enums::ExpenseStatus::Pending
    );

    let approved = repo.approve(hub_id, expense.id, user_id).await.unwrap();
    assert_eq!(approved.approved_by, Some(user_id));
    assert!(approved.approved_at.is_some());

    let paid = repo.mark_paid(hub_id, expense.id, &settings).await.unwrap();
    assert!(paid.paid_at.is_some());

    let supplier = SupplierRepository::new(db)
        .find_by_id(hub_id, supplier.id)
        .await
        .unwrap();
    assert_eq!(supplier.total_spent, dec!(121.00));
    assert_eq!(supplier.last_purchase_date, Some(expense.expense_date));
}

// ============================================================================
// Test: Approval gate blocks unapproved expense over threshold
// ============================================================================
#[tokio::test]
async fn test_mark_paid_blocked_by_approval_gate() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();

    let settings_repo = SettingsRepository::new(db.clone());
    settings_repo.get_or_create(hub_id).await.unwrap();
    let settings = settings_repo
        .update(
            hub_id,
            UpdateSettingsInput {
                require_approval: Some(true),
                approval_threshold: Some(dec!(0.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let repo = ExpenseRepository::new(db);
    let expense = repo
        .create(expense_input(hub_id, "Gated"), &settings)
        .await
        .unwrap();

    assert!(matches!(
        repo.mark_paid(hub_id, expense.id, &settings).await,
        Err(ExpenseError::ApprovalRequired { .. })
    ));
}

// ============================================================================
// Test: Approve fails on closed statuses
// ============================================================================
#[tokio::test]
async fn test_approve_rejected_expense_fails() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db);

    let expense = repo
        .create(expense_input(hub_id, "Doomed"), &settings)
        .await
        .unwrap();
    repo.reject(hub_id, expense.id).await.unwrap();

    assert!(matches!(
        repo.approve(hub_id, expense.id, Uuid::new_v4()).await,
        Err(ExpenseError::InvalidTransition { .. })
    ));
}

// ============================================================================
// Test: Expense not found in foreign hub scope
// ============================================================================
#[tokio::test]
async fn test_expense_invisible_across_hubs() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = ExpenseRepository::new(db);

    let expense = repo
        .create(expense_input(hub_id, "Scoped"), &settings)
        .await
        .unwrap();

    let other_hub = Uuid::new_v4();
    assert!(matches!(
        repo.find_by_id(other_hub, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));
}

// ============================================================================
// Test: Recurring generation advances the schedule
// ============================================================================
#[tokio::test]
async fn test_recurring_generate_advances_schedule() {
    let db = require_db!();
    let hub_id = Uuid::new_v4();
    let settings = SettingsRepository::new(db.clone())
        .get_or_create(hub_id)
        .await
        .unwrap();
    let repo = RecurringRepository::new(db);

    let due = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let template = repo
        .create(
            CreateRecurringInput {
                hub_id,
                title: "Hosting".to_string(),
                category_id: None,
                supplier_id: None,
                amount: dec!(30.00),
                tax_rate: Some(dec!(21.00)),
                frequency: Frequency::Monthly,
                next_due_date: due,
                auto_create: false,
            },
            &settings,
        )
        .await
        .unwrap();

    let generated = repo.generate(hub_id, template.id, &settings).await.unwrap();

    assert_eq!(generated.expense.title, "Hosting");
    assert_eq!(generated.expense.expense_date, due);
    assert_eq!(generated.expense.total_amount, dec!(36.30));
    // Jan 31 + 1 month clamps to Feb 28 (2026 is not a leap year).
    assert_eq!(
        generated.template.next_due_date,
        NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
    );
    assert!(generated.template.last_generated_date.is_some());
}

// ============================================================================
// Test: Transitions on a missing expense
// ============================================================================
#[tokio::test]
async fn test_transitions_on_missing_expense() {
    let db = require_db!();
    let repo = ExpenseRepository::new(db);

    let hub_id = Uuid::new_v4();
    let missing = Uuid::new_v4();

    assert!(matches!(
        repo.submit(hub_id, missing).await,
        Err(ExpenseError::ExpenseNotFound(id)) if id == missing
    ));
    assert!(matches!(
        repo.reject(hub_id, missing).await,
        Err(ExpenseError::ExpenseNotFound(id)) if id == missing
    ));
}

// ============================================================================
// Test: Draft status parsing helper used by lifecycle
// ============================================================================
#[test]
fn test_status_vocabulary() {
    assert_eq!(ExpenseStatus::parse("draft"), Some(ExpenseStatus::Draft));
    assert_eq!(ExpenseStatus::parse("paid"), Some(ExpenseStatus::Paid));
    assert_eq!(ExpenseStatus::parse("bogus"), None);
}
