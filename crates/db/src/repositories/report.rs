//! Read-only reporting aggregates.
//!
//! Reports fetch the scoped rows and fold them in Rust with `Decimal`
//! arithmetic; no SQL-side aggregation beyond filtering.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    expense_categories, expenses, recurring_expenses, sea_orm_active_enums, suppliers,
};

/// Reporting window for the summary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 90 days.
    Quarter,
    /// Last 365 days.
    Year,
}

impl ReportPeriod {
    /// Parses a period from its query-string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Number of days the window spans.
    #[must_use]
    pub const fn days(self) -> u64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }
}

/// Spend aggregated over one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    /// Category id; `None` groups uncategorized expenses.
    pub category_id: Option<Uuid>,
    /// Category name, or "Uncategorized".
    pub name: String,
    /// Display color, when the category defines one.
    pub color: Option<String>,
    /// Sum of `total_amount`.
    pub total: Decimal,
    /// Number of expenses.
    pub count: u64,
}

/// Spend aggregated over one status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    /// Status value.
    pub status: String,
    /// Sum of `total_amount`.
    pub total: Decimal,
    /// Number of expenses.
    pub count: u64,
}

/// Spend aggregated over one supplier.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierBreakdown {
    /// Supplier id.
    pub supplier_id: Uuid,
    /// Supplier name.
    pub name: String,
    /// Sum of `total_amount`.
    pub total: Decimal,
    /// Number of expenses.
    pub count: u64,
}

/// One month's point on the trend line.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrendPoint {
    /// Month in `YYYY-MM` form.
    pub month: String,
    /// Sum of `total_amount`.
    pub total: Decimal,
    /// Number of expenses.
    pub count: u64,
}

/// Recurring template slice shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingRecurring {
    /// Template id.
    pub id: Uuid,
    /// Template title.
    pub title: String,
    /// Net amount per occurrence.
    pub amount: Decimal,
    /// Next due date.
    pub next_due_date: NaiveDate,
}

/// The dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Sum of `total_amount` over the current calendar month.
    pub month_total: Decimal,
    /// Number of expenses in the current calendar month.
    pub month_count: u64,
    /// Number of expenses awaiting approval.
    pub pending_count: u64,
    /// Current-month spend by category.
    pub by_category: Vec<CategoryBreakdown>,
    /// Active templates due within 30 days, at most 5.
    pub upcoming_recurring: Vec<UpcomingRecurring>,
    /// The 5 most recent expenses.
    pub recent_expenses: Vec<expenses::Model>,
}

/// The period summary payload.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Inclusive start of the window.
    pub date_from: NaiveDate,
    /// Inclusive end of the window.
    pub date_to: NaiveDate,
    /// Sum of `total_amount` over the window.
    pub total: Decimal,
    /// Sum of `tax_amount` over the window.
    pub tax_total: Decimal,
    /// Number of expenses in the window.
    pub count: u64,
    /// Spend by status.
    pub by_status: Vec<StatusBreakdown>,
    /// Spend by category.
    pub by_category: Vec<CategoryBreakdown>,
    /// Top 10 suppliers by spend.
    pub by_supplier: Vec<SupplierBreakdown>,
    /// Month-by-month totals across the window.
    pub monthly_trend: Vec<MonthlyTrendPoint>,
}

/// Read-only report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the dashboard for a hub.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn dashboard(&self, hub_id: Uuid) -> Result<Dashboard, DbErr> {
        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);

        let month_rows = self.expenses_between(hub_id, month_start, today).await?;
        let month_total = month_rows.iter().map(|e| e.total_amount).sum();
        let month_count = month_rows.len() as u64;

        let pending_count = expenses::Entity::find()
            .filter(expenses::Column::HubId.eq(hub_id))
            .filter(expenses::Column::IsDeleted.eq(false))
            .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Pending))
            .count(&self.db)
            .await?;

        let by_category = self.fold_by_category(hub_id, &month_rows).await?;

        let horizon = today + Days::new(30);
        let upcoming_recurring = recurring_expenses::Entity::find()
            .filter(recurring_expenses::Column::HubId.eq(hub_id))
            .filter(recurring_expenses::Column::IsDeleted.eq(false))
            .filter(recurring_expenses::Column::IsActive.eq(true))
            .filter(recurring_expenses::Column::NextDueDate.lte(horizon))
            .order_by_asc(recurring_expenses::Column::NextDueDate)
            .limit(5)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| UpcomingRecurring {
                id: t.id,
                title: t.title,
                amount: t.amount,
                next_due_date: t.next_due_date,
            })
            .collect();

        let recent_expenses = expenses::Entity::find()
            .filter(expenses::Column::HubId.eq(hub_id))
            .filter(expenses::Column::IsDeleted.eq(false))
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(5)
            .all(&self.db)
            .await?;

        Ok(Dashboard {
            month_total,
            month_count,
            pending_count,
            by_category,
            upcoming_recurring,
            recent_expenses,
        })
    }

    /// Builds the summary over a trailing window ending today.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn summary(&self, hub_id: Uuid, period: ReportPeriod) -> Result<Summary, DbErr> {
        let date_to = Utc::now().date_naive();
        let date_from = date_to - Days::new(period.days());

        let rows = self.expenses_between(hub_id, date_from, date_to).await?;

        let total = rows.iter().map(|e| e.total_amount).sum();
        let tax_total = rows.iter().map(|e| e.tax_amount).sum();
        let count = rows.len() as u64;

        let mut by_status: HashMap<&'static str, (Decimal, u64)> = HashMap::new();
        for e in &rows {
            let key = status_label(&e.status);
            let entry = by_status.entry(key).or_default();
            entry.0 += e.total_amount;
            entry.1 += 1;
        }
        let mut by_status: Vec<StatusBreakdown> = by_status
            .into_iter()
            .map(|(status, (total, count))| StatusBreakdown {
                status: status.to_string(),
                total,
                count,
            })
            .collect();
        by_status.sort_by(|a, b| b.total.cmp(&a.total));

        let by_category = self.fold_by_category(hub_id, &rows).await?;

        let mut supplier_totals: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
        for e in &rows {
            if let Some(supplier_id) = e.supplier_id {
                let entry = supplier_totals.entry(supplier_id).or_default();
                entry.0 += e.total_amount;
                entry.1 += 1;
            }
        }
        let supplier_names: HashMap<Uuid, String> = if supplier_totals.is_empty() {
            HashMap::new()
        } else {
            suppliers::Entity::find()
                .filter(suppliers::Column::HubId.eq(hub_id))
                .filter(suppliers::Column::Id.is_in(supplier_totals.keys().copied()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect()
        };
        let mut by_supplier: Vec<SupplierBreakdown> = supplier_totals
            .into_iter()
            .map(|(supplier_id, (total, count))| SupplierBreakdown {
                supplier_id,
                name: supplier_names
                    .get(&supplier_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                total,
                count,
            })
            .collect();
        by_supplier.sort_by(|a, b| b.total.cmp(&a.total));
        by_supplier.truncate(10);

        let mut trend: HashMap<String, (Decimal, u64)> = HashMap::new();
        for e in &rows {
            let month = format!("{:04}-{:02}", e.expense_date.year(), e.expense_date.month());
            let entry = trend.entry(month).or_default();
            entry.0 += e.total_amount;
            entry.1 += 1;
        }
        let mut monthly_trend: Vec<MonthlyTrendPoint> = trend
            .into_iter()
            .map(|(month, (total, count))| MonthlyTrendPoint {
                month,
                total,
                count,
            })
            .collect();
        monthly_trend.sort_by(|a, b| a.month.cmp(&b.month));

        Ok(Summary {
            date_from,
            date_to,
            total,
            tax_total,
            count,
            by_status,
            by_category,
            by_supplier,
            monthly_trend,
        })
    }

    async fn expenses_between(
        &self,
        hub_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::HubId.eq(hub_id))
            .filter(expenses::Column::IsDeleted.eq(false))
            .filter(expenses::Column::ExpenseDate.gte(from))
            .filter(expenses::Column::ExpenseDate.lte(to))
            .all(&self.db)
            .await
    }

    /// Folds a fetched expense slice into per-category totals, sorted
    /// by spend descending.
    async fn fold_by_category(
        &self,
        hub_id: Uuid,
        rows: &[expenses::Model],
    ) -> Result<Vec<CategoryBreakdown>, DbErr> {
        let mut totals: HashMap<Option<Uuid>, (Decimal, u64)> = HashMap::new();
        for e in rows {
            let entry = totals.entry(e.category_id).or_default();
            entry.0 += e.total_amount;
            entry.1 += 1;
        }

        let ids: Vec<Uuid> = totals.keys().copied().flatten().collect();
        let categories: HashMap<Uuid, expense_categories::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            expense_categories::Entity::find()
                .filter(expense_categories::Column::HubId.eq(hub_id))
                .filter(expense_categories::Column::Id.is_in(ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let mut breakdown: Vec<CategoryBreakdown> = totals
            .into_iter()
            .map(|(category_id, (total, count))| {
                let category = category_id.and_then(|id| categories.get(&id));
                CategoryBreakdown {
                    category_id,
                    name: category
                        .map_or_else(|| "Uncategorized".to_string(), |c| c.name.clone()),
                    color: category.map(|c| c.color.clone()),
                    total,
                    count,
                }
            })
            .collect();
        breakdown.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(breakdown)
    }
}

fn status_label(status: &sea_orm_active_enums::ExpenseStatus) -> &'static str {
    match status {
        sea_orm_active_enums::ExpenseStatus::Draft => "draft",
        sea_orm_active_enums::ExpenseStatus::Pending => "pending",
        sea_orm_active_enums::ExpenseStatus::Approved => "approved",
        sea_orm_active_enums::ExpenseStatus::Paid => "paid",
        sea_orm_active_enums::ExpenseStatus::Rejected => "rejected",
    }
}
