//! Settings repository: the per-hub singleton.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::expense_settings;

use outlay_core::expense::ExpenseError;

/// Input for updating hub settings.
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    /// Whether paying an expense requires prior approval.
    pub require_approval: Option<bool>,
    /// Approval threshold (0 means all expenses require approval).
    pub approval_threshold: Option<Decimal>,
    /// Default tax rate applied when a create omits one.
    pub default_tax_rate: Option<Decimal>,
    /// Default currency code.
    pub default_currency: Option<String>,
    /// Whether the configured prefix is used for numbering.
    pub auto_numbering: Option<bool>,
    /// Expense number prefix.
    pub number_prefix: Option<String>,
}

/// Repository for the per-hub expense settings singleton.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the hub's settings, creating the defaults row on first
    /// access.
    ///
    /// Two concurrent first accesses may both attempt the insert; the
    /// unique index on `hub_id` lets exactly one win and the loser
    /// refetches the winner's row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_or_create(&self, hub_id: Uuid) -> Result<expense_settings::Model, ExpenseError> {
        if let Some(existing) = self.find(hub_id).await? {
            return Ok(existing);
        }

        let defaults = expense_settings::ActiveModel {
            id: Set(Uuid::new_v4()),
            hub_id: Set(hub_id),
            require_approval: Set(false),
            approval_threshold: Set(Decimal::ZERO),
            default_tax_rate: Set(Decimal::new(2100, 2)),
            default_currency: Set("EUR".to_string()),
            auto_numbering: Set(true),
            number_prefix: Set("EXP".to_string()),
            ..Default::default()
        };

        match defaults.insert(&self.db).await {
            Ok(created) => {
                info!(%hub_id, "Created default expense settings");
                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find(hub_id)
                .await?
                .ok_or_else(|| ExpenseError::Database("settings row vanished".to_string())),
            Err(e) => Err(ExpenseError::Database(e.to_string())),
        }
    }

    /// Updates the hub's settings, creating the row first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update(
        &self,
        hub_id: Uuid,
        input: UpdateSettingsInput,
    ) -> Result<expense_settings::Model, ExpenseError> {
        let current = self.get_or_create(hub_id).await?;

        let mut active: expense_settings::ActiveModel = current.into();
        if let Some(require_approval) = input.require_approval {
            active.require_approval = Set(require_approval);
        }
        if let Some(threshold) = input.approval_threshold {
            active.approval_threshold = Set(threshold);
        }
        if let Some(rate) = input.default_tax_rate {
            active.default_tax_rate = Set(rate);
        }
        if let Some(currency) = input.default_currency {
            active.default_currency = Set(currency);
        }
        if let Some(auto_numbering) = input.auto_numbering {
            active.auto_numbering = Set(auto_numbering);
        }
        if let Some(prefix) = input.number_prefix {
            active.number_prefix = Set(prefix);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))
    }

    async fn find(&self, hub_id: Uuid) -> Result<Option<expense_settings::Model>, ExpenseError> {
        expense_settings::Entity::find()
            .filter(expense_settings::Column::HubId.eq(hub_id))
            .one(&self.db)
            .await
            .map_err(|e: DbErr| ExpenseError::Database(e.to_string()))
    }
}
