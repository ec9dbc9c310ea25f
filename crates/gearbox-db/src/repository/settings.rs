//! # Settings Repository
//!
//! The store settings live in a single row (`id = 1`). It is created with
//! the column defaults on first read, so a fresh database never needs a
//! seeding step before checkout can ask for the tax rate.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use gearbox_core::validation::{validate_low_stock_threshold, validate_tax_rate_bps};
use gearbox_core::{Settings, SettingsUpdate};

const SETTINGS_COLUMNS: &str = r#"
    currency, language, timezone, date_format,
    email_notifications, push_notifications, sales_alerts, low_stock_alerts,
    tax_rate_bps,
    company_name, company_address, company_phone, company_email,
    low_stock_threshold, last_updated_by, updated_at
"#;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the settings, creating the default row if needed.
    pub async fn get(&self) -> DbResult<Settings> {
        if let Some(settings) = self.fetch().await? {
            return Ok(settings);
        }

        info!("Creating default settings");
        sqlx::query("INSERT OR IGNORE INTO settings (id, updated_at) VALUES (1, ?1)")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        match self.fetch().await? {
            Some(settings) => Ok(settings),
            None => Err(crate::DbError::Internal(
                "settings row missing after insert".to_string(),
            )),
        }
    }

    async fn fetch(&self) -> DbResult<Option<Settings>> {
        let settings = sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Applies a partial update and records who made it.
    pub async fn update(&self, update: SettingsUpdate, staff_id: &str) -> DbResult<Settings> {
        if let Some(bps) = update.tax_rate_bps {
            validate_tax_rate_bps(bps)?;
        }
        if let Some(threshold) = update.low_stock_threshold {
            validate_low_stock_threshold(threshold)?;
        }

        let mut settings = self.get().await?;
        update.apply_to(&mut settings);
        settings.last_updated_by = Some(staff_id.to_string());
        settings.updated_at = Utc::now();

        debug!(staff_id = %staff_id, "Updating settings");

        sqlx::query(
            r#"
            UPDATE settings SET
                currency = ?1,
                language = ?2,
                timezone = ?3,
                date_format = ?4,
                email_notifications = ?5,
                push_notifications = ?6,
                sales_alerts = ?7,
                low_stock_alerts = ?8,
                tax_rate_bps = ?9,
                company_name = ?10,
                company_address = ?11,
                company_phone = ?12,
                company_email = ?13,
                low_stock_threshold = ?14,
                last_updated_by = ?15,
                updated_at = ?16
            WHERE id = 1
            "#,
        )
        .bind(settings.currency)
        .bind(settings.language)
        .bind(settings.timezone)
        .bind(settings.date_format)
        .bind(settings.email_notifications)
        .bind(settings.push_notifications)
        .bind(settings.sales_alerts)
        .bind(settings.low_stock_alerts)
        .bind(settings.tax_rate_bps)
        .bind(&settings.company_name)
        .bind(&settings.company_address)
        .bind(&settings.company_phone)
        .bind(&settings.company_email)
        .bind(settings.low_stock_threshold)
        .bind(&settings.last_updated_by)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Replaces the row with column defaults, recording who reset it.
    pub async fn reset(&self, staff_id: &str) -> DbResult<Settings> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM settings WHERE id = 1")
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO settings (id, last_updated_by, updated_at) VALUES (1, ?1, ?2)")
            .bind(staff_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(staff_id = %staff_id, "Settings reset to defaults");

        self.get().await
    }
}
