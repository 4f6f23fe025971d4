//! Destination store: idempotent upserts into the two series tables.
//!
//! Each harvested record lands in two tables keyed by publication date.
//! Re-running a day overwrites that day's values, so the pipeline can be
//! retried at will without duplicating rows.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info};

use crate::error::PersistenceError;
use crate::models::bulletin::BulletinRecord;
use crate::models::config::StoreConfig;

const RESERVES_TABLE: &str = "public.reservas_scrape";
const FLOW_TABLE: &str = "public.\"comprasMULCBCRA\"";

const RESERVES_UPSERT: &str = "INSERT INTO public.reservas_scrape (date, valor) \
     VALUES ($1, $2) \
     ON CONFLICT (date) DO UPDATE SET valor = EXCLUDED.valor";

const FLOW_UPSERT: &str = "INSERT INTO public.\"comprasMULCBCRA\" (date, \"comprasBCRA\") \
     VALUES ($1, $2) \
     ON CONFLICT (date) DO UPDATE SET \"comprasBCRA\" = EXCLUDED.\"comprasBCRA\"";

/// Writes harvested records to the Postgres destination.
pub struct PersistenceGateway {
    pool: PgPool,
}

impl PersistenceGateway {
    /// Connect to the destination database.
    pub async fn connect(config: &StoreConfig) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&config.url())
            .await?;
        Ok(Self { pool })
    }

    /// Upsert the record into both destination tables.
    ///
    /// The writes are independent: a failure on one table does not skip
    /// the other, and the first error is reported after both were
    /// attempted.
    pub async fn upsert(&self, record: &BulletinRecord) -> Result<(), PersistenceError> {
        validate(record)?;

        let reserves = sqlx::query(RESERVES_UPSERT)
            .bind(record.date)
            .bind(record.reserves_millions_usd)
            .execute(&self.pool)
            .await;

        let flow = sqlx::query(FLOW_UPSERT)
            .bind(record.date)
            .bind(record.net_flow_millions_usd)
            .execute(&self.pool)
            .await;

        let mut first_error = None;
        match reserves {
            Ok(_) => info!(
                table = RESERVES_TABLE,
                date = %record.date,
                value = record.reserves_millions_usd,
                "upserted reserves"
            ),
            Err(e) => {
                error!(table = RESERVES_TABLE, error = %e, "write failed");
                first_error = Some(PersistenceError::Write {
                    table: RESERVES_TABLE.to_string(),
                    source: e,
                });
            }
        }
        match flow {
            Ok(_) => info!(
                table = FLOW_TABLE,
                date = %record.date,
                value = record.net_flow_millions_usd,
                "upserted net flow"
            ),
            Err(e) => {
                error!(table = FLOW_TABLE, error = %e, "write failed");
                if first_error.is_none() {
                    first_error = Some(PersistenceError::Write {
                        table: FLOW_TABLE.to_string(),
                        source: e,
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Reject records no bulletin could plausibly produce.
fn validate(record: &BulletinRecord) -> Result<(), PersistenceError> {
    if !record.reserves_millions_usd.is_finite() {
        return Err(PersistenceError::Validation {
            field: "reserves_millions_usd".to_string(),
            reason: "value is not finite".to_string(),
        });
    }
    if record.reserves_millions_usd < 0.0 {
        return Err(PersistenceError::Validation {
            field: "reserves_millions_usd".to_string(),
            reason: "reserves cannot be negative".to_string(),
        });
    }
    if !record.net_flow_millions_usd.is_finite() {
        return Err(PersistenceError::Validation {
            field: "net_flow_millions_usd".to_string(),
            reason: "value is not finite".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(reserves: f64, flow: f64) -> BulletinRecord {
        BulletinRecord::new(
            NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
            reserves,
            flow,
        )
    }

    #[test]
    fn test_validate_accepts_plausible_record() {
        assert!(validate(&record(44_808.0, 231.0)).is_ok());
        assert!(validate(&record(44_808.0, -148.0)).is_ok());
        assert!(validate(&record(44_808.0, 0.0)).is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_reserves() {
        let err = validate(&record(-44_808.0, 231.0)).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Validation { ref field, .. } if field == "reserves_millions_usd"
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(validate(&record(f64::NAN, 0.0)).is_err());
        assert!(validate(&record(44_808.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_upserts_are_idempotent_statements() {
        assert_eq!(
            RESERVES_UPSERT.matches("ON CONFLICT (date) DO UPDATE").count(),
            1
        );
        assert_eq!(
            FLOW_UPSERT.matches("ON CONFLICT (date) DO UPDATE").count(),
            1
        );
    }
}
