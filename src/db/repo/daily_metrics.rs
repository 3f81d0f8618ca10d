//! Daily campaign metric operations for the repository.

use crate::domain::{DailyCampaignMetric, MerchantId, MetricKey, PlatformId, UserId};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

const DATE_FMT: &str = "%Y-%m-%d";

const UPSERT_SQL: &str = r#"
    INSERT INTO daily_campaign_metrics (
        user_id, platform_id, merchant_id, campaign_name, date, country,
        clicks, cost, cpc, max_cpc, budget, budget_lost_share, rank_lost_share,
        orders, commission, order_days,
        conservative_commission, conservative_epc, conservative_roi,
        decision, anomaly_tag, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(user_id, platform_id, merchant_id, campaign_name, date) DO UPDATE SET
        country = excluded.country,
        clicks = excluded.clicks,
        cost = excluded.cost,
        cpc = excluded.cpc,
        max_cpc = excluded.max_cpc,
        budget = excluded.budget,
        budget_lost_share = excluded.budget_lost_share,
        rank_lost_share = excluded.rank_lost_share,
        orders = excluded.orders,
        commission = excluded.commission,
        order_days = excluded.order_days,
        conservative_commission = excluded.conservative_commission,
        conservative_epc = excluded.conservative_epc,
        conservative_roi = excluded.conservative_roi,
        decision = excluded.decision,
        anomaly_tag = excluded.anomaly_tag,
        updated_at = excluded.updated_at
"#;

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, platform_id, merchant_id, campaign_name, date, country,
           clicks, cost, cpc, max_cpc, budget, budget_lost_share, rank_lost_share,
           orders, commission, order_days,
           conservative_commission, conservative_epc, conservative_roi,
           decision, anomaly_tag
    FROM daily_campaign_metrics
"#;

fn upsert_query(
    m: &DailyCampaignMetric,
    now_ms: i64,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(UPSERT_SQL)
        .bind(m.key.user_id.as_str())
        .bind(m.key.platform_id.as_str())
        .bind(m.key.merchant_id.as_str())
        .bind(m.key.campaign_name.as_str())
        .bind(m.key.date.format(DATE_FMT).to_string())
        .bind(m.country.as_deref())
        .bind(m.clicks)
        .bind(m.cost)
        .bind(m.cpc)
        .bind(m.max_cpc)
        .bind(m.budget)
        .bind(m.budget_lost_share)
        .bind(m.rank_lost_share)
        .bind(m.orders)
        .bind(m.commission)
        .bind(i64::from(m.order_days))
        .bind(m.conservative_commission)
        .bind(m.conservative_epc)
        .bind(m.conservative_roi)
        .bind(m.decision.as_str())
        .bind(m.anomaly_tag.as_str())
        .bind(now_ms)
        .bind(now_ms)
}

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn row_to_metric(row: &SqliteRow) -> Result<DailyCampaignMetric, sqlx::Error> {
    let merchant: String = row.try_get("merchant_id")?;
    let merchant_id = MerchantId::parse(&merchant)
        .ok_or_else(|| decode_err(format!("invalid merchant_id in row: {:?}", merchant)))?;
    let date: String = row.try_get("date")?;
    let date = NaiveDate::parse_from_str(&date, DATE_FMT)
        .map_err(|e| decode_err(format!("invalid date {:?}: {}", date, e)))?;
    let order_days: i64 = row.try_get("order_days")?;

    Ok(DailyCampaignMetric {
        key: MetricKey {
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            platform_id: PlatformId::new(row.try_get::<String, _>("platform_id")?),
            merchant_id,
            campaign_name: row.try_get("campaign_name")?,
            date,
        },
        country: row.try_get("country")?,
        clicks: row.try_get("clicks")?,
        cost: row.try_get("cost")?,
        cpc: row.try_get("cpc")?,
        max_cpc: row.try_get("max_cpc")?,
        budget: row.try_get("budget")?,
        budget_lost_share: row.try_get("budget_lost_share")?,
        rank_lost_share: row.try_get("rank_lost_share")?,
        orders: row.try_get("orders")?,
        commission: row.try_get("commission")?,
        order_days: u32::try_from(order_days).unwrap_or(0),
        conservative_commission: row.try_get("conservative_commission")?,
        conservative_epc: row.try_get("conservative_epc")?,
        conservative_roi: row.try_get("conservative_roi")?,
        decision: row.try_get("decision")?,
        anomaly_tag: row.try_get("anomaly_tag")?,
    })
}

impl Repository {
    /// Insert or overwrite one daily row on its key.
    ///
    /// # Errors
    /// Returns an error if the statement fails.
    pub async fn upsert_daily_metric(&self, metric: &DailyCampaignMetric) -> Result<(), sqlx::Error> {
        upsert_query(metric, chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Upsert many rows in a single transaction. Returns the number of rows
    /// written.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is written then.
    pub async fn upsert_daily_metrics(
        &self,
        metrics: &[DailyCampaignMetric],
    ) -> Result<usize, sqlx::Error> {
        if metrics.is_empty() {
            return Ok(0);
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for metric in metrics {
            upsert_query(metric, now_ms).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(metrics.len())
    }

    /// All rows for one (user, platform, day), ordered by merchant then
    /// campaign.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get_daily_metrics(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<DailyCampaignMetric>, sqlx::Error> {
        self.query_daily_metrics(user, Some(platform), Some(date), Some(date))
            .await
    }

    /// Rows for a user with optional platform and inclusive date window.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn query_daily_metrics(
        &self,
        user: &UserId,
        platform: Option<&PlatformId>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCampaignMetric>, sqlx::Error> {
        let mut sql = format!("{} WHERE user_id = ?", SELECT_COLUMNS);
        if platform.is_some() {
            sql.push_str(" AND platform_id = ?");
        }
        if from.is_some() {
            sql.push_str(" AND date >= ?");
        }
        if to.is_some() {
            sql.push_str(" AND date <= ?");
        }
        sql.push_str(" ORDER BY date ASC, platform_id ASC, merchant_id ASC, campaign_name ASC");

        let mut query = sqlx::query(&sql).bind(user.as_str());
        if let Some(p) = platform {
            query = query.bind(p.as_str());
        }
        if let Some(d) = from {
            query = query.bind(d.format(DATE_FMT).to_string());
        }
        if let Some(d) = to {
            query = query.bind(d.format(DATE_FMT).to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_metric).collect()
    }
}
