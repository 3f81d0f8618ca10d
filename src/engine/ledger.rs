//! Canonical transaction ledger across affiliate platforms.
//!
//! Each platform reports settlement status in its own vocabulary and may
//! repeat a transaction across pages or syncs. Everything here maps into
//! [`TxStatus`], keeps one row per transaction id and aggregates with exact
//! decimals.

use crate::domain::{AffiliateRow, Decimal, NormalizedTransaction, PlatformId, TxStatus};
use crate::normalize::{to_datetime, try_number};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Vocabulary shared by all platforms. Keys are lowercase.
const DEFAULT_STATUSES: &[(&str, TxStatus)] = &[
    ("approved", TxStatus::Approved),
    ("approve", TxStatus::Approved),
    ("confirmed", TxStatus::Approved),
    ("paid", TxStatus::Approved),
    ("settled", TxStatus::Approved),
    ("locked", TxStatus::Approved),
    ("已确认", TxStatus::Approved),
    ("已结算", TxStatus::Approved),
    ("pending", TxStatus::Pending),
    ("processing", TxStatus::Pending),
    ("unverified", TxStatus::Pending),
    ("new", TxStatus::Pending),
    ("待确认", TxStatus::Pending),
    ("rejected", TxStatus::Rejected),
    ("declined", TxStatus::Rejected),
    ("reversed", TxStatus::Rejected),
    ("cancelled", TxStatus::Rejected),
    ("canceled", TxStatus::Rejected),
    ("void", TxStatus::Rejected),
    ("invalid", TxStatus::Rejected),
    ("已拒绝", TxStatus::Rejected),
    ("已取消", TxStatus::Rejected),
];

const LINKHAITAO_STATUSES: &[(&str, TxStatus)] = &[
    ("effective", TxStatus::Approved),
    ("untreated", TxStatus::Pending),
    ("expired", TxStatus::Rejected),
];

const PARTNERMATIC_STATUSES: &[(&str, TxStatus)] = &[
    ("locked", TxStatus::Pending),
    ("adjusted", TxStatus::Approved),
];

/// Numeric status codes.
const REWARDOO_STATUSES: &[(&str, TxStatus)] = &[
    ("0", TxStatus::Pending),
    ("1", TxStatus::Approved),
    ("2", TxStatus::Rejected),
];

fn platform_statuses(platform: &PlatformId) -> &'static [(&'static str, TxStatus)] {
    match platform.as_str() {
        "linkhaitao" | "lh" => LINKHAITAO_STATUSES,
        "partnermatic" | "pm" => PARTNERMATIC_STATUSES,
        "rewardoo" | "rw" => REWARDOO_STATUSES,
        _ => &[],
    }
}

fn lookup(table: &[(&str, TxStatus)], key: &str) -> Option<TxStatus> {
    table.iter().find(|(k, _)| *k == key).map(|(_, s)| *s)
}

/// Map a platform status string. Platform-specific entries override the
/// shared vocabulary; anything unknown is treated as pending.
pub fn normalize_status(platform: &PlatformId, raw: &str) -> TxStatus {
    let key = raw.trim().to_lowercase();
    if let Some(status) =
        lookup(platform_statuses(platform), &key).or_else(|| lookup(DEFAULT_STATUSES, &key))
    {
        return status;
    }
    warn!(platform = %platform, status = %raw, "unmapped transaction status, treating as pending");
    TxStatus::Pending
}

const ID_FIELDS: &[&str] = &["transaction_id", "id", "order_id", "oid", "action_id"];
const STATUS_FIELDS: &[&str] = &["status", "state", "order_status"];
const COMMISSION_FIELDS: &[&str] = &["commission_amount", "commission", "sale_comm", "payout"];
const ORDER_AMOUNT_FIELDS: &[&str] = &["order_amount", "sale_amount", "amount", "order_value"];
const MERCHANT_FIELDS: &[&str] = &["merchant", "merchant_id", "mcid", "merchant_name", "advertiser_name"];
const TIME_FIELDS: &[&str] = &["transaction_time", "order_time", "created_at", "click_time", "date"];

fn field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn amount(v: Option<&Value>) -> Decimal {
    let Some(raw) = v.and_then(text) else {
        return Decimal::zero();
    };
    Decimal::from_str_canonical(&raw)
        .ok()
        .or_else(|| try_number(&raw).map(Decimal::from_f64_lossy))
        .unwrap_or_else(Decimal::zero)
}

/// Map loosely-keyed platform records into canonical transactions.
///
/// Non-object entries are skipped. A missing id is kept as an empty string
/// so [`dedupe`] can report it.
pub fn normalize_batch(platform: &PlatformId, raw: &[Value]) -> Vec<NormalizedTransaction> {
    raw.iter()
        .filter_map(Value::as_object)
        .map(|obj| NormalizedTransaction {
            transaction_id: field(obj, ID_FIELDS).and_then(text).unwrap_or_default(),
            status: field(obj, STATUS_FIELDS)
                .and_then(text)
                .map(|s| normalize_status(platform, &s))
                .unwrap_or(TxStatus::Pending),
            commission_amount: amount(field(obj, COMMISSION_FIELDS)),
            order_amount: amount(field(obj, ORDER_AMOUNT_FIELDS)),
            merchant: field(obj, MERCHANT_FIELDS).and_then(text),
            transaction_time: field(obj, TIME_FIELDS)
                .and_then(text)
                .and_then(|s| to_datetime(&s)),
        })
        .collect()
}

/// One row per transaction id, in first-seen order, holding the last-seen
/// values. Rows without an id are dropped.
pub fn dedupe(transactions: &[NormalizedTransaction]) -> Vec<NormalizedTransaction> {
    let mut out: Vec<NormalizedTransaction> = Vec::with_capacity(transactions.len());
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tx in transactions {
        let id = tx.transaction_id.trim();
        if id.is_empty() {
            warn!(merchant = ?tx.merchant, "dropping transaction without id");
            continue;
        }
        match index.get(id) {
            Some(&i) => out[i] = tx.clone(),
            None => {
                index.insert(id, out.len());
                out.push(tx.clone());
            }
        }
    }
    out
}

/// Order counts and commission totals for a set of transactions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMetrics {
    pub total_orders: u64,
    pub approved_orders: u64,
    pub pending_orders: u64,
    pub rejected_orders: u64,
    /// All statuses.
    pub total_commission: Decimal,
    pub approved_commission: Decimal,
    pub pending_commission: Decimal,
    pub rejected_commission: Decimal,
    /// Rejected orders as a percentage of all orders.
    pub rejected_rate: f64,
    /// `total_commission - rejected_commission`.
    pub net_commission: Decimal,
}

impl LedgerMetrics {
    fn add(&mut self, tx: &NormalizedTransaction) {
        self.total_orders += 1;
        self.total_commission += tx.commission_amount;
        match tx.status {
            TxStatus::Approved => {
                self.approved_orders += 1;
                self.approved_commission += tx.commission_amount;
            }
            TxStatus::Pending => {
                self.pending_orders += 1;
                self.pending_commission += tx.commission_amount;
            }
            TxStatus::Rejected => {
                self.rejected_orders += 1;
                self.rejected_commission += tx.commission_amount;
            }
        }
    }

    fn finish(mut self) -> Self {
        self.rejected_rate = if self.total_orders > 0 {
            self.rejected_orders as f64 / self.total_orders as f64 * 100.0
        } else {
            0.0
        };
        self.net_commission = self.total_commission - self.rejected_commission;
        self
    }
}

fn aggregate<'a>(txs: impl IntoIterator<Item = &'a NormalizedTransaction>) -> LedgerMetrics {
    let mut m = LedgerMetrics::default();
    for tx in txs {
        m.add(tx);
    }
    m.finish()
}

pub fn dedupe_and_aggregate(transactions: &[NormalizedTransaction]) -> LedgerMetrics {
    aggregate(&dedupe(transactions))
}

/// Ledger metrics per calendar day of `transaction_time`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedger {
    pub days: BTreeMap<NaiveDate, LedgerMetrics>,
    /// Transactions with no usable time.
    pub undated: LedgerMetrics,
}

pub fn aggregate_daily(transactions: &[NormalizedTransaction]) -> DailyLedger {
    let mut days: BTreeMap<NaiveDate, Vec<&NormalizedTransaction>> = BTreeMap::new();
    let mut undated = Vec::new();
    let deduped = dedupe(transactions);
    for tx in &deduped {
        match tx.transaction_time {
            Some(t) => days.entry(t.date()).or_default().push(tx),
            None => undated.push(tx),
        }
    }
    DailyLedger {
        days: days
            .into_iter()
            .map(|(d, txs)| (d, aggregate(txs)))
            .collect(),
        undated: aggregate(undated),
    }
}

/// Affiliate-side rows built from the ledger, one per (merchant, day).
///
/// `orders` counts non-rejected transactions and `commission` is the net
/// commission, so the rows can go straight into the record matcher.
pub fn summarize_by_merchant(transactions: &[NormalizedTransaction]) -> Vec<AffiliateRow> {
    let mut groups: BTreeMap<(Option<String>, Option<NaiveDate>), LedgerMetrics> = BTreeMap::new();
    for tx in dedupe(transactions) {
        let key = (tx.merchant.clone(), tx.transaction_time.map(|t| t.date()));
        groups.entry(key).or_default().add(&tx);
    }
    groups
        .into_iter()
        .map(|((merchant_id, date), m)| {
            let m = m.finish();
            AffiliateRow {
                merchant_id,
                date,
                orders: (m.total_orders - m.rejected_orders) as f64,
                commission: m.net_commission.to_f64(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(id: &str, status: TxStatus, commission: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            transaction_id: id.to_string(),
            status,
            commission_amount: Decimal::from_str_canonical(commission).unwrap(),
            order_amount: Decimal::zero(),
            merchant: Some("240088".into()),
            transaction_time: None,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn status_vocabularies() {
        let lh = PlatformId::new("LinkHaitao");
        let rw = PlatformId::new("rewardoo");
        let pm = PlatformId::new("partnermatic");
        let other = PlatformId::new("unknown-net");
        assert_eq!(normalize_status(&lh, "Effective"), TxStatus::Approved);
        assert_eq!(normalize_status(&lh, "Rejected"), TxStatus::Rejected);
        assert_eq!(normalize_status(&rw, "2"), TxStatus::Rejected);
        assert_eq!(normalize_status(&pm, "locked"), TxStatus::Pending);
        assert_eq!(normalize_status(&other, "locked"), TxStatus::Approved);
        assert_eq!(normalize_status(&other, "已确认"), TxStatus::Approved);
        assert_eq!(normalize_status(&other, "mystery"), TxStatus::Pending);
    }

    #[test]
    fn duplicate_ids_count_once_with_last_value() {
        let txs = vec![
            tx("A", TxStatus::Pending, "10.00"),
            tx("B", TxStatus::Approved, "5.00"),
            tx("A", TxStatus::Rejected, "12.50"),
        ];
        let m = dedupe_and_aggregate(&txs);
        assert_eq!(m.total_orders, 2);
        assert_eq!(m.rejected_orders, 1);
        assert_eq!(m.approved_orders, 1);
        assert_eq!(m.total_commission, dec("17.50"));
        assert_eq!(m.rejected_commission, dec("12.50"));
        assert_eq!(m.net_commission, dec("5.00"));
        assert_eq!(m.rejected_rate, 50.0);
    }

    #[test]
    fn missing_ids_are_dropped() {
        let txs = vec![tx("", TxStatus::Approved, "10"), tx("  ", TxStatus::Approved, "10")];
        let m = dedupe_and_aggregate(&txs);
        assert_eq!(m.total_orders, 0);
        assert_eq!(m.rejected_rate, 0.0);
        assert!(m.net_commission.is_zero());
    }

    #[test]
    fn decimal_sums_are_exact() {
        let txs = vec![tx("1", TxStatus::Approved, "0.1"), tx("2", TxStatus::Approved, "0.2")];
        assert_eq!(dedupe_and_aggregate(&txs).approved_commission, dec("0.3"));
    }

    #[test]
    fn batch_uses_field_aliases() {
        let raw = vec![
            json!({"order_id": 991, "state": "Effective", "sale_comm": "3.25", "sale_amount": 50,
                   "mcid": "240088", "order_time": "2025-01-24 10:00:00"}),
            json!({"id": "992", "status": "expired", "commission": "$1,234.50", "created_at": "not a time"}),
            json!("not an object"),
            json!({"status": "approved"}),
        ];
        let txs = normalize_batch(&PlatformId::new("linkhaitao"), &raw);
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].transaction_id, "991");
        assert_eq!(txs[0].status, TxStatus::Approved);
        assert_eq!(txs[0].commission_amount, dec("3.25"));
        assert_eq!(txs[0].order_amount, dec("50"));
        assert_eq!(txs[0].merchant.as_deref(), Some("240088"));
        assert_eq!(
            txs[0].transaction_time.map(|t| t.date()),
            NaiveDate::from_ymd_opt(2025, 1, 24)
        );
        assert_eq!(txs[1].status, TxStatus::Rejected);
        assert_eq!(txs[1].commission_amount, dec("1234.5"));
        assert_eq!(txs[1].transaction_time, None);
        assert_eq!(txs[2].transaction_id, "");
        assert!(txs[2].commission_amount.is_zero());
    }

    #[test]
    fn daily_split_keeps_undated_apart() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap();
        let mut a = tx("A", TxStatus::Approved, "4");
        a.transaction_time = day.and_hms_opt(9, 0, 0);
        let mut b = tx("B", TxStatus::Rejected, "2");
        b.transaction_time = day.and_hms_opt(23, 59, 0);
        let c = tx("C", TxStatus::Pending, "1");
        let daily = aggregate_daily(&[a, b, c]);
        assert_eq!(daily.days.len(), 1);
        assert_eq!(daily.days[&day].total_orders, 2);
        assert_eq!(daily.days[&day].net_commission, dec("4"));
        assert_eq!(daily.undated.total_orders, 1);
    }

    #[test]
    fn merchant_summary_feeds_matcher() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap();
        let mut a = tx("A", TxStatus::Approved, "4");
        a.transaction_time = day.and_hms_opt(9, 0, 0);
        let mut b = tx("B", TxStatus::Rejected, "2");
        b.transaction_time = day.and_hms_opt(10, 0, 0);
        let mut c = tx("C", TxStatus::Pending, "1.5");
        c.transaction_time = day.and_hms_opt(11, 0, 0);
        let rows = summarize_by_merchant(&[a, b, c]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].merchant_id.as_deref(), Some("240088"));
        assert_eq!(rows[0].date, Some(day));
        assert_eq!(rows[0].orders, 2.0);
        assert_eq!(rows[0].commission, 5.5);
    }
}
