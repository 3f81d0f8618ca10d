//! Join of ad-side and affiliate-side rows on the normalized merchant id.

use super::keys::{ad_merchant_key, extract_country};
use crate::domain::{AdRow, AffiliateRow, CampaignRecord, MerchantId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

const SAMPLE_IDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Pair rows by position when no merchant id overlaps and both sides
    /// have the same number of valid rows.
    pub allow_positional_fallback: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            allow_positional_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Key,
    /// Low-confidence row-order pairing.
    Positional,
}

/// Counters describing how a match went. Always populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDiagnostics {
    pub ad_rows_total: usize,
    pub affiliate_rows_total: usize,
    pub ad_valid_ids: usize,
    pub affiliate_valid_ids: usize,
    pub matched_rows: usize,
    pub duplicate_key_campaigns: usize,
    pub match_mode: MatchMode,
    pub sample_ad_ids: Vec<String>,
    pub sample_affiliate_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    /// Sorted by (merchant_id, campaign_name).
    pub records: Vec<CampaignRecord>,
    pub diagnostics: MatchDiagnostics,
}

#[derive(Debug, Default)]
struct AdGroup {
    impressions: f64,
    clicks: f64,
    cost: f64,
    last_reported_cpc: f64,
    max_cpc: Option<f64>,
    budget: f64,
    budget_lost: Vec<f64>,
    rank_lost: Vec<f64>,
}

impl AdGroup {
    fn add(&mut self, row: &AdRow) {
        self.impressions += row.impressions;
        self.clicks += row.clicks;
        self.cost += row.cost;
        if row.cpc != 0.0 {
            self.last_reported_cpc = row.cpc;
        }
        if let Some(m) = row.max_cpc {
            self.max_cpc = Some(self.max_cpc.map_or(m, |cur| cur.max(m)));
        }
        self.budget = self.budget.max(row.budget);
        self.budget_lost.extend(row.budget_lost_share);
        self.rank_lost.extend(row.rank_lost_share);
    }

    fn cpc(&self) -> f64 {
        if self.clicks > 0.0 {
            self.cost / self.clicks
        } else {
            self.last_reported_cpc
        }
    }
}

#[derive(Debug, Default)]
struct AffiliateGroup {
    orders: f64,
    commission: f64,
    order_dates: BTreeSet<NaiveDate>,
    undated_order_rows: u32,
}

impl AffiliateGroup {
    fn add(&mut self, row: &AffiliateRow) {
        self.orders += row.orders;
        self.commission += row.commission;
        if row.orders > 0.0 {
            match row.date {
                Some(d) => {
                    self.order_dates.insert(d);
                }
                None => self.undated_order_rows += 1,
            }
        }
    }

    fn order_days(&self) -> u32 {
        self.order_dates.len() as u32 + self.undated_order_rows
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample<'a>(ids: impl Iterator<Item = &'a MerchantId>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        if out.len() == SAMPLE_IDS {
            break;
        }
        if !out.iter().any(|s| s == id.as_str()) {
            out.push(id.as_str().to_string());
        }
    }
    out
}

/// Inner join on merchant id.
///
/// Rows whose id is missing or a null marker never match. When several
/// campaigns share a merchant id, the affiliate totals go to the campaign
/// with the most clicks (then most cost, then smallest name) and the rest
/// are dropped.
pub fn match_records(
    ad_rows: &[AdRow],
    affiliate_rows: &[AffiliateRow],
    opts: &MatchOptions,
) -> MatchOutcome {
    let ads: Vec<(MerchantId, &AdRow)> = ad_rows
        .iter()
        .filter_map(|r| ad_merchant_key(r.merchant_id.as_deref(), &r.campaign_name).map(|id| (id, r)))
        .collect();
    let affiliates: Vec<(MerchantId, &AffiliateRow)> = affiliate_rows
        .iter()
        .filter_map(|r| r.merchant_id.as_deref().and_then(MerchantId::parse).map(|id| (id, r)))
        .collect();

    let ad_ids: BTreeSet<&MerchantId> = ads.iter().map(|(id, _)| id).collect();
    let overlap = affiliates.iter().any(|(id, _)| ad_ids.contains(id));

    let positional = !overlap
        && opts.allow_positional_fallback
        && !ads.is_empty()
        && ads.len() == affiliates.len();

    let mut ad_groups: BTreeMap<(MerchantId, String), AdGroup> = BTreeMap::new();
    for (id, row) in &ads {
        ad_groups
            .entry((id.clone(), row.campaign_name.clone()))
            .or_default()
            .add(row);
    }

    let mut affiliate_groups: BTreeMap<MerchantId, AffiliateGroup> = BTreeMap::new();
    if positional {
        warn!(
            rows = ads.len(),
            "no merchant id overlap; pairing rows by position (low confidence)"
        );
        for ((ad_id, _), (_, row)) in ads.iter().zip(affiliates.iter()) {
            affiliate_groups.entry(ad_id.clone()).or_default().add(row);
        }
    } else {
        for (id, row) in &affiliates {
            affiliate_groups.entry(id.clone()).or_default().add(row);
        }
    }

    let mut by_merchant: BTreeMap<&MerchantId, Vec<(&String, &AdGroup)>> = BTreeMap::new();
    for ((id, name), group) in &ad_groups {
        by_merchant.entry(id).or_default().push((name, group));
    }

    let mut records = Vec::new();
    let mut duplicate_key_campaigns = 0;
    for (id, mut campaigns) in by_merchant {
        let Some(aff) = affiliate_groups.get(id) else {
            continue;
        };
        campaigns.sort_by(|(na, a), (nb, b)| {
            b.clicks
                .total_cmp(&a.clicks)
                .then(b.cost.total_cmp(&a.cost))
                .then(na.cmp(nb))
        });
        duplicate_key_campaigns += campaigns.len() - 1;
        let (name, group) = campaigns[0];
        records.push(build_record(id, name, group, aff));
    }
    records.sort_by(|a, b| {
        a.merchant_id
            .cmp(&b.merchant_id)
            .then_with(|| a.campaign_name.cmp(&b.campaign_name))
    });

    let diagnostics = MatchDiagnostics {
        ad_rows_total: ad_rows.len(),
        affiliate_rows_total: affiliate_rows.len(),
        ad_valid_ids: ads.len(),
        affiliate_valid_ids: affiliates.len(),
        matched_rows: records.len(),
        duplicate_key_campaigns,
        match_mode: if positional {
            MatchMode::Positional
        } else {
            MatchMode::Key
        },
        sample_ad_ids: sample(ads.iter().map(|(id, _)| id)),
        sample_affiliate_ids: sample(affiliates.iter().map(|(id, _)| id)),
    };
    debug!(
        matched = diagnostics.matched_rows,
        duplicates = diagnostics.duplicate_key_campaigns,
        ad_valid = diagnostics.ad_valid_ids,
        affiliate_valid = diagnostics.affiliate_valid_ids,
        "records matched"
    );

    MatchOutcome {
        records,
        diagnostics,
    }
}

fn build_record(id: &MerchantId, name: &str, ad: &AdGroup, aff: &AffiliateGroup) -> CampaignRecord {
    let cpc = ad.cpc().max(0.0);
    CampaignRecord {
        campaign_name: name.to_string(),
        merchant_id: id.clone(),
        country: extract_country(name),
        impressions: ad.impressions.max(0.0),
        clicks: ad.clicks.max(0.0),
        cost: ad.cost.max(0.0),
        cpc,
        max_cpc: ad.max_cpc.unwrap_or(cpc).max(0.0),
        budget: ad.budget.max(0.0),
        budget_lost_share: mean(&ad.budget_lost),
        rank_lost_share: mean(&ad.rank_lost),
        orders: aff.orders.max(0.0),
        commission: aff.commission.max(0.0),
        order_days: aff.order_days(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(name: &str, clicks: f64, cost: f64) -> AdRow {
        AdRow {
            campaign_name: name.to_string(),
            clicks,
            cost,
            cpc: if clicks > 0.0 { cost / clicks } else { 0.0 },
            ..Default::default()
        }
    }

    fn aff(id: &str, orders: f64, commission: f64) -> AffiliateRow {
        AffiliateRow {
            merchant_id: Some(id.to_string()),
            orders,
            commission,
            ..Default::default()
        }
    }

    #[test]
    fn joins_on_embedded_merchant_id() {
        let ads = vec![ad("007-LB1-Acme-US-0125-240088", 100.0, 50.0)];
        let affs = vec![aff("240088.0", 3.0, 100.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.merchant_id.as_str(), "240088");
        assert_eq!(r.country.as_deref(), Some("US"));
        assert_eq!(r.commission, 100.0);
        assert_eq!(r.max_cpc, r.cpc);
        assert_eq!(out.diagnostics.match_mode, MatchMode::Key);
    }

    #[test]
    fn nan_ids_never_match() {
        let ads = vec![AdRow {
            merchant_id: Some("nan".into()),
            ..ad("Brand search", 10.0, 5.0)
        }];
        let affs = vec![aff("nan", 1.0, 10.0), aff("NaN", 1.0, 10.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert!(out.records.is_empty());
        assert_eq!(out.diagnostics.ad_valid_ids, 0);
        assert_eq!(out.diagnostics.affiliate_valid_ids, 0);
        assert_eq!(out.diagnostics.match_mode, MatchMode::Key);
    }

    #[test]
    fn unmatched_rows_are_excluded() {
        let ads = vec![ad("1-LB-A-US-0125-111", 10.0, 5.0), ad("2-LB-B-US-0125-222", 10.0, 5.0)];
        let affs = vec![aff("111", 1.0, 10.0), aff("333", 1.0, 10.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].merchant_id.as_str(), "111");
        assert_eq!(out.diagnostics.matched_rows, 1);
    }

    #[test]
    fn duplicate_key_goes_to_busiest_campaign() {
        let ads = vec![
            ad("1-LB-A-US-0125-111", 10.0, 5.0),
            ad("2-LB-A-DE-0125-111", 40.0, 5.0),
            ad("3-LB-A-FR-0125-111", 40.0, 4.0),
        ];
        let affs = vec![aff("111", 2.0, 20.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].campaign_name, "2-LB-A-DE-0125-111");
        assert_eq!(out.records[0].commission, 20.0);
        assert_eq!(out.diagnostics.duplicate_key_campaigns, 2);
    }

    #[test]
    fn ad_rows_aggregate_per_campaign() {
        let mut first = ad("1-LB-A-US-0125-111", 10.0, 5.0);
        first.budget = 20.0;
        first.max_cpc = Some(0.4);
        first.budget_lost_share = Some(10.0);
        let mut second = ad("1-LB-A-US-0125-111", 30.0, 15.0);
        second.budget = 30.0;
        second.budget_lost_share = Some(30.0);
        let affs = vec![
            AffiliateRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 1),
                ..aff("111", 1.0, 5.0)
            },
            AffiliateRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 1),
                ..aff("111", 2.0, 5.0)
            },
            AffiliateRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 2),
                ..aff("111", 0.0, 0.0)
            },
            aff("111", 1.0, 5.0),
        ];
        let out = match_records(&[first, second], &affs, &MatchOptions::default());
        let r = &out.records[0];
        assert_eq!(r.clicks, 40.0);
        assert_eq!(r.cost, 20.0);
        assert_eq!(r.cpc, 0.5);
        assert_eq!(r.max_cpc, 0.4);
        assert_eq!(r.budget, 30.0);
        assert_eq!(r.budget_lost_share, Some(20.0));
        assert_eq!(r.rank_lost_share, None);
        assert_eq!(r.orders, 4.0);
        assert_eq!(r.commission, 15.0);
        assert_eq!(r.order_days, 2);
    }

    #[test]
    fn zero_click_campaign_keeps_reported_cpc() {
        let mut row = ad("1-LB-A-US-0125-111", 0.0, 0.0);
        row.cpc = 0.3;
        let out = match_records(&[row], &[aff("111", 0.0, 0.0)], &MatchOptions::default());
        assert_eq!(out.records[0].cpc, 0.3);
    }

    #[test]
    fn positional_fallback_is_flagged() {
        let ads = vec![ad("1-LB-A-US-0125-111", 10.0, 5.0), ad("2-LB-B-US-0125-222", 10.0, 5.0)];
        let affs = vec![aff("900", 1.0, 10.0), aff("901", 2.0, 20.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert_eq!(out.diagnostics.match_mode, MatchMode::Positional);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].merchant_id.as_str(), "111");
        assert_eq!(out.records[0].commission, 10.0);
        assert_eq!(out.records[1].commission, 20.0);

        let off = MatchOptions {
            allow_positional_fallback: false,
        };
        let out = match_records(&ads, &affs, &off);
        assert!(out.records.is_empty());
        assert_eq!(out.diagnostics.match_mode, MatchMode::Key);
    }

    #[test]
    fn positional_needs_equal_counts() {
        let ads = vec![ad("1-LB-A-US-0125-111", 10.0, 5.0)];
        let affs = vec![aff("900", 1.0, 10.0), aff("901", 2.0, 20.0)];
        let out = match_records(&ads, &affs, &MatchOptions::default());
        assert!(out.records.is_empty());
        assert_eq!(out.diagnostics.match_mode, MatchMode::Key);
    }

    #[test]
    fn samples_are_distinct_and_bounded() {
        let ads: Vec<AdRow> = (0..8)
            .map(|i| ad(&format!("{i}-LB-A-US-0125-{}", 100 + i % 7), 1.0, 1.0))
            .collect();
        let out = match_records(&ads, &[], &MatchOptions::default());
        assert_eq!(out.diagnostics.sample_ad_ids, vec!["100", "101", "102", "103", "104"]);
        assert!(out.diagnostics.sample_affiliate_ids.is_empty());
    }
}
