//! Explicit column → field mapping tables for ad and affiliate exports.

use crate::domain::{AdRow, AffiliateRow, RawTable, RowView};
use crate::normalize::{apply_exchange_rate, share_percent, to_date, to_number, ExchangeRates};

/// One typed field: the header spellings it answers to and how a cell is
/// written into the row.
pub struct FieldSpec<T> {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub apply: fn(&mut T, &str),
}

fn non_empty(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

fn ad_campaign(r: &mut AdRow, v: &str) {
    r.campaign_name = v.trim().to_string();
}
fn ad_merchant(r: &mut AdRow, v: &str) {
    r.merchant_id = non_empty(v);
}
fn ad_date(r: &mut AdRow, v: &str) {
    r.date = to_date(v);
}
fn ad_impressions(r: &mut AdRow, v: &str) {
    r.impressions = to_number(v).max(0.0);
}
fn ad_clicks(r: &mut AdRow, v: &str) {
    r.clicks = to_number(v).max(0.0);
}
fn ad_cost(r: &mut AdRow, v: &str) {
    r.cost = to_number(v).max(0.0);
}
fn ad_cpc(r: &mut AdRow, v: &str) {
    r.cpc = to_number(v).max(0.0);
}
fn ad_max_cpc(r: &mut AdRow, v: &str) {
    r.max_cpc = crate::normalize::try_number(v).map(|n| n.max(0.0));
}
fn ad_budget(r: &mut AdRow, v: &str) {
    r.budget = to_number(v).max(0.0);
}
fn ad_budget_lost(r: &mut AdRow, v: &str) {
    r.budget_lost_share = share_percent(v);
}
fn ad_rank_lost(r: &mut AdRow, v: &str) {
    r.rank_lost_share = share_percent(v);
}
fn ad_currency(r: &mut AdRow, v: &str) {
    r.currency = non_empty(v).map(|c| c.to_ascii_uppercase());
}
fn ad_status(r: &mut AdRow, v: &str) {
    r.status = non_empty(v);
}

/// Ad-side fields. More specific fields precede the ones whose aliases they
/// contain (max CPC before CPC, lost-share columns before budget).
pub const AD_FIELDS: &[FieldSpec<AdRow>] = &[
    FieldSpec {
        name: "campaign_name",
        aliases: &["campaign", "campaign name", "广告系列", "广告系列名称", "系列名称"],
        apply: ad_campaign,
    },
    FieldSpec {
        name: "merchant_id",
        aliases: &["merchant id", "mid", "商家id", "广告主id"],
        apply: ad_merchant,
    },
    FieldSpec {
        name: "date",
        aliases: &["day", "date", "日期", "天"],
        apply: ad_date,
    },
    FieldSpec {
        name: "impressions",
        aliases: &["impressions", "impr.", "impr", "展示次数"],
        apply: ad_impressions,
    },
    FieldSpec {
        name: "clicks",
        aliases: &["clicks", "点击次数", "点击"],
        apply: ad_clicks,
    },
    FieldSpec {
        name: "budget_lost_share",
        aliases: &[
            "search lost is (budget)",
            "budget lost share",
            "lost is (budget)",
            "搜索丢失的展示次数份额(预算)",
            "预算导致的搜索份额损失",
        ],
        apply: ad_budget_lost,
    },
    FieldSpec {
        name: "rank_lost_share",
        aliases: &[
            "search lost is (rank)",
            "rank lost share",
            "lost is (rank)",
            "搜索丢失的展示次数份额(排名)",
            "排名导致的搜索份额损失",
        ],
        apply: ad_rank_lost,
    },
    FieldSpec {
        name: "max_cpc",
        aliases: &["max. cpc", "max cpc", "default max. cpc", "最高每次点击费用", "最高cpc"],
        apply: ad_max_cpc,
    },
    FieldSpec {
        name: "cpc",
        aliases: &["avg. cpc", "avg cpc", "average cpc", "cpc", "平均每次点击费用"],
        apply: ad_cpc,
    },
    FieldSpec {
        name: "cost",
        aliases: &["cost", "spend", "费用", "花费"],
        apply: ad_cost,
    },
    FieldSpec {
        name: "budget",
        aliases: &["budget", "daily budget", "预算", "每日预算"],
        apply: ad_budget,
    },
    FieldSpec {
        name: "currency",
        aliases: &["currency", "currency code", "货币", "币种"],
        apply: ad_currency,
    },
    FieldSpec {
        name: "status",
        aliases: &["campaign status", "status", "状态"],
        apply: ad_status,
    },
];

fn aff_merchant(r: &mut AffiliateRow, v: &str) {
    r.merchant_id = non_empty(v);
}
fn aff_date(r: &mut AffiliateRow, v: &str) {
    r.date = to_date(v);
}
fn aff_orders(r: &mut AffiliateRow, v: &str) {
    r.orders = to_number(v).max(0.0);
}
fn aff_commission(r: &mut AffiliateRow, v: &str) {
    r.commission = to_number(v).max(0.0);
}

pub const AFFILIATE_FIELDS: &[FieldSpec<AffiliateRow>] = &[
    FieldSpec {
        name: "merchant_id",
        aliases: &[
            "merchant id",
            "mid",
            "advertiser id",
            "商家id",
            "商户id",
            "广告主id",
        ],
        apply: aff_merchant,
    },
    FieldSpec {
        name: "date",
        aliases: &["date", "day", "order date", "日期"],
        apply: aff_date,
    },
    FieldSpec {
        name: "orders",
        aliases: &["orders", "order count", "订单数", "订单"],
        apply: aff_orders,
    },
    FieldSpec {
        name: "commission_amount",
        aliases: &[
            "commission amount",
            "commission",
            "est. commission",
            "佣金金额",
            "佣金",
        ],
        apply: aff_commission,
    },
];

pub const AD_REQUIRED: &[&str] = &["campaign_name", "clicks", "cost", "cpc"];
pub const AFFILIATE_REQUIRED: &[&str] = &["merchant_id", "orders", "commission_amount"];

/// Lowercase, unify separators and full-width parentheses, collapse spaces.
pub fn normalize_header(name: &str) -> String {
    let mapped: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' => ' ',
            '（' => '(',
            '）' => ')',
            c => c,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Which table column feeds each field.
pub struct ColumnBinding<T: 'static> {
    bound: Vec<(&'static FieldSpec<T>, usize)>,
}

impl<T: Default + 'static> ColumnBinding<T> {
    /// Bind columns in two passes: exact alias matches first, then columns
    /// whose name contains an alias. A column feeds at most one field.
    pub fn bind(columns: &[String], specs: &'static [FieldSpec<T>]) -> Self {
        let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
        let mut claimed = vec![false; columns.len()];
        let mut slots: Vec<Option<usize>> = vec![None; specs.len()];

        for (slot, spec) in slots.iter_mut().zip(specs) {
            let hit = std::iter::once(spec.name)
                .chain(spec.aliases.iter().copied())
                .map(normalize_header)
                .find_map(|alias| {
                    normalized
                        .iter()
                        .enumerate()
                        .position(|(i, col)| !claimed[i] && *col == alias)
                });
            if let Some(i) = hit {
                claimed[i] = true;
                *slot = Some(i);
            }
        }

        for (slot, spec) in slots.iter_mut().zip(specs) {
            if slot.is_some() {
                continue;
            }
            let hit = spec.aliases.iter().find_map(|alias| {
                let alias = normalize_header(alias);
                normalized
                    .iter()
                    .enumerate()
                    .position(|(i, col)| !claimed[i] && col.contains(&alias))
            });
            if let Some(i) = hit {
                claimed[i] = true;
                *slot = Some(i);
            }
        }

        let bound = specs
            .iter()
            .zip(slots)
            .filter_map(|(spec, slot)| slot.map(|i| (spec, i)))
            .collect();
        Self { bound }
    }

    pub fn has(&self, field: &str) -> bool {
        self.bound.iter().any(|(spec, _)| spec.name == field)
    }

    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|f| !self.has(f)).collect()
    }

    pub fn build(&self, row: &RowView<'_>) -> T {
        let mut out = T::default();
        for (spec, index) in &self.bound {
            if let Some(cell) = row.cell(*index) {
                (spec.apply)(&mut out, cell);
            }
        }
        out
    }
}

fn is_summary_label(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.starts_with("total") || lower.starts_with("总计") || lower.starts_with("合计")
}

/// Typed ad rows with money converted to USD.
///
/// Rows without a campaign name and report summary rows ("Total: …") are
/// skipped.
pub fn ad_rows(table: &RawTable, rates: &ExchangeRates) -> Vec<AdRow> {
    let binding = ColumnBinding::bind(table.columns(), AD_FIELDS);
    table
        .rows()
        .map(|r| binding.build(&r))
        .filter(|r| !r.campaign_name.is_empty() && !is_summary_label(&r.campaign_name))
        .map(|mut r| {
            apply_exchange_rate(&mut r, rates);
            r
        })
        .collect()
}

/// Typed affiliate rows; summary rows are skipped.
pub fn affiliate_rows(table: &RawTable) -> Vec<AffiliateRow> {
    let binding = ColumnBinding::bind(table.columns(), AFFILIATE_FIELDS);
    table
        .rows()
        .filter(|r| !r.cell(0).map(is_summary_label).unwrap_or(false))
        .map(|r| binding.build(&r))
        .collect()
}
