use crate::domain::{CampaignRecord, DerivedMetrics};

/// Share of reported commission expected to survive network review.
pub const DEFAULT_CONSERVATIVE_FACTOR: f64 = 0.72;

/// Conservative commission, EPC and ROI for one record. No rounding.
pub fn compute(record: &CampaignRecord, factor: f64) -> DerivedMetrics {
    let conservative_commission = record.commission * factor;
    let conservative_epc = if record.clicks > 0.0 {
        conservative_commission / record.clicks
    } else {
        0.0
    };
    let conservative_roi = if record.cost > 0.0 {
        Some((conservative_commission - record.cost) / record.cost)
    } else {
        None
    };
    DerivedMetrics {
        conservative_commission,
        conservative_epc,
        conservative_roi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MerchantId;

    fn record(clicks: f64, cost: f64, commission: f64) -> CampaignRecord {
        CampaignRecord {
            campaign_name: "1-LB-A-US-0125-111".into(),
            merchant_id: MerchantId::parse("111").unwrap(),
            country: Some("US".into()),
            impressions: 0.0,
            clicks,
            cost,
            cpc: 0.5,
            max_cpc: 0.5,
            budget: 10.0,
            budget_lost_share: None,
            rank_lost_share: None,
            orders: 1.0,
            commission,
            order_days: 1,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reference_campaign() {
        let m = compute(&record(100.0, 50.0, 100.0), DEFAULT_CONSERVATIVE_FACTOR);
        assert!(close(m.conservative_commission, 72.0));
        assert!(close(m.conservative_epc, 0.72));
        assert!(close(m.conservative_roi.unwrap(), 0.44));
    }

    #[test]
    fn no_spend_means_no_roi() {
        let m = compute(&record(10.0, 0.0, 100.0), DEFAULT_CONSERVATIVE_FACTOR);
        assert_eq!(m.conservative_roi, None);
    }

    #[test]
    fn no_clicks_means_zero_epc() {
        let m = compute(&record(0.0, 5.0, 100.0), DEFAULT_CONSERVATIVE_FACTOR);
        assert_eq!(m.conservative_epc, 0.0);
        assert!(m.conservative_roi.is_some());
    }

    #[test]
    fn break_even_roi_is_some_zero() {
        let m = compute(&record(10.0, 72.0, 100.0), DEFAULT_CONSERVATIVE_FACTOR);
        assert!(close(m.conservative_roi.unwrap(), 0.0));
    }
}
