//! Merchant id and country extraction from composite campaign names.
//!
//! Campaign names follow `seq-platform-merchant-country-time-merchantId`,
//! e.g. `007-LB1-Acme-US-0125-240088`.

use crate::domain::MerchantId;

/// Trailing dash token if it is all digits, else the last run of digits in
/// that token, else `None`.
pub fn extract_merchant_id(campaign_name: &str) -> Option<String> {
    let last = campaign_name.trim().rsplit('-').next()?.trim();
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        return Some(last.to_string());
    }
    last_digit_run(last)
}

fn last_digit_run(s: &str) -> Option<String> {
    let end = s.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = s[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + s[i..].chars().next().map(char::len_utf8).unwrap_or(1))
        .unwrap_or(0);
    Some(s[start..end].to_string())
}

/// The fourth dash-separated segment.
pub fn extract_country(campaign_name: &str) -> Option<String> {
    campaign_name
        .split('-')
        .nth(3)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String form of [`MerchantId::parse`].
pub fn normalize_merchant_id(raw: &str) -> Option<String> {
    MerchantId::parse(raw).map(|id| id.as_str().to_string())
}

/// Merchant key for an ad row: the explicit column when present and valid,
/// otherwise the id embedded in the campaign name.
pub fn ad_merchant_key(explicit: Option<&str>, campaign_name: &str) -> Option<MerchantId> {
    explicit
        .and_then(MerchantId::parse)
        .or_else(|| extract_merchant_id(campaign_name).and_then(|id| MerchantId::parse(&id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_numeric_token() {
        let name = "007-LB1-Acme-US-0125-240088";
        assert_eq!(extract_merchant_id(name).as_deref(), Some("240088"));
        assert_eq!(extract_country(name).as_deref(), Some("US"));
    }

    #[test]
    fn last_digit_run_inside_mixed_token() {
        assert_eq!(
            extract_merchant_id("1-LB-ACME-US-0125-mid555x").as_deref(),
            Some("555")
        );
        assert_eq!(
            extract_merchant_id("1-LB-ACME-US-0125-12ab345").as_deref(),
            Some("345")
        );
        assert_eq!(extract_merchant_id("Brand search").as_deref(), None);
        assert_eq!(extract_merchant_id("").as_deref(), None);
    }

    #[test]
    fn country_needs_four_segments() {
        assert_eq!(extract_country("1-LB-ACME"), None);
        assert_eq!(extract_country("1-LB-ACME--0125"), None);
        assert_eq!(extract_country("1-LB-ACME-DE").as_deref(), Some("DE"));
    }

    #[test]
    fn null_markers_are_not_ids() {
        for raw in ["", "  ", "nan", "NaN", "None", "null"] {
            assert_eq!(normalize_merchant_id(raw), None, "{raw:?}");
        }
        assert_eq!(normalize_merchant_id(" 240088.0 ").as_deref(), Some("240088"));
    }

    #[test]
    fn explicit_column_wins_over_name() {
        let id = ad_merchant_key(Some("777.0"), "1-LB-ACME-US-0125-555").unwrap();
        assert_eq!(id.as_str(), "777");
        let id = ad_merchant_key(Some("nan"), "1-LB-ACME-US-0125-555").unwrap();
        assert_eq!(id.as_str(), "555");
        assert!(ad_merchant_key(None, "no id here").is_none());
    }
}
