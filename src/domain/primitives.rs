//! Domain primitives: UserId, PlatformId, MerchantId.

use serde::{Deserialize, Serialize};

/// Owner of a sync/analysis job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Affiliate platform code (e.g. "linkhaitao", "partnermatic").
///
/// Stored lowercased so lookups against per-platform tables are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub String);

impl PlatformId {
    pub fn new(id: impl AsRef<str>) -> Self {
        PlatformId(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric merchant identifier shared by campaign names and affiliate exports.
///
/// Only constructed through [`MerchantId::parse`], so a value always holds a
/// trimmed, non-empty id without a float `.0` suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    /// Normalize a raw cell value into a merchant id.
    ///
    /// Returns `None` for empty cells and for the textual null markers that
    /// spreadsheet tooling writes (`nan`, `none`, `null`).
    pub fn parse(raw: &str) -> Option<Self> {
        let mut s = raw.trim();
        if let Some(stripped) = s.strip_suffix(".0") {
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
                s = stripped;
            }
        }
        if s.is_empty() {
            return None;
        }
        match s.to_ascii_lowercase().as_str() {
            "nan" | "none" | "null" | "n/a" => None,
            _ => Some(MerchantId(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_id_strips_float_suffix() {
        let id = MerchantId::parse(" 240088.0 ").unwrap();
        assert_eq!(id.as_str(), "240088");
    }

    #[test]
    fn merchant_id_rejects_null_markers() {
        assert!(MerchantId::parse("").is_none());
        assert!(MerchantId::parse("   ").is_none());
        assert!(MerchantId::parse("nan").is_none());
        assert!(MerchantId::parse("NaN").is_none());
        assert!(MerchantId::parse("None").is_none());
    }

    #[test]
    fn merchant_id_keeps_non_float_text() {
        assert_eq!(MerchantId::parse("A12.0").unwrap().as_str(), "A12.0");
    }

    #[test]
    fn platform_id_is_lowercased() {
        assert_eq!(PlatformId::new(" LinkHaitao ").as_str(), "linkhaitao");
    }

    #[test]
    fn merchant_id_serializes_as_plain_string() {
        let id = MerchantId::parse("555").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"555\"");
    }
}
