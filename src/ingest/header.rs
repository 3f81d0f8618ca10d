//! Header-row detection heuristics.
//!
//! Exports from ad platforms and affiliate dashboards often start with a
//! report title, a date range line or a blank spacer before the real header.
//! These functions score candidate rows and clean up the chosen header.

use crate::normalize::try_number;

/// How many leading rows are considered as header candidates.
pub const HEADER_SCAN_ROWS: usize = 20;

const KEYWORD_WEIGHT: u32 = 3;
const CJK_WEIGHT: u32 = 2;
const TEXT_WEIGHT: u32 = 1;

/// Lowercase fragments that mark a cell as a likely column label.
const HEADER_KEYWORDS: &[&str] = &[
    "campaign",
    "clicks",
    "cost",
    "spend",
    "impressions",
    "impr",
    "cpc",
    "budget",
    "lost is",
    "impression share",
    "merchant",
    "mid",
    "orders",
    "commission",
    "currency",
    "status",
    "date",
    "day",
    "conversions",
    "广告系列",
    "点击",
    "费用",
    "展示",
    "预算",
    "商家",
    "广告主",
    "订单",
    "佣金",
    "日期",
    "状态",
    "货币",
];

/// True if the text contains a CJK ideograph, kana or hangul syllable.
pub fn contains_cjk(s: &str) -> bool {
    s.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{3040}'..='\u{30FF}'
            | '\u{AC00}'..='\u{D7AF}')
    })
}

pub fn matches_keyword(cell: &str) -> bool {
    let lower = cell.trim().to_lowercase();
    !lower.is_empty() && HEADER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Names that spreadsheet tooling generates for unlabeled columns.
pub fn is_placeholder(name: &str) -> bool {
    let s = name.trim();
    if s.is_empty() {
        return true;
    }
    let lower = s.to_ascii_lowercase();
    ["col_", "unnamed: ", "column"]
        .iter()
        .any(|p| match lower.strip_prefix(p) {
            Some(rest) => !rest.trim().is_empty() && rest.trim().chars().all(|c| c.is_ascii_digit()),
            None => false,
        })
}

/// Control characters, replacement characters and common UTF-8-read-as-Latin-1
/// artifacts.
pub fn is_garbled(name: &str) -> bool {
    name.chars().any(|c| {
        (c.is_control() && c != '\t')
            || c == '\u{FFFD}'
            || ('\u{E000}'..='\u{F8FF}').contains(&c)
    }) || ["Ã", "Â", "â€", "ï¿"].iter().any(|m| name.contains(m))
}

fn is_numeric_cell(cell: &str) -> bool {
    try_number(cell).is_some() && !cell.chars().any(|c| c.is_alphabetic())
}

/// Score one cell as a header label.
pub fn score_header_cell(cell: &str) -> u32 {
    let cell = cell.trim();
    if is_placeholder(cell) || is_garbled(cell) {
        0
    } else if matches_keyword(cell) {
        KEYWORD_WEIGHT
    } else if contains_cjk(cell) {
        CJK_WEIGHT
    } else if is_numeric_cell(cell) {
        0
    } else {
        TEXT_WEIGHT
    }
}

pub fn score_header_row(cells: &[String]) -> u32 {
    cells.iter().map(|c| score_header_cell(c)).sum()
}

/// Index and score of the best header candidate; the earliest row wins ties.
pub fn detect_header_row(rows: &[Vec<String>]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = score_header_row(row);
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((i, score));
        }
    }
    best
}

/// True when at least half the names are placeholders or garbled.
pub fn needs_fallback(header: &[String]) -> bool {
    let bad = header
        .iter()
        .filter(|h| is_placeholder(h) || is_garbled(h))
        .count();
    header.is_empty() || bad * 2 >= header.len()
}

/// Replace unusable names with `col_N` (1-based) and de-duplicate the rest.
pub fn finalize_columns(header: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(header.len());
    for (i, raw) in header.iter().enumerate() {
        let name = raw.trim();
        let base = if is_placeholder(name) || is_garbled(name) {
            format!("col_{}", i + 1)
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while out.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keyword_cells_outscore_plain_text_and_numbers() {
        assert_eq!(score_header_cell("Clicks"), 3);
        assert_eq!(score_header_cell("广告系列"), 3);
        assert_eq!(score_header_cell("名称"), 2);
        assert_eq!(score_header_cell("Acme shoes"), 1);
        assert_eq!(score_header_cell("1,234.50"), 0);
        assert_eq!(score_header_cell(""), 0);
        assert_eq!(score_header_cell("Unnamed: 3"), 0);
    }

    #[test]
    fn header_found_below_banner_rows() {
        let rows = vec![
            row(&["Campaign report"]),
            row(&["January 1, 2025 - January 31, 2025"]),
            row(&["Campaign", "Clicks", "Cost", "Avg. CPC"]),
            row(&["1-LB-ACME-US-0125-555", "100", "50", "0.5"]),
        ];
        assert_eq!(detect_header_row(&rows).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn ties_prefer_earliest_row() {
        let rows = vec![row(&["a", "b"]), row(&["c", "d"])];
        assert_eq!(detect_header_row(&rows), Some((0, 2)));
    }

    #[test]
    fn only_first_twenty_rows_are_scanned() {
        let mut rows: Vec<Vec<String>> = (0..25).map(|_| row(&["1", "2"])).collect();
        rows[22] = row(&["Campaign", "Clicks"]);
        assert_eq!(detect_header_row(&rows), Some((0, 0)));
    }

    #[test]
    fn placeholders_and_garbage() {
        assert!(is_placeholder("col_3"));
        assert!(is_placeholder("Unnamed: 0"));
        assert!(!is_placeholder("column name"));
        assert!(is_garbled("Cost\u{0001}"));
        assert!(is_garbled("è´¹ç\u{FFFD}¨"));
        assert!(is_garbled("Ã©"));
        assert!(!is_garbled("Coût"));
    }

    #[test]
    fn fallback_threshold_is_half() {
        assert!(needs_fallback(&row(&["", "", "Clicks", "Cost"])));
        assert!(!needs_fallback(&row(&["", "Campaign", "Clicks", "Cost"])));
        assert!(needs_fallback(&[]));
    }

    #[test]
    fn finalize_synthesizes_and_dedupes() {
        let cols = finalize_columns(&row(&["Cost", "", "Cost", "\u{FFFD}"]));
        assert_eq!(cols, vec!["Cost", "col_2", "Cost_2", "col_4"]);
    }
}
