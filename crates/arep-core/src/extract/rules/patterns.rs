//! Common regex patterns for annual report extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency tokens stripped from numeric cells
    pub static ref CURRENCY_TOKEN: Regex = Regex::new(
        r"(?i)rs\.?|lkr|usd|\$"
    ).unwrap();

    // Anything that cannot be part of a plain decimal number
    pub static ref NON_NUMERIC: Regex = Regex::new(
        r"[^\d.\-]"
    ).unwrap();

    // Four-digit year anywhere in a filename
    pub static ref FILENAME_YEAR: Regex = Regex::new(
        r"20(19|20|21|22|23)"
    ).unwrap();

    // Document content year patterns, most specific first
    pub static ref CONTENT_YEAR_PATTERNS: Vec<Regex> = [
        // Full dates
        r"(?i)(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+20(19|20|21|22|23)",
        r"(?i)\d{1,2}(?:st|nd|rd|th)?\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+20(19|20|21|22|23)",
        // Fiscal year phrases
        r"(?i)(?:FY|Financial Year|Year Ended|For the Year|Annual Report)\s+20(19|20|21|22|23)",
        r"(?i)20(19|20|21|22|23)(?:/|-|–)20\d{2}\s+(?:Annual Report|Financial Statements)",
        // Year in context
        r"(?i)(?:Results|Performance|Report)\s+(?:for|of)\s+(?:the\s+year\s+)?20(19|20|21|22|23)",
        // Quarters
        r"(?i)Q[1-4]\s+20(19|20|21|22|23)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    // Maximal digit runs; bare years are runs of exactly four digits
    pub static ref DIGIT_RUN: Regex = Regex::new(
        r"\d+"
    ).unwrap();

    // Table cell year shapes
    pub static ref CELL_YEAR_FULL: Regex = Regex::new(
        r"20(19|2[0-4])"
    ).unwrap();

    pub static ref CELL_YEAR_SHORT: Regex = Regex::new(
        r"\b([1-9][0-9])\b"
    ).unwrap();

    pub static ref CELL_YEAR_RANGE: Regex = Regex::new(
        r"20(19|2[0-4])[\-/–](19|2[0-4])"
    ).unwrap();

    // Any four-digit group, for shareholder headers
    pub static ref FOUR_DIGITS: Regex = Regex::new(
        r"\d{4}"
    ).unwrap();

    // Shareholder text rows: name, holding, pct, holding, pct
    pub static ref SHAREHOLDER_ROW_DUAL: Regex = Regex::new(
        r"^(.*?)(\d[\d,]*)\s+([\d.]+)\s+(\d[\d,]*)\s+([\d.]+)"
    ).unwrap();

    // Shareholder text rows: name, holding, pct
    pub static ref SHAREHOLDER_ROW_SINGLE: Regex = Regex::new(
        r"^(.*?)(\d[\d,]*)\s+([\d.]+)"
    ).unwrap();

    // Rights issue ratios, tried in order
    pub static ref RATIO_COLON: Regex = Regex::new(
        r"\b(\d{1,2})\s*:\s*(\d{1,2})\b"
    ).unwrap();

    pub static ref RATIO_FOR: Regex = Regex::new(
        r"\b(\d{1,2})\s+for\s+(\d{1,2})\b"
    ).unwrap();

    pub static ref RATIO_ONE_FOR: Regex = Regex::new(
        r"(?i)\bone\s+for\s+(\d{1,2})\b"
    ).unwrap();

    pub static ref RATIO_TO: Regex = Regex::new(
        r"\b(\d{1,2})\s+to\s+(\d{1,2})\b"
    ).unwrap();

    pub static ref RATIO_OF: Regex = Regex::new(
        r"(?i)ratio\s+of\s+(\d{1,2})\s*:\s*(\d{1,2})"
    ).unwrap();

    // Rights issue prices, tried in order
    pub static ref PRICE_PATTERNS: Vec<Regex> = [
        r"(?i)(?:rs\.?|lkr)\s*(\d+\.?\d*)",
        r"(?i)(?:price|rate)\s+(?:of\s+)?(?:rs\.?|lkr)\s*(\d+\.?\d*)",
        r"(?i)(?:at|@)\s*(?:rs\.?|lkr)\s*(\d+\.?\d*)",
        r"(?i)(\d+\.?\d*)\s*(?:rs\.?|lkr)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    // Column gap in laid-out page text
    pub static ref CELL_GAP: Regex = Regex::new(
        r"\t+|\s{2,}"
    ).unwrap();
}
