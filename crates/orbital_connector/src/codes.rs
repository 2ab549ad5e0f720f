//! Orbital's own AVS and CVV result codes.

use serde::Serialize;

/// Tri-state match flag derived from a vendor code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
pub enum MatchCode {
    #[strum(serialize = "Y")]
    #[serde(rename = "Y")]
    Match,
    #[strum(serialize = "N")]
    #[serde(rename = "N")]
    NoMatch,
    /// The issuer does not take part in address verification.
    #[strum(serialize = "X")]
    #[serde(rename = "X")]
    Unsupported,
}

const AVS_MESSAGES: &[(&str, &str)] = &[
    ("1", "No address supplied"),
    ("2", "Bill-to address did not pass Auth Host edit checks"),
    ("3", "AVS not performed"),
    ("4", "Issuer does not participate in AVS"),
    ("5", "Edit-error - AVS data is invalid"),
    ("6", "System unavailable or time-out"),
    ("7", "Address information unavailable"),
    ("8", "Transaction Ineligible for AVS"),
    ("9", "Zip Match/Zip 4 Match/Locale match"),
    ("A", "Zip Match/Zip 4 Match/Locale no match"),
    ("B", "Zip Match/Zip 4 no Match/Locale match"),
    ("C", "Zip Match/Zip 4 no Match/Locale no match"),
    ("D", "Zip No Match/Zip 4 Match/Locale match"),
    ("E", "Zip No Match/Zip 4 Match/Locale no match"),
    ("F", "Zip No Match/Zip 4 No Match/Locale match"),
    ("G", "No match at all"),
    ("H", "Zip Match/Locale match"),
    ("J", "Issuer does not participate in Global AVS"),
    ("JA", "International street address and postal match"),
    ("JB", "International street address match. Postal code not verified"),
    ("JC", "International street address and postal code not verified"),
    ("JD", "International postal code match. Street address not verified"),
    ("M1", "Cardholder name matches"),
    ("M2", "Cardholder name, billing address, and postal code matches"),
    ("M3", "Cardholder name and billing code matches"),
    ("M4", "Cardholder name and billing address match"),
    ("M5", "Cardholder name incorrect, billing address and postal code match"),
    ("M6", "Cardholder name incorrect, billing postal code matches"),
    ("M7", "Cardholder name incorrect, billing address matches"),
    ("M8", "Cardholder name, billing address and postal code are all incorrect"),
    ("N3", "Address matches, ZIP not verified"),
    ("N4", "Address and ZIP code not verified due to incompatible formats"),
    ("N5", "Address and ZIP code match (International only)"),
    ("N6", "Address not verified (International only)"),
    ("N7", "ZIP matches, address not verified"),
    ("N8", "Address and ZIP code match (International only)"),
    ("N9", "Address and ZIP code match (UK only)"),
    ("R", "Issuer does not participate in AVS"),
    ("UK", "Unknown"),
    ("X", "Zip Match/Zip 4 Match/Address Match"),
    ("Z", "Zip Match/Locale no match"),
];

const POSTAL_MATCH: &[&str] = &[
    "9", "A", "B", "C", "H", "JA", "JD", "M2", "M3", "M5", "N5", "N8", "N9", "X", "Z",
];
const POSTAL_NO_MATCH: &[&str] = &["D", "E", "F", "G", "M8"];

const STREET_MATCH: &[&str] = &[
    "9", "B", "D", "F", "H", "JA", "JB", "M2", "M4", "M5", "M6", "M7", "N3", "N5", "N7", "N8", "N9",
    "X",
];
const STREET_NO_MATCH: &[&str] = &["A", "C", "E", "G", "M8", "Z"];

/// Shared by both columns.
const AVS_UNSUPPORTED: &[&str] = &["4", "J", "R"];

const CVV_MESSAGES: &[(&str, &str)] = &[
    ("M", "Match"),
    ("N", "No match"),
    ("P", "Not processed"),
    ("S", "Should have been present"),
    ("U", "Unsupported by issuer/Issuer unable to process request"),
    ("I", "Invalid"),
    ("Y", "Invalid"),
    ("", "Not applicable"),
];

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AvsResult {
    pub code: Option<String>,
    pub message: Option<&'static str>,
    pub postal_match: Option<MatchCode>,
    pub street_match: Option<MatchCode>,
}

impl AvsResult {
    /// Unknown and blank codes give an empty result.
    pub fn new(code: Option<&str>) -> Self {
        let Some(code) = code
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
        else {
            return Self::default();
        };
        Self {
            message: lookup(AVS_MESSAGES, &code),
            postal_match: match_code(&code, POSTAL_MATCH, POSTAL_NO_MATCH),
            street_match: match_code(&code, STREET_MATCH, STREET_NO_MATCH),
            code: Some(code),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CvvResult {
    pub code: String,
    pub message: Option<&'static str>,
}

impl CvvResult {
    /// Blank codes read as `""`; anything else is only upper cased before the lookup.
    pub fn new(code: Option<&str>) -> Self {
        let code = code
            .filter(|code| !code.trim().is_empty())
            .map(str::to_uppercase)
            .unwrap_or_default();
        Self {
            message: lookup(CVV_MESSAGES, &code),
            code,
        }
    }
}

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, message)| *message)
}

fn match_code(code: &str, matched: &[&str], not_matched: &[&str]) -> Option<MatchCode> {
    if matched.contains(&code) {
        Some(MatchCode::Match)
    } else if not_matched.contains(&code) {
        Some(MatchCode::NoMatch)
    } else if AVS_UNSUPPORTED.contains(&code) {
        Some(MatchCode::Unsupported)
    } else {
        None
    }
}
