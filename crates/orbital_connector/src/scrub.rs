//! Transcript redaction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::consts;

/// Elements whose bodies never leave the adapter in clear text.
const SCRUBBED_TAGS: &[&str] = &[
    "OrbitalConnectionUsername",
    "OrbitalConnectionPassword",
    "AccountNum",
    "CardSecVal",
    "MerchantID",
    "CustomerMerchantID",
    "CustomerProfileMessage",
    "CheckDDA",
    "BCRtNum",
    "DigitalTokenCryptogram",
];

#[allow(clippy::expect_used)]
static SCRUB_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SCRUBBED_TAGS
        .iter()
        .map(|tag| format!("(<{tag}>).+(</{tag}>)"))
        // Replies sometimes break the line inside the closing tag of the card number.
        .chain(std::iter::once("(<CCAccountNum>).+(</CC)".to_string()))
        .map(|pattern| Regex::new(&pattern).expect("scrub pattern is valid"))
        .collect()
});

/// Replaces the bodies of credential, account, security code and cryptogram elements
/// with `[FILTERED]`.
pub fn scrub(transcript: &str) -> String {
    let replacement = format!("${{1}}{}${{2}}", consts::FILTERED);
    SCRUB_PATTERNS
        .iter()
        .fold(transcript.to_string(), |transcript, pattern| {
            pattern
                .replace_all(&transcript, replacement.as_str())
                .into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Request>
  <NewOrder>
    <OrbitalConnectionUsername>T16WAYSACT</OrbitalConnectionUsername>
    <OrbitalConnectionPassword>zbp8X1ykGZ</OrbitalConnectionPassword>
    <IndustryType>EC</IndustryType>
    <MessageType>AC</MessageType>
    <BIN>000001</BIN>
    <MerchantID>041756</MerchantID>
    <TerminalID>001</TerminalID>
    <AccountNum>4112344112344113</AccountNum>
    <Exp>0929</Exp>
    <CardSecValInd>1</CardSecValInd>
    <CardSecVal>123</CardSecVal>
    <BCRtNum>072403004</BCRtNum>
    <CheckDDA>072403004</CheckDDA>
    <DigitalTokenCryptogram>BwABB4JRdgAAAAAAiFF2AAAAAAA=</DigitalTokenCryptogram>
  </NewOrder>
</Request>
<Response><ProfileResp><CustomerMerchantID>041756</CustomerMerchantID><CCAccountNum>4112344112344113</CC
AccountNum><CustomerProfileMessage>Profile Request Processed</CustomerProfileMessage></ProfileResp></Response>"#;

    #[test]
    fn redacts_every_sensitive_body() {
        let scrubbed = scrub(TRANSCRIPT);
        for secret in [
            "T16WAYSACT",
            "zbp8X1ykGZ",
            "041756",
            "4112344112344113",
            "<CardSecVal>123",
            "072403004",
            "BwABB4JRdgAAAAAAiFF2AAAAAAA=",
            "Profile Request Processed",
        ] {
            assert!(!scrubbed.contains(secret), "{secret} leaked");
        }
        assert!(scrubbed.contains("<CCAccountNum>[FILTERED]</CC\nAccountNum>"));
        assert!(scrubbed.contains("<MerchantID>[FILTERED]</MerchantID>"));
        assert!(scrubbed.contains("<CardSecValInd>1</CardSecValInd>"));
        assert!(scrubbed.contains("<Exp>0929</Exp>"));
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(scrub("<OrderID>1</OrderID>"), "<OrderID>1</OrderID>");
        assert_eq!(scrub("<AccountNum></AccountNum>"), "<AccountNum></AccountNum>");
    }
}
