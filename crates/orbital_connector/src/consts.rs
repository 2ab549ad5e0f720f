//! Constants of the Orbital XML interface

pub const PROTOCOL_VERSION: &str = "9.5";
pub const XML_VERSION: &str = "1.0";
pub const XML_ENCODING: &str = "UTF-8";
pub const INTERFACE_VERSION: &str = "Rust|orbital_connector|Proprietary Gateway";

pub const TEST_URL: &str = "https://orbitalvar1.chasepaymentech.com/authorize";
pub const SECONDARY_TEST_URL: &str = "https://orbitalvar2.chasepaymentech.com/authorize";
pub const LIVE_URL: &str = "https://orbital1.chasepaymentech.com/authorize";
pub const SECONDARY_LIVE_URL: &str = "https://orbital2.chasepaymentech.com/authorize";

/// Default timeout for a single round trip, in seconds.
pub const REQUEST_TIME_OUT: u64 = 60;

pub const SUCCESS: &str = "0";
pub const APPROVAL_SUCCESS: &str = "1";

/// Response codes that count as an approval for authorize, capture and purchase.
pub const APPROVED: &[&str] = &[
    "00", // Approved
    "08", // Approved authorization, honor with ID
    "11", // Approved authorization, VIP approval
    "24", // Validated
    "26", // Pre-noted
    "27", // No reason to decline
    "28", // Received and stored
    "29", // Provided authorization
    "31", // Request received
    "32", // BIN alert
    "34", // Approved for partial
    "91", // Approved low fraud
    "92", // Approved medium fraud
    "93", // Approved high fraud
    "94", // Approved fraud service unavailable
    "E7", // Stored
    "PA", // Partial approval
    "P1", // ECP account status verification in a positive status
];

pub const AVS_SUPPORTED_COUNTRIES: &[&str] = &["US", "CA", "UK", "GB"];

/// Keys dropped from every parsed reply.
pub const SENSITIVE_FIELDS: &[&str] = &["account_num", "cc_account_num"];

/// Replaces a null byte inside reply text before parsing.
pub const NULL_PLACEHOLDER: &str = "[null]";
pub const FILTERED: &str = "[FILTERED]";
pub const PARSE_FAILURE_MESSAGE: &str = "Unable to parse the response from the processor";

pub mod industry_type {
    pub const ECOMMERCE: &str = "EC";
    pub const RECURRING_PAYMENT: &str = "RC";
}

pub mod message_type {
    pub const AUTH_ONLY: &str = "A";
    pub const AUTH_AND_CAPTURE: &str = "AC";
    pub const FORCE_AUTH_AND_CAPTURE: &str = "FC";
    pub const REFUND: &str = "R";
}

pub mod tax_indicator {
    pub const TAX_NOT_PROVIDED: u8 = 0;
    pub const TAX_INCLUDED: u8 = 1;
    pub const NON_TAXABLE_TRANSACTION: u8 = 2;
}

pub mod profile {
    pub const NO_MAPPING_TO_ORDER_DATA: &str = "NO";

    pub const AUTO_GENERATE: &str = "A";
    pub const USE_CUSTOMER_REF_NUM: &str = "S";

    pub const ACTIVE: &str = "A";

    /// Only credit cards can be attached to a profile.
    pub const CREDIT_CARD_ACCOUNT: &str = "CC";
}

pub mod managed_billing {
    pub const RECURRING: &str = "R";
    pub const ORDER_ID_GENERATION_METHOD: &str = "IO";
    pub const NO_END_DATE_FLAG: &str = "N";
}

pub mod ecp {
    pub const CARD_BRAND: &str = "EC";
    pub const DEFAULT_PAYMENT_DELIVERY: &str = "B";
    pub const BUSINESS_ACCOUNT: &str = "X";
    pub const FORCE_CAPTURE_ACTION_CODES: &[&str] = &["W8", "W9", "ND"];
    pub const EWS_ACTION_CODES: &[&str] = &["W3", "W5", "W7", "W9"];
}

/// Safetech token flags
pub mod token_txn_type {
    pub const GET_TOKEN: &str = "GT";
}

pub const DEFAULT_TERMINAL_ID: &str = "001";
pub const SALEM_BIN: &str = "000001";
pub const PNS_BIN: &str = "000002";
pub const SALEM_MERCHANT_ID_LENGTH: usize = 6;

/// 3-D Secure ECI that marks a frictionless merchant initiated Mastercard flow.
pub const MASTERCARD_SCA_ECI: &str = "7";
pub const MASTERCARD_UCAF_ECIS: &[&str] = &["4", "6", "7"];

pub mod headers {
    pub const MIME_VERSION: &str = "MIME-Version";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-transfer-encoding";
    pub const REQUEST_NUMBER: &str = "Request-number";
    pub const DOCUMENT_TYPE: &str = "Document-type";
    pub const INTERFACE_VERSION: &str = "Interface-Version";
    pub const CONTENT_LENGTH: &str = "Content-length";
    pub const TRACE_NUMBER: &str = "Trace-number";
    pub const MERCHANT_ID: &str = "Merchant-Id";
}
