use serde::{Deserialize, Serialize};

/// Amount in the lowest denomination of its currency.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnit(i64);

impl MinorUnit {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Currencies the adapter can put on the wire, with their ISO 4217 numeric code
/// and minor-unit exponent.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    Aud,
    Brl,
    #[default]
    Cad,
    Chf,
    Cny,
    Dkk,
    Eur,
    Gbp,
    Hkd,
    Inr,
    Jpy,
    Krw,
    Mxn,
    Nok,
    Nzd,
    Sek,
    Sgd,
    Usd,
    Zar,
}

impl Currency {
    pub fn iso_4217(self) -> &'static str {
        match self {
            Self::Aud => "036",
            Self::Brl => "986",
            Self::Cad => "124",
            Self::Chf => "756",
            Self::Cny => "156",
            Self::Dkk => "208",
            Self::Eur => "978",
            Self::Gbp => "826",
            Self::Hkd => "344",
            Self::Inr => "356",
            Self::Jpy => "392",
            Self::Krw => "410",
            Self::Mxn => "484",
            Self::Nok => "578",
            Self::Nzd => "554",
            Self::Sek => "752",
            Self::Sgd => "702",
            Self::Usd => "840",
            Self::Zar => "710",
        }
    }

    pub fn number_of_digits_after_decimal_point(self) -> u8 {
        match self {
            Self::Jpy | Self::Krw => 0,
            Self::Aud
            | Self::Brl
            | Self::Cad
            | Self::Chf
            | Self::Cny
            | Self::Dkk
            | Self::Eur
            | Self::Gbp
            | Self::Hkd
            | Self::Inr
            | Self::Mxn
            | Self::Nok
            | Self::Nzd
            | Self::Sek
            | Self::Sgd
            | Self::Usd
            | Self::Zar => 2,
        }
    }
}

/// Card networks the adapter distinguishes when gating brand specific tags.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardBrand {
    Visa,
    #[serde(rename = "master")]
    #[strum(serialize = "master")]
    Mastercard,
    AmericanExpress,
    Discover,
    DinersClub,
    Jcb,
}

impl CardBrand {
    /// Brands that accept a zero amount account verification. The rest are
    /// verified with a one unit authorization that is voided afterwards.
    pub fn allows_zero_auth(self) -> bool {
        match self {
            Self::Visa | Self::Mastercard | Self::AmericanExpress | Self::DinersClub | Self::Jcb => {
                true
            }
            Self::Discover => false,
        }
    }

    /// Brands for which a verification value has to be flagged with `CardSecValInd`.
    pub fn requires_verification_value_indicator(self) -> bool {
        matches!(self, Self::Visa | Self::Discover | Self::DinersClub)
    }

    /// `PymtBrandProgramCode` sent with 3-D Secure data.
    pub fn payment_brand_program_code(self) -> Option<&'static str> {
        match self {
            Self::AmericanExpress => Some("ASK"),
            Self::Discover => Some("DPB"),
            Self::Visa | Self::Mastercard | Self::DinersClub | Self::Jcb => None,
        }
    }
}
