use masking::{PeekInterface, Secret};
use serde::Deserialize;

use crate::{authorization::AuthorizationToken, types::CardBrand};

/// Everything a charge can be drawn from.
#[derive(Clone, Debug)]
pub enum PaymentInstrument {
    Card(Card),
    BankAccount(BankAccount),
    /// A safetech token recovered from an earlier authorization string.
    Token(AuthorizationToken),
    NetworkToken(NetworkTokenCard),
}

impl PaymentInstrument {
    /// Brand used for the brand gated tags. Stored tokens carry the processor's own
    /// brand code, which is never matched against a card network.
    pub fn card_brand(&self) -> Option<CardBrand> {
        match self {
            Self::Card(card) => Some(card.brand),
            Self::NetworkToken(card) => Some(card.brand),
            Self::BankAccount(_) | Self::Token(_) => None,
        }
    }

    pub fn is_bank_account(&self) -> bool {
        matches!(self, Self::BankAccount(_))
    }

    pub fn is_mastercard(&self) -> bool {
        self.card_brand() == Some(CardBrand::Mastercard)
    }

    /// Holder name as printed on the instrument, if it has one.
    pub fn holder_name(&self) -> Option<String> {
        match self {
            Self::Card(card) => card.get_card_holder_name(),
            Self::NetworkToken(card) => card.get_card_holder_name(),
            Self::BankAccount(account) => account.get_account_holder_name(),
            Self::Token(_) => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Card {
    pub card_number: Secret<String>,
    pub card_exp_month: Secret<String>,
    pub card_exp_year: Secret<String>,
    pub card_cvc: Option<Secret<String>>,
    pub brand: CardBrand,
    pub first_name: Option<Secret<String>>,
    pub last_name: Option<Secret<String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NetworkTokenCard {
    pub token_number: Secret<String>,
    pub token_exp_month: Secret<String>,
    pub token_exp_year: Secret<String>,
    pub brand: CardBrand,
    pub cryptogram: Option<Secret<String>>,
    pub eci: Option<String>,
    pub first_name: Option<Secret<String>>,
    pub last_name: Option<Secret<String>>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountType {
    #[default]
    Checking,
    Savings,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountHolderType {
    #[default]
    Personal,
    Business,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BankAccount {
    pub routing_number: Secret<String>,
    pub account_number: Option<Secret<String>>,
    #[serde(default)]
    pub account_type: BankAccountType,
    #[serde(default)]
    pub account_holder_type: AccountHolderType,
    pub first_name: Option<Secret<String>>,
    pub last_name: Option<Secret<String>>,
}

impl BankAccount {
    /// `BankAccountType` wire value.
    pub fn get_account_type_code(&self) -> &'static str {
        match (self.account_holder_type, self.account_type) {
            (AccountHolderType::Business, _) => crate::consts::ecp::BUSINESS_ACCOUNT,
            (AccountHolderType::Personal, BankAccountType::Checking) => "C",
            (AccountHolderType::Personal, BankAccountType::Savings) => "S",
        }
    }

    pub fn get_account_holder_name(&self) -> Option<String> {
        join_name(self.first_name.as_ref(), self.last_name.as_ref())
    }
}

pub trait CardData {
    fn get_card_holder_name(&self) -> Option<String>;
    /// Expiry as sent in `Exp` and `CCExpireDate`.
    fn get_expiry_date_as_mmyy(&self) -> String;
}

impl CardData for Card {
    fn get_card_holder_name(&self) -> Option<String> {
        join_name(self.first_name.as_ref(), self.last_name.as_ref())
    }

    fn get_expiry_date_as_mmyy(&self) -> String {
        expiry_mmyy(self.card_exp_month.peek(), self.card_exp_year.peek())
    }
}

impl CardData for NetworkTokenCard {
    fn get_card_holder_name(&self) -> Option<String> {
        join_name(self.first_name.as_ref(), self.last_name.as_ref())
    }

    fn get_expiry_date_as_mmyy(&self) -> String {
        expiry_mmyy(self.token_exp_month.peek(), self.token_exp_year.peek())
    }
}

fn expiry_mmyy(month: &str, year: &str) -> String {
    let month = format!("{:0>2}", month.trim());
    let year = year.trim();
    let year = year.get(year.len().saturating_sub(2)..).unwrap_or(year);
    format!("{month}{year:0>2}")
}

fn join_name(first: Option<&Secret<String>>, last: Option<&Secret<String>>) -> Option<String> {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(|part| part.peek().trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}
