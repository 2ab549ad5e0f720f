//! Caller supplied options for every operation.
//!
//! A field being `Some` is what gates the matching tag, not the truthiness of its value.
//! Unknown keys are ignored when the options are deserialized.

use masking::Secret;
use serde::Deserialize;

use crate::{
    payment_method_data::PaymentInstrument,
    types::{Currency, MinorUnit},
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OperationOptions {
    pub order_id: Option<String>,
    pub currency: Option<Currency>,
    pub industry_type: Option<String>,
    pub terminal_id: Option<String>,
    pub comments: Option<String>,

    pub billing_address: Option<Address>,
    pub address: Option<Address>,

    pub level_2_data: Option<Level2Data>,
    pub level_3_data: Option<Level3Data>,
    pub line_items: Option<Vec<LineItem>>,

    pub three_d_secure: Option<ThreeDSecureData>,
    pub stored_credential: Option<StoredCredential>,
    pub mit_stored_credential_ind: Option<String>,
    pub mit_msg_type: Option<String>,
    pub mit_submitted_transaction_id: Option<String>,

    pub soft_descriptors: Option<SoftDescriptors>,
    pub recurring_ind: Option<String>,
    pub card_indicators: Option<String>,
    pub payment_action_ind: Option<String>,
    pub token_txn_type: Option<String>,

    pub sca_merchant_initiated: Option<String>,
    pub sca_recurring: Option<String>,
    pub ucaf_collection_indicator: Option<String>,

    /// Electronic check processing.
    pub same_day: Option<String>,
    pub auth_method: Option<String>,
    pub action_code: Option<String>,
    pub payment_delivery: Option<String>,
    pub terminal_city: Option<String>,
    pub terminal_state: Option<String>,
    pub image_reference_number: Option<String>,
    pub company: Option<String>,
    pub phone_type: Option<String>,
    pub phone_number: Option<String>,

    /// Customer profiles.
    pub customer_ref_num: Option<String>,
    pub profile_txn: bool,
    pub customer_profile_order_override_ind: Option<String>,
    pub order_default_description: Option<String>,
    pub order_default_amount: Option<MinorUnit>,
    pub status: Option<String>,
    pub managed_billing: Option<ManagedBilling>,

    pub override_exp_date: Option<String>,
    pub pass_exp_date: bool,
    /// Card expiry remembered by `store`, appended to the authorization string.
    pub exp_date: Option<Secret<String>>,

    pub force_capture: bool,
    pub verify_amount: Option<MinorUnit>,

    /// Trace based retry at the processor.
    pub retry_logic: bool,
    pub trace_number: Option<String>,
    pub use_secondary_url: bool,

    /// Reversal.
    pub transaction_index: Option<String>,
    /// Partial void amount. Absent means the whole authorization is voided.
    pub amount: Option<MinorUnit>,
    pub reversal_retry_number: Option<String>,
    pub online_reversal_ind: Option<String>,

    /// Instrument for a refund. Absent means refund by transaction reference.
    #[serde(skip)]
    pub payment_method: Option<PaymentInstrument>,
}

impl OperationOptions {
    /// Billing address, falling back to the generic one.
    pub fn get_address(&self) -> Option<&Address> {
        self.billing_address.as_ref().or(self.address.as_ref())
    }

    pub fn get_currency(&self) -> Currency {
        self.currency.unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    pub dest_name: Option<String>,
    pub dest_address1: Option<String>,
    pub dest_address2: Option<String>,
    pub dest_city: Option<String>,
    pub dest_state: Option<String>,
    pub dest_zip: Option<String>,
    pub dest_country: Option<String>,
    pub dest_phone: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Level2Data {
    pub tax_indicator: Option<String>,
    pub tax: Option<MinorUnit>,
    pub advice_addendum_1: Option<String>,
    pub advice_addendum_2: Option<String>,
    pub advice_addendum_3: Option<String>,
    pub advice_addendum_4: Option<String>,
    pub purchase_order: Option<String>,
    pub zip: Option<String>,
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub requestor_name: Option<String>,
    pub local_tax_rate: Option<String>,
    pub national_tax: Option<String>,
    pub pst_tax_reg_number: Option<String>,
    pub customer_vat_reg_number: Option<String>,
    pub merchant_vat_reg_number: Option<String>,
    pub total_tax_amount: Option<String>,
    pub commodity_code: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Level3Data {
    pub freight_amount: Option<String>,
    pub duty_amount: Option<String>,
    pub dest_country: Option<String>,
    pub ship_from_zip: Option<String>,
    pub discount_amount: Option<String>,
    pub vat_tax: Option<String>,
    pub vat_rate: Option<String>,
    pub alt_ind: Option<String>,
    pub alt_tax: Option<String>,
    pub invoice_discount_treatment: Option<String>,
    pub tax_treatment: Option<String>,
    pub unique_vat_invoice_ref: Option<String>,
    pub ship_vat_rate: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub desc: Option<String>,
    pub prod_cd: Option<String>,
    pub qty: Option<String>,
    pub u_o_m: Option<String>,
    pub tax_amt: Option<String>,
    pub tax_rate: Option<String>,
    pub line_tot: Option<String>,
    pub disc: Option<String>,
    pub comm_cd: Option<String>,
    pub unit_cost: Option<String>,
    pub gross_net: Option<String>,
    pub tax_type: Option<String>,
    pub disc_ind: Option<String>,
    pub debit_ind: Option<String>,
}

impl LineItem {
    /// Detail tags in wire order.
    pub fn detail_fields(&self) -> [(&'static str, Option<&str>); 14] {
        [
            ("PC3DtlDesc", self.desc.as_deref()),
            ("PC3DtlProdCd", self.prod_cd.as_deref()),
            ("PC3DtlQty", self.qty.as_deref()),
            ("PC3DtlUOM", self.u_o_m.as_deref()),
            ("PC3DtlTaxAmt", self.tax_amt.as_deref()),
            ("PC3DtlTaxRate", self.tax_rate.as_deref()),
            ("PC3Dtllinetot", self.line_tot.as_deref()),
            ("PC3DtlDisc", self.disc.as_deref()),
            ("PC3DtlCommCd", self.comm_cd.as_deref()),
            ("PC3DtlUnitCost", self.unit_cost.as_deref()),
            ("PC3DtlGrossNet", self.gross_net.as_deref()),
            ("PC3DtlTaxType", self.tax_type.as_deref()),
            ("PC3DtlDiscInd", self.disc_ind.as_deref()),
            ("PC3DtlDebitInd", self.debit_ind.as_deref()),
        ]
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThreeDSecureData {
    pub eci: Option<String>,
    pub cavv: Option<Secret<String>>,
    pub xid: Option<String>,
    pub version: Option<String>,
    pub ds_transaction_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredCredentialInitiator {
    #[serde(alias = "customer")]
    Cardholder,
    Merchant,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredCredentialReason {
    Recurring,
    Installment,
    Unscheduled,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoredCredential {
    pub initial_transaction: Option<bool>,
    pub initiator: Option<StoredCredentialInitiator>,
    pub reason_type: Option<StoredCredentialReason>,
    pub network_transaction_id: Option<String>,
}

impl StoredCredential {
    pub fn is_empty(&self) -> bool {
        self.initial_transaction.is_none()
            && self.initiator.is_none()
            && self.reason_type.is_none()
            && self.network_transaction_id.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SoftDescriptors {
    pub merchant_name: Option<String>,
    pub product_description: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_phone: Option<String>,
    pub merchant_url: Option<String>,
    pub merchant_email: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManagedBilling {
    #[serde(rename = "type")]
    pub billing_type: Option<String>,
    pub order_id_generation_method: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub no_end_date_flag: Option<String>,
    pub max_billings: Option<String>,
    pub frequency: Option<String>,
    pub deferred_bill_date: Option<String>,
    pub max_dollar_value: Option<String>,
    pub max_billing_days: Option<String>,
    pub max_transactions: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let options: OperationOptions = serde_json::from_value(serde_json::json!({
            "order_id": "1",
            "currency": "USD",
            "not_an_orbital_option": true,
            "three_d_secure": { "eci": "5", "cavv": "AAAA", "extra": 1 },
            "stored_credential": { "initiator": "customer", "reason_type": "unscheduled" },
            "line_items": [{ "desc": "widget", "u_o_m": "EA" }],
        }))
        .unwrap();
        assert_eq!(options.order_id.as_deref(), Some("1"));
        assert_eq!(options.get_currency(), Currency::Usd);
        assert_eq!(
            options.stored_credential.as_ref().and_then(|s| s.initiator),
            Some(StoredCredentialInitiator::Cardholder)
        );
        let line_items = options.line_items.unwrap();
        assert_eq!(line_items.len(), 1);
        assert_eq!(line_items[0].detail_fields()[3], ("PC3DtlUOM", Some("EA")));
    }

    #[test]
    fn billing_address_wins_over_address() {
        let options = OperationOptions {
            address: Some(Address {
                zip: Some("1".to_string()),
                ..Default::default()
            }),
            billing_address: Some(Address {
                zip: Some("2".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(options.get_address().and_then(|a| a.zip.as_deref()), Some("2"));
        assert_eq!(OperationOptions::default().get_currency(), Currency::Cad);
    }
}
