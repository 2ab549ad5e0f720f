use error_stack::report;
use masking::PeekInterface;

use super::{common, OrbitalRouterData};
use crate::{
    authorization::split_reference,
    consts,
    document::{NodeList, OperationKind, RequestDocument},
    errors::{ConnectorError, CustomResult},
    formatter::{
        address_field, byte_limit, format_address_field, format_order_id, format_phone,
        truncate_chars, BILL_TO_PHONE_MAX_DIGITS,
    },
    payment_method_data::{BankAccount, CardData, NetworkTokenCard, PaymentInstrument},
    request_types::{
        Address, OperationOptions, StoredCredentialInitiator, StoredCredentialReason,
        ThreeDSecureData,
    },
    types::CardBrand,
};

const AVS_NAME_MAX_LENGTH: usize = 30;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewOrderFlow<'a> {
    /// Authorization or sale, carrying its `MessageType` (`A`, `AC` or `FC`).
    Payment(&'static str),
    /// Refund of an earlier transaction. Without an instrument the refund is matched
    /// by the transaction reference of `authorization`.
    Refund { authorization: Option<&'a str> },
    /// Stand-alone credit to an instrument.
    Credit,
}

impl NewOrderFlow<'_> {
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Payment(message_type) => message_type,
            Self::Refund { .. } | Self::Credit => consts::message_type::REFUND,
        }
    }
}

#[derive(Debug)]
pub struct NewOrderData<'a> {
    pub flow: NewOrderFlow<'a>,
    pub instrument: Option<&'a PaymentInstrument>,
    pub options: &'a OperationOptions,
}

impl NewOrderData<'_> {
    fn brand(&self) -> Option<CardBrand> {
        self.instrument.and_then(PaymentInstrument::card_brand)
    }

    fn has_brand(&self, brand: CardBrand) -> bool {
        self.brand() == Some(brand)
    }

    fn three_d_secure(&self) -> Option<&ThreeDSecureData> {
        self.options.three_d_secure.as_ref()
    }

    fn bank_account(&self) -> Option<&BankAccount> {
        match self.instrument {
            Some(PaymentInstrument::BankAccount(account)) => Some(account),
            _ => None,
        }
    }

    fn network_token(&self) -> Option<&NetworkTokenCard> {
        match self.instrument {
            Some(PaymentInstrument::NetworkToken(card)) => Some(card),
            _ => None,
        }
    }

    fn industry_type(&self) -> &str {
        self.options
            .industry_type
            .as_deref()
            .unwrap_or(consts::industry_type::ECOMMERCE)
    }
}

type NewOrderRouterData<'a, 'b> = OrbitalRouterData<'a, NewOrderData<'b>>;

/// One optional run of tags. Blocks are evaluated in table order and every block
/// only ever appends.
struct ConditionalBlock {
    name: &'static str,
    applies: fn(&NewOrderRouterData<'_, '_>) -> bool,
    emit: fn(&NewOrderRouterData<'_, '_>, &mut NodeList) -> CustomResult<(), ConnectorError>,
}

const NEW_ORDER_BLOCKS: &[ConditionalBlock] = &[
    ConditionalBlock {
        name: "payment_source",
        applies: always,
        emit: add_payment_source,
    },
    ConditionalBlock {
        name: "address",
        applies: is_payment_with_address,
        emit: add_address,
    },
    ConditionalBlock {
        name: "customer_data",
        applies: is_payment_with_customer_profiles,
        emit: add_customer_data,
    },
    ConditionalBlock {
        name: "refund_customer_ref_num",
        applies: is_profile_refund,
        emit: add_refund_customer_ref_num,
    },
    ConditionalBlock {
        name: "eci",
        applies: always,
        emit: add_eci,
    },
    ConditionalBlock {
        name: "cavv",
        applies: has_visa_three_d_secure,
        emit: add_cavv,
    },
    ConditionalBlock {
        name: "xid",
        applies: has_visa_three_d_secure,
        emit: add_xid,
    },
    ConditionalBlock {
        name: "order",
        applies: always,
        emit: add_order_id_and_amount,
    },
    ConditionalBlock {
        name: "level_2_tax",
        applies: always,
        emit: |item, body| {
            common::add_level2_tax(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "level_2_advice_addendum",
        applies: always,
        emit: |item, body| {
            common::add_level2_advice_addendum(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "aav",
        applies: has_mastercard_three_d_secure,
        emit: add_aav,
    },
    ConditionalBlock {
        name: "soft_descriptors",
        applies: always,
        emit: add_soft_descriptors,
    },
    ConditionalBlock {
        name: "recurring_ind",
        applies: always,
        emit: add_recurring_ind,
    },
    ConditionalBlock {
        name: "refund_tx_ref_num",
        applies: is_refund_by_reference,
        emit: add_refund_tx_ref_num,
    },
    ConditionalBlock {
        name: "level_2_purchase",
        applies: always,
        emit: |item, body| {
            common::add_level2_purchase(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "level_3_purchase",
        applies: always,
        emit: |item, body| {
            common::add_level3_purchase(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "level_3_tax",
        applies: always,
        emit: |item, body| {
            common::add_level3_tax(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "line_items",
        applies: always,
        emit: |item, body| common::add_line_items(body, item.router_data.options),
    },
    ConditionalBlock {
        name: "indicators",
        applies: always,
        emit: add_card_and_payment_action_indicators,
    },
    ConditionalBlock {
        name: "dpan_ind",
        applies: is_network_token_outside_recurring,
        emit: |_, body| {
            body.tag("DPANInd", "Y");
            Ok(())
        },
    },
    ConditionalBlock {
        name: "aevv",
        applies: has_amex_three_d_secure,
        emit: add_aevv,
    },
    ConditionalBlock {
        name: "level_2_card_and_more_tax",
        applies: always,
        emit: |item, body| {
            common::add_level2_card_and_more_tax(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "digital_token_cryptogram",
        applies: carries_digital_token_cryptogram,
        emit: add_digital_token_cryptogram,
    },
    ConditionalBlock {
        name: "ecp_same_day",
        applies: is_same_day_check,
        emit: |item, body| {
            body.optional_tag("ECPSameDayInd", item.router_data.options.same_day.as_deref());
            Ok(())
        },
    },
    ConditionalBlock {
        name: "ecp_details",
        applies: is_check,
        emit: add_ecp_details,
    },
    ConditionalBlock {
        name: "stored_credentials",
        applies: has_stored_credentials,
        emit: add_stored_credentials,
    },
    ConditionalBlock {
        name: "payment_brand_program_code",
        applies: has_three_d_secure,
        emit: add_payment_brand_program_code,
    },
    ConditionalBlock {
        name: "token_txn_type",
        applies: always,
        emit: |item, body| {
            body.optional_tag("TokenTxnType", item.router_data.options.token_txn_type.as_deref());
            Ok(())
        },
    },
    ConditionalBlock {
        name: "mastercard_fields",
        applies: is_mastercard,
        emit: add_mastercard_fields,
    },
    ConditionalBlock {
        name: "card_commodity_code",
        applies: always,
        emit: |item, body| {
            common::add_card_commodity_code(body, item.router_data.options);
            Ok(())
        },
    },
    ConditionalBlock {
        name: "level_3_vat",
        applies: always,
        emit: |item, body| {
            common::add_level3_vat_fields(body, item.router_data.options);
            Ok(())
        },
    },
];

impl TryFrom<&NewOrderRouterData<'_, '_>> for RequestDocument {
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(item: &NewOrderRouterData<'_, '_>) -> Result<Self, Self::Error> {
        validate_new_order(&item.router_data)?;

        let options = item.router_data.options;
        let mut body = NodeList::new();
        common::add_xml_credentials(&mut body, item.settings);
        body.tag("IndustryType", item.router_data.industry_type());
        body.tag("MessageType", item.router_data.flow.message_type());
        common::add_bin_merchant_and_terminal(&mut body, item.settings, options);

        for block in NEW_ORDER_BLOCKS {
            if (block.applies)(item) {
                (block.emit)(item, &mut body).map_err(|error| {
                    error.attach_printable(format!("while appending the {} block", block.name))
                })?;
            }
        }
        Ok(Self::new(OperationKind::NewOrder, body))
    }
}

/// Option checks that have to pass before anything is composed.
fn validate_new_order(data: &NewOrderData<'_>) -> CustomResult<(), ConnectorError> {
    if data.options.order_id.is_none() {
        return Err(report!(ConnectorError::MissingRequiredOption {
            field_name: "order_id"
        }));
    }
    if let Some(recurring_ind) = data.options.recurring_ind.as_deref() {
        if !matches!(recurring_ind, "RF" | "RS") {
            return Err(report!(ConnectorError::InvalidOptionValue {
                field_name: "recurring_ind",
                reason: r#"RecurringInd must be set to either "RF" or "RS""#.to_string(),
            }));
        }
    }
    if let Some(account) = data.bank_account() {
        if requires_check_serial_number(data.options) && account.account_number.is_none() {
            return Err(report!(ConnectorError::MissingRequiredOption {
                field_name: "account_number"
            }));
        }
    }
    Ok(())
}

fn requires_check_serial_number(options: &OperationOptions) -> bool {
    matches!(options.auth_method.as_deref(), Some("A" | "P"))
}

fn always(_: &NewOrderRouterData<'_, '_>) -> bool {
    true
}

fn is_payment_with_address(item: &NewOrderRouterData<'_, '_>) -> bool {
    matches!(item.router_data.flow, NewOrderFlow::Payment(_))
        && item.router_data.options.get_address().is_some()
}

fn is_payment_with_customer_profiles(item: &NewOrderRouterData<'_, '_>) -> bool {
    matches!(item.router_data.flow, NewOrderFlow::Payment(_)) && item.settings.customer_profiles
}

fn is_profile_refund(item: &NewOrderRouterData<'_, '_>) -> bool {
    matches!(item.router_data.flow, NewOrderFlow::Refund { .. })
        && item.settings.customer_profiles
        && item.router_data.options.profile_txn
}

fn is_refund_by_reference(item: &NewOrderRouterData<'_, '_>) -> bool {
    matches!(
        item.router_data.flow,
        NewOrderFlow::Refund {
            authorization: Some(_)
        }
    ) && item.router_data.instrument.is_none()
}

fn has_three_d_secure(item: &NewOrderRouterData<'_, '_>) -> bool {
    item.router_data.three_d_secure().is_some()
}

fn has_visa_three_d_secure(item: &NewOrderRouterData<'_, '_>) -> bool {
    has_three_d_secure(item) && item.router_data.has_brand(CardBrand::Visa)
}

fn has_mastercard_three_d_secure(item: &NewOrderRouterData<'_, '_>) -> bool {
    has_three_d_secure(item) && item.router_data.has_brand(CardBrand::Mastercard)
}

fn has_amex_three_d_secure(item: &NewOrderRouterData<'_, '_>) -> bool {
    has_three_d_secure(item) && item.router_data.has_brand(CardBrand::AmericanExpress)
}

fn is_network_token_outside_recurring(item: &NewOrderRouterData<'_, '_>) -> bool {
    item.router_data.network_token().is_some()
        && item.router_data.industry_type() != consts::industry_type::RECURRING_PAYMENT
}

fn carries_digital_token_cryptogram(item: &NewOrderRouterData<'_, '_>) -> bool {
    item.router_data.network_token().is_some()
        || (has_three_d_secure(item) && item.router_data.has_brand(CardBrand::Discover))
}

fn is_check(item: &NewOrderRouterData<'_, '_>) -> bool {
    item.router_data.bank_account().is_some()
}

fn is_same_day_check(item: &NewOrderRouterData<'_, '_>) -> bool {
    is_check(item) && item.router_data.options.same_day.is_some()
}

fn has_stored_credentials(item: &NewOrderRouterData<'_, '_>) -> bool {
    let options = item.router_data.options;
    !is_check(item)
        && (options.mit_stored_credential_ind.as_deref() == Some("Y")
            || options
                .stored_credential
                .as_ref()
                .is_some_and(|stored| !stored.is_empty()))
}

fn is_mastercard(item: &NewOrderRouterData<'_, '_>) -> bool {
    item.router_data
        .instrument
        .is_some_and(PaymentInstrument::is_mastercard)
}

fn add_payment_source(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    let currency = options.get_currency();
    match item.router_data.instrument {
        Some(PaymentInstrument::Card(card)) => {
            body.secret_tag("AccountNum", card.card_number.peek().clone());
            body.tag("Exp", expiry_date(options, card.get_expiry_date_as_mmyy()));
            common::add_currency_fields(body, currency);
            let verification_value = card
                .card_cvc
                .as_ref()
                .map(|cvc| cvc.peek().trim())
                .filter(|cvc| !cvc.is_empty());
            if let Some(verification_value) = verification_value {
                if card.brand.requires_verification_value_indicator() {
                    body.tag("CardSecValInd", "1");
                }
                body.secret_tag("CardSecVal", verification_value);
            }
        }
        Some(PaymentInstrument::NetworkToken(card)) => {
            body.secret_tag("AccountNum", card.token_number.peek().clone());
            body.tag("Exp", expiry_date(options, card.get_expiry_date_as_mmyy()));
            common::add_currency_fields(body, currency);
        }
        Some(PaymentInstrument::Token(token)) => {
            body.nullable_tag("CardBrand", token.card_brand.as_deref());
            body.nullable_secret_tag(
                "AccountNum",
                token.stored_token.as_ref().map(|token| token.peek().clone()),
            );
            if options.pass_exp_date {
                if let Some(exp_date) = token.exp_date.as_ref() {
                    body.tag("Exp", exp_date.peek().clone());
                }
            }
            common::add_currency_fields(body, currency);
        }
        Some(PaymentInstrument::BankAccount(account)) => add_echeck(body, account, options),
        None => common::add_currency_fields(body, currency),
    }
    Ok(())
}

fn expiry_date(options: &OperationOptions, mmyy: String) -> String {
    options.override_exp_date.clone().unwrap_or(mmyy)
}

fn add_echeck(body: &mut NodeList, account: &BankAccount, options: &OperationOptions) {
    body.tag("CardBrand", consts::ecp::CARD_BRAND);
    common::add_currency_fields(body, options.get_currency());
    body.secret_tag("BCRtNum", account.routing_number.peek().clone());
    if let Some(account_number) = account.account_number.as_ref() {
        body.secret_tag("CheckDDA", account_number.peek().clone());
    }
    body.tag("BankAccountType", account.get_account_type_code());
    body.optional_tag("ECPAuthMethod", options.auth_method.as_deref());
    body.tag(
        "BankPmtDelv",
        options
            .payment_delivery
            .as_deref()
            .unwrap_or(consts::ecp::DEFAULT_PAYMENT_DELIVERY),
    );
    if options.get_address().is_none() {
        body.nullable_tag(
            "AVSname",
            account
                .get_account_holder_name()
                .map(|name| truncate_chars(&name, AVS_NAME_MAX_LENGTH)),
        );
    }
}

fn add_address(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    let Some(address) = options.get_address() else {
        return Ok(());
    };
    let country = address.country.as_deref();
    let avs_supported = common::is_avs_supported_or_blank(country);

    if avs_supported {
        body.tag("AVSzip", address_field(address.zip.as_deref(), 10));
        body.tag("AVSaddress1", address_field(address.address1.as_deref(), 30));
        body.tag("AVSaddress2", address_field(address.address2.as_deref(), 30));
        body.tag("AVScity", address_field(address.city.as_deref(), 20));
        body.tag("AVSstate", address_field(address.state.as_deref(), 2));
        body.nullable_tag(
            "AVSphoneNum",
            address
                .phone
                .as_deref()
                .map(|phone| format_phone(phone, Some(BILL_TO_PHONE_MAX_DIGITS))),
        );
    }

    body.nullable_tag("AVSname", billing_name(item.router_data.instrument, options));
    let country_code = common::filter_unsupported_countries(country);
    body.tag(
        "AVScountryCode",
        byte_limit(format_address_field(Some(&country_code)).unwrap_or_default(), 2),
    );

    // Destination fields are read positionally after AVScountryCode.
    if avs_supported {
        add_destination_address(body, address);
    }
    Ok(())
}

fn add_destination_address(body: &mut NodeList, address: &Address) {
    if address.dest_zip.is_none() {
        return;
    }
    body.tag("AVSDestzip", address_field(address.dest_zip.as_deref(), 10));
    body.tag("AVSDestaddress1", address_field(address.dest_address1.as_deref(), 30));
    body.tag("AVSDestaddress2", address_field(address.dest_address2.as_deref(), 30));
    body.tag("AVSDestcity", address_field(address.dest_city.as_deref(), 20));
    body.tag("AVSDeststate", address_field(address.dest_state.as_deref(), 2));
    body.nullable_tag(
        "AVSDestphoneNum",
        address
            .dest_phone
            .as_deref()
            .map(|phone| format_phone(phone, Some(BILL_TO_PHONE_MAX_DIGITS))),
    );
    body.tag(
        "AVSDestname",
        byte_limit(address.dest_name.as_deref().unwrap_or_default(), 30),
    );
    body.tag(
        "AVSDestcountryCode",
        common::filter_unsupported_countries(address.dest_country.as_deref()),
    );
}

/// Holder name on the instrument, else the billing address name.
fn billing_name(instrument: Option<&PaymentInstrument>, options: &OperationOptions) -> Option<String> {
    instrument
        .and_then(PaymentInstrument::holder_name)
        .or_else(|| {
            options
                .billing_address
                .as_ref()
                .and_then(|address| address.name.clone())
                .filter(|name| !name.trim().is_empty())
        })
        .map(|name| truncate_chars(&name, AVS_NAME_MAX_LENGTH))
}

fn add_customer_data(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    body.optional_tag("CustomerRefNum", options.customer_ref_num.as_deref());

    if !options.profile_txn {
        // A profile transaction by reference number has nothing to create a profile from.
        let by_reference_only =
            options.customer_ref_num.is_some() && item.router_data.instrument.is_none();
        if !by_reference_only {
            body.tag("CustomerProfileFromOrderInd", profile_number(options));
        }
        body.tag(
            "CustomerProfileOrderOverrideInd",
            options
                .customer_profile_order_override_ind
                .as_deref()
                .unwrap_or(consts::profile::NO_MAPPING_TO_ORDER_DATA),
        );
    }
    common::add_managed_billing(body, options.managed_billing.as_ref());
    Ok(())
}

pub(super) fn profile_number(options: &OperationOptions) -> &'static str {
    if options.customer_ref_num.is_some() {
        consts::profile::USE_CUSTOMER_REF_NUM
    } else {
        consts::profile::AUTO_GENERATE
    }
}

fn add_refund_customer_ref_num(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    body.nullable_tag(
        "CustomerRefNum",
        item.router_data.options.customer_ref_num.as_deref(),
    );
    Ok(())
}

fn add_eci(item: &NewOrderRouterData<'_, '_>, body: &mut NodeList) -> CustomResult<(), ConnectorError> {
    let eci = match item.router_data.three_d_secure() {
        Some(three_d_secure) => three_d_secure.eci.as_deref(),
        None => item
            .router_data
            .network_token()
            .and_then(|card| card.eci.as_deref()),
    };
    body.optional_tag("AuthenticationECIInd", eci);
    Ok(())
}

fn cavv(item: &NewOrderRouterData<'_, '_>) -> Option<String> {
    item.router_data
        .three_d_secure()
        .and_then(|three_d_secure| three_d_secure.cavv.as_ref())
        .map(|cavv| cavv.peek().clone())
}

fn add_cavv(item: &NewOrderRouterData<'_, '_>, body: &mut NodeList) -> CustomResult<(), ConnectorError> {
    body.nullable_secret_tag("CAVV", cavv(item));
    Ok(())
}

fn add_xid(item: &NewOrderRouterData<'_, '_>, body: &mut NodeList) -> CustomResult<(), ConnectorError> {
    body.optional_tag(
        "XID",
        item.router_data
            .three_d_secure()
            .and_then(|three_d_secure| three_d_secure.xid.as_deref()),
    );
    Ok(())
}

fn add_aav(item: &NewOrderRouterData<'_, '_>, body: &mut NodeList) -> CustomResult<(), ConnectorError> {
    body.nullable_secret_tag("AAV", cavv(item));
    Ok(())
}

fn add_aevv(item: &NewOrderRouterData<'_, '_>, body: &mut NodeList) -> CustomResult<(), ConnectorError> {
    body.nullable_secret_tag("AEVV", cavv(item));
    Ok(())
}

fn add_order_id_and_amount(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    let order_id = options.order_id.as_deref().ok_or_else(|| {
        report!(ConnectorError::MissingRequiredOption {
            field_name: "order_id"
        })
    })?;
    body.tag("OrderID", format_order_id(order_id));
    body.tag("Amount", item.amount.to_string());
    body.optional_tag("Comments", options.comments.as_deref());
    Ok(())
}

fn add_soft_descriptors(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let Some(descriptors) = item.router_data.options.soft_descriptors.as_ref() else {
        return Ok(());
    };
    body.optional_tag("SDMerchantName", descriptors.merchant_name.as_deref());
    body.optional_tag("SDProductDescription", descriptors.product_description.as_deref());
    body.optional_tag("SDMerchantCity", descriptors.merchant_city.as_deref());
    body.optional_tag("SDMerchantPhone", descriptors.merchant_phone.as_deref());
    body.optional_tag("SDMerchantURL", descriptors.merchant_url.as_deref());
    body.optional_tag("SDMerchantEmail", descriptors.merchant_email.as_deref());
    Ok(())
}

/// `RF` first, `RS` subsequent recurring transaction.
fn add_recurring_ind(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    body.optional_tag("RecurringInd", item.router_data.options.recurring_ind.as_deref());
    Ok(())
}

fn add_refund_tx_ref_num(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    if let NewOrderFlow::Refund {
        authorization: Some(authorization),
    } = item.router_data.flow
    {
        let (tx_ref_num, _) = split_reference(authorization)?;
        body.tag("TxRefNum", tx_ref_num);
    }
    Ok(())
}

fn add_card_and_payment_action_indicators(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    body.optional_tag("CardIndicators", options.card_indicators.as_deref());
    body.optional_tag("PaymentActionInd", options.payment_action_ind.as_deref());
    Ok(())
}

fn add_digital_token_cryptogram(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let cryptogram = if has_three_d_secure(item) && item.router_data.has_brand(CardBrand::Discover) {
        cavv(item)
    } else {
        item.router_data
            .network_token()
            .and_then(|card| card.cryptogram.as_ref())
            .map(|cryptogram| cryptogram.peek().clone())
    };
    body.nullable_secret_tag("DigitalTokenCryptogram", cryptogram);
    Ok(())
}

fn add_ecp_details(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    let account = item.router_data.bank_account().ok_or_else(|| {
        report!(ConnectorError::MissingRequiredOption {
            field_name: "bank_account"
        })
    })?;
    let account_number = account
        .account_number
        .as_ref()
        .map(|account_number| account_number.peek().clone());

    body.optional_tag("ECPActionCode", options.action_code.as_deref());
    if requires_check_serial_number(options) {
        body.nullable_secret_tag("ECPCheckSerialNumber", account_number.clone());
    }
    if options.auth_method.as_deref() == Some("P") {
        body.optional_tag("ECPTerminalCity", options.terminal_city.as_deref());
        body.optional_tag("ECPTerminalState", options.terminal_state.as_deref());
        body.optional_tag("ECPImageReferenceNumber", options.image_reference_number.as_deref());
    }
    let is_ews_action = options
        .action_code
        .as_deref()
        .is_some_and(|action_code| consts::ecp::EWS_ACTION_CODES.contains(&action_code));
    if is_ews_action {
        add_ews_details(body, account, account_number, options);
    }
    Ok(())
}

/// Early Warning System verification of the account holder.
fn add_ews_details(
    body: &mut NodeList,
    account: &BankAccount,
    account_number: Option<String>,
    options: &OperationOptions,
) {
    let first_name = account
        .first_name
        .as_ref()
        .map(|name| name.peek().clone())
        .unwrap_or_default();
    let last_name = account
        .last_name
        .as_ref()
        .map(|name| name.peek().clone())
        .unwrap_or_default();
    let mut names = first_name.split_whitespace();
    body.nullable_tag("EWSFirstName", names.next());
    body.tag("EWSMiddleName", names.collect::<Vec<_>>().join(" "));
    body.tag("EWSLastName", last_name.clone());
    if first_name.trim().is_empty() && last_name.trim().is_empty() {
        body.nullable_tag("EWSBusinessName", options.company.as_deref());
    }

    if let Some(address) = options.get_address() {
        body.tag("EWSAddressLine1", address_field(address.address1.as_deref(), 30));
        body.tag("EWSAddressLine2", address_field(address.address2.as_deref(), 30));
        body.tag("EWSCity", address_field(address.city.as_deref(), 20));
        body.tag("EWSState", address_field(address.state.as_deref(), 2));
        body.tag("EWSZip", address_field(address.zip.as_deref(), 10));
    }

    body.nullable_tag("EWSPhoneType", options.phone_type.as_deref());
    body.nullable_tag("EWSPhoneNumber", options.phone_number.as_deref());
    if options.auth_method.as_deref() != Some("I") {
        body.nullable_secret_tag("EWSCheckSerialNumber", account_number);
    }
}

fn add_stored_credentials(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    body.optional_tag("MITMsgType", mit_msg_type(options));
    body.tag("MITStoredCredentialInd", "Y");

    let network_transaction_id = options.stored_credential.as_ref().and_then(|stored| {
        (stored.initiator == Some(StoredCredentialInitiator::Merchant))
            .then_some(stored.network_transaction_id.as_deref())
            .flatten()
    });
    body.optional_tag(
        "MITSubmittedTransactionID",
        options
            .mit_submitted_transaction_id
            .as_deref()
            .or(network_transaction_id),
    );
    Ok(())
}

fn mit_msg_type(options: &OperationOptions) -> Option<String> {
    if let Some(msg_type) = options.mit_msg_type.as_ref() {
        return Some(msg_type.clone());
    }
    let stored = options.stored_credential.as_ref()?;
    if stored.initial_transaction == Some(true) {
        return Some("CSTO".to_string());
    }
    let initiator = match stored.initiator? {
        StoredCredentialInitiator::Cardholder => "C",
        StoredCredentialInitiator::Merchant => "M",
    };
    let reason = match stored.reason_type? {
        StoredCredentialReason::Recurring => "REC",
        StoredCredentialReason::Installment => "INS",
        StoredCredentialReason::Unscheduled => "USE",
    };
    Some(format!("{initiator}{reason}"))
}

fn add_payment_brand_program_code(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    body.optional_tag(
        "PymtBrandProgramCode",
        item.router_data
            .brand()
            .and_then(CardBrand::payment_brand_program_code),
    );
    Ok(())
}

fn add_mastercard_fields(
    item: &NewOrderRouterData<'_, '_>,
    body: &mut NodeList,
) -> CustomResult<(), ConnectorError> {
    let options = item.router_data.options;
    let three_d_secure = item.router_data.three_d_secure();
    let eci = three_d_secure.and_then(|three_d_secure| three_d_secure.eci.as_deref());

    if eci == Some(consts::MASTERCARD_SCA_ECI) {
        body.optional_tag(
            "SCAMerchantInitiatedTransaction",
            options.sca_merchant_initiated.as_deref(),
        );
        body.optional_tag("SCARecurringPayment", options.sca_recurring.as_deref());
    }
    body.optional_tag(
        "MCProgramProtocol",
        three_d_secure
            .and_then(|three_d_secure| three_d_secure.version.as_deref())
            .and_then(|version| version.chars().next())
            .map(String::from),
    );
    body.optional_tag(
        "MCDirectoryTransID",
        three_d_secure.and_then(|three_d_secure| three_d_secure.ds_transaction_id.as_deref()),
    );
    if eci.is_some_and(|eci| consts::MASTERCARD_UCAF_ECIS.contains(&eci)) {
        body.optional_tag("UCAFInd", options.ucaf_collection_indicator.as_deref());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use masking::Secret;

    use super::*;
    use crate::{
        configs::OrbitalSettings,
        payment_method_data::{AccountHolderType, BankAccountType, Card},
        request_types::{Level2Data, StoredCredential},
        types::MinorUnit,
    };

    fn settings() -> OrbitalSettings {
        OrbitalSettings {
            merchant_id: Secret::new("041756".to_string()),
            login: Some(Secret::new("login".to_string())),
            password: Some(Secret::new("password".to_string())),
            ..Default::default()
        }
    }

    fn card(brand: CardBrand) -> PaymentInstrument {
        PaymentInstrument::Card(Card {
            card_number: Secret::new("4112344112344113".to_string()),
            card_exp_month: Secret::new("9".to_string()),
            card_exp_year: Secret::new("2029".to_string()),
            card_cvc: Some(Secret::new("123".to_string())),
            brand,
            first_name: Some(Secret::new("Longbob".to_string())),
            last_name: Some(Secret::new("Longsen".to_string())),
        })
    }

    fn check(account_number: Option<&str>) -> PaymentInstrument {
        PaymentInstrument::BankAccount(BankAccount {
            routing_number: Secret::new("072403004".to_string()),
            account_number: account_number.map(|number| Secret::new(number.to_string())),
            account_type: BankAccountType::Checking,
            account_holder_type: AccountHolderType::Personal,
            first_name: Some(Secret::new("Jim Bob".to_string())),
            last_name: Some(Secret::new("Smith".to_string())),
        })
    }

    fn options() -> OperationOptions {
        OperationOptions {
            order_id: Some("1".to_string()),
            ..Default::default()
        }
    }

    fn compose(
        settings: &OrbitalSettings,
        flow: NewOrderFlow<'_>,
        instrument: Option<&PaymentInstrument>,
        options: &OperationOptions,
    ) -> CustomResult<RequestDocument, ConnectorError> {
        let router_data = OrbitalRouterData::from((
            settings,
            MinorUnit::new(100),
            NewOrderData {
                flow,
                instrument,
                options,
            },
        ));
        RequestDocument::try_from(&router_data)
    }

    #[test]
    fn head_is_credentials_industry_message_and_routing() {
        let instrument = card(CardBrand::Visa);
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options()).unwrap();
        let names = document.body.names();
        assert_eq!(
            names.get(..7).unwrap(),
            [
                "OrbitalConnectionUsername",
                "OrbitalConnectionPassword",
                "IndustryType",
                "MessageType",
                "BIN",
                "MerchantID",
                "TerminalID",
            ]
        );
        assert_eq!(document.body.find("BIN").and_then(|n| n.text()), Some("000001"));
        assert_eq!(document.body.find("TerminalID").and_then(|n| n.text()), Some("001"));
        assert_eq!(document.body.find("Exp").and_then(|n| n.text()), Some("0929"));
        assert_eq!(document.body.find("CardSecValInd").and_then(|n| n.text()), Some("1"));
        assert_eq!(document.body.find("CurrencyCode").and_then(|n| n.text()), Some("124"));
    }

    #[test]
    fn ip_authentication_omits_credentials() {
        let settings = OrbitalSettings {
            ip_authentication: true,
            ..settings()
        };
        let instrument = card(CardBrand::Visa);
        let document = compose(&settings, NewOrderFlow::Payment("AC"), Some(&instrument), &options()).unwrap();
        assert!(document.body.find("OrbitalConnectionUsername").is_none());
        assert_eq!(document.body.names().first(), Some(&"IndustryType"));
    }

    #[test]
    fn missing_order_id_fails_before_composition() {
        let instrument = card(CardBrand::Visa);
        let error = compose(
            &settings(),
            NewOrderFlow::Payment("A"),
            Some(&instrument),
            &OperationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredOption {
                field_name: "order_id"
            }
        );
    }

    #[test]
    fn recurring_indicator_is_validated() {
        let instrument = card(CardBrand::Visa);
        let bad = OperationOptions {
            recurring_ind: Some("XX".to_string()),
            ..options()
        };
        let error = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &bad).unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::InvalidOptionValue {
                field_name: "recurring_ind",
                ..
            }
        ));

        let good = OperationOptions {
            recurring_ind: Some("RS".to_string()),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &good).unwrap();
        assert_eq!(document.body.find("RecurringInd").and_then(|n| n.text()), Some("RS"));
    }

    #[test]
    fn mastercard_verification_value_has_no_indicator() {
        let instrument = card(CardBrand::Mastercard);
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options()).unwrap();
        assert!(document.body.find("CardSecValInd").is_none());
        assert_eq!(document.body.find("CardSecVal").and_then(|n| n.text()), Some("123"));
    }

    #[test]
    fn mastercard_sca_fields_need_frictionless_eci() {
        let instrument = card(CardBrand::Mastercard);
        let mut options = OperationOptions {
            sca_merchant_initiated: Some("Y".to_string()),
            sca_recurring: Some("Y".to_string()),
            ucaf_collection_indicator: Some("4".to_string()),
            three_d_secure: Some(ThreeDSecureData {
                eci: Some("2".to_string()),
                cavv: Some(Secret::new("AAAEEEDDDSSSAAA2243234".to_string())),
                version: Some("2.2.0".to_string()),
                ds_transaction_id: Some("97267598FAE648F28083C23433990FBC".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        assert!(document.body.find("SCAMerchantInitiatedTransaction").is_none());
        assert!(document.body.find("SCARecurringPayment").is_none());
        assert!(document.body.find("UCAFInd").is_none());
        assert_eq!(document.body.find("MCProgramProtocol").and_then(|n| n.text()), Some("2"));
        assert!(document.body.find("AAV").is_some());
        assert!(document.body.find("CAVV").is_none());

        if let Some(three_d_secure) = options.three_d_secure.as_mut() {
            three_d_secure.eci = Some("7".to_string());
        }
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        let names = document.body.names();
        let sca = names.iter().position(|name| *name == "SCAMerchantInitiatedTransaction").unwrap();
        let recurring = names.iter().position(|name| *name == "SCARecurringPayment").unwrap();
        let protocol = names.iter().position(|name| *name == "MCProgramProtocol").unwrap();
        let directory = names.iter().position(|name| *name == "MCDirectoryTransID").unwrap();
        let ucaf = names.iter().position(|name| *name == "UCAFInd").unwrap();
        assert!(sca < recurring && recurring < protocol && protocol < directory && directory < ucaf);
    }

    #[test]
    fn stored_credentials_follow_the_descriptor() {
        let instrument = card(CardBrand::Visa);
        let options = OperationOptions {
            stored_credential: Some(StoredCredential {
                initial_transaction: Some(false),
                initiator: Some(StoredCredentialInitiator::Merchant),
                reason_type: Some(StoredCredentialReason::Unscheduled),
                network_transaction_id: Some("abcdefg12345678".to_string()),
            }),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        assert_eq!(document.body.find("MITMsgType").and_then(|n| n.text()), Some("MUSE"));
        assert_eq!(document.body.find("MITStoredCredentialInd").and_then(|n| n.text()), Some("Y"));
        assert_eq!(
            document.body.find("MITSubmittedTransactionID").and_then(|n| n.text()),
            Some("abcdefg12345678")
        );

        let initial = OperationOptions {
            stored_credential: Some(StoredCredential {
                initial_transaction: Some(true),
                initiator: Some(StoredCredentialInitiator::Cardholder),
                network_transaction_id: Some("ignored".to_string()),
                ..Default::default()
            }),
            ..options
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &initial).unwrap();
        assert_eq!(document.body.find("MITMsgType").and_then(|n| n.text()), Some("CSTO"));
        assert!(document.body.find("MITSubmittedTransactionID").is_none());
    }

    #[test]
    fn checks_never_carry_card_blocks() {
        let instrument = check(Some("4099999992"));
        let options = OperationOptions {
            mit_stored_credential_ind: Some("Y".to_string()),
            three_d_secure: Some(ThreeDSecureData {
                eci: Some("5".to_string()),
                ..Default::default()
            }),
            same_day: Some("Y".to_string()),
            auth_method: Some("A".to_string()),
            action_code: Some("W3".to_string()),
            phone_type: Some("D".to_string()),
            phone_number: Some("1231231234".to_string()),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        for absent in ["MITStoredCredentialInd", "CAVV", "AAV", "AEVV", "DPANInd", "PymtBrandProgramCode"] {
            assert!(document.body.find(absent).is_none(), "{absent}");
        }
        assert_eq!(document.body.find("CardBrand").and_then(|n| n.text()), Some("EC"));
        assert_eq!(document.body.find("BankAccountType").and_then(|n| n.text()), Some("C"));
        assert_eq!(document.body.find("BankPmtDelv").and_then(|n| n.text()), Some("B"));
        assert_eq!(document.body.find("AVSname").and_then(|n| n.text()), Some("Jim Bob Smith"));
        assert_eq!(document.body.find("ECPSameDayInd").and_then(|n| n.text()), Some("Y"));
        assert_eq!(
            document.body.find("ECPCheckSerialNumber").and_then(|n| n.text()),
            Some("4099999992")
        );
        assert_eq!(document.body.find("EWSFirstName").and_then(|n| n.text()), Some("Jim"));
        assert_eq!(document.body.find("EWSMiddleName").and_then(|n| n.text()), Some("Bob"));
        assert_eq!(document.body.find("EWSLastName").and_then(|n| n.text()), Some("Smith"));
        assert!(document.body.find("EWSBusinessName").is_none());
        assert_eq!(
            document.body.find("EWSCheckSerialNumber").and_then(|n| n.text()),
            Some("4099999992")
        );
    }

    #[test]
    fn check_serial_number_requires_account_number() {
        let instrument = check(None);
        let options = OperationOptions {
            auth_method: Some("P".to_string()),
            ..options()
        };
        let error = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredOption {
                field_name: "account_number"
            }
        );
    }

    #[test]
    fn unsupported_country_skips_avs_fields() {
        let instrument = card(CardBrand::Visa);
        let options = OperationOptions {
            billing_address: Some(Address {
                address1: Some("456 My Street".to_string()),
                zip: Some("K1C2N6".to_string()),
                country: Some("DE".to_string()),
                dest_zip: Some("90001".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        assert!(document.body.find("AVSzip").is_none());
        assert!(document.body.find("AVSDestzip").is_none());
        assert_eq!(document.body.find("AVSname").and_then(|n| n.text()), Some("Longbob Longsen"));
        assert_eq!(document.body.find("AVScountryCode").and_then(|n| n.text()), Some(""));
    }

    #[test]
    fn destination_address_follows_country_code() {
        let instrument = card(CardBrand::Visa);
        let options = OperationOptions {
            billing_address: Some(Address {
                address1: Some("456 My/Street".to_string()),
                zip: Some("K1C2N6".to_string()),
                country: Some("CA".to_string()),
                phone: Some("(555)555-5555".to_string()),
                dest_zip: Some("90001".to_string()),
                dest_name: Some("Joan Smith".to_string()),
                dest_country: Some("US".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        let body = &document.body;
        assert_eq!(body.find("AVSaddress1").and_then(|n| n.text()), Some("456 MyStreet"));
        assert_eq!(body.find("AVSphoneNum").and_then(|n| n.text()), Some("5555555555"));
        assert_eq!(body.find("AVSDestphoneNum").and_then(|n| n.text()), None);
        let country = body.position("AVScountryCode").unwrap();
        assert_eq!(body.position("AVSDestzip"), Some(country + 1));
        assert_eq!(body.find("AVSDestcountryCode").and_then(|n| n.text()), Some("US"));
    }

    #[test]
    fn customer_profile_linkage() {
        let settings = OrbitalSettings {
            customer_profiles: true,
            ..settings()
        };
        let instrument = card(CardBrand::Visa);
        let document = compose(&settings, NewOrderFlow::Payment("A"), Some(&instrument), &options()).unwrap();
        assert_eq!(
            document.body.find("CustomerProfileFromOrderInd").and_then(|n| n.text()),
            Some("A")
        );
        assert_eq!(
            document.body.find("CustomerProfileOrderOverrideInd").and_then(|n| n.text()),
            Some("NO")
        );

        let by_reference = OperationOptions {
            customer_ref_num: Some("ABC".to_string()),
            ..options()
        };
        let document = compose(&settings, NewOrderFlow::Payment("A"), None, &by_reference).unwrap();
        assert_eq!(document.body.find("CustomerRefNum").and_then(|n| n.text()), Some("ABC"));
        assert!(document.body.find("CustomerProfileFromOrderInd").is_none());

        let profile_txn = OperationOptions {
            profile_txn: true,
            ..by_reference
        };
        let document = compose(&settings, NewOrderFlow::Payment("A"), Some(&instrument), &profile_txn).unwrap();
        assert!(document.body.find("CustomerProfileOrderOverrideInd").is_none());
    }

    #[test]
    fn level_2_tax_sits_between_amount_and_soft_descriptors() {
        let instrument = card(CardBrand::Visa);
        let options = OperationOptions {
            level_2_data: Some(Level2Data {
                tax_indicator: Some("1".to_string()),
                tax: Some(MinorUnit::new(10)),
                purchase_order: Some("123abc".to_string()),
                ..Default::default()
            }),
            soft_descriptors: Some(crate::request_types::SoftDescriptors {
                merchant_name: Some("Merch".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let document = compose(&settings(), NewOrderFlow::Payment("A"), Some(&instrument), &options).unwrap();
        let body = &document.body;
        let amount = body.position("Amount").unwrap();
        assert_eq!(body.position("TaxInd"), Some(amount + 1));
        assert_eq!(body.position("Tax"), Some(amount + 2));
        assert_eq!(body.position("SDMerchantName"), Some(amount + 3));
        assert_eq!(body.position("PCOrderNum"), Some(amount + 4));
    }
}
