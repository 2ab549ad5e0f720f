//! Tag blocks shared by more than one operation.

use masking::PeekInterface;

use crate::{
    configs::OrbitalSettings,
    consts,
    document::NodeList,
    formatter::{address_field, byte_limit, format_phone},
    request_types::{ManagedBilling, OperationOptions},
    types::Currency,
};

pub(crate) fn add_xml_credentials(body: &mut NodeList, settings: &OrbitalSettings) {
    if settings.ip_authentication {
        return;
    }
    body.nullable_secret_tag(
        "OrbitalConnectionUsername",
        settings.login.as_ref().map(|login| login.peek().clone()),
    );
    body.nullable_secret_tag(
        "OrbitalConnectionPassword",
        settings.password.as_ref().map(|password| password.peek().clone()),
    );
}

pub(crate) fn add_bin_merchant_and_terminal(
    body: &mut NodeList,
    settings: &OrbitalSettings,
    options: &OperationOptions,
) {
    body.tag("BIN", settings.get_bin());
    body.secret_tag("MerchantID", settings.merchant_id.peek().clone());
    body.tag(
        "TerminalID",
        options
            .terminal_id
            .clone()
            .unwrap_or_else(|| consts::DEFAULT_TERMINAL_ID.to_string()),
    );
}

pub(crate) fn add_currency_fields(body: &mut NodeList, currency: Currency) {
    body.tag("CurrencyCode", currency.iso_4217());
    body.tag(
        "CurrencyExponent",
        currency.number_of_digits_after_decimal_point().to_string(),
    );
}

pub(crate) fn is_avs_supported(country: Option<&str>) -> bool {
    country.is_some_and(|country| consts::AVS_SUPPORTED_COUNTRIES.contains(&country))
}

pub(crate) fn is_avs_supported_or_blank(country: Option<&str>) -> bool {
    is_avs_supported(country) || country.map_or(true, |country| country.trim().is_empty())
}

/// Countries outside AVS coverage are sent blank.
pub(crate) fn filter_unsupported_countries(country: Option<&str>) -> String {
    match country {
        Some(country) if is_avs_supported(Some(country)) => country.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn add_level2_tax(body: &mut NodeList, options: &OperationOptions) {
    let Some(level2) = options.level_2_data.as_ref() else {
        return;
    };
    if let Some(indicator) = level2.tax_indicator.as_deref() {
        let known = indicator.trim().parse::<u8>().is_ok_and(|value| {
            matches!(
                value,
                consts::tax_indicator::TAX_NOT_PROVIDED
                    | consts::tax_indicator::TAX_INCLUDED
                    | consts::tax_indicator::NON_TAXABLE_TRANSACTION
            )
        });
        if known {
            body.tag("TaxInd", indicator.trim());
        }
    }
    body.optional_tag("Tax", level2.tax.map(|tax| tax.to_string()));
}

pub(crate) fn add_level2_advice_addendum(body: &mut NodeList, options: &OperationOptions) {
    let Some(level2) = options.level_2_data.as_ref() else {
        return;
    };
    let addenda = [
        ("AMEXTranAdvAddn1", &level2.advice_addendum_1),
        ("AMEXTranAdvAddn2", &level2.advice_addendum_2),
        ("AMEXTranAdvAddn3", &level2.advice_addendum_3),
        ("AMEXTranAdvAddn4", &level2.advice_addendum_4),
    ];
    for (tag, value) in addenda {
        body.optional_tag(tag, value.as_deref().map(|value| byte_limit(value, 40)));
    }
}

pub(crate) fn add_level2_purchase(body: &mut NodeList, options: &OperationOptions) {
    let Some(level2) = options.level_2_data.as_ref() else {
        return;
    };
    body.optional_tag(
        "PCOrderNum",
        level2.purchase_order.as_deref().map(|value| byte_limit(value, 17)),
    );
    let destination = [
        ("PCDestZip", level2.zip.as_deref(), 10),
        ("PCDestName", level2.name.as_deref(), 30),
        ("PCDestAddress1", level2.address1.as_deref(), 30),
        ("PCDestAddress2", level2.address2.as_deref(), 30),
        ("PCDestCity", level2.city.as_deref(), 20),
        ("PCDestState", level2.state.as_deref(), 2),
    ];
    for (tag, value, limit) in destination {
        body.optional_tag(tag, value.map(|value| address_field(Some(value), limit)));
    }
}

pub(crate) fn add_level3_purchase(body: &mut NodeList, options: &OperationOptions) {
    let Some(level3) = options.level_3_data.as_ref() else {
        return;
    };
    limited_tags(
        body,
        [
            ("PC3FreightAmt", level3.freight_amount.as_deref(), 12),
            ("PC3DutyAmt", level3.duty_amount.as_deref(), 12),
            ("PC3DestCountryCd", level3.dest_country.as_deref(), 3),
            ("PC3ShipFromZip", level3.ship_from_zip.as_deref(), 10),
            ("PC3DiscAmt", level3.discount_amount.as_deref(), 12),
        ],
    );
}

pub(crate) fn add_level3_tax(body: &mut NodeList, options: &OperationOptions) {
    let Some(level3) = options.level_3_data.as_ref() else {
        return;
    };
    limited_tags(
        body,
        [
            ("PC3VATtaxAmt", level3.vat_tax.as_deref(), 12),
            ("PC3VATtaxRate", level3.vat_rate.as_deref(), 4),
            ("PC3AltTaxInd", level3.alt_ind.as_deref(), 15),
            ("PC3AltTaxAmt", level3.alt_tax.as_deref(), 9),
        ],
    );
}

pub(crate) fn add_line_items(
    body: &mut NodeList,
    options: &OperationOptions,
) -> crate::errors::CustomResult<(), crate::errors::ConnectorError> {
    let Some(line_items) = options.line_items.as_ref() else {
        return Ok(());
    };
    body.tag("PC3LineItemCount", byte_limit(line_items.len(), 2));
    body.group("PC3LineItemArray", |array| {
        for (index, line_item) in line_items.iter().enumerate() {
            array.group("PC3LineItem", |item| {
                item.tag("PC3DtlIndex", byte_limit(index + 1, 2));
                for (tag, value) in line_item.detail_fields() {
                    item.optional_tag(tag, value);
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

pub(crate) fn add_level2_card_and_more_tax(body: &mut NodeList, options: &OperationOptions) {
    let Some(level2) = options.level_2_data.as_ref() else {
        return;
    };
    limited_tags(
        body,
        [
            ("PCardRequestorName", level2.requestor_name.as_deref(), 38),
            ("PCardLocalTaxRate", level2.local_tax_rate.as_deref(), 5),
            // Canadian merchants only
            ("PCardNationalTax", level2.national_tax.as_deref(), 12),
            ("PCardPstTaxRegNumber", level2.pst_tax_reg_number.as_deref(), 15),
            ("PCardCustomerVatRegNumber", level2.customer_vat_reg_number.as_deref(), 13),
            // Canadian merchants only
            ("PCardMerchantVatRegNumber", level2.merchant_vat_reg_number.as_deref(), 20),
            ("PCardTotalTaxAmount", level2.total_tax_amount.as_deref(), 12),
        ],
    );
}

pub(crate) fn add_card_commodity_code(body: &mut NodeList, options: &OperationOptions) {
    let commodity_code = options
        .level_2_data
        .as_ref()
        .and_then(|level2| level2.commodity_code.as_deref());
    body.optional_tag("PCardCommodityCode", commodity_code.map(|code| byte_limit(code, 4)));
}

pub(crate) fn add_level3_vat_fields(body: &mut NodeList, options: &OperationOptions) {
    let Some(level3) = options.level_3_data.as_ref() else {
        return;
    };
    limited_tags(
        body,
        [
            ("PC3InvoiceDiscTreatment", level3.invoice_discount_treatment.as_deref(), 1),
            ("PC3TaxTreatment", level3.tax_treatment.as_deref(), 1),
            ("PC3UniqueVATInvoiceRefNum", level3.unique_vat_invoice_ref.as_deref(), 15),
            ("PC3ShipVATRate", level3.ship_vat_rate.as_deref(), 4),
        ],
    );
}

pub(crate) fn add_managed_billing(body: &mut NodeList, managed_billing: Option<&ManagedBilling>) {
    let Some(billing) = managed_billing else {
        return;
    };
    body.tag(
        "MBType",
        billing
            .billing_type
            .as_deref()
            .unwrap_or(consts::managed_billing::RECURRING),
    );
    body.tag(
        "MBOrderIdGenerationMethod",
        billing
            .order_id_generation_method
            .as_deref()
            .unwrap_or(consts::managed_billing::ORDER_ID_GENERATION_METHOD),
    );
    // MMDDYYYY
    body.optional_tag(
        "MBRecurringStartDate",
        billing.start_date.as_deref().map(|date| format_phone(date, None)),
    );
    body.optional_tag(
        "MBRecurringEndDate",
        billing.end_date.as_deref().map(|date| format_phone(date, None)),
    );
    body.tag(
        "MBRecurringNoEndDateFlag",
        billing
            .no_end_date_flag
            .as_deref()
            .unwrap_or(consts::managed_billing::NO_END_DATE_FLAG),
    );
    body.optional_tag("MBRecurringMaxBillings", billing.max_billings.as_deref());
    body.optional_tag("MBRecurringFrequency", billing.frequency.as_deref());
    body.optional_tag("MBDeferredBillDate", billing.deferred_bill_date.as_deref());
    body.optional_tag("MBMicroPaymentMaxDollarValue", billing.max_dollar_value.as_deref());
    body.optional_tag("MBMicroPaymentMaxBillingDays", billing.max_billing_days.as_deref());
    body.optional_tag("MBMicroPaymentMaxTransactions", billing.max_transactions.as_deref());
}

fn limited_tags<const N: usize>(body: &mut NodeList, fields: [(&'static str, Option<&str>, usize); N]) {
    for (tag, value, limit) in fields {
        body.optional_tag(tag, value.map(|value| byte_limit(value, limit)));
    }
}
