use masking::PeekInterface;

use super::{common, new_order::profile_number, OrbitalRouterData};
use crate::{
    consts,
    document::{NodeList, OperationKind, RequestDocument},
    errors::ConnectorError,
    formatter::{address_field, byte_limit, format_phone, truncate_chars},
    payment_method_data::{Card, CardData},
    request_types::OperationOptions,
};

const ORDER_DEFAULT_DESCRIPTION_MAX_LENGTH: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ProfileAction {
    #[strum(serialize = "C")]
    Create,
    #[strum(serialize = "R")]
    Retrieve,
    #[strum(serialize = "U")]
    Update,
    #[strum(serialize = "D")]
    Delete,
}

#[derive(Debug)]
pub struct ProfileData<'a> {
    pub action: ProfileAction,
    pub card: Option<&'a Card>,
    pub options: &'a OperationOptions,
}

impl TryFrom<&OrbitalRouterData<'_, ProfileData<'_>>> for RequestDocument {
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(item: &OrbitalRouterData<'_, ProfileData<'_>>) -> Result<Self, Self::Error> {
        let ProfileData {
            action,
            card,
            options,
        } = item.router_data;

        let mut body = NodeList::new();
        common::add_xml_credentials(&mut body, item.settings);
        body.tag("CustomerBin", item.settings.get_bin());
        body.secret_tag("CustomerMerchantID", item.settings.merchant_id.peek().clone());
        if let Some(card) = card {
            body.nullable_tag("CustomerName", card.get_card_holder_name());
        }
        body.optional_tag("CustomerRefNum", options.customer_ref_num.as_deref());
        add_customer_address(&mut body, options);

        body.tag("CustomerProfileAction", action.to_string());
        body.tag(
            "CustomerProfileOrderOverrideInd",
            options
                .customer_profile_order_override_ind
                .as_deref()
                .unwrap_or(consts::profile::NO_MAPPING_TO_ORDER_DATA),
        );
        if action == ProfileAction::Create {
            body.tag("CustomerProfileFromOrderInd", profile_number(options));
        }
        body.optional_tag(
            "OrderDefaultDescription",
            options
                .order_default_description
                .as_deref()
                .map(|description| truncate_chars(description, ORDER_DEFAULT_DESCRIPTION_MAX_LENGTH)),
        );
        body.optional_tag(
            "OrderDefaultAmount",
            options.order_default_amount.map(|amount| amount.to_string()),
        );
        if matches!(action, ProfileAction::Create | ProfileAction::Update) {
            body.tag("CustomerAccountType", consts::profile::CREDIT_CARD_ACCOUNT);
            body.tag(
                "Status",
                options.status.as_deref().unwrap_or(consts::profile::ACTIVE),
            );
        }
        if let Some(card) = card {
            body.secret_tag("CCAccountNum", card.card_number.peek().clone());
            body.tag("CCExpireDate", card.get_expiry_date_as_mmyy());
        }
        // Managed billing must follow CCExpireDate.
        common::add_managed_billing(&mut body, options.managed_billing.as_ref());
        Ok(Self::new(OperationKind::Profile, body))
    }
}

fn add_customer_address(body: &mut NodeList, options: &OperationOptions) {
    let Some(address) = options.get_address() else {
        return;
    };
    body.tag("CustomerAddress1", address_field(address.address1.as_deref(), 30));
    body.tag("CustomerAddress2", address_field(address.address2.as_deref(), 30));
    body.tag("CustomerCity", address_field(address.city.as_deref(), 20));
    body.tag("CustomerState", address_field(address.state.as_deref(), 2));
    body.tag("CustomerZIP", address_field(address.zip.as_deref(), 10));
    body.optional_tag(
        "CustomerEmail",
        address.email.as_deref().map(|email| byte_limit(email, 50)),
    );
    body.nullable_tag(
        "CustomerPhone",
        address.phone.as_deref().map(|phone| format_phone(phone, None)),
    );
    body.tag(
        "CustomerCountryCode",
        common::filter_unsupported_countries(address.country.as_deref()),
    );
}
