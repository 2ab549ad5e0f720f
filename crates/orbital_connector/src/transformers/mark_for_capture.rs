use super::{common, OrbitalRouterData};
use crate::{
    authorization::split_reference,
    document::{NodeList, OperationKind, RequestDocument},
    errors::ConnectorError,
    formatter::format_order_id,
    request_types::OperationOptions,
};

#[derive(Debug)]
pub struct MarkForCaptureData<'a> {
    pub authorization: &'a str,
    pub options: &'a OperationOptions,
}

impl TryFrom<&OrbitalRouterData<'_, MarkForCaptureData<'_>>> for RequestDocument {
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(item: &OrbitalRouterData<'_, MarkForCaptureData<'_>>) -> Result<Self, Self::Error> {
        let (tx_ref_num, order_id) = split_reference(item.router_data.authorization)?;
        let options = item.router_data.options;

        let mut body = NodeList::new();
        common::add_xml_credentials(&mut body, item.settings);
        body.tag("OrderID", format_order_id(order_id.as_deref().unwrap_or_default()));
        body.tag("Amount", item.amount.to_string());
        common::add_level2_tax(&mut body, options);
        common::add_bin_merchant_and_terminal(&mut body, item.settings, options);
        body.tag("TxRefNum", tx_ref_num);
        common::add_level2_purchase(&mut body, options);
        common::add_level2_advice_addendum(&mut body, options);
        common::add_level3_purchase(&mut body, options);
        common::add_level3_tax(&mut body, options);
        common::add_line_items(&mut body, options)?;
        common::add_level2_card_and_more_tax(&mut body, options);
        common::add_card_commodity_code(&mut body, options);
        common::add_level3_vat_fields(&mut body, options);
        Ok(Self::new(OperationKind::MarkForCapture, body))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use masking::Secret;

    use super::*;
    use crate::{configs::OrbitalSettings, request_types::Level2Data, types::MinorUnit};

    #[test]
    fn capture_uses_the_authorization_reference() {
        let settings = OrbitalSettings {
            merchant_id: Secret::new("700000000123".to_string()),
            ip_authentication: true,
            ..Default::default()
        };
        let options = OperationOptions {
            level_2_data: Some(Level2Data {
                tax: Some(MinorUnit::new(25)),
                commodity_code: Some("12345".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let router_data = OrbitalRouterData::from((
            &settings,
            MinorUnit::new(2500),
            MarkForCaptureData {
                authorization: "5F8ED3D950A43BD63369845D5385B6354C3654B4;2930847",
                options: &options,
            },
        ));
        let document = RequestDocument::try_from(&router_data).unwrap();
        assert_eq!(document.operation, OperationKind::MarkForCapture);
        assert_eq!(
            document.body.names(),
            vec![
                "OrderID",
                "Amount",
                "Tax",
                "BIN",
                "MerchantID",
                "TerminalID",
                "TxRefNum",
                "PCardCommodityCode",
            ]
        );
        assert_eq!(document.body.find("OrderID").and_then(|n| n.text()), Some("2930847"));
        assert_eq!(document.body.find("BIN").and_then(|n| n.text()), Some("000002"));
        assert_eq!(
            document.body.find("PCardCommodityCode").and_then(|n| n.text()),
            Some("1234")
        );
    }

    #[test]
    fn empty_authorization_is_malformed() {
        let settings = OrbitalSettings::default();
        let options = OperationOptions::default();
        let router_data = OrbitalRouterData::from((
            &settings,
            MinorUnit::new(1),
            MarkForCaptureData {
                authorization: "",
                options: &options,
            },
        ));
        let error = RequestDocument::try_from(&router_data).unwrap_err();
        assert_eq!(error.current_context(), &ConnectorError::MalformedAuthorization);
    }
}
