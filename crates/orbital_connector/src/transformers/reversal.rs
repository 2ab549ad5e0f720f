use super::{common, OrbitalRouterData};
use crate::{
    authorization::split_reference,
    document::{NodeList, OperationKind, RequestDocument},
    errors::ConnectorError,
    formatter::format_order_id,
    request_types::OperationOptions,
};

/// A void. The amount of the router data is unused; a partial void takes its amount
/// from `options.amount`.
#[derive(Debug)]
pub struct ReversalData<'a> {
    pub authorization: &'a str,
    pub options: &'a OperationOptions,
}

impl TryFrom<&OrbitalRouterData<'_, ReversalData<'_>>> for RequestDocument {
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(item: &OrbitalRouterData<'_, ReversalData<'_>>) -> Result<Self, Self::Error> {
        let (tx_ref_num, order_id) = split_reference(item.router_data.authorization)?;
        let options = item.router_data.options;
        let order_id = order_id.or_else(|| options.order_id.clone()).unwrap_or_default();

        let mut body = NodeList::new();
        common::add_xml_credentials(&mut body, item.settings);
        body.tag("TxRefNum", tx_ref_num);
        body.nullable_tag("TxRefIdx", options.transaction_index.as_deref());
        // An empty AdjustedAmt voids the full amount, a zero would void nothing.
        body.nullable_tag("AdjustedAmt", options.amount.map(|amount| amount.to_string()));
        body.tag("OrderID", format_order_id(&order_id));
        common::add_bin_merchant_and_terminal(&mut body, item.settings, options);
        body.optional_tag("ReversalRetryNumber", options.reversal_retry_number.as_deref());
        body.optional_tag("OnlineReversalInd", options.online_reversal_ind.as_deref());
        Ok(Self::new(OperationKind::Reversal, body))
    }
}
