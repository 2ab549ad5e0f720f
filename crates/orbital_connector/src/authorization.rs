//! Authorization strings returned to callers and handed back for follow-up operations.
//!
//! The string is a `;` joined tuple `tx_ref_num;order_id[;token[;card_brand[;exp_date]]]`.
//! Components after the first two are positional and optional.

use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};

use crate::errors::{ConnectorError, CustomResult};

const SEPARATOR: char = ';';

#[derive(Clone, Debug, Default)]
pub struct AuthorizationToken {
    pub tx_ref_num: Option<String>,
    pub order_id: Option<String>,
    pub stored_token: Option<Secret<String>>,
    pub card_brand: Option<String>,
    pub exp_date: Option<Secret<String>>,
}

impl AuthorizationToken {
    /// Components are joined in order, absent ones are skipped entirely.
    pub fn encode(&self) -> String {
        [
            self.tx_ref_num.as_deref(),
            self.order_id.as_deref(),
            self.stored_token.as_ref().map(|token| token.peek().as_str()),
            self.card_brand.as_deref(),
            self.exp_date.as_ref().map(|exp| exp.peek().as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
    }

    /// Splits an authorization string into its positional components. Any prefix
    /// of the full tuple is accepted.
    pub fn decode(authorization: &str) -> CustomResult<Self, ConnectorError> {
        if authorization.trim().is_empty() {
            return Err(report!(ConnectorError::MalformedAuthorization))
                .attach_printable_lazy(|| "authorization string is empty".to_string());
        }
        let mut components = authorization.split(SEPARATOR).map(|component| {
            let component = component.trim();
            (!component.is_empty()).then(|| component.to_string())
        });
        Ok(Self {
            tx_ref_num: components.next().flatten(),
            order_id: components.next().flatten(),
            stored_token: components.next().flatten().map(Secret::new),
            card_brand: components.next().flatten(),
            exp_date: components.next().flatten().map(Secret::new),
        })
    }

    /// Transaction reference of a decoded string, required by every follow-up.
    pub fn get_tx_ref_num(&self) -> CustomResult<&str, ConnectorError> {
        self.tx_ref_num
            .as_deref()
            .ok_or_else(|| report!(ConnectorError::MalformedAuthorization))
            .attach_printable_lazy(|| "transaction reference is missing".to_string())
    }
}

/// Shorthand for follow-ups that only need the transaction reference and order id.
pub fn split_reference(authorization: &str) -> CustomResult<(String, Option<String>), ConnectorError> {
    let token = AuthorizationToken::decode(authorization)?;
    let tx_ref_num = token.get_tx_ref_num()?.to_string();
    Ok((tx_ref_num, token.order_id))
}
