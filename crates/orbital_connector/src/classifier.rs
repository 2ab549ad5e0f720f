//! Success decision and result normalization for a parsed reply.

use masking::{PeekInterface, Secret};
use serde::Serialize;

use crate::{
    authorization::AuthorizationToken,
    codes::{AvsResult, CvvResult},
    consts,
    parser::ParsedResponse,
    request_types::OperationOptions,
};

/// Operation a reply answers; selects the success rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    Authorize,
    Purchase,
    Capture,
    Refund,
    Void,
    AddCustomerProfile,
    UpdateCustomerProfile,
    RetrieveCustomerProfile,
    DeleteCustomerProfile,
}

/// Result of one commit. Declines and unreadable replies are outcomes too.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    pub raw: ParsedResponse,
    #[serde(skip)]
    pub authorization: AuthorizationToken,
    pub avs_result: AvsResult,
    pub cvv_result: CvvResult,
    pub test: bool,
}

impl Outcome {
    pub fn new(
        response: ParsedResponse,
        message_type: MessageType,
        options: &OperationOptions,
        test: bool,
    ) -> Self {
        Self {
            success: is_success(&response, message_type),
            message: message_from(&response).unwrap_or_default().to_string(),
            authorization: authorization_from(&response, options),
            avs_result: AvsResult::new(response.get("avs_resp_code")),
            cvv_result: CvvResult::new(response.get("cvv2_resp_code")),
            raw: response,
            test,
        }
    }

    /// The processor may have accepted the transaction even though its reply could
    /// not be read, so this is reported rather than raised.
    pub fn parse_failure(test: bool) -> Self {
        Self {
            success: false,
            message: consts::PARSE_FAILURE_MESSAGE.to_string(),
            raw: ParsedResponse::default(),
            authorization: AuthorizationToken::default(),
            avs_result: AvsResult::default(),
            cvv_result: CvvResult::new(None),
            test,
        }
    }

    /// Encoded authorization handed back to the caller for follow-up operations.
    pub fn authorization(&self) -> String {
        self.authorization.encode()
    }
}

pub fn is_success(response: &ParsedResponse, message_type: MessageType) -> bool {
    let proc_status_ok = response.get("proc_status") == Some(consts::SUCCESS);
    match message_type {
        MessageType::Void => proc_status_ok,
        MessageType::Refund => {
            proc_status_ok && response.get("approval_status") == Some(consts::APPROVAL_SUCCESS)
        }
        _ if response.get_non_empty("customer_profile_action").is_some() => {
            response.get("profile_proc_status") == Some(consts::SUCCESS)
        }
        _ => {
            proc_status_ok
                && response
                    .get("resp_code")
                    .is_some_and(|resp_code| consts::APPROVED.contains(&resp_code))
        }
    }
}

/// Response message, else status message, else profile message.
pub fn message_from(response: &ParsedResponse) -> Option<&str> {
    ["resp_msg", "status_msg", "customer_profile_message"]
        .into_iter()
        .find_map(|key| response.get_non_empty(key))
}

fn authorization_from(response: &ParsedResponse, options: &OperationOptions) -> AuthorizationToken {
    let field = |key: &str| response.get_non_empty(key).map(str::to_string);
    let issues_token = options.token_txn_type.as_deref() == Some(consts::token_txn_type::GET_TOKEN);
    AuthorizationToken {
        tx_ref_num: field("tx_ref_num"),
        order_id: field("order_id"),
        stored_token: field("safetech_token").map(Secret::new),
        card_brand: field("card_brand"),
        exp_date: options
            .exp_date
            .as_ref()
            .filter(|_| issues_token)
            .map(|exp_date| Secret::new(exp_date.peek().clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::MatchCode;

    fn response(fields: &[(&str, &str)]) -> ParsedResponse {
        fields.iter().copied().collect()
    }

    #[test]
    fn approved_authorization() {
        let reply = response(&[("proc_status", "0"), ("resp_code", "00"), ("approval_status", "2")]);
        assert!(is_success(&reply, MessageType::Authorize));
        assert!(is_success(&reply, MessageType::Void));
        assert!(!is_success(&reply, MessageType::Refund));
    }

    #[test]
    fn refund_needs_approval_status() {
        let reply = response(&[("proc_status", "0"), ("approval_status", "1")]);
        assert!(is_success(&reply, MessageType::Refund));
        assert!(!is_success(&reply, MessageType::Capture));
    }

    #[test]
    fn declines_and_processing_errors() {
        let decline = response(&[("proc_status", "0"), ("resp_code", "05")]);
        assert!(!is_success(&decline, MessageType::Purchase));
        let error = response(&[("proc_status", "881"), ("resp_code", "00")]);
        assert!(!is_success(&error, MessageType::Purchase));
        assert!(!is_success(&error, MessageType::Void));
        assert!(!is_success(&ParsedResponse::default(), MessageType::Authorize));
    }

    #[test]
    fn profile_replies_use_profile_status() {
        let reply = response(&[
            ("customer_profile_action", "CREATE"),
            ("profile_proc_status", "0"),
            ("customer_profile_message", "Profile Request Processed"),
        ]);
        assert!(is_success(&reply, MessageType::AddCustomerProfile));
        assert_eq!(message_from(&reply), Some("Profile Request Processed"));

        let failed = response(&[("customer_profile_action", "CREATE"), ("profile_proc_status", "9576")]);
        assert!(!is_success(&failed, MessageType::AddCustomerProfile));
    }

    #[test]
    fn message_precedence() {
        let reply = response(&[("resp_msg", ""), ("status_msg", "Approved")]);
        assert_eq!(message_from(&reply), Some("Approved"));
        let reply = response(&[("resp_msg", "AUTH DECLINED"), ("status_msg", "Approved")]);
        assert_eq!(message_from(&reply), Some("AUTH DECLINED"));
        assert_eq!(message_from(&ParsedResponse::default()), None);
    }

    #[test]
    fn outcome_carries_authorization_and_codes() {
        let reply = response(&[
            ("proc_status", "0"),
            ("resp_code", "00"),
            ("tx_ref_num", "TX1"),
            ("order_id", "1"),
            ("safetech_token", "tok"),
            ("card_brand", "VI"),
            ("avs_resp_code", "H"),
            ("cvv2_resp_code", "M"),
            ("status_msg", "Approved"),
        ]);
        let options = OperationOptions {
            exp_date: Some(Secret::new("0929".to_string())),
            token_txn_type: Some("GT".to_string()),
            ..Default::default()
        };
        let outcome = Outcome::new(reply.clone(), MessageType::Authorize, &options, true);
        assert!(outcome.success);
        assert!(outcome.test);
        assert_eq!(outcome.message, "Approved");
        assert_eq!(outcome.authorization(), "TX1;1;tok;VI;0929");
        assert_eq!(outcome.avs_result.postal_match, Some(MatchCode::Match));
        assert_eq!(outcome.cvv_result.message, Some("Match"));

        let outcome = Outcome::new(reply, MessageType::Authorize, &OperationOptions::default(), false);
        assert_eq!(outcome.authorization(), "TX1;1;tok;VI");
    }

    #[test]
    fn parse_failure_is_not_successful() {
        let outcome = Outcome::parse_failure(false);
        assert!(!outcome.success);
        assert_eq!(outcome.message, consts::PARSE_FAILURE_MESSAGE);
        assert!(outcome.raw.is_empty());
        assert_eq!(outcome.authorization(), "");
    }
}
