//! Gateway operations.

use std::sync::Arc;

use error_stack::ResultExt;
use masking::Secret;
use tracing::instrument;

use crate::{
    classifier::{MessageType, Outcome},
    committer::Committer,
    configs::OrbitalSettings,
    consts,
    document::RequestDocument,
    errors::{ConnectorError, CustomResult},
    logger, parser,
    payment_method_data::{Card, CardData, PaymentInstrument},
    request_types::OperationOptions,
    scrub,
    transformers::{
        MarkForCaptureData, NewOrderData, NewOrderFlow, OrbitalRouterData, ProfileAction,
        ProfileData, ReversalData,
    },
    transport::{ConnectorTransport, HttpTransport},
    types::MinorUnit,
};

/// Verification amount for brands that refuse zero amount authorizations.
const NON_ZERO_VERIFY_AMOUNT: i64 = 100;

/// One adapter instance per merchant configuration. The instance remembers whether
/// the primary endpoint has failed, so it should be shared rather than rebuilt per call.
#[derive(Debug)]
pub struct Orbital {
    settings: OrbitalSettings,
    committer: Committer,
}

impl Orbital {
    /// Adapter posting over HTTPS with the configured request timeout.
    pub fn new(settings: OrbitalSettings) -> CustomResult<Self, ConnectorError> {
        let transport = HttpTransport::new(settings.get_request_timeout())
            .change_context(ConnectorError::InvalidConnectorConfig {
                config: "http client",
            })?;
        Self::with_transport(settings, Arc::new(transport))
    }

    pub fn with_transport(
        settings: OrbitalSettings,
        transport: Arc<dyn ConnectorTransport>,
    ) -> CustomResult<Self, ConnectorError> {
        settings.validate()?;
        let committer = Committer::new(transport, &settings);
        Ok(Self {
            settings,
            committer,
        })
    }

    pub fn settings(&self) -> &OrbitalSettings {
        &self.settings
    }

    /// Whether commits currently go straight to the secondary endpoint.
    pub fn is_using_secondary_url(&self) -> bool {
        self.committer.is_using_secondary_url()
    }

    /// `A`. A forced capture of an electronic check cannot be pre-authorized and is
    /// sent as a purchase instead.
    pub async fn authorize(
        &self,
        amount: MinorUnit,
        instrument: &PaymentInstrument,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        if is_force_capture_with_echeck(instrument, options) {
            return self.purchase(amount, instrument, options).await;
        }
        self.new_order(
            NewOrderFlow::Payment(consts::message_type::AUTH_ONLY),
            amount,
            Some(instrument),
            options,
            MessageType::Authorize,
        )
        .await
    }

    /// `AC`, or `FC` when `force_capture` is set.
    pub async fn purchase(
        &self,
        amount: MinorUnit,
        instrument: &PaymentInstrument,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let message_type = if options.force_capture {
            consts::message_type::FORCE_AUTH_AND_CAPTURE
        } else {
            consts::message_type::AUTH_AND_CAPTURE
        };
        self.new_order(
            NewOrderFlow::Payment(message_type),
            amount,
            Some(instrument),
            options,
            MessageType::Purchase,
        )
        .await
    }

    pub async fn capture(
        &self,
        amount: MinorUnit,
        authorization: &str,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let router_data = OrbitalRouterData::from((
            &self.settings,
            amount,
            MarkForCaptureData {
                authorization,
                options,
            },
        ));
        let document = RequestDocument::try_from(&router_data)?;
        self.commit(document, MessageType::Capture, options).await
    }

    /// Refunds against `authorization`, or against `options.payment_method` when one is
    /// supplied.
    pub async fn refund(
        &self,
        amount: MinorUnit,
        authorization: &str,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        self.new_order(
            NewOrderFlow::Refund {
                authorization: Some(authorization),
            },
            amount,
            options.payment_method.as_ref(),
            options,
            MessageType::Refund,
        )
        .await
    }

    pub async fn credit(
        &self,
        amount: MinorUnit,
        instrument: &PaymentInstrument,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        self.new_order(
            NewOrderFlow::Credit,
            amount,
            Some(instrument),
            options,
            MessageType::Refund,
        )
        .await
    }

    /// Full void unless `options.amount` asks for a partial one.
    pub async fn void(
        &self,
        authorization: &str,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let router_data = OrbitalRouterData::from((
            &self.settings,
            MinorUnit::zero(),
            ReversalData {
                authorization,
                options,
            },
        ));
        let document = RequestDocument::try_from(&router_data)?;
        self.commit(document, MessageType::Void, options).await
    }

    /// Authorizes the verification amount and voids it again. The authorization
    /// outcome is returned; the void only runs for approved non-zero amounts and its
    /// result is not reported.
    pub async fn verify(
        &self,
        instrument: &PaymentInstrument,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let amount = options
            .verify_amount
            .unwrap_or_else(|| default_verify_amount(instrument));
        let outcome = self.authorize(amount, instrument, options).await?;
        if outcome.success && !amount.is_zero() {
            match self
                .void(&outcome.authorization(), &OperationOptions::default())
                .await
            {
                Ok(void) if !void.success => {
                    logger::warn!(message = %void.message, "verification authorization was not voided")
                }
                Ok(_) => {}
                Err(error) => {
                    logger::warn!(?error, "verification authorization was not voided")
                }
            }
        }
        Ok(outcome)
    }

    /// Zero amount authorization that asks the processor for a reusable token. For
    /// cards the expiry is kept in the returned authorization.
    pub async fn store(
        &self,
        instrument: &PaymentInstrument,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let mut options = options.clone();
        if let PaymentInstrument::Card(card) = instrument {
            options.exp_date = Some(Secret::new(card.get_expiry_date_as_mmyy()));
        }
        options.token_txn_type = Some(consts::token_txn_type::GET_TOKEN.to_string());
        self.authorize(MinorUnit::zero(), instrument, &options).await
    }

    pub async fn add_customer_profile(
        &self,
        card: &Card,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        self.profile(
            ProfileAction::Create,
            Some(card),
            options,
            MessageType::AddCustomerProfile,
        )
        .await
    }

    pub async fn update_customer_profile(
        &self,
        card: &Card,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        self.profile(
            ProfileAction::Update,
            Some(card),
            options,
            MessageType::UpdateCustomerProfile,
        )
        .await
    }

    pub async fn retrieve_customer_profile(
        &self,
        customer_ref_num: &str,
    ) -> CustomResult<Outcome, ConnectorError> {
        let options = OperationOptions {
            customer_ref_num: Some(customer_ref_num.to_string()),
            ..Default::default()
        };
        self.profile(
            ProfileAction::Retrieve,
            None,
            &options,
            MessageType::RetrieveCustomerProfile,
        )
        .await
    }

    pub async fn delete_customer_profile(
        &self,
        customer_ref_num: &str,
    ) -> CustomResult<Outcome, ConnectorError> {
        let options = OperationOptions {
            customer_ref_num: Some(customer_ref_num.to_string()),
            ..Default::default()
        };
        self.profile(
            ProfileAction::Delete,
            None,
            &options,
            MessageType::DeleteCustomerProfile,
        )
        .await
    }

    /// Redacts credentials, account numbers and cryptograms from a transcript.
    pub fn scrub(&self, transcript: &str) -> String {
        scrub::scrub(transcript)
    }

    async fn new_order(
        &self,
        flow: NewOrderFlow<'_>,
        amount: MinorUnit,
        instrument: Option<&PaymentInstrument>,
        options: &OperationOptions,
        message_type: MessageType,
    ) -> CustomResult<Outcome, ConnectorError> {
        if options.use_secondary_url {
            self.committer.use_secondary_url();
        }
        let router_data = OrbitalRouterData::from((
            &self.settings,
            amount,
            NewOrderData {
                flow,
                instrument,
                options,
            },
        ));
        let document = RequestDocument::try_from(&router_data)?;
        self.commit(document, message_type, options).await
    }

    async fn profile(
        &self,
        action: ProfileAction,
        card: Option<&Card>,
        options: &OperationOptions,
        message_type: MessageType,
    ) -> CustomResult<Outcome, ConnectorError> {
        let router_data = OrbitalRouterData::from((
            &self.settings,
            MinorUnit::zero(),
            ProfileData {
                action,
                card,
                options,
            },
        ));
        let document = RequestDocument::try_from(&router_data)?;
        // Profile requests never carry trace headers or token expiries.
        self.commit(document, message_type, &OperationOptions::default())
            .await
    }

    #[instrument(skip_all, fields(message_type = %message_type))]
    async fn commit(
        &self,
        document: RequestDocument,
        message_type: MessageType,
        options: &OperationOptions,
    ) -> CustomResult<Outcome, ConnectorError> {
        let reply = self.committer.commit(&document, options).await?;
        logger::debug!(reply = %scrub::scrub(&String::from_utf8_lossy(&reply)));

        let outcome = match parser::parse(&reply) {
            Ok(response) => Outcome::new(response, message_type, options, self.settings.test),
            Err(error) => {
                logger::warn!(?error, "unreadable reply from orbital");
                Outcome::parse_failure(self.settings.test)
            }
        };
        logger::info!(
            success = outcome.success,
            message = %outcome.message,
            "orbital transaction completed"
        );
        Ok(outcome)
    }
}

fn is_force_capture_with_echeck(instrument: &PaymentInstrument, options: &OperationOptions) -> bool {
    options.force_capture
        && instrument.is_bank_account()
        && options
            .action_code
            .as_deref()
            .is_some_and(|code| consts::ecp::FORCE_CAPTURE_ACTION_CODES.contains(&code))
}

/// Zero where the brand allows it; bank accounts and other brands get a one unit
/// authorization.
fn default_verify_amount(instrument: &PaymentInstrument) -> MinorUnit {
    match instrument.card_brand() {
        Some(brand) if brand.allows_zero_auth() => MinorUnit::zero(),
        _ => MinorUnit::new(NON_ZERO_VERIFY_AMOUNT),
    }
}
