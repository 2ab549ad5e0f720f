#![allow(clippy::unwrap_used, dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use error_stack::report;
use masking::Secret;
use orbital_connector::{
    payment_method_data::{Card, PaymentInstrument},
    types::CardBrand,
    ConnectorTransport, CustomResult, Headers, HttpClientError, OrbitalSettings,
};

pub const PRIMARY_URL: &str = "https://orbital-primary.test/authorize";
pub const SECONDARY_URL: &str = "https://orbital-secondary.test/authorize";

pub const APPROVED_AUTH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <NewOrderResp>
    <IndustryType></IndustryType>
    <MessageType>A</MessageType>
    <MerchantID>041756</MerchantID>
    <TerminalID>001</TerminalID>
    <CardBrand>VI</CardBrand>
    <AccountNum>4112344112344113</AccountNum>
    <OrderID>1</OrderID>
    <TxRefNum>5F8E8D2B077217F3EF1ACD3B61610E4CD12954A3</TxRefNum>
    <TxRefIdx>0</TxRefIdx>
    <ProcStatus>0</ProcStatus>
    <ApprovalStatus>1</ApprovalStatus>
    <RespCode>00</RespCode>
    <AVSRespCode>H </AVSRespCode>
    <CVV2RespCode>M</CVV2RespCode>
    <AuthCode>tst554</AuthCode>
    <StatusMsg>Approved</StatusMsg>
    <RespMsg></RespMsg>
    <SafetechToken>4112345224894113</SafetechToken>
  </NewOrderResp>
</Response>"#;

pub const REVERSAL_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <ReversalResp>
    <MerchantID>041756</MerchantID>
    <TerminalID>001</TerminalID>
    <OrderID>1</OrderID>
    <TxRefNum>5F8E8D2B077217F3EF1ACD3B61610E4CD12954A3</TxRefNum>
    <TxRefIdx>1</TxRefIdx>
    <OutstandingAmt>0</OutstandingAmt>
    <ProcStatus>0</ProcStatus>
    <StatusMsg></StatusMsg>
  </ReversalResp>
</Response>"#;

#[derive(Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
    pub headers: Headers,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.clone().into_inner())
    }

    /// Byte offset of `needle` in the body; panics when it is missing.
    pub fn offset(&self, needle: &str) -> usize {
        self.body
            .find(needle)
            .unwrap_or_else(|| panic!("{needle} missing from {}", self.body))
    }
}

pub enum Reply {
    Body(String),
    Unreachable,
}

/// Records every request and answers from a script. An empty script answers with an
/// approved authorization.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<RecordedRequest>>,
    script: Mutex<VecDeque<Reply>>,
    unreachable: Vec<String>,
}

impl RecordingTransport {
    pub fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.push(url.to_string());
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request<T>(&self, inspect: impl FnOnce(&RecordedRequest) -> T) -> T {
        let requests = self.requests.lock().unwrap();
        inspect(requests.last().unwrap())
    }
}

#[async_trait::async_trait]
impl ConnectorTransport for RecordingTransport {
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Headers,
    ) -> CustomResult<Vec<u8>, HttpClientError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: String::from_utf8(body).unwrap(),
            headers,
        });
        if self.unreachable.iter().any(|unreachable| unreachable == url) {
            return Err(report!(HttpClientError::RequestNotSent(
                "error trying to connect: tcp connect error: Connection refused".to_string()
            )));
        }
        match self.script.lock().unwrap().pop_front() {
            Some(Reply::Body(body)) => Ok(body.into_bytes()),
            Some(Reply::Unreachable) => Err(report!(HttpClientError::RequestTimeoutReceived)),
            None => Ok(APPROVED_AUTH.as_bytes().to_vec()),
        }
    }
}

pub fn settings() -> OrbitalSettings {
    let mut settings = OrbitalSettings {
        merchant_id: Secret::new("041756".to_string()),
        login: Some(Secret::new("T16WAYSACT".to_string())),
        password: Some(Secret::new("zbp8X1ykGZ".to_string())),
        test: true,
        ..Default::default()
    };
    settings.endpoints.test_url = PRIMARY_URL.to_string();
    settings.endpoints.secondary_test_url = SECONDARY_URL.to_string();
    settings
}

pub fn card(brand: CardBrand) -> PaymentInstrument {
    let number = match brand {
        CardBrand::Visa => "4112344112344113",
        CardBrand::Mastercard => "5454545454545454",
        CardBrand::AmericanExpress => "371449635398431",
        CardBrand::Discover => "6011000995500000",
        CardBrand::DinersClub => "36438999960016",
        CardBrand::Jcb => "3566002020140006",
    };
    PaymentInstrument::Card(Card {
        card_number: Secret::new(number.to_string()),
        card_exp_month: Secret::new("09".to_string()),
        card_exp_year: Secret::new("2029".to_string()),
        card_cvc: Some(Secret::new("111".to_string())),
        brand,
        first_name: Some(Secret::new("Longbob".to_string())),
        last_name: Some(Secret::new("Longsen".to_string())),
    })
}
