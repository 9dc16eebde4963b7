use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a positive monetary amount for a payment.
///
/// This is a wrapper around `rust_decimal::Decimal` that rejects zero and
/// negative values, so a `SimulatedPayment` can never carry an invalid amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// ISO 4217 codes accepted by `Currency`.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "AUD", "BAM", "BGN", "CAD", "CHF", "CZK", "DKK", "EUR", "GBP", "HUF", "JPY", "MKD", "NOK",
    "PLN", "RON", "RSD", "RUB", "SEK", "TRY", "USD",
];

/// A recognized three-letter currency code such as `RSD` or `EUR`, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let code = code.trim();
        let upper = code.to_ascii_uppercase();
        if SUPPORTED_CURRENCIES.contains(&upper.as_str()) {
            Ok(Self(upper))
        } else {
            Err(PaymentError::Validation(format!(
                "Invalid currency code: '{}'",
                code
            )))
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a simulated payment.
///
/// Webhook payloads may carry statuses this crate does not know about; those
/// are kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Captured,
    Failed,
    Cancelled,
    Other(String),
}

impl PaymentStatus {
    /// Terminal statuses stamp `completed_at`.
    ///
    /// Decided on the spelling, so `Other("captured")` counts as terminal too.
    pub fn is_terminal(&self) -> bool {
        matches!(self.as_str(), "captured" | "failed" | "cancelled")
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Captured => "captured",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(status) => status,
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "captured" => Self::Captured,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(status: String) -> Self {
        Self::from(status.as_str())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form buyer contact details, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Masked card summary shown on the status page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub last4: String,
    pub brand: String,
}

impl CardSummary {
    /// The card every simulated payment is charged to.
    pub fn test_card() -> Self {
        Self {
            last4: "4242".to_string(),
            brand: "visa".to_string(),
        }
    }
}

/// Input of `PaymentService::create_payment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Amount,
    pub currency: Currency,
    pub listing_id: String,
    #[serde(default)]
    pub buyer_info: BuyerInfo,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Output of `PaymentService::create_payment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    pub id: String,
    pub redirect_url: String,
    pub status: PaymentStatus,
    pub requires_3ds: bool,
}

/// The canonical record of a simulated payment.
///
/// This is also the JSON shape written to the durable mirror, so a status
/// page can rebuild it after the in-memory map is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedPayment {
    pub id: String,
    pub amount: Amount,
    pub currency: Currency,
    pub listing_id: String,
    pub buyer_info: BuyerInfo,
    pub card: CardSummary,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SimulatedPayment {
    /// Creates a pending payment with a fresh identifier.
    pub fn new(request: CreatePaymentRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("pay_{}", uuid::Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
            listing_id: request.listing_id,
            buyer_info: request.buyer_info,
            card: CardSummary::test_card(),
            status: PaymentStatus::Pending,
            created_at: now,
            completed_at: None,
        }
    }

    /// Moves the payment to `status`, keeping `completed_at` set exactly
    /// when the status is terminal.
    ///
    /// Transitions out of a terminal status are accepted.
    pub fn apply_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        let status = PaymentStatus::from(status.as_str());
        self.completed_at = if status.is_terminal() { Some(now) } else { None };
        self.status = status;
    }

    pub fn view(&self) -> PaymentStatusView {
        PaymentStatusView {
            id: self.id.clone(),
            status: self.status.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            card: self.card.clone(),
        }
    }
}

/// Projection returned by `PaymentService::get_payment_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusView {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Amount,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub card: CardSummary,
}
