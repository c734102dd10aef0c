use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    BankCard,
    Sbp,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

/// Local bookkeeping record of a completed payment. Write-once, created
/// exactly on confirmed success; its lifecycle is independent from the
/// checkout session that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub user_id: String,
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub context: super::ProductContext,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_serializes_with_snake_case_enums() {
        let record = PaymentRecord {
            user_id: "u-1".into(),
            order_id: "ord-1".into(),
            amount: dec!(499.00),
            currency: "RUB".into(),
            method: PaymentMethod::BankCard,
            status: PaymentStatus::Succeeded,
            context: super::super::ProductContext::Rental,
            metadata: serde_json::json!({"userName": "A. Driver"}),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["method"], "bank_card");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["context"], "rental");
        assert_eq!(json["orderId"], "ord-1");
    }
}
