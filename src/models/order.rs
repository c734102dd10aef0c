use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must be greater than 0".into());
        Err(err)
    }
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Currency must be a 3-letter ISO code".into());
        Err(err)
    }
}

/// Which part of the platform the payment belongs to. Carried through order
/// creation and the payment record.
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
pub enum ProductContext {
    ServiceBooking,
    Rental,
    Marketplace,
    CarWash,
    Fuel,
}

/// Request to create a payment order with the provider's backend proxy.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Unique per attempt; synthesized from (timestamp, user id) when absent
    pub external_order_id: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    #[validate(length(equal = 3), custom = "validate_currency")]
    pub currency: String,
    pub description: String,
    pub product_context: ProductContext,
    pub success_url: String,
    pub fail_url: String,
    pub callback_url: String,
}

/// What the proxy returns for a freshly created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub order_id: String,
    pub checkout_url: String,
}

/// Order diagnostics snapshot, off the happy path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, currency: &str) -> OrderRequest {
        OrderRequest {
            external_order_id: None,
            amount,
            currency: currency.to_string(),
            description: "Annual service".to_string(),
            product_context: ProductContext::ServiceBooking,
            success_url: "https://app.drivehub.app/payment/success".to_string(),
            fail_url: "https://app.drivehub.app/payment/fail".to_string(),
            callback_url: "https://api.drivehub.app/bank/callback".to_string(),
        }
    }

    #[test]
    fn positive_amount_passes_validation() {
        assert!(request(dec!(100.00), "RUB").validate().is_ok());
    }

    #[test]
    fn zero_and_negative_amounts_fail_validation() {
        assert!(request(dec!(0), "RUB").validate().is_err());
        assert!(request(dec!(-5.00), "RUB").validate().is_err());
    }

    #[test]
    fn bad_currency_fails_validation() {
        assert!(request(dec!(10), "RU").validate().is_err());
        assert!(request(dec!(10), "R1B").validate().is_err());
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let json = serde_json::to_value(request(dec!(10), "RUB")).unwrap();
        assert!(json.get("successUrl").is_some());
        assert!(json.get("callbackUrl").is_some());
        assert_eq!(json["productContext"], "service_booking");
    }

    #[test]
    fn order_result_parses_camel_case() {
        let result: OrderResult = serde_json::from_str(
            r#"{"orderId":"ord-42","checkoutUrl":"https://pay.example.com/c/42"}"#,
        )
        .unwrap();
        assert_eq!(result.order_id, "ord-42");
    }
}
