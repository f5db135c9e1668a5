use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{CustomerId, ProductId, QuoteId};
use crate::product::check_amount;
use crate::value_object::ValueObject;

/// Quote status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
    Converted,
}

impl QuoteStatus {
    /// Only approved quotes can be converted into an order.
    pub fn can_convert(&self) -> bool {
        *self == QuoteStatus::Approved
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Draft",
            QuoteStatus::Pending => "Pending",
            QuoteStatus::Approved => "Approved",
            QuoteStatus::Rejected => "Rejected",
            QuoteStatus::Converted => "Converted",
        }
    }
}

/// One line of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl ValueObject for LineItem {}

impl LineItem {
    pub fn new(product_name: impl Into<String>, quantity: i64, unit_price: f64) -> Self {
        Self {
            product_id: None,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn for_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    fn validate(&self, index: usize) -> DomainResult<()> {
        if self.product_name.trim().is_empty() {
            return Err(DomainError::validation(
                "lineItems",
                format!("line {}: product name is required", index + 1),
            ));
        }
        if self.quantity < 1 {
            return Err(DomainError::validation(
                "lineItems",
                format!("line {}: quantity must be at least 1", index + 1),
            ));
        }
        check_amount("lineItems", self.unit_price).map_err(|_| {
            DomainError::validation(
                "lineItems",
                format!("line {}: unit price must be a non-negative number", index + 1),
            )
        })
    }
}

/// Sum of `quantity × unit_price` over all lines.
pub fn compute_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::amount).sum()
}

/// Quote as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub title: String,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub status: QuoteStatus,
    pub valid_until: NaiveDate,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub total: f64,
}

impl Quote {
    /// Total recomputed from the line items (the stored `total` may be stale).
    pub fn computed_total(&self) -> f64 {
        compute_total(&self.line_items)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.valid_until
    }

    pub fn to_draft(&self) -> QuoteDraft {
        QuoteDraft {
            title: self.title.clone(),
            customer_id: Some(self.customer_id.clone()),
            status: self.status,
            valid_until: Some(self.valid_until),
            line_items: self.line_items.clone(),
            total: self.total,
        }
    }
}

impl Entity for Quote {
    type Id = QuoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

/// Quote form state.
///
/// `total` mirrors whatever the form last displayed; it is never trusted and
/// is recomputed by [`QuoteDraft::prepare`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDraft {
    pub title: String,
    pub customer_id: Option<CustomerId>,
    pub status: QuoteStatus,
    pub valid_until: Option<NaiveDate>,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub total: f64,
}

/// Validated quote payload, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub title: String,
    pub customer_id: CustomerId,
    pub status: QuoteStatus,
    pub valid_until: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub total: f64,
}

impl QuoteDraft {
    /// Validate the form and build the submission payload with a fresh total.
    pub fn prepare(&self) -> DomainResult<QuotePayload> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "quote title is required"));
        }
        let customer_id = self
            .customer_id
            .clone()
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or_else(|| DomainError::validation("customerId", "select a customer"))?;
        let valid_until = self
            .valid_until
            .ok_or_else(|| DomainError::validation("validUntil", "valid-until date is required"))?;
        if self.line_items.is_empty() {
            return Err(DomainError::validation("lineItems", "add at least one line item"));
        }
        for (index, item) in self.line_items.iter().enumerate() {
            item.validate(index)?;
        }

        Ok(QuotePayload {
            title: title.to_string(),
            customer_id,
            status: self.status,
            valid_until,
            line_items: self.line_items.clone(),
            total: compute_total(&self.line_items),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> QuoteDraft {
        QuoteDraft {
            title: "Q3 brackets".to_string(),
            customer_id: Some(CustomerId::new("c-1")),
            status: QuoteStatus::Draft,
            valid_until: Some(date(2026, 12, 31)),
            line_items: vec![LineItem::new("Bracket", 2, 10.0), LineItem::new("Bolt", 1, 5.0)],
            total: 999.0,
        }
    }

    #[test]
    fn prepare_recomputes_total_ignoring_stale_state() {
        let payload = draft().prepare().unwrap();
        assert_eq!(payload.total, 25.0);
    }

    #[test]
    fn prepare_rejects_zero_quantity() {
        let mut d = draft();
        d.line_items[1].quantity = 0;
        let err = d.prepare().unwrap_err();
        assert_eq!(err.field(), Some("lineItems"));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn prepare_requires_customer_and_date() {
        let mut d = draft();
        d.customer_id = None;
        assert_eq!(d.prepare().unwrap_err().field(), Some("customerId"));

        let mut d = draft();
        d.valid_until = None;
        assert_eq!(d.prepare().unwrap_err().field(), Some("validUntil"));
    }

    #[test]
    fn prepare_requires_line_items() {
        let mut d = draft();
        d.line_items.clear();
        assert_eq!(d.prepare().unwrap_err().field(), Some("lineItems"));
    }

    #[test]
    fn only_approved_quotes_convert() {
        assert!(QuoteStatus::Approved.can_convert());
        assert!(!QuoteStatus::Draft.can_convert());
        assert!(!QuoteStatus::Converted.can_convert());
    }

    #[test]
    fn expiry_is_exclusive_of_valid_until() {
        let q = Quote {
            id: QuoteId::new("q-1"),
            title: "t".to_string(),
            customer_id: CustomerId::new("c-1"),
            status: QuoteStatus::Pending,
            valid_until: date(2026, 1, 31),
            line_items: vec![],
            total: 0.0,
        };
        assert!(!q.is_expired(date(2026, 1, 31)));
        assert!(q.is_expired(date(2026, 2, 1)));
    }

    #[test]
    fn quote_decodes_from_backend_json() {
        let q: Quote = serde_json::from_value(serde_json::json!({
            "id": "q-9",
            "title": "Fit-out",
            "customerId": 3,
            "status": "Approved",
            "validUntil": "2026-11-30",
            "lineItems": [{"productName": "Panel", "quantity": 4, "unitPrice": 2.5}],
            "total": 1.0
        }))
        .unwrap();
        assert_eq!(q.customer_id.as_str(), "3");
        assert_eq!(q.computed_total(), 10.0);
    }

    proptest! {
        #[test]
        fn total_is_sum_of_line_amounts(
            lines in proptest::collection::vec((1i64..500, 0u32..100_000), 1..20),
            stale in -1.0e6f64..1.0e6,
        ) {
            let items: Vec<LineItem> = lines
                .iter()
                .map(|(q, cents)| LineItem::new("item", *q, *cents as f64 / 100.0))
                .collect();
            let expected: f64 = items.iter().map(|i| i.quantity as f64 * i.unit_price).sum();

            let mut d = draft();
            d.line_items = items;
            d.total = stale;
            let payload = d.prepare().unwrap();
            prop_assert!((payload.total - expected).abs() < 1e-6);
        }
    }
}
