use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::ProductId;

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "Active",
            ProductStatus::Inactive => "Inactive",
            ProductStatus::Discontinued => "Discontinued",
        }
    }
}

/// Inventory product as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub stock_on_hand: i64,
    #[serde(default)]
    pub batches: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Whether this product can be put on a quote.
    pub fn can_be_sold(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Gross margin per unit (`price - cost`).
    pub fn unit_margin(&self) -> f64 {
        self.price - self.cost
    }

    /// Draft pre-filled from this record (edit form state).
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            sku: self.sku.clone(),
            status: self.status,
            stock_on_hand: self.stock_on_hand,
            batches: self.batches,
            price: self.price,
            cost: self.cost,
            category: self.category.clone(),
            description: self.description.clone(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Create/update payload for a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub status: ProductStatus,
    pub stock_on_hand: i64,
    pub batches: i64,
    pub price: f64,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductDraft {
    /// Validate the draft against the currently loaded catalog.
    ///
    /// `editing` is the id of the product being updated; it is excluded from
    /// the SKU uniqueness check. The backend remains authoritative.
    pub fn validate(&self, existing: &[Product], editing: Option<&ProductId>) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name", "product name is required"));
        }
        let sku = self.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("sku", "SKU is required"));
        }
        if self.stock_on_hand < 0 {
            return Err(DomainError::validation("stockOnHand", "stock on hand cannot be negative"));
        }
        if self.batches < 0 {
            return Err(DomainError::validation("batches", "batches cannot be negative"));
        }
        check_amount("price", self.price)?;
        check_amount("cost", self.cost)?;

        let duplicate = existing
            .iter()
            .filter(|p| Some(&p.id) != editing)
            .any(|p| p.sku.trim().eq_ignore_ascii_case(sku));
        if duplicate {
            return Err(DomainError::validation(
                "sku",
                format!("SKU '{sku}' is already used by another product"),
            ));
        }

        Ok(())
    }

    /// Trimmed copy suitable for submission.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_string(),
            category: non_blank(&self.category),
            description: non_blank(&self.description),
            ..self.clone()
        }
    }
}

pub(crate) fn check_amount(field: &'static str, value: f64) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(field, "must be a number"));
    }
    if value < 0.0 {
        return Err(DomainError::validation(field, "cannot be negative"));
    }
    Ok(())
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
