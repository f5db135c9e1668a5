//! Plain-text share sheets for products and quotes.

use std::fmt::Write as _;

use visual_erp_core::{Customer, Entity, Product, Quote};

use crate::config::CompanyProfile;

/// Shareable summary: a subject line and a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSheet {
    pub subject: String,
    pub body: String,
}

impl ShareSheet {
    pub fn for_product(company: &CompanyProfile, product: &Product) -> Self {
        let mut body = header(company);
        let _ = writeln!(body, "Product: {}", product.label());
        let _ = writeln!(body, "SKU: {}", product.sku);
        let _ = writeln!(body, "Price: {}", money(product.price));
        let availability = if product.stock_on_hand > 0 {
            format!("In stock ({} units)", product.stock_on_hand)
        } else {
            "Out of stock".to_string()
        };
        let _ = writeln!(body, "Availability: {availability}");
        if let Some(category) = &product.category {
            let _ = writeln!(body, "Category: {category}");
        }
        if let Some(description) = &product.description {
            let _ = writeln!(body, "\n{description}");
        }

        Self {
            subject: format!("{} - {}", company.name, product.label()),
            body,
        }
    }

    /// `customer` is used for the display name when it is loaded.
    pub fn for_quote(company: &CompanyProfile, quote: &Quote, customer: Option<&Customer>) -> Self {
        let mut body = header(company);
        let _ = writeln!(body, "Quote: {}", quote.label());
        let customer_name = customer
            .filter(|c| c.id == quote.customer_id)
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| format!("Customer #{}", quote.customer_id));
        let _ = writeln!(body, "Customer: {customer_name}");
        let _ = writeln!(body, "Status: {}", quote.status.as_str());
        let _ = writeln!(body, "Valid until: {}", quote.valid_until.format("%Y-%m-%d"));
        let _ = writeln!(body, "\nItems:");
        for item in &quote.line_items {
            let _ = writeln!(
                body,
                "- {} x{} @ {} = {}",
                item.product_name,
                item.quantity,
                money(item.unit_price),
                money(item.amount())
            );
        }
        let _ = writeln!(body, "\nTotal: {}", money(quote.computed_total()));

        Self {
            subject: format!("{} - Quote: {}", company.name, quote.label()),
            body,
        }
    }

    pub fn to_text(&self) -> String {
        format!("{}\n\n{}", self.subject, self.body)
    }
}

impl core::fmt::Display for ShareSheet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn header(company: &CompanyProfile) -> String {
    let mut out = company.name.clone();
    if let Some(website) = &company.website {
        out.push('\n');
        out.push_str(website);
    }
    out.push_str("\n\n");
    out
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}
