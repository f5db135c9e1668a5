use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::CustomerId;
use crate::product::non_blank;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Customer status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
    Lead,
}

/// Customer as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub status: CustomerStatus,
}

impl Customer {
    pub fn to_draft(&self) -> CustomerDraft {
        CustomerDraft {
            company_name: self.company_name.clone(),
            contact_name: self.contact_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            website: self.website.clone(),
            address: self.address.clone(),
            status: self.status,
        }
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn label(&self) -> &str {
        &self.company_name
    }
}

/// Create/update payload for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: CustomerStatus,
}

impl CustomerDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.company_name.trim().is_empty() {
            return Err(DomainError::validation("companyName", "company name is required"));
        }
        if self.contact_name.trim().is_empty() {
            return Err(DomainError::validation("contactName", "contact name is required"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(DomainError::validation("email", "enter a valid email address"));
        }
        if let Some(site) = non_blank(&self.website) {
            if !(site.starts_with("http://") || site.starts_with("https://")) {
                return Err(DomainError::validation(
                    "website",
                    "website must start with http:// or https://",
                ));
            }
        }
        Ok(())
    }

    pub fn normalized(&self) -> Self {
        Self {
            company_name: self.company_name.trim().to_string(),
            contact_name: self.contact_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(&self.phone),
            website: non_blank(&self.website),
            address: non_blank(&self.address),
            status: self.status,
        }
    }
}

/// Format check used by the customer form (`local@domain.tld`).
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
