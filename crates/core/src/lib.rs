//! `visual-erp-core`: records and client-side validation.
//!
//! This crate contains **pure** types (no IO). The backend owns canonical
//! state; validation here is best-effort and runs before any request is built.

pub mod customer;
pub mod entity;
pub mod error;
pub mod id;
pub mod product;
pub mod quote;
pub mod user;
pub mod value_object;

pub use customer::{Customer, CustomerDraft, CustomerStatus, is_valid_email};
pub use entity::{Entity, find_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId, QuoteId, UserId};
pub use product::{Product, ProductDraft, ProductStatus};
pub use quote::{LineItem, Quote, QuoteDraft, QuotePayload, QuoteStatus, compute_total};
pub use user::{Credentials, Role, Session, User};
pub use value_object::ValueObject;
