//! Sample records served when a development backend is down.
//!
//! Bodies are shaped like the real list endpoints so they go through the same
//! envelope decoding as live responses.

use serde_json::{Value, json};

use crate::envelope::Resource;

/// Sample list envelope for `resource`.
pub fn envelope(resource: Resource) -> Value {
    let records = match resource {
        Resource::Products => products(),
        Resource::Customers => customers(),
        Resource::Quotes => quotes(),
    };
    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(resource.collection_key().to_string(), records);
    Value::Object(body)
}

fn products() -> Value {
    json!([
        {
            "id": "1",
            "name": "Industrial Widget A",
            "sku": "WDG-001",
            "status": "Active",
            "stockOnHand": 150,
            "batches": 3,
            "price": 29.99,
            "cost": 15.5,
            "category": "Widgets",
            "description": "Standard industrial widget for general use"
        },
        {
            "id": "2",
            "name": "Premium Gadget B",
            "sku": "GDG-002",
            "status": "Active",
            "stockOnHand": 75,
            "batches": 2,
            "price": 89.99,
            "cost": 45.0,
            "category": "Gadgets",
            "description": "High-performance gadget with extended warranty"
        },
        {
            "id": "3",
            "name": "Basic Component C",
            "sku": "CMP-003",
            "status": "Inactive",
            "stockOnHand": 0,
            "batches": 0,
            "price": 4.5,
            "cost": 1.75,
            "category": "Components"
        },
        {
            "id": "4",
            "name": "Legacy Part D",
            "sku": "LGP-004",
            "status": "Discontinued",
            "stockOnHand": 12,
            "batches": 1,
            "price": 12.0,
            "cost": 8.0,
            "category": "Parts"
        }
    ])
}

fn customers() -> Value {
    json!([
        {
            "id": "1",
            "companyName": "Acme Manufacturing",
            "contactName": "Jane Smith",
            "email": "jane.smith@acme-mfg.com",
            "phone": "+1 555 0100",
            "website": "https://acme-mfg.com",
            "address": "100 Industrial Way, Springfield",
            "status": "Active"
        },
        {
            "id": "2",
            "companyName": "Globex Retail",
            "contactName": "Carlos Ortega",
            "email": "carlos@globex-retail.com",
            "phone": "+1 555 0142",
            "address": "42 Market Street, Shelbyville",
            "status": "Active"
        },
        {
            "id": "3",
            "companyName": "Initech Labs",
            "contactName": "Priya Natarajan",
            "email": "priya@initech-labs.io",
            "status": "Lead"
        }
    ])
}

fn quotes() -> Value {
    json!([
        {
            "id": "1",
            "title": "Q1 widget restock",
            "customerId": "1",
            "status": "Approved",
            "validUntil": "2027-03-31",
            "lineItems": [
                { "productId": "1", "productName": "Industrial Widget A", "quantity": 100, "unitPrice": 29.99 },
                { "productId": "2", "productName": "Premium Gadget B", "quantity": 10, "unitPrice": 89.99 }
            ],
            "total": 3898.9
        },
        {
            "id": "2",
            "title": "Store fit-out components",
            "customerId": "2",
            "status": "Pending",
            "validUntil": "2027-06-30",
            "lineItems": [
                { "productId": "3", "productName": "Basic Component C", "quantity": 500, "unitPrice": 4.5 }
            ],
            "total": 2250.0
        },
        {
            "id": "3",
            "title": "Lab equipment trial",
            "customerId": "3",
            "status": "Draft",
            "validUntil": "2027-01-15",
            "lineItems": [
                { "productId": "2", "productName": "Premium Gadget B", "quantity": 2, "unitPrice": 89.99 }
            ],
            "total": 179.98
        }
    ])
}
