//! Minimarket master data records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A company owning one or more brands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// A brand belonging to a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub company_id: String,
    pub created_at: DateTime<Utc>,
}

/// A product category. Categories form a shallow tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent_category_id: Option<String>,
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub brand_id: String,
    pub company_id: String,
    pub category_id: String,
    /// Selling price in the smallest currency unit
    pub price: u64,
    /// Purchase cost in the smallest currency unit
    pub cost: u64,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    Sale,
}

/// An inventory transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: u32,
    /// Set on purchases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<u64>,
    /// Set on sales
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// The kinds of master data records exposed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Companies,
    Brands,
    Categories,
    Products,
    Transactions,
}

impl RecordKind {
    /// All record kinds, in catalog order.
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Companies,
        RecordKind::Brands,
        RecordKind::Categories,
        RecordKind::Products,
        RecordKind::Transactions,
    ];

    /// Plural, lowercase name used in URLs and tool arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Companies => "companies",
            RecordKind::Brands => "brands",
            RecordKind::Categories => "categories",
            RecordKind::Products => "products",
            RecordKind::Transactions => "transactions",
        }
    }

    /// Singular, capitalized name used in "not found" messages.
    pub fn singular(&self) -> &'static str {
        match self {
            RecordKind::Companies => "Company",
            RecordKind::Brands => "Brand",
            RecordKind::Categories => "Category",
            RecordKind::Products => "Product",
            RecordKind::Transactions => "Transaction",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown record kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_from_str() {
        assert_eq!("brands".parse::<RecordKind>(), Ok(RecordKind::Brands));
        assert_eq!("Products".parse::<RecordKind>(), Ok(RecordKind::Products));
        assert!("suppliers".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_transaction_serializes_type_tag() {
        let tx = Transaction {
            id: "tx_1".to_string(),
            product_id: "prd_1".to_string(),
            kind: TransactionType::Purchase,
            quantity: 120,
            unit_cost: Some(18000),
            unit_price: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "PURCHASE");
        assert_eq!(json["productId"], "prd_1");
        assert!(json.get("unitPrice").is_none());
    }
}
