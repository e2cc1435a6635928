//! Minimarket master data catalog.
//!
//! Read-only, in-process master data (companies, brands, categories, products
//! and inventory transactions). Records are materialized once at startup.

use chrono::{DateTime, Utc};
use minimart_types::{
    Brand, Category, Company, Product, RecordKind, Transaction, TransactionType,
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use TransactionType::{Purchase, Sale};

const COMPANIES: &[(&str, &str, &str)] = &[
    ("cmp_1", "Acme Foods", "ID"),
    ("cmp_2", "Nusantara Beverages", "ID"),
    ("cmp_3", "Global Snacks Ltd", "SG"),
    ("cmp_4", "Tropical Essentials", "MY"),
    ("cmp_5", "Harvest Organics", "ID"),
];

const BRANDS: &[(&str, &str, &str)] = &[
    ("br_1", "Acme Fresh", "cmp_1"),
    ("br_2", "Acme Daily", "cmp_1"),
    ("br_3", "NusaDrink", "cmp_2"),
    ("br_4", "Snackify", "cmp_3"),
    ("br_5", "TropiCare", "cmp_4"),
    ("br_6", "GreenHarvest", "cmp_5"),
    ("br_7", "HydraPlus", "cmp_2"),
    ("br_8", "PureBite", "cmp_3"),
];

const CATEGORIES: &[(&str, &str, Option<&str>)] = &[
    ("cat_1", "Beverages", None),
    ("cat_2", "Snacks", None),
    ("cat_3", "Dairy", None),
    ("cat_4", "Health", None),
    ("cat_5", "Energy Drinks", Some("cat_1")),
    ("cat_6", "Organic", Some("cat_4")),
];

// (id, sku, name, brand, company, category, price, cost, stock)
#[rustfmt::skip]
#[allow(clippy::type_complexity)]
const PRODUCTS: &[(&str, &str, &str, &str, &str, &str, u64, u64, u32)] = &[
    ("prd_1", "AF-MILK-1L", "Acme Fresh Milk 1L", "br_1", "cmp_1", "cat_3", 24000, 18000, 120),
    ("prd_2", "AF-YOG-100", "Acme Yogurt Cup 100g", "br_1", "cmp_1", "cat_3", 9000, 6000, 300),
    ("prd_3", "AD-BREAD-LOAF", "Acme Daily Bread Loaf", "br_2", "cmp_1", "cat_2", 20000, 14000, 80),
    ("prd_4", "ND-TEA-500", "NusaDrink Iced Tea 500ml", "br_3", "cmp_2", "cat_1", 10000, 6500, 250),
    ("prd_5", "ND-WATER-600", "NusaDrink Mineral Water 600ml", "br_3", "cmp_2", "cat_1", 5000, 2500, 500),
    ("prd_6", "SP-CHIPS-ORI", "Snackify Potato Chips Original 70g", "br_4", "cmp_3", "cat_2", 12500, 8000, 200),
    ("prd_7", "SP-CHIPS-BBQ", "Snackify Potato Chips BBQ 70g", "br_4", "cmp_3", "cat_2", 12500, 8000, 180),
    ("prd_8", "TC-VITC-DRINK", "TropiCare Vitamin C Shot 60ml", "br_5", "cmp_4", "cat_4", 15000, 10500, 90),
    ("prd_9", "GH-GRAN-BOX", "GreenHarvest Granola 300g", "br_6", "cmp_5", "cat_6", 48000, 34000, 60),
    ("prd_10", "GH-OATS-500", "GreenHarvest Oats 500g", "br_6", "cmp_5", "cat_6", 42000, 30000, 75),
    ("prd_11", "HP-ENERGY-250", "HydraPlus Energy 250ml", "br_7", "cmp_2", "cat_5", 18000, 12000, 140),
    ("prd_12", "HP-ISO-500", "HydraPlus Isotonic 500ml", "br_7", "cmp_2", "cat_5", 14000, 9000, 160),
    ("prd_13", "PB-PROTEIN-BAR", "PureBite Protein Bar 50g", "br_8", "cmp_3", "cat_4", 25000, 17000, 110),
    ("prd_14", "PB-VEGAN-COOKIE", "PureBite Vegan Cookie 45g", "br_8", "cmp_3", "cat_2", 16000, 10500, 95),
    ("prd_15", "ND-TEA-LESSSUGAR", "NusaDrink Iced Tea Less Sugar 500ml", "br_3", "cmp_2", "cat_1", 10500, 6800, 210),
    ("prd_16", "SP-NUTMIX-90", "Snackify Nut Mix 90g", "br_4", "cmp_3", "cat_2", 18500, 12500, 70),
    ("prd_17", "TC-IMMUNE-DRINK", "TropiCare Immune Boost 60ml", "br_5", "cmp_4", "cat_4", 18000, 12500, 55),
    ("prd_18", "GH-ALMOND-200", "GreenHarvest Almonds 200g", "br_6", "cmp_5", "cat_6", 52000, 38000, 40),
    ("prd_19", "HP-ENERGY-500", "HydraPlus Energy 500ml", "br_7", "cmp_2", "cat_5", 25000, 17000, 65),
    ("prd_20", "PB-PROTEIN-COOKIE", "PureBite Protein Cookie 55g", "br_8", "cmp_3", "cat_4", 27000, 19000, 50),
];

// (id, product, type, quantity, unit amount)
const TRANSACTIONS: &[(&str, &str, TransactionType, u32, u64)] = &[
    ("tx_1", "prd_1", Purchase, 120, 18000),
    ("tx_2", "prd_1", Sale, 5, 24000),
    ("tx_3", "prd_4", Purchase, 250, 6500),
    ("tx_4", "prd_4", Sale, 12, 10000),
    ("tx_5", "prd_6", Purchase, 200, 8000),
    ("tx_6", "prd_6", Sale, 20, 12500),
    ("tx_7", "prd_9", Purchase, 60, 34000),
    ("tx_8", "prd_9", Sale, 3, 48000),
    ("tx_9", "prd_11", Purchase, 140, 12000),
    ("tx_10", "prd_11", Sale, 18, 18000),
    ("tx_11", "prd_13", Purchase, 110, 17000),
    ("tx_12", "prd_13", Sale, 10, 25000),
    ("tx_13", "prd_18", Purchase, 40, 38000),
    ("tx_14", "prd_18", Sale, 4, 52000),
    ("tx_15", "prd_5", Purchase, 500, 2500),
    ("tx_16", "prd_5", Sale, 30, 5000),
    ("tx_17", "prd_8", Purchase, 90, 10500),
    ("tx_18", "prd_8", Sale, 6, 15000),
    ("tx_19", "prd_3", Purchase, 80, 14000),
    ("tx_20", "prd_3", Sale, 7, 20000),
    ("tx_21", "prd_2", Purchase, 300, 6000),
    ("tx_22", "prd_2", Sale, 25, 9000),
    ("tx_23", "prd_16", Purchase, 70, 12500),
    ("tx_24", "prd_16", Sale, 5, 18500),
    ("tx_25", "prd_12", Purchase, 160, 9000),
    ("tx_26", "prd_12", Sale, 14, 14000),
    ("tx_27", "prd_10", Purchase, 75, 30000),
    ("tx_28", "prd_10", Sale, 8, 42000),
    ("tx_29", "prd_14", Purchase, 95, 10500),
    ("tx_30", "prd_14", Sale, 9, 16000),
];


/// In-memory master data catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    companies: Vec<Company>,
    brands: Vec<Brand>,
    categories: Vec<Category>,
    products: Vec<Product>,
    transactions: Vec<Transaction>,
}

impl Catalog {
    /// Build the catalog from the built-in seed data.
    pub fn new() -> Self {
        Self::seeded_at(Utc::now())
    }

    /// Build the catalog with every `created_at` set to `now`.
    pub fn seeded_at(now: DateTime<Utc>) -> Self {
        let companies = COMPANIES
            .iter()
            .map(|&(id, name, country)| Company {
                id: id.to_string(),
                name: name.to_string(),
                country: country.to_string(),
                created_at: now,
            })
            .collect();

        let brands = BRANDS
            .iter()
            .map(|&(id, name, company_id)| Brand {
                id: id.to_string(),
                name: name.to_string(),
                company_id: company_id.to_string(),
                created_at: now,
            })
            .collect();

        let categories = CATEGORIES
            .iter()
            .map(|&(id, name, parent)| Category {
                id: id.to_string(),
                name: name.to_string(),
                parent_category_id: parent.map(str::to_string),
            })
            .collect();

        let products = PRODUCTS
            .iter()
            .map(
                |&(id, sku, name, brand_id, company_id, category_id, price, cost, stock)| Product {
                    id: id.to_string(),
                    sku: sku.to_string(),
                    name: name.to_string(),
                    brand_id: brand_id.to_string(),
                    company_id: company_id.to_string(),
                    category_id: category_id.to_string(),
                    price,
                    cost,
                    stock,
                    created_at: now,
                },
            )
            .collect();

        let transactions = TRANSACTIONS
            .iter()
            .map(|&(id, product_id, kind, quantity, unit)| Transaction {
                id: id.to_string(),
                product_id: product_id.to_string(),
                kind,
                quantity,
                unit_cost: (kind == Purchase).then_some(unit),
                unit_price: (kind == Sale).then_some(unit),
                created_at: now,
            })
            .collect();

        Self {
            companies,
            brands,
            categories,
            products,
            transactions,
        }
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn brands(&self) -> &[Brand] {
        &self.brands
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// List every record of a kind as a JSON array.
    pub fn list_all(&self, kind: RecordKind) -> Value {
        match kind {
            RecordKind::Companies => to_json(&self.companies),
            RecordKind::Brands => to_json(&self.brands),
            RecordKind::Categories => to_json(&self.categories),
            RecordKind::Products => to_json(&self.products),
            RecordKind::Transactions => to_json(&self.transactions),
        }
    }

    /// Find a single record of a kind by ID.
    pub fn find_by_id(&self, kind: RecordKind, id: &str) -> Option<Value> {
        match kind {
            RecordKind::Companies => find(&self.companies, id, |c| &c.id),
            RecordKind::Brands => find(&self.brands, id, |b| &b.id),
            RecordKind::Categories => find(&self.categories, id, |c| &c.id),
            RecordKind::Products => find(&self.products, id, |p| &p.id),
            RecordKind::Transactions => find(&self.transactions, id, |t| &t.id),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn find<T: Serialize>(records: &[T], id: &str, key: impl Fn(&T) -> &String) -> Option<Value> {
    records.iter().find(|r| key(r) == id).map(to_json)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!("Failed to serialize catalog records: {}", e);
        Value::Null
    })
}
