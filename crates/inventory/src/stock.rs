use serde::{Deserialize, Serialize};

use bazaarops_core::{ProductId, StoreId};

/// Reorder threshold applied when a row does not carry one.
pub const DEFAULT_REORDER_THRESHOLD: f64 = 10.0;

fn default_threshold() -> f64 {
    DEFAULT_REORDER_THRESHOLD
}

fn default_unit() -> String {
    "unit".to_string()
}

/// Stock of one product in one store, joined with the catalog fields the
/// analysis routines need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: f64,
    #[serde(default = "default_threshold")]
    pub reorder_threshold: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub supplier_whatsapp: Option<String>,
    #[serde(default)]
    pub cost_price: f64,
}

impl StockLevel {
    pub fn new(
        store_id: StoreId,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            store_id,
            product_id,
            product_name: product_name.into(),
            quantity,
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            unit: default_unit(),
            supplier_name: None,
            supplier_whatsapp: None,
            cost_price: 0.0,
        }
    }

    pub fn with_reorder_threshold(mut self, threshold: f64) -> Self {
        self.reorder_threshold = threshold;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_supplier(mut self, name: impl Into<String>, whatsapp: Option<String>) -> Self {
        self.supplier_name = Some(name.into());
        self.supplier_whatsapp = whatsapp;
        self
    }

    /// Below the reorder threshold (listed as "low stock" in daily summaries).
    pub fn is_low(&self) -> bool {
        self.quantity < self.reorder_threshold
    }

    /// At or below the reorder threshold (triggers a supplier alert).
    pub fn is_critical(&self) -> bool {
        self.quantity <= self.reorder_threshold
    }

    /// Quantity suggested to the supplier for a critical item.
    pub fn suggested_reorder(&self) -> f64 {
        self.reorder_threshold * 2.0
    }
}

/// Stock remaining after selling `sold` units.
///
/// No floor at zero: shelf counts are reconciled by hand, so the book value may
/// go negative.
pub fn after_sale(current: f64, sold: f64) -> f64 {
    current - sold
}
