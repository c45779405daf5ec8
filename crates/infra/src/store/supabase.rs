//! PostgREST adapter for the hosted Supabase database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use bazaarops_core::{CustomerId, OrderId, ProductId, StoreId};
use bazaarops_inventory::{DEFAULT_REORDER_THRESHOLD, StockLevel};
use bazaarops_parties::{Customer, StoreProfile};
use bazaarops_sales::{DailyMetrics, OrderLine, OrderRecord, OrderStatus};

use super::{RetailStore, StoreError, StoreResult, SummaryRecord};

const ORDER_SELECT: &str =
    "id,store_id,status,total_amount,profit_amount,created_at,customer_id,customers(name,phone),\
     order_items(product_id,quantity,unit_price,products(name,categories(name)))";

const INVENTORY_SELECT: &str =
    "store_id,product_id,quantity,reorder_threshold,products(name,supplier_name,supplier_whatsapp,cost_price,unit)";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub key: String,
    pub timeout: Duration,
}

/// [`RetailStore`] over Supabase's REST interface (`{url}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            key: config.key,
        })
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{table}", self.base))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> StoreResult<Vec<T>> {
        debug!(table, ?query, "supabase select");
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }

    async fn write(
        &self,
        method: reqwest::Method,
        table: &str,
        query: &[(&str, String)],
        body: JsonValue,
    ) -> StoreResult<()> {
        debug!(table, %method, ?query, "supabase write");
        let response = self
            .request(method, table)
            .query(query)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    async fn orders(&self, filters: Vec<(&str, String)>) -> StoreResult<Vec<OrderRecord>> {
        let mut query = vec![("select", ORDER_SELECT.to_string())];
        query.extend(filters);
        let rows: Vec<OrderRow> = self.select("orders", &query).await?;
        rows.into_iter().map(OrderRow::into_record).collect()
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

async fn ensure_success(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(body));
    }
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Numeric columns arrive as JSON numbers or, for `numeric`, as strings.
fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_id<T>(raw: String, what: &str) -> StoreResult<T>
where
    T: TryFrom<String>,
    T::Error: std::fmt::Display,
{
    T::try_from(raw).map_err(|e| StoreError::Decode(format!("{what}: {e}")))
}

#[derive(Debug, Deserialize)]
struct StoreRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    telegram_chat_id: JsonValue,
}

impl StoreRow {
    fn into_profile(self) -> StoreResult<StoreProfile> {
        let mut profile = StoreProfile::new(decode_id(self.id, "stores.id")?, self.name.unwrap_or_default());
        profile.notification_channel = text(&self.telegram_chat_id);
        Ok(profile)
    }
}

#[derive(Debug, Default, Deserialize)]
struct NameRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    categories: Option<NameRow>,
    #[serde(default)]
    supplier_name: Option<String>,
    #[serde(default)]
    supplier_whatsapp: JsonValue,
    #[serde(default)]
    cost_price: JsonValue,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderItemRow {
    product_id: String,
    #[serde(default)]
    quantity: JsonValue,
    #[serde(default)]
    unit_price: JsonValue,
    #[serde(default)]
    products: Option<ProductRow>,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    store_id: String,
    status: OrderStatus,
    #[serde(default)]
    total_amount: JsonValue,
    #[serde(default)]
    profit_amount: JsonValue,
    created_at: DateTime<Utc>,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    customers: Option<CustomerRow>,
    #[serde(default)]
    order_items: Vec<OrderItemRow>,
}

impl OrderRow {
    fn into_record(self) -> StoreResult<OrderRecord> {
        let mut order = OrderRecord::new(
            decode_id(self.id, "orders.id")?,
            decode_id(self.store_id, "orders.store_id")?,
            self.status,
            number(&self.total_amount).unwrap_or(0.0),
            self.created_at,
        )
        .with_profit(number(&self.profit_amount).unwrap_or(0.0));

        if self.customer_id.is_some() || self.customers.is_some() {
            let row = self.customers.unwrap_or(CustomerRow { name: None, phone: None });
            order = order.with_customer(Customer {
                id: self.customer_id.and_then(|c| CustomerId::new(c).ok()),
                name: row.name,
                phone: row.phone,
            });
        }

        for item in self.order_items {
            let product = item.products.unwrap_or_default();
            order = order.with_line(OrderLine {
                product_id: decode_id(item.product_id, "order_items.product_id")?,
                product_name: product.name.unwrap_or_default(),
                category: product.categories.and_then(|c| c.name),
                quantity: number(&item.quantity).unwrap_or(0.0),
                unit_price: number(&item.unit_price).unwrap_or(0.0),
            });
        }
        Ok(order)
    }
}

#[derive(Debug, Deserialize)]
struct InventoryRow {
    store_id: String,
    product_id: String,
    #[serde(default)]
    quantity: JsonValue,
    #[serde(default)]
    reorder_threshold: JsonValue,
    #[serde(default)]
    products: Option<ProductRow>,
}

impl InventoryRow {
    fn into_level(self) -> StoreResult<StockLevel> {
        let product = self.products.unwrap_or_default();
        let mut level = StockLevel::new(
            decode_id(self.store_id, "inventory.store_id")?,
            decode_id(self.product_id, "inventory.product_id")?,
            product.name.unwrap_or_default(),
            number(&self.quantity).unwrap_or(0.0),
        )
        .with_reorder_threshold(number(&self.reorder_threshold).unwrap_or(DEFAULT_REORDER_THRESHOLD));
        if let Some(unit) = product.unit {
            level = level.with_unit(unit);
        }
        level.supplier_name = product.supplier_name;
        level.supplier_whatsapp = text(&product.supplier_whatsapp);
        level.cost_price = number(&product.cost_price).unwrap_or(0.0);
        Ok(level)
    }
}

#[derive(Debug, Deserialize)]
struct QuantityRow {
    #[serde(default)]
    quantity: JsonValue,
}

#[async_trait]
impl RetailStore for SupabaseStore {
    async fn get_stores(&self) -> StoreResult<Vec<StoreProfile>> {
        let rows: Vec<StoreRow> = self
            .select("stores", &[("select", "id,name,telegram_chat_id".to_string())])
            .await?;
        rows.into_iter().map(StoreRow::into_profile).collect()
    }

    async fn get_store(&self, store_id: &StoreId) -> StoreResult<Option<StoreProfile>> {
        let rows: Vec<StoreRow> = self
            .select(
                "stores",
                &[("select", "id,name,telegram_chat_id".to_string()), ("id", eq(store_id))],
            )
            .await?;
        rows.into_iter().next().map(StoreRow::into_profile).transpose()
    }

    async fn get_order(&self, order_id: &OrderId) -> StoreResult<Option<OrderRecord>> {
        Ok(self.orders(vec![("id", eq(order_id))]).await?.into_iter().next())
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> StoreResult<()> {
        self.write(
            reqwest::Method::PATCH,
            "orders",
            &[("id", eq(order_id))],
            json!({ "status": status }),
        )
        .await
    }

    async fn get_inventory(&self, store_id: &StoreId, product_id: &ProductId) -> StoreResult<Option<f64>> {
        let rows: Vec<QuantityRow> = self
            .select(
                "inventory",
                &[
                    ("select", "quantity".to_string()),
                    ("store_id", eq(store_id)),
                    ("product_id", eq(product_id)),
                ],
            )
            .await?;
        match rows.first() {
            None => Ok(None),
            Some(row) => number(&row.quantity)
                .map(Some)
                .ok_or_else(|| StoreError::Decode(format!("inventory.quantity for {product_id}"))),
        }
    }

    async fn set_inventory(&self, store_id: &StoreId, product_id: &ProductId, quantity: f64) -> StoreResult<()> {
        self.write(
            reqwest::Method::PATCH,
            "inventory",
            &[("store_id", eq(store_id)), ("product_id", eq(product_id))],
            json!({ "quantity": quantity }),
        )
        .await
    }

    async fn insert_summary(&self, record: SummaryRecord) -> StoreResult<()> {
        let body = json!({
            "store_id": record.store_id,
            "summary": record.summary,
            "summary_date": record.date,
            "revenue": record.metrics.revenue,
            "order_count": record.metrics.order_count,
            "top_products": record.metrics.top_products,
            "low_stock_items": record.metrics.low_stock,
            "created_at": record.created_at,
        });
        self.write(reqwest::Method::POST, "daily_summaries", &[], body).await
    }

    async fn get_daily_metrics(&self, store_id: &StoreId, date: NaiveDate) -> StoreResult<DailyMetrics> {
        let next = date.succ_opt().unwrap_or(date);
        let orders = self
            .orders(vec![
                ("store_id", eq(store_id)),
                ("created_at", format!("gte.{date}")),
                ("created_at", format!("lt.{next}")),
            ])
            .await?;
        let stock = self.list_inventory(store_id).await?;
        Ok(DailyMetrics::compute(date, &orders, &stock))
    }

    async fn list_inventory(&self, store_id: &StoreId) -> StoreResult<Vec<StockLevel>> {
        let rows: Vec<InventoryRow> = self
            .select(
                "inventory",
                &[("select", INVENTORY_SELECT.to_string()), ("store_id", eq(store_id))],
            )
            .await?;
        rows.into_iter().map(InventoryRow::into_level).collect()
    }

    async fn orders_since(&self, store_id: &StoreId, since: DateTime<Utc>) -> StoreResult<Vec<OrderRecord>> {
        self.orders(vec![
            ("store_id", eq(store_id)),
            ("created_at", format!("gte.{}", since.to_rfc3339())),
        ])
        .await
    }

    async fn open_credit_orders(&self, store_id: &StoreId) -> StoreResult<Vec<OrderRecord>> {
        self.orders(vec![
            ("store_id", eq(store_id)),
            ("status", "in.(pending,credit)".to_string()),
        ])
        .await
    }
}
