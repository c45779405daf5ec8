/// Known event types.
///
/// Publishing any other type is valid; it simply reaches no handler.
pub struct EventKind;

impl EventKind {
    /// A customer order was placed; carries the line items to take out of stock.
    pub const ORDER_CREATED: &'static str = "order_created";
    /// Stock was adjusted for an order.
    pub const INVENTORY_UPDATED: &'static str = "inventory_updated";
    /// Ask the summary agent to write today's summary for a store.
    pub const GENERATE_DAILY_SUMMARY: &'static str = "generate_daily_summary";
}
