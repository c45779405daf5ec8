use bazaarops_core::StoreId;

/// A store-scoped snapshot the summarizer is asked about.
///
/// Inputs are gathered by the caller; an analysis only phrases them. It must
/// not mutate anything.
pub trait Analysis: Send + Sync {
    /// The store this snapshot belongs to.
    fn store_id(&self) -> &StoreId;

    /// Short label for logs (e.g. `"daily_report"`).
    fn kind(&self) -> &'static str;

    /// The full prompt sent to the summarizer.
    fn prompt(&self) -> String;
}
