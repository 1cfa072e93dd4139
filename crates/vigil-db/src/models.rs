/// Database row types, mapped directly from SQLite rows.
/// Timestamps are stored as fixed-width ISO text so that string order is time order.

pub struct LogRow {
    pub id: String,
    pub timestamp: String,
    pub status: String,
    pub details: Option<String>,
    pub created_at: String,
}
