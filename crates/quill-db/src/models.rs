/// Database row types — these map directly to SQLite rows.
/// JSON columns stay as text here and are decoded in `queries`.

pub struct MessageRow {
    pub peer_namespace: i32,
    pub peer_id: i64,
    pub namespace: i32,
    pub id: i32,
    pub globally_unique_id: Option<i64>,
    pub timestamp: i32,
    pub incoming: bool,
    pub tags: String,
    pub forward_info: Option<String>,
    pub author_id: Option<String>,
    pub text: String,
    pub attributes: String,
    pub media: String,
}

pub struct PeerRow {
    pub peer_namespace: i32,
    pub peer_id: i64,
    pub title: String,
}
