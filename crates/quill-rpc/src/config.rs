/// Upstream endpoint settings.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub base_url: String,
    /// Bearer token sent with every call, if the upstream wants one.
    pub token: Option<String>,
}

impl RpcConfig {
    /// Reads `QUILL_RPC_URL` and `QUILL_RPC_TOKEN`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("QUILL_RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8081".into());
        let token = std::env::var("QUILL_RPC_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Self { base_url, token }
    }
}
