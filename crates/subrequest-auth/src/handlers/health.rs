//! Health check handler.
//!
//! The service holds no connections worth probing; a response proves the
//! process is serving.

/// Handler for GET /healthz.
pub async fn healthz() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz_returns_ok() {
        assert_eq!(healthz().await, "OK");
    }
}
