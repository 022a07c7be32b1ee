//! Process-wide schema registry
//!
//! The notice/command schema is loaded once per process, not per
//! connection: the first caller awaits the initialization and every later
//! caller gets the cached registry (single-flight via `OnceCell`).

use tokio::sync::OnceCell;
use vextm_core::SchemaRegistry;

static REGISTRY: OnceCell<SchemaRegistry> = OnceCell::const_new();

/// The shared schema registry, initializing it on first use.
pub async fn registry() -> &'static SchemaRegistry {
    REGISTRY
        .get_or_init(|| async { SchemaRegistry::load() })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_is_initialized_once() {
        let a = registry().await as *const SchemaRegistry;
        let b = registry().await as *const SchemaRegistry;
        assert_eq!(a, b);
    }
}
