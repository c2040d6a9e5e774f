//! In-process inventory tools behind the [`ToolProvider`] contract.
//!
//! The store is a trait so a real inventory backend can replace the static
//! table without the orchestrator noticing.

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::provider::{ProvidedTool, ToolCallResult, ToolProvider};
use crate::error::RelayError;

pub const INVENTORY_LEVELS_TOOL: &str = "GetInventoryLevels";
pub const WEEKLY_SALES_TOOL: &str = "GetWeeklySales";

/// Read access to stock and sales figures, keyed by product name.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn stock_levels(&self) -> Result<Vec<(String, u32)>, RelayError>;
    async fn weekly_sales(&self) -> Result<Vec<(String, u32)>, RelayError>;
}

/// Fixed cosmetics catalogue used for demos and tests.
#[derive(Debug, Clone)]
pub struct StaticInventory {
    stock: Vec<(String, u32)>,
    sales: Vec<(String, u32)>,
}

impl StaticInventory {
    pub fn new(stock: Vec<(String, u32)>, sales: Vec<(String, u32)>) -> Self {
        Self { stock, sales }
    }
}

impl Default for StaticInventory {
    fn default() -> Self {
        let rows = [
            ("Moisturizer", 6, 22),
            ("Shampoo", 8, 18),
            ("Body Spray", 28, 3),
            ("Hair Gel", 5, 2),
            ("Lip Balm", 12, 14),
            ("Skin Serum", 9, 19),
            ("Cleanser", 30, 4),
            ("Conditioner", 3, 1),
            ("Setting Powder", 17, 13),
            ("Dry Shampoo", 45, 17),
        ];
        Self {
            stock: rows.iter().map(|(n, s, _)| (n.to_string(), *s)).collect(),
            sales: rows.iter().map(|(n, _, w)| (n.to_string(), *w)).collect(),
        }
    }
}

#[async_trait]
impl InventoryStore for StaticInventory {
    async fn stock_levels(&self) -> Result<Vec<(String, u32)>, RelayError> {
        Ok(self.stock.clone())
    }

    async fn weekly_sales(&self) -> Result<Vec<(String, u32)>, RelayError> {
        Ok(self.sales.clone())
    }
}

/// Exposes an [`InventoryStore`] as two argument-free tools.
pub struct InventoryToolProvider<S = StaticInventory> {
    store: S,
}

impl<S: InventoryStore> InventoryToolProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl InventoryToolProvider {
    /// Provider over the built-in catalogue.
    pub fn builtin() -> Self {
        Self::new(StaticInventory::default())
    }
}

impl Default for InventoryToolProvider {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl<S: InventoryStore> ToolProvider for InventoryToolProvider<S> {
    async fn list_tools(&self) -> Result<Vec<ProvidedTool>, RelayError> {
        Ok(vec![
            ProvidedTool::new(
                INVENTORY_LEVELS_TOOL,
                "Retrieves current inventory levels for all cosmetics products",
            ),
            ProvidedTool::new(
                WEEKLY_SALES_TOOL,
                "Retrieves weekly sales data for all products",
            ),
        ])
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError> {
        let (rows, suffix) = match name {
            INVENTORY_LEVELS_TOOL => (self.store.stock_levels().await, "units"),
            WEEKLY_SALES_TOOL => (self.store.weekly_sales().await, "units sold last week"),
            other => return Err(RelayError::ToolNotFound(other.to_string())),
        };

        match rows {
            Ok(rows) => Ok(ToolCallResult::text(format_rows(&rows, suffix))),
            Err(e) => Ok(ToolCallResult::error(e.to_string())),
        }
    }
}

fn format_rows(rows: &[(String, u32)], suffix: &str) -> String {
    rows.iter()
        .map(|(item, count)| format!("{item}: {count} {suffix}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OfflineStore;

    #[async_trait]
    impl InventoryStore for OfflineStore {
        async fn stock_levels(&self) -> Result<Vec<(String, u32)>, RelayError> {
            Err(RelayError::Provider {
                provider: "inventory".into(),
                message: "warehouse db offline".into(),
            })
        }

        async fn weekly_sales(&self) -> Result<Vec<(String, u32)>, RelayError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn lists_both_tools() {
        let names: Vec<String> = InventoryToolProvider::builtin()
            .list_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec![INVENTORY_LEVELS_TOOL, WEEKLY_SALES_TOOL]);
    }

    #[tokio::test]
    async fn inventory_levels_render_one_line_per_item() {
        let result = InventoryToolProvider::builtin()
            .call_tool(INVENTORY_LEVELS_TOOL, &ToolArguments::empty())
            .await
            .unwrap();
        let text = result.first_text().unwrap();
        assert_eq!(text.lines().count(), 10);
        assert_eq!(text.lines().next(), Some("Moisturizer: 6 units"));
        assert!(text.contains("Dry Shampoo: 45 units"));
    }

    #[tokio::test]
    async fn weekly_sales_use_sales_suffix() {
        let result = InventoryToolProvider::builtin()
            .call_tool(WEEKLY_SALES_TOOL, &ToolArguments::empty())
            .await
            .unwrap();
        assert!(result
            .first_text()
            .unwrap()
            .starts_with("Moisturizer: 22 units sold last week"));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let err = InventoryToolProvider::builtin()
            .call_tool("GetPrices", &ToolArguments::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ToolNotFound(name) if name == "GetPrices"));
    }

    #[tokio::test]
    async fn store_failure_is_an_error_result() {
        let result = InventoryToolProvider::new(OfflineStore)
            .call_tool(INVENTORY_LEVELS_TOOL, &ToolArguments::empty())
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("warehouse db offline"));
    }
}
