//! Tool discovery, dispatch and the built-in inventory provider.

pub mod arguments;
pub mod descriptor;
pub mod dispatcher;
pub mod inventory;
pub mod provider;
pub mod registry;

pub use arguments::ToolArguments;
pub use descriptor::ToolDescriptor;
pub use dispatcher::ToolDispatcher;
pub use inventory::{InventoryStore, InventoryToolProvider, StaticInventory};
pub use provider::{ContentBlock, ProvidedTool, ToolCallResult, ToolProvider};
pub use registry::list_tool_descriptors;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{ProvidedTool, ToolArguments, ToolCallResult, ToolProvider};
    use crate::error::RelayError;

    /// Tool provider with canned listings and results that records its calls.
    pub struct ScriptedToolProvider {
        tools: Vec<ProvidedTool>,
        results: HashMap<String, ToolCallResult>,
        listing_error: Option<String>,
        list_count: AtomicUsize,
        calls: Mutex<Vec<String>>,
        last_arguments: Mutex<Option<ToolArguments>>,
    }

    impl ScriptedToolProvider {
        pub fn new(tools: Vec<ProvidedTool>) -> Self {
            Self {
                tools,
                results: HashMap::new(),
                listing_error: None,
                list_count: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
                last_arguments: Mutex::new(None),
            }
        }

        pub fn failing_listing(message: &str) -> Self {
            let mut provider = Self::new(Vec::new());
            provider.listing_error = Some(message.to_string());
            provider
        }

        pub fn with_result(mut self, name: &str, result: ToolCallResult) -> Self {
            self.results.insert(name.to_string(), result);
            self
        }

        pub fn list_count(&self) -> usize {
            self.list_count.load(Ordering::SeqCst)
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock should succeed").clone()
        }

        pub fn last_arguments(&self) -> Option<ToolArguments> {
            self.last_arguments
                .lock()
                .expect("lock should succeed")
                .clone()
        }
    }

    #[async_trait]
    impl ToolProvider for ScriptedToolProvider {
        async fn list_tools(&self) -> Result<Vec<ProvidedTool>, RelayError> {
            self.list_count.fetch_add(1, Ordering::SeqCst);
            match &self.listing_error {
                Some(message) => Err(RelayError::Stream(message.clone())),
                None => Ok(self.tools.clone()),
            }
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: &ToolArguments,
        ) -> Result<ToolCallResult, RelayError> {
            self.calls
                .lock()
                .expect("lock should succeed")
                .push(name.to_string());
            *self.last_arguments.lock().expect("lock should succeed") = Some(arguments.clone());
            self.results
                .get(name)
                .cloned()
                .ok_or_else(|| RelayError::ToolNotFound(name.to_string()))
        }
    }
}
