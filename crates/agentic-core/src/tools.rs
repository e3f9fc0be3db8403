//! Tool registry
//!
//! Maps every tool name advertised by the connected servers to the session
//! that owns it. Rebuilt for each query so catalog changes are picked up.

use std::collections::HashMap;
use std::sync::Arc;

use agentic_mcp::{McpTool, ToolCallResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ToolError};
use crate::mcp_manager::{ProviderSession, ToolSessionPool};

/// A tool as advertised by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl From<McpTool> for ToolDescriptor {
    fn from(tool: McpTool) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema,
        }
    }
}

/// A tool name claimed by more than one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCollision {
    pub tool: String,
    /// Provider whose tool is used
    pub kept: String,
    /// Provider whose tool was shadowed
    pub shadowed: String,
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    session: Arc<ProviderSession>,
}

/// Name-to-provider routing table
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
    collisions: Vec<ToolCollision>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every session in the pool for its current tools
    pub async fn build(pool: &ToolSessionPool) -> Result<Self> {
        let mut registry = Self::new();

        for session in pool.sessions() {
            let tools = session.list_tools().await.map_err(|e| {
                ToolError::ExecutionFailed(format!("listing tools of '{}': {}", session.name(), e))
            })?;

            for tool in tools {
                registry.register(tool, session.clone());
            }
        }

        debug!(tools = registry.len(), collisions = registry.collisions.len(), "Tool registry built");
        Ok(registry)
    }

    /// Register a tool. The first provider to claim a name keeps it; later
    /// claims are recorded as collisions and ignored.
    pub fn register(&mut self, descriptor: ToolDescriptor, session: Arc<ProviderSession>) -> bool {
        if let Some(existing) = self.tools.get(&descriptor.name) {
            warn!(
                tool = %descriptor.name,
                kept = existing.session.name(),
                shadowed = session.name(),
                "Duplicate tool name, keeping first provider"
            );
            self.collisions.push(ToolCollision {
                tool: descriptor.name,
                kept: existing.session.name().to_string(),
                shadowed: session.name().to_string(),
            });
            return false;
        }

        self.order.push(descriptor.name.clone());
        self.tools
            .insert(descriptor.name.clone(), RegisteredTool { descriptor, session });
        true
    }

    /// Session that owns `name`
    pub fn resolve(&self, name: &str) -> std::result::Result<&Arc<ProviderSession>, ToolError> {
        self.tools
            .get(name)
            .map(|entry| &entry.session)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|entry| &entry.descriptor)
            .collect()
    }

    pub fn collisions(&self) -> &[ToolCollision] {
        &self.collisions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Route a call to the owning session
    pub async fn dispatch(&self, name: &str, arguments: Value) -> std::result::Result<ToolCallResult, ToolError> {
        let session = self.resolve(name)?;
        debug!(tool = name, server = session.name(), "Dispatching tool call");
        session.call_tool(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_manager::ToolProvider;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticProvider {
        tools: Vec<&'static str>,
        reply: &'static str,
    }

    #[async_trait]
    impl ToolProvider for StaticProvider {
        async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError> {
            Ok(self
                .tools
                .iter()
                .map(|name| ToolDescriptor::new(*name, "", json!({ "type": "object" })))
                .collect())
        }

        async fn call_tool(&self, _name: &str, _arguments: Value) -> std::result::Result<ToolCallResult, ToolError> {
            Ok(ToolCallResult::text(self.reply))
        }

        async fn shutdown(&self) -> std::result::Result<(), ToolError> {
            Ok(())
        }
    }

    fn pool(providers: Vec<(&str, Vec<&'static str>, &'static str)>) -> ToolSessionPool {
        ToolSessionPool::from_providers(
            providers
                .into_iter()
                .map(|(name, tools, reply)| {
                    (name.to_string(), Box::new(StaticProvider { tools, reply }) as Box<dyn ToolProvider>)
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_every_tool_is_registered() {
        let pool = pool(vec![("a", vec!["read", "write"], "a"), ("b", vec!["search"], "b")]);
        let registry = ToolRegistry::build(&pool).await.unwrap();

        assert_eq!(registry.len(), 3);
        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["read", "write", "search"]);
        assert_eq!(registry.resolve("search").unwrap().name(), "b");
        assert!(registry.collisions().is_empty());
    }

    #[tokio::test]
    async fn test_first_provider_wins_duplicate() {
        let pool = pool(vec![("alpha", vec!["run"], "from alpha"), ("beta", vec!["run", "other"], "from beta")]);
        let registry = ToolRegistry::build(&pool).await.unwrap();

        assert_eq!(registry.len(), 2);
        let result = registry.dispatch("run", json!({})).await.unwrap();
        assert_eq!(result.joined_text(), "from alpha");
        assert_eq!(
            registry.collisions(),
            &[ToolCollision {
                tool: "run".to_string(),
                kept: "alpha".to_string(),
                shadowed: "beta".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::build(&pool(vec![("a", vec!["read"], "x")])).await.unwrap();
        let err = registry.dispatch("delete", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "delete"));
    }

    #[tokio::test]
    async fn test_empty_pool_gives_empty_registry() {
        let registry = ToolRegistry::build(&ToolSessionPool::default()).await.unwrap();
        assert!(registry.is_empty());
        assert!(!registry.contains("anything"));
    }
}
