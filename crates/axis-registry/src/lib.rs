//! Command registry for the axis motion-control engine
//!
//! The CommandRegistry maps upper-cased command words to their
//! CommandSchema. Device modules populate it once at startup; the
//! validator and runner only read from it afterwards.

use axis_core::CommandSchema;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The command registry holds every known command schema
///
/// Lookup is case-insensitive: words are canonicalized to upper-case on
/// registration and on query.
pub struct CommandRegistry {
    /// Schemas indexed by upper-cased command word
    commands: DashMap<String, CommandSchema>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: DashMap::new(),
        }
    }

    /// Register a command schema
    ///
    /// A schema registered under an already-known word replaces the
    /// previous one.
    #[instrument(skip(self, schema), fields(command = %schema.name))]
    pub fn register(&self, schema: CommandSchema) {
        debug!(device = %schema.device, "Registering command");
        self.commands.insert(schema.name.clone(), schema);
    }

    /// Look up a command word
    pub fn get(&self, word: &str) -> Option<CommandSchema> {
        self.commands.get(&word.to_uppercase()).map(|s| s.clone())
    }

    /// Check whether a command word is known
    pub fn contains(&self, word: &str) -> bool {
        self.commands.contains_key(&word.to_uppercase())
    }

    /// Get all schemas routed to a device tag
    pub fn device_commands(&self, device: &str) -> Vec<CommandSchema> {
        self.commands
            .iter()
            .filter(|s| s.device == device)
            .map(|s| s.clone())
            .collect()
    }

    /// Get all device tags with registered commands, sorted and deduplicated
    pub fn devices(&self) -> Vec<String> {
        let mut devices: Vec<_> = self.commands.iter().map(|s| s.device.clone()).collect();
        devices.sort();
        devices.dedup();
        devices
    }

    /// Get all registered command words, sorted
    pub fn command_words(&self) -> Vec<String> {
        let mut words: Vec<_> = self.commands.iter().map(|s| s.key().clone()).collect();
        words.sort();
        words
    }

    /// Total number of registered commands
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for CommandRegistry
pub type SharedCommandRegistry = Arc<CommandRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use axis_core::{NumericKind, ParamSpec};

    fn sample_schema() -> CommandSchema {
        CommandSchema::new("MOVE_X", "gantry")
            .param(ParamSpec::required("Dist(mm)", NumericKind::Float).range(-2000.0, 2000.0))
    }

    #[test]
    fn test_register_and_get() {
        let registry = CommandRegistry::new();
        registry.register(sample_schema());

        let schema = registry.get("MOVE_X").unwrap();
        assert_eq!(schema.device, "gantry");
        assert_eq!(schema.params.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        registry.register(sample_schema());

        assert!(registry.contains("move_x"));
        assert!(registry.get("Move_X").is_some());
        assert!(!registry.contains("MOVE_W"));
    }

    #[test]
    fn test_device_commands() {
        let registry = CommandRegistry::new();
        registry.register(sample_schema());
        registry.register(CommandSchema::new("MOVE_Y", "gantry"));
        registry.register(CommandSchema::new("ENABLE", "fillhead"));

        assert_eq!(registry.device_commands("gantry").len(), 2);
        assert_eq!(registry.device_commands("fillhead").len(), 1);
        assert!(registry.device_commands("press").is_empty());
    }

    #[test]
    fn test_devices_sorted_and_deduplicated() {
        let registry = CommandRegistry::new();
        registry.register(sample_schema());
        registry.register(CommandSchema::new("MOVE_Y", "gantry"));
        registry.register(CommandSchema::new("ENABLE", "fillhead"));

        assert_eq!(registry.devices(), vec!["fillhead", "gantry"]);
    }

    #[test]
    fn test_reregistration_replaces() {
        let registry = CommandRegistry::new();
        registry.register(sample_schema());
        registry.register(CommandSchema::new("MOVE_X", "gantry").describe("updated"));

        assert_eq!(registry.command_count(), 1);
        assert_eq!(
            registry.get("MOVE_X").unwrap().description.as_deref(),
            Some("updated")
        );
    }
}
