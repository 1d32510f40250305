//! Built-in app catalog, generated at build time from `manifests/*.toml`.

use berry_app_contract::{AppRegistry, RegistryError};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/app_catalog_generated.rs"));
}

pub use generated::APP_CATALOG_JSON;

/// Parses the built-in catalog into a registry.
pub fn builtin_registry() -> Result<AppRegistry, RegistryError> {
    AppRegistry::from_json(APP_CATALOG_JSON)
}

#[cfg(test)]
mod tests {
    use berry_app_contract::ApplicationId;
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(raw: &str) -> ApplicationId {
        ApplicationId::trusted(raw)
    }

    #[test]
    fn builtin_catalog_parses_with_expected_policies() {
        let registry = builtin_registry().expect("catalog");
        assert_eq!(registry.len(), 6);

        let finder = registry.get(&id("finder")).expect("finder");
        assert!(finder.policy.singleton());
        assert!(finder.policy.allows_zero_windows());

        let calculator = registry.get(&id("calculator")).expect("calculator");
        assert!(calculator.policy.singleton());
        assert!(!calculator.policy.allows_zero_windows());

        let terminal = registry.get(&id("terminal")).expect("terminal");
        assert!(!terminal.policy.singleton());
    }

    #[test]
    fn default_dock_is_ordered_by_manifest_order() {
        let registry = builtin_registry().expect("catalog");
        assert_eq!(
            registry.default_pinned(),
            vec![
                id("finder"),
                id("music"),
                id("text-edit"),
                id("calculator"),
                id("terminal")
            ]
        );
    }
}
