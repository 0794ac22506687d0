//! Integration tests for types

#[cfg(test)]
mod tests {
    use waypoint_types::*;

    #[test]
    fn test_recipe_deserializes_catalog_payload() {
        let payload = r#"{
            "name": "redis-open-source-integration",
            "displayName": "Redis Integration",
            "targetType": "HOST",
            "keywords": ["Database"],
            "validationNrql": "SELECT count(*) FROM RedisSample",
            "logMatch": [{"name": "redis", "file": "/var/log/redis/*.log"}],
            "successLink": {"type": "explorer", "filter": "\"`tags.language` = 'redis'\""}
        }"#;

        let recipe: Recipe = serde_json::from_str(payload).unwrap();
        assert_eq!(recipe.display_name, "Redis Integration");
        assert!(recipe.has_validation());
        assert!(!recipe.has_application_target_type());
        assert_eq!(recipe.log_match.len(), 1);
        assert_eq!(
            recipe.success_link.map(|l| l.link_type),
            Some(SuccessLinkType::Explorer)
        );
        assert!(recipe.vars.is_empty());
    }

    #[test]
    fn test_apm_keyword_is_case_insensitive() {
        let java = Recipe::new("java-agent", "Java Agent")
            .with_target_type(TargetType::Application)
            .with_keyword("APM");
        assert!(java.is_apm());
        assert!(java.has_application_target_type());

        let nginx = Recipe::new("nginx-integration", "Nginx Integration").with_keyword("web");
        assert!(!nginx.is_apm());
    }

    #[test]
    fn test_mandatory_recipes() {
        assert!(Recipe::new(INFRA_AGENT_RECIPE_NAME, "Infrastructure Agent").is_mandatory());
        assert!(Recipe::new(LOGGING_RECIPE_NAME, "Logs").is_mandatory());
        assert!(!Recipe::new("mysql-integration", "MySQL").is_mandatory());
    }

    #[test]
    fn test_blank_validation_query_is_not_validation() {
        let recipe = Recipe::new("noop", "No-op").with_validation_nrql("   ");
        assert!(!recipe.has_validation());
    }

    #[test]
    fn test_set_recipe_var_overwrites() {
        let mut recipe = Recipe::new(LOGGING_RECIPE_NAME, "Logs");
        recipe.set_recipe_var(DISCOVERED_LOG_FILES_VAR, "/var/log/a.log");
        recipe.set_recipe_var(DISCOVERED_LOG_FILES_VAR, "/var/log/a.log,/var/log/b.log");
        assert_eq!(
            recipe.vars.get(DISCOVERED_LOG_FILES_VAR).map(String::as_str),
            Some("/var/log/a.log,/var/log/b.log")
        );
    }

    #[test]
    fn test_entity_guid_blank_detection() {
        assert!(EntityGuid::new("  ").is_empty());
        let guid = EntityGuid::from("MTIzNDU2fElORlJBfE5BfDEyMzQ1");
        assert!(!guid.is_empty());
        assert_eq!(guid.to_string(), "MTIzNDU2fElORlJBfE5BfDEyMzQ1");
        assert_eq!(
            serde_json::to_string(&guid).unwrap(),
            r#""MTIzNDU2fElORlJBfE5BfDEyMzQ1""#
        );
    }

    #[test]
    fn test_manifest_serializes_camel_case() {
        let mut manifest = DiscoveryManifest::for_host("web-01");
        manifest.discovered_processes.push(DiscoveredProcess {
            pid: 42,
            name: "redis-server".into(),
            cmdline: "redis-server *:6379".into(),
            matching_recipe: Some("redis-open-source-integration".into()),
        });
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["hostname"], "web-01");
        assert_eq!(
            json["discoveredProcesses"][0]["matchingRecipe"],
            "redis-open-source-integration"
        );
    }
}
