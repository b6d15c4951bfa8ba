// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `filter.rs`

#[cfg(test)]
mod tests {
    use crate::attributes::HostAttributes;
    use crate::config::{FilterConfig, FilterSpec};
    use crate::errors::FilterError;
    use crate::filter::{FilterKey, FilterSet, HostFilter};

    fn spec(key: &str, operator: &str, values: &[&str]) -> FilterSpec {
        FilterSpec {
            key: key.to_string(),
            operator: operator.to_string(),
            values: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    fn record(env: &str, role: &str) -> HostAttributes {
        HostAttributes {
            os: "linux".to_string(),
            env: env.to_string(),
            role: role.to_string(),
            srv: "tomcat_backend".to_string(),
            vars: "owner=ops".to_string(),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    #[test]
    fn test_in_operator() {
        let filter = HostFilter::compile(&spec("env", "in", &["prod", "stage"])).unwrap();

        assert_eq!(filter.key(), FilterKey::Env);
        assert!(filter.matches("h", &record("prod", "app")));
        assert!(!filter.matches("h", &record("dev", "app")));
    }

    #[test]
    fn test_notin_operator() {
        let filter = HostFilter::compile(&spec("role", "notin", &["db"])).unwrap();

        assert!(filter.matches("h", &record("dev", "app")));
        assert!(!filter.matches("h", &record("dev", "db")));
    }

    #[test]
    fn test_regex_operator_on_hostname() {
        let filter = HostFilter::compile(&spec("host", "regex", &["^app\\d+$", "^web"])).unwrap();

        assert!(filter.matches("app01", &record("dev", "app")));
        assert!(filter.matches("web-frontend", &record("dev", "app")));
        assert!(!filter.matches("db01", &record("dev", "app")));
    }

    #[test]
    fn test_notregex_operator() {
        let filter = HostFilter::compile(&spec("vars", "notregex", &["owner=dev"])).unwrap();

        assert!(filter.matches("h", &record("dev", "app")));
    }

    #[test]
    fn test_srv_and_os_keys() {
        let srv = HostFilter::compile(&spec("srv", "regex", &["^tomcat_"])).unwrap();
        let os = HostFilter::compile(&spec("os", "in", &["windows"])).unwrap();

        assert!(srv.matches("h", &record("dev", "app")));
        assert!(!os.matches("h", &record("dev", "app")));
    }

    // ========================================================================
    // Compilation errors
    // ========================================================================

    #[test]
    fn test_unknown_key() {
        let err = HostFilter::compile(&spec("owner", "in", &["ops"])).unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownKey {
                key: "owner".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_operator() {
        let err = HostFilter::compile(&spec("env", "equals", &["prod"])).unwrap_err();
        assert!(matches!(err, FilterError::UnknownOperator { ref operator, .. } if operator == "equals"));
    }

    #[test]
    fn test_empty_values() {
        let err = HostFilter::compile(&spec("env", "in", &[])).unwrap_err();
        assert!(matches!(err, FilterError::EmptyValues { .. }));
    }

    #[test]
    fn test_invalid_regex() {
        let err = HostFilter::compile(&spec("host", "regex", &["(unclosed"])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
    }

    // ========================================================================
    // Filter sets
    // ========================================================================

    #[test]
    fn test_filter_set_requires_all() {
        let config = FilterConfig {
            enabled: true,
            filters: vec![spec("env", "in", &["prod"]), spec("role", "notin", &["db"])],
        };
        let set = FilterSet::compile(&config).unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.matches("h", &record("prod", "app")));
        assert!(!set.matches("h", &record("prod", "db")));
        assert!(!set.matches("h", &record("dev", "app")));
    }

    #[test]
    fn test_disabled_filter_set_passes_everything() {
        let config = FilterConfig {
            enabled: false,
            filters: vec![spec("bogus", "whatever", &[])],
        };
        let set = FilterSet::compile(&config).unwrap();

        assert!(set.is_empty());
        assert!(set.matches("h", &record("dev", "app")));
    }

    #[test]
    fn test_filter_set_reports_first_error() {
        let config = FilterConfig {
            enabled: true,
            filters: vec![spec("env", "in", &["prod"]), spec("env", "like", &["p"])],
        };

        assert!(matches!(
            FilterSet::compile(&config),
            Err(FilterError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_filter_key_round_trip_names() {
        for name in ["host", "os", "env", "role", "srv", "vars"] {
            let key: FilterKey = name.parse().unwrap();
            assert_eq!(key.to_string(), name);
        }
    }
}
