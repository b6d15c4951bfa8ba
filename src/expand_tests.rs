// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `expand.rs`

#[cfg(test)]
mod tests {
    use crate::attributes::HostAttributes;
    use crate::expand::expand;

    fn attrs(role: &str, srv: &str) -> HostAttributes {
        HostAttributes {
            os: "linux".to_string(),
            env: "dev".to_string(),
            role: role.to_string(),
            srv: srv.to_string(),
            vars: "a=1".to_string(),
        }
    }

    fn pairs(attrs: &HostAttributes) -> Vec<(String, String)> {
        expand("app01", attrs)
            .map(|(_, a)| (a.role, a.srv))
            .collect()
    }

    #[test]
    fn test_single_role_single_srv() {
        let record = attrs("app", "tomcat_backend");
        let expanded: Vec<_> = expand("app01", &record).collect();

        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].0, "app01");
        assert_eq!(expanded[0].1, record);
    }

    #[test]
    fn test_cartesian_product_in_split_order() {
        assert_eq!(
            pairs(&attrs("app,db", "web,api")),
            vec![
                ("app".to_string(), "web".to_string()),
                ("app".to_string(), "api".to_string()),
                ("db".to_string(), "web".to_string()),
                ("db".to_string(), "api".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_srv_yields_single_entry() {
        assert_eq!(
            pairs(&attrs("app,storage", "")),
            vec![
                ("app".to_string(), String::new()),
                ("storage".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_other_fields_are_copied() {
        let record = attrs("app,db", "");
        for (host, expanded) in expand("app01", &record) {
            assert_eq!(host, "app01");
            assert_eq!(expanded.os, "linux");
            assert_eq!(expanded.env, "dev");
            assert_eq!(expanded.vars, "a=1");
        }
    }

    #[test]
    fn test_exact_size() {
        let record = attrs("a,b,c", "x,y");
        let mut iter = expand("h", &record);
        assert_eq!(iter.len(), 6);
        iter.next();
        assert_eq!(iter.len(), 5);
    }

    #[test]
    fn test_clone_is_independent() {
        let record = attrs("a,b", "");
        let mut iter = expand("h", &record);
        let fresh = iter.clone();

        assert_eq!(iter.next().unwrap().1.role, "a");
        assert_eq!(iter.next().unwrap().1.role, "b");
        assert!(iter.next().is_none());

        assert_eq!(fresh.count(), 2);
    }
}
