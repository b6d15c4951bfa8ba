// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `export.rs`

#[cfg(test)]
mod tests {
    use crate::attributes::HostAttributes;
    use crate::config::KeysConfig;
    use crate::export::{
        export_attributes, export_groups, export_hosts, export_inventory, export_tree,
        AnsibleGroup,
    };
    use crate::tree::{HostMap, Tree};

    fn attrs(os: &str, env: &str, role: &str, srv: &str) -> HostAttributes {
        HostAttributes {
            os: os.to_string(),
            env: env.to_string(),
            role: role.to_string(),
            srv: srv.to_string(),
            vars: String::new(),
        }
    }

    fn sample_hosts() -> HostMap {
        let mut hosts = HostMap::new();
        hosts.insert(
            "app01".to_string(),
            vec![attrs("linux", "dev", "app", "tomcat_backend_auth")],
        );
        hosts.insert(
            "app02".to_string(),
            vec![attrs("linux", "dev", "app", "tomcat_backend_media")],
        );
        hosts.insert(
            "db01".to_string(),
            vec![
                attrs("bsd", "prod", "db", ""),
                attrs("bsd", "prod", "storage", ""),
            ],
        );
        hosts
    }

    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        tree.import_hosts(&sample_hosts(), "_");
        tree.sort_children();
        tree
    }

    // ========================================================================
    // export_inventory
    // ========================================================================

    #[test]
    fn test_export_inventory_groups() {
        let inventory = export_inventory(&sample_tree());

        assert_eq!(
            inventory["all"].children,
            vec!["all_app", "all_db", "all_host", "all_storage", "dev", "prod"]
        );
        assert!(inventory["all"].hosts.is_empty());
        assert_eq!(inventory["all_app_tomcat"].hosts, vec!["app01", "app02"]);
        assert_eq!(
            inventory["dev_app_tomcat_backend"],
            AnsibleGroup {
                children: vec![
                    "dev_app_tomcat_backend_auth".to_string(),
                    "dev_app_tomcat_backend_media".to_string()
                ],
                hosts: Vec::new(),
            }
        );
        assert_eq!(inventory["prod_host_bsd"].hosts, vec!["db01"]);
    }

    #[test]
    fn test_ansible_group_omits_empty_lists() {
        let inventory = export_inventory(&sample_tree());

        let json = serde_json::to_value(&inventory["all_app_tomcat"]).unwrap();
        assert_eq!(json, serde_json::json!({"hosts": ["app01", "app02"]}));

        let json = serde_json::to_value(&inventory["dev"]).unwrap();
        assert!(json.get("hosts").is_none());
        assert!(json.get("children").is_some());
    }

    // ========================================================================
    // export_hosts / export_groups
    // ========================================================================

    #[test]
    fn test_export_hosts() {
        let hosts = export_hosts(&sample_tree());

        assert_eq!(
            hosts["app01"],
            vec![
                "all",
                "all_app",
                "all_app_tomcat",
                "all_host",
                "all_host_linux",
                "dev",
                "dev_app",
                "dev_app_tomcat",
                "dev_app_tomcat_backend",
                "dev_app_tomcat_backend_auth",
                "dev_host",
                "dev_host_linux",
            ]
        );
        assert!(hosts["db01"].contains(&"prod_db".to_string()));
        assert!(hosts["db01"].contains(&"prod_storage".to_string()));
    }

    #[test]
    fn test_export_groups() {
        let groups = export_groups(&sample_tree());

        assert_eq!(groups["dev_app_tomcat_backend"], vec!["app01", "app02"]);
        assert_eq!(groups["dev_app_tomcat_backend_media"], vec!["app02"]);
        assert_eq!(groups["prod"], vec!["db01"]);
    }

    #[test]
    fn test_export_groups_all_is_every_host() {
        let groups = export_groups(&sample_tree());
        let every_host: Vec<String> = sample_hosts().keys().cloned().collect();

        assert_eq!(groups["all"], every_host);
    }

    #[test]
    fn test_hosts_and_groups_are_duals() {
        let tree = sample_tree();
        let hosts = export_hosts(&tree);
        let groups = export_groups(&tree);

        for (group, members) in &groups {
            for (host, host_groups) in &hosts {
                assert_eq!(
                    members.contains(host),
                    host_groups.contains(group),
                    "host {host} / group {group}"
                );
            }
        }
    }

    #[test]
    fn test_exports_are_stable() {
        let tree = sample_tree();

        let first = serde_json::to_string(&export_inventory(&tree)).unwrap();
        let second = serde_json::to_string(&export_inventory(&tree)).unwrap();
        assert_eq!(first, second);

        let first = serde_json::to_string(&export_tree(&tree)).unwrap();
        let second = serde_json::to_string(&export_tree(&tree)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exports_do_not_depend_on_import_order() {
        let mut reversed = Tree::new();
        let hosts = sample_hosts();
        for (host, records) in hosts.iter().rev() {
            let single: HostMap = [(host.clone(), records.iter().rev().cloned().collect())]
                .into_iter()
                .collect();
            reversed.import_hosts(&single, "_");
        }
        reversed.sort_children();

        assert_eq!(export_inventory(&reversed), export_inventory(&sample_tree()));
        assert_eq!(export_tree(&reversed), export_tree(&sample_tree()));
    }

    // ========================================================================
    // export_tree / export_attributes
    // ========================================================================

    #[test]
    fn test_export_tree() {
        let root = export_tree(&sample_tree());

        assert_eq!(root.name, "all");
        let dev = root.children.iter().find(|c| c.name == "dev").unwrap();
        let names: Vec<&str> = dev.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["dev_app", "dev_host"]);

        let linux = &dev.children[1].children[0];
        assert_eq!(linux.name, "dev_host_linux");
        assert_eq!(linux.hosts, vec!["app01", "app02"]);
        assert!(linux.children.is_empty());
    }

    #[test]
    fn test_export_attributes() {
        let exported = export_attributes(&sample_hosts(), &KeysConfig::default());

        assert_eq!(exported["db01"].len(), 2);
        assert_eq!(exported["db01"][1]["ROLE"], "storage");
        assert_eq!(exported["app01"][0]["SRV"], "tomcat_backend_auth");
        assert_eq!(exported["app01"][0]["VARS"], "");
    }
}
