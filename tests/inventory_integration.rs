// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests of the inventory pipeline
//!
//! Records go in through a datasource and come out as the exported views, exactly as
//! the CLI sees them.

mod common;

use ansible_dns_inventory::config::{FilterSpec, InventoryConfig};
use ansible_dns_inventory::datasource;
use ansible_dns_inventory::errors::InventoryError;
use ansible_dns_inventory::export::{
    export_attributes, export_groups, export_hosts, export_inventory, export_tree,
};
use ansible_dns_inventory::format::{render_attributes, render_list_map, OutputFormat};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use common::{inventory, SAMPLE_RECORDS};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Exported views
// ============================================================================

#[tokio::test]
async fn test_ansible_inventory() {
    let inventory = inventory(InventoryConfig::default(), SAMPLE_RECORDS);
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let groups = export_inventory(&tree);

    assert_eq!(
        groups["all"].children,
        vec!["all_app", "all_host", "all_storage", "dev", "prod"]
    );
    assert!(groups["all"].hosts.is_empty());
    assert_eq!(
        groups["all_app_tomcat"].hosts,
        vec!["app01", "app02", "app03"]
    );
    assert_eq!(
        groups["dev_app_tomcat_backend"].children,
        vec!["dev_app_tomcat_backend_auth", "dev_app_tomcat_backend_media"]
    );
    assert_eq!(groups["prod_app"].hosts, vec!["stor01"]);
    assert_eq!(groups["prod_storage"].hosts, vec!["stor01"]);

    let rendered = serde_json::to_value(&groups).unwrap();
    assert!(rendered["all"].get("hosts").is_none());
}

#[tokio::test]
async fn test_host_and_group_maps() {
    let inventory = inventory(InventoryConfig::default(), SAMPLE_RECORDS);
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let hosts = export_hosts(&tree);
    let groups = export_groups(&tree);

    assert!(!hosts.contains_key("broken"));
    assert_eq!(
        hosts["stor01"],
        vec![
            "all",
            "all_app",
            "all_host",
            "all_host_freebsd",
            "all_storage",
            "prod",
            "prod_app",
            "prod_host",
            "prod_host_freebsd",
            "prod_storage",
        ]
    );

    assert_eq!(groups["all"], vec!["app01", "app02", "app03", "stor01"]);
    assert_eq!(
        groups["dev_app_tomcat_backend"],
        vec!["app01", "app02", "app03"]
    );
    assert_eq!(groups["dev_app_tomcat_backend_auth"], vec!["app01", "app02"]);
    assert_eq!(groups["dev_app_tomcat_backend_media"], vec!["app03"]);

    // Every host listed under a group lists that group back
    for (group, members) in &groups {
        for host in members {
            assert!(hosts[host].contains(group), "{host} missing {group}");
        }
    }
}

#[tokio::test]
async fn test_yaml_csv_output() {
    let inventory = inventory(InventoryConfig::default(), SAMPLE_RECORDS);
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let output = render_list_map(&export_groups(&tree), OutputFormat::YamlCsv).unwrap();

    assert!(output.contains("\"all\": \"app01,app02,app03,stor01\"\n"));
    assert!(output.contains("\"dev_host_linux\": \"app01,app02,app03\"\n"));
}

#[tokio::test]
async fn test_attribute_dump() {
    let inventory = inventory(InventoryConfig::default(), SAMPLE_RECORDS);
    let hosts = inventory.get_hosts().await.unwrap();

    let attributes = export_attributes(&hosts, inventory.keys());
    assert_eq!(attributes["stor01"].len(), 2);
    assert_eq!(attributes["stor01"][1]["ROLE"], "storage");

    let output = render_attributes(&attributes, inventory.keys(), OutputFormat::YamlFlow).unwrap();
    assert_eq!(output.lines().count(), 4);
}

#[tokio::test]
async fn test_tree_view() {
    let inventory = inventory(InventoryConfig::default(), SAMPLE_RECORDS);
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let root = export_tree(&tree);

    assert_eq!(root.name, "all");
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["all_app", "all_host", "all_storage", "dev", "prod"]);
}

// ============================================================================
// Filters and configuration
// ============================================================================

#[tokio::test]
async fn test_filters_narrow_the_inventory() {
    let mut config = InventoryConfig::default();
    config.filter.enabled = true;
    config.filter.filters = vec![
        FilterSpec {
            key: "env".to_string(),
            operator: "in".to_string(),
            values: vec!["dev".to_string()],
        },
        FilterSpec {
            key: "host".to_string(),
            operator: "notregex".to_string(),
            values: vec!["03$".to_string()],
        },
    ];
    let inventory = inventory(config, SAMPLE_RECORDS);
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let groups = export_groups(&tree);

    assert_eq!(groups["all"], vec!["app01", "app02"]);
    assert!(!groups.contains_key("prod"));
    assert!(!groups.contains_key("dev_app_tomcat_backend_media"));
}

#[tokio::test]
async fn test_filters_removing_everything() {
    let mut config = InventoryConfig::default();
    config.filter.enabled = true;
    config.filter.filters = vec![FilterSpec {
        key: "os".to_string(),
        operator: "in".to_string(),
        values: vec!["plan9".to_string()],
    }];
    let inventory = inventory(config, SAMPLE_RECORDS);

    let err = inventory.get_hosts().await.unwrap_err();
    assert!(matches!(err, InventoryError::EmptyInventory));
}

#[tokio::test]
async fn test_custom_keys_and_separators() {
    let yaml = r#"
txt:
  kv:
    separator: "|"
    equalsign: ":"
  keys:
    separator: "-"
    os: os
    env: env
    role: role
    srv: srv
"#;
    let config = InventoryConfig::from_yaml_str(yaml, "inline").unwrap();
    let inventory = inventory(
        config,
        &[("web_01", "os:linux|env:qa|role:web|srv:nginx-front")],
    );
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let groups = export_groups(&tree);

    assert_eq!(groups["qa-web-nginx-front"], vec!["web_01"]);
    assert_eq!(groups["all-web-nginx"], vec!["web_01"]);
    assert!(!groups.contains_key("all-web-nginx-front"));
}

// ============================================================================
// Host variables and import
// ============================================================================

#[tokio::test]
async fn test_import_then_read_back() {
    let mut config = InventoryConfig::default();
    config.txt.vars.enabled = true;
    let inventory = inventory(config, &[]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
db01:
  - OS: linux
    ENV: prod
    ROLE: db
    SRV: postgres_primary
    VARS: port=5432,replicas=2
web01:
  - OS: linux
    ENV: prod
    ROLE: web
"#
    )
    .unwrap();

    assert_eq!(inventory.import_file(file.path()).await.unwrap(), 2);

    let hosts = inventory.get_hosts().await.unwrap();
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts["db01"][0].srv, "postgres_primary");

    let vars = inventory.get_host_variables("db01").await.unwrap();
    assert_eq!(vars["port"], "5432");
    assert_eq!(vars["replicas"], "2");
}

// ============================================================================
// etcd datasource
// ============================================================================

#[tokio::test]
async fn test_inventory_from_etcd() {
    let server = MockServer::start().await;
    let kv = |key: &str, value: &str| json!({ "key": BASE64.encode(key), "value": BASE64.encode(value) });
    Mock::given(method("POST"))
        .and(path("/v3/kv/range"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kvs": [
                kv("ANSIBLE_INVENTORY/rnd.local./app01.rnd.local/0", "OS=linux;ENV=dev;ROLE=app"),
                kv("ANSIBLE_INVENTORY/rnd.local./db01.rnd.local/0", "OS=linux;ENV=dev;ROLE=db"),
            ]
        })))
        .mount(&server)
        .await;

    let mut config = InventoryConfig {
        datasource: "etcd".to_string(),
        ..InventoryConfig::default()
    };
    config.etcd.endpoints = vec![server.uri()];
    config.etcd.zones = vec!["rnd.local.".to_string()];

    let source = datasource::new(&config).unwrap();
    let inventory = ansible_dns_inventory::inventory::Inventory::new(config, source).unwrap();
    let tree = inventory.build(&inventory.get_hosts().await.unwrap());

    let groups = export_groups(&tree);
    assert_eq!(groups["dev_app"], vec!["app01.rnd.local"]);
    assert_eq!(groups["dev_db"], vec!["db01.rnd.local"]);
}
