use std::fs;

use topiclink_cli::manifest::load;

fn write_manifest(dir: &tempfile::TempDir, content: &str) -> String {
    let path = dir.path().join("topiclink.toml");
    fs::write(&path, content).expect("write manifest");
    path.to_str().expect("utf-8 path").to_string()
}

#[test]
fn manifest_parsing_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");

    let toml_content = r#"
service = "orders"
stage = "prod"
region = "eu-west-1"
account_id = "123456789012"

[state]
bucket = "acme-deploy-state"

[trace]
lookup = true

[[bindings]]
function = "order-created"
topic = "arn:aws:sns:eu-west-1:123456789012:orders"

[[bindings]]
function = "order-audit"

[bindings.topic]
arn = "arn:aws:sns:eu-west-1:123456789012:orders"
filter_policy = { kind = ["created", "cancelled"] }
"#;
    let path = write_manifest(&dir, toml_content);

    let manifest = load(&path).expect("should parse manifest");
    assert_eq!(manifest.service, "orders");
    assert_eq!(manifest.state.bucket, "acme-deploy-state");
    assert!(manifest.trace.lookup);
    assert!(!manifest.trace.policy);
    assert_eq!(manifest.bindings.len(), 2);

    assert!(manifest.bindings[0].filter_policy().is_none());
    let filter = manifest.bindings[1]
        .filter_policy()
        .expect("second binding declares a filter");
    assert_eq!(filter.canonical(), r#"{"kind":["created","cancelled"]}"#);

    let config = manifest.reconciler_config();
    assert_eq!(
        config.state_key().object_key(),
        "prod-orders-eu-west-1-topiclink-state.txt"
    );
}

#[test]
fn empty_required_field_is_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = write_manifest(
        &dir,
        r#"
service = ""
stage = "prod"
region = "eu-west-1"
account_id = "123456789012"

[state]
bucket = "acme-deploy-state"
"#,
    );

    let err = load(&path).expect_err("expected validation error");
    assert!(err.to_string().contains("service"));
}

#[test]
fn binding_without_a_topic_arn_is_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = write_manifest(
        &dir,
        r#"
service = "orders"
stage = "prod"
region = "eu-west-1"
account_id = "123456789012"

[state]
bucket = "acme-deploy-state"

[[bindings]]
function = "order-created"

[bindings.topic]
arn = ""
"#,
    );

    let err = load(&path).expect_err("expected validation error");
    assert!(format!("{err:#}").contains("order-created"));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = write_manifest(
        &dir,
        r#"
service = "orders"
stage = "prod"
region = "eu-west-1"
account_id = "123456789012"
bucket = "misplaced"

[state]
bucket = "acme-deploy-state"
"#,
    );

    assert!(load(&path).is_err());
}

#[test]
fn missing_manifest_file_is_a_readable_error() {
    let err = load("/nonexistent/topiclink.toml").expect_err("expected read error");
    assert!(format!("{err:#}").contains("cannot read manifest"));
}
