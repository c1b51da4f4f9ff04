use async_trait::async_trait;
use serde_yaml::Value;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use valuetransformer::config::{Configuration, SourceSpec, SourceType};
use valuetransformer::error::{Error, Result};
use valuetransformer::flatten::FlatMap;
use valuetransformer::include::LocationLoader;
use valuetransformer::pipeline::Pipeline;
use valuetransformer::resource_list::{read_stream, write_stream, ResourceList};
use valuetransformer::source::{Providers, SourceProvider};

fn config(yaml: &str) -> Configuration {
    Configuration::parse(yaml).unwrap()
}

fn documents(yaml: &str) -> Vec<Value> {
    read_stream(yaml.as_bytes()).unwrap()
}

struct Failing;

#[async_trait]
impl SourceProvider for Failing {
    async fn resolve(&self, name: &str, _spec: &SourceSpec) -> Result<FlatMap> {
        Err(Error::provider(SourceType::Exec, name, "exit status: 1"))
    }
}

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl SourceProvider for Counting {
    async fn resolve(&self, _name: &str, _spec: &SourceSpec) -> Result<FlatMap> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(FlatMap::new())
    }
}

#[test_log::test(tokio::test)]
async fn test_environment_value_reaches_config_map() {
    std::env::set_var("VT_PIPELINE_TEST_HOME", "/root");
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  env1:
    type: Environment
    vars: {VT_PIPELINE_TEST_HOME: homeDir}
transforms:
  - source: env1
    target: {kind: ConfigMap}
"#,
    );
    let items = documents(
        "kind: ConfigMap\ndata: {path: '${homeDir}/x'}\n---\nkind: Secret\nstringData: {path: '${homeDir}'}\n",
    );

    let processed = Pipeline::default().run(config, items).await.unwrap();

    assert_eq!(processed.len(), 2);
    assert_eq!(processed[0].document, documents("kind: ConfigMap\ndata: {path: /root/x}")[0]);
    assert!(processed[0].unresolved.is_empty());
    // Not targeted
    assert_eq!(processed[1].document["stringData"]["path"], Value::from("${homeDir}"));
    assert!(processed[1].unresolved.is_empty());
}

#[tokio::test]
async fn test_missing_key_is_left_and_reported_once() {
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  vars: {type: Variable, vars: {present: yes}}
transforms:
  - source: vars
"#,
    );
    let items = documents(
        "kind: ConfigMap\nmetadata: {name: cfg, namespace: prod}\ndata: {a: '${absent}', b: '${absent}'}\n",
    );

    let processed = Pipeline::default().run(config, items.clone()).await.unwrap();

    assert_eq!(processed[0].document, items[0]);
    assert_eq!(processed[0].unresolved, vec!["${absent}".to_string()]);
    assert_eq!(processed[0].id.to_string(), "ConfigMap/cfg in namespace prod");
}

#[tokio::test]
async fn test_duplicate_source_across_includes_fails_before_resolution() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.yaml");
    let second = dir.path().join("second.yaml");
    fs::write(&first, "sources:\n  db: {type: Variable, vars: {host: a}}\n").unwrap();
    fs::write(&second, "sources:\n  db: {type: Variable, vars: {host: b}}\n").unwrap();

    let config = config(&format!(
        "apiVersion: beeper.com/v1\nkind: ValueTransformer\nincludes: ['{}', '{}']\n",
        first.display(),
        second.display()
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(
        Providers::empty().register(SourceType::Variable, Counting(calls.clone())),
        LocationLoader::default(),
    );

    let err = pipeline.run(config, documents("kind: ConfigMap\n")).await.unwrap_err();

    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("duplicate source 'db'")));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  broken: {type: Exec, args: {command: "false"}}
  vars: {type: Variable, vars: {a: b}}
transforms:
  - source: vars
"#,
    );
    let pipeline = Pipeline::new(
        Providers::default().register(SourceType::Exec, Failing),
        LocationLoader::default(),
    );

    let err = pipeline.run(config, documents("kind: ConfigMap\n")).await.unwrap_err();

    assert!(matches!(err, Error::ProviderError { name, .. } if name == "broken"));
}

#[tokio::test]
async fn test_merge_feeds_transform() {
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  db: {type: Variable, vars: {host: db.internal}}
merges:
  app: {databaseHost: db.host}
transforms:
  - source: app
    regex: '@@(\w+)@@'
    targets: {name: "api-*"}
"#,
    );
    let items = documents(
        "kind: Deployment\nmetadata: {name: API-server}\nspec: {host: '@@databaseHost@@'}\n",
    );

    let processed = Pipeline::default().run(config, items).await.unwrap();

    assert_eq!(processed[0].document["spec"]["host"], Value::from("db.internal"));
}

#[tokio::test]
async fn test_excluded_document_passes_through() {
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  vars: {type: Variable, vars: {a: replaced}}
transforms:
  - source: vars
excludes:
  - {kind: Secret}
"#,
    );
    let items = documents(
        "kind: Secret\ndata: {a: 'not base64!'}\nstringData: {a: '${a}'}\n---\nkind: ConfigMap\ndata: {a: '${a}'}\n",
    );

    let processed = Pipeline::default().run(config, items.clone()).await.unwrap();

    assert!(processed[0].excluded);
    assert_eq!(processed[0].document, items[0]);
    assert!(!processed[1].excluded);
    assert_eq!(processed[1].document["data"]["a"], Value::from("replaced"));
}

#[tokio::test]
async fn test_header_is_validated() {
    let err = Pipeline::default()
        .run(config("apiVersion: beeper.com/v1\nkind: Other\n"), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));

    let err = Pipeline::default()
        .run(config("apiVersion: example.com/v2\nkind: ValueTransformer\n"), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[tokio::test]
async fn test_transform_with_unknown_source() {
    let config = config(
        "apiVersion: beeper.com/v1\nkind: ValueTransformer\ntransforms:\n  - source: missing\n",
    );

    let err = Pipeline::default().run(config, Vec::new()).await.unwrap_err();

    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("missing")));
}

#[tokio::test]
async fn test_source_and_merge_share_names() {
    let config = config(
        r#"
apiVersion: beeper.com/v1
kind: ValueTransformer
sources:
  same: {type: Variable, vars: {a: b}}
merges:
  same: {a: same.a}
"#,
    );

    let err = Pipeline::default().run(config, Vec::new()).await.unwrap_err();

    assert!(matches!(err, Error::ConfigError(_)));
}

#[tokio::test]
async fn test_resource_list_round_trip() {
    let input = r#"
apiVersion: config.kubernetes.io/v1
kind: ResourceList
functionConfig:
  apiVersion: beeper.com/v1
  kind: ValueTransformer
  sources:
    vars: {type: Variable, vars: {replicas: "3"}}
  transforms:
    - source: vars
items:
  - kind: ConfigMap
    metadata: {name: cfg}
    data: {replicas: "${replicas}"}
results: []
"#;
    let mut list = ResourceList::read(input.as_bytes()).unwrap();
    let config = list.config().unwrap();

    let items = std::mem::take(&mut list.items);
    let processed = Pipeline::default().run(config, items).await.unwrap();
    list.items = processed.into_iter().map(|p| p.document).collect();

    let mut out = Vec::new();
    list.write(&mut out).unwrap();
    let written: Value = serde_yaml::from_slice(&out).unwrap();

    assert_eq!(written["items"][0]["data"]["replicas"], Value::from("3"));
    assert_eq!(written["functionConfig"]["kind"], Value::from("ValueTransformer"));
    assert_eq!(written["results"], Value::Sequence(Vec::new()));
}

#[test]
fn test_resource_list_rejects_other_kinds() {
    assert!(matches!(
        ResourceList::read("kind: List\nitems: []\n".as_bytes()),
        Err(Error::ConfigError(_))
    ));
    assert!(matches!(
        ResourceList::read("kind: ResourceList\nitems: {a: b}\n".as_bytes()),
        Err(Error::ConfigError(_))
    ));
}

#[test]
fn test_stream_round_trip() {
    let items = documents("kind: A\n---\n---\nkind: B\n");
    assert_eq!(items.len(), 2);

    let mut out = Vec::new();
    write_stream(&items, &mut out).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "kind: A\n---\nkind: B\n");
}
