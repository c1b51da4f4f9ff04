use valuetransformer::selector::Selector;

fn selector(kind: &str, name: &str, namespace: &str) -> Selector {
    Selector { kind: kind.to_string(), name: name.to_string(), namespace: namespace.to_string() }
}

#[test]
fn test_kind_and_wildcard_name() {
    let matcher = selector("Pod", "web-*", "").compile().unwrap();

    assert!(matcher.matches("Pod", "ns", "web-1"));
    assert!(!matcher.matches("Deployment", "ns", "web-1"));
    assert!(!matcher.matches("Pod", "ns", "api-1"));
}

#[test]
fn test_empty_selector_matches_everything() {
    let matcher = Selector::default().compile().unwrap();

    assert!(matcher.matches("Pod", "ns", "web-1"));
    assert!(matcher.matches("", "", ""));
}

#[test]
fn test_name_is_case_insensitive() {
    let matcher = selector("", "Web-?", "").compile().unwrap();

    assert!(matcher.matches("Pod", "", "web-1"));
    assert!(matcher.matches("Pod", "", "WEB-2"));
    assert!(!matcher.matches("Pod", "", "web-10"));
}

#[test]
fn test_kind_and_namespace_are_exact() {
    let matcher = selector("ConfigMap", "", "prod").compile().unwrap();

    assert!(matcher.matches("ConfigMap", "prod", "anything"));
    assert!(!matcher.matches("configmap", "prod", "anything"));
    assert!(!matcher.matches("ConfigMap", "Prod", "anything"));
    assert!(!matcher.matches("ConfigMap", "", "anything"));
}

#[test]
fn test_selector_display() {
    assert_eq!(selector("Pod", "", "prod").to_string(), "Pod/* in prod");
}
