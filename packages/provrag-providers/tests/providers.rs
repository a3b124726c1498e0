use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use provrag_providers::Error;

#[test]
fn builds_bearer_auth_header() {
	let headers =
		provrag_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn forwards_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-org-id".to_string(), Value::String("org-1".to_string()));

	let headers =
		provrag_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get("x-org-id").expect("Missing default header."), "org-1");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = provrag_providers::auth_headers("secret", &defaults).expect_err("must fail");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}
