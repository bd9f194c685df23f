//! Model spec parsing and provider instantiation.

use std::collections::BTreeMap;

use mailgate::config::{LlmConfig, ModelsConfig};
use mailgate::credentials::Credentials;
use mailgate::providers::router::{build_provider, parse_model_spec, ModelRouter, RouterError};

// Never set in the process environment, so only the map can satisfy it.
const KEY_ENV: &str = "MAILGATE_ROUTER_TEST_GEMINI_KEY";

fn llm_config() -> LlmConfig {
    let mut llm = LlmConfig::default();
    llm.gemini.api_key_env = KEY_ENV.to_owned();
    llm
}

fn with_key() -> Credentials {
    Credentials::from_map(BTreeMap::from([(KEY_ENV.to_owned(), "k".to_owned())]))
}

fn models(extractor: &str, fallback: Option<&str>) -> ModelsConfig {
    ModelsConfig {
        extractor: extractor.to_owned(),
        fallback: fallback.map(str::to_owned),
    }
}

#[test]
fn parse_splits_at_first_slash() {
    let parsed = parse_model_spec("ollama/library/llama3:8b").expect("spec should parse");
    assert_eq!(parsed.provider, "ollama");
    assert_eq!(parsed.model, "library/llama3:8b");
}

#[test]
fn parse_rejects_incomplete_specs() {
    for spec in ["gemini", "gemini/", "/model", ""] {
        let err = parse_model_spec(spec).expect_err("spec should be refused");
        assert!(matches!(err, RouterError::InvalidModelSpec { .. }), "{spec}");
    }
}

#[test]
fn gemini_requires_credential() {
    let err = build_provider("gemini/gemini-2.5-flash", &llm_config(), &Credentials::default())
        .err()
        .expect("missing key should fail");
    match err {
        RouterError::MissingCredential { provider, key } => {
            assert_eq!(provider, "gemini");
            assert_eq!(key, KEY_ENV);
        }
        other => panic!("expected MissingCredential, got {other}"),
    }
}

#[test]
fn gemini_builds_with_credential() {
    let provider = build_provider("gemini/gemini-2.5-flash", &llm_config(), &with_key())
        .expect("provider should build");
    assert_eq!(provider.model_id(), "gemini/gemini-2.5-flash");
}

#[test]
fn ollama_needs_no_credential() {
    let provider = build_provider("ollama/llama3", &llm_config(), &Credentials::default())
        .expect("provider should build");
    assert_eq!(provider.model_id(), "ollama/llama3");
}

#[test]
fn unknown_provider_is_refused() {
    let err = build_provider("flan/t5-base", &llm_config(), &with_key())
        .err()
        .expect("unknown provider should fail");
    assert!(matches!(err, RouterError::UnsupportedProvider { ref provider } if provider == "flan"));
}

#[test]
fn router_chain_lists_primary_then_fallback() {
    let router = ModelRouter::from_config(
        &models("gemini/gemini-2.5-flash", Some("ollama/llama3")),
        &llm_config(),
        &with_key(),
    )
    .expect("router should init");

    let chain: Vec<String> = router
        .chain()
        .iter()
        .map(|p| p.model_id().to_owned())
        .collect();
    assert_eq!(chain, ["gemini/gemini-2.5-flash", "ollama/llama3"]);
    assert_eq!(router.primary_spec(), "gemini/gemini-2.5-flash");
}

#[test]
fn broken_fallback_is_dropped() {
    let router = ModelRouter::from_config(
        &models("ollama/llama3", Some("gemini/gemini-2.5-flash")),
        &llm_config(),
        &Credentials::default(),
    )
    .expect("primary alone should suffice");
    assert_eq!(router.chain().len(), 1);
}

#[test]
fn broken_primary_fails_router() {
    let result = ModelRouter::from_config(
        &models("gemini/gemini-2.5-flash", Some("ollama/llama3")),
        &llm_config(),
        &Credentials::default(),
    );
    assert!(matches!(
        result,
        Err(RouterError::MissingCredential { .. })
    ));
}
