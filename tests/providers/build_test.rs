//! Provider construction from parser configuration.

use std::collections::BTreeMap;

use trendscope::config::ParserConfig;
use trendscope::credentials::Credentials;
use trendscope::providers::{build_provider, LlmProvider as _};

fn credentials(pairs: &[(&str, &str)]) -> Credentials {
    Credentials::from_map(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn gemini_requires_api_key() {
    let config = ParserConfig::default();
    assert!(build_provider(&config, &credentials(&[])).is_err());
    assert!(build_provider(&config, &credentials(&[("GEMINI_API_KEY", "  ")])).is_err());

    let provider = build_provider(&config, &credentials(&[("GEMINI_API_KEY", "key")]))
        .expect("gemini provider should build");
    assert_eq!(provider.model_id(), "gemini/gemini-2.0-flash");
}

#[test]
fn api_key_variable_is_configurable() {
    let config = ParserConfig {
        api_key_env: "TRENDS_GEMINI_KEY".to_owned(),
        ..ParserConfig::default()
    };
    assert!(build_provider(&config, &credentials(&[("GEMINI_API_KEY", "key")])).is_err());
    assert!(build_provider(&config, &credentials(&[("TRENDS_GEMINI_KEY", "key")])).is_ok());
}

#[test]
fn ollama_needs_no_credentials() {
    let config = ParserConfig {
        model: "ollama/qwen3:8b".to_owned(),
        ollama_url: Some("http://10.0.0.5:11434/".to_owned()),
        ..ParserConfig::default()
    };
    let provider =
        build_provider(&config, &credentials(&[])).expect("ollama provider should build");
    assert_eq!(provider.model_id(), "ollama/qwen3:8b");
}

#[test]
fn unknown_provider_is_rejected() {
    let config = ParserConfig {
        model: "openai/gpt-4o".to_owned(),
        ..ParserConfig::default()
    };
    let err = match build_provider(&config, &credentials(&[])) {
        Ok(_) => panic!("unsupported provider should fail"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("unsupported provider 'openai'"));
}
