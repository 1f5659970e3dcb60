#![no_main]

//! Fuzz target for configuration parsing.
//!
//! Attack surface: malformed YAML, invalid schemas, `${VAR}` references.
//!
//! # Goal
//! Verify that substitution, parsing and validation return errors instead of
//! panicking.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use cmdgate_core::config::{Config, substitute_env_vars, validate};

#[derive(Arbitrary, Debug)]
struct FuzzConfigInput {
    raw_yaml: Vec<u8>,
    structured: Option<StructuredConfig>,
}

#[derive(Arbitrary, Debug)]
struct StructuredConfig {
    schema: u8,
    endpoint: String,
    identity: Option<String>,
    timeout: Option<String>,
    noop_function_code: Option<i64>,
    response_field: String,
}

impl StructuredConfig {
    fn to_yaml(&self) -> String {
        let mut yaml = format!("schema: {}\ngate:\n  endpoint: {:?}\n", self.schema, self.endpoint);
        if let Some(identity) = &self.identity {
            yaml.push_str(&format!("  identity: {identity:?}\n"));
        }
        if let Some(timeout) = &self.timeout {
            yaml.push_str(&format!("  timeout: {timeout:?}\n"));
        }
        match self.noop_function_code {
            Some(code) => yaml.push_str(&format!("  noop_function_code: {code}\n")),
            None => yaml.push_str("  noop_function_code: null\n"),
        }
        yaml.push_str(&format!("fields:\n  response: {:?}\n", self.response_field));
        yaml
    }
}

fuzz_target!(|input: FuzzConfigInput| {
    let yaml = match &input.structured {
        Some(structured) => structured.to_yaml(),
        None => String::from_utf8_lossy(&input.raw_yaml).into_owned(),
    };

    let Ok(contents) = substitute_env_vars(&yaml) else {
        return;
    };
    let Ok(config) = serde_saphyr::from_str::<Config>(&contents) else {
        return;
    };
    if validate(&config).is_ok() {
        let _ = config.dispatcher_config();
    }
});
