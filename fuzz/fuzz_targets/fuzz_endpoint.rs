#![no_main]

//! Fuzz target for gate endpoint normalization.
//!
//! Attack surface: malformed URLs, odd schemes, whitespace, IPv6 literals.
//!
//! # Goal
//! Verify that normalization never panics, and that whatever it accepts is
//! absolute and stable under a second normalization.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use cmdgate_core::GateEndpoint;

#[derive(Arbitrary, Debug)]
struct FuzzEndpointInput {
    raw: Vec<u8>,
    prefix: Prefix,
}

#[derive(Arbitrary, Debug)]
enum Prefix {
    None,
    Http,
    Https,
    SchemeRelative,
    Other(Vec<u8>),
}

fuzz_target!(|input: FuzzEndpointInput| {
    let body = String::from_utf8_lossy(&input.raw);
    let raw = match input.prefix {
        Prefix::None => body.into_owned(),
        Prefix::Http => format!("http://{body}"),
        Prefix::Https => format!("https://{body}"),
        Prefix::SchemeRelative => format!("//{body}"),
        Prefix::Other(scheme) => format!("{}://{body}", String::from_utf8_lossy(&scheme)),
    };

    let Ok(endpoint) = raw.parse::<GateEndpoint>() else {
        return;
    };

    assert!(matches!(endpoint.scheme(), "http" | "https"));
    assert!(!endpoint.host().is_empty());

    let again: GateEndpoint = endpoint
        .as_str()
        .parse()
        .expect("normalized endpoint must normalize again");
    assert_eq!(endpoint.as_str(), again.as_str());
});
