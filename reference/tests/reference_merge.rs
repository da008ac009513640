use callsig_core::{ParamSpec, Schema, Signature, TypeDesc};
use callsig_reference::{build_route_groups, groups_for_route, parse_reference};
use serde_json::{Value, json};

fn raw_reference() -> Value {
    json!({
        "equity.price.historical": {
            "parameters": {
                "fmp": [
                    {"name": "symbol", "type": "str", "description": "Ticker symbol",
                     "optional": false, "standard": true},
                    {"name": "interval", "type": "Literal['1min','5min']",
                     "description": "Interval", "optional": true, "standard": false},
                    {"name": "adjusted", "type": "bool", "default": false,
                     "optional": true, "standard": false},
                ],
                "yfinance": [
                    {"name": "interval", "type": "Literal['15min']",
                     "optional": true, "standard": false},
                    {"name": "prepost", "type": "Optional[bool]",
                     "optional": true, "standard": false},
                ],
            },
        },
    })
}

#[test]
fn test_literal_descriptor_without_explicit_choices() {
    let raw = json!({
        "route": {
            "parameters": {
                "p": [{"name": "kind", "type": "Literal['a','b']", "optional": true, "standard": false}],
            },
        },
    });
    let reference = parse_reference(&raw).unwrap();
    let groups = groups_for_route(&reference, "route").unwrap();

    let kind = groups[0].find("kind").unwrap();
    assert_eq!(kind.choices, vec![json!("a"), json!("b")]);
    assert_eq!(kind.base_type, callsig_core::BaseType::Str);
}

#[test]
fn test_reference_groups_merge_like_signature_groups() {
    let reference = parse_reference(&raw_reference()).unwrap();
    let route = reference.get("equity.price.historical").unwrap();
    let groups = build_route_groups(route);

    // Provider groups iterate in deterministic key order.
    let titles: Vec<&str> = groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["fmp", "yfinance"]);

    let signature = Signature::new("historical")
        .with_param(ParamSpec::new("symbol", TypeDesc::Str))
        .with_param(
            ParamSpec::new(
                "provider",
                TypeDesc::Literal(vec![json!("fmp"), json!("yfinance")]),
            )
            .with_default(json!("fmp")),
        );
    let mut schema = Schema::from_signature(&signature).unwrap();
    schema.merge_provider_groups(groups).unwrap();

    // Both providers declared `interval`, so it migrated to optional with
    // unioned choices and a parenthetical naming both.
    let interval = schema.optional.find("interval").unwrap();
    assert_eq!(
        interval.choices,
        vec![json!("1min"), json!("5min"), json!("15min")]
    );
    assert_eq!(
        interval.help.as_deref(),
        Some("Interval (provider: fmp, yfinance)")
    );

    // Provider-exclusive arguments stay in their own groups.
    assert!(schema.providers.iter().any(|g| g.contains("adjusted")));
    assert!(schema.providers.iter().any(|g| g.contains("prepost")));

    // The index remembers original contributions for call-time scoping.
    assert_eq!(
        schema.provider_index.get("fmp"),
        Some(&vec!["interval".to_string(), "adjusted".to_string()])
    );
    assert_eq!(
        schema.provider_index.get("yfinance"),
        Some(&vec!["prepost".to_string()])
    );
}

#[test]
fn test_flags_from_reference_are_pure() {
    let reference = parse_reference(&raw_reference()).unwrap();
    let groups = groups_for_route(&reference, "equity.price.historical").unwrap();

    for group in &groups {
        for spec in &group.specs {
            if spec.is_flag {
                assert!(spec.choices.is_empty());
                assert!(!spec.multiple);
            }
        }
    }
    let fmp = groups.iter().find(|g| g.title == "fmp").unwrap();
    assert!(fmp.find("adjusted").unwrap().is_flag);
    let yf = groups.iter().find(|g| g.title == "yfinance").unwrap();
    assert!(yf.find("prepost").unwrap().is_flag);
}
