//! Property-based tests for inbound envelope decoding.
//!
//! Decoding must never panic and must keep the inset invariants for any
//! input shape the host could deliver.

use minichat_proto::{HostEvent, SafeAreaInsets, tags};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Arbitrary JSON values up to a small depth.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        ".{0,12}".prop_map(Value::String),
        "-?[0-9]{1,4}(\\.[0-9]{1,2})?".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,16}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Envelopes with a recognized tag and arbitrary data.
fn envelope_strategy() -> impl Strategy<Value = Value> {
    let tag = prop_oneof![
        Just(tags::COMPLETION_RESULT.to_string()),
        Just(tags::COMPLETION_FAILED.to_string()),
        Just(tags::INIT_RESULT.to_string()),
        Just(tags::CONFIG_UPDATE.to_string()),
        Just("chat_completions_response".to_string()),
        "[A-Za-z]{1,20}",
    ];
    (tag, json_strategy()).prop_map(|(tag, data)| json!({"type": tag, "data": data}))
}

fn insets_are_valid(insets: &SafeAreaInsets) -> bool {
    [insets.top, insets.left, insets.right, insets.bottom]
        .iter()
        .all(|side| side.is_finite() && *side >= 0.0)
}

proptest! {
    #[test]
    fn prop_decode_never_panics(value in json_strategy()) {
        let _ = HostEvent::decode(&value);
    }

    #[test]
    fn prop_tagged_envelopes_always_decode(envelope in envelope_strategy()) {
        prop_assert!(HostEvent::decode(&envelope).is_ok());
    }

    #[test]
    fn prop_insets_are_non_negative(value in json_strategy()) {
        prop_assert!(insets_are_valid(&SafeAreaInsets::from_loose(&value)));
    }

    #[test]
    fn prop_config_insets_are_non_negative(data in json_strategy()) {
        let envelope = json!({
            "type": tags::CONFIG_UPDATE,
            "data": {"safe_area_insets": data},
        });

        if let Ok(HostEvent::ConfigUpdate(update)) = HostEvent::decode(&envelope) {
            if let Some(insets) = update.safe_area_insets {
                prop_assert!(insets_are_valid(&insets));
            }
        } else {
            prop_assert!(false, "config update must decode");
        }
    }

    #[test]
    fn prop_decoded_tag_matches_envelope(envelope in envelope_strategy()) {
        let event = HostEvent::decode(&envelope).unwrap();
        let tag = envelope["type"].as_str().unwrap();
        if tag == "chat_completions_response" {
            prop_assert_eq!(event.tag(), tags::COMPLETION_RESULT);
        } else {
            prop_assert_eq!(event.tag(), tag);
        }
    }
}
