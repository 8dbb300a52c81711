use portlet_hub_bridge::Parameters;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for hub parameter names, including dotted substrate names
pub fn parameter_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-zA-Z0-9_]{0,15}",
        Just("vaadin.ev".to_string()),
        Just("vaadin.uid".to_string()),
        Just("vaadin.wn".to_string()),
    ]
}

/// Strategy for parameter values as the hub carries them
pub fn parameter_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::collection::vec("[a-z0-9]{0,8}", 0..4)
            .prop_map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
    ]
}

pub fn parameters_strategy() -> impl Strategy<Value = Parameters> {
    prop::collection::vec((parameter_name_strategy(), parameter_value_strategy()), 0..8)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for component instance ids (portlet namespaces)
pub fn instance_id_strategy() -> impl Strategy<Value = String> {
    "_?[a-zA-Z][a-zA-Z0-9_]{0,23}"
}
