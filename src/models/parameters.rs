//! # Hub Parameter Objects
//!
//! Parameter objects handed to the portlet hub are string-keyed maps. Values
//! addressed to the portal side are single-element string arrays
//! (`{"vaadin.ev": ["click"]}`), the multi-valued shape portlet parameters take.

use serde_json::{Map, Value};

/// Parameter object as produced by `HubHandle::new_parameters`
pub type Parameters = Map<String, Value>;

/// Merge caller parameters onto a base parameter object.
///
/// Every key of `overlay` is copied into `base` unchanged: caller keys always
/// win over keys already present, no key is renamed and no base key is dropped.
pub fn merge_parameters(mut base: Parameters, overlay: &Parameters) -> Parameters {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
    base
}

/// Wrap a single string into the multi-valued parameter shape
pub fn single_value(value: impl Into<String>) -> Value {
    Value::Array(vec![Value::String(value.into())])
}
