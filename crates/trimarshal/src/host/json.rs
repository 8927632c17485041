//! JSON host adapter (`serde_json`).

use serde_json::{Map, Value};

use super::{HostArray, HostField, HostObject};
use crate::encode::EncodeError;

/// Host type name used in type-error messages.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accept only JSON objects as configuration objects.
pub fn as_host_object(v: &Value) -> Result<&Map<String, Value>, EncodeError> {
    v.as_object().ok_or_else(|| EncodeError::NotAnObject {
        found: type_name(v).to_string(),
    })
}

impl<'a> HostArray for &'a [Value] {
    fn len(&self) -> usize {
        <[Value]>::len(self)
    }

    fn number(&self, i: usize) -> Option<f64> {
        self.get(i).and_then(Value::as_f64)
    }
}

impl<'a> HostObject for &'a Map<String, Value> {
    type Array = &'a [Value];

    fn field(&self, name: &str) -> HostField<Self::Array> {
        let map: &'a Map<String, Value> = *self;
        match map.get(name) {
            None => HostField::Missing,
            Some(Value::Array(items)) => HostField::Array(items.as_slice()),
            Some(other) => HostField::NotArray(type_name(other).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_distinguishes_missing_and_non_array() {
        let v = json!({"pointlist": [0, 1.5], "holelist": "x"});
        let obj = as_host_object(&v).unwrap();
        match obj.field("pointlist") {
            HostField::Array(a) => {
                assert_eq!(a.len(), 2);
                assert_eq!(a.number(1), Some(1.5));
            }
            other => panic!("expected array, got {other:?}"),
        }
        assert!(matches!(obj.field("segmentlist"), HostField::Missing));
        assert!(matches!(obj.field("holelist"), HostField::NotArray(t) if t == "string"));
    }

    #[test]
    fn non_numeric_elements_read_as_none() {
        let v = json!([1, "2", null]);
        let arr = v.as_array().unwrap().as_slice();
        assert_eq!(arr.number(0), Some(1.0));
        assert_eq!(arr.number(1), None);
        assert_eq!(arr.number(2), None);
        assert_eq!(arr.number(3), None);
    }

    #[test]
    fn rejects_non_object_root() {
        let err = as_host_object(&json!([1, 2])).unwrap_err();
        assert!(err.is_type_error());
    }
}
