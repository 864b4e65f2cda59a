//! Helpers for the proto3 canonical JSON mapping.
//!
//! The remote schema is protobuf; on the wire we carry its JSON mapping:
//!
//! | Proto type | JSON form |
//! |---|---|
//! | `int64` / `uint64` | decimal string (numbers are also accepted on read) |
//! | `double` / `float` | number; `"NaN"`, `"Infinity"`, `"-Infinity"` for non-finite values |
//! | `bytes` | standard base64 string |
//! | `google.protobuf.Struct` | plain object |
//! | absent field | type default |

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::{Struct, ViamError};

/// Encode the optional extension bag.
///
/// `None` and `Some(empty)` produce the same `{}` value so omitted and empty
/// extras yield identical requests.
pub fn extra(extra: Option<Struct>) -> Value {
    Value::Object(extra.unwrap_or_default())
}

/// Encode raw bytes as a proto3-JSON `bytes` value.
pub fn encode_bytes(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a proto3-JSON `bytes` value.
pub fn decode_bytes(encoded: &str) -> Result<Vec<u8>, ViamError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| ViamError::Serialization(format!("invalid base64 bytes: {e}")))
}

/// Read the optional `bytes` field `field` from a response object.
///
/// A missing field is an empty buffer.
pub fn bytes_field(value: &Value, field: &str) -> Result<Vec<u8>, ViamError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => decode_bytes(s),
        Some(other) => Err(ViamError::Serialization(format!(
            "field `{field}` should be base64 bytes, got {other}"
        ))),
    }
}

/// Serde adapter for proto `bytes` fields (base64 strings).
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_bytes(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        super::decode_bytes(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for proto `int64` fields.
pub mod int64 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S: Serializer>(v: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            None => Ok(0),
            Some(StringOrNumber::Number(n)) => n
                .as_i64()
                .ok_or_else(|| serde::de::Error::custom(format!("{n} is not an int64"))),
            Some(StringOrNumber::String(s)) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Serde adapter for proto `uint64` fields.
pub mod uint64 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S: Serializer>(v: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            None => Ok(0),
            Some(StringOrNumber::Number(n)) => n
                .as_u64()
                .ok_or_else(|| serde::de::Error::custom(format!("{n} is not a uint64"))),
            Some(StringOrNumber::String(s)) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Read a proto3-JSON `double`: a number, a numeric string, or one of
/// `"NaN"`, `"Infinity"`, `"-Infinity"`. Absent or null is zero.
pub fn double_value(value: &Value) -> Result<f64, ViamError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ViamError::Serialization(format!("{n} is not a double"))),
        Value::String(s) => parse_double(s).map_err(ViamError::Serialization),
        other => Err(ViamError::Serialization(format!("{other} is not a double"))),
    }
}

fn parse_double(s: &str) -> Result<f64, String> {
    match s {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => s.trim().parse().map_err(|_| format!("{s:?} is not a double")),
    }
}

fn serialize_double<S: serde::Serializer>(v: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_nan() {
        serializer.serialize_str("NaN")
    } else if v == f64::INFINITY {
        serializer.serialize_str("Infinity")
    } else if v == f64::NEG_INFINITY {
        serializer.serialize_str("-Infinity")
    } else {
        serializer.serialize_f64(v)
    }
}

fn serialize_float<S: serde::Serializer>(v: f32, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        serializer.serialize_f32(v)
    } else {
        serialize_double(f64::from(v), serializer)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum DoubleRepr {
    Number(f64),
    String(String),
}

impl DoubleRepr {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            DoubleRepr::Number(n) => Ok(n),
            DoubleRepr::String(s) => parse_double(&s).map_err(E::custom),
        }
    }
}

/// Serde adapter for proto `double` fields.
pub mod double {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DoubleRepr;

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        super::serialize_double(*v, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<DoubleRepr>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(repr) => repr.into_f64(),
        }
    }
}

/// Serde adapter for proto `float` fields.
pub mod float {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        super::serialize_float(*v, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        super::double::deserialize(deserializer).map(|v| v as f32)
    }
}

/// Serde adapter for `optional double` fields.
pub mod opt_double {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DoubleRepr;

    pub fn serialize<S: Serializer>(v: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => super::serialize_double(*v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Option::<DoubleRepr>::deserialize(deserializer)?
            .map(DoubleRepr::into_f64)
            .transpose()
    }
}

/// Serde adapter for `optional float` fields.
pub mod opt_float {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<f32>, serializer: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => super::serialize_float(*v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
        super::opt_double::deserialize(deserializer).map(|v| v.map(|v| v as f32))
    }
}

/// Serde adapter for `repeated double` fields.
pub mod double_vec {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DoubleRepr;

    struct Item(f64);

    impl serde::Serialize for Item {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize_double(self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(v: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(v.len()))?;
        for item in v {
            seq.serialize_element(&Item(*item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Option::<Vec<DoubleRepr>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(DoubleRepr::into_f64)
            .collect()
    }
}

/// Serde adapter for `map<string, float>` fields.
pub mod float_map {
    use std::collections::HashMap;

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DoubleRepr;

    struct Item(f32);

    impl serde::Serialize for Item {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize_float(self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(v: &HashMap<String, f32>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(v.len()))?;
        for (key, value) in v {
            map.serialize_entry(key, &Item(*value))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<String, f32>, D::Error> {
        Option::<HashMap<String, DoubleRepr>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(|(key, repr)| Ok((key, repr.into_f64::<D::Error>()? as f32)))
            .collect()
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Sample {
        #[serde(with = "int64")]
        distance_mm: i64,
        #[serde(with = "uint64")]
        frequency_hz: u64,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Reading {
        #[serde(with = "double")]
        heading: f64,
        #[serde(with = "float")]
        hdop: f32,
        #[serde(with = "opt_double")]
        altitude: Option<f64>,
        #[serde(with = "double_vec")]
        joints: Vec<f64>,
    }

    #[test]
    fn omitted_and_empty_extra_are_identical() {
        let omitted = serde_json::to_vec(&extra(None)).unwrap();
        let empty = serde_json::to_vec(&extra(Some(Struct::new()))).unwrap();
        assert_eq!(omitted, empty);
        assert_eq!(omitted, b"{}");
    }

    #[test]
    fn int64_fields_travel_as_strings() {
        let sample = Sample {
            distance_mm: -250,
            frequency_hz: 1000,
            data: vec![1, 2, 3],
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["distanceMm"], json!("-250"));
        assert_eq!(value["frequencyHz"], json!("1000"));
        assert_eq!(value["data"], json!("AQID"));
    }

    #[test]
    fn int64_fields_accept_numbers_and_absence() {
        let sample: Sample = serde_json::from_value(json!({ "distanceMm": 12 })).unwrap();
        assert_eq!(sample.distance_mm, 12);
        assert_eq!(sample.frequency_hz, 0);
        assert!(sample.data.is_empty());
    }

    #[test]
    fn bytes_field_missing_is_empty() {
        assert!(bytes_field(&json!({}), "image").unwrap().is_empty());
        assert_eq!(bytes_field(&json!({ "image": "AQID" }), "image").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            bytes_field(&json!({ "image": 7 }), "image"),
            Err(ViamError::Serialization(_))
        ));
    }

    #[test]
    fn decode_bytes_rejects_garbage() {
        assert!(matches!(decode_bytes("not base64!"), Err(ViamError::Serialization(_))));
    }

    #[test]
    fn doubles_accept_special_strings() {
        let reading: Reading = serde_json::from_value(json!({
            "heading": "NaN",
            "hdop": "Infinity",
            "altitude": "-Infinity",
            "joints": [1, "2.5", "NaN"]
        }))
        .unwrap();
        assert!(reading.heading.is_nan());
        assert_eq!(reading.hdop, f32::INFINITY);
        assert_eq!(reading.altitude, Some(f64::NEG_INFINITY));
        assert_eq!(reading.joints[..2], [1.0, 2.5]);
        assert!(reading.joints[2].is_nan());
    }

    #[test]
    fn doubles_default_when_absent_and_reject_garbage() {
        let reading: Reading = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reading.heading, 0.0);
        assert_eq!(reading.altitude, None);
        assert!(reading.joints.is_empty());
        assert!(serde_json::from_value::<Reading>(json!({ "heading": "north" })).is_err());
    }

    #[test]
    fn non_finite_doubles_are_written_as_strings() {
        let reading = Reading {
            heading: f64::NAN,
            hdop: 0.5,
            altitude: Some(f64::INFINITY),
            joints: vec![0.25, f64::NEG_INFINITY],
        };
        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["heading"], json!("NaN"));
        assert_eq!(value["hdop"], json!(0.5));
        assert_eq!(value["altitude"], json!("Infinity"));
        assert_eq!(value["joints"], json!([0.25, "-Infinity"]));

        let short = Reading { hdop: 0.1, ..Reading::default() };
        assert!(serde_json::to_string(&short).unwrap().contains(r#""hdop":0.1,"#));
    }

    #[test]
    fn double_value_reads_loose_json() {
        assert!(double_value(&json!("NaN")).unwrap().is_nan());
        assert_eq!(double_value(&json!(null)).unwrap(), 0.0);
        assert_eq!(double_value(&json!("12.5")).unwrap(), 12.5);
        assert!(matches!(double_value(&json!(true)), Err(ViamError::Serialization(_))));
    }
}
