//! Serde helpers that keep non-finite floats in JSON.
//!
//! `serde_json` writes NaN and infinities as `null`, which then fails to
//! read back into `f64`. Finite values stay plain numbers; the others are
//! written as the strings `"NaN"`, `"inf"` and `"-inf"`.

use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

fn encode<S: Serializer>(value: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value == f64::INFINITY {
        serializer.serialize_str("inf")
    } else if value == f64::NEG_INFINITY {
        serializer.serialize_str("-inf")
    } else {
        serializer.serialize_f64(value)
    }
}

fn decode<E: de::Error>(repr: Repr) -> Result<f64, E> {
    match repr {
        Repr::Number(v) => Ok(v),
        Repr::Text(text) => match text.as_str() {
            "NaN" | "nan" => Ok(f64::NAN),
            "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
            "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
            other => Err(E::custom(format!("expected a number, NaN or inf, got {other:?}"))),
        },
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    encode(*value, serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    decode(Repr::deserialize(deserializer)?)
}

/// The same encoding for `Option<f64>`; `None` stays `null`.
pub mod option {
    use super::{decode, encode, Repr};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => encode(*v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Option::<Repr>::deserialize(deserializer)?.map(decode).transpose()
    }
}
