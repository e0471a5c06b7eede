//! Decoding replies into typed results.
//!
//! Every instance either produces a value of the requested type or fails
//! with [`CallError::TypeMismatch`] carrying the offending reply. None of
//! them fall back to a default.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{CallError, Result};
use crate::resp::RespValue;

pub trait FromResp: Sized {
    fn from_resp(value: RespValue) -> Result<Self>;
}

/// Decode a reply, turning error replies into [`CallError::Store`] first.
pub fn decode<T: FromResp>(value: RespValue) -> Result<T> {
    match value {
        RespValue::Error(msg) => Err(CallError::Store(msg)),
        other => T::from_resp(other),
    }
}

impl FromResp for RespValue {
    fn from_resp(value: RespValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromResp for () {
    fn from_resp(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Error(_) => Err(CallError::mismatch("any non-error reply", value)),
            _ => Ok(()),
        }
    }
}

impl FromResp for String {
    fn from_resp(value: RespValue) -> Result<Self> {
        match value {
            RespValue::BulkString(Some(bytes)) => Ok(match String::from_utf8(bytes) {
                Ok(s) => s,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            }),
            RespValue::SimpleString(s) => Ok(s),
            RespValue::Integer(n) => Ok(n.to_string()),
            other => Err(CallError::mismatch("string", other)),
        }
    }
}

impl FromResp for i64 {
    fn from_resp(value: RespValue) -> Result<Self> {
        let parsed = match &value {
            RespValue::Integer(n) => Some(*n),
            RespValue::BulkString(Some(bytes)) => parse_decimal(bytes),
            RespValue::SimpleString(s) => parse_decimal(s.as_bytes()),
            _ => None,
        };
        parsed.ok_or_else(|| CallError::mismatch("integer", value))
    }
}

impl FromResp for bool {
    fn from_resp(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Integer(0) => Ok(false),
            RespValue::Integer(1) => Ok(true),
            other => Err(CallError::mismatch("boolean (integer 0 or 1)", other)),
        }
    }
}

impl<T: FromResp> FromResp for Option<T> {
    fn from_resp(value: RespValue) -> Result<Self> {
        if value.is_nil() {
            Ok(None)
        } else {
            T::from_resp(value).map(Some)
        }
    }
}

impl<T: FromResp> FromResp for Vec<T> {
    fn from_resp(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Array(Some(items)) => items.into_iter().map(T::from_resp).collect(),
            other => Err(CallError::mismatch("array", other)),
        }
    }
}

impl FromResp for HashMap<String, String> {
    fn from_resp(value: RespValue) -> Result<Self> {
        let items = match value {
            RespValue::Array(Some(items)) if items.len() % 2 == 0 => items,
            other => return Err(CallError::mismatch("array of key/value pairs", other)),
        };

        let mut map = HashMap::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            map.insert(String::from_resp(k)?, String::from_resp(v)?);
        }
        Ok(map)
    }
}

/// Scan reply: `[cursor, [key, ...]]`.
impl FromResp for (String, Vec<String>) {
    fn from_resp(value: RespValue) -> Result<Self> {
        const EXPECTED: &str = "scan reply [cursor, [keys]]";

        let items = match value {
            RespValue::Array(Some(items)) => items,
            other => return Err(CallError::mismatch(EXPECTED, other)),
        };

        match <[RespValue; 2]>::try_from(items) {
            Ok([cursor @ RespValue::BulkString(Some(_)), keys @ RespValue::Array(Some(_))]) => {
                Ok((String::from_resp(cursor)?, Vec::<String>::from_resp(keys)?))
            }
            Ok(pair) => Err(CallError::mismatch(EXPECTED, RespValue::Array(Some(Vec::from(pair))))),
            Err(items) => Err(CallError::mismatch(EXPECTED, RespValue::Array(Some(items)))),
        }
    }
}

/// Remaining time to live of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    NoExpiry,
    Expires(Duration),
}

impl Ttl {
    fn from_reply(value: RespValue, unit: fn(u64) -> Duration) -> Result<Self> {
        match value {
            RespValue::Integer(-2) => Ok(Ttl::Missing),
            RespValue::Integer(-1) => Ok(Ttl::NoExpiry),
            RespValue::Integer(n) if n >= 0 => Ok(Ttl::Expires(unit(n as u64))),
            other => Err(CallError::mismatch("ttl integer", other)),
        }
    }

    /// Decode a `PTTL` reply.
    pub fn from_millis_reply(value: RespValue) -> Result<Self> {
        Self::from_reply(value, Duration::from_millis)
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::Expires(d) => Some(*d),
            _ => None,
        }
    }
}

/// Decodes a `TTL` reply (seconds).
impl FromResp for Ttl {
    fn from_resp(value: RespValue) -> Result<Self> {
        Self::from_reply(value, Duration::from_secs)
    }
}

fn parse_decimal(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk(s)
    }

    fn arr(items: Vec<RespValue>) -> RespValue {
        RespValue::array(items)
    }

    /// One sample of every variant, for totality checks.
    fn every_variant() -> Vec<RespValue> {
        vec![
            RespValue::SimpleString("OK".to_string()),
            RespValue::Error("ERR x".to_string()),
            RespValue::Integer(1),
            RespValue::Integer(0),
            RespValue::Integer(-3),
            bulk("text"),
            bulk("12"),
            RespValue::null(),
            arr(vec![]),
            arr(vec![bulk("a"), bulk("b")]),
            arr(vec![bulk("a")]),
            RespValue::Array(None),
        ]
    }

    #[test]
    fn test_string_accepts_bulk_simple_and_integer() {
        assert_eq!(String::from_resp(bulk("hi")).unwrap(), "hi");
        assert_eq!(String::from_resp(RespValue::SimpleString("PONG".into())).unwrap(), "PONG");
        assert_eq!(String::from_resp(RespValue::Integer(-42)).unwrap(), "-42");
    }

    #[test]
    fn test_string_rejects_nil_and_arrays() {
        for value in [RespValue::null(), arr(vec![]), RespValue::Array(None)] {
            let err = String::from_resp(value.clone()).unwrap_err();
            match err {
                CallError::TypeMismatch { value: got, .. } => assert_eq!(got, value),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_string_invalid_utf8_is_lossy() {
        let s = String::from_resp(RespValue::bulk(vec![b'a', 0xff])).unwrap();
        assert_eq!(s, "a\u{fffd}");
    }

    #[test]
    fn test_integer() {
        assert_eq!(i64::from_resp(RespValue::Integer(5)).unwrap(), 5);
        assert_eq!(i64::from_resp(bulk("-12")).unwrap(), -12);
        assert!(i64::from_resp(bulk("twelve")).unwrap_err().is_type_mismatch());
        assert!(i64::from_resp(RespValue::null()).unwrap_err().is_type_mismatch());
        assert!(i64::from_resp(arr(vec![])).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_boolean_only_zero_or_one() {
        assert!(bool::from_resp(RespValue::Integer(1)).unwrap());
        assert!(!bool::from_resp(RespValue::Integer(0)).unwrap());
        assert!(bool::from_resp(RespValue::Integer(2)).unwrap_err().is_type_mismatch());
        assert!(bool::from_resp(bulk("1")).unwrap_err().is_type_mismatch());
        assert!(bool::from_resp(RespValue::ok()).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_sequence_distinguishes_null_from_empty() {
        assert_eq!(Vec::<String>::from_resp(arr(vec![])).unwrap(), Vec::<String>::new());
        assert!(Vec::<String>::from_resp(RespValue::Array(None))
            .unwrap_err()
            .is_type_mismatch());
        assert_eq!(
            Vec::<String>::from_resp(arr(vec![bulk("a"), bulk("b")])).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_sequence_element_mismatch_fails_whole_decode() {
        let err = Vec::<String>::from_resp(arr(vec![bulk("a"), RespValue::null()])).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_optional_elements() {
        let got = Vec::<Option<String>>::from_resp(arr(vec![bulk("a"), RespValue::null()])).unwrap();
        assert_eq!(got, vec![Some("a".to_string()), None]);
        assert_eq!(Option::<String>::from_resp(RespValue::null()).unwrap(), None);
    }

    #[test]
    fn test_mapping_pairs() {
        let map = HashMap::<String, String>::from_resp(arr(vec![
            bulk("f1"),
            bulk("v1"),
            bulk("f2"),
            bulk("v2"),
        ]))
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["f1"], "v1");
        assert_eq!(map["f2"], "v2");
    }

    #[test]
    fn test_mapping_odd_count_mismatch() {
        let err = HashMap::<String, String>::from_resp(arr(vec![bulk("f1"), bulk("v1"), bulk("f2")]))
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(HashMap::<String, String>::from_resp(arr(vec![])).unwrap().is_empty());
    }

    #[test]
    fn test_scan_reply_shapes() {
        let page = <(String, Vec<String>)>::from_resp(arr(vec![
            bulk("5"),
            arr(vec![bulk("k1"), bulk("k2")]),
        ]))
        .unwrap();
        assert_eq!(page, ("5".to_string(), vec!["k1".to_string(), "k2".to_string()]));

        let last = <(String, Vec<String>)>::from_resp(arr(vec![bulk("0"), arr(vec![])])).unwrap();
        assert_eq!(last, ("0".to_string(), vec![]));
    }

    #[test]
    fn test_scan_reply_malformed() {
        let bad = vec![
            arr(vec![bulk("0")]),
            arr(vec![bulk("0"), arr(vec![]), arr(vec![])]),
            arr(vec![RespValue::Integer(0), arr(vec![])]),
            arr(vec![bulk("0"), bulk("k1")]),
            arr(vec![bulk("0"), RespValue::Array(None)]),
            arr(vec![RespValue::null(), arr(vec![])]),
            RespValue::Array(None),
            bulk("0"),
        ];
        for value in bad {
            let err = <(String, Vec<String>)>::from_resp(value).unwrap_err();
            assert!(err.is_type_mismatch());
        }
    }

    #[test]
    fn test_ttl() {
        assert_eq!(Ttl::from_resp(RespValue::Integer(-2)).unwrap(), Ttl::Missing);
        assert_eq!(Ttl::from_resp(RespValue::Integer(-1)).unwrap(), Ttl::NoExpiry);
        assert_eq!(
            Ttl::from_resp(RespValue::Integer(30)).unwrap(),
            Ttl::Expires(Duration::from_secs(30))
        );
        assert_eq!(
            Ttl::from_millis_reply(RespValue::Integer(1500)).unwrap().as_duration(),
            Some(Duration::from_millis(1500))
        );
        assert!(Ttl::from_resp(RespValue::Integer(-5)).unwrap_err().is_type_mismatch());
        assert!(Ttl::from_resp(bulk("30")).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_error_reply_becomes_store_error() {
        let err = decode::<String>(RespValue::Error("WRONGTYPE nope".to_string())).unwrap_err();
        assert!(matches!(err, CallError::Store(msg) if msg == "WRONGTYPE nope"));
        let err = decode::<RespValue>(RespValue::Error("ERR".to_string())).unwrap_err();
        assert!(matches!(err, CallError::Store(_)));
    }

    fn assert_total<T: FromResp>(value: RespValue) {
        match T::from_resp(value) {
            Ok(_) | Err(CallError::TypeMismatch { .. }) => {}
            Err(other) => panic!("decode produced {:?}", other),
        }
    }

    #[test]
    fn test_extraction_is_total_over_variants() {
        for value in every_variant() {
            assert_total::<String>(value.clone());
            assert_total::<i64>(value.clone());
            assert_total::<bool>(value.clone());
            assert_total::<Vec<String>>(value.clone());
            assert_total::<HashMap<String, String>>(value.clone());
            assert_total::<(String, Vec<String>)>(value.clone());
            assert_total::<Ttl>(value.clone());
            assert_total::<Option<String>>(value.clone());
            assert_total::<()>(value);
        }
    }

    #[test]
    fn test_error_variant_never_decodes_as_data() {
        let e = RespValue::Error("ERR x".to_string());
        assert!(String::from_resp(e.clone()).is_err());
        assert!(i64::from_resp(e.clone()).is_err());
        assert!(<()>::from_resp(e.clone()).is_err());
        assert!(Vec::<String>::from_resp(e).is_err());
    }
}
