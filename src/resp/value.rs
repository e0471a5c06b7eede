use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<Vec<u8>>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn null() -> Self {
        RespValue::BulkString(None)
    }

    pub fn bulk(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// Nil bulk string or null array.
    pub fn is_nil(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.put_slice(format!(":{}\r\n", n).as_bytes());
            }
            RespValue::BulkString(None) => buf.put_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                buf.put_slice(format!("${}\r\n", data.len()).as_bytes());
                buf.put_slice(data);
                buf.put_slice(b"\r\n");
            }
            RespValue::Array(None) => buf.put_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                buf.put_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.encode_into(buf);
                }
            }
        }
    }
}

impl From<i64> for RespValue {
    fn from(n: i64) -> Self {
        RespValue::Integer(n)
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        RespValue::BulkString(Some(s.into_bytes()))
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        RespValue::BulkString(Some(s.as_bytes().to_vec()))
    }
}

impl From<Vec<u8>> for RespValue {
    fn from(bytes: Vec<u8>) -> Self {
        RespValue::BulkString(Some(bytes))
    }
}

impl From<Option<Vec<u8>>> for RespValue {
    fn from(opt: Option<Vec<u8>>) -> Self {
        RespValue::BulkString(opt)
    }
}

/// Encodes a request argument.
///
/// Requests are arrays of bulk strings, so every argument (numbers
/// included) is sent as a bulk string holding its text form.
pub trait ToArg {
    fn to_arg(&self) -> RespValue;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> RespValue {
        (**self).to_arg()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> RespValue {
        RespValue::bulk(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> RespValue {
        RespValue::bulk(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> RespValue {
        RespValue::bulk(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> RespValue {
        RespValue::bulk(self.as_slice())
    }
}

macro_rules! display_arg {
    ($($t:ty),*) => {
        $(
            impl ToArg for $t {
                fn to_arg(&self) -> RespValue {
                    RespValue::bulk(self.to_string())
                }
            }
        )*
    };
}

display_arg!(i32, i64, u32, u64, usize, f64, bool);
