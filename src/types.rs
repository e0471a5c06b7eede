use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Existence condition for `SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetMode {
    #[default]
    Always,
    /// `NX`: only set when the key does not exist.
    IfAbsent,
    /// `XX`: only set when the key already exists.
    IfPresent,
}

impl SetMode {
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            SetMode::Always => None,
            SetMode::IfAbsent => Some("NX"),
            SetMode::IfPresent => Some("XX"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Sent as `PX` milliseconds whatever the precision supplied.
    pub expire: Option<Duration>,
    pub mode: SetMode,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expire(mut self, ttl: Duration) -> Self {
        self.expire = Some(ttl);
        self
    }

    pub fn nx(mut self) -> Self {
        self.mode = SetMode::IfAbsent;
        self
    }

    pub fn xx(mut self) -> Self {
        self.mode = SetMode::IfPresent;
        self
    }

    /// Expiry in whole milliseconds, truncated.
    pub fn expire_millis(&self) -> Option<u128> {
        self.expire.map(|d| d.as_millis())
    }
}

/// When a key should expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Relative to now.
    In(Duration),
    /// Absolute wall-clock time.
    At(SystemTime),
}

impl Expiry {
    /// Whole seconds: relative for `In`, since the epoch for `At`.
    pub fn as_secs(&self) -> i64 {
        match self {
            Expiry::In(d) => saturate(d.as_secs().into()),
            Expiry::At(t) => epoch_offset(*t, |d| saturate(d.as_secs().into())),
        }
    }

    /// Whole milliseconds: relative for `In`, since the epoch for `At`.
    pub fn as_millis(&self) -> i64 {
        match self {
            Expiry::In(d) => saturate(d.as_millis()),
            Expiry::At(t) => epoch_offset(*t, |d| saturate(d.as_millis())),
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Expiry::At(_))
    }
}

/// Signed offset from the epoch, truncated toward zero. Magnitudes past
/// `i64::MAX` are clamped before the sign is applied.
fn epoch_offset(t: SystemTime, unit: fn(Duration) -> i64) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(after) => unit(after),
        Err(before) => -unit(before.duration()),
    }
}

fn saturate(n: u128) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
