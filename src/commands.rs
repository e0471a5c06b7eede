//! Typed command API.
//!
//! Every operation builds `[NAME, arg, ...]`, enqueues it on the target and
//! returns a [`Deferred`] that decodes the reply. Await the handle, or pass a
//! callback to [`Deferred::on_complete`].

use std::collections::HashMap;

use crate::call::{CommandCall, Deferred};
use crate::extract::{FromResp, Ttl};
use crate::resp::{RespValue, ToArg};
use crate::scan::ScanIterator;
use crate::target::CommandTarget;
use crate::types::{Expiry, SetOptions};

/// Redis commands on top of any [`CommandTarget`].
pub trait Commands: CommandTarget {
    /// Send an arbitrary command and decode its reply into `T`.
    fn command<T: FromResp + Send + 'static>(&self, args: Vec<RespValue>) -> Deferred<T> {
        let (call, deferred) = CommandCall::new(args, self.context());
        tracing::trace!(command = %call.name(), args = call.args().len(), "enqueue");
        self.enqueue(call);
        deferred.decode()
    }

    // --- Connection ---

    fn ping(&self, message: Option<&str>) -> Deferred<String> {
        let mut args = vec!["PING".to_arg()];
        if let Some(message) = message {
            args.push(message.to_arg());
        }
        self.command(args)
    }

    fn echo(&self, message: impl ToArg) -> Deferred<String> {
        self.command(vec!["ECHO".to_arg(), message.to_arg()])
    }

    /// PUBLISH channel message - returns the number of receivers.
    fn publish(&self, channel: impl ToArg, message: impl ToArg) -> Deferred<i64> {
        self.command(vec!["PUBLISH".to_arg(), channel.to_arg(), message.to_arg()])
    }

    // --- Keys and strings ---

    /// `None` when the key does not exist.
    fn get(&self, key: impl ToArg) -> Deferred<Option<String>> {
        self.command(vec!["GET".to_arg(), key.to_arg()])
    }

    /// SET key value [PX milliseconds] [NX|XX]
    ///
    /// Any expiry is sent as `PX` in whole milliseconds. The reply is `OK`,
    /// or nil when the NX/XX condition was not met.
    fn set(&self, key: impl ToArg, value: impl ToArg, options: SetOptions) -> Deferred<RespValue> {
        let mut args = vec!["SET".to_arg(), key.to_arg(), value.to_arg()];
        if let Some(ms) = options.expire_millis() {
            args.push("PX".to_arg());
            args.push(RespValue::bulk(ms.to_string()));
        }
        if let Some(flag) = options.mode.flag() {
            args.push(flag.to_arg());
        }
        self.command(args)
    }

    fn keys(&self, pattern: impl ToArg) -> Deferred<Vec<String>> {
        self.command(vec!["KEYS".to_arg(), pattern.to_arg()])
    }

    fn exists<I>(&self, keys: I) -> Deferred<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.command(with_name("EXISTS", keys))
    }

    /// DEL key [key ...]
    ///
    /// An array literal, a slice or a `Vec` of keys all produce the same
    /// request. Duplicates are sent as given.
    fn del<I>(&self, keys: I) -> Deferred<RespValue>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.command(with_name("DEL", keys))
    }

    /// SCAN cursor [MATCH pattern] [COUNT count] - one page.
    fn scan(
        &self,
        cursor: &str,
        pattern: Option<&str>,
        count: Option<usize>,
    ) -> Deferred<(String, Vec<String>)> {
        let mut args = vec!["SCAN".to_arg(), cursor.to_arg()];
        if let Some(pattern) = pattern {
            args.push("MATCH".to_arg());
            args.push(pattern.to_arg());
        }
        if let Some(count) = count {
            args.push("COUNT".to_arg());
            args.push(count.to_arg());
        }
        self.command(args)
    }

    /// Scan the whole keyspace, calling `on_page` with every non-empty page.
    fn scan_all<F>(&self, pattern: Option<&str>, count: Option<usize>, on_page: F) -> Deferred<()>
    where
        Self: Clone + Send + Sync + 'static,
        F: FnMut(Vec<String>) + Send + 'static,
    {
        let iter = ScanIterator::new(self.clone(), pattern.map(str::to_string), count);
        Deferred::new(iter.drive(on_page), self.context().clone())
    }

    // --- Counters ---

    fn incr(&self, key: impl ToArg) -> Deferred<i64> {
        self.command(vec!["INCR".to_arg(), key.to_arg()])
    }

    fn decr(&self, key: impl ToArg) -> Deferred<i64> {
        self.command(vec!["DECR".to_arg(), key.to_arg()])
    }

    fn incr_by(&self, key: impl ToArg, by: i64) -> Deferred<i64> {
        self.command(vec!["INCRBY".to_arg(), key.to_arg(), by.to_arg()])
    }

    fn decr_by(&self, key: impl ToArg, by: i64) -> Deferred<i64> {
        self.command(vec!["DECRBY".to_arg(), key.to_arg(), by.to_arg()])
    }

    // --- Hashes ---

    /// `true` when the field is new.
    fn hset(&self, key: impl ToArg, field: impl ToArg, value: impl ToArg) -> Deferred<bool> {
        self.command(vec!["HSET".to_arg(), key.to_arg(), field.to_arg(), value.to_arg()])
    }

    fn hget(&self, key: impl ToArg, field: impl ToArg) -> Deferred<Option<String>> {
        self.command(vec!["HGET".to_arg(), key.to_arg(), field.to_arg()])
    }

    fn hkeys(&self, key: impl ToArg) -> Deferred<Vec<String>> {
        self.command(vec!["HKEYS".to_arg(), key.to_arg()])
    }

    fn hgetall(&self, key: impl ToArg) -> Deferred<HashMap<String, String>> {
        self.command(vec!["HGETALL".to_arg(), key.to_arg()])
    }

    /// Missing fields come back as `None`, in request order.
    fn hmget<I>(&self, key: impl ToArg, fields: I) -> Deferred<Vec<Option<String>>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut args = vec!["HMGET".to_arg(), key.to_arg()];
        args.extend(fields.into_iter().map(|f| f.to_arg()));
        self.command(args)
    }

    /// HMSET key field value [field value ...] from `(field, value)` pairs.
    ///
    /// Fields go on the wire in iteration order. For a `HashMap` that order
    /// is unspecified and may differ between calls; each field is still
    /// followed by its own value.
    fn hmset<I, F, V>(&self, key: impl ToArg, fields: I) -> Deferred<RespValue>
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        let mut args = vec!["HMSET".to_arg(), key.to_arg()];
        for (field, value) in fields {
            args.push(field.to_arg());
            args.push(value.to_arg());
        }
        self.command(args)
    }

    /// HMSET from an already flattened `field, value, field, value, ...` list.
    fn hmset_flat<I>(&self, key: impl ToArg, items: I) -> Deferred<RespValue>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut args = vec!["HMSET".to_arg(), key.to_arg()];
        args.extend(items.into_iter().map(|i| i.to_arg()));
        self.command(args)
    }

    fn hdel<I>(&self, key: impl ToArg, fields: I) -> Deferred<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut args = vec!["HDEL".to_arg(), key.to_arg()];
        args.extend(fields.into_iter().map(|f| f.to_arg()));
        self.command(args)
    }

    // --- Expiration ---

    /// EXPIRE key seconds, or EXPIREAT key unix-seconds for [`Expiry::At`].
    fn expire(&self, key: impl ToArg, when: Expiry) -> Deferred<bool> {
        let name = if when.is_absolute() { "EXPIREAT" } else { "EXPIRE" };
        self.command(vec![name.to_arg(), key.to_arg(), when.as_secs().to_arg()])
    }

    /// PEXPIRE key ms, or PEXPIREAT key unix-ms for [`Expiry::At`].
    fn pexpire(&self, key: impl ToArg, when: Expiry) -> Deferred<bool> {
        let name = if when.is_absolute() { "PEXPIREAT" } else { "PEXPIRE" };
        self.command(vec![name.to_arg(), key.to_arg(), when.as_millis().to_arg()])
    }

    fn persist(&self, key: impl ToArg) -> Deferred<bool> {
        self.command(vec!["PERSIST".to_arg(), key.to_arg()])
    }

    fn ttl(&self, key: impl ToArg) -> Deferred<Ttl> {
        self.command(vec!["TTL".to_arg(), key.to_arg()])
    }

    fn pttl(&self, key: impl ToArg) -> Deferred<Ttl> {
        self.command::<RespValue>(vec!["PTTL".to_arg(), key.to_arg()])
            .map(Ttl::from_millis_reply)
    }
}

impl<T: CommandTarget + ?Sized> Commands for T {}

fn with_name<I>(name: &str, rest: I) -> Vec<RespValue>
where
    I: IntoIterator,
    I::Item: ToArg,
{
    std::iter::once(name.to_arg())
        .chain(rest.into_iter().map(|a| a.to_arg()))
        .collect()
}
