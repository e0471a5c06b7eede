//! In-memory command target for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::call::{CommandCall, ExecutionContext};
use crate::error::{CallError, Result};
use crate::resp::RespValue;
use crate::target::CommandTarget;

/// Answers each enqueued call with the next scripted reply and records
/// what was sent.
#[derive(Clone)]
pub(crate) struct ScriptedTarget {
    context: ExecutionContext,
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    sent: Vec<Vec<RespValue>>,
    replies: VecDeque<Result<RespValue>>,
}

impl ScriptedTarget {
    pub(crate) fn new() -> Self {
        Self {
            context: ExecutionContext::current(),
            inner: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub(crate) fn reply(self, value: RespValue) -> Self {
        self.inner.lock().unwrap().replies.push_back(Ok(value));
        self
    }

    pub(crate) fn fail_next(self, error: CallError) -> Self {
        self.inner.lock().unwrap().replies.push_back(Err(error));
        self
    }

    /// Every call sent so far, each as its argument strings.
    pub(crate) fn sent(&self) -> Vec<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|args| args.iter().map(arg_text).collect())
            .collect()
    }
}

impl CommandTarget for ScriptedTarget {
    fn enqueue(&self, call: CommandCall) {
        let reply = {
            let mut script = self.inner.lock().unwrap();
            script.sent.push(call.args().to_vec());
            script.replies.pop_front()
        };
        match reply {
            Some(Ok(value)) => call.succeed(value),
            Some(Err(e)) => call.fail(e),
            None => call.fail(CallError::Transport("no scripted reply".to_string())),
        }
    }

    fn context(&self) -> &ExecutionContext {
        &self.context
    }
}

pub(crate) fn arg_text(value: &RespValue) -> String {
    match value {
        RespValue::BulkString(Some(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("request argument is not a bulk string: {:?}", other),
    }
}

/// `[cursor, [keys...]]`
pub(crate) fn scan_page(cursor: &str, keys: &[&str]) -> RespValue {
    RespValue::array(vec![
        RespValue::bulk(cursor),
        RespValue::array(keys.iter().map(|k| RespValue::bulk(*k)).collect()),
    ])
}
