//! RP values, message envelopes, and the multi-message merge rule.
//!
//! A single RP operation (e.g. `eval`) can produce several messages before
//! the backend emits a terminal `status` of `"done"` -- interim `out`/`err`
//! chunks, then a `value`, then the final status. [`Merger::merge`]
//! implements spec.md §3's fold: concatenate `out`/`err` in arrival order,
//! keep the last non-empty `value`/`ex`/`root-ex`/`ns`/`session`, and surface
//! the final message's `status`.

use std::collections::BTreeMap;

/// A decoded RP value: one of the four wire kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpValue {
    /// A byte-string payload, decoded as UTF-8 text.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An ordered list of values.
    List(Vec<RpValue>),
    /// A dictionary keyed by byte-string.
    Dict(BTreeMap<String, RpValue>),
}

impl RpValue {
    /// Borrow this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RpValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[RpValue]> {
        match self {
            RpValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// One decoded RP message: a flat dictionary of fields.
pub type RpMessage = BTreeMap<String, RpValue>;

/// Build an RP message (request) from `(key, value)` string pairs, for
/// sending simple ops like `eval`/`describe`/`clone`.
pub fn build_message(fields: &[(&str, RpValue)]) -> RpMessage {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn field_str(msg: &RpMessage, key: &str) -> Option<String> {
    msg.get(key).and_then(RpValue::as_str).map(str::to_string)
}

fn status_of(msg: &RpMessage) -> Vec<String> {
    match msg.get("status") {
        Some(RpValue::List(items)) => items
            .iter()
            .filter_map(RpValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// The folded result of an RP operation's message sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedReply {
    /// Concatenated stdout chunks, in arrival order.
    pub out: String,
    /// Concatenated stderr chunks, in arrival order.
    pub err: String,
    /// Last non-empty printed evaluation result, if any.
    pub value: Option<String>,
    /// Last non-empty exception class/message, if any.
    pub ex: Option<String>,
    /// Last non-empty root-cause exception, if any.
    pub root_ex: Option<String>,
    /// Last non-empty namespace reported.
    pub ns: Option<String>,
    /// Last non-empty session id reported.
    pub session: Option<String>,
    /// The status tags of the terminal message.
    pub status: Vec<String>,
    /// Every message folded, in arrival order, for tools that need fields
    /// the merge rule doesn't special-case (e.g. `candidates`, `info`).
    pub raw: Vec<RpMessage>,
}

impl MergedReply {
    /// `true` once a message in this reply carried a `"done"` status tag.
    pub fn is_done(&self) -> bool {
        self.status.iter().any(|s| s == "done")
    }

    /// `true` if any message reported an `"error"` status tag.
    pub fn has_error_status(&self) -> bool {
        self.status.iter().any(|s| s == "error")
    }

    /// Look up the last non-empty string value of `key` across all raw
    /// messages, for fields the core merge doesn't track.
    pub fn last_field(&self, key: &str) -> Option<String> {
        self.raw.iter().rev().find_map(|m| field_str(m, key))
    }
}

/// Folds a sequence of RP messages into a [`MergedReply`].
pub struct Merger;

impl Merger {
    /// Fold `messages` (assumed to span exactly one operation, ending at a
    /// `"done"` status) into a single reply.
    pub fn merge(messages: &[RpMessage]) -> MergedReply {
        let mut reply = MergedReply::default();
        for msg in messages {
            if let Some(out) = field_str(msg, "out") {
                reply.out.push_str(&out);
            }
            if let Some(err) = field_str(msg, "err") {
                reply.err.push_str(&err);
            }
            if let Some(value) = field_str(msg, "value") {
                if !value.is_empty() {
                    reply.value = Some(value);
                }
            }
            if let Some(ex) = field_str(msg, "ex") {
                if !ex.is_empty() {
                    reply.ex = Some(ex);
                }
            }
            if let Some(root_ex) = field_str(msg, "root-ex") {
                if !root_ex.is_empty() {
                    reply.root_ex = Some(root_ex);
                }
            }
            if let Some(ns) = field_str(msg, "ns") {
                if !ns.is_empty() {
                    reply.ns = Some(ns);
                }
            }
            if let Some(session) = field_str(msg, "session") {
                if !session.is_empty() {
                    reply.session = Some(session);
                }
            }
            let status = status_of(msg);
            if !status.is_empty() {
                reply.status = status;
            }
            reply.raw.push(msg.clone());
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(fields: &[(&str, RpValue)]) -> RpMessage {
        fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn status(tags: &[&str]) -> RpValue {
        RpValue::List(tags.iter().map(|t| RpValue::Str(t.to_string())).collect())
    }

    #[test]
    fn merges_out_chunks_in_order() {
        let messages = vec![
            msg(&[("out", RpValue::Str("hello ".into()))]),
            msg(&[("out", RpValue::Str("world".into()))]),
            msg(&[("status", status(&["done"]))]),
        ];
        let merged = Merger::merge(&messages);
        assert_eq!(merged.out, "hello world");
        assert!(merged.is_done());
    }

    #[test]
    fn keeps_last_non_empty_value() {
        let messages = vec![
            msg(&[("value", RpValue::Str("1".into()))]),
            msg(&[("value", RpValue::Str("2".into()))]),
            msg(&[("status", status(&["done"]))]),
        ];
        let merged = Merger::merge(&messages);
        assert_eq!(merged.value.as_deref(), Some("2"));
    }

    #[test]
    fn empty_value_does_not_clobber_prior_value() {
        let messages = vec![
            msg(&[("value", RpValue::Str("1".into()))]),
            msg(&[("out", RpValue::Str("side effect\n".into()))]),
            msg(&[("status", status(&["done"]))]),
        ];
        let merged = Merger::merge(&messages);
        assert_eq!(merged.value.as_deref(), Some("1"));
    }

    #[test]
    fn error_status_is_surfaced() {
        let messages = vec![
            msg(&[
                ("ex", RpValue::Str("java.lang.ArithmeticException".into())),
                ("status", status(&["eval-error"])),
            ]),
            msg(&[("status", status(&["done"]))]),
        ];
        let merged = Merger::merge(&messages);
        assert_eq!(merged.ex.as_deref(), Some("java.lang.ArithmeticException"));
        assert!(merged.is_done());
        assert!(!merged.has_error_status());
    }
}
