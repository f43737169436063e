//! Cache key construction.
//!
//! Keys have the form `namespace:entity:method:arg1,arg2,...`. Primary keys
//! use [`PRIMARY_METHOD`] as the method segment, which is also what pointer
//! entries store as their value.

use serde_json::Value;

/// Method segment of every primary key.
pub const PRIMARY_METHOD: &str = "get";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "dao";

/// Builds namespaced keys from entity type, method name and call arguments.
///
/// Arguments keep their call order. Delimiters inside a segment are
/// percent-escaped (`%` `,` `:`), so distinct calls never share a key while
/// plain values such as `lilei` or `1` render as-is. Null, booleans, arrays
/// and objects carry a `%` marker no escaped string can produce. A string and
/// a number with the same text share a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    namespace: String,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key for a call of `method` with `args` on `entity_type`.
    pub fn call_key(&self, entity_type: &str, method: &str, args: &[Value]) -> String {
        let mut key = String::with_capacity(self.namespace.len() + entity_type.len() + method.len() + 16);
        push_escaped(&mut key, &self.namespace);
        key.push(':');
        push_escaped(&mut key, entity_type);
        key.push(':');
        push_escaped(&mut key, method);
        key.push(':');

        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            push_arg(&mut key, arg);
        }

        key
    }

    /// Key of the primary entry for `identity`.
    pub fn primary_key(&self, entity_type: &str, identity: &Value) -> String {
        self.call_key(entity_type, PRIMARY_METHOD, std::slice::from_ref(identity))
    }

    /// Prefix shared by every primary key of `entity_type`.
    pub fn primary_prefix(&self, entity_type: &str) -> String {
        self.call_key(entity_type, PRIMARY_METHOD, &[])
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// Render one value the way it appears as an argument segment.
///
/// Two values render the same exactly when they would address the same key.
pub fn segment(value: &Value) -> String {
    let mut out = String::new();
    push_arg(&mut out, value);
    out
}

fn push_arg(out: &mut String, arg: &Value) {
    match arg {
        Value::Null => out.push_str("%00"),
        Value::String(s) if s.is_empty() => out.push_str("%22%22"),
        Value::String(s) => push_escaped(out, s),
        Value::Bool(b) => out.push_str(if *b { "%23true" } else { "%23false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(_) => {
            out.push_str("%5B");
            push_escaped(out, &arg.to_string()[1..]);
        }
        Value::Object(_) => {
            out.push_str("%7B");
            push_escaped(out, &arg.to_string()[1..]);
        }
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ',' => out.push_str("%2C"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
}
