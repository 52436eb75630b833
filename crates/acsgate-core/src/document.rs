// ── Device document model ──
//
// A device document is a loosely typed tree: object nodes keyed by path
// segment, leaf wrappers carrying `_value` / `_type`, and controller
// metadata at the root (`_id`, `_lastInform`, `_tags`, ...). Traversal is
// a fold over dotted path segments that yields a scalar or nothing; any
// structure found where a scalar was expected counts as "no value".

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Key holding a leaf's value inside its wrapper object.
pub const VALUE_KEY: &str = "_value";
/// Key holding a leaf's xsd type tag inside its wrapper object.
pub const TYPE_KEY: &str = "_type";

// ── Scalar ───────────────────────────────────────────────────────────

/// A leaf value: the only shape ever handed back to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `true` for an empty text value.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Boolean reading, accepting the textual forms devices report.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => n.as_f64().map(|v| v.abs() > f64::EPSILON),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" => Some(true),
                "false" | "0" | "no" | "off" | "disabled" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// ── Node ─────────────────────────────────────────────────────────────

/// One level of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Named or indexed children, in document order.
    Object(IndexMap<String, Node>),
    Array(Vec<Node>),
    Scalar(Scalar),
    Null,
}

impl Node {
    fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Self::Object(map) => map.get(segment),
            _ => None,
        }
    }

    /// The scalar this node stands for, unwrapping a `_value` wrapper.
    fn leaf(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Object(map) => match map.get(VALUE_KEY) {
                Some(Self::Scalar(s)) => Some(s),
                _ => None,
            },
            Self::Array(_) | Self::Null => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            Value::String(s) => Self::Scalar(Scalar::Text(s)),
            Value::Array(items) => Self::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

// ── Document ─────────────────────────────────────────────────────────

/// The `_deviceId` block the controller attaches to every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceIdentity {
    pub manufacturer: Option<String>,
    pub oui: Option<String>,
    pub product_class: Option<String>,
    pub serial_number: Option<String>,
}

/// A device's parameter tree as stored by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            root: Node::Object(IndexMap::new()),
        }
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match Node::from(value) {
            root @ Node::Object(_) => Self { root },
            _ => Self::default(),
        }
    }
}

impl Document {
    /// The node at `path`, if every segment resolves.
    pub fn node(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// The scalar at `path`.
    ///
    /// Returns `None` when any segment is missing, when the final node is
    /// an object without a scalar `_value`, or when it is an array or null.
    pub fn get(&self, path: &str) -> Option<&Scalar> {
        self.node(path).and_then(Node::leaf)
    }

    /// Whether `path` resolves to a scalar. Always agrees with [`get`](Self::get).
    pub fn has_value(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Like [`get`](Self::get) but treats an empty string as absent.
    pub fn non_blank(&self, path: &str) -> Option<&Scalar> {
        self.get(path).filter(|s| !s.is_blank())
    }

    /// Text at `path`, rendering numbers and booleans; empty text is absent.
    pub fn text(&self, path: &str) -> Option<String> {
        self.non_blank(path).map(ToString::to_string)
    }

    /// First non-blank scalar along an ordered list of candidate paths.
    pub fn first_non_blank<'a, I>(&self, paths: I) -> Option<&Scalar>
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths.into_iter().find_map(|p| self.non_blank(p))
    }

    /// The xsd type tag recorded next to the value at `path`.
    pub fn value_type(&self, path: &str) -> Option<&str> {
        match self.node(path)? {
            Node::Object(map) => match map.get(TYPE_KEY) {
                Some(Node::Scalar(Scalar::Text(t))) => Some(t),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric instance keys under `path`, in document order.
    pub fn instances(&self, path: &str) -> Vec<&str> {
        match self.node(path) {
            Some(Node::Object(map)) => map
                .keys()
                .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
                .map(String::as_str)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether an object subtree exists at `path`.
    pub fn has_object(&self, path: &str) -> bool {
        matches!(self.node(path), Some(Node::Object(_)))
    }

    // ── Controller metadata ──────────────────────────────────────────

    fn meta_str(&self, key: &str) -> Option<&str> {
        self.root
            .child(key)
            .and_then(Node::leaf)
            .and_then(Scalar::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.meta_str("_id")
    }

    pub fn last_inform(&self) -> Option<&str> {
        self.meta_str("_lastInform")
    }

    pub fn last_boot(&self) -> Option<&str> {
        self.meta_str("_lastBoot")
    }

    pub fn registered(&self) -> Option<&str> {
        self.meta_str("_registered")
    }

    /// Operator tags; non-string entries are ignored.
    pub fn tags(&self) -> Vec<&str> {
        match self.root.child("_tags") {
            Some(Node::Array(items)) => items
                .iter()
                .filter_map(|n| match n {
                    Node::Scalar(Scalar::Text(t)) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn device_identity(&self) -> DeviceIdentity {
        let field = |name: &str| self.text(&format!("_deviceId.{name}"));
        DeviceIdentity {
            manufacturer: field("_Manufacturer"),
            oui: field("_OUI"),
            product_class: field("_ProductClass"),
            serial_number: field("_SerialNumber"),
        }
    }
}
