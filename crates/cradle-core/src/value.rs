use std::fmt;

use serde::Serialize;

use crate::node::ConfigNode;

/// A typed value on the right-hand side of a descriptor assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    /// Symbolic dotted reference resolved outside the descriptor,
    /// e.g. `flutter.compileSdkVersion` or `JavaVersion.VERSION_11`.
    VersionRef(String),
    /// `file("release.jks")`
    FileRef(String),
    /// `signingConfigs.getByName("release")` or `signingConfigs.release`
    SigningRef(String),
    /// `listOf(...)`, `setOf(...)`, `arrayOf(...)`
    List(Vec<Value>),
    /// A call used as a value, e.g. `platform("g:a:v")` inside `implementation(...)`.
    Call(Invocation),
    Block(ConfigNode),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&ConfigNode> {
        match self {
            Value::Block(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Value::Block(_))
    }

    /// Visit every string literal and `file(..)` path inside this value.
    pub fn for_each_string_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            Value::String(s) | Value::FileRef(s) => f(s),
            Value::List(items) => items.iter_mut().for_each(|v| v.for_each_string_mut(f)),
            Value::Call(call) => call.args.iter_mut().for_each(|v| v.for_each_string_mut(f)),
            Value::Block(node) => node.for_each_string_mut(f),
            Value::Integer(_) | Value::Boolean(_) | Value::VersionRef(_) | Value::SigningRef(_) => {}
        }
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::VersionRef(_) => "reference",
            Value::FileRef(_) => "file",
            Value::SigningRef(_) => "signing reference",
            Value::List(_) => "list",
            Value::Call(_) => "call",
            Value::Block(_) => "block",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::VersionRef(path) => f.write_str(path),
            Value::FileRef(path) => write!(f, "file({path:?})"),
            Value::SigningRef(name) => write!(f, "signingConfigs.getByName({name:?})"),
            Value::List(items) => {
                f.write_str("listOf(")?;
                write_args(f, items)?;
                f.write_str(")")
            }
            Value::Call(call) => write!(f, "{call}"),
            Value::Block(node) => write!(f, "{} {{ .. }}", node.key()),
        }
    }
}

/// An ordered call statement or call-valued argument: `id("com.android.application")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The single string argument, if the call has exactly one.
    pub fn single_string(&self) -> Option<&str> {
        match self.args.as_slice() {
            [Value::String(s)] => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_args(f, &self.args)?;
        f.write_str(")")
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Value]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}
