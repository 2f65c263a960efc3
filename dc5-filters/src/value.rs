use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Valeur manipulée par les prédicats, avec la notion de « vérité » des
/// catalogues (dict et Counter compris).
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    Dict(BTreeMap<Value, Value>),
    /// Table de comptage : une clé absente vaut 0.
    Counter(BTreeMap<Value, i64>),
}

impl Value {
    pub fn digits(digits: &[u8]) -> Value {
        Value::List(digits.iter().map(|&d| Value::Int(d as i64)).collect())
    }

    pub fn digit_set<'a>(digits: impl IntoIterator<Item = &'a u8>) -> Value {
        Value::Set(digits.into_iter().map(|&d| Value::Int(d as i64)).collect())
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Counter(_) => "Counter",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Set(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
            Value::Counter(map) => !map.is_empty(),
        }
    }

    /// Valeur numérique entière (les booléens comptent comme 0/1).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::Tuple(_) => 3,
            Value::List(_) => 4,
            Value::Set(_) => 5,
            Value::Dict(_) | Value::Counter(_) => 6,
        }
    }

    fn map_entries(&self) -> Vec<(Value, Value)> {
        match self {
            Value::Dict(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Value::Counter(map) => map.iter().map(|(k, v)| (k.clone(), Value::Int(*v))).collect(),
            _ => Vec::new(),
        }
    }
}

/// Égalité au sens des prédicats : NaN n'est égal à rien, 1 == 1.0 == True.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_float(), b.as_float()) {
        if let (Some(i), Some(j)) = (a.as_int(), b.as_int()) {
            return i == j;
        }
        return x == y;
    }
    a == b
}

fn cmp_numbers(a: &Value, b: &Value) -> Ordering {
    match (a.as_int(), b.as_int()) {
        (Some(i), Some(j)) => i.cmp(&j),
        _ => {
            let x = a.as_float().unwrap_or(f64::NAN);
            let y = b.as_float().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

fn cmp_seq<'a>(a: impl Iterator<Item = &'a Value>, b: impl Iterator<Item = &'a Value>) -> Ordering {
    a.cmp(b)
}

// Ordre total utilisé par les conteneurs (BTreeSet / BTreeMap). Les
// comparaisons du langage passent par `values_equal` et `eval::compare`.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ra, rb) = (self.rank(), other.rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => {
                cmp_seq(a.iter(), b.iter())
            }
            (Value::Set(a), Value::Set(b)) => cmp_seq(a.iter(), b.iter()),
            _ if self.is_number() => cmp_numbers(self, other),
            _ => self.map_entries().cmp(&other.map_entries()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => f.write_str("nan"),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::List(items) => write_items(f, "[", items.iter(), "]"),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Value::Tuple(items) => write_items(f, "(", items.iter(), ")"),
            Value::Set(items) if items.is_empty() => f.write_str("set()"),
            Value::Set(items) => write_items(f, "{", items.iter(), "}"),
            Value::Dict(_) | Value::Counter(_) => {
                let prefix = if matches!(self, Value::Counter(_)) { "Counter({" } else { "{" };
                let suffix = if matches!(self, Value::Counter(_)) { "})" } else { "}" };
                f.write_str(prefix)?;
                for (i, (k, v)) in self.map_entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str(suffix)
            }
        }
    }
}
