use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EvalError, EvalResult};
use crate::expr::ast::{BinOp, Builtin, CmpOp, Method, UnaryOp};
use crate::value::{values_equal, Value};

/// Taille maximale d'une séquence construite pendant l'évaluation.
pub const MAX_SEQUENCE_LEN: usize = 100_000;

static NONE: Value = Value::None;

fn check_len(len: usize) -> EvalResult<()> {
    if len > MAX_SEQUENCE_LEN {
        return Err(EvalError::Overflow(format!(
            "séquence trop longue ({len} éléments)"
        )));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(v: &Value) -> Option<Num> {
        match v {
            Value::Bool(b) => Some(Num::Int(*b as i64)),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn overflow(op: BinOp) -> EvalError {
    EvalError::Overflow(format!("dépassement d'entier pour '{}'", op.symbol()))
}

fn int_op(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
    let value = match op {
        BinOp::Add => a.checked_add(b).ok_or_else(|| overflow(op))?,
        BinOp::Sub => a.checked_sub(b).ok_or_else(|| overflow(op))?,
        BinOp::Mul => a.checked_mul(b).ok_or_else(|| overflow(op))?,
        BinOp::Div => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            let q = a.checked_div(b).ok_or_else(|| overflow(op))?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            let r = a.checked_rem(b).ok_or_else(|| overflow(op))?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(EvalError::ZeroDivision);
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| overflow(op))?;
            a.checked_pow(exp).ok_or_else(|| overflow(op))?
        }
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
    };
    Ok(Value::Int(value))
}

fn float_op(op: BinOp, x: f64, y: f64) -> EvalResult<Value> {
    let value = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div | BinOp::FloorDiv | BinOp::Mod if y == 0.0 => {
            return Err(EvalError::ZeroDivision)
        }
        BinOp::Div => x / y,
        BinOp::FloorDiv => (x / y).floor(),
        BinOp::Mod => {
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        BinOp::Pow => x.powf(y),
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
            return Err(EvalError::unsupported_operand(op.symbol(), "float", "float"))
        }
    };
    Ok(Value::Float(value))
}

fn repeat(items: &[Value], times: i64) -> EvalResult<Vec<Value>> {
    let times = times.max(0) as usize;
    check_len(items.len().saturating_mul(times))?;
    Ok(items.iter().cloned().cycle().take(items.len() * times).collect())
}

fn set_op(op: BinOp, a: &BTreeSet<Value>, b: &BTreeSet<Value>) -> Option<Value> {
    let set: BTreeSet<Value> = match op {
        BinOp::BitAnd => a.intersection(b).cloned().collect(),
        BinOp::BitOr => a.union(b).cloned().collect(),
        BinOp::BitXor => a.symmetric_difference(b).cloned().collect(),
        BinOp::Sub => a.difference(b).cloned().collect(),
        _ => return None,
    };
    Some(Value::Set(set))
}

pub fn binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    // bool & bool reste un booléen
    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        match op {
            BinOp::BitAnd => return Ok(Value::Bool(*a & *b)),
            BinOp::BitOr => return Ok(Value::Bool(*a | *b)),
            BinOp::BitXor => return Ok(Value::Bool(*a ^ *b)),
            _ => {}
        }
    }

    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => return int_op(op, a, b),
        (Some(a), Some(b)) => return float_op(op, a.as_f64(), b.as_f64()),
        _ => {}
    }

    let unsupported = || EvalError::unsupported_operand(op.symbol(), left.type_name(), right.type_name());

    let value = match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            Value::List(a.iter().chain(b.iter()).cloned().collect())
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Value::Tuple(a.iter().chain(b.iter()).cloned().collect())
        }
        (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items)) => {
            let times = n.as_int().ok_or_else(unsupported)?;
            Value::List(repeat(items, times)?)
        }
        (BinOp::Mul, Value::Tuple(items), n) | (BinOp::Mul, n, Value::Tuple(items)) => {
            let times = n.as_int().ok_or_else(unsupported)?;
            Value::Tuple(repeat(items, times)?)
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) => {
            let times = n.as_int().ok_or_else(unsupported)?.max(0) as usize;
            check_len(s.len().saturating_mul(times))?;
            Value::Str(s.repeat(times))
        }
        (_, Value::Set(a), Value::Set(b)) => set_op(op, a, b).ok_or_else(unsupported)?,
        _ => return Err(unsupported()),
    };
    Ok(value)
}

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    let bad = || {
        EvalError::Type(format!(
            "opérande unaire non supporté : '{}'",
            operand.type_name()
        ))
    };
    match (op, Num::of(operand)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Some(Num::Int(i))) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Overflow("dépassement d'entier pour '-'".to_string())),
        (UnaryOp::Neg, Some(Num::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Invert, Some(Num::Int(i))) => Ok(Value::Int(!i)),
        _ => Err(bad()),
    }
}

/// Ordre entre deux valeurs ; `None` quand un NaN est impliqué.
pub fn order(op: &str, left: &Value, right: &Value) -> EvalResult<Option<Ordering>> {
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => return Ok(Some(a.cmp(&b))),
        (Some(a), Some(b)) => return Ok(a.as_f64().partial_cmp(&b.as_f64())),
        _ => {}
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                if !values_equal(x, y) {
                    return order(op, x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(EvalError::Type(format!(
            "'{op}' non supporté entre '{}' et '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn set_compare(op: CmpOp, a: &BTreeSet<Value>, b: &BTreeSet<Value>) -> bool {
    match op {
        CmpOp::Lt => a.len() < b.len() && a.is_subset(b),
        CmpOp::Le => a.is_subset(b),
        CmpOp::Gt => a.len() > b.len() && a.is_superset(b),
        CmpOp::Ge => a.is_superset(b),
        _ => false,
    }
}

/// Identité : seuls `None`, les booléens, les petits entiers et les chaînes
/// sont considérés comme partagés.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|x| values_equal(x, item))),
        Value::Set(items) => Ok(items.contains(item)),
        Value::Dict(map) => Ok(map.contains_key(item)),
        Value::Counter(map) => Ok(map.contains_key(item)),
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(needle.as_str())),
            other => Err(EvalError::Type(format!(
                "'in <str>' requiert une chaîne, pas '{}'",
                other.type_name()
            ))),
        },
        other => Err(EvalError::Type(format!(
            "'{}' n'est pas un conteneur",
            other.type_name()
        ))),
    }
}

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    let symbol = match op {
        CmpOp::Eq => return Ok(values_equal(left, right)),
        CmpOp::NotEq => return Ok(!values_equal(left, right)),
        CmpOp::In => return contains(right, left),
        CmpOp::NotIn => return contains(right, left).map(|b| !b),
        CmpOp::Is => return Ok(identical(left, right)),
        CmpOp::IsNot => return Ok(!identical(left, right)),
        CmpOp::Lt => "<",
        CmpOp::Le => "<=",
        CmpOp::Gt => ">",
        CmpOp::Ge => ">=",
    };

    if let (Value::Set(a), Value::Set(b)) = (left, right) {
        return Ok(set_compare(op, a, b));
    }

    let ordering = order(symbol, left, right)?;
    Ok(match ordering {
        None => false,
        Some(o) => match op {
            CmpOp::Lt => o == Ordering::Less,
            CmpOp::Le => o != Ordering::Greater,
            CmpOp::Gt => o == Ordering::Greater,
            _ => o != Ordering::Less,
        },
    })
}

/// Éléments parcourus par `for` : les clés pour un dict ou un Counter.
pub fn iter_values(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Set(items) => Ok(items.iter().cloned().collect()),
        Value::Dict(map) => Ok(map.keys().cloned().collect()),
        Value::Counter(map) => Ok(map.keys().cloned().collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(EvalError::Type(format!(
            "'{}' n'est pas itérable",
            other.type_name()
        ))),
    }
}

fn index_int(index: &Value) -> EvalResult<i64> {
    index.as_int().ok_or_else(|| {
        EvalError::Type(format!(
            "les indices doivent être des entiers, pas '{}'",
            index.type_name()
        ))
    })
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if i < 0 { i + len } else { i };
    (0..len).contains(&idx).then_some(idx as usize)
}

pub fn index(target: &Value, index: &Value) -> EvalResult<Value> {
    let out_of_range = || EvalError::Index(format!("index {index} hors limites"));
    match target {
        Value::List(items) | Value::Tuple(items) => {
            let i = normalize_index(index_int(index)?, items.len()).ok_or_else(out_of_range)?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(index_int(index)?, chars.len()).ok_or_else(out_of_range)?;
            Ok(Value::Str(chars[i].to_string()))
        }
        Value::Dict(map) => map
            .get(index)
            .cloned()
            .ok_or_else(|| EvalError::Key(index.to_string())),
        Value::Counter(map) => Ok(Value::Int(map.get(index).copied().unwrap_or(0))),
        other => Err(EvalError::Type(format!(
            "'{}' n'est pas indexable",
            other.type_name()
        ))),
    }
}

fn slice_bound(value: Option<&Value>) -> EvalResult<Option<i64>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(v) => index_int(v).map(Some),
    }
}

fn slice_positions(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    // i128 : `i + step` ne déborde pas, même avec un pas proche de i64::MAX.
    let len = len as i128;
    let step = i128::from(step);
    let clamp = |v: i128, lo: i128, hi: i128| v.max(lo).min(hi);
    let adjust = |v: i64| {
        let v = i128::from(v);
        if v < 0 {
            v + len
        } else {
            v
        }
    };

    let mut positions = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(adjust(s), 0, len));
        let stop = stop.map_or(len, |s| clamp(adjust(s), 0, len));
        while i < stop {
            positions.push(i as usize);
            i += step;
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(adjust(s), -1, len - 1));
        let stop = stop.map_or(-1, |s| clamp(adjust(s), -1, len - 1));
        while i > stop {
            positions.push(i as usize);
            i += step;
        }
    }
    positions
}

pub fn slice(
    target: &Value,
    start: Option<&Value>,
    stop: Option<&Value>,
    step: Option<&Value>,
) -> EvalResult<Value> {
    let start = slice_bound(start)?;
    let stop = slice_bound(stop)?;
    let step = slice_bound(step)?.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::Value("le pas d'une tranche ne peut pas être nul".to_string()));
    }

    match target {
        Value::List(items) => Ok(Value::List(
            slice_positions(items.len(), start, stop, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect(),
        )),
        Value::Tuple(items) => Ok(Value::Tuple(
            slice_positions(items.len(), start, stop, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect(),
        )),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(
                slice_positions(chars.len(), start, stop, step)
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        other => Err(EvalError::Type(format!(
            "'{}' ne supporte pas les tranches",
            other.type_name()
        ))),
    }
}

fn sort_values(items: &mut [Value], reverse: bool) -> EvalResult<()> {
    let mut failure = None;
    items.sort_by(|a, b| match order("<", a, b) {
        Ok(Some(o)) if reverse => o.reverse(),
        Ok(Some(o)) => o,
        Ok(None) => Ordering::Equal,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    failure.map_or(Ok(()), Err)
}

fn extreme(func: Builtin, args: &[Value]) -> EvalResult<Value> {
    let items = if args.len() == 1 {
        iter_values(&args[0])?
    } else {
        args.to_vec()
    };
    let wanted = if func == Builtin::Max {
        Ordering::Greater
    } else {
        Ordering::Less
    };

    let mut iter = items.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        EvalError::Value(format!("{}() sur une séquence vide", func.name()))
    })?;
    for item in iter {
        if order("<", &item, &best)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best)
}

fn count_into(counts: &mut BTreeMap<Value, i64>, items: Vec<Value>) {
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
}

fn to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Bool(_) | Value::Int(_) => Ok(Value::Int(value.as_int().unwrap_or(0))),
        Value::Float(f) if f.is_nan() => Err(EvalError::Value(
            "impossible de convertir NaN en entier".to_string(),
        )),
        Value::Float(f) => {
            let truncated = f.trunc();
            if truncated.is_infinite() || truncated.abs() >= i64::MAX as f64 {
                return Err(EvalError::Overflow(format!("{f} hors limites pour int()")));
            }
            Ok(Value::Int(truncated as i64))
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::Value(format!("littéral invalide pour int() : '{s}'"))),
        other => Err(EvalError::Type(format!(
            "int() n'accepte pas '{}'",
            other.type_name()
        ))),
    }
}

fn range(args: &[Value]) -> EvalResult<Value> {
    let ints = args
        .iter()
        .map(|a| {
            a.as_int().ok_or_else(|| {
                EvalError::Type(format!("range() attend des entiers, pas '{}'", a.type_name()))
            })
        })
        .collect::<EvalResult<Vec<i64>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(EvalError::Type("range() attend 1 à 3 arguments".to_string())),
    };
    if step == 0 {
        return Err(EvalError::Value("le pas de range() ne peut pas être nul".to_string()));
    }

    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let span = if step > 0 { stop - start } else { start - stop };
    let len = if span <= 0 { 0 } else { (span - 1) / step.abs() + 1 };
    if len > MAX_SEQUENCE_LEN as i128 {
        return Err(EvalError::Overflow(format!("range() trop long ({len} éléments)")));
    }
    Ok(Value::List(
        (0..len)
            .map(|k| Value::Int((start + k * step) as i64))
            .collect(),
    ))
}

pub fn call_builtin(func: Builtin, args: &[Value], reverse: bool) -> EvalResult<Value> {
    let first = args.first();
    match func {
        Builtin::Len => {
            let value = first.unwrap_or(&NONE);
            let len = match value {
                Value::List(items) | Value::Tuple(items) => items.len(),
                Value::Set(items) => items.len(),
                Value::Dict(map) => map.len(),
                Value::Counter(map) => map.len(),
                Value::Str(s) => s.chars().count(),
                other => {
                    return Err(EvalError::Type(format!(
                        "'{}' n'a pas de longueur",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Int(len as i64))
        }
        Builtin::Sum => {
            let items = iter_values(first.unwrap_or(&NONE))?;
            let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
            for item in &items {
                total = binary(BinOp::Add, &total, item)?;
            }
            Ok(total)
        }
        Builtin::Any => Ok(Value::Bool(
            iter_values(first.unwrap_or(&NONE))?
                .iter()
                .any(Value::is_truthy),
        )),
        Builtin::All => Ok(Value::Bool(
            iter_values(first.unwrap_or(&NONE))?
                .iter()
                .all(Value::is_truthy),
        )),
        Builtin::Set => Ok(Value::Set(match first {
            Some(v) => iter_values(v)?.into_iter().collect(),
            None => BTreeSet::new(),
        })),
        Builtin::List => Ok(Value::List(match first {
            Some(v) => iter_values(v)?,
            None => Vec::new(),
        })),
        Builtin::Tuple => Ok(Value::Tuple(match first {
            Some(v) => iter_values(v)?,
            None => Vec::new(),
        })),
        Builtin::Sorted => {
            let mut items = iter_values(first.unwrap_or(&NONE))?;
            sort_values(&mut items, reverse)?;
            Ok(Value::List(items))
        }
        Builtin::Min | Builtin::Max => extreme(func, args),
        Builtin::Abs => match first.and_then(Num::of) {
            Some(Num::Int(i)) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| EvalError::Overflow("dépassement d'entier pour abs()".to_string())),
            Some(Num::Float(f)) => Ok(Value::Float(f.abs())),
            None => Err(EvalError::Type(format!(
                "abs() n'accepte pas '{}'",
                first.map_or("NoneType", Value::type_name)
            ))),
        },
        Builtin::Int => first.map_or(Ok(Value::Int(0)), to_int),
        Builtin::Str => Ok(Value::Str(match first {
            None => String::new(),
            Some(Value::Str(s)) => s.clone(),
            Some(other) => other.to_string(),
        })),
        Builtin::Range => range(args),
        Builtin::Counter => {
            let mut counts = BTreeMap::new();
            match first {
                None => {}
                Some(Value::Counter(map)) => counts = map.clone(),
                Some(Value::Dict(map)) => {
                    for (k, v) in map {
                        let n = v.as_int().ok_or_else(|| {
                            EvalError::Type("Counter() attend des comptes entiers".to_string())
                        })?;
                        counts.insert(k.clone(), n);
                    }
                }
                Some(v) => count_into(&mut counts, iter_values(v)?),
            }
            Ok(Value::Counter(counts))
        }
    }
}

fn arg_set(value: &Value) -> EvalResult<BTreeSet<Value>> {
    match value {
        Value::Set(items) => Ok(items.clone()),
        other => Ok(iter_values(other)?.into_iter().collect()),
    }
}

fn map_entries(recv: &Value, method: Method) -> EvalResult<Vec<(Value, Value)>> {
    match recv {
        Value::Dict(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Counter(map) => Ok(map.iter().map(|(k, v)| (k.clone(), Value::Int(*v))).collect()),
        other => Err(EvalError::no_method(other.type_name(), method.name())),
    }
}

pub fn call_method(recv: &Value, method: Method, args: &[Value]) -> EvalResult<Value> {
    let arg = args.first().unwrap_or(&NONE);
    let no_method = || EvalError::no_method(recv.type_name(), method.name());

    match method {
        Method::Count => match recv {
            Value::List(items) | Value::Tuple(items) => Ok(Value::Int(
                items.iter().filter(|x| values_equal(x, arg)).count() as i64,
            )),
            Value::Str(s) => match arg {
                Value::Str(needle) if needle.is_empty() => {
                    Ok(Value::Int(s.chars().count() as i64 + 1))
                }
                Value::Str(needle) => Ok(Value::Int(s.matches(needle.as_str()).count() as i64)),
                other => Err(EvalError::Type(format!(
                    "count() sur une chaîne attend une chaîne, pas '{}'",
                    other.type_name()
                ))),
            },
            _ => Err(no_method()),
        },
        Method::Index => match recv {
            Value::List(items) | Value::Tuple(items) => items
                .iter()
                .position(|x| values_equal(x, arg))
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| EvalError::Value(format!("{arg} n'est pas dans la séquence"))),
            _ => Err(no_method()),
        },
        Method::Issubset | Method::Issuperset | Method::Isdisjoint | Method::SymmetricDifference => {
            let Value::Set(set) = recv else {
                return Err(no_method());
            };
            let other = arg_set(arg)?;
            Ok(match method {
                Method::Issubset => Value::Bool(set.is_subset(&other)),
                Method::Issuperset => Value::Bool(set.is_superset(&other)),
                Method::Isdisjoint => Value::Bool(set.is_disjoint(&other)),
                _ => Value::Set(set.symmetric_difference(&other).cloned().collect()),
            })
        }
        Method::Intersection | Method::Union | Method::Difference => {
            let Value::Set(set) = recv else {
                return Err(no_method());
            };
            let mut result = set.clone();
            for other in args {
                let other = arg_set(other)?;
                result = match method {
                    Method::Intersection => result.intersection(&other).cloned().collect(),
                    Method::Union => result.union(&other).cloned().collect(),
                    _ => result.difference(&other).cloned().collect(),
                };
            }
            Ok(Value::Set(result))
        }
        Method::MostCommon => {
            let Value::Counter(map) = recv else {
                return Err(no_method());
            };
            let mut entries: Vec<(&Value, i64)> = map.iter().map(|(k, v)| (k, *v)).collect();
            // tri stable : à égalité, l'ordre des clés est conservé
            entries.sort_by(|a, b| b.1.cmp(&a.1));
            let limit = match args.first() {
                None | Some(Value::None) => entries.len(),
                Some(n) => n.as_int().ok_or_else(|| {
                    EvalError::Type("most_common() attend un entier".to_string())
                })?.max(0) as usize,
            };
            Ok(Value::List(
                entries
                    .into_iter()
                    .take(limit)
                    .map(|(k, n)| Value::Tuple(vec![k.clone(), Value::Int(n)]))
                    .collect(),
            ))
        }
        Method::Keys => Ok(Value::List(
            map_entries(recv, method)?.into_iter().map(|(k, _)| k).collect(),
        )),
        Method::Values => Ok(Value::List(
            map_entries(recv, method)?.into_iter().map(|(_, v)| v).collect(),
        )),
        Method::Items => Ok(Value::List(
            map_entries(recv, method)?
                .into_iter()
                .map(|(k, v)| Value::Tuple(vec![k, v]))
                .collect(),
        )),
        Method::Get => {
            let default = args.get(1).cloned().unwrap_or(Value::None);
            match recv {
                Value::Dict(map) => Ok(map.get(arg).cloned().unwrap_or(default)),
                Value::Counter(map) => Ok(map.get(arg).map_or(default, |n| Value::Int(*n))),
                _ => Err(no_method()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().map(|&i| Value::Int(i)).collect())
    }

    fn int_set(values: &[i64]) -> Value {
        Value::Set(values.iter().map(|&i| Value::Int(i)).collect())
    }

    #[test]
    fn test_floor_division_and_modulo_follow_floor_semantics() {
        assert_eq!(binary(BinOp::FloorDiv, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-4));
        assert_eq!(binary(BinOp::Mod, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(1));
        assert_eq!(binary(BinOp::Mod, &Value::Int(7), &Value::Int(-2)).unwrap(), Value::Int(-1));
        assert_eq!(binary(BinOp::Mod, &Value::Int(15), &Value::Int(2)).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(EvalError::ZeroDivision)
        );
        assert_eq!(
            binary(BinOp::Mod, &Value::Float(1.0), &Value::Int(0)),
            Err(EvalError::ZeroDivision)
        );
    }

    #[test]
    fn test_true_division_gives_float() {
        assert_eq!(binary(BinOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        assert!(matches!(
            binary(BinOp::Mul, &Value::Int(i64::MAX), &Value::Int(2)),
            Err(EvalError::Overflow(_))
        ));
        assert!(matches!(
            binary(BinOp::Pow, &Value::Int(10), &Value::Int(40)),
            Err(EvalError::Overflow(_))
        ));
    }

    #[test]
    fn test_set_operators() {
        let a = int_set(&[1, 2, 3]);
        let b = int_set(&[3, 4]);
        assert_eq!(binary(BinOp::BitAnd, &a, &b).unwrap(), int_set(&[3]));
        assert_eq!(binary(BinOp::BitOr, &a, &b).unwrap(), int_set(&[1, 2, 3, 4]));
        assert_eq!(binary(BinOp::BitXor, &a, &b).unwrap(), int_set(&[1, 2, 4]));
        assert_eq!(binary(BinOp::Sub, &a, &b).unwrap(), int_set(&[1, 2]));
        assert!(binary(BinOp::Add, &a, &b).is_err());
    }

    #[test]
    fn test_mixed_type_operands() {
        assert!(matches!(
            binary(BinOp::Add, &Value::Int(1), &Value::str("a")),
            Err(EvalError::Type(_))
        ));
        assert_eq!(
            binary(BinOp::Add, &ints(&[1]), &ints(&[2])).unwrap(),
            ints(&[1, 2])
        );
        assert_eq!(binary(BinOp::Mul, &ints(&[0]), &Value::Int(3)).unwrap(), ints(&[0, 0, 0]));
    }

    #[test]
    fn test_compare_numbers_and_nan() {
        assert!(compare(CmpOp::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap());
        let nan = Value::Float(f64::NAN);
        assert!(!compare(CmpOp::Lt, &nan, &Value::Int(1)).unwrap());
        assert!(!compare(CmpOp::Ge, &nan, &Value::Int(1)).unwrap());
        assert!(!compare(CmpOp::Eq, &nan, &nan).unwrap());
        assert!(compare(CmpOp::NotEq, &nan, &nan).unwrap());
    }

    #[test]
    fn test_compare_mismatched_types_raises() {
        assert!(matches!(
            compare(CmpOp::Lt, &Value::Int(1), &Value::str("a")),
            Err(EvalError::Type(_))
        ));
        assert!(compare(CmpOp::Eq, &Value::Int(1), &Value::str("a")).is_ok());
        assert!(compare(CmpOp::Lt, &Value::None, &Value::Int(1)).is_err());
    }

    #[test]
    fn test_compare_sequences_and_sets() {
        assert!(compare(CmpOp::Lt, &ints(&[1, 2]), &ints(&[1, 3])).unwrap());
        assert!(compare(CmpOp::Lt, &ints(&[1]), &ints(&[1, 0])).unwrap());
        assert!(compare(CmpOp::Le, &int_set(&[1]), &int_set(&[1, 2])).unwrap());
        assert!(!compare(CmpOp::Lt, &int_set(&[1, 2]), &int_set(&[1, 2])).unwrap());
    }

    #[test]
    fn test_membership() {
        assert!(compare(CmpOp::In, &Value::Int(3), &ints(&[1, 3])).unwrap());
        assert!(compare(CmpOp::NotIn, &Value::Int(4), &int_set(&[1, 3])).unwrap());
        assert!(compare(CmpOp::In, &Value::str("ow"), &Value::str("Low")).unwrap());
        assert!(compare(CmpOp::In, &Value::Int(1), &Value::Int(1)).is_err());
        assert!(compare(CmpOp::In, &Value::Float(3.0), &ints(&[3])).unwrap());
    }

    #[test]
    fn test_is_none() {
        assert!(compare(CmpOp::Is, &Value::None, &Value::None).unwrap());
        assert!(compare(CmpOp::IsNot, &Value::Int(0), &Value::None).unwrap());
    }

    #[test]
    fn test_index_and_counter_default() {
        let list = ints(&[4, 5, 6]);
        assert_eq!(index(&list, &Value::Int(-1)).unwrap(), Value::Int(6));
        assert!(matches!(index(&list, &Value::Int(3)), Err(EvalError::Index(_))));
        assert!(matches!(index(&list, &Value::str("a")), Err(EvalError::Type(_))));

        let counter = call_builtin(Builtin::Counter, &[ints(&[1, 1, 2])], false).unwrap();
        assert_eq!(index(&counter, &Value::Int(1)).unwrap(), Value::Int(2));
        assert_eq!(index(&counter, &Value::Int(9)).unwrap(), Value::Int(0));

        let dict = Value::Dict([(Value::Int(0), Value::Int(5))].into_iter().collect());
        assert!(matches!(index(&dict, &Value::Int(1)), Err(EvalError::Key(_))));
    }

    #[test]
    fn test_slices() {
        let list = ints(&[0, 1, 2, 3, 4]);
        assert_eq!(slice(&list, Some(&Value::Int(1)), None, None).unwrap(), ints(&[1, 2, 3, 4]));
        assert_eq!(slice(&list, None, Some(&Value::Int(-2)), None).unwrap(), ints(&[0, 1, 2]));
        assert_eq!(
            slice(&list, None, None, Some(&Value::Int(-1))).unwrap(),
            ints(&[4, 3, 2, 1, 0])
        );
        assert_eq!(
            slice(&list, None, None, Some(&Value::Int(2))).unwrap(),
            ints(&[0, 2, 4])
        );
        assert_eq!(slice(&list, Some(&Value::Int(10)), None, None).unwrap(), ints(&[]));
        assert!(slice(&list, None, None, Some(&Value::Int(0))).is_err());
        assert_eq!(
            slice(&Value::str("11323"), Some(&Value::Int(-2)), None, None).unwrap(),
            Value::str("23")
        );
    }

    #[test]
    fn test_slices_with_extreme_bounds() {
        let list = ints(&[0, 1, 2, 3, 4]);
        assert_eq!(
            slice(&list, Some(&Value::Int(1)), None, Some(&Value::Int(i64::MAX))).unwrap(),
            ints(&[1])
        );
        assert_eq!(
            slice(&list, None, None, Some(&Value::Int(i64::MIN))).unwrap(),
            ints(&[4])
        );
        assert_eq!(
            slice(&list, Some(&Value::Int(i64::MIN)), Some(&Value::Int(i64::MAX)), None).unwrap(),
            list
        );
        assert_eq!(
            slice(&Value::str("11323"), Some(&Value::Int(i64::MAX)), None, Some(&Value::Int(-1)))
                .unwrap(),
            Value::str("32311")
        );
    }

    #[test]
    fn test_builtins() {
        let digits = ints(&[3, 1, 2]);
        assert_eq!(call_builtin(Builtin::Len, &[digits.clone()], false).unwrap(), Value::Int(3));
        assert_eq!(call_builtin(Builtin::Sum, &[digits.clone()], false).unwrap(), Value::Int(6));
        assert_eq!(call_builtin(Builtin::Max, &[digits.clone()], false).unwrap(), Value::Int(3));
        assert_eq!(
            call_builtin(Builtin::Min, &[Value::Int(4), Value::Int(2)], false).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            call_builtin(Builtin::Sorted, &[digits.clone()], true).unwrap(),
            ints(&[3, 2, 1])
        );
        assert_eq!(call_builtin(Builtin::Set, &[digits], false).unwrap(), int_set(&[1, 2, 3]));
        assert_eq!(
            call_builtin(Builtin::Range, &[Value::Int(5), Value::Int(0), Value::Int(-2)], false)
                .unwrap(),
            ints(&[5, 3, 1])
        );
        assert_eq!(
            call_builtin(Builtin::Int, &[Value::str(" 12 ")], false).unwrap(),
            Value::Int(12)
        );
        assert!(call_builtin(Builtin::Int, &[Value::Float(f64::NAN)], false).is_err());
        assert!(call_builtin(Builtin::Max, &[ints(&[])], false).is_err());
        assert!(call_builtin(Builtin::Sum, &[Value::Int(3)], false).is_err());
        assert!(call_builtin(Builtin::Range, &[Value::Int(i64::MAX)], false).is_err());
    }

    #[test]
    fn test_methods() {
        let set = int_set(&[1, 2, 3]);
        assert_eq!(
            call_method(&set, Method::Issubset, &[ints(&[1, 2, 3, 4])]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call_method(&set, Method::Intersection, &[ints(&[2, 9]), int_set(&[2])]).unwrap(),
            int_set(&[2])
        );
        assert!(matches!(
            call_method(&ints(&[1]), Method::Union, &[]),
            Err(EvalError::Type(_))
        ));
        assert_eq!(
            call_method(&ints(&[1, 1, 2]), Method::Count, &[Value::Int(1)]).unwrap(),
            Value::Int(2)
        );
        assert!(matches!(
            call_method(&ints(&[1]), Method::Index, &[Value::Int(5)]),
            Err(EvalError::Value(_))
        ));
    }

    #[test]
    fn test_most_common_orders_ties_by_key() {
        let counter = call_builtin(Builtin::Counter, &[ints(&[3, 1, 3, 1, 2])], false).unwrap();
        let top = call_method(&counter, Method::MostCommon, &[Value::Int(2)]).unwrap();
        assert_eq!(
            top,
            Value::List(vec![
                Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
                Value::Tuple(vec![Value::Int(3), Value::Int(2)]),
            ])
        );
        assert_eq!(
            call_method(&counter, Method::Get, &[Value::Int(7)]).unwrap(),
            Value::None
        );
    }
}
