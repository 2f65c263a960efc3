use std::borrow::Cow;

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::expr::ast::{Builtin, CompClause, CompKind, Expr, Target};
use crate::expr::ops::{self, MAX_SEQUENCE_LEN};
use crate::value::Value;

/// Évalue une expression résolue contre le contexte d'un candidat.
pub(crate) struct Evaluator<'a> {
    ctx: &'a Context<'a>,
    locals: Vec<Value>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(ctx: &'a Context<'a>, slots: usize) -> Self {
        Self {
            ctx,
            locals: vec![Value::None; slots],
        }
    }

    pub(crate) fn eval(&mut self, expr: &'a Expr) -> EvalResult<Cow<'a, Value>> {
        let value = match expr {
            Expr::Literal(v) => return Ok(Cow::Borrowed(v)),
            Expr::Fact(fact) => return Ok(Cow::Borrowed(self.ctx.get(*fact))),
            Expr::Local(slot) => self.locals.get(*slot).cloned().unwrap_or(Value::None),

            Expr::Name(name) | Expr::Call { name, .. } | Expr::Attr { name, .. } => {
                return Err(EvalError::Unresolved(name.clone()))
            }

            Expr::List(items) => Value::List(self.eval_items(items)?),
            Expr::Tuple(items) => Value::Tuple(self.eval_items(items)?),
            Expr::Set(items) => Value::Set(self.eval_items(items)?.into_iter().collect()),
            Expr::Dict(entries) => {
                let mut map = std::collections::BTreeMap::new();
                for (k, v) in entries {
                    let key = self.eval(k)?.into_owned();
                    let value = self.eval(v)?.into_owned();
                    map.insert(key, value);
                }
                Value::Dict(map)
            }

            Expr::Unary(op, operand) => {
                let operand = self.eval(operand)?;
                ops::unary(*op, &operand)?
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right)?
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Cow::Owned(Value::Bool(false)));
                    }
                    left = right;
                }
                Value::Bool(true)
            }
            // `and` / `or` renvoient l'opérande décisif, pas un booléen
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                return self.eval(right);
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    return Ok(left);
                }
                return self.eval(right);
            }
            Expr::IfElse {
                cond,
                then,
                otherwise,
            } => {
                return if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                };
            }

            Expr::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                ops::index(&target, &index)?
            }
            Expr::Slice {
                target,
                start,
                stop,
                step,
            } => {
                let target = self.eval(target)?;
                let start = self.eval_opt(start.as_deref())?;
                let stop = self.eval_opt(stop.as_deref())?;
                let step = self.eval_opt(step.as_deref())?;
                ops::slice(&target, start.as_deref(), stop.as_deref(), step.as_deref())?
            }

            Expr::Builtin { func, args, kwargs } => self.eval_builtin(*func, args, kwargs)?,
            Expr::Method { recv, method, args } => {
                let recv = self.eval(recv)?;
                let args = self.eval_items(args)?;
                ops::call_method(&recv, *method, &args)?
            }

            Expr::Comprehension {
                kind,
                element,
                clauses,
            } => {
                let mut out = Vec::new();
                self.for_each(clauses, element, &mut |value| {
                    out.push(value);
                    if out.len() > MAX_SEQUENCE_LEN {
                        return Err(EvalError::Overflow(
                            "compréhension trop longue".to_string(),
                        ));
                    }
                    Ok(true)
                })?;
                match kind {
                    CompKind::Set => Value::Set(out.into_iter().collect()),
                    CompKind::List | CompKind::Gen => Value::List(out),
                }
            }
        };
        Ok(Cow::Owned(value))
    }

    fn eval_items(&mut self, items: &'a [Expr]) -> EvalResult<Vec<Value>> {
        items
            .iter()
            .map(|e| self.eval(e).map(Cow::into_owned))
            .collect()
    }

    fn eval_opt(&mut self, expr: Option<&'a Expr>) -> EvalResult<Option<Cow<'a, Value>>> {
        expr.map(|e| self.eval(e)).transpose()
    }

    fn eval_builtin(
        &mut self,
        func: Builtin,
        args: &'a [Expr],
        kwargs: &'a [(String, Expr)],
    ) -> EvalResult<Value> {
        // any()/all() sur un générateur s'arrêtent au premier élément décisif
        if let (Builtin::Any | Builtin::All, [Expr::Comprehension {
            kind: CompKind::Gen,
            element,
            clauses,
        }]) = (func, args)
        {
            let wanted = func == Builtin::Any;
            let mut found = false;
            self.for_each(clauses, element, &mut |value| {
                if value.is_truthy() == wanted {
                    found = true;
                    return Ok(false);
                }
                Ok(true)
            })?;
            return Ok(Value::Bool(if wanted { found } else { !found }));
        }

        let values = self.eval_items(args)?;
        let mut reverse = false;
        for (_, value) in kwargs {
            reverse = self.eval(value)?.is_truthy();
        }
        ops::call_builtin(func, &values, reverse)
    }

    fn assign(&mut self, target: &Target, value: Value) -> EvalResult<()> {
        match target {
            Target::Slot(slot) => {
                if let Some(local) = self.locals.get_mut(*slot) {
                    *local = value;
                }
                Ok(())
            }
            Target::Unpack(parts) => {
                let items = match value {
                    Value::List(items) | Value::Tuple(items) => items,
                    other => {
                        return Err(EvalError::Type(format!(
                            "impossible de déballer '{}'",
                            other.type_name()
                        )))
                    }
                };
                if items.len() != parts.len() {
                    return Err(EvalError::Value(format!(
                        "déballage : {} valeurs attendues, {} reçues",
                        parts.len(),
                        items.len()
                    )));
                }
                for (part, item) in parts.iter().zip(items) {
                    self.assign(part, item)?;
                }
                Ok(())
            }
            Target::Name(name) => Err(EvalError::Unresolved(name.clone())),
        }
    }

    /// Parcourt les clauses et appelle `sink` pour chaque élément produit.
    /// `sink` renvoie `false` pour interrompre ; le résultat indique si le
    /// parcours est allé jusqu'au bout.
    fn for_each(
        &mut self,
        clauses: &'a [CompClause],
        element: &'a Expr,
        sink: &mut dyn FnMut(Value) -> EvalResult<bool>,
    ) -> EvalResult<bool> {
        let Some((clause, rest)) = clauses.split_first() else {
            let value = self.eval(element)?.into_owned();
            return sink(value);
        };

        let iterable = self.eval(&clause.iter)?;
        let items = ops::iter_values(&iterable)?;
        'items: for item in items {
            self.assign(&clause.target, item)?;
            for cond in &clause.conds {
                if !self.eval(cond)?.is_truthy() {
                    continue 'items;
                }
            }
            if !self.for_each(rest, element, sink)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
