use crate::context::Fact;
use crate::error::{ParseError, ParseResult};
use crate::expr::ast::{Builtin, CompClause, Expr, Method, Target};

/// Lie chaque nom à un fait, une fonction intégrée ou une variable de
/// compréhension. Un nom inconnu est une erreur de compilation.
pub struct Resolver {
    scopes: Vec<(String, usize)>,
    slots: usize,
}

fn check_arity(name: &str, (min, max): (usize, Option<usize>), found: usize) -> ParseResult<()> {
    let ok = found >= min && max.map_or(true, |m| found <= m);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(m) if m == min => format!("{min}"),
        Some(m) => format!("{min} à {m}"),
        None => format!("au moins {min}"),
    };
    Err(ParseError::Arity {
        name: name.to_string(),
        expected,
        found,
    })
}

impl Resolver {
    /// Résout `expr` et renvoie le nombre d'emplacements locaux nécessaires.
    pub fn resolve(expr: Expr) -> ParseResult<(Expr, usize)> {
        let mut resolver = Self {
            scopes: Vec::new(),
            slots: 0,
        };
        let resolved = resolver.resolve_expr(expr)?;
        Ok((resolved, resolver.slots))
    }

    fn lookup_local(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    fn bind(&mut self, target: Target) -> ParseResult<Target> {
        match target {
            Target::Name(name) => {
                let slot = self.slots;
                self.slots += 1;
                self.scopes.push((name, slot));
                Ok(Target::Slot(slot))
            }
            Target::Unpack(parts) => Ok(Target::Unpack(
                parts
                    .into_iter()
                    .map(|p| self.bind(p))
                    .collect::<ParseResult<_>>()?,
            )),
            slot @ Target::Slot(_) => Ok(slot),
        }
    }

    fn resolve_all(&mut self, exprs: Vec<Expr>) -> ParseResult<Vec<Expr>> {
        exprs.into_iter().map(|e| self.resolve_expr(e)).collect()
    }

    fn resolve_box(&mut self, expr: Box<Expr>) -> ParseResult<Box<Expr>> {
        Ok(Box::new(self.resolve_expr(*expr)?))
    }

    fn resolve_opt(&mut self, expr: Option<Box<Expr>>) -> ParseResult<Option<Box<Expr>>> {
        expr.map(|e| self.resolve_box(e)).transpose()
    }

    fn resolve_expr(&mut self, expr: Expr) -> ParseResult<Expr> {
        let resolved = match expr {
            Expr::Name(name) => {
                if let Some(slot) = self.lookup_local(&name) {
                    Expr::Local(slot)
                } else if let Some(fact) = Fact::lookup(&name) {
                    Expr::Fact(fact)
                } else {
                    return Err(ParseError::UnknownName(name));
                }
            }
            e @ (Expr::Literal(_) | Expr::Fact(_) | Expr::Local(_)) => e,

            Expr::List(items) => Expr::List(self.resolve_all(items)?),
            Expr::Tuple(items) => Expr::Tuple(self.resolve_all(items)?),
            Expr::Set(items) => Expr::Set(self.resolve_all(items)?),
            Expr::Dict(entries) => Expr::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((self.resolve_expr(k)?, self.resolve_expr(v)?)))
                    .collect::<ParseResult<_>>()?,
            ),

            Expr::Unary(op, operand) => Expr::Unary(op, self.resolve_box(operand)?),
            Expr::Binary(op, left, right) => {
                Expr::Binary(op, self.resolve_box(left)?, self.resolve_box(right)?)
            }
            Expr::Compare(first, rest) => {
                let first = self.resolve_box(first)?;
                let rest = rest
                    .into_iter()
                    .map(|(op, e)| Ok((op, self.resolve_expr(e)?)))
                    .collect::<ParseResult<_>>()?;
                Expr::Compare(first, rest)
            }
            Expr::And(left, right) => Expr::And(self.resolve_box(left)?, self.resolve_box(right)?),
            Expr::Or(left, right) => Expr::Or(self.resolve_box(left)?, self.resolve_box(right)?),
            Expr::IfElse {
                cond,
                then,
                otherwise,
            } => Expr::IfElse {
                cond: self.resolve_box(cond)?,
                then: self.resolve_box(then)?,
                otherwise: self.resolve_box(otherwise)?,
            },

            Expr::Index(target, index) => {
                Expr::Index(self.resolve_box(target)?, self.resolve_box(index)?)
            }
            Expr::Slice {
                target,
                start,
                stop,
                step,
            } => Expr::Slice {
                target: self.resolve_box(target)?,
                start: self.resolve_opt(start)?,
                stop: self.resolve_opt(stop)?,
                step: self.resolve_opt(step)?,
            },

            Expr::Call { name, args, kwargs } => {
                let func = Builtin::lookup(&name).ok_or(ParseError::UnknownFunction(name))?;
                self.builtin(func, args, kwargs)?
            }
            Expr::Builtin { func, args, kwargs } => self.builtin(func, args, kwargs)?,

            Expr::Attr { recv, name, args } => {
                let method = Method::lookup(&name).ok_or(ParseError::UnknownMethod(name))?;
                self.method(method, recv, args)?
            }
            Expr::Method { recv, method, args } => self.method(method, recv, args)?,

            Expr::Comprehension {
                kind,
                element,
                clauses,
            } => {
                let depth = self.scopes.len();
                let mut resolved = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    // l'itérable est résolu avant que la cible soit visible
                    let iter = self.resolve_expr(clause.iter)?;
                    let target = self.bind(clause.target)?;
                    let conds = self.resolve_all(clause.conds)?;
                    resolved.push(CompClause {
                        target,
                        iter,
                        conds,
                    });
                }
                let element = self.resolve_box(element);
                self.scopes.truncate(depth);
                Expr::Comprehension {
                    kind,
                    element: element?,
                    clauses: resolved,
                }
            }
        };
        Ok(resolved)
    }

    fn builtin(
        &mut self,
        func: Builtin,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    ) -> ParseResult<Expr> {
        check_arity(func.name(), func.arity(), args.len())?;
        if let Some((key, _)) = kwargs.iter().find(|(key, _)| !func.accepts_keyword(key)) {
            return Err(ParseError::Unsupported(format!(
                "argument nommé '{key}' pour '{}()'",
                func.name()
            )));
        }
        let args = self.resolve_all(args)?;
        let kwargs = kwargs
            .into_iter()
            .map(|(k, v)| Ok((k, self.resolve_expr(v)?)))
            .collect::<ParseResult<_>>()?;
        Ok(Expr::Builtin { func, args, kwargs })
    }

    fn method(&mut self, method: Method, recv: Box<Expr>, args: Vec<Expr>) -> ParseResult<Expr> {
        check_arity(&format!(".{}()", method.name()), method.arity(), args.len())?;
        Ok(Expr::Method {
            recv: self.resolve_box(recv)?,
            method,
            args: self.resolve_all(args)?,
        })
    }
}
