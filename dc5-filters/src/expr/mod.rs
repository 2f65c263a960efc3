pub mod ast;
mod eval;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod resolve;

use crate::context::Context;
use crate::error::{EvalResult, ParseResult};
use crate::value::Value;

use self::ast::Expr;
use self::eval::Evaluator;
use self::parser::Parser;
use self::resolve::Resolver;

/// Expression compilée une fois au chargement, évaluée pour chaque candidat.
///
/// La compilation enchaîne découpage, analyse et liaison des noms au
/// vocabulaire du contexte.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    source: String,
    ast: Expr,
    slots: usize,
}

impl CompiledExpr {
    pub fn compile(source: &str) -> ParseResult<Self> {
        let parsed = Parser::parse(source)?;
        let (ast, slots) = Resolver::resolve(parsed)?;
        Ok(Self {
            source: source.to_string(),
            ast,
            slots,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, ctx: &Context<'_>) -> EvalResult<Value> {
        let mut evaluator = Evaluator::new(ctx, self.slots);
        Ok(evaluator.eval(&self.ast)?.into_owned())
    }

    /// Valeur de vérité du résultat.
    pub fn test(&self, ctx: &Context<'_>) -> EvalResult<bool> {
        let mut evaluator = Evaluator::new(ctx, self.slots);
        Ok(evaluator.eval(&self.ast)?.is_truthy())
    }
}
