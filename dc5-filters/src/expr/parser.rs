use crate::error::{ParseError, ParseResult};
use crate::expr::ast::{BinOp, CmpOp, CompClause, CompKind, Expr, Target, UnaryOp};
use crate::expr::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

/// Imbrication maximale des parenthèses, `not`, unaires et ternaires.
const MAX_NESTING: usize = 48;

/// Profondeur maximale de l'arbre produit, chaînes d'opérateurs comprises.
/// La résolution et l'évaluation descendent l'arbre récursivement.
const MAX_DEPTH: usize = 256;

/// Analyseur descendant récursif des prédicats.
///
/// Priorités : ternaire, `or`, `and`, `not`, comparaisons chaînées, `|`,
/// `^`, `&`, `+ -`, `* / // %`, unaires, `**`, puis indexation, appels et
/// méthodes.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    depth: usize,
}

impl Parser {
    pub fn parse(input: &str) -> ParseResult<Expr> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Self {
            tokens,
            pos: 0,
            nesting: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        parser.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn too_deep() -> ParseError {
        ParseError::Unsupported("expression trop imbriquée".to_string())
    }

    /// Ouvre un niveau récursif. Une erreur abandonne toute l'analyse,
    /// les compteurs n'ont donc pas à être restaurés dans ce cas.
    fn enter(&mut self) -> ParseResult<()> {
        self.nesting += 1;
        self.depth += 1;
        if self.nesting > MAX_NESTING || self.depth > MAX_DEPTH {
            return Err(Self::too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
        self.depth -= 1;
    }

    /// Un niveau de plus dans une chaîne associative à gauche.
    fn grow(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Self::too_deep());
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let expr = self.parse_expr_inner()?;
        self.leave();
        Ok(expr)
    }

    fn parse_expr_inner(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Lambda) {
            return Err(ParseError::Unsupported("lambda".to_string()));
        }
        let body = self.parse_or()?;
        if self.check(TokenKind::If) {
            self.advance();
            let cond = self.parse_or()?;
            self.expect(TokenKind::Else)?;
            let otherwise = self.parse_expr()?;
            return Ok(Expr::IfElse {
                cond: Box::new(cond),
                then: Box::new(body),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            self.advance();
            self.grow()?;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_not()?;
        while self.check(TokenKind::And) {
            self.advance();
            self.grow()?;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Not) {
            self.advance();
            self.enter()?;
            let operand = self.parse_not()?;
            self.leave();
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let first = self.parse_bit_or()?;
        let mut rest = Vec::new();

        while let Some(op) = self.comparison_op() {
            let right = self.parse_bit_or()?;
            rest.push((op, right));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    /// Consomme un opérateur de comparaison (y compris `not in` et `is not`).
    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::In => CmpOp::In,
            TokenKind::Not if self.peek_kind_at(1) == TokenKind::In => {
                self.advance();
                CmpOp::NotIn
            }
            TokenKind::Is if self.peek_kind_at(1) == TokenKind::Not => {
                self.advance();
                CmpOp::IsNot
            }
            TokenKind::Is => CmpOp::Is,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_bit_xor()?;
        while self.check(TokenKind::Pipe) {
            self.advance();
            self.grow()?;
            let right = self.parse_bit_xor()?;
            left = Expr::Binary(BinOp::BitOr, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_bit_and()?;
        while self.check(TokenKind::Caret) {
            self.advance();
            self.grow()?;
            let right = self.parse_bit_and()?;
            left = Expr::Binary(BinOp::BitXor, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_arith()?;
        while self.check(TokenKind::Amp) {
            self.advance();
            self.grow()?;
            let right = self.parse_arith()?;
            left = Expr::Binary(BinOp::BitAnd, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_arith(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.grow()?;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            self.grow()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if self.check(TokenKind::DoubleStar) {
            self.advance();
            self.enter()?;
            let exponent = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_atom()?;

        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::LBracket | TokenKind::LParen | TokenKind::Dot
            ) {
                self.grow()?;
            }
            match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr)?;
                }
                TokenKind::LParen => {
                    let col = self.peek().col;
                    self.advance();
                    let (args, kwargs) = self.parse_call_args()?;
                    expr = match expr {
                        Expr::Name(name) => Expr::Call { name, args, kwargs },
                        _ => {
                            return Err(ParseError::Unsupported(format!(
                                "appel d'une expression (colonne {col})"
                            )))
                        }
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect(TokenKind::Name)?.text.clone();
                    if !self.check(TokenKind::LParen) {
                        return Err(ParseError::Unsupported(format!("attribut '.{name}'")));
                    }
                    self.advance();
                    let (args, kwargs) = self.parse_call_args()?;
                    if let Some((key, _)) = kwargs.first() {
                        return Err(ParseError::Unsupported(format!(
                            "argument nommé '{key}' pour '.{name}()'"
                        )));
                    }
                    expr = Expr::Attr {
                        recv: Box::new(expr),
                        name,
                        args,
                    };
                }
                _ => break,
            }
        }

        self.depth = base;
        Ok(expr)
    }

    /// Après `[` : index simple ou tranche `start:stop:step`.
    fn parse_subscript(&mut self, target: Expr) -> ParseResult<Expr> {
        let start = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        if !self.check(TokenKind::Colon) {
            self.expect(TokenKind::RBracket)?;
            let index = start.ok_or_else(|| ParseError::UnexpectedEnd("index".to_string()))?;
            return Ok(Expr::Index(Box::new(target), index));
        }

        self.advance();
        let stop = self.parse_slice_bound()?;
        let step = if self.check(TokenKind::Colon) {
            self.advance();
            self.parse_slice_bound()?
        } else {
            None
        };
        self.expect(TokenKind::RBracket)?;

        Ok(Expr::Slice {
            target: Box::new(target),
            start,
            stop,
            step,
        })
    }

    fn parse_slice_bound(&mut self) -> ParseResult<Option<Box<Expr>>> {
        if self.check(TokenKind::Colon) || self.check(TokenKind::RBracket) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expr()?)))
        }
    }

    /// Après `(` : arguments positionnels, nommés, ou un générateur unique.
    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        while !self.check(TokenKind::RParen) {
            if self.check(TokenKind::Name) && self.peek_kind_at(1) == TokenKind::Assign {
                let key = self.advance().text.clone();
                self.advance();
                kwargs.push((key, self.parse_expr()?));
            } else {
                let arg = self.parse_expr()?;
                if self.check(TokenKind::For) {
                    args.push(self.parse_comprehension(CompKind::Gen, arg)?);
                } else {
                    if !kwargs.is_empty() {
                        let tok = self.peek();
                        return Err(ParseError::UnexpectedToken {
                            expected: "argument nommé".to_string(),
                            found: tok.text.clone(),
                            col: tok.col,
                        });
                    }
                    args.push(arg);
                }
            }

            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(TokenKind::RParen)?;
        Ok((args, kwargs))
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Int => {
                self.advance();
                let value = tok.text.parse::<i64>().map_err(|_| ParseError::Lex {
                    col: tok.col,
                    message: format!("entier hors limites '{}'", tok.text),
                })?;
                Ok(Expr::Literal(Value::Int(value)))
            }
            TokenKind::Float => {
                self.advance();
                let value = tok.text.parse::<f64>().map_err(|_| ParseError::Lex {
                    col: tok.col,
                    message: format!("nombre invalide '{}'", tok.text),
                })?;
                Ok(Expr::Literal(Value::Float(value)))
            }
            TokenKind::Str => {
                self.advance();
                let mut text = tok.text;
                // concaténation implicite : 'a' 'b'
                while self.check(TokenKind::Str) {
                    text.push_str(&self.advance().text);
                }
                Ok(Expr::Literal(Value::Str(text)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Literal(Value::None))
            }
            TokenKind::Name => {
                self.advance();
                Ok(Expr::Name(tok.text))
            }
            TokenKind::LParen => {
                self.advance();
                self.parse_paren()
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_list()
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_brace()
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEnd("une valeur".to_string())),
            _ => Err(ParseError::UnexpectedToken {
                expected: "une valeur".to_string(),
                found: tok.text,
                col: tok.col,
            }),
        }
    }

    fn parse_paren(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.parse_expr()?;
        if self.check(TokenKind::For) {
            let comp = self.parse_comprehension(CompKind::Gen, first)?;
            self.expect(TokenKind::RParen)?;
            return Ok(comp);
        }
        if !self.check(TokenKind::Comma) {
            self.expect(TokenKind::RParen)?;
            return Ok(first);
        }

        let items = self.parse_items_after(first, TokenKind::RParen)?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::RBracket) {
            self.advance();
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.parse_expr()?;
        if self.check(TokenKind::For) {
            let comp = self.parse_comprehension(CompKind::List, first)?;
            self.expect(TokenKind::RBracket)?;
            return Ok(comp);
        }

        let items = self.parse_items_after(first, TokenKind::RBracket)?;
        Ok(Expr::List(items))
    }

    fn parse_brace(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::RBrace) {
            self.advance();
            return Ok(Expr::Dict(Vec::new()));
        }

        let first = self.parse_expr()?;
        if self.check(TokenKind::Colon) {
            return self.parse_dict_after(first);
        }
        if self.check(TokenKind::For) {
            let comp = self.parse_comprehension(CompKind::Set, first)?;
            self.expect(TokenKind::RBrace)?;
            return Ok(comp);
        }

        let items = self.parse_items_after(first, TokenKind::RBrace)?;
        Ok(Expr::Set(items))
    }

    fn parse_dict_after(&mut self, first_key: Expr) -> ParseResult<Expr> {
        let mut entries = Vec::new();
        let mut key = first_key;

        loop {
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            if self.check(TokenKind::For) {
                return Err(ParseError::Unsupported(
                    "compréhension de dictionnaire".to_string(),
                ));
            }
            entries.push((key, value));

            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
            if self.check(TokenKind::RBrace) {
                break;
            }
            key = self.parse_expr()?;
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Dict(entries))
    }

    /// Suite `, item, item [,]` jusqu'au délimiteur fermant.
    fn parse_items_after(&mut self, first: Expr, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut items = vec![first];
        while self.check(TokenKind::Comma) {
            self.advance();
            if self.check(close.clone()) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_comprehension(&mut self, kind: CompKind, element: Expr) -> ParseResult<Expr> {
        let mut clauses = Vec::new();

        while self.check(TokenKind::For) {
            self.advance();
            let target = self.parse_target()?;
            self.expect(TokenKind::In)?;
            let iter = self.parse_or()?;

            let mut conds = Vec::new();
            while self.check(TokenKind::If) {
                self.advance();
                conds.push(self.parse_or()?);
            }
            clauses.push(CompClause {
                target,
                iter,
                conds,
            });
        }

        Ok(Expr::Comprehension {
            kind,
            element: Box::new(element),
            clauses,
        })
    }

    fn parse_target(&mut self) -> ParseResult<Target> {
        let first = self.parse_target_atom()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }

        let mut parts = vec![first];
        while self.check(TokenKind::Comma) {
            self.advance();
            parts.push(self.parse_target_atom()?);
        }
        Ok(Target::Unpack(parts))
    }

    fn parse_target_atom(&mut self) -> ParseResult<Target> {
        if self.check(TokenKind::LParen) {
            self.advance();
            self.enter()?;
            let inner = self.parse_target()?;
            self.leave();
            self.expect(TokenKind::RParen)?;
            return Ok(inner);
        }
        let name = self.expect(TokenKind::Name)?.text.clone();
        Ok(Target::Name(name))
    }

    // --- Helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].kind.clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else if self.check(TokenKind::Eof) {
            Err(ParseError::UnexpectedEnd(kind.to_string()))
        } else {
            let tok = self.peek();
            Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: tok.text.clone(),
                col: tok.col,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Expr {
        Expr::Name(n.to_string())
    }

    fn int(i: i64) -> Expr {
        Expr::Literal(Value::Int(i))
    }

    #[test]
    fn test_parse_precedence() {
        let expr = Parser::parse("combo_sum % 2 != 0").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(
                Box::new(Expr::Binary(BinOp::Mod, Box::new(name("combo_sum")), Box::new(int(2)))),
                vec![(CmpOp::NotEq, int(0))]
            )
        );
    }

    #[test]
    fn test_parse_chained_comparison() {
        let expr = Parser::parse("10 <= combo_sum < 20").unwrap();
        match expr {
            Expr::Compare(_, rest) => {
                assert_eq!(rest.len(), 2);
                assert_eq!(rest[0].0, CmpOp::Le);
                assert_eq!(rest[1].0, CmpOp::Lt);
            }
            other => panic!("comparaison attendue, obtenu {other:?}"),
        }
    }

    #[test]
    fn test_parse_not_in_and_is_not() {
        match Parser::parse("x not in y").unwrap() {
            Expr::Compare(_, rest) => assert_eq!(rest[0].0, CmpOp::NotIn),
            other => panic!("{other:?}"),
        }
        match Parser::parse("x is not None").unwrap() {
            Expr::Compare(_, rest) => assert_eq!(rest[0].0, CmpOp::IsNot),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_parse_not_binds_looser_than_comparison() {
        match Parser::parse("not a == b").unwrap() {
            Expr::Unary(UnaryOp::Not, inner) => assert!(matches!(*inner, Expr::Compare(..))),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_parse_generator_argument() {
        let expr = Parser::parse("sum(1 for d in combo_digits if d in seed_digits) >= 2").unwrap();
        match expr {
            Expr::Compare(left, _) => match *left {
                Expr::Call { name, args, .. } => {
                    assert_eq!(name, "sum");
                    assert!(matches!(
                        args[0],
                        Expr::Comprehension {
                            kind: CompKind::Gen,
                            ..
                        }
                    ));
                }
                other => panic!("{other:?}"),
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_parse_collections() {
        assert_eq!(Parser::parse("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(Parser::parse("(1,)").unwrap(), Expr::Tuple(vec![int(1)]));
        assert_eq!(Parser::parse("(1)").unwrap(), int(1));
        assert_eq!(Parser::parse("[1, 2,]").unwrap(), Expr::List(vec![int(1), int(2)]));
        assert_eq!(Parser::parse("{1, 2}").unwrap(), Expr::Set(vec![int(1), int(2)]));
        assert_eq!(
            Parser::parse("{1: 2}").unwrap(),
            Expr::Dict(vec![(int(1), int(2))])
        );
        assert_eq!(Parser::parse("{}").unwrap(), Expr::Dict(vec![]));
    }

    #[test]
    fn test_parse_slice() {
        match Parser::parse("seed_digits[1:]").unwrap() {
            Expr::Slice { start, stop, step, .. } => {
                assert!(start.is_some());
                assert!(stop.is_none());
                assert!(step.is_none());
            }
            other => panic!("{other:?}"),
        }
        assert!(matches!(Parser::parse("x[::-1]").unwrap(), Expr::Slice { .. }));
    }

    #[test]
    fn test_parse_method_and_kwargs() {
        assert!(matches!(
            Parser::parse("seed_counts.most_common(1)").unwrap(),
            Expr::Attr { .. }
        ));
        match Parser::parse("sorted(x, reverse=True)").unwrap() {
            Expr::Call { kwargs, .. } => assert_eq!(kwargs[0].0, "reverse"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_parse_ternary() {
        assert!(matches!(
            Parser::parse("1 if x else 2").unwrap(),
            Expr::IfElse { .. }
        ));
    }

    #[test]
    fn test_parse_unpack_target() {
        let expr = Parser::parse("[d for d, n in seed_counts.items() if n > 1]").unwrap();
        match expr {
            Expr::Comprehension { clauses, .. } => {
                assert!(matches!(clauses[0].target, Target::Unpack(ref parts) if parts.len() == 2));
                assert_eq!(clauses[0].conds.len(), 1);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Parser::parse("combo_sum >"), Err(ParseError::UnexpectedEnd(_))));
        assert!(matches!(Parser::parse("(1, 2"), Err(ParseError::UnexpectedEnd(_))));
        assert!(matches!(
            Parser::parse("1 2"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(Parser::parse("x.real"), Err(ParseError::Unsupported(_))));
        assert!(matches!(Parser::parse("lambda x: x"), Err(ParseError::Unsupported(_))));
        assert!(Parser::parse("").is_err());
    }

    fn is_too_deep(result: ParseResult<Expr>) -> bool {
        matches!(result, Err(ParseError::Unsupported(msg)) if msg == "expression trop imbriquée")
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let parens = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(is_too_deep(Parser::parse(&parens)));

        let nots = format!("{}True", "not ".repeat(50_000));
        assert!(is_too_deep(Parser::parse(&nots)));

        let negs = format!("{}1", "-".repeat(10_000));
        assert!(is_too_deep(Parser::parse(&negs)));

        let lists = format!("{}1{}", "[".repeat(500), "]".repeat(500));
        assert!(is_too_deep(Parser::parse(&lists)));
    }

    #[test]
    fn test_parse_rejects_long_operator_chain() {
        let sum = vec!["1"; 10_000].join(" + ");
        assert!(is_too_deep(Parser::parse(&sum)));

        let calls = format!("x{}", ".count(1)".repeat(1_000));
        assert!(is_too_deep(Parser::parse(&calls)));
    }

    #[test]
    fn test_parse_rejects_deep_target() {
        let target = format!("{}d{}", "(".repeat(1_000), ")".repeat(1_000));
        let src = format!("[1 for {target} in combo_digits]");
        assert!(is_too_deep(Parser::parse(&src)));

        assert!(Parser::parse("[1 for ((d)) in combo_digits]").is_ok());
    }

    #[test]
    fn test_parse_accepts_reasonable_nesting() {
        let parens = format!("{}combo_sum{} > 3", "(".repeat(20), ")".repeat(20));
        assert!(Parser::parse(&parens).is_ok());

        let ors = (0..100)
            .map(|i| format!("combo_sum == {i}"))
            .collect::<Vec<_>>()
            .join(" or ");
        assert!(Parser::parse(&ors).is_ok());

        assert!(Parser::parse(&format!("{}True", "not ".repeat(10))).is_ok());
    }
}
