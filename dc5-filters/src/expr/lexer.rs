use crate::error::{ParseError, ParseResult};

/// Jeton d'une expression de filtre.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Colonne (1-based)
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            col,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Mots-clés
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    For,
    True,
    False,
    None,
    Lambda,

    Name,
    Int,
    Float,
    Str,

    // Opérateurs
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Amp,
    Pipe,
    Caret,
    Tilde,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,

    // Ponctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "'and'"),
            Self::Or => write!(f, "'or'"),
            Self::Not => write!(f, "'not'"),
            Self::In => write!(f, "'in'"),
            Self::Is => write!(f, "'is'"),
            Self::If => write!(f, "'if'"),
            Self::Else => write!(f, "'else'"),
            Self::For => write!(f, "'for'"),
            Self::True => write!(f, "'True'"),
            Self::False => write!(f, "'False'"),
            Self::None => write!(f, "'None'"),
            Self::Lambda => write!(f, "'lambda'"),
            Self::Name => write!(f, "nom"),
            Self::Int => write!(f, "entier"),
            Self::Float => write!(f, "nombre"),
            Self::Str => write!(f, "chaîne"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Star => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::DoubleSlash => write!(f, "'//'"),
            Self::Percent => write!(f, "'%'"),
            Self::DoubleStar => write!(f, "'**'"),
            Self::Amp => write!(f, "'&'"),
            Self::Pipe => write!(f, "'|'"),
            Self::Caret => write!(f, "'^'"),
            Self::Tilde => write!(f, "'~'"),
            Self::EqEq => write!(f, "'=='"),
            Self::NotEq => write!(f, "'!='"),
            Self::Lt => write!(f, "'<'"),
            Self::Le => write!(f, "'<='"),
            Self::Gt => write!(f, "'>'"),
            Self::Ge => write!(f, "'>='"),
            Self::Assign => write!(f, "'='"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::Comma => write!(f, "','"),
            Self::Colon => write!(f, "':'"),
            Self::Dot => write!(f, "'.'"),
            Self::Eof => write!(f, "fin d'expression"),
        }
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "in" => TokenKind::In,
        "is" => TokenKind::Is,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::None,
        "lambda" => TokenKind::Lambda,
        _ => return None,
    };
    Some(kind)
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                tokens.push(Token::new(TokenKind::Eof, "", self.pos + 1));
                break;
            }
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_at(0) {
            if ch.is_whitespace() || ch == '\\' {
                self.pos += 1;
            } else if ch == '#' {
                // commentaire jusqu'à la fin de ligne
                while let Some(c) = self.peek_at(0) {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        let col = self.pos + 1;
        let ch = self.input[self.pos];

        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.read_number(col);
        }
        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.read_word(col));
        }
        if ch == '\'' || ch == '"' {
            return self.read_string(ch, col);
        }

        let two: String = self.input[self.pos..(self.pos + 2).min(self.input.len())]
            .iter()
            .collect();
        let double = match two.as_str() {
            "//" => Some(TokenKind::DoubleSlash),
            "**" => Some(TokenKind::DoubleStar),
            "==" => Some(TokenKind::EqEq),
            "!=" => Some(TokenKind::NotEq),
            "<=" => Some(TokenKind::Le),
            ">=" => Some(TokenKind::Ge),
            "<>" => Some(TokenKind::NotEq),
            _ => None,
        };
        if let Some(kind) = double {
            self.pos += 2;
            return Ok(Token::new(kind, two, col));
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '=' => TokenKind::Assign,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            other => {
                return Err(ParseError::Lex {
                    col,
                    message: format!("caractère inattendu '{other}'"),
                })
            }
        };
        self.pos += 1;
        Ok(Token::new(kind, ch.to_string(), col))
    }

    fn read_number(&mut self, col: usize) -> ParseResult<Token> {
        let start = self.pos;
        let mut is_float = false;

        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_digit() || c == '_' {
                self.pos += 1;
            } else if c == '.' && !is_float {
                is_float = true;
                self.pos += 1;
            } else if (c == 'e' || c == 'E')
                && self
                    .peek_at(1)
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+')
            {
                is_float = true;
                self.pos += 2;
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.pos].iter().filter(|&&c| c != '_').collect();
        if self.peek_at(0).is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(ParseError::Lex {
                col,
                message: format!("nombre mal formé '{text}'"),
            });
        }
        let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
        Ok(Token::new(kind, text, col))
    }

    fn read_word(&mut self, col: usize) -> Token {
        let start = self.pos;
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let text: String = self.input[start..self.pos].iter().collect();
        let kind = keyword(&text).unwrap_or(TokenKind::Name);
        Token::new(kind, text, col)
    }

    fn read_string(&mut self, quote: char, col: usize) -> ParseResult<Token> {
        self.pos += 1;
        let mut text = String::new();

        loop {
            match self.peek_at(0) {
                None => {
                    return Err(ParseError::Lex {
                        col,
                        message: "chaîne non terminée".to_string(),
                    })
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let escaped = self.peek_at(1).unwrap_or('\\');
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.pos += 2;
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        Ok(Token::new(TokenKind::Str, text, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            kinds("combo_sum % 2 != 0"),
            vec![
                TokenKind::Name,
                TokenKind::Percent,
                TokenKind::Int,
                TokenKind::NotEq,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_and_strings() {
        assert_eq!(
            kinds("not x in 'Low' and True"),
            vec![
                TokenKind::Not,
                TokenKind::Name,
                TokenKind::In,
                TokenKind::Str,
                TokenKind::And,
                TokenKind::True,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_tokenize_floor_division_and_float() {
        let tokens = Lexer::new("a // 2.5").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::DoubleSlash);
        assert_eq!(tokens[2].kind, TokenKind::Float);
        assert_eq!(tokens[2].text, "2.5");
    }

    #[test]
    fn test_string_escape() {
        let tokens = Lexer::new(r#""it\"s""#).tokenize().unwrap();
        assert_eq!(tokens[0].text, "it\"s");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            Lexer::new("'abc").tokenize(),
            Err(ParseError::Lex { col: 1, .. })
        ));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("a $ b").tokenize().unwrap_err();
        assert_eq!(
            err,
            ParseError::Lex {
                col: 3,
                message: "caractère inattendu '$'".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_number() {
        assert!(Lexer::new("12abc").tokenize().is_err());
    }
}
