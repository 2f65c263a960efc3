/// Erreur de compilation : le filtre est marqué « cassé ».
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Erreur lexicale colonne {col} : {message}")]
    Lex { col: usize, message: String },

    #[error("Jeton inattendu colonne {col} : attendu {expected}, trouvé '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        col: usize,
    },

    #[error("Fin d'expression inattendue : attendu {0}")]
    UnexpectedEnd(String),

    #[error("Nom inconnu : '{0}'")]
    UnknownName(String),

    #[error("Fonction inconnue : '{0}'")]
    UnknownFunction(String),

    #[error("Méthode inconnue : '.{0}()'")]
    UnknownMethod(String),

    #[error("'{name}' attend {expected} argument(s), {found} fourni(s)")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Construction non supportée : {0}")]
    Unsupported(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Erreur d'évaluation : le verdict devient `Error`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("TypeError : {0}")]
    Type(String),

    #[error("ZeroDivisionError : division par zéro")]
    ZeroDivision,

    #[error("IndexError : {0}")]
    Index(String),

    #[error("KeyError : {0}")]
    Key(String),

    #[error("ValueError : {0}")]
    Value(String),

    #[error("OverflowError : {0}")]
    Overflow(String),

    #[error("NameError : nom non résolu '{0}'")]
    Unresolved(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub(crate) fn unsupported_operand(op: &str, left: &str, right: &str) -> Self {
        EvalError::Type(format!(
            "opérande non supporté pour {op} : '{left}' et '{right}'"
        ))
    }

    pub(crate) fn no_method(type_name: &str, method: &str) -> Self {
        EvalError::Type(format!("'{type_name}' n'a pas de méthode '{method}'"))
    }
}
