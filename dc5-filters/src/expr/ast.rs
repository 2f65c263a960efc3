use crate::context::Fact;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    Invert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    /// Générateur passé en argument : matérialisé en liste.
    Gen,
}

/// Fonctions intégrées disponibles dans les prédicats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Sum,
    Any,
    All,
    Set,
    List,
    Tuple,
    Sorted,
    Min,
    Max,
    Abs,
    Int,
    Str,
    Range,
    Counter,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "len" => Builtin::Len,
            "sum" => Builtin::Sum,
            "any" => Builtin::Any,
            "all" => Builtin::All,
            "set" => Builtin::Set,
            "list" => Builtin::List,
            "tuple" => Builtin::Tuple,
            "sorted" => Builtin::Sorted,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "abs" => Builtin::Abs,
            "int" => Builtin::Int,
            "str" => Builtin::Str,
            "range" => Builtin::Range,
            "Counter" => Builtin::Counter,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Set => "set",
            Builtin::List => "list",
            Builtin::Tuple => "tuple",
            Builtin::Sorted => "sorted",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Int => "int",
            Builtin::Str => "str",
            Builtin::Range => "range",
            Builtin::Counter => "Counter",
        }
    }

    /// Nombre d'arguments positionnels accepté : (minimum, maximum).
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Builtin::Len | Builtin::Any | Builtin::All | Builtin::Sorted | Builtin::Abs => {
                (1, Some(1))
            }
            Builtin::Sum => (1, Some(2)),
            Builtin::Set | Builtin::List | Builtin::Tuple | Builtin::Counter => (0, Some(1)),
            Builtin::Int | Builtin::Str => (0, Some(1)),
            Builtin::Min | Builtin::Max => (1, None),
            Builtin::Range => (1, Some(3)),
        }
    }

    /// Seul `sorted` accepte un argument nommé (`reverse=`).
    pub fn accepts_keyword(&self, keyword: &str) -> bool {
        matches!((self, keyword), (Builtin::Sorted, "reverse"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Count,
    Index,
    Issubset,
    Issuperset,
    Intersection,
    Union,
    Difference,
    SymmetricDifference,
    Isdisjoint,
    MostCommon,
    Values,
    Keys,
    Items,
    Get,
}

impl Method {
    pub fn lookup(name: &str) -> Option<Method> {
        let method = match name {
            "count" => Method::Count,
            "index" => Method::Index,
            "issubset" => Method::Issubset,
            "issuperset" => Method::Issuperset,
            "intersection" => Method::Intersection,
            "union" => Method::Union,
            "difference" => Method::Difference,
            "symmetric_difference" => Method::SymmetricDifference,
            "isdisjoint" => Method::Isdisjoint,
            "most_common" => Method::MostCommon,
            "values" => Method::Values,
            "keys" => Method::Keys,
            "items" => Method::Items,
            "get" => Method::Get,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Count => "count",
            Method::Index => "index",
            Method::Issubset => "issubset",
            Method::Issuperset => "issuperset",
            Method::Intersection => "intersection",
            Method::Union => "union",
            Method::Difference => "difference",
            Method::SymmetricDifference => "symmetric_difference",
            Method::Isdisjoint => "isdisjoint",
            Method::MostCommon => "most_common",
            Method::Values => "values",
            Method::Keys => "keys",
            Method::Items => "items",
            Method::Get => "get",
        }
    }

    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Method::Count
            | Method::Index
            | Method::Issubset
            | Method::Issuperset
            | Method::SymmetricDifference
            | Method::Isdisjoint => (1, Some(1)),
            Method::Intersection | Method::Union | Method::Difference => (0, None),
            Method::MostCommon => (0, Some(1)),
            Method::Values | Method::Keys | Method::Items => (0, Some(0)),
            Method::Get => (1, Some(2)),
        }
    }
}

/// Une clause `for <cible> in <iter> [if <cond>]*` d'une compréhension.
#[derive(Clone, Debug, PartialEq)]
pub struct CompClause {
    pub target: Target,
    pub iter: Expr,
    pub conds: Vec<Expr>,
}

/// Cible d'une boucle : un nom (`d`) ou un déballage (`d, n`).
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Name(String),
    Slot(usize),
    Unpack(Vec<Target>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),

    /// Nom tel qu'écrit ; remplacé par `Fact` ou `Local` à la résolution.
    Name(String),
    Fact(Fact),
    Local(usize),

    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),

    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Comparaison chaînée : `a < b <= c`.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    IfElse {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    Index(Box<Expr>, Box<Expr>),
    Slice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },

    /// Appel d'un nom ; remplacé par `Builtin` à la résolution.
    Call {
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Builtin {
        func: Builtin,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },

    /// `recv.name(args)` ; remplacé par `Method` à la résolution.
    Attr {
        recv: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Method {
        recv: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },

    Comprehension {
        kind: CompKind,
        element: Box<Expr>,
        clauses: Vec<CompClause>,
    },
}
