#![forbid(unsafe_code)]

use std::fmt;

/// The closed operator vocabulary of the policy DSL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Abs,
    In,
    Cross,
    IsColor,
    IsDirection,
    StCross,
    StAbove,
    StBelow,
}

/// How many arguments an operator accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    /// `-` is both binary subtraction and unary negation.
    OneOrTwo,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::OneOrTwo => n == 1 || n == 2,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(k) => write!(f, "exactly {k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
            Arity::OneOrTwo => write!(f, "1 or 2"),
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Abs,
        Operator::In,
        Operator::Cross,
        Operator::IsColor,
        Operator::IsDirection,
        Operator::StCross,
        Operator::StAbove,
        Operator::StBelow,
    ];

    pub fn from_token(tok: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == tok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Abs => "abs",
            Operator::In => "in",
            Operator::Cross => "cross",
            Operator::IsColor => "is_color",
            Operator::IsDirection => "is_direction",
            Operator::StCross => "st_cross",
            Operator::StAbove => "st_above",
            Operator::StBelow => "st_below",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::And | Operator::Or => Arity::AtLeast(1),
            Operator::Not | Operator::Abs => Arity::Exactly(1),
            Operator::Sub => Arity::OneOrTwo,
            _ => Arity::Exactly(2),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal tokens: `^[0-9]+$`, `^[0-9]+\.[0-9]+$` and `^(True|False)$`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    /// Digits kept verbatim; integers of any width are literals.
    Int(String),
    /// Decimal text kept verbatim so it can be converted exactly later.
    Decimal(String),
    Bool(bool),
}

impl Literal {
    /// Classifies a token, or `None` when it does not have literal shape.
    pub fn classify(tok: &str) -> Option<Literal> {
        match tok {
            "True" => return Some(Literal::Bool(true)),
            "False" => return Some(Literal::Bool(false)),
            _ => {}
        }

        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        if all_digits(tok) {
            return Some(Literal::Int(tok.to_string()));
        }

        let (whole, frac) = tok.split_once('.')?;
        if all_digits(whole) && all_digits(frac) {
            Some(Literal::Decimal(tok.to_string()))
        } else {
            None
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(text) | Literal::Decimal(text) => f.write_str(text),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Yellow,
    Green,
    Unknown,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Straight,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Left, Direction::Straight, Direction::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Straight => "straight",
            Direction::Right => "right",
        }
    }
}

/// Fixed symbolic literals with a domain meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Macro {
    Color(Color),
    Direction(Direction),
}

impl Macro {
    pub fn from_token(tok: &str) -> Option<Self> {
        Color::ALL
            .iter()
            .find(|c| c.as_str() == tok)
            .map(|c| Macro::Color(*c))
            .or_else(|| {
                Direction::ALL
                    .iter()
                    .find(|d| d.as_str() == tok)
                    .map(|d| Macro::Direction(*d))
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Macro::Color(c) => c.as_str(),
            Macro::Direction(d) => d.as_str(),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
