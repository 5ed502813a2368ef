use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::lexer::{Position, Token};

use super::TypeInfo;

macro_rules! intrinsic {
    ($map:ident, $kind:ident, $value:expr) => {
        $map.insert($value, OperationKind::Intrinsic(IntrinsicKind::$kind));
    };
}

macro_rules! keyword {
    ($map:ident, $kind:ident, $value:expr) => {
        $map.insert($value, OperationKind::Keyword(KeywordKind::$kind));
    };
}

/// Words with a fixed meaning. These are matched before the integer and
/// identifier rules, so they can never be shadowed.
static TERMINALS: Lazy<HashMap<&'static str, OperationKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    intrinsic!(m, Print, "print");
    intrinsic!(m, Plus, "+");
    intrinsic!(m, Minus, "-");
    intrinsic!(m, GreaterThan, ">");
    intrinsic!(m, Modulo, "%");
    intrinsic!(m, Equal, "=");
    intrinsic!(m, Or, "or");

    keyword!(m, If, "if");
    keyword!(m, While, "while");
    keyword!(m, Var, "var");
    keyword!(m, Set, "set");
    keyword!(m, Do, "do");
    keyword!(m, End, "end");

    m
});

/// Built-in operators with a fixed arity and type signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicKind {
    Print,
    Plus,
    Minus,
    GreaterThan,
    Modulo,
    Equal,
    Or,
}

impl IntrinsicKind {
    /// Number of values the intrinsic pops from the value stack.
    pub fn arity_in(&self) -> usize {
        match self {
            IntrinsicKind::Print => 1,
            _ => 2,
        }
    }

    /// Number of values the intrinsic pushes onto the value stack.
    pub fn arity_out(&self) -> usize {
        match self {
            IntrinsicKind::Print => 0,
            _ => 1,
        }
    }

    /// Human readable name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            IntrinsicKind::Print => "print",
            IntrinsicKind::Plus => "plus",
            IntrinsicKind::Minus => "minus",
            IntrinsicKind::GreaterThan => "greater than",
            IntrinsicKind::Modulo => "modulo",
            IntrinsicKind::Equal => "equal",
            IntrinsicKind::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    If,
    While,
    Var,
    Set,
    Do,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Literal { type_info: TypeInfo, value: i64 },
    Identifier,
    Intrinsic(IntrinsicKind),
    Keyword(KeywordKind),
}

/// A classified word of the source, keeping its original spelling and
/// position for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub token: String,
    pub position: Position,
    pub kind: OperationKind,
}

impl From<Token> for Operation {
    fn from(token: Token) -> Self {
        let Token { lexeme, position } = token;

        let kind = if let Some(terminal) = TERMINALS.get(lexeme.as_str()) {
            *terminal
        } else if let Some(value) = try_parse_integer(&lexeme) {
            OperationKind::Literal {
                type_info: TypeInfo::Int,
                value,
            }
        } else {
            OperationKind::Identifier
        };

        Self {
            token: lexeme,
            position,
            kind,
        }
    }
}

/// Parse a word as an optionally signed decimal integer. `_` bytes
/// inside the digit run are ignored. Words whose value does not fit a
/// signed 32 bit integer do not count as integers and fall through to
/// identifier classification.
fn try_parse_integer(word: &str) -> Option<i64> {
    let (sign, digits) = match word.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, word),
    };

    let limit = i64::from(i32::MAX) + i64::from(sign < 0);

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for byte in digits.bytes() {
        if byte == b'_' {
            continue;
        }
        if !byte.is_ascii_digit() {
            return None;
        }
        seen_digit = true;
        value = value * 10 + i64::from(byte - b'0');
        if value > limit {
            return None;
        }
    }

    if !seen_digit {
        return None;
    }

    Some(sign * value)
}
