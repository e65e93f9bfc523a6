//! Arithmetic and condition evaluation over conversation variables.
//!
//! Expressions are flat token lists evaluated strictly left to right with no
//! operator precedence: `10 - 2 - 3` is `5`, and `1 + 2 * 3` is `9`.
//! Tokens starting with `$` are read from the conversation's variables; an
//! unset variable reads as the empty string, which arithmetic treats as `0`.

use murmur_script::{CompareOp, Guard};

use crate::store::StoreError;

pub const VAR_SIGIL: char = '$';

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("invalid calculate expression: {0}")]
    NotAnInteger(String),
    #[error("division by zero: {0}")]
    DivideByZero(String),
    #[error("integer overflow: {0}")]
    Overflow(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Sub => lhs.checked_sub(rhs),
            Self::Mul => lhs.checked_mul(rhs),
            Self::Div => lhs.checked_div(rhs),
        }
    }
}

/// Read a value as an integer operand. Empty (unset) counts as zero.
fn as_integer(value: &str) -> Option<i64> {
    if value.is_empty() { Some(0) } else { value.parse().ok() }
}

/// Evaluate `tokens` left to right, resolving `$name` operands through `lookup`.
///
/// Without any operator the result is the last operand verbatim, so plain
/// strings can be assigned and compared.
///
/// # Errors
/// Fails when an operand of an arithmetic operator is not an integer, on
/// overflow or division by zero, or when `lookup` fails.
pub fn calculate<F>(tokens: &[String], mut lookup: F) -> Result<String, EvalError>
where
    F: FnMut(&str) -> Result<String, StoreError>,
{
    let expr = || tokens.join(" ");

    let mut value = String::new();
    let mut pending: Option<Op> = None;
    for token in tokens {
        if let Some(op) = Op::from_token(token) {
            pending = Some(op);
            continue;
        }

        let operand = match token.strip_prefix(VAR_SIGIL) {
            Some(name) => lookup(name)?,
            None => token.clone(),
        };

        value = match pending.take() {
            Some(op) => {
                let lhs = as_integer(&value).ok_or_else(|| EvalError::NotAnInteger(expr()))?;
                let rhs = as_integer(&operand).ok_or_else(|| EvalError::NotAnInteger(expr()))?;
                if op == Op::Div && rhs == 0 {
                    return Err(EvalError::DivideByZero(expr()));
                }
                op.apply(lhs, rhs).ok_or_else(|| EvalError::Overflow(expr()))?.to_string()
            },
            None => operand,
        };
    }
    Ok(value)
}

/// Evaluate an if-chain guard.
///
/// `is` and `eq` compare the evaluated sides as strings; `gte` compares them
/// as integers.
///
/// # Errors
/// Fails when either side cannot be evaluated, or when a `gte` side is not
/// an integer.
pub fn check_guard<F>(guard: &Guard, mut lookup: F) -> Result<bool, EvalError>
where
    F: FnMut(&str) -> Result<String, StoreError>,
{
    let left = calculate(std::slice::from_ref(&guard.left), &mut lookup)?;
    let right = calculate(&guard.right, &mut lookup)?;

    match guard.op {
        CompareOp::Is | CompareOp::Eq => Ok(left == right),
        CompareOp::Gte => {
            let lhs = as_integer(&left).ok_or_else(|| EvalError::NotAnInteger(guard.left.clone()))?;
            let rhs = as_integer(&right).ok_or_else(|| EvalError::NotAnInteger(guard.right.join(" ")))?;
            Ok(lhs >= rhs)
        },
    }
}
