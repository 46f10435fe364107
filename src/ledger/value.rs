//! Monetary values and the small arithmetic language accepted for item values
//! in the ledger file (`"1,35-0,35+0.5"`, `"2 * (1 + 1)"`).

use rust_decimal::Decimal;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{ReportError, Result};

/// Number of fractional digits every stored value carries.
pub const VALUE_SCALE: u32 = 2;

/// Round to [`VALUE_SCALE`] places (banker's rounding) and pin the scale so
/// `1.5` displays as `1.50`.
pub fn quantize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(VALUE_SCALE);
    rounded.rescale(VALUE_SCALE);
    rounded
}

/// Largest magnitude an item value may have. Sums over any realistic number
/// of items stay far below `Decimal::MAX`.
pub const MAX_ABS_VALUE: i64 = 1_000_000_000_000_000;

/// Reject values beyond [`MAX_ABS_VALUE`], quantize the rest. `source` is
/// the text the value was read from.
pub fn check_value(value: Decimal, source: &str) -> Result<Decimal> {
    if value.abs() > Decimal::from(MAX_ABS_VALUE) {
        return Err(ReportError::InvalidValue {
            expr: source.to_string(),
            reason: format!("magnitude exceeds {MAX_ABS_VALUE}"),
        });
    }
    Ok(quantize(value))
}

/// Evaluate an arithmetic expression and quantize the result.
///
/// Both `.` and `,` are accepted as decimal separator. Blank input is zero.
pub fn parse_value(text: &str) -> Result<Decimal> {
    check_value(eval_decimal(text)?, text)
}

/// Evaluate an arithmetic expression over decimals without rounding.
pub fn eval_decimal(text: &str) -> Result<Decimal> {
    if text.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }

    let mut parser = ExprParser {
        source: text,
        chars: text.chars().peekable(),
    };
    let value = parser.expr()?;
    parser.skip_ws();
    match parser.chars.peek().copied() {
        None => Ok(value),
        Some(c) => Err(parser.error(format!("unexpected '{c}'"))),
    }
}

struct ExprParser<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl ExprParser<'_> {
    fn error(&self, reason: impl Into<String>) -> ReportError {
        ReportError::InvalidValue {
            expr: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn next_op(&mut self, ops: &[char]) -> Option<char> {
        self.skip_ws();
        let c = *self.chars.peek()?;
        if ops.contains(&c) {
            self.chars.next();
            Some(c)
        } else {
            None
        }
    }

    fn expr(&mut self) -> Result<Decimal> {
        let mut acc = self.term()?;
        while let Some(op) = self.next_op(&['+', '-']) {
            let rhs = self.term()?;
            acc = match op {
                '+' => acc.checked_add(rhs),
                _ => acc.checked_sub(rhs),
            }
            .ok_or_else(|| self.error("overflow"))?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Decimal> {
        let mut acc = self.factor()?;
        while let Some(op) = self.next_op(&['*', '/']) {
            let rhs = self.factor()?;
            acc = match op {
                '*' => acc.checked_mul(rhs).ok_or_else(|| self.error("overflow"))?,
                _ => {
                    if rhs.is_zero() {
                        return Err(self.error("division by zero"));
                    }
                    acc.checked_div(rhs).ok_or_else(|| self.error("overflow"))?
                }
            };
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<Decimal> {
        self.skip_ws();
        match self.chars.peek().copied() {
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            Some('(') => {
                self.chars.next();
                let inner = self.expr()?;
                if self.next_op(&[')']).is_none() {
                    return Err(self.error("missing ')'"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> Result<Decimal> {
        let mut literal = String::new();
        let mut seen_separator = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
            } else if (c == '.' || c == ',') && !seen_separator {
                seen_separator = true;
                literal.push('.');
            } else {
                break;
            }
            self.chars.next();
        }
        if literal.ends_with('.') {
            literal.pop();
        }
        literal
            .parse::<Decimal>()
            .map_err(|e| self.error(e.to_string()))
    }
}
