//! Arithmetic evaluator behind `evaluate_expression`.
//!
//! Recursive descent over `+ - * / %`, parentheses, unary sign, and decimal
//! or exponent literals. Floating point throughout, so division by zero
//! follows IEEE semantics rather than erroring.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("unexpected character '{ch}' at position {at}")]
    UnexpectedChar { ch: char, at: usize },
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unmatched closing parenthesis at position {at}")]
    UnmatchedParen { at: usize },
    #[error("invalid number literal at position {at}")]
    BadNumber { at: usize },
    #[error("empty expression")]
    Empty,
}

pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut p = Parser {
        src: expression.as_bytes(),
        pos: 0,
    };
    p.skip_ws();
    if p.at_end() {
        return Err(CalcError::Empty);
    }
    let value = p.expr()?;
    p.skip_ws();
    match p.peek() {
        None => Ok(value),
        Some(b')') => Err(CalcError::UnmatchedParen { at: p.pos }),
        Some(ch) => Err(CalcError::UnexpectedChar {
            ch: ch as char,
            at: p.pos,
        }),
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.factor()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    acc /= self.factor()?;
                }
                Some(b'%') => {
                    self.pos += 1;
                    acc %= self.factor()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, CalcError> {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'+') => {
                self.pos += 1;
                self.factor()
            }
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expr()?;
                self.skip_ws();
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(ch) => Err(CalcError::UnexpectedChar {
                        ch: ch as char,
                        at: self.pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(ch) if ch.is_ascii_digit() || ch == b'.' => self.number(),
            Some(ch) => Err(CalcError::UnexpectedChar {
                ch: ch as char,
                at: self.pos,
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || ch == b'.') {
            self.pos += 1;
        }
        // Optional exponent, e.g. 1.5e-3.
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| CalcError::BadNumber { at: start })?;
        text.parse::<f64>()
            .map_err(|_| CalcError::BadNumber { at: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("10 + 20").unwrap(), 30.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 2 - 3").unwrap(), 5.0);
        assert_eq!(evaluate("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn unary_and_decimals() {
        assert_eq!(evaluate("-4 + 2").unwrap(), -2.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate("1e3 + 0.5").unwrap(), 1000.5);
    }

    #[test]
    fn cost_summing_shape() {
        // The agent mostly sums day costs.
        assert_eq!(evaluate("120.0 + 85.5 + 40").unwrap(), 245.5);
    }

    #[test]
    fn division_follows_float_semantics() {
        assert!(evaluate("1 / 0").unwrap().is_infinite());
    }

    #[test]
    fn malformed_expressions_error() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("   "), Err(CalcError::Empty));
        assert!(matches!(evaluate("2 +"), Err(CalcError::UnexpectedEnd)));
        assert!(matches!(
            evaluate("(1 + 2"),
            Err(CalcError::UnexpectedEnd)
        ));
        assert!(matches!(
            evaluate("1 + 2)"),
            Err(CalcError::UnmatchedParen { .. })
        ));
        assert!(matches!(
            evaluate("two + 2"),
            Err(CalcError::UnexpectedChar { ch: 't', .. })
        ));
        assert!(matches!(
            evaluate("1..2"),
            Err(CalcError::BadNumber { .. })
        ));
    }
}
