//! The recursive-descent parser/evaluator.
//!
//! One [`Parser`] is created per call to [`crate::evaluate`] and owns the
//! cursor and the result stack for that call. Each `parse_*` method
//! corresponds to one precedence level from lowest (`parse_cond`) to
//! highest (`parse_primary`); a level first parses its left-hand side by
//! delegating to the next-higher level, then, while the upcoming token
//! binds at its own precedence, consumes the operator and folds in a
//! right-hand side — left-associative everywhere except `^`, which
//! recurses into itself so that `a^b^c` groups as `a^(b^c)`.
//!
//! Every `parse_*` method leaves exactly one net new [`Value`] on
//! `self.stack`; binary levels pop both operands, combine them, and push
//! the result, mirroring the "result stack" described as part of the
//! evaluator's data model. `skip_*` is a parallel ladder used only by the
//! ternary's non-taken branch: it walks the identical grammar to know where
//! the branch ends, but never touches the stack, the registry, or the
//! variable resolver.

use crate::error::EvalError;
use crate::lexer::Cursor;
use crate::registry::Registry;
use crate::scalar::Scalar;
use crate::units::parse_unit;
use crate::value::Value;
use crate::{Resolver, UnitParser};

pub struct Parser<'p> {
    registry: &'p Registry,
    variables: Option<&'p dyn Resolver>,
    user_units: Option<&'p dyn UnitParser>,
    stack: Vec<Value>,
}

impl<'p> Parser<'p> {
    pub fn new(
        registry: &'p Registry,
        variables: Option<&'p dyn Resolver>,
        user_units: Option<&'p dyn UnitParser>,
    ) -> Self {
        Self {
            registry,
            variables,
            user_units,
            stack: Vec::new(),
        }
    }

    /// Parses and evaluates the whole expression, requiring that it consume
    /// the entire input and leave exactly one value on the stack.
    pub fn run(mut self, cursor: &mut Cursor) -> Result<Value, EvalError> {
        cursor.skip_whitespace();
        if cursor.is_at_end() {
            return Err(EvalError::EmptyExpression);
        }
        self.parse_expr(cursor)?;
        cursor.skip_whitespace();
        if !cursor.is_at_end() {
            return Err(EvalError::TrailingGarbage(cursor.pos()));
        }
        if self.stack.len() != 1 {
            return Err(EvalError::InternalState(self.stack.len()));
        }
        Ok(self.stack.pop().unwrap())
    }

    fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    fn pop(&mut self) -> Result<Value, EvalError> {
        self.stack
            .pop()
            .ok_or_else(|| EvalError::InternalState(self.stack.len()))
    }

    fn pop_scalar(&mut self, position: usize) -> Result<Scalar, EvalError> {
        match self.pop()? {
            Value::Scalar(s) => Ok(s),
            Value::Boolean(_) => Err(EvalError::TypeError {
                message: "expected a scalar, got a boolean".to_string(),
                position,
            }),
        }
    }

    fn pop_boolean(&mut self, position: usize) -> Result<bool, EvalError> {
        match self.pop()? {
            Value::Boolean(b) => Ok(b),
            Value::Scalar(_) => Err(EvalError::TypeError {
                message: "expected a boolean, got a scalar".to_string(),
                position,
            }),
        }
    }

    /// `expr = cond`
    fn parse_expr(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_cond(cursor)
    }

    /// `cond = or ( '?' expr ':' cond )?`
    fn parse_cond(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        cursor.skip_whitespace();
        let question_context = cursor.pos();
        self.parse_or(cursor)?;
        cursor.skip_whitespace();
        if !cursor.eat('?') {
            return Ok(());
        }
        let condition = self.pop_boolean(question_context)?;
        if condition {
            self.parse_expr(cursor)?;
            cursor.skip_whitespace();
            if !cursor.eat(':') {
                return Err(EvalError::MissingColon(cursor.pos()));
            }
            skip_cond(cursor)?;
        } else {
            skip_until_colon(cursor)?;
            self.parse_cond(cursor)?;
        }
        Ok(())
    }

    /// `or = and ( '||' and )*`
    fn parse_or(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_and(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            if !try_consume_doubled(cursor, '|')? {
                return Ok(());
            }
            self.parse_and(cursor)?;
            let rhs = self.pop_boolean(position)?;
            let lhs = self.pop_boolean(position)?;
            self.push(Value::Boolean(lhs || rhs));
        }
    }

    /// `and = eq ( '&&' eq )*`
    fn parse_and(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_eq(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            if !try_consume_doubled(cursor, '&')? {
                return Ok(());
            }
            self.parse_eq(cursor)?;
            let rhs = self.pop_boolean(position)?;
            let lhs = self.pop_boolean(position)?;
            self.push(Value::Boolean(lhs && rhs));
        }
    }

    /// `eq = rel ( ('==' | '!=') rel )*`
    fn parse_eq(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_rel(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            let op = match try_consume_eq_op(cursor)? {
                Some(op) => op,
                None => return Ok(()),
            };
            self.parse_rel(cursor)?;
            let rhs = self.pop()?;
            let lhs = self.pop()?;
            let eq = lhs.value_eq(rhs, position)?;
            self.push(Value::Boolean(if op == EqOp::Eq { eq } else { !eq }));
        }
    }

    /// `rel = add ( ('<=' | '<' | '>=' | '>') add )*`
    fn parse_rel(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_add(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            let op = match try_consume_rel_op(cursor) {
                Some(op) => op,
                None => return Ok(()),
            };
            self.parse_add(cursor)?;
            let rhs = self.pop_scalar(position)?;
            let lhs = self.pop_scalar(position)?;
            let ordering = lhs.compare(rhs, position)?;
            use std::cmp::Ordering::{Equal, Greater, Less};
            let result = match (op, ordering) {
                (RelOp::Lt, Less) | (RelOp::Le, Less | Equal) => true,
                (RelOp::Gt, Greater) | (RelOp::Ge, Greater | Equal) => true,
                _ => false,
            };
            self.push(Value::Boolean(result));
        }
    }

    /// `add = mul ( ('+' | '-') mul )*`
    fn parse_add(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_mul(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            let op = match cursor.peek() {
                Some('+') => {
                    cursor.advance();
                    AddOp::Plus
                }
                Some('-') => {
                    cursor.advance();
                    AddOp::Minus
                }
                _ => return Ok(()),
            };
            self.parse_mul(cursor)?;
            let rhs = self.pop_scalar(position)?;
            let lhs = self.pop_scalar(position)?;
            let result = match op {
                AddOp::Plus => lhs.add(rhs, position)?,
                AddOp::Minus => lhs.sub(rhs, position)?,
            };
            self.push(Value::Scalar(result));
        }
    }

    /// `mul = pow ( ('*' | '/') pow )*`
    fn parse_mul(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_pow(cursor)?;
        loop {
            cursor.skip_whitespace();
            let position = cursor.pos();
            let op = match cursor.peek() {
                Some('*') => {
                    cursor.advance();
                    MulOp::Mul
                }
                Some('/') => {
                    cursor.advance();
                    MulOp::Div
                }
                _ => return Ok(()),
            };
            self.parse_pow(cursor)?;
            let rhs = self.pop_scalar(position)?;
            let lhs = self.pop_scalar(position)?;
            let result = match op {
                MulOp::Mul => lhs.mul(rhs, position)?,
                MulOp::Div => lhs.div(rhs, position)?,
            };
            self.push(Value::Scalar(result));
        }
    }

    /// `pow = unary ( '^' pow )?` — right-associative: the right side
    /// recurses into `parse_pow` itself rather than the next level up.
    fn parse_pow(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        self.parse_unary(cursor)?;
        cursor.skip_whitespace();
        let position = cursor.pos();
        if !cursor.eat('^') {
            return Ok(());
        }
        self.parse_pow(cursor)?;
        let rhs = self.pop_scalar(position)?;
        let lhs = self.pop_scalar(position)?;
        self.push(Value::Scalar(lhs.pow(rhs, position)?));
        Ok(())
    }

    /// `unary = ('-' | '!')* primary`
    fn parse_unary(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        cursor.skip_whitespace();
        let position = cursor.pos();
        match cursor.peek() {
            Some('-') => {
                cursor.advance();
                self.parse_unary(cursor)?;
                let v = self.pop_scalar(position)?;
                self.push(Value::Scalar(v.neg()));
                Ok(())
            }
            // A lone '!' is unary negation; '!=' belongs to `eq`, not here.
            Some('!') if cursor.peek2() != Some('=') => {
                cursor.advance();
                self.parse_unary(cursor)?;
                let v = self.pop_boolean(position)?;
                self.push(Value::Boolean(!v));
                Ok(())
            }
            _ => self.parse_primary(cursor),
        }
    }

    /// `primary = number [ '[' unit ']' ] | ident ( '(' arglist? ')' )? | '(' expr ')'`
    fn parse_primary(&mut self, cursor: &mut Cursor) -> Result<(), EvalError> {
        cursor.skip_whitespace();
        let position = cursor.pos();
        match cursor.peek() {
            Some('(') => {
                cursor.advance();
                self.parse_expr(cursor)?;
                cursor.skip_whitespace();
                if !cursor.eat(')') {
                    return Err(EvalError::MissingCloseParen(cursor.pos()));
                }
                Ok(())
            }
            Some(c) if c.is_ascii_digit() || c == '+' || c == '.' => {
                self.parse_number_literal(cursor, position)
            }
            Some(c) if c.is_ascii_alphabetic() => self.parse_identifier(cursor, position),
            _ => Err(EvalError::MissingOperand(position)),
        }
    }

    fn parse_number_literal(
        &mut self,
        cursor: &mut Cursor,
        position: usize,
    ) -> Result<(), EvalError> {
        let raw = cursor.scan_number(true)?;
        cursor.skip_whitespace();
        if cursor.peek() == Some('[') {
            cursor.advance();
            let body = cursor.scan_unit_body()?;
            let scalar = match parse_unit(body, position)? {
                Some(unit) => {
                    let si = raw * unit.scale + unit.offset;
                    let kind = if unit.is_affine() {
                        crate::scalar::Kind::Absolute
                    } else {
                        crate::scalar::Kind::Relative
                    };
                    Scalar::new(si, unit.quantity, kind)
                }
                None => match self.user_units.and_then(|p| p.parse(raw, body)) {
                    Some(scalar) => scalar,
                    None => {
                        return Err(EvalError::UnknownUnit {
                            unit: body.to_string(),
                            position,
                        })
                    }
                },
            };
            self.push(Value::Scalar(scalar));
        } else {
            self.push(Value::Scalar(Scalar::dimensionless(raw)));
        }
        Ok(())
    }

    fn parse_identifier(&mut self, cursor: &mut Cursor, position: usize) -> Result<(), EvalError> {
        let name = cursor
            .scan_identifier()
            .ok_or(EvalError::MissingOperand(position))?;
        let name = name.to_string();
        cursor.skip_whitespace();
        if cursor.eat('(') {
            let args = self.parse_arglist(cursor)?;
            cursor.skip_whitespace();
            if !cursor.eat(')') {
                return Err(EvalError::MissingCloseParen(cursor.pos()));
            }
            let result = self.registry.call(&name, &args, position)?;
            self.push(result);
            Ok(())
        } else {
            match self.variables.and_then(|r| r.lookup(&name)) {
                Some(value) => {
                    self.push(value);
                    Ok(())
                }
                None => Err(EvalError::UnresolvedName { name, position }),
            }
        }
    }

    fn parse_arglist(&mut self, cursor: &mut Cursor) -> Result<Vec<Value>, EvalError> {
        let mut args = Vec::new();
        cursor.skip_whitespace();
        if cursor.peek() == Some(')') {
            return Ok(args);
        }
        loop {
            self.parse_expr(cursor)?;
            args.push(self.pop()?);
            cursor.skip_whitespace();
            if cursor.peek() == Some(')') {
                return Ok(args);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EqOp {
    Eq,
    Ne,
}

#[derive(Clone, Copy)]
enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy)]
enum AddOp {
    Plus,
    Minus,
}

#[derive(Clone, Copy)]
enum MulOp {
    Mul,
    Div,
}

/// Consumes `c c` (e.g. `&&`, `||`) if present. A lone `c` is always a
/// syntax error in this grammar: `&` and `|` never mean anything except as
/// the first half of their doubled form.
fn try_consume_doubled(cursor: &mut Cursor, c: char) -> Result<bool, EvalError> {
    if cursor.peek() != Some(c) {
        return Ok(false);
    }
    let position = cursor.pos();
    if cursor.peek2() != Some(c) {
        return Err(EvalError::BadOperator {
            operator: c.to_string(),
            position,
        });
    }
    cursor.advance();
    cursor.advance();
    Ok(true)
}

/// `==` / `!=`. A lone `=` is always an error; a lone `!` here is also an
/// error because at this point we are scanning for a *continuation*
/// operator, not starting a new primary (unary `!` is handled in
/// `parse_unary`, a different call site).
fn try_consume_eq_op(cursor: &mut Cursor) -> Result<Option<EqOp>, EvalError> {
    let position = cursor.pos();
    match cursor.peek() {
        Some('=') => {
            if cursor.peek2() == Some('=') {
                cursor.advance();
                cursor.advance();
                Ok(Some(EqOp::Eq))
            } else {
                Err(EvalError::BadOperator {
                    operator: "=".to_string(),
                    position,
                })
            }
        }
        Some('!') => {
            if cursor.peek2() == Some('=') {
                cursor.advance();
                cursor.advance();
                Ok(Some(EqOp::Ne))
            } else {
                Err(EvalError::BadOperator {
                    operator: "!".to_string(),
                    position,
                })
            }
        }
        _ => Ok(None),
    }
}

fn try_consume_rel_op(cursor: &mut Cursor) -> Option<RelOp> {
    match cursor.peek() {
        Some('<') => {
            cursor.advance();
            if cursor.eat('=') {
                Some(RelOp::Le)
            } else {
                Some(RelOp::Lt)
            }
        }
        Some('>') => {
            cursor.advance();
            if cursor.eat('=') {
                Some(RelOp::Ge)
            } else {
                Some(RelOp::Gt)
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Skip ladder: walks the same grammar as above to find where a non-taken
// ternary branch ends, without evaluating anything. Used exclusively by
// `Parser::parse_cond`.
// ---------------------------------------------------------------------

/// Skips the then-branch of a ternary whose condition was false, stopping
/// just past the matching `:`. A `?` encountered while skipping introduces
/// a nested conditional whose own `:` must be matched first.
fn skip_until_colon(cursor: &mut Cursor) -> Result<(), EvalError> {
    let start = cursor.pos();
    let mut depth = 0u32;
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return Err(EvalError::MissingColon(start)),
            Some('?') => {
                depth += 1;
                cursor.advance();
            }
            Some(':') => {
                cursor.advance();
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Some('(') => skip_parenthesized(cursor)?,
            Some('[') => skip_unit_bracket(cursor)?,
            Some(_) => {
                cursor.advance();
            }
        }
    }
}

fn skip_parenthesized(cursor: &mut Cursor) -> Result<(), EvalError> {
    let position = cursor.pos();
    cursor.advance(); // '('
    let mut depth = 1u32;
    loop {
        match cursor.peek() {
            None => return Err(EvalError::MissingCloseParen(position)),
            Some('(') => {
                depth += 1;
                cursor.advance();
            }
            Some(')') => {
                depth -= 1;
                cursor.advance();
                if depth == 0 {
                    return Ok(());
                }
            }
            Some('[') => skip_unit_bracket(cursor)?,
            Some(_) => {
                cursor.advance();
            }
        }
    }
}

fn skip_unit_bracket(cursor: &mut Cursor) -> Result<(), EvalError> {
    let position = cursor.pos();
    cursor.advance(); // '['
    while matches!(cursor.peek(), Some(c) if c != ']') {
        cursor.advance();
    }
    if !cursor.eat(']') {
        return Err(EvalError::MissingCloseBracket(position));
    }
    Ok(())
}

/// `cond = or ('?' expr ':' cond)?`, walked without evaluating.
fn skip_cond(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_or(cursor)?;
    cursor.skip_whitespace();
    if cursor.eat('?') {
        skip_until_colon(cursor)?;
        skip_cond(cursor)?;
    }
    Ok(())
}

fn skip_or(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_and(cursor)?;
    loop {
        cursor.skip_whitespace();
        if !peek_doubled(cursor, '|') {
            return Ok(());
        }
        cursor.advance();
        cursor.advance();
        skip_and(cursor)?;
    }
}

fn skip_and(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_eq(cursor)?;
    loop {
        cursor.skip_whitespace();
        if !peek_doubled(cursor, '&') {
            return Ok(());
        }
        cursor.advance();
        cursor.advance();
        skip_eq(cursor)?;
    }
}

fn skip_eq(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_rel(cursor)?;
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('=') if cursor.peek2() == Some('=') => {
                cursor.advance();
                cursor.advance();
                skip_rel(cursor)?;
            }
            Some('!') if cursor.peek2() == Some('=') => {
                cursor.advance();
                cursor.advance();
                skip_rel(cursor)?;
            }
            _ => return Ok(()),
        }
    }
}

fn skip_rel(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_add(cursor)?;
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('<') | Some('>') => {
                cursor.advance();
                cursor.eat('=');
                skip_add(cursor)?;
            }
            _ => return Ok(()),
        }
    }
}

fn skip_add(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_mul(cursor)?;
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('+') | Some('-') => {
                cursor.advance();
                skip_mul(cursor)?;
            }
            _ => return Ok(()),
        }
    }
}

fn skip_mul(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_pow(cursor)?;
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('*') | Some('/') => {
                cursor.advance();
                skip_pow(cursor)?;
            }
            _ => return Ok(()),
        }
    }
}

fn skip_pow(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_unary(cursor)?;
    cursor.skip_whitespace();
    if cursor.eat('^') {
        skip_pow(cursor)?;
    }
    Ok(())
}

fn skip_unary(cursor: &mut Cursor) -> Result<(), EvalError> {
    cursor.skip_whitespace();
    match cursor.peek() {
        Some('-') => {
            cursor.advance();
            skip_unary(cursor)
        }
        Some('!') if cursor.peek2() != Some('=') => {
            cursor.advance();
            skip_unary(cursor)
        }
        _ => skip_primary(cursor),
    }
}

fn skip_primary(cursor: &mut Cursor) -> Result<(), EvalError> {
    cursor.skip_whitespace();
    let position = cursor.pos();
    match cursor.peek() {
        Some('(') => skip_parenthesized(cursor),
        Some(c) if c.is_ascii_digit() || c == '+' || c == '.' => {
            cursor.scan_number(true)?;
            cursor.skip_whitespace();
            if cursor.peek() == Some('[') {
                skip_unit_bracket(cursor)?;
            }
            Ok(())
        }
        Some(c) if c.is_ascii_alphabetic() => {
            cursor.scan_identifier();
            cursor.skip_whitespace();
            if cursor.eat('(') {
                cursor.skip_whitespace();
                if cursor.peek() != Some(')') {
                    loop {
                        skip_expr(cursor)?;
                        cursor.skip_whitespace();
                        if cursor.peek() == Some(')') {
                            break;
                        }
                    }
                }
                if !cursor.eat(')') {
                    return Err(EvalError::MissingCloseParen(position));
                }
            }
            Ok(())
        }
        _ => Err(EvalError::MissingOperand(position)),
    }
}

fn skip_expr(cursor: &mut Cursor) -> Result<(), EvalError> {
    skip_cond(cursor)
}

fn peek_doubled(cursor: &Cursor, c: char) -> bool {
    cursor.peek() == Some(c) && cursor.peek2() == Some(c)
}
