//! Read-modify-write expressions.
//!
//! Options and variables can be assigned outright or edited as sets. A target
//! is either a plain name or `(OP NAME)`:
//!
//! ```text
//! NAME            -> WRITE(NAME, V)
//! (append NAME)   -> WRITE(NAME, old ++ [V] unless V is a member of old)
//! (prepend NAME)  -> WRITE(NAME, [V] ++ old unless V is a member of old)
//! (remove NAME)   -> WRITE(NAME, old without any element equal to V)
//! ```
//!
//! `old` is the expression `READ(NAME)`. Membership and removal use the
//! host's `equal`, i.e. structural equality of the values.

use crate::{ExpandError, Form};

const VALUE: &str = "setup--value";
const OLD: &str = "setup--old";

/// How a target's new value relates to its old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterOp {
    Set,
    Append,
    Prepend,
    Remove,
}

impl SetterOp {
    /// Split a target descriptor into its operation and key.
    pub fn parse(target: &Form) -> Result<(SetterOp, &Form), ExpandError> {
        match target {
            Form::Symbol(_) => Ok((SetterOp::Set, target)),
            Form::List(items) => match items.as_slice() {
                [Form::Symbol(op), key @ Form::Symbol(_)] => {
                    let op = match op.as_str() {
                        "append" => SetterOp::Append,
                        "prepend" => SetterOp::Prepend,
                        "remove" => SetterOp::Remove,
                        _ => return Err(ExpandError::InvalidOption(target.clone())),
                    };
                    Ok((op, key))
                }
                _ => Err(ExpandError::InvalidOption(target.clone())),
            },
            _ => Err(ExpandError::InvalidOption(target.clone())),
        }
    }
}

/// Builds assignment expressions from a reader and a writer.
///
/// `reader(key)` is an expression yielding the current value of `key`;
/// `writer(key, expr)` is an expression assigning `expr` to `key`.
pub struct Setter<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Setter<R, W>
where
    R: Fn(&Form) -> Form,
    W: Fn(&Form, Form) -> Form,
{
    pub fn new(reader: R, writer: W) -> Self {
        Setter { reader, writer }
    }

    pub fn build(&self, target: &Form, value: &Form) -> Result<Form, ExpandError> {
        let (op, key) = SetterOp::parse(target)?;
        let new_value = match op {
            SetterOp::Set => value.clone(),
            SetterOp::Append => self.unless_member(key, value, |v, old| Form::call("append", [old, Form::call("list", [v])])),
            SetterOp::Prepend => self.unless_member(key, value, |v, old| Form::call("cons", [v, old])),
            SetterOp::Remove => Form::call("remove", [value.clone(), (self.reader)(key)]),
        };
        Ok((self.writer)(key, new_value))
    }

    /// `(let ((v VALUE) (old READ)) (if (member v old) old UPDATED))`
    fn unless_member(&self, key: &Form, value: &Form, updated: impl Fn(Form, Form) -> Form) -> Form {
        let v = Form::sym(VALUE);
        let old = Form::sym(OLD);
        Form::call(
            "let",
            [
                Form::list([
                    Form::list([v.clone(), value.clone()]),
                    Form::list([old.clone(), (self.reader)(key)]),
                ]),
                Form::call(
                    "if",
                    [Form::call("member", [v.clone(), old.clone()]), old.clone(), updated(v, old)],
                ),
            ],
        )
    }
}
