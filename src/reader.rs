//! S-expression reader.
//!
//! Turns configuration text into [`Form`]s. The surface syntax is the small
//! subset the engine needs:
//!
//! ```text
//! symbol  :keyword  42  -7  "string \"with\" escapes"
//! (list ...)  [vector ...]  'quoted  #'function   ; comment to end of line
//! ```
//!
//! Tokenizing is a single regex scan; nesting is tracked with an explicit
//! stack instead of recursion. Forms are still dropped recursively, so lists,
//! vectors and quote prefixes may nest at most [`MAX_NESTING`] levels deep.
//!
//! String escapes are `\"`, `\\`, `\n` and `\t`; any other escape is an
//! error rather than being guessed at.

use crate::{Form, ReadError};

/// Deepest nesting of lists, vectors and quote prefixes `read_all` accepts.
pub const MAX_NESTING: usize = 1024;

/// Read every top-level form in `src`.
pub fn read_all(src: &str) -> Result<Vec<Form>, ReadError> {
    let re = regex!(
        r#"(?xs)
          (?P<ws>\s+|;[^\n]*)
        | (?P<open>[(\[])
        | (?P<close>[)\]])
        | (?P<fquote>\#')
        | (?P<quote>')
        | (?P<str>"(?:[^"\\]|\\.)*")
        | (?P<ustr>")
        | (?P<atom>[^\s()\[\]'";]+)
        "#
    );

    let mut stack = vec![Level::top()];
    let mut cursor = 0;

    for caps in re.captures_iter(src) {
        let Some(m) = caps.get(0) else { continue };
        if m.start() != cursor {
            return Err(unexpected(src, cursor));
        }
        cursor = m.end();
        let offset = m.start();

        if caps.name("ws").is_some() {
            continue;
        } else if caps.name("open").is_some() {
            let open = if m.as_str() == "(" { '(' } else { '[' };
            let depth = nest(&mut stack, offset)?;
            stack.push(Level { open: Some((open, offset)), items: Vec::new(), quotes: Vec::new(), depth });
        } else if caps.name("close").is_some() {
            let found = if m.as_str() == ")" { ')' } else { ']' };
            let level = match stack.pop() {
                Some(level) if level.closes_with(found) => level,
                _ => return Err(ReadError::UnexpectedClose { found, offset }),
            };
            if let Some(&(_, quote_offset)) = level.quotes.first() {
                return Err(ReadError::DanglingQuote { offset: quote_offset });
            }
            let form = match level.open {
                Some(('[', _)) => Form::Vector(level.items),
                _ => Form::List(level.items),
            };
            current(&mut stack).push(form);
        } else if caps.name("fquote").is_some() {
            nest(&mut stack, offset)?;
            current(&mut stack).quotes.push((Prefix::Function, offset));
        } else if caps.name("quote").is_some() {
            nest(&mut stack, offset)?;
            current(&mut stack).quotes.push((Prefix::Quote, offset));
        } else if caps.name("str").is_some() {
            let raw = m.as_str();
            current(&mut stack).push(Form::Str(unescape(&raw[1..raw.len() - 1], offset + 1)?));
        } else if caps.name("ustr").is_some() {
            return Err(ReadError::UnterminatedString { offset });
        } else {
            current(&mut stack).push(atom(m.as_str()));
        }
    }

    if cursor != src.len() {
        return Err(unexpected(src, cursor));
    }

    if let Some((open, offset)) = stack.last().and_then(|level| level.open) {
        return Err(ReadError::Unclosed { open, offset });
    }
    let top = stack.pop().unwrap_or_else(Level::top);
    if let Some(&(_, offset)) = top.quotes.first() {
        return Err(ReadError::DanglingQuote { offset });
    }
    Ok(top.items)
}

/// Read exactly one form from `src`.
pub fn read_one(src: &str) -> Result<Form, ReadError> {
    let mut forms = read_all(src)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        found => Err(ReadError::ExpectedOne { found }),
    }
}

#[derive(Debug, Clone, Copy)]
enum Prefix {
    Quote,
    Function,
}

/// One open list/vector (or the top level) being filled.
#[derive(Debug, Clone)]
struct Level {
    open: Option<(char, usize)>,
    items: Vec<Form>,
    /// Prefixes waiting for the next complete form, outermost first.
    quotes: Vec<(Prefix, usize)>,
    /// Nesting of this level's items (0 at the top level).
    depth: usize,
}

impl Level {
    fn top() -> Self {
        Level { open: None, items: Vec::new(), quotes: Vec::new(), depth: 0 }
    }

    fn closes_with(&self, close: char) -> bool {
        matches!((self.open, close), (Some(('(', _)), ')') | (Some(('[', _)), ']'))
    }

    fn push(&mut self, mut form: Form) {
        while let Some((prefix, _)) = self.quotes.pop() {
            form = match prefix {
                Prefix::Quote => Form::quote(form),
                Prefix::Function => Form::function(form),
            };
        }
        self.items.push(form);
    }
}

fn current(stack: &mut Vec<Level>) -> &mut Level {
    if stack.is_empty() {
        stack.push(Level::top());
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn atom(text: &str) -> Form {
    if regex!(r"^[-+]?\d+$").is_match(text) {
        if let Ok(n) = text.parse::<i64>() {
            return Form::Int(n);
        }
    }
    Form::sym(text)
}

/// Depth one more level of nesting would reach at the current position.
fn nest(stack: &mut Vec<Level>, offset: usize) -> Result<usize, ReadError> {
    let level = current(stack);
    let depth = level.depth + level.quotes.len() + 1;
    if depth > MAX_NESTING {
        return Err(ReadError::TooDeep { limit: MAX_NESTING, offset });
    }
    Ok(depth)
}

/// `start` is the byte offset of `body` in the source.
fn unescape(body: &str, start: usize) -> Result<String, ReadError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((idx, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, 'n')) => out.push('\n'),
            Some((_, 't')) => out.push('\t'),
            Some((_, c @ ('"' | '\\'))) => out.push(c),
            Some((_, escape)) => return Err(ReadError::UnknownEscape { escape, offset: start + idx }),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

fn unexpected(src: &str, offset: usize) -> ReadError {
    let found = src[offset..].chars().next().unwrap_or('\0');
    ReadError::Unexpected { found, offset }
}
