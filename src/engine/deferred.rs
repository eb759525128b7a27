//! After-loaded wrapper.
//!
//! Key maps and hooks named by a rule may not exist until the feature that
//! defines them is loaded. A deferred rule therefore emits its code inside
//! `(with-eval-after-load 'FEATURE ...)`, with `FEATURE` taken from the
//! context at expansion time.
//!
//! The host runs after-load callbacks for one feature in registration order,
//! and the expander emits them in source order, so two deferred rules for the
//! same feature run in the order they were written.

use super::context::ContextKey;
use super::registry::{Expansion, expansion};
use crate::Form;

pub(crate) fn wrap(base: Expansion) -> Expansion {
    expansion(move |cx, args| {
        let feature = cx.get(ContextKey::Feature)?.clone();
        let body = base(cx, args)?;
        Ok(after_load(feature, body))
    })
}

/// `(with-eval-after-load 'FEATURE BODY...)`, splicing a `progn` body.
pub(crate) fn after_load(feature: Form, body: Form) -> Form {
    let mut items = vec![Form::sym("with-eval-after-load"), Form::quote(feature)];
    items.extend(body.into_body());
    Form::List(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Expander, Frame, RuleRegistry};
    use crate::{ExpandError, read_one};

    fn bind() -> Expansion {
        expansion(|cx, args| {
            let map = cx.get(ContextKey::Map)?.clone();
            Ok(Form::call("define-key", [map, args[0].clone()]))
        })
    }

    #[test]
    fn wraps_output_in_after_load_of_context_feature() {
        let registry = RuleRegistry::new();
        let frame = Frame::empty().bind(ContextKey::Feature, Form::sym("foo")).bind(ContextKey::Map, Form::sym("foo-map"));
        let mut cx = Expander::new(&registry, frame);

        let out = wrap(bind())(&mut cx, &[Form::string("x")]).unwrap();
        assert_eq!(out, read_one("(with-eval-after-load 'foo (define-key foo-map \"x\"))").unwrap());
    }

    #[test]
    fn requires_a_feature_in_scope() {
        let registry = RuleRegistry::new();
        let mut cx = Expander::new(&registry, Frame::empty().bind(ContextKey::Map, Form::sym("m")));
        let err = wrap(bind())(&mut cx, &[Form::string("x")]).unwrap_err();
        assert_eq!(err, ExpandError::CannotDeduce(ContextKey::Feature));
    }

    #[test]
    fn progn_bodies_are_spliced() {
        let body = Form::progn(vec![Form::sym("a"), Form::sym("b")]);
        assert_eq!(after_load(Form::sym("f"), body), read_one("(with-eval-after-load 'f a b)").unwrap());
    }
}
