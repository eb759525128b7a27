use crate::rules::{builtin_registry, builtin_rules};
use crate::{Context, ExpandError, Expander, Form, Frame, Options, SetupResult, read_one, setup_str, setup_verbose_with};

fn expand(src: &str) -> Result<Form, ExpandError> {
    let mut out = setup_str(src)?;
    assert_eq!(out.len(), 1, "expected one form from {src}");
    Ok(out.remove(0))
}

/// Expand one `(setup NAME BODY...)` and print it with the quit token
/// replaced by `TOKEN`.
fn expand_with_token(src: &str) -> (SetupResult, String) {
    let registry = builtin_registry().unwrap();
    let items = match read_one(src).unwrap() {
        Form::List(items) => items,
        other => panic!("not a setup form: {other}"),
    };
    let mut rest = items.into_iter().skip(1);
    let name = rest.next().unwrap();
    let run = setup_verbose_with(&registry, name, rest.collect(), &Context::default(), &Options::default()).unwrap();
    let printed = run.form.to_string().replace(&run.details.token.to_string(), "TOKEN");
    (run, printed)
}

#[test]
fn builtin_expansions() {
    // Array of (input, expected expansion)
    let cases: Vec<(&str, &str)> = vec![
        (
            r#"(setup foo (:global "C-a" a "C-b" b))"#,
            r#"(progn (global-set-key (kbd "C-a") #'a) (global-set-key (kbd "C-b") #'b))"#,
        ),
        (
            r#"(setup foo (:bind "a" x "b" y))"#,
            r#"(with-eval-after-load 'foo (define-key foo-mode-map (kbd "a") #'x) (define-key foo-mode-map (kbd "b") #'y))"#,
        ),
        (r#"(setup foo (:global [f5] 'recompile))"#, r#"(global-set-key [f5] #'recompile)"#),
        (r#"(setup (:with-mode bar-mode (:hook x)))"#, r#"(add-hook 'bar-mode-hook #'x)"#),
        (
            r#"(setup foo (:with-mode bar-mode (:bind "k" c)))"#,
            r#"(with-eval-after-load 'foo (define-key bar-mode-map (kbd "k") #'c))"#,
        ),
        (r#"(setup foo (:with-map m (:unbind "k")))"#, r#"(with-eval-after-load 'foo (define-key m (kbd "k") nil))"#),
        (
            r#"(setup foo (:rebind "k" c))"#,
            r#"(with-eval-after-load 'foo
                 (dolist (key (where-is-internal #'c foo-mode-map)) (define-key foo-mode-map key nil))
                 (define-key foo-mode-map (kbd "k") #'c))"#,
        ),
        (
            r#"(setup foo (:hook-into prog-mode text-mode-hook))"#,
            r#"(progn (add-hook 'prog-mode-hook #'foo-mode) (add-hook 'text-mode-hook #'foo-mode))"#,
        ),
        (r#"(setup foo (:hook (lambda () (bar))))"#, r#"(add-hook 'foo-mode-hook (lambda () (bar)))"#),
        (
            r#"(setup foo (:local-set fill-column 72))"#,
            r#"(add-hook 'foo-mode-hook (lambda () (setq-local fill-column 72)))"#,
        ),
        (
            r#"(setup foo (:local-hook before-save-hook delete-trailing-whitespace))"#,
            r#"(add-hook 'foo-mode-hook (lambda () (add-hook 'before-save-hook #'delete-trailing-whitespace nil t)))"#,
        ),
        (
            r#"(setup foo (:option fill-column 72))"#,
            r#"(progn (custom-load-symbol 'fill-column)
                      (funcall (or (get 'fill-column 'custom-set) #'set-default) 'fill-column 72))"#,
        ),
        (
            r#"(setup foo (:package bar))"#,
            r#"(unless (package-installed-p 'bar)
                 (unless (assq 'bar package-archive-contents) (package-refresh-contents))
                 (package-install 'bar))"#,
        ),
        (r#"(setup foo (:also-load bar))"#, r#"(with-eval-after-load 'foo (require 'bar))"#),
        (
            r#"(setup foo (:when-loaded (message "hi") (bar)))"#,
            r#"(with-eval-after-load 'foo (message "hi") (bar))"#,
        ),
        (r#"(setup foo (:load-after (a b) (x)))"#, r#"(with-eval-after-load 'a (with-eval-after-load 'b (x)))"#),
        (
            r#"(setup foo (:file-match "[.]foo$"))"#,
            r#"(add-to-list 'auto-mode-alist (cons "[.]foo$" 'foo-mode))"#,
        ),
        (r#"(setup foo (:advise bar :around baz))"#, r#"(advice-add 'bar :around #'baz)"#),
        (
            r#"(setup foo (:with-feature (a b) (:hook x)))"#,
            r#"(progn (add-hook 'a-mode-hook #'x) (add-hook 'b-mode-hook #'x))"#,
        ),
        (
            r#"(setup foo (:with-hook h (:hook x)) (:hook y))"#,
            r#"(progn (add-hook 'h #'x) (add-hook 'foo-mode-hook #'y))"#,
        ),
        (
            r#"(setup foo (:bind "a" x) (:also-load y))"#,
            r#"(progn (with-eval-after-load 'foo (define-key foo-mode-map (kbd "a") #'x))
                      (with-eval-after-load 'foo (require 'y)))"#,
        ),
        (r#"(setup foo (setq x '(:hook y)))"#, r#"(setq x '(:hook y))"#),
        (r#"(setup foo)"#, r#"nil"#),
    ];

    for (input, expected) in cases {
        let out = expand(input).unwrap_or_else(|err| panic!("expanding '{input}' failed: {err}"));
        assert_eq!(out, read_one(expected).unwrap(), "unexpected expansion for '{input}': {out}");
    }
}

#[test]
fn builtin_expansion_errors() {
    let cases: Vec<(&str, ExpandError)> = vec![
        (
            r#"(setup foo (:global "a" b "c"))"#,
            ExpandError::IllegalArguments { rule: ":global".into(), arity: 2, got: 3 },
        ),
        (r#"(setup foo (:advise a b))"#, ExpandError::IllegalArguments { rule: ":advise".into(), arity: 3, got: 2 }),
        (r#"(setup (:global "a" b) (:hook x))"#, ExpandError::CannotDeduce(crate::ContextKey::Hook)),
        (r#"(setup foo (:option (push x) 1))"#, ExpandError::InvalidOption(read_one("(push x)").unwrap())),
        (r#"(setup foo (:quit 1 2))"#, ExpandError::ArgumentCount { rule: ":quit".into(), expected: 1, got: 2 }),
        (r#"(setup foo (:with-feature))"#, ExpandError::ArgumentCount { rule: ":with-feature".into(), expected: 1, got: 0 }),
    ];

    for (input, expected) in cases {
        let err = expand(input).expect_err(input);
        assert_eq!(err, expected, "unexpected error for '{input}'");
    }

    for input in [r#"(setup foo (:with-mode 3 (:hook x)))"#, r#"(setup foo (:hook-into "x"))"#] {
        assert!(matches!(expand(input), Err(ExpandError::InvalidArgument { .. })), "expected invalid argument for '{input}'");
    }
}

#[test]
fn guards_quit_through_one_catch() {
    let cases: Vec<(&str, &str)> = vec![
        (
            r#"(setup foo (:require bar) (:hook x))"#,
            r#"(catch 'TOKEN (unless (require 'bar nil t) (throw 'TOKEN nil)) (add-hook 'foo-mode-hook #'x))"#,
        ),
        (
            r#"(setup foo (:needs "rg" "fd"))"#,
            r#"(catch 'TOKEN (unless (executable-find "rg") (throw 'TOKEN nil)) (unless (executable-find "fd") (throw 'TOKEN nil)))"#,
        ),
        (r#"(setup foo (:if-package bar))"#, r#"(catch 'TOKEN (unless (package-installed-p 'bar) (throw 'TOKEN nil)))"#),
        (r#"(setup foo (:if-feature bar))"#, r#"(catch 'TOKEN (unless (featurep 'bar) (throw 'TOKEN nil)))"#),
        (r#"(setup foo (:if-host "box"))"#, r#"(catch 'TOKEN (unless (string= (system-name) "box") (throw 'TOKEN nil)))"#),
        (
            r#"(setup foo (:only-if (display-graphic-p)))"#,
            r#"(catch 'TOKEN (unless (display-graphic-p) (throw 'TOKEN nil)))"#,
        ),
        (r#"(setup foo (:quit))"#, r#"(catch 'TOKEN (throw 'TOKEN nil))"#),
        (r#"(setup foo (:quit 5))"#, r#"(catch 'TOKEN (throw 'TOKEN 5))"#),
        (
            r#"(setup (:require bar) (:bind "k" c))"#,
            r#"(catch 'TOKEN (unless (require 'bar nil t) (throw 'TOKEN nil))
                 (with-eval-after-load 'bar (define-key bar-mode-map (kbd "k") #'c)))"#,
        ),
        (
            r#"(setup foo (:with-mode (a-mode b-mode) (:only-if x)) (:hook y))"#,
            r#"(catch 'TOKEN (progn (unless x (throw 'TOKEN nil)) (unless x (throw 'TOKEN nil))) (add-hook 'foo-mode-hook #'y))"#,
        ),
    ];

    for (input, expected) in cases {
        let (run, printed) = expand_with_token(input);
        assert!(run.details.metrics.guarded, "expected a guard for '{input}'");
        assert_eq!(printed, read_one(expected).unwrap().to_string(), "unexpected expansion for '{input}'");
        assert_eq!(printed.matches("(catch ").count(), 1);
    }
}

#[test]
fn each_setup_gets_its_own_token() {
    let (first, _) = expand_with_token("(setup foo (:quit))");
    let (second, _) = expand_with_token("(setup foo (:quit))");
    assert_ne!(first.details.token, second.details.token);
}

#[test]
fn expansions_reach_a_fixed_point() {
    let registry = builtin_registry().unwrap();
    let inputs = [
        r#"(setup foo (:bind "a" x) (:with-mode bar-mode (:hook y) (:local-set z 1)))"#,
        r#"(setup (:package magit) (:global "C-x g" magit-status) (:when-loaded (:option (append magit-x) 1)))"#,
        r#"(setup foo (:needs "rg") (:hook-into text-mode))"#,
    ];

    for input in inputs {
        let (run, _) = expand_with_token(input);
        for id in registry.ids() {
            assert!(!run.form.mentions(id), "'{id}' left in expansion of '{input}': {}", run.form);
        }
        let again = Expander::new(&registry, Frame::empty()).expand(&run.form).unwrap();
        assert_eq!(again, run.form);
    }
}

#[test]
fn when_loaded_body_is_expanded() {
    let out = expand(r#"(setup foo (:when-loaded (:option (append bar) 1)))"#).unwrap();
    assert_eq!(out.head(), Some("with-eval-after-load"));
    assert!(out.to_string().contains("(if (member setup--value setup--old) setup--old (append setup--old (list setup--value)))"));
}

#[test]
fn every_builtin_is_installed_and_documented() {
    let registry = builtin_registry().unwrap();
    let rules = builtin_rules();
    assert_eq!(registry.len(), rules.len());

    for rule in &rules {
        let def = registry.lookup(&rule.name).unwrap_or_else(|| panic!("{} not installed", rule.name));
        assert!(def.documentation().is_some_and(|doc| !doc.is_empty()), "{} has no documentation", rule.name);
        assert!(!def.signature().is_empty());
    }

    let with_feature = registry.lookup(":with-feature").unwrap();
    assert_eq!(with_feature.indent(), Some(1));
    assert_eq!(with_feature.debug_shape(), Some("&rest sexp"));

    assert!(registry.lookup(":bind").unwrap().is_deferred());
    assert!(registry.lookup(":global").unwrap().is_repeatable());
    assert!(registry.lookup(":package").unwrap().shorthand().is_some());
    assert!(registry.lookup(":global").unwrap().shorthand().is_none());
}

#[test]
fn shorthand_names_the_first_argument() {
    let registry = builtin_registry().unwrap();
    let shorthand = registry.lookup(":require").unwrap().shorthand().unwrap();
    assert_eq!(shorthand(&[Form::sym("bar"), Form::sym("baz")]), Some(Form::sym("bar")));
    assert_eq!(shorthand(&[]), None);
}

#[test]
fn mode_scope_derives_map_and_hook() {
    let out = expand(
        r#"(setup x (:with-mode foo (:hook a) (:bind "k" b) (:with-map m (:bind "k" b)) (:with-hook h (:hook c))))"#,
    )
    .unwrap();
    let expected = r#"(progn (add-hook 'foo-hook #'a)
                             (with-eval-after-load 'x (define-key foo-map (kbd "k") #'b))
                             (with-eval-after-load 'x (define-key m (kbd "k") #'b))
                             (add-hook 'h #'c))"#;
    assert_eq!(out, read_one(expected).unwrap());
}
