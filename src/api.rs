use crate::engine::{self, ContextKey, Expander, ExpansionMetrics, Frame, QuitToken, RuleRegistry};
use crate::{ExpandError, Form, read_all};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};
use tracing::debug;

static DEFAULT_REGISTRY: Lazy<Result<RuleRegistry, ExpandError>> = Lazy::new(crate::rules::builtin_registry);

/// The built-in registry shared by [`setup`] and [`setup_str`].
fn default_registry() -> Result<&'static RuleRegistry, ExpandError> {
    DEFAULT_REGISTRY.as_ref().map_err(Clone::clone)
}

/// Expansion context.
///
/// This holds the environment a top-level invocation is expanded in.
#[derive(Debug, Clone)]
pub struct Context {
    /// Bindings inherited by every invocation (e.g. a feature that encloses
    /// all of them). The quit token is bound on top of these.
    pub frame: Frame,
    /// Whether the host evaluates the produced code with lexical scoping.
    /// The produced closures rely on it.
    pub lexical_binding: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self { frame: Frame::empty(), lexical_binding: true }
    }
}

/// Options that affect expansion.
#[derive(Debug, Clone)]
pub struct Options {
    /// Deepest nesting the expander accepts before failing.
    pub max_depth: usize,
    /// Consecutive head rewrites of one node before failing.
    pub max_rewrites: usize,
    /// Rule wrapped around the body when the invocation names a target.
    /// `None` disables the wrapping.
    pub root_rule: Option<String>,
    /// Record every rule application in [`ExpansionMetrics::trace`].
    pub collect_trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: engine::DEFAULT_MAX_DEPTH,
            max_rewrites: engine::DEFAULT_MAX_REWRITES,
            root_rule: Some(":with-feature".to_string()),
            collect_trace: false,
        }
    }
}

/// Additional details returned by [`setup_verbose_with`].
#[derive(Debug, Clone)]
pub struct SetupDetails {
    /// Target name derived from the invocation, if any.
    pub target: Option<Form>,
    /// Catch tag allocated for this invocation (used only when guarded).
    pub token: Form,
    pub metrics: ExpansionMetrics,
}

/// Result from [`setup_verbose_with`].
#[derive(Debug, Clone)]
pub struct SetupResult {
    pub form: Form,
    pub elapsed: Duration,
    pub details: SetupDetails,
}

/// Expand `(setup NAME BODY...)` using the built-in rules and a default
/// [`Context`].
///
/// # Example
/// ```
/// use setup_forms::{Form, read_all, read_one, setup};
///
/// let body = read_all("(:hook flyspell-mode)").unwrap();
/// let out = setup(Form::sym("text-mode"), body).unwrap();
/// assert_eq!(out, read_one("(add-hook 'text-mode-hook #'flyspell-mode)").unwrap());
/// ```
pub fn setup(name: Form, body: Vec<Form>) -> Result<Form, ExpandError> {
    setup_with(default_registry()?, name, body, &Context::default(), &Options::default())
}

/// Expand `(setup NAME BODY...)` against `registry` with the provided
/// `context`/`options`.
pub fn setup_with(
    registry: &RuleRegistry,
    name: Form,
    body: Vec<Form>,
    context: &Context,
    options: &Options,
) -> Result<Form, ExpandError> {
    setup_verbose_with(registry, name, body, context, options).map(|run| run.form)
}

/// Like [`setup_with`], also returning the target, token and run metrics.
///
/// ```text
/// name         text-mode                (:package magit)
/// target       text-mode                magit            (shorthand)
/// body         BODY...                  (:package magit) BODY...
/// root rule    (:with-feature text-mode BODY...)
/// ```
pub fn setup_verbose_with(
    registry: &RuleRegistry,
    name: Form,
    body: Vec<Form>,
    context: &Context,
    options: &Options,
) -> Result<SetupResult, ExpandError> {
    let start = Instant::now();
    if !context.lexical_binding {
        return Err(ExpandError::LexicalScopingRequired);
    }

    let (target, mut body) = split_name(registry, name, body);
    if let (Some(target), Some(root)) = (&target, options.root_rule.as_deref()) {
        if registry.contains(root) {
            let mut items = vec![Form::sym(root), target.clone()];
            items.extend(body);
            body = vec![Form::List(items)];
        }
    }

    let token = QuitToken::fresh();
    let frame = context.frame.bind(ContextKey::Quit, token.form().clone());
    let mut cx =
        Expander::new(registry, frame).with_limits(options.max_depth, options.max_rewrites).with_trace(options.collect_trace);

    let forms = cx.expand_all(&body)?;
    let guarded = cx.needs_guard();
    let form = if guarded {
        token.guard(forms.into_iter().flat_map(Form::into_body).collect())
    } else {
        Form::progn(forms)
    };

    let mut metrics = cx.into_metrics();
    metrics.total = start.elapsed();
    metrics.guarded = guarded;
    debug!(
        setup = target.as_ref().map(ToString::to_string).as_deref().unwrap_or("-"),
        rewrites = metrics.rewrites,
        max_depth = metrics.max_depth,
        guarded,
        elapsed = ?metrics.total,
        "setup expanded"
    );

    Ok(SetupResult {
        form,
        elapsed: metrics.total,
        details: SetupDetails { target, token: token.form().clone(), metrics },
    })
}

/// Read `source` and expand every `(setup NAME BODY...)` form in it with the
/// built-in rules. Other forms are returned unchanged.
pub fn setup_str(source: &str) -> Result<Vec<Form>, ExpandError> {
    setup_str_with(default_registry()?, source, &Context::default(), &Options::default())
}

pub fn setup_str_with(
    registry: &RuleRegistry,
    source: &str,
    context: &Context,
    options: &Options,
) -> Result<Vec<Form>, ExpandError> {
    read_all(source)?
        .into_iter()
        .map(|form| match form {
            Form::List(items) if items.first().and_then(Form::as_symbol) == Some("setup") => {
                let mut rest = items.into_iter().skip(1);
                let name = rest
                    .next()
                    .ok_or(ExpandError::ArgumentCount { rule: "setup".to_string(), expected: 1, got: 0 })?;
                setup_with(registry, name, rest.collect(), context, options)
            }
            other => Ok(other),
        })
        .collect()
}

/// Target name and body of an invocation.
///
/// A list `name` is itself the first body form; the target is whatever its
/// rule's shorthand extracts from it.
fn split_name(registry: &RuleRegistry, name: Form, mut body: Vec<Form>) -> (Option<Form>, Vec<Form>) {
    let Form::List(items) = &name else {
        return (Some(name), body);
    };
    let target = items.split_first().and_then(|(head, args)| {
        let shorthand = registry.lookup(head.as_symbol()?)?.shorthand()?;
        shorthand(args)
    });
    body.insert(0, name);
    (target, body)
}
