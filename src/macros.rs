#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Rule`](crate::Rule) with optional metadata.
///
/// Fields must appear in the order below; all but `name` and `expand` are
/// optional.
///
/// ```
/// use setup_forms::{Form, RuleRegistry, rule};
///
/// let mut registry = RuleRegistry::new();
/// registry
///     .install([rule! {
///         name: ":greet",
///         arity: 1,
///         repeatable: true,
///         doc: "Print a greeting for each NAME.",
///         expand: |_cx, args| { Ok(Form::call("message", [Form::string("hi %s"), args[0].clone()])) }
///     }])
///     .unwrap();
/// assert!(registry.contains(":greet"));
/// ```
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr
        $(, arity: $arity:expr)?
        $(, repeatable: $repeat:expr)?
        $(, after_loaded: $after:expr)?
        $(, indent: $indent:expr)?
        $(, signature: $sig:expr)?
        $(, doc: $doc:expr)?
        $(, shorthand: $short:expr)?
        $(, debug: $debug:expr)?
        , expand: |$cx:pat_param, $args:pat_param| $body:block
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut rule = $crate::Rule::new($name, move |$cx, $args| $body);
        $( rule.options.arity = Some($arity); )?
        $( rule.options.repeatable = $crate::Repeat::from($repeat); )?
        $( rule.options.after_loaded = $after; )?
        $( rule.options.indent = Some($indent); )?
        $( rule.options.signature = Some(String::from($sig)); )?
        $( rule.options.documentation = Some(String::from($doc)); )?
        $( rule.options.shorthand = Some($short as $crate::Shorthand); )?
        $( rule.options.debug_shape = Some(String::from($debug)); )?
        rule
    }};
}
