//! Macro collection and expansion, driven from Monkey source.

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{assert_expands_to, canonical, expand, run, run_ok, source};
    use monkey::engine::{expand_source, Engine, EngineOptions};
    use monkey::macros::{define_macros, expand_macros, is_macro_definition};
    use monkey::runtime::{Environment, EvalOptions, Evaluator, NullSink, Value};
    use monkey::syntax::parse_str;
    use monkey::{ErrorType, MonkeyError};

    // ------------------------------------------------------------------
    // define_macros
    // ------------------------------------------------------------------

    #[test]
    fn define_macros_collects_and_removes_definitions() {
        let mut program = parse_str(
            "let number = 1;
             let function = fn(x, y) { x + y };
             let mymacro = macro(x, y) { x + y; };",
        )
        .unwrap();
        let env = Environment::new();

        let names = define_macros(&mut program, &env);

        assert_eq!(names, vec!["mymacro".to_string()]);
        assert_eq!(program.statements.len(), 2);
        assert!(env.get("number").is_none());
        assert!(env.get("function").is_none());

        let Some(Value::Macro(mac)) = env.get("mymacro") else {
            panic!("mymacro should be bound to a macro");
        };
        assert_eq!(mac.parameters, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(mac.body.to_string(), "{ (x + y); }");
        assert!(mac.env.ptr_eq(&env));
    }

    #[test]
    fn define_macros_keeps_remaining_statements_in_order() {
        let mut program = parse_str(
            "let a = 1;
             let m = macro() { quote(1) };
             let b = 2;
             a + b;",
        )
        .unwrap();
        define_macros(&mut program, &Environment::new());
        assert_eq!(program.to_string(), "let a = 1;\nlet b = 2;\n(a + b);");
    }

    #[test]
    fn nested_macro_literals_are_not_definitions() {
        let mut program = parse_str(
            "let f = fn() { let m = macro(x) { x }; m };
             macro(y) { y };",
        )
        .unwrap();
        let env = Environment::new();
        let names = define_macros(&mut program, &env);

        assert!(names.is_empty());
        assert_eq!(program.statements.len(), 2);
        assert!(env.local_names().is_empty());
        assert!(!is_macro_definition(&program.statements[1]));
    }

    #[test]
    fn later_definition_of_the_same_name_wins() {
        assert_expands_to(
            "let m = macro() { quote(1) };
             let m = macro() { quote(2) };
             m();",
            "2;",
        );
    }

    // ------------------------------------------------------------------
    // expand_macros
    // ------------------------------------------------------------------

    #[test]
    fn expands_macro_without_arguments() {
        assert_expands_to(
            "let infixExpression = macro() { quote(1 + 2); };
             infixExpression();",
            "(1 + 2);",
        );
    }

    #[test]
    fn arguments_are_passed_unevaluated() {
        assert_expands_to(
            "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); };
             reverse(2 + 2, 10 - 5);",
            "(10 - 5) - (2 + 2);",
        );
    }

    #[test]
    fn expands_unless() {
        assert_expands_to(
            r#"let unless = macro(condition, consequence, alternative) {
                   quote(if (!(unquote(condition))) {
                       unquote(consequence);
                   } else {
                       unquote(alternative);
                   });
               };
               unless(10 > 5, puts("not greater"), puts("greater"));"#,
            r#"if (!(10 > 5)) { puts("not greater") } else { puts("greater") };"#,
        );
    }

    #[test]
    fn unless_runs_the_alternative() {
        let (result, output) = crate::common::run_with_output(
            r#"let unless = macro(cond, cons, alt) {
                   quote(if (!(unquote(cond))) { unquote(cons) } else { unquote(alt) });
               };
               unless(10 > 5, puts("not greater"), puts("greater"));"#,
        );
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(output, "greater");
    }

    #[test]
    fn program_without_macros_is_unchanged() {
        let text = "let add = fn(a, b) { a + b }; add(1, 2); [1, 2][0]; {\"k\": 1};";
        let expanded = expand(text).unwrap();
        assert_eq!(expanded, parse_str(text).unwrap());
    }

    #[test]
    fn ordinary_calls_are_untouched() {
        assert_expands_to(
            "let m = macro(x) { quote(unquote(x) + 1) };
             let f = fn(x) { x };
             f(m(2));",
            "let f = fn(x) { x }; f((2 + 1));",
        );
    }

    #[test]
    fn macro_values_reached_through_another_name_are_not_expanded() {
        let program = expand("let m = macro(x) { x }; let alias = m; alias(1);").unwrap();
        assert_eq!(program.to_string(), "let alias = m;\nalias(1);");
    }

    #[test]
    fn calls_in_nested_positions_are_expanded() {
        assert_expands_to(
            "let double = macro(x) { quote(unquote(x) * 2) };
             let f = fn(y) { if (y > 0) { return double(y); }; [double(1), {double(2): double(3)}] };",
            "let f = fn(y) { if (y > 0) { return (y * 2); }; [(1 * 2), {(2 * 2): (3 * 2)}] };",
        );
    }

    #[test]
    fn macros_run_inside_function_bodies() {
        let value = run_ok(
            "let double = macro(x) { quote(unquote(x) * 2) };
             let f = fn(y) { double(y) + 1 };
             f(4);",
        );
        assert_eq!(value, Value::Integer(9));
    }

    #[test]
    fn extra_arguments_are_ignored() {
        assert_expands_to("let first = macro(a) { a }; first(1, 2, 3);", "1;");
    }

    #[test]
    fn macro_may_return_its_argument_directly() {
        assert_expands_to("let id = macro(x) { x }; id(1 + 2);", "(1 + 2);");
    }

    #[test]
    fn return_in_macro_body_yields_the_quote() {
        assert_expands_to(
            "let early = macro(x) { return quote(unquote(x) + 1); quote(0) }; early(5);",
            "(5 + 1);",
        );
    }

    #[test]
    fn macro_body_can_bind_intermediate_syntax() {
        assert_expands_to(
            "let twice = macro(x) {
                 let doubled = quote(unquote(x) + unquote(x));
                 doubled
             };
             twice(3);",
            "(3 + 3);",
        );
    }

    // ------------------------------------------------------------------
    // Single pass, bottom-up
    // ------------------------------------------------------------------

    #[test]
    fn expansion_output_is_not_re_expanded() {
        assert_expands_to(
            "let once = macro(x) { x };
             let twice = macro(x) { quote(once(unquote(x))) };
             twice(5);",
            "once(5);",
        );
    }

    #[test]
    fn macro_calls_in_arguments_expand_first() {
        let expansion = expand_source(&source(
            "let once = macro(x) { x };
             let wrap = macro(x) { quote([unquote(x)]) };
             wrap(once(1 + 1));",
        ))
        .unwrap();

        let order: Vec<&str> = expansion
            .trace
            .iter()
            .map(|step| step.macro_name.as_str())
            .collect();
        assert_eq!(order, vec!["once", "wrap"]);
        assert_eq!(expansion.program.to_string(), canonical("[(1 + 1)];"));
        assert_eq!(expansion.trace[1].input.value.to_string(), "wrap((1 + 1))");
    }

    #[test]
    fn expansion_is_idempotent() {
        let mut program = parse_str(
            "let inc = macro(x) { quote(unquote(x) + 1) };
             let y = inc(inc(1));
             puts(y);",
        )
        .unwrap();
        let env = Environment::new();
        define_macros(&mut program, &env);

        let mut sink = NullSink;
        let mut evaluator = Evaluator::new(&mut sink, &EvalOptions::default());
        let once = expand_macros(program, &env, &mut evaluator).unwrap();
        let twice = expand_macros(once.clone(), &env, &mut evaluator).unwrap();

        assert_eq!(once.to_string(), "let y = ((1 + 1) + 1);\nputs(y);");
        assert_eq!(once, twice);
    }

    #[test]
    fn expanded_program_contains_no_definitions() {
        let program = expand(
            "let a = macro() { quote(1) };
             let b = macro() { quote(2) };
             a() + b();",
        )
        .unwrap();
        assert!(program.statements.iter().all(|stmt| !is_macro_definition(stmt)));
        assert_eq!(program.to_string(), "(1 + 2);");
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    #[test]
    fn non_quote_result_is_malformed() {
        let err = expand("let bad = macro() { 1 }; bad();").unwrap_err();
        assert!(matches!(err, MonkeyError::MalformedMacroResult { .. }), "{:?}", err);
        assert!(err.message().contains("INTEGER"), "{}", err.message());
        assert_eq!(err.error_type(), ErrorType::Expansion);
    }

    #[test]
    fn too_few_arguments_is_an_arity_mismatch() {
        let err = expand("let m = macro(a, b) { a }; m(1);").unwrap_err();
        assert!(matches!(err, MonkeyError::ArityMismatch { .. }), "{:?}", err);
        assert!(err.message().contains("expects 2"), "{}", err.message());
    }

    #[test]
    fn errors_in_macro_bodies_abort_expansion() {
        let err = expand("let m = macro(a) { undefined_name }; m(1);").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Eval);
    }

    #[test]
    fn expansion_failure_stops_before_evaluation() {
        let (result, output) = crate::common::run_with_output(
            r#"puts("side effect");
               let bad = macro() { "nope" };
               bad();"#,
        );
        assert!(matches!(result, Err(MonkeyError::MalformedMacroResult { .. })));
        assert_eq!(output, "");
    }

    #[test]
    fn errors_carry_the_call_span() {
        let text = "let bad = macro() { 1 };\nbad();";
        let err = expand(text).unwrap_err();
        let span = err.span().expect("span");
        assert_eq!(&text[span.start..span.end], "bad()");
    }

    #[test]
    fn macros_are_not_callable_at_run_time() {
        let err = run("let f = fn() { macro(y) { y } }; f()(1);").unwrap_err();
        assert!(err.message().contains("macros cannot be called"), "{}", err.message());
    }

    // ------------------------------------------------------------------
    // Engine
    // ------------------------------------------------------------------

    #[test]
    fn engine_keeps_macros_across_sources() {
        let mut sink = NullSink;
        let mut engine = Engine::new(&mut sink, EngineOptions::default());
        let first = engine
            .expand(&source("let sq = macro(x) { quote(unquote(x) * unquote(x)) };"))
            .unwrap();
        assert_eq!(first.macros, vec!["sq".to_string()]);

        let value = engine.run(&source("let n = 3; sq(n);")).unwrap();
        assert_eq!(value, Value::Integer(9));
        assert!(engine.runtime_env().get("sq").is_none());
        assert!(engine.macro_env().get("sq").is_some());
    }

    #[test]
    fn failed_load_leaves_the_macro_environment_untouched() {
        let mut sink = NullSink;
        let mut engine = Engine::new(&mut sink, EngineOptions::default());
        let err = engine
            .expand(&source("let m = macro() { quote(1) }; let bad = macro() { 1 }; bad();"))
            .unwrap_err();
        assert!(matches!(err, MonkeyError::MalformedMacroResult { .. }), "{:?}", err);
        assert!(engine.macro_env().get("m").is_none());
        assert!(engine.macro_env().get("bad").is_none());

        let next = engine.expand(&source("m();")).unwrap();
        assert_eq!(next.program.to_string(), canonical("m();"));
        assert!(next.trace.is_empty());
    }

    #[test]
    fn errors_from_earlier_macros_point_into_the_current_source() {
        let mut sink = NullSink;
        let mut engine = Engine::new(&mut sink, EngineOptions::default());
        engine
            .expand(&source("let boom = macro() { quote(1 + true) };"))
            .unwrap();

        let text = "\n\n\nlet x = 1;\nboom();";
        let err = engine.run(&source(text)).unwrap_err();
        assert!(matches!(err, MonkeyError::TypeError { .. }), "{:?}", err);
        let span = err.span().expect("span");
        assert_eq!(&text[span.start..span.end], "boom()");
    }

    #[test]
    fn arity_errors_for_earlier_macros_skip_the_foreign_body_label() {
        let mut sink = NullSink;
        let mut engine = Engine::new(&mut sink, EngineOptions::default());
        engine
            .expand(&source("let pair = macro(a, b) { quote([unquote(a), unquote(b)]) };"))
            .unwrap();

        let text = "pair(1);";
        let err = engine.expand(&source(text)).unwrap_err();
        assert!(matches!(err, MonkeyError::ArityMismatch { .. }), "{:?}", err);
        let span = err.span().expect("span");
        assert_eq!(&text[span.start..span.end], "pair(1)");
        let MonkeyError::ArityMismatch { ctx, .. } = err else {
            unreachable!()
        };
        assert!(ctx.related.is_empty());
    }
}
