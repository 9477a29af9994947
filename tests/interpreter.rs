#[cfg(test)]
mod interpreter_tests {
    use loxide::{Lox, RunStatus};

    /// Runs one program, returning captured stdout, stderr, and the status.
    fn interpret(source: &str) -> (String, String, RunStatus) {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();

        let status = Lox::new(&mut out, &mut err).run(source);

        (
            String::from_utf8(out).expect("output must be UTF-8"),
            String::from_utf8(err).expect("diagnostics must be UTF-8"),
            status,
        )
    }

    fn stdout_of(source: &str) -> String {
        let (out, err, status) = interpret(source);
        assert_eq!(status, RunStatus::Ok, "unexpected failure: {}", err);
        out
    }

    // ── expressions ─────────────────────────────────────────────────────

    #[test]
    fn test_interp_01_arithmetic_precedence() {
        let (out, _, status) = interpret("print 1 + 2 * 3;");

        assert_eq!(out, "7\n");
        assert_eq!(status, RunStatus::Ok);
        assert_eq!(status.exit_code(), 0);
    }

    #[test]
    fn test_interp_02_number_formatting() {
        assert_eq!(stdout_of("print 2.5;"), "2.5\n");
        assert_eq!(stdout_of("print 7 / 2;"), "3.5\n");
        // Integral results drop the fractional part entirely.
        assert_eq!(stdout_of("print 4 - 1;"), "3\n");
        assert_eq!(stdout_of("print -0.0 - 2.0;"), "-2\n");
    }

    #[test]
    fn test_interp_03_strings_and_comparisons() {
        assert_eq!(stdout_of("print \"foo\" + \"bar\";"), "foobar\n");
        assert_eq!(stdout_of("print 1 < 2;"), "true\n");
        assert_eq!(stdout_of("print 2 <= 1;"), "false\n");
    }

    #[test]
    fn test_interp_04_truthiness() {
        // Only nil and false are falsey; 0 and "" are truthy.
        assert_eq!(stdout_of("if (0) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(stdout_of("if (\"\") print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(stdout_of("if (nil) print \"yes\"; else print \"no\";"), "no\n");
        assert_eq!(stdout_of("print !nil;"), "true\n");
    }

    #[test]
    fn test_interp_05_equality() {
        assert_eq!(stdout_of("print nil == nil;"), "true\n");
        assert_eq!(stdout_of("print nil == 0;"), "false\n");
        // No implicit cross-type equality.
        assert_eq!(stdout_of("print \"3\" == 3;"), "false\n");
        assert_eq!(stdout_of("print 1 == 1;"), "true\n");
    }

    #[test]
    fn test_interp_06_logical_short_circuit() {
        // The deciding operand is the result, unconverted.
        assert_eq!(stdout_of("print \"hi\" or 2;"), "hi\n");
        assert_eq!(stdout_of("print nil or \"yes\";"), "yes\n");
        // The right side is never evaluated, so the undefined name is fine.
        assert_eq!(stdout_of("print nil and missing;"), "nil\n");
    }

    #[test]
    fn test_interp_07_nil_output() {
        assert_eq!(stdout_of("print nil;"), "nil\n");
        assert_eq!(stdout_of("var x; print x;"), "nil\n");
    }

    // ── variables & scoping ─────────────────────────────────────────────

    #[test]
    fn test_interp_08_block_shadowing() {
        assert_eq!(
            stdout_of("var foo = 42; { var foo = 24; print foo; } print foo;"),
            "24\n42\n"
        );
    }

    #[test]
    fn test_interp_09_assignment_is_an_expression() {
        assert_eq!(stdout_of("var a = 1; print a = 2;"), "2\n");
    }

    #[test]
    fn test_interp_10_undefined_variable_read() {
        let (_, err, status) = interpret("print missing;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(status.exit_code(), 75);
        assert!(err.contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_interp_11_assignment_cannot_define() {
        let (_, err, status) = interpret("missing = 1;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Undefined variable 'missing'."));
    }

    // ── control flow ────────────────────────────────────────────────────

    #[test]
    fn test_interp_12_while_loop() {
        assert_eq!(
            stdout_of("var i = 0; while (i < 5) { print i; i = i + 1; }"),
            "0\n1\n2\n3\n4\n"
        );
    }

    #[test]
    fn test_interp_13_for_loop() {
        assert_eq!(
            stdout_of("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    // ── functions & closures ────────────────────────────────────────────

    #[test]
    fn test_interp_14_function_call_and_return() {
        let prg = r#"
            fun max(x, y) {
                if (x > y) {
                    return x;
                }
                return y;
            }
            print max(10, 20);
        "#;
        assert_eq!(stdout_of(prg), "20\n");
    }

    #[test]
    fn test_interp_15_implicit_return_is_nil() {
        assert_eq!(stdout_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_interp_16_recursion() {
        let prg = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;
        assert_eq!(stdout_of(prg), "55\n");
    }

    #[test]
    fn test_interp_17_closure_counter() {
        let prg = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var c = makeCounter();
            c(); c(); c();
        "#;
        assert_eq!(stdout_of(prg), "1\n2\n3\n");
    }

    #[test]
    fn test_interp_18_lexical_capture_over_later_shadowing() {
        let prg = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;
        assert_eq!(stdout_of(prg), "global\nglobal\n");
    }

    #[test]
    fn test_interp_19_return_restores_environment() {
        let prg = r#"
            var a = "outer";
            fun f() {
                var a = "inner";
                return a;
            }
            print f();
            print a;
        "#;
        assert_eq!(stdout_of(prg), "inner\nouter\n");
    }

    #[test]
    fn test_interp_20_arity_mismatch() {
        let (_, err, status) = interpret("fun f(a) {} f(1, 2);");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Expected 1 arguments but got 2."));
    }

    #[test]
    fn test_interp_21_calling_a_non_callable() {
        let (_, err, status) = interpret("\"shoe\"();");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Can only call functions and classes."));
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_interp_22_fields_and_methods() {
        let prg = r#"
            class Counter {
                init() { this.count = 0; }
                bump() {
                    this.count = this.count + 1;
                    return this.count;
                }
            }
            var c = Counter();
            c.bump();
            print c.bump();
        "#;
        assert_eq!(stdout_of(prg), "2\n");
    }

    #[test]
    fn test_interp_23_initializer_arguments() {
        assert_eq!(
            stdout_of("class P { init(x) { this.x = x; } } print P(9).x;"),
            "9\n"
        );
    }

    #[test]
    fn test_interp_24_detached_bound_method_keeps_this() {
        let prg = r#"
            class Greeter {
                init(name) { this.name = name; }
                greet() { print this.name; }
            }
            var m = Greeter("bound").greet;
            m();
        "#;
        assert_eq!(stdout_of(prg), "bound\n");
    }

    #[test]
    fn test_interp_25_fields_shadow_methods() {
        let prg = r#"
            class C {
                m() { print "method"; }
            }
            var c = C();
            fun replacement() { print "field"; }
            c.m = replacement;
            c.m();
        "#;
        assert_eq!(stdout_of(prg), "field\n");
    }

    #[test]
    fn test_interp_26_property_errors() {
        let (_, err, status) = interpret("print 3.x;");
        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Only instances have properties."));

        let (_, err, status) = interpret("3.x = 1;");
        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Only instances have fields."));

        let (_, err, status) = interpret("class C {} print C().missing;");
        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Undefined property 'missing'."));
    }

    #[test]
    fn test_interp_27_method_inheritance() {
        let prg = r#"
            class A { m() { print "from A"; } }
            class B < A {}
            B().m();
        "#;
        assert_eq!(stdout_of(prg), "from A\n");
    }

    #[test]
    fn test_interp_28_super_dispatch() {
        let prg = r#"
            class A { greet() { print "A"; } }
            class B < A {
                greet() {
                    super.greet();
                    print "B";
                }
            }
            B().greet();
        "#;
        assert_eq!(stdout_of(prg), "A\nB\n");
    }

    #[test]
    fn test_interp_29_super_skips_own_override() {
        // super dispatches from above the defining class, not the receiver.
        let prg = r#"
            class A { m() { print "A"; } }
            class B < A { m() { super.m(); } }
            class C < B {}
            C().m();
        "#;
        assert_eq!(stdout_of(prg), "A\n");
    }

    #[test]
    fn test_interp_30_initializer_return_yields_instance() {
        let (out, _, status) = interpret("class C { init() { return; } } print C();");

        assert_eq!(out, "<C instance>\n");
        assert_eq!(status, RunStatus::Ok);
    }

    #[test]
    fn test_interp_31_bad_superclass() {
        let (_, err, status) = interpret("var NotAClass = 1; class C < NotAClass {}");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Superclass must be a class."));
    }

    // ── stringification & identity ──────────────────────────────────────

    #[test]
    fn test_interp_32_callable_display() {
        assert_eq!(stdout_of("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(stdout_of("class C {} print C;"), "<class C>\n");
        assert_eq!(stdout_of("print clock;"), "<native fn>\n");
    }

    #[test]
    fn test_interp_33_reference_identity_equality() {
        assert_eq!(stdout_of("fun f() {} print f == f;"), "true\n");
        assert_eq!(stdout_of("fun f() {} fun g() {} print f == g;"), "false\n");
        assert_eq!(
            stdout_of("class A {} var i = A(); print i == i;"),
            "true\n"
        );
        assert_eq!(stdout_of("class A {} print A() == A();"), "false\n");
    }

    #[test]
    fn test_interp_34_clock_native() {
        assert_eq!(stdout_of("print clock() >= 0;"), "true\n");
    }

    // ── diagnostics & status codes ──────────────────────────────────────

    #[test]
    fn test_interp_35_empty_program() {
        let (out, err, status) = interpret("");

        assert_eq!(out, "");
        assert_eq!(err, "");
        assert_eq!(status, RunStatus::Ok);
    }

    #[test]
    fn test_interp_36_compile_error_stops_execution() {
        let (out, err, status) = interpret("{ var a = a; } print \"never\";");

        assert_eq!(out, "");
        assert_eq!(status, RunStatus::CompileError);
        assert_eq!(status.exit_code(), 65);
        assert!(err.contains("Can't read local variable in its own initializer."));
    }

    #[test]
    fn test_interp_37_runtime_error_format() {
        let (_, err, status) = interpret("print \"a\" - 1;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(status.exit_code(), 75);
        assert!(err.contains("Operands must be numbers."));
        assert!(err.contains("[line 1]"));
    }

    #[test]
    fn test_interp_38_strict_plus() {
        // Mixed-type concatenation is rejected rather than stringified.
        let (_, err, status) = interpret("print \"a\" + 1;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Operands must be two numbers or two strings."));
    }

    #[test]
    fn test_interp_39_division_by_zero() {
        let (_, err, status) = interpret("print 1 / 0;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert!(err.contains("Division by zero."));
    }

    #[test]
    fn test_interp_40_runtime_error_aborts_mid_script() {
        let (out, _, status) = interpret("print 1; print missing; print 2;");

        assert_eq!(out, "1\n");
        assert_eq!(status, RunStatus::RuntimeError);
    }

    // ── session behavior across runs ────────────────────────────────────

    #[test]
    fn test_interp_41_state_persists_across_runs() {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();

        {
            let mut lox = Lox::new(&mut out, &mut err);

            assert_eq!(
                lox.run("fun greet() { var w = \"world\"; return w; }"),
                RunStatus::Ok
            );
            assert_eq!(lox.run("print greet();"), RunStatus::Ok);
        }

        assert_eq!(String::from_utf8(out).unwrap(), "world\n");
    }

    #[test]
    fn test_interp_42_error_does_not_poison_session() {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();

        {
            let mut lox = Lox::new(&mut out, &mut err);

            assert_eq!(lox.run("print missing;"), RunStatus::RuntimeError);
            assert_eq!(lox.run("print 1 +;"), RunStatus::CompileError);
            assert_eq!(lox.run("print 1 + 1;"), RunStatus::Ok);
        }

        assert_eq!(String::from_utf8(out).unwrap(), "2\n");
    }

    #[test]
    fn test_interp_43_closures_survive_later_runs() {
        // A closure from an earlier run keeps its resolved bindings intact
        // even after later runs hand out fresh expression ids.
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();

        {
            let mut lox = Lox::new(&mut out, &mut err);

            let counter = r#"
                fun makeCounter() {
                    var i = 0;
                    fun count() { i = i + 1; return i; }
                    return count;
                }
                var tick = makeCounter();
            "#;

            assert_eq!(lox.run(counter), RunStatus::Ok);
            assert_eq!(lox.run("print tick();"), RunStatus::Ok);
            assert_eq!(lox.run("print tick();"), RunStatus::Ok);
        }

        assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n");
    }
}
