#[cfg(test)]
mod resolver_tests {
    use loxide::error::LoxError;
    use loxide::interpreter::Interpreter;
    use loxide::parser::Parser;
    use loxide::resolver::Resolver;
    use loxide::scanner::Scanner;

    /// Scans, parses, and resolves; returns the static errors found.
    fn resolve(source: &str) -> Vec<LoxError> {
        let tokens = Scanner::new(source)
            .collect::<Result<Vec<_>, _>>()
            .expect("test source must scan cleanly");

        let mut parser = Parser::new(tokens);
        let (statements, errors) = parser.parse();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        let mut interpreter: Interpreter<Vec<u8>> = Interpreter::new(Vec::new());
        Resolver::new(&mut interpreter).resolve(&statements)
    }

    fn messages(source: &str) -> Vec<String> {
        resolve(source).iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_resolver_01_clean_program() {
        let errors = resolve(
            "fun outer() { var x = 1; fun inner() { return x; } return inner; }",
        );

        assert!(errors.is_empty(), "expected no errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_02_read_in_own_initializer() {
        let msgs = messages("{ var a = a; }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't read local variable in its own initializer."));
        assert!(msgs[0].contains(" at 'a'"));
    }

    #[test]
    fn test_resolver_03_duplicate_declaration_in_scope() {
        let msgs = messages("{ var a = 1; var a = 2; }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Already a variable with this name in this scope."));
    }

    #[test]
    fn test_resolver_04_global_redeclaration_is_fine() {
        assert!(resolve("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_resolver_05_top_level_return() {
        let msgs = messages("return 1;");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't return from top-level code."));
    }

    #[test]
    fn test_resolver_06_return_value_from_initializer() {
        let msgs = messages("class C { init() { return 1; } }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't return a value from an initializer."));
    }

    #[test]
    fn test_resolver_07_bare_return_from_initializer_allowed() {
        assert!(resolve("class C { init() { return; } }").is_empty());
    }

    #[test]
    fn test_resolver_08_this_outside_class() {
        let msgs = messages("print this;");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn test_resolver_09_this_inside_function_outside_class() {
        let msgs = messages("fun f() { return this; }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn test_resolver_10_super_outside_class() {
        let msgs = messages("fun f() { super.g(); }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't use 'super' outside of a class."));
    }

    #[test]
    fn test_resolver_11_super_without_superclass() {
        let msgs = messages("class C { m() { super.m(); } }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't use 'super' in a class with no superclass."));
    }

    #[test]
    fn test_resolver_12_class_inheriting_from_itself() {
        let msgs = messages("class C < C {}");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("A class can't inherit from itself."));
    }

    #[test]
    fn test_resolver_13_errors_accumulate() {
        // One walk reports all of them, not just the first.
        let msgs = messages("return 1; print this; { var a = a; }");

        assert_eq!(msgs.len(), 3);
    }

    #[test]
    fn test_resolver_14_both_if_branches_resolved() {
        // The else branch is walked too: a static error hiding there is found.
        let msgs = messages("if (true) print 1; else { var a = a; }");

        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Can't read local variable in its own initializer."));
    }

    #[test]
    fn test_resolver_15_error_format() {
        let msgs = messages("{ var dup = 1; var dup = 2; }");

        assert!(msgs[0].starts_with("[line 1] Error at 'dup': "));
    }
}
