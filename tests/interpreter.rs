use tinytalk::{
    diagnostics::{DiagnosticKind, TinyTalkError},
    runtime::{run, run_with_limits, ExecutionLimits, Interpreter},
    value::{Value, ValueKind},
};

fn eval(source: &str) -> Value {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> TinyTalkError {
    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

fn expect_int(value: &Value) -> i64 {
    match value.0.as_ref() {
        ValueKind::Int(n) => *n,
        _ => panic!("expected Int, found {}", value.type_name()),
    }
}

fn expect_float(value: &Value) -> f64 {
    match value.0.as_ref() {
        ValueKind::Float(f) => *f,
        _ => panic!("expected Float, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match value.0.as_ref() {
        ValueKind::Bool(b) => *b,
        _ => panic!("expected Bool, found {}", value.type_name()),
    }
}

fn expect_kind(err: &TinyTalkError) -> DiagnosticKind {
    err.diagnostic()
        .unwrap_or_else(|| panic!("expected diagnostic, found {err}"))
        .kind
}

const ACCOUNT: &str = r#"
blueprint Account {
    field balance = 100

    law no_overdraft {
        when self.balance < 0
    }

    forge deposit(amount) {
        self.balance = self.balance + amount
        reply self.balance
    }

    forge withdraw(amount) {
        self.balance = self.balance - amount
        reply self.balance
    }
}
"#;

const COUNTER: &str = r#"
blueprint Counter {
    field count = 0

    forge inc() {
        self.count = self.count + 1
        reply self.count
    }
}
"#;

#[test]
fn evaluates_basic_arithmetic() {
    let value = eval("2 + 2 * 10");
    assert_eq!(expect_int(&value), 22);
}

#[test]
fn integer_arithmetic_stays_integral_when_exact() {
    assert_eq!(expect_int(&eval("6 / 2")), 3);
    let half = eval("7 / 2");
    assert!((expect_float(&half) - 3.5).abs() < 1e-9);
    let mixed = eval("1 + 2.0");
    assert!((expect_float(&mixed) - 3.0).abs() < 1e-9);
}

#[test]
fn logical_operators_short_circuit() {
    let guarded = eval("let x = 0\nx != 0 && 1 / x > 0");
    assert!(!expect_bool(&guarded));
    let fallback = eval("let x = 0\nx == 0 || 1 / x > 0");
    assert!(expect_bool(&fallback));
}

#[test]
fn numeric_equality_is_exact() {
    assert!(expect_bool(&eval("1 == 1.0")));
    assert!(expect_bool(&eval("100000000000000000000.0 == 1e20")));
    assert!(!expect_bool(&eval("0.1 + 0.2 == 0.3")));
}

#[test]
fn overflowing_integer_literal_is_rejected() {
    let err = eval_error("9223372036854775808");
    assert_eq!(expect_kind(&err), DiagnosticKind::Parse);
    assert!(format!("{err}").contains("out of range"), "{err}");
}

#[test]
fn exponent_marker_without_digits_is_not_an_exponent() {
    let scaled = eval("2e3");
    assert!((expect_float(&scaled) - 2000.0).abs() < 1e-9);
    // `1e` lexes as the number 1 followed by the identifier `e`.
    let err = eval_error("1e");
    assert_eq!(expect_kind(&err), DiagnosticKind::Name);
}

#[test]
fn division_by_integer_zero_is_a_type_error() {
    let err = eval_error("1 / 0");
    assert_eq!(expect_kind(&err), DiagnosticKind::Type);
    assert!(format!("{err}").contains("division by zero"), "{err}");
}

#[test]
fn string_concatenation_renders_both_sides() {
    let value = eval(r#""balance: " + 42"#);
    match value.0.as_ref() {
        ValueKind::String(s) => assert_eq!(s, "balance: 42"),
        _ => panic!("expected String, found {}", value.type_name()),
    }
}

#[test]
fn assignment_writes_the_owning_scope() {
    let value = eval(
        r#"
        let x = 1
        {
            x = x + 1
        }
        x
        "#,
    );
    assert_eq!(expect_int(&value), 2);
}

#[test]
fn const_assignment_is_rejected() {
    let err = eval_error(
        r#"
        const answer = 42
        answer = 13
        "#,
    );
    assert_eq!(expect_kind(&err), DiagnosticKind::Type);
    assert!(
        format!("{err}").contains("cannot assign to immutable binding"),
        "{err}"
    );
}

#[test]
fn undefined_variable_is_a_name_error() {
    let err = eval_error("missing + 1");
    assert_eq!(expect_kind(&err), DiagnosticKind::Name);
    assert!(format!("{err}").contains("undefined variable `missing`"), "{err}");
}

#[test]
fn while_loop_counts_down() {
    let value = eval(
        r#"
        let n = 5
        let total = 0
        while n > 0 {
            total = total + n
            n = n - 1
        }
        total
        "#,
    );
    assert_eq!(expect_int(&value), 15);
}

#[test]
fn break_carries_value_out_of_loop() {
    let value = eval(
        r#"
        loop {
            break 7
        }
        "#,
    );
    assert_eq!(expect_int(&value), 7);
}

#[test]
fn reply_at_top_level_terminates_the_run() {
    let outcome = run(
        r#"
        show "before"
        reply 5
        show "after"
        "#,
    );
    assert!(outcome.error.is_none());
    assert_eq!(outcome.output, vec!["before".to_string()]);
    let terminal = outcome.terminal.expect("terminal value");
    assert_eq!(expect_int(&terminal), 5);
}

#[test]
fn construction_takes_overrides_then_defaults() {
    let value = eval(&format!(
        r#"
        {COUNTER}
        let a = Counter()
        let b = Counter(10)
        a.count + b.count
        "#
    ));
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn construction_rejects_extra_arguments() {
    let err = eval_error(&format!("{COUNTER}\nCounter(1, 2)"));
    assert_eq!(expect_kind(&err), DiagnosticKind::Type);
}

#[test]
fn account_commits_until_balance_would_go_negative() {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(&format!("{ACCOUNT}\nlet acct = Account()"))
        .expect("declare account");

    let after_deposit = interpreter.eval_source("acct.deposit(50)").expect("deposit");
    assert_eq!(expect_int(&after_deposit), 150);

    let after_withdraw = interpreter.eval_source("acct.withdraw(30)").expect("withdraw");
    assert_eq!(expect_int(&after_withdraw), 120);

    let err = interpreter
        .eval_source("acct.withdraw(200)")
        .expect_err("overdraft should be rejected");
    assert_eq!(expect_kind(&err), DiagnosticKind::InvariantViolation);
    assert!(err.is_invariant_violation());
    let message = format!("{err}");
    assert!(message.contains("no_overdraft"), "{message}");
    assert!(message.contains("withdraw"), "{message}");

    let balance = interpreter.eval_source("acct.balance").expect("read balance");
    assert_eq!(expect_int(&balance), 120);
}

#[test]
fn thermostat_names_the_violated_law() {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(
            r#"
            blueprint Thermostat {
                field temperature = 20

                law below_min {
                    when self.temperature < 5
                }

                law above_max {
                    when self.temperature > 35
                }

                forge set_temperature(value) {
                    self.temperature = value
                    reply self.temperature
                }
            }
            let stat = Thermostat()
            "#,
        )
        .expect("declare thermostat");

    let too_hot = interpreter
        .eval_source("stat.set_temperature(40)")
        .expect_err("above max");
    assert!(format!("{too_hot}").contains("above_max"), "{too_hot}");
    assert_eq!(
        expect_int(&interpreter.eval_source("stat.temperature").expect("read")),
        20
    );

    let too_cold = interpreter
        .eval_source("stat.set_temperature(0)")
        .expect_err("below min");
    assert!(format!("{too_cold}").contains("below_min"), "{too_cold}");
    assert_eq!(
        expect_int(&interpreter.eval_source("stat.temperature").expect("read")),
        20
    );
}

#[test]
fn bound_operation_keeps_targeting_its_instance() {
    let value = eval(&format!(
        r#"
        {COUNTER}
        let c = Counter()
        let f = c.inc
        let first = f()
        c = Counter(100)
        let second = f()
        first * 10 + second
        "#
    ));
    assert_eq!(expect_int(&value), 12);
}

#[test]
fn rebound_variable_leaves_bound_operation_untouched() {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(&format!(
            r#"
            {COUNTER}
            let c = Counter()
            let f = c.inc
            f()
            c = Counter(100)
            f()
            "#
        ))
        .expect("drive bound operation");
    assert_eq!(
        expect_int(&interpreter.eval_source("c.count").expect("read rebound")),
        100
    );
}

#[test]
fn forge_without_field_writes_always_commits() {
    let value = eval(
        r#"
        blueprint Gauge {
            field level = 5

            law never_negative {
                when self.level < 0
            }

            forge peek() {
                reply self.level
            }
        }
        let gauge = Gauge()
        gauge.peek()
        "#,
    );
    assert_eq!(expect_int(&value), 5);
}

#[test]
fn inner_rollback_leaves_outer_writes_applied() {
    let mut interpreter = Interpreter::new();
    let err = interpreter
        .eval_source(&format!(
            r#"
            {ACCOUNT}
            blueprint Ledger {{
                field entries = 0

                forge record(acct, amount) {{
                    self.entries = self.entries + 1
                    acct.withdraw(amount)
                }}
            }}
            let acct = Account()
            let ledger = Ledger()
            ledger.record(acct, 500)
            "#
        ))
        .expect_err("inner withdraw should violate");
    assert_eq!(expect_kind(&err), DiagnosticKind::InvariantViolation);

    // The inner receiver rolled back, the outer receiver's write stands.
    assert_eq!(
        expect_int(&interpreter.eval_source("acct.balance").expect("read")),
        100
    );
    assert_eq!(
        expect_int(&interpreter.eval_source("ledger.entries").expect("read")),
        1
    );
}

#[test]
fn fault_in_forge_body_rolls_back_writes() {
    let mut interpreter = Interpreter::new();
    let err = interpreter
        .eval_source(
            r#"
            blueprint Bumper {
                field n = 0

                forge bump_then_fail() {
                    self.n = self.n + 1
                    show "bumped"
                    missing
                }
            }
            let b = Bumper()
            b.bump_then_fail()
            "#,
        )
        .expect_err("body fault");
    assert_eq!(expect_kind(&err), DiagnosticKind::Name);
    assert!(interpreter.drain_output().is_empty());
    assert_eq!(
        expect_int(&interpreter.eval_source("b.n").expect("read")),
        0
    );
}

#[test]
fn fault_in_law_body_rolls_back_writes() {
    let mut interpreter = Interpreter::new();
    let err = interpreter
        .eval_source(
            r#"
            blueprint Odd {
                field n = 0

                law broken {
                    when self.missing > 0
                }

                forge bump() {
                    self.n = self.n + 1
                }
            }
            let o = Odd()
            o.bump()
            "#,
        )
        .expect_err("law fault");
    assert_eq!(expect_kind(&err), DiagnosticKind::Name);
    assert_eq!(
        expect_int(&interpreter.eval_source("o.n").expect("read")),
        0
    );
}

#[test]
fn loop_escape_from_call_reports_position() {
    let err = eval_error(
        "blueprint Flow {\n    forge spin() {\n        break\n    }\n}\nlet f = Flow()\nf.spin()",
    );
    let diag = err.diagnostic().expect("diagnostic");
    assert_eq!(diag.kind, DiagnosticKind::Type);
    assert_eq!(diag.line, 3);
    assert_eq!(diag.column, 9);
}

#[test]
fn show_output_inside_rolled_back_body_is_suppressed() {
    let outcome = run(
        r#"
        blueprint Vault {
            field sealed = 0

            law stays_sealed {
                when self.sealed != 0
            }

            forge crack() {
                show "cracking"
                self.sealed = 1
            }
        }
        show "start"
        let vault = Vault()
        vault.crack()
        "#,
    );
    assert_eq!(outcome.output, vec!["start".to_string()]);
    let err = outcome.error.expect("violation");
    assert!(err.is_invariant_violation());
}

#[test]
fn show_output_inside_committed_body_is_kept() {
    let outcome = run(&format!(
        r#"
        {COUNTER}
        let c = Counter()
        show "before"
        c.inc()
        show c.count
        "#
    ));
    assert!(outcome.error.is_none());
    assert_eq!(
        outcome.output,
        vec!["before".to_string(), "1".to_string()]
    );
}

#[test]
fn field_write_outside_a_forge_is_rejected() {
    let err = eval_error(&format!(
        r#"
        {COUNTER}
        let c = Counter()
        c.count = 99
        "#
    ));
    assert_eq!(expect_kind(&err), DiagnosticKind::Type);
}

#[test]
fn sentinel_cannot_reach_a_field() {
    let err = eval_error(
        r#"
        blueprint Box {
            field content = 0

            forge poison() {
                self.content = finfr
            }
        }
        let b = Box()
        b.poison()
        "#,
    );
    assert_eq!(expect_kind(&err), DiagnosticKind::Type);
    assert!(format!("{err}").contains("sentinel"), "{err}");
}

#[test]
fn reading_a_law_returns_a_callable_verdict() {
    let value = eval(&format!(
        r#"
        {ACCOUNT}
        let acct = Account()
        let check = acct.no_overdraft
        check()
        "#
    ));
    assert!(matches!(value.0.as_ref(), ValueKind::None));
}

#[test]
fn instances_compare_by_identity() {
    let value = eval(&format!(
        r#"
        {COUNTER}
        let a = Counter()
        let b = Counter()
        let alias = a
        a == alias && !(a == b)
        "#
    ));
    assert!(expect_bool(&value));
}

#[test]
fn duplicate_member_is_a_parse_error() {
    let err = eval_error(
        r#"
        blueprint Twice {
            field x = 0
            forge x() { reply 0 }
        }
        "#,
    );
    assert_eq!(expect_kind(&err), DiagnosticKind::Parse);
    assert!(format!("{err}").contains("duplicate member"), "{err}");
}

#[test]
fn unterminated_string_is_a_lex_error_with_position() {
    let outcome = run("let x = \"oops");
    assert!(outcome.output.is_empty());
    assert!(outcome.terminal.is_none());
    let err = outcome.error.expect("lex error");
    let diag = err.diagnostic().expect("diagnostic");
    assert_eq!(diag.kind, DiagnosticKind::Lex);
    assert_eq!(diag.line, 1);
    assert_eq!(diag.column, 9);
}

#[test]
fn parse_error_reports_the_found_token() {
    let outcome = run("let = 3");
    let err = outcome.error.expect("parse error");
    let diag = err.diagnostic().expect("diagnostic");
    assert_eq!(diag.kind, DiagnosticKind::Parse);
    assert!(diag.message.contains("expected variable name"), "{}", diag.message);
}

#[test]
fn runtime_error_keeps_prior_output_and_commits() {
    let outcome = run(&format!(
        r#"
        {COUNTER}
        let c = Counter()
        c.inc()
        show c.count
        missing
        "#
    ));
    assert_eq!(outcome.output, vec!["1".to_string()]);
    let err = outcome.error.expect("name error");
    assert_eq!(expect_kind(&err), DiagnosticKind::Name);
}

#[test]
fn step_budget_aborts_unbounded_loops() {
    let outcome = run_with_limits(
        "loop { }",
        ExecutionLimits {
            max_steps: Some(1_000),
        },
    );
    let err = outcome.error.expect("budget error");
    assert!(matches!(err, TinyTalkError::Budget { steps: 1_000 }));
    assert!(err.diagnostic().is_none());
}

#[test]
fn run_reports_terminal_value() {
    let outcome = run("let x = 20\nx * 2 + 2");
    assert!(outcome.error.is_none());
    assert_eq!(expect_int(&outcome.terminal.expect("terminal")), 42);
}
