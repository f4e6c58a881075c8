use std::{cell::RefCell, collections::HashMap, rc::Rc};

use scriptum::{Config, Engine, EvalError, PropertyTable, ScriptError, Value, VarOp, eval_source,
               run_source};

fn assert_num(src: &str, expected: f64) {
    match eval_source(src) {
        Ok(Value::Number(n)) => {
            assert!((n - expected).abs() < 1e-9, "{src}: expected {expected}, got {n}");
        },
        other => panic!("{src}: expected number {expected}, got {other:?}"),
    }
}

fn assert_str(src: &str, expected: &str) {
    match eval_source(src) {
        Ok(Value::Str(s)) => assert_eq!(s, expected, "{src}"),
        other => panic!("{src}: expected string {expected:?}, got {other:?}"),
    }
}

fn assert_code(src: &str, code: u16) {
    match eval_source(src) {
        Err(e) => assert_eq!(e.code(), code, "{src}: got {e}"),
        Ok(v) => panic!("{src}: expected error {code}, got {v:?}"),
    }
}

#[test]
fn operator_precedence() {
    assert_num("5*4-3*2", 14.0);
    assert_num("5*(4-3)*2", 10.0);
    assert_num("1 + 2 * 3", 7.0);
    assert_num("(1+2)*3", 9.0);
    assert_num("2 + 3 : 4", 0.0); // '+' sees an array operand
}

#[test]
fn numeric_literals_round_trip() {
    match eval_source("3.141592653589793") {
        Ok(Value::Number(n)) => assert!((n - std::f64::consts::PI).abs() < 1e-15),
        other => panic!("got {other:?}"),
    }
    assert_num("-42", -42.0);
    assert_num("2 - -3", 5.0);
}

#[test]
fn string_concatenation_and_coercion() {
    assert_str(r#""ab" + "cd""#, "abcd");
    assert_str(r#""5" + "4""#, "54");
    // A string/number mix falls through to numeric addition.
    assert_num(r#""x" + 1"#, 1.0);
    assert_str(r#""a\tb" + """#, "a\tb");
}

#[test]
fn division_by_zero_uses_the_sentinel() {
    assert_num("1/0", 2_100_776_655.0);
    assert_num("-1/0", -2_100_776_655.0);
    assert_num("0/0", 0.0);
    assert_num("1/0 == 2100776655", 1.0);
}

#[test]
fn equality_rounds_to_ten_decimals() {
    assert_num("1/3 == 0.3333333333", 1.0);
    assert_num("1/3 === 0.3333333333", 1.0);
    assert_num(r#""5" == 5"#, 1.0);
    assert_num(r#""5" === 5"#, 0.0);
    assert_num(r#""abc" !== "abc""#, 0.0);
    assert_num(r#""abc" < "abd""#, 1.0);
}

#[test]
fn logical_and_bitwise_operators() {
    assert_num("1 && 2", 1.0);
    assert_num("1 && 0", 0.0);
    assert_num("0 || 3", 1.0);
    assert_num("6 & 3", 2.0);
    assert_num("6 | 3", 7.0);
    assert_num("6 ^ 3", 5.0);
}

#[test]
fn ranges_build_inclusive_arrays() {
    let range = eval_source("2:5").unwrap();
    assert_eq!(range,
               Value::array(vec![Value::num(2.0),
                                 Value::num(3.0),
                                 Value::num(4.0),
                                 Value::num(5.0)]));
    assert_code("5:2", 6);
    assert_code("1.5:3", 6);
}

#[test]
fn array_indexing() {
    assert_num("[10,20,30][1]", 20.0);
    assert_num("[10,20,30][1+1]", 30.0);
    assert_str("[10,20,30][5]", "");
    assert_str("[10,20,30][0-1]", "");
    assert_code("[10,20,30][1.5]", 11);
}

#[test]
fn dict_literals_and_access() {
    assert_num("{a:1,b:2}.a", 1.0);
    assert_num("{a:1,b:2}.b + 10", 12.0);
    assert_num(r#"{"k space":3}["k space"]"#, 3.0);
    assert_num("{1:10,2:20}[2]", 20.0);
    assert_code("{a:1,b:2}.missing", 16);
    assert_code("{a:1", 14);
    assert_code("{a 1}", 15);
}

#[test]
fn assignment_is_a_reference() {
    let mut engine = Engine::new(Config::default());
    assert_eq!(engine.eval("a = 5; a += 3; a").unwrap(), Value::num(8.0));
    assert_eq!(engine.eval("a").unwrap(), Value::num(8.0));

    // The assignment expression itself yields the new value.
    assert_eq!(engine.eval("b = 7").unwrap(), Value::num(7.0));
    assert_eq!(engine.eval("b *= 2").unwrap(), Value::num(14.0));
    assert_eq!(engine.eval("b /= 4").unwrap(), Value::num(3.5));

    // Dict entries are live bindings too.
    engine.eval("d = {count: 1}").unwrap();
    engine.eval("d.count += 9").unwrap();
    assert_eq!(engine.eval("d.count").unwrap(), Value::num(10.0));
}

#[test]
fn semicolons_separate_expressions() {
    assert_num("1 + 1; 2 + 2", 4.0);
    assert_num("x = 3; x * x;", 9.0);
    assert_code("1 + 1 2", 5);
}

#[test]
fn error_codes_are_stable() {
    assert_code(r#""abc"#, 1);
    assert_code("   ", 2);
    assert_code("nosuchfn(1)", 3);
    assert_code("sin(1, 2)", 4);
    assert_code("sin()", 4);
}

#[test]
fn builtin_helpers_match_their_contracts() {
    assert_num("min(10,11,12*4,-4-7,15)", -11.0);
    assert_num("max(1, [9, 4])", 9.0);
    assert_num("sin(PI/4)", 0.707_106_781_186_5);
    assert_num("sqrt(9)", 3.0);
    assert_num("round(3.14159, 2)", 3.14);
    assert_str(r#"sprintf("%.2f", 5/3)"#, "1.67");
    assert_str(r#"sprintf("%05.1f", 3.14159)"#, "003.1");
    assert_str(r#"substr("--Str"+"ing--",2,6)"#, "String");
    assert_num(r#"strpos("hello", "llo")"#, 2.0);
    assert_str(r#"replace("a-b-c", "-", "+")"#, "a+b+c");
    assert_str(r#"toupper("ok")"#, "OK");
    assert_num(r#"strlen("héj")"#, 3.0);
    assert_num("strlen({a:1,b:2})", 2.0);
    assert_str(r#"typeof({a:1})"#, "dict");
    assert_str(r#"typeof("x")"#, "string");
    assert_str(r#"caseof(2, "a", "b", "c")"#, "b");
    assert_str(r#"caseof(9, "a", "b", "c")"#, "c");
    assert_str(r#"join(split("a,b,c", ","), "-")"#, "a-b-c");
}

#[test]
fn constants_are_preloaded() {
    assert_num("true", 1.0);
    assert_num("false", 0.0);
    assert_num("PI > 3.14 && PI < 3.15", 1.0);
}

#[test]
fn disabled_functions_disappear() {
    let mut config = Config::default();
    config.disabled_fns.push("sin".to_string());

    let mut engine = Engine::new(config);
    assert_eq!(engine.eval("sin(0)").unwrap_err().code(), 3);
    assert_eq!(engine.eval("cos(0)").unwrap(), Value::num(1.0));
}

#[test]
fn host_functions_register_and_check_arity() {
    let mut engine = Engine::new(Config::default());
    engine.register_function("twice", 1, Some(1), |_, args| {
              Ok(Value::num(args[0].as_number() * 2.0))
          })
          .unwrap();

    assert_eq!(engine.eval("twice(21)").unwrap(), Value::num(42.0));
    assert_eq!(engine.eval("twice(1, 2)").unwrap_err().code(), 4);
    assert!(engine.register_function("bad name", 0, None, |_, _| Ok(Value::num(0.0))).is_err());
}

#[test]
fn host_functions_can_reenter_the_evaluator() {
    let mut engine = Engine::new(Config::default());
    engine.register_function("nested", 0, Some(0), |engine, _| engine.eval("6 * 7"))
          .unwrap();

    assert_eq!(engine.eval("nested() + 1").unwrap(), Value::num(43.0));
}

#[test]
fn host_objects_expose_properties_and_methods() {
    use scriptum::Method;

    let mut engine = Engine::new(Config::default());
    let table = PropertyTable::new().with("version", Value::str("2.1"))
                                    .with("poll_rate", Value::num(250.0))
                                    .with("double",
                                          Value::Func(Method::new(1, Some(1), |args| {
                                              Value::num(args[0].as_number() * 2.0)
                                          })));
    engine.register_object("app", Rc::new(table));

    assert_eq!(engine.eval("app.version").unwrap(), Value::str("2.1"));
    assert_eq!(engine.eval("app.poll_rate / 10").unwrap(), Value::num(25.0));
    assert_eq!(engine.eval("app.double(21)").unwrap(), Value::num(42.0));
    assert_eq!(engine.eval(r#"app["version"]"#).unwrap(), Value::str("2.1"));
    assert_eq!(engine.eval("app.missing").unwrap_err().code(), 9);
}

#[test]
fn dynamic_objects_compute_properties_and_iterate() {
    use scriptum::interpreter::value::iter::ValueIter;

    // A host object with no fixed table: properties are computed on
    // demand, and the object drives `for` loops itself.
    struct Countdown;

    struct CountdownIter(f64);

    impl ValueIter for CountdownIter {
        fn next_value(&mut self) -> Option<Value> {
            if self.0 <= 0.0 {
                return None;
            }
            self.0 -= 1.0;
            Some(Value::num(self.0 + 1.0))
        }
    }

    impl scriptum::HostObject for Countdown {
        fn get_property(&self, name: &str) -> Option<Value> {
            match name {
                "start" => Some(Value::num(3.0)),
                _ => None,
            }
        }

        fn make_iter(&self) -> Option<Box<dyn ValueIter>> {
            Some(Box::new(CountdownIter(3.0)))
        }
    }

    let mut engine = Engine::new(Config::default());
    engine.register_object("timer", Rc::new(Countdown));

    assert_eq!(engine.eval("timer.start").unwrap(), Value::num(3.0));
    assert_eq!(engine.eval("timer.missing").unwrap_err().code(), 9);

    engine.load_script("out = \"\"\nfor t in timer\n  out = out + sprintf(\"%d\", t)")
          .unwrap();
    engine.run().unwrap();
    assert_eq!(engine.variable("out"), Some(Value::str("321")));
}

#[test]
fn variable_callback_owns_host_names() {
    let store = Rc::new(RefCell::new(HashMap::from([("hostx".to_string(), 42.0)])));

    let mut config = Config::default();
    let cb_store = Rc::clone(&store);
    config.variable_fn = Some(Rc::new(move |_, op, name, value| {
                             match op {
                                 VarOp::Read => cb_store.borrow().get(name).copied().map(Value::num),
                                 VarOp::Set => {
                                     let new = value.map_or(0.0, Value::as_number);
                                     cb_store.borrow_mut().insert(name.to_string(), new);
                                     None
                                 },
                                 VarOp::Check => {
                                     cb_store.borrow().contains_key(name).then(|| Value::num(1.0))
                                 },
                             }
                         }));

    let mut engine = Engine::new(config);
    assert_eq!(engine.eval("hostx + 1").unwrap(), Value::num(43.0));

    engine.eval("hostx = 7").unwrap();
    assert_eq!(store.borrow()["hostx"], 7.0);

    // Unknown names still fall back to auto-created script variables.
    assert_eq!(engine.eval("fresh + 1").unwrap(), Value::num(1.0));
}

#[test]
fn operator_overloads_run_first_and_can_defer() {
    let mut config = Config::default();
    config.overloads.insert("+".to_string(),
                            Rc::new(|_, l, _, r| {
                                if let (Value::Str(a), Value::Number(n)) = (l, r) {
                                    return Ok(Value::str(format!("{a}{n}")));
                                }
                                Ok(Value::num(0.0)) // defer to the built-in
                            }));

    let mut engine = Engine::new(config);
    assert_eq!(engine.eval(r#""x" + 1"#).unwrap(), Value::str("x1"));
    assert_eq!(engine.eval("2 + 3").unwrap(), Value::num(5.0));
}

#[test]
fn scripts_sum_ranges() {
    let mut engine = run_source("s = 0\nfor i in 1:4\n  s = s + i").unwrap();
    assert_eq!(engine.variable("s"), Some(Value::num(10.0)));
}

#[test]
fn scripts_iterate_strings_per_code_point() {
    let mut engine = run_source("out = \"\"\nfor c in \"abc\"\n  out = out + c + c").unwrap();
    assert_eq!(engine.variable("out"), Some(Value::str("aabbcc")));
}

#[test]
fn scripts_iterate_dict_values_in_insertion_order() {
    let src = "order = \"\"\nd = {b:\"1\",a:\"2\",c:\"3\"}\nfor v in d\n  order = order + v";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("order"), Some(Value::str("123")));
}

#[test]
fn while_loops_honor_break_and_continue() {
    let src = "i = 0\ntotal = 0\nwhile i < 10\n  i = i + 1\n  if i > 3\n    break\n  total = total + i";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("total"), Some(Value::num(6.0)));
    assert_eq!(engine.variable("i"), Some(Value::num(4.0)));

    let src = "total = 0\nfor i in 1:5\n  if i == 3\n    continue\n  total = total + i";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("total"), Some(Value::num(12.0)));
}

#[test]
fn break_exits_only_the_innermost_loop() {
    let src = "count = 0\nfor i in 1:3\n  for j in 1:3\n    if j == 2\n      break\n    count = count + 1";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("count"), Some(Value::num(3.0)));
}

#[test]
fn elseif_chains_take_one_branch() {
    let run_with = |x: f64| {
        let src = format!("x = {x}\nr = 0\nif x == 1\n  r = 1\nelseif x == 2\n  r = 2\nelseif x \
                           == 3\n  r = 3\nelse\n  r = 99");
        run_source(&src).unwrap().variable("r")
    };

    assert_eq!(run_with(1.0), Some(Value::num(1.0)));
    assert_eq!(run_with(2.0), Some(Value::num(2.0)));
    assert_eq!(run_with(3.0), Some(Value::num(3.0)));
    assert_eq!(run_with(7.0), Some(Value::num(99.0)));
}

#[test]
fn defs_create_locals_unless_global() {
    let src = "x = 1\ny = 0\ngo()\ndef go()\n  global x\n  x = 5\n  y = 9";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("x"), Some(Value::num(5.0)));
    assert_eq!(engine.variable("y"), Some(Value::num(0.0)));
}

#[test]
fn script_functions_recurse_through_the_bridge() {
    let src = "r = fact(5)\ndef fact(n)\n  if n <= 1\n    return 1\n  return n * fact(n - 1)";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("r"), Some(Value::num(120.0)));
}

#[test]
fn script_functions_default_missing_arguments_to_zero() {
    let src = "r = add(40)\ndef add(a, b)\n  return a + b + 2";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("r"), Some(Value::num(42.0)));
}

#[test]
fn script_functions_are_callable_from_the_host() {
    let mut engine = Engine::new(Config::default());
    engine.load_script("def square(n)\n  return n * n").unwrap();

    let result = engine.call_function("square", &[Value::num(9.0)]).unwrap();
    assert_eq!(result, Value::num(81.0));
    assert_eq!(engine.call_function("missing", &[]).unwrap_err().code(), 3);
}

#[test]
fn top_level_return_stops_the_script() {
    let src = "a = 1\nreturn 5\na = 2";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("a"), Some(Value::num(1.0)));
    assert_eq!(engine.last_return(), Value::num(5.0));
}

#[test]
fn line_budget_stops_runaway_scripts() {
    let mut config = Config::default();
    config.max_lines = 1_000;

    let mut engine = Engine::new(config);
    engine.load_script("while 1\n  x = x + 1").unwrap();
    assert_eq!(engine.run(), Err(ScriptError::LineLimit));
}

#[test]
fn time_budget_stops_runaway_scripts() {
    let mut config = Config::default();
    config.max_micros = 50_000;

    let mut engine = Engine::new(config);
    engine.load_script("while 1\n  x = x + 1").unwrap();
    assert_eq!(engine.run(), Err(ScriptError::TimeLimit));
}

#[test]
fn hosts_can_stop_scripts_cooperatively() {
    let mut engine = Engine::new(Config::default());
    engine.register_function("halt", 0, Some(0), |engine, _| {
              engine.stop();
              Ok(Value::num(0.0))
          })
          .unwrap();

    engine.load_script("while 1\n  halt()").unwrap();
    assert_eq!(engine.run(), Err(ScriptError::Stopped));
}

#[test]
fn script_errors_carry_line_numbers() {
    let mut engine = Engine::new(Config::default());
    engine.load_script("a = 1\nb = nosuchfn(2)").unwrap();

    match engine.run() {
        Err(ScriptError::Expr { source, lineno }) => {
            assert_eq!(lineno, 2);
            assert_eq!(source, EvalError::UnknownFunction { name: "nosuchfn".to_string() });
        },
        other => panic!("expected an expression error, got {other:?}"),
    }
}

#[test]
fn truthiness_covers_numbers_and_strings_only() {
    let src = "r = 0\nif \"x\"\n  r = r + 1\nif \"\"\n  r = r + 10\nif 0.5\n  r = r + 100";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("r"), Some(Value::num(101.0)));
}

#[test]
fn eval_to_value_folds_failures_in_band() {
    let mut engine = Engine::new(Config::default());
    assert_eq!(engine.eval_to_value("2 + 2"), Value::num(4.0));

    let error = engine.eval_to_value("nosuchfn(1)");
    assert_eq!(error.tag(), "error");
    let Value::Error { code, .. } = error else { panic!("expected an error value") };
    assert_eq!(code, 3);
}

#[test]
fn runs_count_executed_lines() {
    let mut engine = run_source("s = 0\nfor i in 1:4\n  s = s + i").unwrap();

    // Header re-entries count, so the loop body contributes more than
    // once per line.
    assert!(engine.lines_executed() >= 9, "got {}", engine.lines_executed());
    assert_eq!(engine.profile()[0], 1);
    assert!(engine.profile()[2] >= 4);
    assert_eq!(engine.variable("s"), Some(Value::num(10.0)));
}

#[test]
fn comments_and_blank_space_are_ignored() {
    let src = "// header comment\nx = 1 // trailing\nx = x + 1";
    let mut engine = run_source(src).unwrap();
    assert_eq!(engine.variable("x"), Some(Value::num(2.0)));
}
