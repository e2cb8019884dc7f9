//! Stylesheet compilation tests for carto-style
//!
//! Builds annotated trees by hand and checks the compiled rule model.

use carto_style::{
    parse_stylesheet, CascadeMode, Dumper, NameSelector, Rule, StyleEnv, StyleError,
    StylesheetBuilder,
};
use carto_tree::{Color, Node, NodeKind, SourceLocation, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("carto_style=trace")
        .with_test_writer()
        .try_init();
}

fn sel(name: &str) -> Node {
    Node::selector(Some(name), None, None)
}

fn rule_named<'a>(rules: impl IntoIterator<Item = &'a Rule>, name: &str) -> &'a Rule {
    rules
        .into_iter()
        .find(|r| r.selector_name() == name)
        .unwrap_or_else(|| panic!("no rule {}", name))
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_nested_rule_with_forward_variable() {
    init_tracing();
    // .foo { line-width: 2; .bar { line-width: @w; } } @w: 3+2;
    let tree = Node::stylesheet(vec![
        Node::style(
            vec![sel(".foo")],
            vec![
                Node::attribute("line-width", Node::integer(2)),
                Node::style(
                    vec![sel(".bar")],
                    vec![Node::attribute("line-width", Node::var_ref("w"))],
                ),
            ],
        ),
        Node::variable(
            "w",
            Node::expression(Node::add(Node::integer(3), Node::integer(2))),
        ),
    ]);

    let styl = parse_stylesheet(&tree).unwrap();
    assert_eq!(styl.rules.len(), 2);

    let foo = rule_named(&styl.rules, ".foo");
    assert_eq!(foo.attr("line-width").and_then(Value::as_f64), Some(2.0));

    let bar = rule_named(&styl.rules, ".foo.bar");
    assert_eq!(
        bar.names,
        vec![NameSelector::Class("foo".into()), NameSelector::Class("bar".into())]
    );
    assert_eq!(bar.attr("line-width"), Some(&Value::Double(5.0)));
}

#[test]
fn test_map_style_only() {
    // Map { srs: "+proj=merc"; buffer-size: 10; }
    let tree = Node::stylesheet(vec![Node::map_style(vec![
        Node::attribute("srs", Node::string("+proj=merc")),
        Node::attribute("buffer-size", Node::integer(10)),
    ])]);

    let styl = parse_stylesheet(&tree).unwrap();
    assert!(styl.rules.is_empty());
    assert_eq!(styl.map_style.len(), 2);
    assert_eq!(styl.map_style.get("srs"), Some(&Value::from("+proj=merc")));
    assert_eq!(styl.map_style.get("buffer-size"), Some(&Value::Int(10)));
}

#[test]
fn test_unknown_predicate_names_filter_location() {
    let loc = SourceLocation::new("roads.mss", 12, 8);
    let bogus = Node::branch(NodeKind::Keyword, vec![Node::string("zoom"), Node::integer(3)])
        .with_location(loc.clone());
    let tree = Node::stylesheet(vec![Node::style(
        vec![Node::selector(Some("#roads"), None, Some(Node::filters(vec![bogus])))],
        vec![],
    )]);

    let err = parse_stylesheet(&tree).unwrap_err();
    assert!(matches!(err, StyleError::UnknownPredicate { .. }));
    assert_eq!(err.location(), &loc);
    assert!(err.to_string().contains("roads.mss:12:8"));
}

#[test]
fn test_dump_round_trip_text() {
    let tree = Node::stylesheet(vec![Node::style(
        vec![Node::selector(Some("#water"), Some("outline"), None)],
        vec![
            Node::attribute("line-color", Node::color(Color::rgb(0, 0, 255))),
            Node::attribute("line-width", Node::number(1.5)),
        ],
    )]);
    let styl = parse_stylesheet(&tree).unwrap();

    assert_eq!(
        Dumper::dump(&styl),
        "#water::outline {\n    line-color: #0000ff;\n    line-width: 1.5;\n}\n\n"
    );
}

// ============================================================================
// Attributes and ordering
// ============================================================================

#[test]
fn test_attribute_last_write_wins() {
    let tree = Node::stylesheet(vec![Node::style(
        vec![sel(".a")],
        vec![
            Node::attribute("color", Node::color(Color::from_name("red").unwrap())),
            Node::attribute("color", Node::color(Color::from_name("blue").unwrap())),
        ],
    )]);
    let styl = parse_stylesheet(&tree).unwrap();
    let rule = styl.rules.get(0).unwrap();
    assert_eq!(rule.attr("color"), Some(&Value::Color(Color::rgb(0, 0, 255))));
}

#[test]
fn test_equal_specificity_keeps_document_order() {
    let tree = Node::stylesheet(vec![
        Node::style(vec![sel("#first")], vec![]),
        Node::style(vec![sel("#second")], vec![]),
        Node::style(vec![sel("#third")], vec![]),
    ]);
    let styl = parse_stylesheet(&tree).unwrap();
    let order: Vec<String> = styl.rules.iter().map(Rule::selector_name).collect();
    assert_eq!(order, vec!["#first", "#second", "#third"]);
}

#[test]
fn test_rules_ordered_by_specificity() {
    let filters = Node::filters(vec![Node::filter(NodeKind::FilterEq, "kind", Node::string("x"))]);
    let tree = Node::stylesheet(vec![
        Node::style(
            vec![sel("#a")],
            vec![Node::style(vec![sel(".b")], vec![])],
        ),
        Node::style(vec![Node::selector(Some("#a"), None, Some(filters))], vec![]),
        Node::style(vec![Node::selector(Some("#a"), Some("glow"), None)], vec![]),
    ]);
    let styl = parse_stylesheet(&tree).unwrap();

    let specificities: Vec<u32> = styl.rules.iter().map(|r| r.specificity().0).collect();
    let mut sorted = specificities.clone();
    sorted.sort();
    assert_eq!(specificities, sorted);

    for rule in &styl.rules {
        let expected = ((rule.names.len() as u32) << 16)
            | ((rule.filters.len().min(255) as u32) << 8)
            | if rule.attachment.is_some() { 0xff } else { 0 };
        assert_eq!(rule.specificity().0, expected);
    }
}

#[test]
fn test_selector_group_without_name() {
    // [zoom > 10] { ... } nested under #roads
    let filters = Node::filters(vec![Node::filter(NodeKind::FilterGt, "zoom", Node::integer(10))]);
    let tree = Node::stylesheet(vec![Node::style(
        vec![sel("#roads")],
        vec![Node::style(
            vec![Node::selector(None, None, Some(filters))],
            vec![Node::attribute("line-width", Node::number(2.0))],
        )],
    )]);
    let styl = parse_stylesheet(&tree).unwrap();
    let zoomed = rule_named(&styl.rules, "#roads[zoom>10]");
    assert_eq!(zoomed.names.len(), 1);
    assert_eq!(zoomed.filters.len(), 1);
}

// ============================================================================
// Variables and expressions
// ============================================================================

#[test]
fn test_variable_indirection_chain() {
    let tree = Node::stylesheet(vec![
        Node::variable("a", Node::var_ref("b")),
        Node::variable("b", Node::integer(5)),
        Node::style(vec![sel(".x")], vec![Node::attribute("w", Node::var_ref("a"))]),
    ]);
    let styl = parse_stylesheet(&tree).unwrap();
    assert_eq!(styl.rules.get(0).unwrap().attr("w"), Some(&Value::Int(5)));
}

#[test]
fn test_variable_cycle_fails() {
    let tree = Node::stylesheet(vec![
        Node::variable("a", Node::var_ref("b")),
        Node::variable("b", Node::var_ref("a")),
    ]);
    assert!(matches!(
        parse_stylesheet(&tree),
        Err(StyleError::UndefinedVariable { .. })
    ));
}

#[test]
fn test_deep_variable_chain() {
    // @v0: 1; @v1: @v0 + @v0; ... #a { w: @v30; }
    let mut statements = vec![Node::variable("v0", Node::integer(1))];
    for i in 1..=30 {
        let prev = format!("v{}", i - 1);
        statements.push(Node::variable(
            format!("v{}", i),
            Node::add(Node::var_ref(&prev), Node::var_ref(&prev)),
        ));
    }
    statements.push(Node::style(vec![sel("#a")], vec![Node::attribute("w", Node::var_ref("v30"))]));

    let styl = parse_stylesheet(&Node::stylesheet(statements)).unwrap();
    assert_eq!(
        styl.rules.get(0).unwrap().attr("w"),
        Some(&Value::Double((1u64 << 30) as f64))
    );
}

#[test]
fn test_nested_redefinitions_build_on_each_other() {
    // @w: 1; .a { @w: @w + 1; .b { @w: @w * 10; line-width: @w; } line-width: @w; }
    let tree = Node::stylesheet(vec![
        Node::variable("w", Node::integer(1)),
        Node::style(
            vec![sel(".a")],
            vec![
                Node::variable("w", Node::add(Node::var_ref("w"), Node::integer(1))),
                Node::style(
                    vec![sel(".b")],
                    vec![
                        Node::variable("w", Node::mult(Node::var_ref("w"), Node::integer(10))),
                        Node::attribute("line-width", Node::var_ref("w")),
                    ],
                ),
                Node::attribute("line-width", Node::var_ref("w")),
            ],
        ),
    ]);
    let styl = parse_stylesheet(&tree).unwrap();
    assert_eq!(rule_named(&styl.rules, ".a").attr("line-width"), Some(&Value::Double(2.0)));
    assert_eq!(rule_named(&styl.rules, ".a.b").attr("line-width"), Some(&Value::Double(20.0)));
}

#[test]
fn test_color_arithmetic_in_attribute() {
    let tree = Node::stylesheet(vec![
        Node::variable("base", Node::color(Color::rgba(10, 20, 30, 255))),
        Node::style(
            vec![sel(".x")],
            vec![
                Node::attribute("fill", Node::add(Node::var_ref("base"), Node::number(5.0))),
                Node::attribute(
                    "outline",
                    Node::call("darken", vec![Node::var_ref("base"), Node::number(100.0)]),
                ),
            ],
        ),
    ]);
    let styl = parse_stylesheet(&tree).unwrap();
    let rule = styl.rules.get(0).unwrap();
    assert_eq!(rule.attr("fill"), Some(&Value::Color(Color::rgba(15, 25, 35, 255))));
    assert_eq!(rule.attr("outline"), Some(&Value::Color(Color::BLACK)));
}

#[test]
fn test_color_arithmetic_is_clamped() {
    let colors = [
        Color::rgba(0, 0, 0, 0),
        Color::rgba(255, 255, 255, 255),
        Color::rgba(200, 100, 7, 128),
        Color::rgba(3, 250, 99, 1),
    ];
    let ops: [fn(Node, Node) -> Node; 4] = [Node::add, Node::sub, Node::mult, Node::div];

    for a in colors {
        for b in colors {
            for op in ops {
                let tree = Node::stylesheet(vec![Node::map_style(vec![Node::attribute(
                    "c",
                    op(Node::color(a), Node::color(b)),
                )])]);
                let styl = parse_stylesheet(&tree).unwrap();
                assert!(matches!(styl.map_style.get("c"), Some(Value::Color(_))));
            }
        }
    }
}

#[test]
fn test_type_mismatch_aborts() {
    let tree = Node::stylesheet(vec![
        Node::style(vec![sel(".ok")], vec![]),
        Node::style(
            vec![sel(".bad")],
            vec![Node::attribute("w", Node::sub(Node::string("a"), Node::color(Color::WHITE)))],
        ),
    ]);
    let err = parse_stylesheet(&tree).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot apply '-' to string and color at <input>:1:1"
    );
}

#[test]
fn test_unknown_function_aborts() {
    let tree = Node::stylesheet(vec![Node::map_style(vec![Node::attribute(
        "x",
        Node::call("brighten", vec![Node::number(1.0)]),
    )])]);
    assert!(matches!(
        parse_stylesheet(&tree),
        Err(StyleError::UnknownFunction { ref name, .. }) if name == "brighten"
    ));
}

// ============================================================================
// Cascade modes
// ============================================================================

fn cascade_tree() -> Node {
    Node::stylesheet(vec![
        Node::style(
            vec![sel("#roads")],
            vec![
                Node::attribute("line-color", Node::color(Color::BLACK)),
                Node::attribute("line-width", Node::number(1.0)),
            ],
        ),
        Node::style(
            vec![sel("#roads")],
            vec![Node::style(
                vec![sel(".major")],
                vec![Node::attribute("line-width", Node::number(4.0))],
            )],
        ),
    ])
}

#[test]
fn test_distinct_cascade_keeps_rules_separate() {
    let styl = StylesheetBuilder::new()
        .parse_stylesheet(&cascade_tree(), StyleEnv::new())
        .unwrap();
    let major = rule_named(&styl.rules, "#roads.major");
    assert_eq!(major.attrs.len(), 1);
    assert_eq!(major.attr("line-color"), None);
}

#[test]
fn test_inherit_cascade_fills_gaps() {
    init_tracing();
    let styl = StylesheetBuilder::new()
        .cascade_mode(CascadeMode::Inherit)
        .parse_stylesheet(&cascade_tree(), StyleEnv::new())
        .unwrap();
    let major = rule_named(&styl.rules, "#roads.major");
    assert_eq!(major.attr("line-color"), Some(&Value::Color(Color::BLACK)));
    assert_eq!(major.attr("line-width"), Some(&Value::Double(4.0)));
}
