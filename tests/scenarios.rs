//! End-to-end coverage for the six named instantiation scenarios and the
//! algorithmic properties an implementation must hold, driven entirely
//! through the public `data`/`engine`/`diagnostics` surface the way a host
//! driver (a parser front end) would use it.

use cordl_templates::data::{NodeType, Parm, SymbolTable, Tree, type_ops};
use cordl_templates::diagnostics::Diagnostic;
use cordl_templates::engine::locator::instantiation_key;
use cordl_templates::engine::partial_match::{does_parm_match, score_candidate, select_best, EXACT_PRIORITY};
use cordl_templates::engine::{arg_preparer, template_expand, Locator};

/// Runs the full pipeline: prepare args, locate, clone, expand. Mirrors
/// what `main.rs`'s `run_instantiate` does against a fixture.
fn instantiate(
    tree: &mut Tree,
    symbols: &mut SymbolTable,
    primary: usize,
    name: &str,
    args: Vec<Parm>,
    symname: Option<&str>,
) -> Result<usize, Vec<Diagnostic>> {
    let global = symbols.global();
    let tparms = arg_preparer::expand_template_parms(&args, tree.get(primary));
    let key = instantiation_key(name, &tparms, symbols, Some(global));

    let mut sink: Vec<Diagnostic> = Vec::new();
    let Some(chosen) = Locator::locate(name, &tparms, symname, Some(global), tree, symbols, &mut sink) else {
        return Err(sink);
    };

    let instance = tree.clone_subtree(chosen);
    let rname = symname.unwrap_or(name);
    template_expand(tree, instance, rname, tparms, Some(global), symbols);

    let record = tree.alloc(NodeType::Other("instance".to_string()));
    tree.get_mut(record).set_node_ref("template", instance);
    tree.get_mut(record).set_bool("named_instantiation", symname.is_some());
    tree.get_mut(record).set_str("name", rname);
    symbols.declare(global, key, record);

    Ok(instance)
}

/// S1: `template<class T> struct Box { T x; Box(const T& v); };` then
/// `%template(IntBox) Box<int>;`.
#[test]
fn s1_simple_class_template() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_str("name", "Box");
    tree.get_mut(primary).set_str("sym:name", "Box");
    tree.get_mut(primary).set_parms("templateparms", vec![Parm::new("T", "")]);

    let field = tree.alloc(NodeType::Cdecl);
    tree.get_mut(field).set_str("type", "T");
    tree.get_mut(field).set_str("name", "x");
    tree.add_child(primary, field);

    let ctor = tree.alloc(NodeType::Constructor);
    tree.get_mut(ctor).set_str("name", "Box");
    tree.get_mut(ctor).set_str("sym:name", "Box");
    tree.get_mut(ctor).set_parms("parms", vec![Parm::new("v", "r.q(const).T")]);
    tree.add_child(primary, ctor);

    symbols.declare(global, "Box", primary);

    let instance = instantiate(&mut tree, &mut symbols, primary, "Box", vec![Parm::anonymous("int")], Some("IntBox"))
        .expect("Box<int> should instantiate cleanly");

    assert_eq!(tree.get(instance).get_str("name"), Some("Box<(int)>"));
    assert_eq!(tree.get(instance).node_type, NodeType::Class);
    let field_clone = tree.get(instance).children[0];
    assert_eq!(tree.get(field_clone).get_str("type"), Some("int"));
    let ctor_clone = tree.get(instance).children[1];
    assert_eq!(tree.get(ctor_clone).get_str("name"), Some("Box<(int)>"));
    assert_eq!(tree.get(ctor_clone).get_str("sym:name"), Some("IntBox"));
    let parms = tree.get(ctor_clone).get_parms("parms").unwrap();
    assert_eq!(parms.len(), 1);
    assert_eq!(parms[0].ty, "r.q(const).int");

    // The primary is untouched, so a second, different instantiation still
    // sees the original template shape.
    assert_eq!(tree.get(primary).node_type, NodeType::Template);
    assert_eq!(tree.get(primary).get_str("name"), Some("Box"));
}

/// S2: `template<class... T> struct Tup { Tup(T&... t); };` then
/// `%template(TupAB) Tup<A,B>;`.
#[test]
fn s2_variadic_pack() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_str("name", "Tup");
    tree.get_mut(primary).set_str("sym:name", "Tup");
    tree.get_mut(primary)
        .set_parms("templateparms", vec![Parm::new("T", "v.T")]);

    let ctor = tree.alloc(NodeType::Constructor);
    tree.get_mut(ctor).set_str("name", "Tup");
    tree.get_mut(ctor).set_str("sym:name", "Tup");
    tree.get_mut(ctor).set_parms("parms", vec![Parm::new("t", "v.r.T")]);
    tree.add_child(primary, ctor);

    symbols.declare(global, "Tup", primary);

    let args = vec![Parm::anonymous("A"), Parm::anonymous("B")];
    let instance = instantiate(&mut tree, &mut symbols, primary, "Tup", args, Some("TupAB"))
        .expect("Tup<A,B> should instantiate cleanly");

    let ctor_clone = tree.get(instance).children[0];
    let parms = tree.get(ctor_clone).get_parms("parms").unwrap();
    assert_eq!(parms.len(), 2);
    assert_eq!(parms[0].ty, "r.A");
    assert_eq!(parms[1].ty, "r.B");
    assert!(parms.iter().all(|p| !type_ops::is_variadic(&p.ty)));
}

/// S3: primary `X<T>` plus partials `X<T*>` and `X<const T*>`,
/// instantiated as `X<const int*>`; the stricter partial wins.
#[test]
fn s3_partial_specialization_selection() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_str("name", "X");
    tree.get_mut(primary).set_str("sym:name", "X");
    tree.get_mut(primary).set_parms("templateparms", vec![Parm::new("T", "")]);

    let loose = tree.alloc(NodeType::Template);
    tree.get_mut(loose).set_str("name", "X");
    tree.get_mut(loose).set_str("sym:name", "X");
    tree.get_mut(loose).set_parms("partialparms", vec![Parm::anonymous("p.$1")]);
    let marker_a = tree.alloc(NodeType::Cdecl);
    tree.get_mut(marker_a).set_str("name", "via_pointer");
    tree.add_child(loose, marker_a);

    let strict = tree.alloc(NodeType::Template);
    tree.get_mut(strict).set_str("name", "X");
    tree.get_mut(strict).set_str("sym:name", "X");
    tree.get_mut(strict)
        .set_parms("partialparms", vec![Parm::anonymous("q(const).p.$1")]);
    let marker_b = tree.alloc(NodeType::Cdecl);
    tree.get_mut(marker_b).set_str("name", "via_const_pointer");
    tree.add_child(strict, marker_b);

    tree.get_mut(primary).set_node_list("partials", vec![loose, strict]);
    symbols.declare(global, "X", primary);

    let args = vec![Parm::anonymous("p.q(const).int")];
    let instance = instantiate(&mut tree, &mut symbols, primary, "X", args, None).expect("X<const int*> should match");

    let marker = tree.get(instance).children[0];
    assert_eq!(tree.get(marker).get_str("name"), Some("via_const_pointer"));
}

/// S4: primary `X<T1,T2>` plus partials `X<T1,double*>` and `X<int*,T2>`,
/// instantiated as `X<int*,double*>` — genuinely ambiguous, first wins.
#[test]
fn s4_ambiguous_partials() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_str("name", "X");
    tree.get_mut(primary).set_str("sym:name", "X");
    tree.get_mut(primary)
        .set_parms("templateparms", vec![Parm::new("T1", ""), Parm::new("T2", "")]);

    let first = tree.alloc(NodeType::Template);
    tree.get_mut(first).set_str("name", "X");
    tree.get_mut(first).set_str("sym:name", "X");
    tree.get_mut(first).set_parms(
        "partialparms",
        vec![Parm::anonymous("$1"), Parm::anonymous("p.double")],
    );

    let second = tree.alloc(NodeType::Template);
    tree.get_mut(second).set_str("name", "X");
    tree.get_mut(second).set_str("sym:name", "X");
    tree.get_mut(second).set_parms(
        "partialparms",
        vec![Parm::anonymous("p.int"), Parm::anonymous("$2")],
    );

    tree.get_mut(primary).set_node_list("partials", vec![first, second]);
    symbols.declare(global, "X", primary);

    let args = vec![Parm::anonymous("p.int"), Parm::anonymous("p.double")];
    let mut sink: Vec<Diagnostic> = Vec::new();
    let tparms = arg_preparer::expand_template_parms(&args, tree.get(primary));
    let chosen = Locator::locate("X", &tparms, None, Some(global), &mut tree, &symbols, &mut sink);

    assert_eq!(chosen, Some(first));
    assert_eq!(sink.len(), 1);
    match &sink[0] {
        Diagnostic::AmbiguousPartial { chosen, ignored } => {
            assert_eq!(*chosen, first);
            assert_eq!(ignored, &vec![second]);
        }
        other => panic!("expected AmbiguousPartial, got {other:?}"),
    }
}

/// S5: `template<class K, class C = Less<K>> struct Map {};` then
/// `%template(IntMap) Map<int>;`.
#[test]
fn s5_default_argument_back_reference() {
    let mut tree = Tree::new();
    let symbols = SymbolTable::new();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_parms(
        "templateparms",
        vec![Parm::new("K", ""), Parm::new("C", "").with_value("Less<(K)>")],
    );

    let args = vec![Parm::anonymous("int")];
    let tparms = arg_preparer::expand_template_parms(&args, tree.get(primary));

    assert_eq!(tparms.len(), 2);
    assert_eq!(tparms[0].name.as_deref(), Some("K"));
    assert_eq!(tparms[0].ty, "int");
    assert!(tparms[1].default);
    assert_eq!(tparms[1].value.as_deref(), Some("Less<(int)>"));
    assert!(
        !type_ops::identifier_replace(tparms[1].value.as_ref().unwrap(), "K", "<GONE>").contains("<GONE>"),
        "no free occurrence of K should survive substitution"
    );
}

/// S6: two `%template(IntBox) Box<int>;` in sequence — the second is
/// rejected as a duplicate.
#[test]
fn s6_duplicate_instantiation() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_str("name", "Box");
    tree.get_mut(primary).set_str("sym:name", "Box");
    tree.get_mut(primary).set_parms("templateparms", vec![Parm::new("T", "")]);
    symbols.declare(global, "Box", primary);

    let first = instantiate(
        &mut tree,
        &mut symbols,
        primary,
        "Box",
        vec![Parm::anonymous("int")],
        Some("IntBox"),
    )
    .expect("first instantiation should succeed");
    assert_eq!(tree.get(first).get_str("name"), Some("Box<(int)>"));

    let second = instantiate(
        &mut tree,
        &mut symbols,
        primary,
        "Box",
        vec![Parm::anonymous("int")],
        Some("IntBox"),
    );

    match second {
        Err(diags) => {
            assert!(matches!(diags.last(), Some(Diagnostic::DuplicateInstantiation { .. })));
        }
        Ok(_) => panic!("second IntBox instantiation should have been rejected as a duplicate"),
    }
}

// --- Testable properties (independent of any one scenario) ---------------

/// Property 1: arity law. For a non-variadic primary with `k` required and
/// `n` total parameters, `locate` accepts iff `k <= len(args) <= n`.
#[test]
fn property_arity_law() {
    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let primary = tree.alloc(NodeType::Template);
    tree.get_mut(primary).set_str("templatetype", "class");
    tree.get_mut(primary).set_parms(
        "templateparms",
        vec![Parm::new("A", ""), Parm::new("B", "").with_value("int")],
    );
    symbols.declare(global, "Pair", primary);

    for given in 0..=3usize {
        let mut tree = tree.clone();
        let args: Vec<Parm> = (0..given).map(|_| Parm::anonymous("int")).collect();
        let tparms = arg_preparer::expand_template_parms(&args, tree.get(primary));
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = Locator::locate("Pair", &tparms, None, Some(global), &mut tree, &symbols, &mut sink);

        let in_range = (1..=2).contains(&given);
        assert_eq!(result.is_some(), in_range, "given={given}");
        if !in_range {
            assert!(matches!(sink.last(), Some(Diagnostic::ArityMismatch { .. })));
        }
    }
}

/// Property 4 + permutation half of property 5: `does_parm_match` scores
/// exact matches at `EXACT_PRIORITY`, deduced matches at the matched
/// prefix length, and the winning candidate is independent of row order.
#[test]
fn property_specialization_priority_and_order_independence() {
    let symbols = SymbolTable::new();
    assert_eq!(does_parm_match("int", "int", 1, &symbols, None), Some(EXACT_PRIORITY));
    assert_eq!(
        does_parm_match("p.q(const).int", "q(const).p.$1", 1, &symbols, None),
        Some("q(const).p.".len() as i64)
    );

    let concrete = vec!["p.q(const).int".to_string()];
    let strict = score_candidate(&concrete, &["q(const).p.$1".to_string()], &symbols, None).unwrap();
    let loose = score_candidate(&concrete, &["p.$1".to_string()], &symbols, None).unwrap();

    let forward = select_best(&[strict.clone(), loose.clone()]);
    let backward = select_best(&[loose, strict]);
    assert_eq!(forward.chosen, Some(0));
    assert_eq!(backward.chosen, Some(1));
    assert!(forward.ambiguous_with.is_empty());
    assert!(backward.ambiguous_with.is_empty());
}

/// Property 5: two candidates with identical priority rows are both
/// reported, and the chosen one is the first by discovery order.
#[test]
fn property_ambiguity_symmetry() {
    let symbols = SymbolTable::new();
    let concrete = vec!["p.int".to_string(), "p.double".to_string()];
    let row_a = score_candidate(&concrete, &["$1".to_string(), "p.double".to_string()], &symbols, None).unwrap();
    let row_b = score_candidate(&concrete, &["p.int".to_string(), "$2".to_string()], &symbols, None).unwrap();

    let result = select_best(&[row_a.clone(), row_b.clone()]);
    assert_eq!(result.chosen, Some(0));
    assert_eq!(result.ambiguous_with, vec![1]);

    // Declaration order reversed: the first-declared candidate still wins.
    let reversed = select_best(&[row_b, row_a]);
    assert_eq!(reversed.chosen, Some(0));
    assert_eq!(reversed.ambiguous_with, vec![1]);
}

/// Property 6: the collision guard on `typename_replace` is exercised
/// end-to-end — an unrelated type sharing a name with a template parameter
/// must not get clobbered by substitution.
#[test]
fn property_collision_guard_end_to_end() {
    use cordl_templates::engine::substitute::should_typename_replace;

    let mut tree = Tree::new();
    let mut symbols = SymbolTable::new();
    let global = symbols.global();

    let unrelated = tree.alloc(NodeType::Class);
    tree.get_mut(unrelated).set_str("sym:name", "Node");
    symbols.declare(global, "Node", unrelated);

    // A same-named type that is itself a template should still be replaced.
    let templated = tree.alloc(NodeType::Template);
    tree.get_mut(templated).set_str("sym:name", "Node");
    tree.get_mut(templated).set_str("templatetype", "class");
    let other_scope = symbols.new_scope(global, "ns");
    symbols.declare(other_scope, "Node", templated);

    assert!(!should_typename_replace("Node", "Node", &tree, &symbols, Some(global)));
    assert!(should_typename_replace("Node", "Node", &tree, &symbols, Some(other_scope)));
}
