//! Engine behavior on whole pages.

use insta::assert_snapshot;
use pattr_armature::{inner_html, parse};
use pattr_atelier::{
    DirectiveContext, Engine, EngineError, EngineOptions, Event, FetchError, Modifiers,
};
use pattr_croquis::{ScopeId, ScopeKind, Value};
use pattr_relief::NodeId;

fn options() -> EngineOptions {
    EngineOptions {
        root_id: Some("app".into()),
        ..EngineOptions::default()
    }
}

fn load(source: &str) -> Engine {
    let (doc, _) = parse(source);
    Engine::new(doc, options()).unwrap()
}

fn hydrated(source: &str) -> Engine {
    let mut engine = load(source);
    engine.hydrate().unwrap();
    engine
}

fn by_id(engine: &Engine, id: &str) -> NodeId {
    engine.document().get_element_by_id(id).unwrap()
}

fn inner(engine: &Engine, id: &str) -> String {
    inner_html(engine.document(), by_id(engine, id))
}

fn scope(engine: &Engine, id: &str) -> ScopeId {
    engine.scope_of(by_id(engine, id)).unwrap()
}

#[test]
fn test_derived_scope_follows_parent() {
    let mut engine = hydrated(
        r#"<div id="app">
  <section id="a" p-data="doubled = count * 2"><span id="out" p-text="doubled"></span></section>
  <section id="b" p-data="label = title"><span id="label" p-text="label"></span></section>
</div>
<script id="p-root-data" type="application/json">{"count": 1, "title": "x"}</script>"#,
    );
    assert_eq!(inner(&engine, "out"), "2");
    assert_eq!(inner(&engine, "label"), "x");

    let a = scope(&engine, "a");
    let b = scope(&engine, "b");
    let report = engine.set(ScopeId::ROOT, "count", Value::from(5)).unwrap();
    assert_eq!(inner(&engine, "out"), "10");
    assert_eq!(report.rerun_for(a), Some(&[0][..]));
    assert_eq!(report.rerun_for(b), None);
    assert_eq!(report.suppressed, 0);

    // Nothing changed: nothing re-runs
    let report = engine.refresh_all().unwrap();
    assert!(report.rerun.is_empty());
    assert_eq!(inner(&engine, "out"), "10");
}

#[test]
fn test_self_referencing_definition_is_idempotent() {
    let mut engine = hydrated(
        r#"<div id="app"><p id="s" p-data="count = count * 2" p-text="count"></p></div>
<script id="p-root-data">{"count": 3}</script>"#,
    );
    assert_eq!(inner(&engine, "s"), "6");
    engine.refresh_all().unwrap();
    engine.refresh_all().unwrap();
    assert_eq!(inner(&engine, "s"), "6");

    engine.set(ScopeId::ROOT, "count", Value::from(4)).unwrap();
    assert_eq!(inner(&engine, "s"), "8");
}

#[test]
fn test_writes_stay_local() {
    let mut engine = hydrated(
        r#"<div id="app"><section id="s" p-data="x = 1"><button id="btn" @click="title = 'mine'"></button><i id="t" p-text="title"></i></section><b id="root" p-text="title"></b></div>
<script id="p-root-data">{"title": "page"}</script>"#,
    );
    let btn = by_id(&engine, "btn");
    engine.dispatch(btn, &Event::new("click")).unwrap();
    assert_eq!(inner(&engine, "t"), "mine");
    assert_eq!(inner(&engine, "root"), "page");
    assert_eq!(engine.get(ScopeId::ROOT, "title"), Value::from("page"));
}

#[test]
fn test_scope_tree_dump() {
    let engine = hydrated(
        r#"<div id="app"><section p-data="doubled = count * 2"></section></div><script id="p-root-data">{"count": 1}</script>"#,
    );
    assert_snapshot!(engine.scopes().to_display(), @r#"
    @0 root
      data: {count=1}
      @1 defined key=#0 element=#2
        defining: doubled = count * 2
        data: {doubled=2}
        snapshot: {count=1}
    "#);
}

#[test]
fn test_partial_hydration_on_fetch_failure() {
    let mut engine = hydrated(
        r#"<div id="app">
  <p id="top" p-text="title"></p>
  <section id="remote" p-src="/cart.json"><span id="total" p-text="total">-</span><button id="btn" @click="total = 1"></button></section>
  <section id="user" p-src="/user.json" p-data="greeting = 'hi ' + name"><span id="greet" p-text="greeting"></span></section>
</div>
<script id="p-root-data">{"title": "Shop"}</script>"#,
    );
    assert_eq!(inner(&engine, "top"), "Shop");
    assert_eq!(engine.pending().len(), 2);
    assert!(!engine.is_bound(by_id(&engine, "remote")));
    assert!(!engine.is_bound(by_id(&engine, "greet")));

    let source = |url: &str| match url {
        "/user.json" => Ok(r#"{"name": "Ada"}"#.to_string()),
        other => Err(FetchError::NotFound(other.to_string())),
    };
    let loaded = engine.load_pending(&source);
    assert_eq!(loaded, vec![by_id(&engine, "user")]);
    assert_eq!(engine.failed(), vec![by_id(&engine, "remote")]);
    assert!(engine.pending().is_empty());

    assert_eq!(inner(&engine, "greet"), "hi Ada");
    let user = scope(&engine, "user");
    assert_eq!(engine.scopes().scope(user).kind, ScopeKind::Remote);

    // The failed subtree stays unbound: no text, no listeners
    assert!(!engine.is_bound(by_id(&engine, "total")));
    assert_eq!(inner(&engine, "total"), "-");
    let report = engine
        .dispatch(by_id(&engine, "btn"), &Event::new("click"))
        .unwrap();
    assert_eq!(report.handlers, 0);
    engine.refresh_all().unwrap();
    assert_eq!(inner(&engine, "total"), "-");
}

#[test]
fn test_resolve_pending() {
    let mut engine = hydrated(
        r#"<div id="app"><section id="r" p-src="/r.json"><b id="v" p-text="v"></b></section></div>"#,
    );
    let r = by_id(&engine, "r");
    let report = engine
        .resolve_pending(r, Ok("not json".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(report.visited, 2);
    assert!(engine.is_bound(by_id(&engine, "v")));
    assert_eq!(inner(&engine, "v"), "");

    assert!(matches!(
        engine.resolve_pending(r, Ok("{}".to_string())),
        Err(EngineError::NotPending(_))
    ));
}

#[test]
fn test_directive_write_is_suppressed_inside_refresh() {
    let (doc, _) = parse(
        r#"<div id="app"><section id="s" p-data="x = 1"><i id="c" p-count="renders"></i></section></div>"#,
    );
    let mut engine = Engine::new(doc, options()).unwrap();
    engine.directives_mut().register(
        "p-count",
        |ctx: &mut DirectiveContext<'_>, value: &Value, _: &Modifiers| {
            let n = if value.is_truthy() { value.to_number() } else { 0.0 };
            ctx.set("renders", Value::from(n + 1.0));
        },
    );

    let report = engine.hydrate().unwrap();
    assert_eq!(report.suppressed, 1);
    let s = scope(&engine, "s");
    assert_eq!(engine.get(s, "renders"), Value::from(1));

    let report = engine.refresh(by_id(&engine, "s")).unwrap();
    assert_eq!(report.directives, 1);
    assert_eq!(report.suppressed, 1);
    assert_eq!(engine.get(s, "renders"), Value::from(2));
}

#[test]
fn test_assignment_in_directive_expression_is_suppressed() {
    let mut engine = hydrated(
        r#"<div id="app"><p id="t" p-text="seen = seen + 1"></p></div><script id="p-root-data">{"seen": 0}</script>"#,
    );
    assert_eq!(inner(&engine, "t"), "1");

    let report = engine.refresh_all().unwrap();
    assert_eq!(report.suppressed, 1);
    assert_eq!(inner(&engine, "t"), "2");
}

#[test]
fn test_event_modifiers() {
    let mut engine = hydrated(
        r#"<div id="app">
  <div id="outer" @click="outer = outer + 1">
    <button id="inc" @click="count++" p-on:click.once="once = once + 1"></button>
    <button id="stop" @click.stop="count += 10"></button>
    <span id="self" @click.self="selfHits++"><b id="inner"></b></span>
  </div>
  <p id="count" p-text="count"></p>
</div>
<script id="p-root-data">{"count": 0, "outer": 0, "once": 0, "selfHits": 0}</script>"#,
    );
    let click = Event::new("click");
    let inc = by_id(&engine, "inc");

    let report = engine.dispatch(inc, &click).unwrap();
    assert_eq!(report.handlers, 3);
    assert_eq!(report.refreshes.len(), 3);
    let report = engine.dispatch(inc, &click).unwrap();
    assert_eq!(report.handlers, 2);
    assert_eq!(inner(&engine, "count"), "2");
    assert_eq!(engine.get(ScopeId::ROOT, "once"), Value::from(1));
    assert_eq!(engine.get(ScopeId::ROOT, "outer"), Value::from(2));

    let report = engine.dispatch(by_id(&engine, "stop"), &click).unwrap();
    assert_eq!(report.handlers, 1);
    assert_eq!(inner(&engine, "count"), "12");
    assert_eq!(engine.get(ScopeId::ROOT, "outer"), Value::from(2));

    engine.dispatch(by_id(&engine, "inner"), &click).unwrap();
    assert_eq!(engine.get(ScopeId::ROOT, "selfHits"), Value::from(0));
    assert_eq!(engine.get(ScopeId::ROOT, "outer"), Value::from(3));
    engine.dispatch(by_id(&engine, "self"), &click).unwrap();
    assert_eq!(engine.get(ScopeId::ROOT, "selfHits"), Value::from(1));
    assert_eq!(engine.get(ScopeId::ROOT, "outer"), Value::from(4));

    // Unrelated events run nothing
    let report = engine.dispatch(inc, &Event::new("keyup")).unwrap();
    assert_eq!(report.handlers, 0);
}

#[test]
fn test_model_binding() {
    let mut engine = hydrated(
        r#"<div id="app"><input id="age" p-model:number="age"><input id="name" p-model:trim="user.name"><p id="out" p-text="user.name + ':' + age"></p></div>
<script id="p-root-data">{"age": 1, "user": {"name": "a"}}</script>"#,
    );
    let age = by_id(&engine, "age");
    let name = by_id(&engine, "name");
    assert_eq!(engine.document().value(age), Some("1"));
    assert_eq!(inner(&engine, "out"), "a:1");

    engine.dispatch(age, &Event::input("42")).unwrap();
    assert_eq!(engine.get(ScopeId::ROOT, "age"), Value::from(42));
    assert_eq!(inner(&engine, "out"), "a:42");

    engine.dispatch(name, &Event::input("  Bo ")).unwrap();
    assert_eq!(inner(&engine, "out"), "Bo:42");
    assert_eq!(engine.document().value(name), Some("Bo"));

    engine.dispatch(age, &Event::input("4x")).unwrap();
    assert_eq!(engine.get(ScopeId::ROOT, "age"), Value::from("4x"));
}

#[test]
fn test_local_write_does_not_shadow_parent_on_re_run() {
    let mut engine = hydrated(
        r#"<div id="app"><section id="s" p-data="a = x + 1"><button id="btn" @click="x = 100"></button><b id="out" p-text="a"></b></section></div>
<script id="p-root-data">{"x": 1}</script>"#,
    );
    let section = scope(&engine, "s");
    engine.dispatch(by_id(&engine, "btn"), &Event::new("click")).unwrap();
    assert_eq!(engine.get(section, "x"), Value::from(100));
    assert_eq!(engine.get(section, "a"), Value::from(2));

    engine.set(ScopeId::ROOT, "x", Value::from(2)).unwrap();
    assert_eq!(engine.get(section, "a"), Value::from(3));
    assert_eq!(inner(&engine, "out"), "3");
}

#[test]
fn test_local_data_wins() {
    let engine = hydrated(
        r#"<div id="app"><p id="t" p-text="theme + '/' + count"></p></div>
<script id="p-root-data">{"count": 3, "theme": "light"}</script>
<script id="p-local-data">{"theme": "dark"}</script>"#,
    );
    assert_eq!(inner(&engine, "t"), "dark/3");
}

#[test]
fn test_malformed_root_data_hydrates_empty() {
    let engine = hydrated(
        r#"<div id="app"><p id="t" p-text="count"></p><p id="u" p-text="missing.deep"></p><p id="v" p-text="1 +">x</p></div>
<script id="p-root-data">{oops</script>"#,
    );
    assert_eq!(inner(&engine, "t"), "");
    // Evaluation failures leave the element alone
    assert_eq!(inner(&engine, "v"), "x");
    assert!(engine.raw_data().data.is_empty());
}

#[test]
fn test_raw_data_keys() {
    let engine = hydrated(
        r#"<div id="app">
  <section p-data="a = 1"></section>
  <section id="cart" p-id="cart" p-data="b = 2"><div p-data="c = 3"></div></section>
  <section p-id="cart" p-scope="d = 4"></section>
</div>
<script id="p-root-data">{"count": 1, "_p_children": {"cart": {"items": 2}}}</script>"#,
    );
    assert_snapshot!(
        serde_json::to_string(engine.raw_data()).unwrap(),
        @r##"{"data":{"count":1},"children":{"#0":{"defining":"a = 1"},"cart":{"data":{"items":2},"defining":"b = 2","children":{"#0":{"defining":"c = 3"}}},"cart~1":{"defining":"d = 4"}}}"##
    );

    let cart = scope(&engine, "cart");
    assert_eq!(engine.scopes().scope(cart).key, "cart");
    assert_eq!(engine.get(cart, "items"), Value::from(2));
    assert_eq!(engine.get(cart, "b"), Value::from(2));
}

#[test]
fn test_injected_html_is_not_hydrated() {
    let mut engine = hydrated(
        r#"<div id="app"><div id="host" p-html="snippet"></div></div>
<script id="p-root-data">{"snippet": "<b id=\"inj\" p-text=\"boom\">kept</b>", "boom": "x"}</script>"#,
    );
    assert_eq!(inner(&engine, "host"), r#"<b id="inj" p-text="boom">kept</b>"#);
    assert!(!engine.is_bound(by_id(&engine, "inj")));

    engine.refresh_all().unwrap();
    assert_eq!(inner(&engine, "inj"), "kept");
}

#[test]
fn test_lifecycle_errors() {
    let mut engine = load(r#"<div id="app"></div>"#);
    assert!(matches!(
        engine.set(ScopeId::ROOT, "x", Value::Null),
        Err(EngineError::NotHydrated)
    ));
    engine.hydrate().unwrap();
    assert!(matches!(engine.hydrate(), Err(EngineError::AlreadyHydrated)));
    assert!(matches!(
        engine.set(ScopeId::new(9), "x", Value::Null),
        Err(EngineError::UnknownScope(_))
    ));

    let (doc, _) = parse("<main></main>");
    assert!(matches!(
        Engine::new(doc, options()),
        Err(EngineError::RootNotFound(_))
    ));
}
