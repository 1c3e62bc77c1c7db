use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::{Context, Handler, InvokePolicy, ParamStyle, TypeKey};
use crate::params::{Params, ParamsReceiver, PathParams};
use crate::Request;

fn request(path: &str) -> Request {
    http::Request::builder().uri(path).body(Vec::new()).unwrap()
}

type Trace = Arc<Mutex<Vec<&'static str>>>;

fn tracer(trace: &Trace, label: &'static str) -> Handler {
    let trace = Arc::clone(trace);
    Handler::unit(move || trace.lock().unwrap().push(label))
}

fn run(ctx: &mut Context, handlers: Vec<Handler>) {
    ctx.set_handlers(Arc::from(handlers));
    ctx.next();
}

#[derive(Debug, Clone, PartialEq)]
struct User(&'static str);

#[test]
fn test_store_is_single_slot_per_key() {
    let mut ctx = Context::new(request("/"));
    assert!(ctx.value::<User>().is_none());

    ctx.map(User("ann"));
    ctx.map(User("bob"));
    assert_eq!(ctx.value::<User>(), Some(&User("bob")));

    ctx.map_to(TypeKey::of::<str>(), String::from("keyed"));
    let stored = ctx.get(TypeKey::of::<str>()).unwrap();
    assert_eq!(stored.downcast_ref::<String>().map(String::as_str), Some("keyed"));
    assert!(ctx.value::<String>().is_none());

    ctx.value_mut::<User>().unwrap().0 = "cat";
    assert_eq!(ctx.take::<User>(), Some(User("cat")));
    assert!(ctx.value::<User>().is_none());
}

#[test]
fn test_invoke_reports_unresolved_without_running() {
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);
    let handler = Handler::value(move |_: &User, _rw| *flag.lock().unwrap() = true);

    let mut ctx = Context::new(request("/"));
    assert!(!ctx.invoke(&handler));
    assert!(!*ran.lock().unwrap());

    ctx.map(User("ann"));
    assert!(ctx.invoke(&handler));
    assert!(*ran.lock().unwrap());
}

#[test]
fn test_plain_handlers_advance_until_a_write() {
    let trace = Trace::default();
    let mut ctx = Context::new(request("/"));
    run(
        &mut ctx,
        vec![
            tracer(&trace, "a"),
            tracer(&trace, "b"),
            Handler::http(|_, rw| {
                rw.write_str("done");
            }),
            tracer(&trace, "never"),
        ],
    );
    assert_eq!(*trace.lock().unwrap(), vec!["a", "b"]);
    assert_eq!(ctx.into_response().body(), b"done");
}

#[test]
fn test_context_handler_controls_continuation() {
    let trace = Trace::default();

    let stop = Handler::context(|ctx| {
        ctx.write_str("stopped");
    });
    let mut ctx = Context::new(request("/"));
    run(&mut ctx, vec![stop, tracer(&trace, "after")]);
    assert!(trace.lock().unwrap().is_empty());

    let around = {
        let trace = Arc::clone(&trace);
        Handler::context(move |ctx| {
            trace.lock().unwrap().push("before");
            ctx.next();
            trace.lock().unwrap().push("after next");
        })
    };
    let mut ctx = Context::new(request("/"));
    run(&mut ctx, vec![around, tracer(&trace, "inner")]);
    assert_eq!(*trace.lock().unwrap(), vec!["before", "inner", "after next"]);
}

#[test]
fn test_middleware_passes_values_through_the_store() {
    let auth = Handler::context(|ctx| {
        ctx.map(User("ann"));
        ctx.next();
    });
    let greet = Handler::value(|user: &User, rw| {
        rw.write_str(&format!("hello {}", user.0));
    });

    let mut ctx = Context::new(request("/"));
    run(&mut ctx, vec![auth, greet]);
    assert_eq!(ctx.into_response().body(), b"hello ann");
}

#[test]
fn test_skip_policy_continues_after_unresolved() {
    let trace = Trace::default();
    let mut ctx = Context::new(request("/"));
    assert_eq!(ctx.policy(), InvokePolicy::Skip);
    run(
        &mut ctx,
        vec![
            Handler::value(|_: &User, _rw| {}),
            tracer(&trace, "next"),
        ],
    );
    assert_eq!(*trace.lock().unwrap(), vec!["next"]);
    assert_eq!(ctx.into_response().status(), StatusCode::OK);
}

#[test]
fn test_abort_policy_answers_500() {
    let trace = Trace::default();
    let mut ctx = Context::new(request("/"));
    ctx.set_policy(InvokePolicy::Abort);
    run(
        &mut ctx,
        vec![
            Handler::value(|_: &User, _rw| {}),
            tracer(&trace, "never"),
        ],
    );
    assert!(trace.lock().unwrap().is_empty());
    assert_eq!(
        ctx.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_param_styles() {
    let key: Arc<str> = Arc::from("id");

    let mut values = Context::new(request("/"));
    values.receive(&key, "42", Value::from(42u64));
    assert_eq!(values.style(), ParamStyle::Values);
    assert_eq!(values.param("id").as_deref(), Some("42"));
    assert_eq!(values.params().and_then(|p| p.get("id")), Some(&Value::from(42u64)));
    assert!(values.path_params().is_none());
    assert!(!values.invoke(&Handler::path_params(|_, _| {})));
    assert!(values.invoke(&Handler::params(|_, _| {})));

    let mut text = Context::scene(request("/"));
    text.receive(&key, "42", Value::from(42u64));
    assert_eq!(text.style(), ParamStyle::Text);
    assert_eq!(text.path_params().and_then(|p| p.get("id")), Some("42"));
    assert!(!text.invoke(&Handler::params(|_, _| {})));
    assert!(text.invoke(&Handler::path_params(|_, _| {})));
}

#[test]
fn test_stored_params_win_over_captured() {
    let key: Arc<str> = Arc::from("id");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let params_handler = {
        let seen = Arc::clone(&seen);
        Handler::params(move |p, _rw| {
            seen.lock().unwrap().push(p.get_str("id").unwrap_or_default().into_owned());
        })
    };
    let text_handler = {
        let seen = Arc::clone(&seen);
        Handler::path_params(move |p, _rw| {
            seen.lock().unwrap().push(p.get("id").unwrap_or_default().to_string());
        })
    };

    let mut ctx = Context::new(request("/"));
    ctx.receive(&key, "7", Value::from(7u64));
    let mut rewritten = Params::new();
    rewritten.insert(&key, Value::from("rewritten"));
    ctx.map(rewritten);
    assert!(ctx.invoke(&params_handler));

    // a raw-text context resolves a converted-values handler from the store
    let mut scene = Context::scene(request("/"));
    scene.receive(&key, "7", Value::from(7u64));
    assert!(!scene.invoke(&params_handler));
    scene.map(Params::new());
    assert!(scene.invoke(&params_handler));

    let mut values = Context::new(request("/"));
    let mut text = PathParams::new();
    text.insert(&key, "from-store");
    values.map(text);
    assert!(values.invoke(&text_handler));

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["rewritten".to_string(), String::new(), "from-store".to_string()]
    );
}

#[derive(Debug, Clone, Deserialize)]
struct Repo {
    owner: String,
    repo: String,
}

#[test]
fn test_bind_prefers_store_then_params() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = {
        let seen = Arc::clone(&seen);
        Handler::bind(move |r: Repo, _rw| {
            seen.lock().unwrap().push(format!("{}/{}", r.owner, r.repo));
        })
    };

    let mut ctx = Context::scene(request("/"));
    assert!(!ctx.invoke(&handler));

    ctx.receive(&Arc::from("owner"), "acme", Value::from("acme"));
    ctx.receive(&Arc::from("repo"), "widget", Value::from("widget"));
    assert!(ctx.invoke(&handler));

    ctx.map(Repo {
        owner: "stored".into(),
        repo: "value".into(),
    });
    assert!(ctx.invoke(&handler));

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["acme/widget".to_string(), "stored/value".to_string()]
    );
}

#[test]
fn test_handler_labels() {
    assert_eq!(Handler::unit(|| {}).describe(), "unit");
    assert!(Handler::value(|_: &User, _rw| {}).describe().starts_with("value<"));
    assert_eq!(Handler::request(|_| {}).named("audit").describe(), "audit");
}
