use serde_json::Value;

use super::{RouteId, RouteIds, Trie};
use crate::error::RouteError;
use crate::filter::FilterRegistry;
use crate::params::{Captures, Params, PathParams};
use crate::pattern::Pattern;

fn build(routes: &[&'static str]) -> (Trie<&'static str>, Vec<RouteId>) {
    let filters = FilterRegistry::default();
    let mut ids = RouteIds::new();
    let mut trie = Trie::new();
    let mut out = Vec::new();
    for route in routes {
        let pattern = Pattern::compile(route, &filters)
            .unwrap_or_else(|e| panic!("compile {route}: {e}"));
        let id = trie
            .insert(&pattern, *route, &mut ids)
            .unwrap_or_else(|e| panic!("insert {route}: {e}"));
        out.push(id);
    }
    (trie, out)
}

fn lookup(trie: &Trie<&'static str>, path: &str) -> (Option<&'static str>, Params) {
    let mut params = Params::new();
    let node = trie.lookup(path, &mut params, None);
    (node.route().copied(), params)
}

#[test]
fn test_every_route_matches_itself() {
    let routes = [
        "/",
        "/hi",
        "/b/",
        "/search/:query",
        "/cmd/:tool/",
        "/src/*filepath",
        "/x",
        "/x/y",
        "/y/",
        "/y/z",
        "/0/:id",
        "/0/:id/1",
        "/1/:id/",
        "/1/:id/2",
        "/aa",
        "/a/",
        "/do",
        "/doc",
        "/doc/go_faq.html",
        "/doc/go1.html",
        "/no/a",
        "/no/b",
        "/api/hello/:name",
        "/empty",
        "/hi/:name/path",
        "/hi/:name/path/to",
        "/:name/path/to",
        "/:name",
        "/:name/path",
        "/hi/**",
    ];
    let (trie, ids) = build(&routes);
    let filters = FilterRegistry::default();

    for (route, id) in routes.iter().zip(&ids) {
        let mut params = Params::new();
        let node = trie.lookup(route, &mut params, None);
        assert_eq!(node.id(), *id, "route {route}");
        assert_eq!(node.pattern(), *route);

        let pattern = Pattern::compile(route, &filters).unwrap();
        for key in pattern.keys() {
            assert!(
                params.get(key).is_some(),
                "missing param {key} for {route}: {params:?}"
            );
        }
    }
}

#[test]
fn test_ids_are_monotonic_from_one() {
    let (trie, ids) = build(&["/a", "/b", "/:c"]);
    assert_eq!(
        ids.iter().map(|id| id.get()).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(trie.len(), 3);
}

#[test]
fn test_edge_split_keeps_identity() {
    let (trie, ids) = build(&["/doc", "/do", "/dog", "/d"]);
    assert_eq!(lookup(&trie, "/doc").0, Some("/doc"));
    assert_eq!(lookup(&trie, "/do").0, Some("/do"));
    assert_eq!(lookup(&trie, "/dog").0, Some("/dog"));
    assert_eq!(lookup(&trie, "/d").0, Some("/d"));
    assert_eq!(trie.lookup("/doc", &mut (), None).id(), ids[0]);
    assert!(trie.lookup("/dot", &mut (), None).is_not_found());
}

#[test]
fn test_multibyte_edges() {
    let (trie, _) = build(&["/é", "/è", "/éa"]);
    assert_eq!(lookup(&trie, "/é").0, Some("/é"));
    assert_eq!(lookup(&trie, "/è").0, Some("/è"));
    assert_eq!(lookup(&trie, "/éa").0, Some("/éa"));
}

#[test]
fn test_static_beats_param_beats_catch_all() {
    let (trie, _) = build(&["/foo", "/:x", "/**"]);
    assert_eq!(lookup(&trie, "/foo").0, Some("/foo"));
    assert_eq!(lookup(&trie, "/bar").0, Some("/:x"));
    assert_eq!(lookup(&trie, "/bar/baz").0, Some("/**"));
}

#[test]
fn test_precedence_applies_below_the_root() {
    let (trie, _) = build(&["/users/new/edit", "/users/:id/edit", "/users/*rest"]);
    assert_eq!(lookup(&trie, "/users/new/edit").0, Some("/users/new/edit"));
    let (route, params) = lookup(&trie, "/users/7/edit");
    assert_eq!(route, Some("/users/:id/edit"));
    assert_eq!(params.get_str("id").as_deref(), Some("7"));
    // static branch fails deeper down, param branch is tried next
    assert_eq!(lookup(&trie, "/users/new/show").0, Some("/users/*rest"));
}

#[test]
fn test_backtracking_discards_abandoned_params() {
    let (trie, _) = build(&["/a/:x/b", "/a/*rest"]);
    let mut captures = Captures::new();
    let node = trie.lookup("/a/1/c", &mut captures, None);
    assert_eq!(node.pattern(), "/a/*rest");
    let names: Vec<_> = captures.iter().map(|c| c.name.to_string()).collect();
    assert_eq!(names, vec!["rest"]);
    assert_eq!(captures.iter().next().map(|c| c.text.as_str()), Some("1/c"));
}

#[test]
fn test_filter_rejection_falls_through() {
    let (trie, _) = build(&["/:x uint", "/abc"]);
    assert_eq!(lookup(&trie, "/abc").0, Some("/abc"));
    let (route, params) = lookup(&trie, "/42");
    assert_eq!(route, Some("/:x uint"));
    assert_eq!(params.get("x"), Some(&Value::from(42u64)));
    assert!(trie.lookup("/abd", &mut (), None).is_not_found());
}

#[test]
fn test_filter_rejection_reaches_catch_all() {
    let (trie, _) = build(&["/n/:id uint", "/n/**"]);
    assert_eq!(lookup(&trie, "/n/12").0, Some("/n/:id uint"));
    let (route, params) = lookup(&trie, "/n/x12");
    assert_eq!(route, Some("/n/**"));
    assert_eq!(params.get_str("*").as_deref(), Some("x12"));
}

#[test]
fn test_bad_params_are_not_found() {
    let (trie, _) = build(&["/:mad uint"]);
    let mut params = Params::new();
    let node = trie.lookup("/123a", &mut params, None);
    assert_eq!(node.id(), RouteId::NOT_FOUND);
    assert!(params.is_empty());
}

#[test]
fn test_catch_all_suffix_may_be_empty() {
    let (trie, _) = build(&["/prefix**"]);
    for (path, rest) in [
        ("/prefix", ""),
        ("/prefix/anything/nested", "/anything/nested"),
        ("/prefixed", "ed"),
    ] {
        let (route, params) = lookup(&trie, path);
        assert_eq!(route, Some("/prefix**"), "path {path}");
        assert_eq!(params.get_str("*").as_deref(), Some(rest), "path {path}");
    }
}

#[test]
fn test_named_catch_all_needs_content() {
    let (trie, _) = build(&["/src/*filepath"]);
    let (route, params) = lookup(&trie, "/src/a/b.rs");
    assert_eq!(route, Some("/src/*filepath"));
    assert_eq!(params.get_str("filepath").as_deref(), Some("a/b.rs"));
    assert!(trie.lookup("/src/", &mut (), None).is_not_found());
}

#[test]
fn test_optional_trailing_slash() {
    let (trie, ids) = build(&["/catch/all/?", "/users/:id/?"]);
    assert_eq!(trie.lookup("/catch/all", &mut (), None).id(), ids[0]);
    assert_eq!(trie.lookup("/catch/all/", &mut (), None).id(), ids[0]);
    assert!(trie.lookup("/catch/all//", &mut (), None).is_not_found());

    let (_, params) = lookup(&trie, "/users/5/");
    assert_eq!(params.get_str("id").as_deref(), Some("5"));
    assert_eq!(trie.lookup("/users/5", &mut (), None).id(), ids[1]);
}

#[test]
fn test_explicit_slash_route_beats_optional_slash() {
    let (trie, _) = build(&["/catch/all/?", "/catch/all/"]);
    assert_eq!(lookup(&trie, "/catch/all/").0, Some("/catch/all/"));
    assert_eq!(lookup(&trie, "/catch/all").0, Some("/catch/all/?"));
}

#[test]
fn test_optional_slash_and_plain_route_stay_distinct() {
    for order in [["/a/?", "/a"], ["/a", "/a/?"]] {
        let (trie, ids) = build(&order);
        assert_ne!(ids[0], ids[1], "{order:?}");
        assert_eq!(trie.len(), 2);
        assert_eq!(lookup(&trie, "/a").0, Some("/a"), "{order:?}");
        assert_eq!(lookup(&trie, "/a/").0, Some("/a/?"), "{order:?}");
    }

    // without the `/?` route, the plain one never accepts the slash
    let (trie, _) = build(&["/a"]);
    assert!(trie.lookup("/a/", &mut (), None).is_not_found());
}

#[test]
fn test_optional_slash_with_explicit_and_plain_routes() {
    let (trie, ids) = build(&["/a/?", "/a", "/a/"]);
    let raw: Vec<u32> = ids.iter().map(|id| id.get()).collect();
    assert_eq!(raw, vec![1, 2, 3]);
    assert_eq!(lookup(&trie, "/a").0, Some("/a"));
    assert_eq!(lookup(&trie, "/a/").0, Some("/a/"));

    let (trie, _) = build(&["/a/?", "/a/"]);
    assert_eq!(lookup(&trie, "/a").0, Some("/a/?"));
    assert_eq!(lookup(&trie, "/a/").0, Some("/a/"));
}

#[test]
fn test_reregistering_optional_slash_keeps_its_identity() {
    let (trie, ids) = build(&["/a/?", "/a", "/a/?"]);
    assert_eq!(ids[0], ids[2]);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(trie.len(), 2);
    let ordered: Vec<_> = trie.routes().into_iter().map(|(_, p, _)| p).collect();
    assert_eq!(ordered, vec!["/a/?", "/a"]);
}

#[test]
fn test_last_registration_wins_with_one_identity() {
    let filters = FilterRegistry::default();
    let mut ids = RouteIds::new();
    let mut trie = Trie::new();
    let pattern = Pattern::compile("/repos/:owner", &filters).unwrap();
    let first = trie.insert(&pattern, "first", &mut ids).unwrap();
    let second = trie.insert(&pattern, "second", &mut ids).unwrap();

    assert_eq!(first, second);
    assert_eq!(ids.issued(), 1);
    assert_eq!(trie.len(), 1);
    let node = trie.lookup("/repos/acme", &mut (), None);
    assert_eq!(node.route().copied(), Some("second"));
}

#[test]
fn test_param_conflicts_are_rejected() {
    let filters = FilterRegistry::default();
    let mut ids = RouteIds::new();
    let mut trie = Trie::new();
    let insert = |trie: &mut Trie<()>, ids: &mut RouteIds, p: &str| {
        trie.insert(&Pattern::compile(p, &filters).unwrap(), (), ids)
    };

    insert(&mut trie, &mut ids, "/u/:id").unwrap();
    insert(&mut trie, &mut ids, "/u/:id/posts").unwrap();
    assert!(matches!(
        insert(&mut trie, &mut ids, "/u/:name"),
        Err(RouteError::Conflict { .. })
    ));
    assert!(matches!(
        insert(&mut trie, &mut ids, "/u/:id uint"),
        Err(RouteError::Conflict { .. })
    ));

    insert(&mut trie, &mut ids, "/f/*path").unwrap();
    assert!(matches!(
        insert(&mut trie, &mut ids, "/f/*file"),
        Err(RouteError::Conflict { .. })
    ));
    assert!(matches!(
        insert(&mut trie, &mut ids, "/f/**"),
        Err(RouteError::Conflict { .. })
    ));
}

#[test]
fn test_raw_text_receiver() {
    let (trie, _) = build(&["/v/:version | v([0-9]+)"]);
    let mut raw = PathParams::new();
    trie.lookup("/v/v12", &mut raw, None);
    assert_eq!(raw.get("version"), Some("v12"));

    let (_, converted) = lookup(&trie, "/v/v12");
    assert_eq!(converted.get_str("version").as_deref(), Some("12"));
}

#[test]
fn test_parameters_are_emitted_in_path_order() {
    let (trie, _) = build(&["/repos/:owner/:repo"]);
    let mut captures = Captures::new();
    let node = trie.lookup("/repos/acme/widget", &mut captures, None);
    assert!(!node.is_not_found());
    let emitted: Vec<_> = captures
        .iter()
        .map(|c| (c.name.to_string(), c.text.clone()))
        .collect();
    assert_eq!(
        emitted,
        vec![
            ("owner".to_string(), "acme".to_string()),
            ("repo".to_string(), "widget".to_string())
        ]
    );
}

#[test]
fn test_discarded_param_matches_without_capture() {
    let (trie, _) = build(&["/foo/prefix:", "/foo/*"]);
    let (route, params) = lookup(&trie, "/foo/prefix*");
    assert_eq!(route, Some("/foo/prefix:"));
    assert!(params.is_empty());
    assert_eq!(lookup(&trie, "/foo/a").0, Some("/foo/*"));
}

#[test]
fn test_empty_trie_and_prefix_only_nodes() {
    let trie: Trie<()> = Trie::new();
    assert!(trie.is_empty());
    assert!(trie.lookup("/", &mut (), None).is_not_found());

    // "/users" exists only as an edge towards "/users/:id"
    let (trie, _) = build(&["/users/:id"]);
    assert!(trie.lookup("/users", &mut (), None).is_not_found());
    assert!(trie.lookup("/users/", &mut (), None).is_not_found());
}

#[test]
fn test_routes_listing() {
    let (trie, _) = build(&["/b", "/a", "/:c"]);
    let listed: Vec<_> = trie.routes().into_iter().map(|(_, p, _)| p).collect();
    assert_eq!(listed, vec!["/b", "/a", "/:c"]);
}
