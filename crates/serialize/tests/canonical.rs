use dom::Node;
use serialize::{SerializeOptions, serialize, serialize_children};
use test_support::{br, el, el_attrs, load, text};

fn render(node: &Node) -> String {
    let (doc, root) = load(node);
    serialize(&doc, root, &SerializeOptions::default()).unwrap()
}

fn sections() -> Node {
    el(
        "div",
        vec![
            el("p", vec![text("a")]),
            el("h1", vec![text("b")]),
            el("p", vec![text("c")]),
        ],
    )
}

#[test]
fn block_children_go_on_their_own_lines() {
    assert_eq!(
        render(&sections()),
        "<div>\n\t<p>a</p>\n\t<h1>b</h1>\n\t<p>c</p>\n</div>"
    );
}

#[test]
fn inner_form_drops_the_container() {
    let (doc, root) = load(&sections());
    assert_eq!(
        serialize_children(&doc, root, &SerializeOptions::default()).unwrap(),
        "<p>a</p>\n<h1>b</h1>\n<p>c</p>"
    );
}

#[test]
fn indented_blocks_are_separated_by_a_blank_line() {
    let tree = el(
        "div",
        vec![
            el("div", vec![el("p", vec![text("a")])]),
            el("div", vec![el("p", vec![text("b")])]),
        ],
    );
    assert_eq!(
        render(&tree),
        "<div>\n\t<div>\n\t\t<p>a</p>\n\t</div>\n\n\t<div>\n\t\t<p>b</p>\n\t</div>\n</div>"
    );
}

#[test]
fn list_items_nest_under_the_list() {
    let tree = el(
        "ul",
        vec![el("li", vec![text(" one ")]), el("li", vec![text("two\n")])],
    );
    assert_eq!(render(&tree), "<ul>\n\t<li>one</li>\n\t<li>two</li>\n</ul>");
}

#[test]
fn breaks_stay_inline() {
    let tree = el("p", vec![text("a"), br(), text("b")]);
    assert_eq!(render(&tree), "<p>a<br />b</p>");
}

#[test]
fn markup_characters_are_escaped() {
    let tree = el_attrs(
        "a",
        &[("href", "/q?a=1&b=\"2\""), ("title", "caf\u{e9}")],
        vec![text("1 < 2 & 3 > 2 \u{20ac}\u{2014}")],
    );
    assert_eq!(
        render(&tree),
        "<a href=\"/q?a=1&amp;b=&quot;2&quot;\" title=\"caf&eacute;\">1 &lt; 2 &amp; 3 &gt; 2 &euro;&#8212;</a>"
    );
}

#[test]
fn non_ascii_can_be_written_as_is() {
    let tree = el("p", vec![text("caf\u{e9} & co")]);
    let (doc, root) = load(&tree);
    let options = SerializeOptions {
        escape_non_ascii: false,
        ..SerializeOptions::default()
    };
    assert_eq!(
        serialize(&doc, root, &options).unwrap(),
        "<p>caf\u{e9} &amp; co</p>"
    );
}

#[test]
fn custom_indent_and_html_empty_tags() {
    let options: SerializeOptions = toml::from_str("xhtml = false\nindent = \"  \"").unwrap();
    assert!(options.escape_non_ascii);
    let tree = el("div", vec![el("p", vec![text("x"), br()])]);
    let (doc, root) = load(&tree);
    assert_eq!(
        serialize(&doc, root, &options).unwrap(),
        "<div>\n  <p>x<br></p>\n</div>"
    );
}

#[test]
fn unknown_option_is_rejected() {
    assert!(toml::from_str::<SerializeOptions>("pretty = true").is_err());
}

#[test]
fn output_is_deterministic() {
    let tree = el(
        "body",
        vec![
            el("h2", vec![text("Title")]),
            el(
                "table",
                vec![el("tr", vec![el("td", vec![el("p", vec![text("cell")])])])],
            ),
        ],
    );
    let first = render(&tree);
    assert_eq!(first, render(&tree));
    assert!(first.starts_with("<body>\n\t<h2>Title</h2>\n\t<table>\n\t\t<tr>\n"));
}
