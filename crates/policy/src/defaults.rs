pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "b", "bdo", "big", "blockquote", "br", "button",
    "caption", "cite", "code", "col", "colgroup", "dd", "del", "div", "dfn", "dl", "dt", "em",
    "fieldset", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd",
    "label", "li", "map", "noscript", "object", "ol", "optgroup", "option", "p", "param", "pre",
    "q", "samp", "script", "select", "small", "span", "strong", "sub", "sup", "table", "tbody",
    "td", "textarea", "tfoot", "th", "thead", "tr", "tt", "u", "ul", "var",
];

pub const DEFAULT_ALLOWED_STYLES: &[&str] = &[
    "text-align",
    "vertical-align",
    "float",
    "direction",
    "display",
    "clear",
    "list-style",
];

pub const DEFAULT_SELF_NESTING_DISALLOWED: &[&str] = &[
    "abbr", "acronym", "address", "area", "b", "br", "button", "caption", "code", "del", "dfn",
    "em", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd",
    "label", "map", "noscript", "option", "p", "param", "pre", "script", "select", "strong", "tt",
    "u", "var",
];
