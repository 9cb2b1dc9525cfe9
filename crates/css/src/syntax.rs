// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

impl Declaration {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            value: value.trim().to_string(),
        }
    }
}

// input: "color: red; font-size: 12px;"
// output: vec![Declaration { name: "color", value: "red" }, Declaration { name: "font-size", value: "12px" }]
//
// Declarations without a name or a value are dropped.
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    input
        .split(';')
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() || !name.chars().all(is_name_char) {
                return None;
            }
            let value = v.trim().to_string();
            if value.is_empty() {
                return None;
            }
            Some(Declaration { name, value })
        })
        .collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

// input: [Declaration { name: "text-align", value: "center" }, ...]
// output: "text-align: center; float: left"
pub fn write_declarations(declarations: &[Declaration]) -> String {
    let mut out = String::new();
    for (i, d) in declarations.iter().enumerate() {
        if i != 0 {
            out.push_str("; ");
        }
        out.push_str(&d.name);
        out.push_str(": ");
        out.push_str(&d.value);
    }
    out
}

// Replaces every declaration of `name` with a single one at the position of the first, or
// appends it when absent.
pub fn set_declaration(declarations: &mut Vec<Declaration>, name: &str, value: &str) {
    let decl = Declaration::new(name, value);
    match declarations.iter().position(|d| d.name == decl.name) {
        Some(first) => {
            declarations[first].value = decl.value.clone();
            let mut index = 0;
            declarations.retain(|d| {
                let keep = index == first || d.name != decl.name;
                index += 1;
                keep
            });
        }
        None => declarations.push(decl),
    }
}
