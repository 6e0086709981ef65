//! Operations on the opaque SwigType-alike encoded type string.
//! Fragments are concatenated prefix tokens read outer-to-inner
//! from the front of the string, terminating in a base name that may itself
//! carry a template-argument suffix (`Name<(A,B)>`).
//!
//! Recognized fragments: `q(X).` qualifier, `p.` pointer, `r.` reference,
//! `a(N).` array, `f(X,Y).` function, `v.` variadic marker.

/// Splits a paren-delimited fragment starting at `rest[tag_len..]` (which
/// must be `(`), honoring nested parens so template arguments inside a
/// fragment (`f(p.Box<(int)>.).`) don't terminate the scan early. Returns
/// the fragment text (including the trailing `.`) and its byte length.
fn read_paren_fragment(rest: &str, tag_len: usize) -> Option<(String, usize)> {
    let bytes = rest.as_bytes();
    if bytes.get(tag_len) != Some(&b'(') {
        return None;
    }
    let mut depth = 0i32;
    let mut i = tag_len;
    loop {
        match bytes.get(i)? {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        Some((rest[..i].to_string(), i))
    } else {
        None
    }
}

/// Returns the prefix fragments (front-to-back, i.e. outermost first) and
/// the base remainder.
pub fn split(t: &str) -> (Vec<String>, String) {
    let mut frags = Vec::new();
    let mut rest = t;
    loop {
        if let Some(stripped) = rest.strip_prefix("p.") {
            frags.push("p.".to_string());
            rest = stripped;
            continue;
        }
        if let Some(stripped) = rest.strip_prefix("r.") {
            frags.push("r.".to_string());
            rest = stripped;
            continue;
        }
        if let Some(stripped) = rest.strip_prefix("v.") {
            frags.push("v.".to_string());
            rest = stripped;
            continue;
        }
        if rest.starts_with("q(")
            && let Some((frag, len)) = read_paren_fragment(rest, 1)
        {
            frags.push(frag);
            rest = &rest[len..];
            continue;
        }
        if rest.starts_with("a(")
            && let Some((frag, len)) = read_paren_fragment(rest, 1)
        {
            frags.push(frag);
            rest = &rest[len..];
            continue;
        }
        if rest.starts_with("f(")
            && let Some((frag, len)) = read_paren_fragment(rest, 1)
        {
            frags.push(frag);
            rest = &rest[len..];
            continue;
        }
        break;
    }
    (frags, rest.to_string())
}

pub fn fragments(t: &str) -> Vec<String> {
    split(t).0
}

pub fn base(t: &str) -> String {
    split(t).1
}

pub fn prefix(t: &str) -> String {
    split(t).0.concat()
}

/// The fragment closest to the base (the last one encountered walking
/// outer-to-inner), e.g. `last("p.a(10).int") == "a(10)."`.
pub fn last(t: &str) -> String {
    split(t).0.last().cloned().unwrap_or_default()
}

pub fn is_variadic(t: &str) -> bool {
    t.starts_with("v.")
}

pub fn del_variadic(t: &str) -> String {
    t.strip_prefix("v.").unwrap_or(t).to_string()
}

/// Tests whether a single fragment token (as returned by [`fragments`]) is
/// a qualifier fragment. Used by the post-processor to separate
/// qualifier/array fragments from the rest of a type's prefix.
pub fn is_qualifier(fragment: &str) -> bool {
    fragment.starts_with("q(")
}

pub fn is_array(fragment: &str) -> bool {
    fragment.starts_with("a(")
}

pub fn is_function(t: &str) -> bool {
    last(t).starts_with("f(")
}

pub fn is_template(t: &str) -> bool {
    base(t).contains('<')
}

/// The base name with any `<(...)>` template-argument suffix stripped.
pub fn templateprefix(t: &str) -> String {
    let b = base(t);
    match b.find('<') {
        Some(i) => b[..i].to_string(),
        None => b,
    }
}

fn paren_inner(fragment: &str) -> &str {
    let start = fragment.find('(').map(|i| i + 1).unwrap_or(0);
    let end = fragment.rfind(')').unwrap_or(fragment.len());
    &fragment[start..end]
}

/// Parses the comma-separated argument list out of a base name's
/// `<(...)>` suffix, splitting only on top-level commas.
pub fn template_args(base: &str) -> Vec<String> {
    let Some(open) = base.find("<(") else {
        return Vec::new();
    };
    let Some(close) = base.rfind(")>") else {
        return Vec::new();
    };
    if close <= open + 2 {
        return Vec::new();
    }
    let inner = &base[open + 2..close];
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth -= 1,
            ',' if depth == 0 => {
                args.push(inner[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].to_string());
    args
}

/// Mutates `t` by appending a `<(parms)>` template-argument suffix.
pub fn add_template(t: &mut String, parms: &str) {
    t.push_str("<(");
    t.push_str(parms);
    t.push_str(")>");
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replaces whole-identifier occurrences of `name` with `value`, never
/// matching inside a longer identifier. Assumes `s` is an ASCII encoded
/// type/identifier string, which holds throughout this domain.
pub fn identifier_replace(s: &str, name: &str, value: &str) -> String {
    if name.is_empty() {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let name_bytes = name.as_bytes();
    let nlen = name_bytes.len();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(name_bytes) {
            let before_ok = i == 0 || !is_ident_byte(bytes[i - 1]);
            let after = i + nlen;
            let after_ok = after >= bytes.len() || !is_ident_byte(bytes[after]);
            if before_ok && after_ok {
                out.push_str(value);
                i = after;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

pub fn typename_replace(t: &mut String, name: &str, value: &str) {
    *t = identifier_replace(t, name, value);
}

/// Guards against any remaining `v.`-marked fragment referencing the pack
/// formal once pack expansion has already run elsewhere in the tree.
pub fn variadic_replace(t: &mut String, pack_formal: &str, pack_actuals: &[String]) {
    if !t.contains(pack_formal) {
        return;
    }
    let joined = pack_actuals.join(",");
    *t = identifier_replace(t, pack_formal, &joined);
    if let Some(stripped) = t.strip_prefix("v.") {
        *t = stripped.to_string();
    }
}

/// Renders a "display" declarator string used by code substitutions
/// (the stand-in for SWIG's `SwigType_str`).
pub fn str_display(t: &str) -> String {
    let (frags, base) = split(t);
    let mut cur = base;
    for f in frags.iter().rev() {
        if f.starts_with("q(") {
            cur = format!("{} {cur}", paren_inner(f));
        } else if f.starts_with("a(") {
            cur = format!("{cur}[{}]", paren_inner(f));
        } else if f.starts_with("f(") {
            cur = format!("{cur}({})", paren_inner(f));
        } else if f == "p." {
            cur = format!("{cur} *");
        } else if f == "r." {
            cur = format!("{cur} &");
        }
        // "v." carries no display form of its own.
    }
    cur
}
