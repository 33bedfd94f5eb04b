/// Collapse repeated slashes and drop any trailing slash.
pub fn squeeze_path(pth: &str) -> String {
    let mut out = String::with_capacity(pth.len());
    let mut last = None;
    for c in pth.chars() {
        if c == '/' && last == Some('/') {
            continue;
        }
        out.push(c);
        last = Some(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

pub fn expand_string(val: &Option<String>) -> String {
    match *val {
        None => String::new(),
        Some(ref x) => x.to_owned(),
    }
}

/// Join a path below the organization's root, e.g. `nodes/web1` for `acme`
/// becomes `/organizations/acme/nodes/web1`.
pub fn organization_path(organization: &str, path: &str) -> String {
    squeeze_path(&format!("/organizations/{}/{}", organization, path))
}
