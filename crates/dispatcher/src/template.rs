//! Path templater
//!
//! Placeholders are substituted in a single left-to-right scan, so text
//! coming from a substituted value is never expanded again. Sanitisation
//! runs once, after substitution.

/// Values available to a path template
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    /// `${hostname}`
    pub hostname: &'a str,
    /// `${check_alias}`
    pub check_alias: &'a str,
    /// `${perf_alias}`
    pub perf_alias: &'a str,
}

impl<'a> PathContext<'a> {
    pub fn new(hostname: &'a str, check_alias: &'a str, perf_alias: &'a str) -> Self {
        Self {
            hostname,
            check_alias,
            perf_alias,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "hostname" => Some(self.hostname),
            "check_alias" => Some(self.check_alias),
            "perf_alias" => Some(self.perf_alias),
            _ => None,
        }
    }
}

/// Substitute placeholders then sanitise
pub fn render_path(template: &str, ctx: &PathContext<'_>) -> String {
    sanitize(&substitute(template, ctx))
}

/// Substitute known placeholders; unknown ones are copied through untouched
pub fn substitute(template: &str, ctx: &PathContext<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => match ctx.lookup(&after[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str("${");
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replace every space and backslash with `_`
pub fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            ' ' | '\\' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sanitizes_substituted_values() {
        let ctx = PathContext::new("web 01", "disk check", "used%");
        assert_eq!(
            render_path("${hostname}/${check_alias}/${perf_alias}", &ctx),
            "web_01/disk_check/used%"
        );
    }

    #[test]
    fn test_backslash_sanitized() {
        let ctx = PathContext::new("host", "disk", r"C:\ used");
        assert_eq!(render_path("${perf_alias}", &ctx), "C:__used");
    }

    #[test]
    fn test_repeated_placeholders() {
        let ctx = PathContext::new("h", "c", "p");
        assert_eq!(
            render_path("${hostname}.${hostname}.${perf_alias}", &ctx),
            "h.h.p"
        );
    }

    #[test]
    fn test_substituted_text_not_reexpanded() {
        let ctx = PathContext::new("${check_alias}", "cpu", "${perf_alias}");
        assert_eq!(
            substitute("${hostname}.${check_alias}", &ctx),
            "${check_alias}.cpu"
        );
        assert_eq!(substitute("${perf_alias}", &ctx), "${perf_alias}");
    }

    #[test]
    fn test_missing_and_unknown_placeholders() {
        let ctx = PathContext::new("h", "c", "p");
        assert_eq!(render_path("static.path", &ctx), "static.path");
        assert_eq!(render_path("a.${unknown}.${perf_alias}", &ctx), "a.${unknown}.p");
        assert_eq!(render_path("a.${perf_alias", &ctx), "a.${perf_alias");
        assert_eq!(render_path("", &ctx), "");
    }

    #[test]
    fn test_template_spaces_sanitized_once() {
        let ctx = PathContext::new("h", "c", "p");
        assert_eq!(render_path("my path ${perf_alias}", &ctx), "my_path_p");
    }
}
