//! Variable substitution for `{{a.b.c}}` tokens.
//!
//! Tokens resolve by dotted-path lookup against the run context. Unresolved
//! tokens are left verbatim: partial context must not abort otherwise
//! independent steps, so a miss is never an error.

use serde_json::Value;

use super::context::{display_value, RunContext};

/// Replace every resolvable `{{path}}` token in `template`.
pub fn resolve_template(template: &str, ctx: &RunContext) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            // Unterminated token: keep the remainder untouched.
            output.push_str("{{");
            rest = after_open;
            break;
        };

        let raw_token = &after_open[..end];
        match ctx.get_path(raw_token.trim()) {
            Some(value) => output.push_str(&display_value(value)),
            None => {
                output.push_str("{{");
                output.push_str(raw_token);
                output.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    output
}

/// Apply [`resolve_template`] to every string in a JSON tree.
///
/// Used on HTTP and webhook bodies, where templates may sit arbitrarily
/// deep inside the payload.
pub fn resolve_value(value: &Value, ctx: &RunContext) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_template(text, ctx)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| resolve_value(item, ctx)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), resolve_value(nested, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RunContext {
        let mut ctx = RunContext::default();
        ctx.set("leadId", json!("abc123"));
        ctx.set("lead", json!({"email": "a@b.co", "score": 75}));
        ctx
    }

    #[test]
    fn test_resolves_simple_token() {
        let resolved = resolve_template("https://api.test/{{leadId}}", &ctx());
        assert_eq!(resolved, "https://api.test/abc123");
    }

    #[test]
    fn test_resolves_dotted_path() {
        let resolved = resolve_template("mail to {{lead.email}} ({{lead.score}})", &ctx());
        assert_eq!(resolved, "mail to a@b.co (75)");
    }

    #[test]
    fn test_missing_token_left_verbatim() {
        assert_eq!(resolve_template("{{missing}}", &ctx()), "{{missing}}");
        assert_eq!(
            resolve_template("x {{lead.phone}} y", &ctx()),
            "x {{lead.phone}} y"
        );
    }

    #[test]
    fn test_mixed_hits_and_misses() {
        let resolved = resolve_template("{{leadId}}/{{nope}}/{{lead.email}}", &ctx());
        assert_eq!(resolved, "abc123/{{nope}}/a@b.co");
    }

    #[test]
    fn test_unterminated_token_untouched() {
        assert_eq!(resolve_template("oops {{leadId", &ctx()), "oops {{leadId");
    }

    #[test]
    fn test_whitespace_inside_token() {
        assert_eq!(resolve_template("{{ leadId }}", &ctx()), "abc123");
    }

    #[test]
    fn test_resolve_value_walks_tree() {
        let body = json!({
            "id": "{{leadId}}",
            "tags": ["{{lead.email}}", "static"],
            "nested": {"missing": "{{ghost}}"},
            "count": 7
        });
        let resolved = resolve_value(&body, &ctx());
        assert_eq!(
            resolved,
            json!({
                "id": "abc123",
                "tags": ["a@b.co", "static"],
                "nested": {"missing": "{{ghost}}"},
                "count": 7
            })
        );
    }
}
