use colored::Colorize;
use declarative::{ApplyResult, Outcome};
use serde_json::Value;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    eprintln!("  {}", msg.dimmed());
}

/// Print the result of one reconcile run
pub fn outcome(kind: &str, outcome: &Outcome) {
    let line = describe(kind, outcome);
    if outcome.changed() {
        success(&line);
    } else {
        info(&line);
    }
}

fn describe(kind: &str, outcome: &Outcome) -> String {
    let verb = match outcome.result {
        ApplyResult::NoChange => outcome.result.verb().dimmed(),
        ApplyResult::Removed => outcome.result.verb().red(),
        _ => outcome.result.verb().green(),
    };
    match label(&outcome.data) {
        Some(label) => format!("{} {} {}", kind.bold(), label, verb),
        None => format!("{} {}", kind.bold(), verb),
    }
}

/// Human label for a record: its name, username or id
fn label(data: &Value) -> Option<String> {
    ["name", "username"]
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| data.get("id").map(|id| format!("#{id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_prefers_name() {
        assert_eq!(
            label(&json!({"id": 3, "name": "shop", "username": "x"})),
            Some("shop".to_string())
        );
        assert_eq!(
            label(&json!({"id": 3, "username": "alice"})),
            Some("alice".to_string())
        );
        assert_eq!(label(&json!({"id": 3})), Some("#3".to_string()));
        assert_eq!(label(&json!({})), None);
    }

    #[test]
    fn test_describe_contains_kind_and_verb() {
        colored::control::set_override(false);
        let outcome = Outcome::new(ApplyResult::Created, json!({"id": 7, "name": "shop"}));
        assert_eq!(describe("database", &outcome), "database shop created");
        assert_eq!(describe("ssl", &Outcome::empty()), "ssl unchanged");
    }
}
