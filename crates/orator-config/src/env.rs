use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `{{ env.NAME }}` and `{{ env.NAME | default("value") }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
});

/// Substitute environment placeholders in raw configuration text
///
/// Comment lines are copied through untouched so a commented-out
/// placeholder never requires its variable to be set.
pub fn expand_env(input: &str) -> anyhow::Result<String> {
    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
        } else {
            lines.push(expand_line(line)?);
        }
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str) -> anyhow::Result<String> {
    let mut failure = None;

    let expanded = PLACEHOLDER.replace_all(line, |caps: &Captures<'_>| {
        let key = &caps[1];
        let fallback = caps.get(2).map(|m| m.as_str());

        let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
            failure.get_or_insert_with(|| format!("only `env.` placeholders are supported, found `{key}`"));
            return String::new();
        };

        match (std::env::var(name), fallback) {
            (Ok(value), _) => value,
            (Err(_), Some(fallback)) => fallback.to_string(),
            (Err(_), None) => {
                failure.get_or_insert_with(|| format!("environment variable `{name}` is not set"));
                String::new()
            }
        }
    });

    match failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(expanded.into_owned()),
    }
}
