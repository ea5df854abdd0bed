//! Rendering of the Agent Zero `.env` file.

use crate::domain::config::{RuntimeConfig, SecretBundle};

/// Render the full `.env` contents: secrets first, then derived settings.
///
/// Every value is single-quoted so passwords containing spaces, `#`, `=` or
/// `$` reach Agent Zero verbatim. dotenv neither interpolates nor unescapes
/// single-quoted values beyond `\\` and `\'`.
#[must_use]
pub fn render_env_file(config: &RuntimeConfig, secrets: &SecretBundle) -> String {
    let mut out = String::from("# Generated by agent-zero-install. Changes are overwritten on re-run.\n");
    for (key, value) in secrets.iter() {
        push_entry(&mut out, key, value);
    }
    push_entry(&mut out, "API_PORT", &config.api_port.to_string());
    push_entry(&mut out, "WEB_UI_HOST", &config.bind_addr);
    push_entry(&mut out, "WEB_UI_PORT", &config.gui_port.to_string());
    push_entry(&mut out, "WORK_DIR", &config.workspace_dir.to_string_lossy());
    out
}

fn push_entry(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push('=');
    out.push_str(&quote_env_value(value));
    out.push('\n');
}

/// Single-quote a value, escaping only `\` and `'`.
#[must_use]
pub fn quote_env_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
