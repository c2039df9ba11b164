use colored::Colorize;
use credential::ResourceDescriptor;
use std::collections::BTreeMap;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Comma-separated attribute keys; values are never printed
pub fn attribute_keys(attributes: Option<&BTreeMap<String, String>>) -> String {
    match attributes {
        None => "(none)".to_string(),
        Some(attrs) if attrs.is_empty() => "(empty)".to_string(),
        Some(attrs) => attrs.keys().map(String::as_str).collect::<Vec<_>>().join(", "),
    }
}

/// Print the fields of a credential descriptor
pub fn credential(desc: &ResourceDescriptor) {
    kv("id", desc.id.as_deref().unwrap_or("(none)"));
    kv("name", &desc.name);
    kv("cloud", &desc.cloud.name);
    kv("auth_type", &desc.auth_type);
    kv("client_credential", &desc.client_scope.to_string());
    kv("controller_credential", &desc.controller_scope.to_string());
    kv("attributes", &attribute_keys(desc.attributes.as_ref()));
}
