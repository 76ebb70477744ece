//! CLI output formatting

use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");

/// Print accumulated warnings, one per line.
pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{}{}", WARN, style(warning).yellow());
    }
}

/// Print a validation verdict.
pub fn print_verdict(errors: &[String], warnings: &[String]) {
    print_warnings(warnings);
    if errors.is_empty() {
        println!("{}{}", CHECK, style("configuration is valid").green());
    } else {
        for error in errors {
            println!("{}{}", CROSS, style(error).red());
        }
    }
}
