//! Extraction tool check.

use console::style;

use paperdigest::extract::TextExtractor;

pub fn cmd_tools() -> anyhow::Result<()> {
    println!("{}", style("Text extraction tools").bold());

    let mut missing = false;
    for (tool, available) in TextExtractor::check_tools() {
        if available {
            println!("  {} {}", style("✓").green(), tool);
        } else {
            missing = true;
            println!("  {} {}", style("✗").red(), tool);
        }
    }

    if missing {
        println!(
            "  {} Install poppler-utils to summarize papers",
            style("→").dim()
        );
    }
    Ok(())
}
