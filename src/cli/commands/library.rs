//! Listing of downloaded papers.

use console::style;

use paperdigest::config::Settings;
use paperdigest::library::{list_date_dirs, list_pdf_files};

pub fn cmd_dirs(settings: &Settings) -> anyhow::Result<()> {
    let root = &settings.crawl.download_root;
    let dirs = list_date_dirs(root)?;

    if dirs.is_empty() {
        println!("{} No papers under {}", style("!").yellow(), root.display());
        println!(
            "  {} Run 'paperdigest download' to fetch today's papers",
            style("→").dim()
        );
        return Ok(());
    }

    for dir in dirs {
        println!("{}", dir);
    }
    Ok(())
}

pub fn cmd_files(settings: &Settings, dir: &str) -> anyhow::Result<()> {
    let files = list_pdf_files(&settings.crawl.download_root, dir)?;

    if files.is_empty() {
        println!("{} No PDF files in {}", style("!").yellow(), dir);
        return Ok(());
    }

    for file in files {
        println!("{}", file);
    }
    Ok(())
}
