//! Summary and follow-up questions for one downloaded paper.

use console::style;

use paperdigest::config::Settings;
use paperdigest::digest::DigestService;
use paperdigest::extract::TextExtractor;
use paperdigest::library::pdf_path;
use paperdigest::llm::LlmClient;

use crate::cli::helpers::spinner;

pub async fn cmd_summarize(
    settings: &Settings,
    dir: &str,
    file: &str,
    questions: &[String],
) -> anyhow::Result<()> {
    let path = pdf_path(&settings.crawl.download_root, dir, file)?;
    let llm = LlmClient::new(settings.llm.clone())?;
    let model = llm.config().model().to_string();
    let service = DigestService::new(TextExtractor::new(), llm);

    let pb = spinner(format!("Summarizing {} with {}...", file, model));
    let digest = service.digest(&path).await;
    pb.finish_and_clear();
    let digest = digest?;

    println!("{} {}", style("Summary:").bold(), file);
    println!();
    println!("{}", digest.summary);

    for question in questions {
        let pb = spinner("Thinking...");
        let answer = service.ask(&digest, question).await;
        pb.finish_and_clear();

        println!();
        println!("{} {}", style("Q:").cyan().bold(), question);
        match answer {
            Ok(answer) => println!("{} {}", style("A:").green().bold(), answer),
            Err(e) => println!("{} {}", style("✗").red(), e),
        }
    }

    Ok(())
}
