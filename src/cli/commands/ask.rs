//! Ask command implementation.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::AnswerEngine;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, top_k: Option<usize>, no_generate: bool, mut settings: Settings) -> Result<()> {
    if no_generate {
        settings.generation.enabled = false;
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let engine = AnswerEngine::from_settings(&settings.generation, prompts)?;
    if engine.provider_names().is_empty() && !no_generate {
        Output::warning("No GROQ_API_KEY or OPENAI_API_KEY set; answering with an extractive summary.");
    }

    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Searching knowledge base...");
    let hits = match orchestrator.retrieve(question, top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Retrieval failed: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message("Generating answer...");
    let answer = engine.answer(question, &hits).await;
    spinner.finish_and_clear();

    println!("\n{}\n", answer.text);
    if let Some(provider) = &answer.provider {
        Output::kv("Answered by", provider);
    }

    if !hits.is_empty() {
        Output::header("Sources");
        for (i, hit) in hits.iter().enumerate() {
            Output::hit(i + 1, hit);
        }
    }

    Ok(())
}
