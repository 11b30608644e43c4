// Colored terminal output for handler results.
//
// The CLI's display functions delegate here; JSON output bypasses this module.

use colored::Colorize;

use crate::artifacts::params::ModelParams;
use crate::handler::{ModelKind, ModelOutput};
use crate::keyphrase::Keyphrase;

/// Display what `inspect` found in a model directory.
pub fn display_model_summary(kind: Option<ModelKind>, prefix: &str, params: &ModelParams) {
    println!("\n{}", format!("=== Model {prefix} ===").bold());

    match kind {
        Some(kind) => println!("  Model type: {}", kind.to_string().green()),
        None => println!("  Model type: {}", "not supported".red().bold()),
    }

    if params.as_map().is_empty() {
        println!("  Parameters: {}", "(none)".dimmed());
        return;
    }
    println!("  Parameters:");
    for (key, value) in params.as_map() {
        println!("    {:<16} {}", key, value.to_string().dimmed());
    }
}

/// Display one result per input, labelled with the input's name.
pub fn display_output(labels: &[String], output: &ModelOutput) {
    match output {
        ModelOutput::Keyphrases(lists) => {
            for (label, keyphrases) in labels.iter().zip(lists) {
                display_keyphrases(label, keyphrases);
            }
        }
        ModelOutput::Similarities(lists) => {
            for (label, similarities) in labels.iter().zip(lists) {
                display_similarities(label, similarities);
            }
        }
    }
    println!();
}

fn display_keyphrases(label: &str, keyphrases: &[Keyphrase]) {
    println!(
        "\n{}",
        format!("=== Keyphrases: {} ({}) ===", label, keyphrases.len()).bold()
    );
    if keyphrases.is_empty() {
        println!("  {}", "no candidates found".dimmed());
        return;
    }
    for (i, kp) in keyphrases.iter().enumerate() {
        println!("  {:>3}. {:<40} {:>8.4}", i + 1, kp.phrase, kp.score);
    }
}

fn display_similarities(label: &str, similarities: &[f64]) {
    println!(
        "\n{}",
        format!("=== Similarities: {} ({} rows) ===", label, similarities.len()).bold()
    );
    for (i, &sim) in similarities.iter().enumerate() {
        println!("  {:>4}  {}", i, colorize_similarity(sim));
    }
}

/// Colorize a similarity by strength.
fn colorize_similarity(sim: f64) -> colored::ColoredString {
    let text = format!("{sim:.4}");
    if sim >= 0.8 {
        text.green().bold()
    } else if sim >= 0.5 {
        text.green()
    } else if sim >= 0.2 {
        text.yellow()
    } else {
        text.dimmed()
    }
}
