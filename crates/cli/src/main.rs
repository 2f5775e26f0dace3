use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trials_core::search::SearchQuery;
use trials_core::{Answers, CoreConfig, StaticSource, TrialsService};

#[derive(Parser)]
#[command(name = "trials")]
#[command(about = "Cancer clinical trials finder CLI")]
struct Cli {
    /// Serve trials from a JSON array file instead of ClinicalTrials.gov
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search trials
    Search {
        /// Free text matched against titles, conditions and descriptions
        text: Option<String>,
        #[arg(long)]
        cancer_type: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// relevance, title, phase, status or participants
        #[arg(long)]
        sort_by: Option<String>,
    },
    /// Show one trial
    Show {
        /// Registry ID, e.g. NCT04567890
        id: String,
    },
    /// Print the eligibility questionnaire
    Questions,
    /// Assess eligibility from a JSON file of answers
    Assess {
        /// Path to a JSON object of answers keyed by question field
        answers: PathBuf,
    },
    /// Autocomplete suggestions
    Suggest {
        query: String,
        /// all, cancer, location, sponsor or treatment
        #[arg(long = "type", default_value = "all")]
        kind: String,
    },
}

fn build_service(fixture: Option<&Path>) -> Result<TrialsService, Box<dyn std::error::Error>> {
    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let service = match fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read fixture {}: {e}", path.display()))?;
            TrialsService::new(cfg, Arc::new(StaticSource::from_json(&json)?))?
        }
        None => TrialsService::from_config(cfg)?,
    };
    Ok(service)
}

fn load_answers(path: &Path) -> Result<Answers, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read answers {}: {e}", path.display()))?;
    let answers = serde_json::from_str(&json)
        .map_err(|e| format!("answers file {} is not a JSON object: {e}", path.display()))?;
    Ok(answers)
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'trials --help' for commands");
        return Ok(());
    };
    let service = build_service(cli.fixture.as_deref())?;

    match command {
        Commands::Search {
            text,
            cancer_type,
            location,
            phase,
            status,
            page,
            limit,
            sort_by,
        } => {
            let query = SearchQuery {
                search_text: text,
                cancer_type,
                location,
                phase,
                status,
                page,
                limit: Some(limit),
                sort_by,
                ..SearchQuery::default()
            };
            let results = service.search(&query).await?;
            println!(
                "Page {} of {} ({} matching trials)",
                results.page, results.total_pages, results.total
            );
            for trial in &results.trials {
                println!("{}  [{}] [{}] {}", trial.id, trial.phase, trial.status, trial.title);
            }
        }
        Commands::Show { id } => print_json(&service.trial(&id).await?)?,
        Commands::Questions => {
            for q in service.questions() {
                let marker = if q.required { "*" } else { " " };
                println!("{:>2}{marker} {} ({})", q.id, q.question, q.field);
                for option in &q.options {
                    println!("      - {option}");
                }
            }
        }
        Commands::Assess { answers } => {
            let record = service.assess(load_answers(&answers)?).await?;
            println!("Assessment {}", record.id);
            println!(
                "{} trials scored, best {}%, average {}%",
                record.summary.total_trials, record.summary.best_score, record.summary.average_score
            );
            for trial in &record.recommendations.top_matches {
                println!(
                    "{:>3}%  {}  {}  {}",
                    trial.eligibility_score, trial.match_level, trial.trial.id, trial.trial.title
                );
            }
            for step in &record.next_steps {
                println!("- {}", step.action);
            }
        }
        Commands::Suggest { query, kind } => {
            let res = service.suggestions(&query, &kind).await;
            if res.suggestions.is_empty() {
                println!("No suggestions.");
            }
            for s in &res.suggestions {
                println!("{:<10} {}", s.kind, s.display);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fixture_flag_is_global() {
        let cli = Cli::try_parse_from(["trials", "show", "NCT01234567", "--fixture", "trials.json"])
            .unwrap();
        assert_eq!(cli.fixture, Some(PathBuf::from("trials.json")));
        assert!(matches!(cli.command, Some(Commands::Show { ref id }) if id == "NCT01234567"));
    }

    #[test]
    fn suggest_takes_a_type() {
        let cli = Cli::try_parse_from(["trials", "suggest", "lung", "--type", "cancer"]).unwrap();
        match cli.command {
            Some(Commands::Suggest { query, kind }) => {
                assert_eq!(query, "lung");
                assert_eq!(kind, "cancer");
            }
            _ => panic!("expected suggest"),
        }
    }
}
