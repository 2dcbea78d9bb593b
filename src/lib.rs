pub mod analysis;
pub mod cli;
pub mod commands;
pub mod error;
pub mod models;

use clap::Parser;
use cli::{Cli, Command};
use commands::{
    db::{category_crud, classification_crud, open_data_dir},
    import::import_issues,
    scoring::{get_issue_breakdown, get_project_summary, get_ranked_issues},
    settings::{get_settings, save_settings},
    successors::get_successors,
};
use error::{EngineError, EngineResult};
use models::category::{CategoryRecord, ClassificationPayload};
use models::issue::IssueFilter;
use std::process::ExitCode;

pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("could not start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    log::error!("could not render output: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> EngineResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

async fn dispatch(cli: Cli) -> EngineResult<serde_json::Value> {
    let data_dir = cli.data_dir;

    match cli.command {
        Command::Init => to_json(open_data_dir(data_dir).await?),
        Command::Import { file } => to_json(import_issues(data_dir, file).await?),
        Command::Dashboard {
            project,
            opened_from,
            opened_to,
        } => {
            let filter = IssueFilter {
                project,
                opened_from,
                opened_to,
            };
            to_json(get_ranked_issues(data_dir, filter).await?)
        }
        Command::Breakdown { id } => to_json(get_issue_breakdown(data_dir, id).await?),
        Command::Successors { reference } => to_json(get_successors(data_dir, reference).await?),
        Command::Summary { from, to } => to_json(get_project_summary(data_dir, from, to).await?),
        Command::Settings { set } => match set {
            Some(patch) => {
                let patch = serde_json::from_str(&patch)
                    .map_err(|e| EngineError::InvalidInput(format!("settings patch: {e}")))?;
                save_settings(data_dir, patch).await
            }
            None => get_settings(data_dir).await,
        },
        Command::Category {
            operation,
            name,
            weight,
        } => {
            let item = match (&name, weight) {
                (Some(name), Some(weight)) => Some(CategoryRecord {
                    name: name.clone(),
                    weight,
                }),
                _ => None,
            };
            category_crud(data_dir, operation, item, name).await
        }
        Command::Classification {
            operation,
            category,
            key,
            description,
            score,
        } => {
            let payload = ClassificationPayload {
                description,
                score: score.map(serde_json::Value::String),
            };
            classification_crud(data_dir, operation, category, key, Some(payload)).await
        }
    }
}
