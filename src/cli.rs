use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "issuerank", version, about = "Weighted urgency ranking for tracker issues")]
pub struct Cli {
    /// Directory holding `.issuerank/state.db` and `.issuerank/settings.json`.
    #[arg(long, global = true, env = "ISSUERANK_DATA_DIR", default_value = ".")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or migrate the store and settings.
    Init,
    /// Load issues and successor links from a JSON bundle.
    Import { file: String },
    /// Rank open issues.
    Dashboard {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        opened_from: Option<NaiveDate>,
        #[arg(long)]
        opened_to: Option<NaiveDate>,
    },
    /// Score breakdown of one issue.
    Breakdown { id: i64 },
    /// Direct successors of an issue (ticket number or internal id).
    Successors { reference: i64 },
    /// Per-project open/closed counts.
    Summary {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show settings, optionally merging a JSON patch first.
    Settings {
        #[arg(long)]
        set: Option<String>,
    },
    /// Category weights: list, read, create, update or delete.
    Category {
        operation: String,
        name: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Client, deadline and label classifications.
    Classification {
        operation: String,
        category: String,
        key: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        score: Option<String>,
    },
}
