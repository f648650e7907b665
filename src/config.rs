//! Configuration for plangate
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::ContentKind;
use crate::features::FeatureFlag;
use crate::plan::{PlanSet, PlanTier};

/// plangate - tiered content catalog administration
#[derive(Parser, Debug, Clone)]
#[command(name = "plangate")]
#[command(about = "Inspect and administer the tiered content catalog")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "plangate")]
    pub mongodb_db: String,

    /// Use the in-memory store instead of MongoDB
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Append administrator actions to this JSONL file
    #[arg(long, env = "AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Administrator id recorded for writes made from the CLI
    #[arg(long, env = "PLANGATE_ACTOR", default_value = "plangate-cli")]
    pub actor: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the merged catalog for a content kind
    Resolve {
        kind: ContentKind,

        /// Only items this plan can open
        #[arg(long)]
        plan: Option<PlanTier>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        age_range: Option<String>,

        /// Case-insensitive title/description search
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        include_inactive: bool,
    },

    /// Change the access URL or active flag of a fixed item
    Override {
        item_id: String,

        #[arg(long, conflicts_with = "clear_url")]
        url: Option<String>,

        /// Go back to the default URL
        #[arg(long)]
        clear_url: bool,

        #[arg(long)]
        active: Option<bool>,
    },

    /// Restore a fixed item's default URL and re-activate it
    ResetOverride { item_id: String },

    /// Manage admin-authored items
    Dynamic {
        #[command(subcommand)]
        command: DynamicCommand,
    },

    /// Inspect or edit the plan/feature matrix
    Matrix {
        #[command(subcommand)]
        command: MatrixCommand,
    },

    /// Evaluate whether a plan may open an item
    Access {
        kind: ContentKind,
        item_id: String,

        /// Plan of the member being checked
        #[arg(long, default_value = "demo")]
        plan: PlanTier,

        /// Check as the administrator previewing `--plan`
        #[arg(long)]
        simulate: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DynamicCommand {
    Add {
        kind: ContentKind,

        #[arg(long)]
        title: String,

        #[arg(long)]
        url: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        age_range: Option<String>,

        #[arg(long)]
        media_ref: Option<String>,

        #[command(flatten)]
        plans: PlanArgs,

        /// Store as a draft
        #[arg(long)]
        inactive: bool,
    },

    Update {
        kind: ContentKind,
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        plans: PlanArgs,

        #[arg(long)]
        active: Option<bool>,
    },

    Remove { kind: ContentKind, id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MatrixCommand {
    Show,

    Set {
        tier: PlanTier,
        feature: FeatureFlag,

        /// Include (true) or exclude (false)
        #[arg(action = clap::ArgAction::Set)]
        included: bool,
    },

    Reset,
}

/// Plan set given either as an explicit list or as a threshold
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Comma-separated plan keys
    #[arg(long, value_delimiter = ',', conflicts_with = "min_plan")]
    pub plans: Option<Vec<PlanTier>>,

    /// This tier and every tier above it
    #[arg(long)]
    pub min_plan: Option<PlanTier>,
}

impl PlanArgs {
    pub fn to_plan_set(&self) -> Option<PlanSet> {
        match (&self.plans, self.min_plan) {
            (Some(plans), _) => Some(plans.iter().copied().collect()),
            (None, Some(min)) => Some(PlanSet::at_least(min)),
            (None, None) => None,
        }
    }
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.mongodb_uri.trim().is_empty() {
                return Err("MONGODB_URI is required unless DEV_MODE is set".to_string());
            }
            if self.mongodb_db.trim().is_empty() {
                return Err("MONGODB_DB is required unless DEV_MODE is set".to_string());
            }
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }

        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
