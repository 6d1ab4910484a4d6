// CLI module for sermon-assist

use crate::client::{field_analysis_prompt, field_prompt, SermonField};
use crate::error::{ProxyError, Result};
use clap::{Parser, Subcommand};

/// sermon-assist - generation proxy and offline asset cache for the sermon preparation assistant
#[derive(Parser, Debug)]
#[command(name = "sermon-assist", version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the generation proxy HTTP server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the offline asset cache
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },

    /// Look up a passage in RVR1960 and NTV through a running proxy
    Passage {
        /// Passage reference, e.g. "Juan 3:16"
        reference: String,

        /// Proxy origin
        #[arg(long, env = "SERMON_ASSIST_PROXY_URL", default_value = "http://127.0.0.1:8888")]
        proxy: String,
    },

    /// Ask a running proxy for a suggestion and append it to a field's text
    Suggest(SuggestArgs),
}

#[derive(Subcommand, Debug)]
pub enum AssetsAction {
    /// Fetch the manifest into the current version's store
    Install,
    /// Delete every store from other versions; the current one must be installed
    Activate,
    /// Install, then delete every store from other versions
    Update,
    /// Fetch a URL through the cache (relative URLs resolve against the origin)
    Fetch {
        url: String,
    },
    /// List stores and their entry counts
    List,
}

#[derive(clap::Args, Debug)]
pub struct SuggestArgs {
    /// Free-form prompt text
    #[arg(required_unless_present_any = ["field", "label"], conflicts_with_all = ["field", "label"])]
    pub prompt: Option<String>,

    /// Section with its own prompt wording
    #[arg(long, value_enum, conflicts_with = "label")]
    pub field: Option<SermonField>,

    /// Label of an exegesis field to analyse, e.g. "Verbos"
    #[arg(long)]
    pub label: Option<String>,

    /// Passage the sermon is based on
    #[arg(long, default_value = "")]
    pub passage: String,

    /// Theological principle, quoted by the sermon-heart prompt
    #[arg(long, default_value = "")]
    pub bridge: String,

    /// Current text of the field; the suggestion is appended below it
    #[arg(long, default_value = "")]
    pub current: String,

    /// Proxy origin
    #[arg(long, env = "SERMON_ASSIST_PROXY_URL", default_value = "http://127.0.0.1:8888")]
    pub proxy: String,
}

impl SuggestArgs {
    /// Prompt to send: the dedicated wording for `--field`, the generic
    /// analysis prompt for `--label`, or the free-form text.
    pub fn build_prompt(&self) -> Result<String> {
        match (&self.prompt, self.field, &self.label) {
            (_, Some(field), _) => Ok(field_prompt(field, &self.passage, &self.bridge)),
            (_, None, Some(label)) => Ok(field_analysis_prompt(&self.passage, label)),
            (Some(prompt), None, None) => Ok(prompt.clone()),
            (None, None, None) => Err(ProxyError::PromptRequired),
        }
    }
}
