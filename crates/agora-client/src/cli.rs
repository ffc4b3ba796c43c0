//! Command-line interface of the `agora` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{self, profile::ProfileEdit};
use crate::config::ClientConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "agora")]
#[command(about = "Agora social feed client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Use a local SQLite store instead of the server
    #[arg(long, global = true)]
    pub offline: bool,

    /// Agora API base URL (defaults to AGORA_SERVER_URL, then localhost)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Directory for the offline database and saved session
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    SignIn {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        photo: Option<String>,
    },

    SignOut,

    Whoami,

    /// Show every post, newest first
    Feed {
        #[arg(long)]
        comments: bool,
    },

    /// Publish a post
    Post {
        text: String,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Toggle your like on a post
    Like { post_id: String },

    Comment { post_id: String, text: String },

    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Authors who have posted
    Stories,

    /// Friend suggestions
    Suggestions,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    Show,

    Edit {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        bio: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        photo: Option<String>,
    },
}

/// Run one command and return what to print.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = ClientConfig::from_env().with_overrides(cli.server_url, cli.data_dir);
    let state = AppState::open(config, cli.offline)?;

    let output = match cli.command {
        Commands::SignIn { email, name, photo } => {
            commands::identity::sign_in(&state, email, name, photo).await?
        }
        Commands::SignOut => commands::identity::sign_out(&state),
        Commands::Whoami => commands::identity::whoami(&state)?,
        Commands::Feed { comments } => commands::posts::feed(&state, comments).await,
        Commands::Post { text, image } => {
            commands::posts::post(&state, &text, image.as_deref()).await?
        }
        Commands::Like { post_id } => commands::posts::like(&state, &post_id).await?,
        Commands::Comment { post_id, text } => {
            commands::posts::comment(&state, &post_id, &text).await?
        }
        Commands::Profile { action } => match action {
            ProfileCommand::Show => commands::profile::show(&state).await?,
            ProfileCommand::Edit {
                name,
                bio,
                location,
                website,
                photo,
            } => {
                let edit = ProfileEdit {
                    display_name: name,
                    bio,
                    location,
                    website,
                    photo,
                };
                commands::profile::edit(&state, edit).await?
            }
        },
        Commands::Stories => commands::discover::stories(&state).await,
        Commands::Suggestions => commands::discover::suggestions(),
    };

    Ok(output)
}
