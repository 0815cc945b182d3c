use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gamer-dl")]
#[command(about = "Download YouTube videos through yt-dlp behind an account login")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(clap::Args, Clone)]
pub struct Credentials {
    /// Account e-mail
    #[arg(short, long)]
    pub email: String,

    /// Account password
    #[arg(short, long, env = "GAMERDL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with e-mail and password
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Create a new account
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Send a password reset e-mail
    ResetPassword {
        /// Account e-mail
        #[arg(short, long)]
        email: String,
    },

    /// Show title, duration and thumbnail of a video
    Info {
        /// YouTube URL
        url: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Download a video
    Download {
        /// YouTube URL
        url: String,

        /// Destination folder
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Format label (see `formats`)
        #[arg(short, long, default_value = "Best quality")]
        format: String,

        /// Output file name without extension
        #[arg(short, long, default_value = "")]
        title: String,

        /// Do not open the destination folder when done
        #[arg(long)]
        no_open: bool,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// List the available format labels
    Formats,
}
