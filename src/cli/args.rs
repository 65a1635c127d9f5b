//! Shell command definitions and parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(name = "minimax-speech-rs", no_binary_name = true)]
#[command(about = "Text-to-speech with MiniMax Speech-02-HD")]
#[command(disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

/// Interactive commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Set the Replicate API token
    Key { token: String },

    /// Set the text to synthesize
    Text {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Read the text to synthesize from a file
    TextFile { path: PathBuf },

    /// Change a parameter, e.g. `set speed 1.2` or `set emotion Happy`
    Set {
        param: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },

    /// Use a custom voice ID instead of a listed voice
    Custom { voice_id: String },

    /// List the choices of an option parameter
    Options { param: String },

    /// Show the current settings
    Show,

    /// List languages, or switch to one by name or code
    Lang {
        #[arg(num_args = 0.., trailing_var_arg = true)]
        name: Vec<String>,
    },

    /// Submit the synthesis request
    Generate,

    /// Play the generated audio, or stop it while playing
    Play,

    /// Stop playback
    Stop,

    /// Save the generated audio (default: generated_speech.mp3)
    Save { path: Option<PathBuf> },

    /// Clean up and exit
    #[command(alias = "exit")]
    Quit,
}

/// Parse one input line.
///
/// # Returns
/// * `Ok(None)` for blank lines and `#` comments
/// * `Err(message)` with clap's rendered usage or help text
pub fn parse_line(input: &str) -> Result<Option<Command>, String> {
    let input = input.trim();
    if input.is_empty() || input.starts_with('#') {
        return Ok(None);
    }

    Line::try_parse_from(input.split_whitespace())
        .map(|line| Some(line.command))
        .map_err(|e| e.render().to_string())
}
