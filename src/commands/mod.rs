/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `serve`  - Run the relay HTTP server
- `chat`   - Interactive chat client against a relay
- `prompt` - Manage the stored universal prompt

The handlers are thin wrappers over the `server` and `client` modules.
*/

use crate::config::Config;
use crate::error::Result;

// Special commands parser for the interactive chat client
pub mod special_commands;

// Relay server command handler
pub mod serve {
    //! Relay server command handler.
    //!
    //! Builds the configured provider and serves the relay until Ctrl-C.

    use super::*;
    use crate::server::{AppState, RelayServer};
    use std::sync::Arc;

    /// Run the relay server
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created or the listener
    /// cannot be bound
    pub async fn run_serve(config: Config) -> Result<()> {
        tracing::info!(
            provider = %config.provider.provider_type,
            chat_model = %config.provider.gemini.chat_model,
            ping_model = %config.provider.gemini.ping_model,
            "Starting relay"
        );

        let state = Arc::new(AppState::from_config(&config)?);
        RelayServer::new(config.server.bind_addr(), state).run().await
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat client handler.
    //!
    //! Runs a readline loop: plain lines are submitted to the relay and the
    //! reply is printed as it streams; `/` commands manage the universal
    //! prompt.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::client::{
        prompt_store_from_config, ChatSession, HttpRelayTransport, SettingsPanel,
    };
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;

    /// Start the interactive chat client
    ///
    /// # Errors
    ///
    /// Returns error if the prompt store cannot be read, the relay URL is
    /// invalid, or the terminal cannot be initialised
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!(relay_url = %config.client.relay_url, "Starting interactive chat");

        let store = prompt_store_from_config(&config.client)?;
        let mut settings = SettingsPanel::load(store)?;
        let transport = HttpRelayTransport::new(&config.client.relay_url)?;
        let mut session = ChatSession::new();

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config.client.relay_url, &settings);

        loop {
            match rl.readline(&input_prompt(&settings)) {
                Ok(line) => {
                    session.clear_error();

                    let command = match parse_special_command(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::ShowSettings => {
                            settings.open();
                            print_settings(&settings);
                            settings.save()?;
                            continue;
                        }
                        SpecialCommand::SetPrompt(text) => {
                            settings.edit(text)?;
                            settings.save()?;
                            println!("{}\n", "Universal prompt saved".green());
                            continue;
                        }
                        SpecialCommand::ClearPrompt => {
                            settings.clear()?;
                            println!("{}\n", "Universal prompt cleared".green());
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Regular chat message
                        }
                    }

                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.trim())?;
                    }

                    println!();
                    let result = session
                        .submit(
                            &line,
                            Some(settings.prompt().as_str()),
                            &transport,
                            |fragment| {
                                print!("{}", fragment);
                                let _ = std::io::stdout().flush();
                            },
                        )
                        .await;

                    match result {
                        Ok(()) => println!("\n"),
                        Err(e) => {
                            tracing::debug!(error = %e, "Submission failed");
                            if let Some(message) = session.error() {
                                eprintln!("\n{}\n", message.red());
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn input_prompt(settings: &SettingsPanel) -> String {
        if settings.is_set() {
            format!("{} >> ", "[prompt]".cyan())
        } else {
            ">> ".to_string()
        }
    }

    /// Display welcome banner at the start of interactive chat
    fn print_welcome_banner(relay_url: &str, settings: &SettingsPanel) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              relaychat - Interactive Chat                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Relay:  {}", relay_url.cyan());
        let status = if settings.is_set() {
            "active".green()
        } else {
            "not set".dimmed()
        };
        println!("Universal prompt: {}\n", status);
        println!("Type '/help' for available commands, '/exit' to quit\n");
    }

    fn print_settings(settings: &SettingsPanel) {
        println!("\n{}", "Universal Prompt".bold());
        println!("This prompt will be prepended to every message you send.\n");
        if settings.is_set() {
            println!("{}\n", settings.prompt().as_str());
        } else {
            println!("{}\n", "(empty) e.g., /prompt Respond in pidgin English.".dimmed());
        }
    }
}

// Universal prompt command handler
pub mod prompt {
    //! Universal prompt management handler.

    use super::*;
    use crate::cli::PromptCommand;
    use crate::client::{prompt_store_from_config, SettingsPanel};

    /// Show, set, or clear the stored universal prompt
    ///
    /// # Errors
    ///
    /// Returns error if the prompt store cannot be read or written
    pub fn handle_prompt(config: &Config, command: PromptCommand) -> Result<()> {
        let store = prompt_store_from_config(&config.client)?;
        let mut settings = SettingsPanel::load(store)?;

        match command {
            PromptCommand::Show => {
                if settings.is_set() {
                    println!("{}", settings.prompt());
                } else {
                    println!("No universal prompt set");
                }
            }
            PromptCommand::Set { text } => {
                settings.edit(text)?;
                settings.save()?;
                println!("Universal prompt saved");
            }
            PromptCommand::Clear => {
                settings.clear()?;
                println!("Universal prompt cleared");
            }
        }

        Ok(())
    }
}
