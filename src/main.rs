//! Terminal front-end for the shortlink view-model
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Resolves the page context and performs the page's initial load
//! - Reads line commands from stdin and renders the view state after each
//! - Stops on `quit`, end of input, Ctrl+C or SIGTERM

use std::io::Write;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::signal;
use tracing::error;
use tracing_subscriber::EnvFilter;

use shortlink_view::api::{AdminAction, HttpApi, ShortlinkApi};
use shortlink_view::command::{Command, HELP};
use shortlink_view::config::Config;
use shortlink_view::controller::{Controller, Outcome, UpdateShape};
use shortlink_view::prompt::{ConsoleInput, Prompter, TerminalPrompter};
use shortlink_view::state::{FormMode, NoticeLevel, Operation, ViewState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    // Logs go to stderr so they never interleave with the rendered view
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shortlink_view=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        error!(error = ?err, "shortlink view stopped");
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    let page = config
        .page_context()
        .await
        .context("cannot resolve page context")?;

    let mut api = HttpApi::new(&config.api_url, config.request_timeout)?;
    if let Some(authorization) = &config.authorization {
        api = api.with_authorization(authorization.clone());
    }

    let input = ConsoleInput::stdin();
    let prompter = TerminalPrompter::new(input.clone());

    println!("🔗 shortlink view: {} page, API at {}", page.kind, config.api_url);
    println!("   short links resolve under {}", config.origin);
    println!("   type 'help' for commands\n");

    let mut controller = Controller::mount(api, prompter, page, config.origin.clone()).await;
    render(controller.state());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = input.next_line() => line,
            _ = &mut shutdown => {
                println!("\n🛑 Shutdown signal received, stopping.");
                break;
            }
        };

        // End of input
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => println!("{}", HELP),
            Ok(Some(command)) => execute(&mut controller, command).await,
            Err(message) => println!("{}", message),
        }
    }

    Ok(())
}

/// Runs one command against the controller and renders the result
async fn execute<A: ShortlinkApi, P: Prompter>(controller: &mut Controller<A, P>, command: Command) {
    let ran = match command {
        Command::Input(url) => {
            controller.set_long_link(url);
            None
        }
        Command::Shorten(url) => {
            if let Some(url) = url {
                controller.set_long_link(url);
            }
            Some((Operation::CreateLink, controller.create_link().await))
        }
        Command::Links => Some((Operation::FetchLinks, controller.fetch_links().await)),
        Command::Users => Some((Operation::FetchUsers, controller.fetch_users().await)),
        Command::Refresh => {
            let _ = controller.refresh().await;
            None
        }
        Command::NewUser => {
            controller.open_create_form();
            None
        }
        Command::EditUser(id) => {
            if !controller.open_edit_form(id) {
                println!("no listed user with id {} (try 'users')", id);
            }
            None
        }
        Command::Set(field, value) => {
            if let Err(message) = controller.set_form_field(field, &value) {
                println!("{}", message);
            }
            None
        }
        Command::Save => {
            let operation = match controller.state().form.as_ref().map(|form| form.mode) {
                Some(FormMode::Edit { .. }) => Operation::UpdateUser,
                _ => Operation::CreateUser,
            };
            Some((operation, controller.save_form().await))
        }
        Command::Cancel => {
            controller.close_form();
            None
        }
        Command::Toggle(id) => Some((
            Operation::ToggleUserStatus,
            controller
                .update_user(UpdateShape::ToggleStatus { id })
                .await,
        )),
        Command::Delete(id) => Some((Operation::DeleteUser, controller.delete_user(id).await)),
        Command::Admin(action) => {
            let operation = match action {
                AdminAction::InitDatabase => Operation::InitDatabase,
                AdminAction::SeedDemoData => Operation::SeedDemoData,
            };
            Some((operation, controller.run_admin_action(action).await))
        }
        Command::State => {
            match serde_json::to_string_pretty(controller.state()) {
                Ok(json) => println!("{}", json),
                Err(err) => println!("cannot serialize state: {}", err),
            }
            return;
        }
        Command::Help | Command::Quit => return,
    };

    if let Some((operation, outcome)) = ran {
        match outcome {
            Outcome::Declined => println!("cancelled"),
            _ => {
                if let Some(notice) = controller.state().notice(operation) {
                    let marker = match notice.level {
                        NoticeLevel::Success => "✅",
                        NoticeLevel::Error => "❌",
                    };
                    println!("{} {}: {}", marker, operation, notice.message);
                }
                controller.dismiss(operation);
            }
        }
    }

    render(controller.state());
}

/// Prints the visible parts of the view
fn render(state: &ViewState) {
    let panel = &state.shortener;
    if !panel.request.long_link.is_empty() {
        let validity = if panel.is_url_valid { "valid" } else { "not a valid URL" };
        println!("long link: {} ({})", panel.request.long_link, validity);
    }
    if panel.show_result {
        println!("short URL: {}", panel.short_url);
    }

    if state.links.visible {
        println!("links ({}):", state.links.items.len());
        for link in &state.links.items {
            let active = if link.is_active { "" } else { " [inactive]" };
            println!(
                "  {}  ->  {}  ({} clicks){}",
                link.short_link, link.long_link, link.click_counter, active
            );
        }
    }

    if state.users.visible {
        println!("users ({}):", state.users.items.len());
        for user in &state.users.items {
            println!(
                "  #{} {} {} {} <{}> {} [{}]",
                user.id, user.username, user.first_name, user.last_name, user.email, user.phone, user.status
            );
        }
    }

    if let Some(form) = &state.form {
        let title = match form.mode {
            FormMode::Create => "new user".to_string(),
            FormMode::Edit { id } => format!("edit user #{}", id),
        };
        let fields = &form.fields;
        println!("form: {}{}", title, if form.saving { " (saving...)" } else { "" });
        println!("  username:   {}", fields.username);
        println!("  password:   {}", "*".repeat(fields.password.chars().count()));
        println!("  first_name: {}", fields.first_name);
        println!("  last_name:  {}", fields.last_name);
        println!("  email:      {}", fields.email);
        println!("  phone:      {}", fields.phone);
        println!("  status:     {}", fields.status);
    }

    for (operation, notice) in &state.notices {
        if notice.level == NoticeLevel::Error {
            println!("❌ {} ({}): {}", operation, notice.at.format("%H:%M:%S"), notice.message);
        }
    }
}

/// Resolves on SIGINT (Ctrl+C), or SIGTERM on Unix systems
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
