use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tablero::cli::{self, Command};
use tablero::client::ApiClient;
use tablero::context::{SharedContext, StandardContext};
use tablero::logging;
use tablero::session::SessionStore;
use tablero::tasks::TaskFilter;
use tablero::tui;

/// Client for commands that need a logged-in user.
fn authenticated_client(ctx: &SharedContext) -> Result<ApiClient> {
    let cfg = tui::load_or_onboard(ctx)?;
    let _ = logging::init(ctx.as_ref(), &cfg.log_level);
    let session = tui::open_session(ctx, &cfg)?;
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run `tablero login` first.");
    }
    Ok(ApiClient::from_config(&cfg, session)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match cli::parse_args(env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}\n", msg);
            cli::print_help("tablero");
            std::process::exit(2);
        }
    };
    let ctx: SharedContext = Arc::new(StandardContext::new(args.root));

    match args.command {
        Command::Help => cli::print_help("tablero"),

        Command::Login => {
            let cfg = tui::load_or_onboard(&ctx)?;
            let _ = logging::init(ctx.as_ref(), &cfg.log_level);
            // Logging in from the CLI always keeps the session.
            let session = SessionStore::persistent(ctx.as_ref())?;
            let client = ApiClient::from_config(&cfg, session)?;
            let s = tui::prompt_login(&client, &cfg).await?;
            println!(
                "Logged in as {}{}.",
                s.username.as_deref().unwrap_or(&cfg.username),
                if s.is_teacher() { " (teacher)" } else { "" }
            );
        }

        Command::Logout => {
            SessionStore::persistent(ctx.as_ref())?.invalidate();
            println!("Session removed.");
        }

        Command::Boards => {
            let client = authenticated_client(&ctx)?;
            let boards = client
                .get_boards()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Could not list courses")?;
            print!("{}", cli::format_boards(&boards));
        }

        Command::Calendar(month) => {
            let client = authenticated_client(&ctx)?;
            let cards = client
                .get_cards()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Could not load cards")?;
            let reference = month.unwrap_or_else(TaskFilter::today);
            print!("{}", cli::format_month(reference, &cards));
        }

        Command::Tui => tui::run(ctx).await?,
    }
    Ok(())
}
