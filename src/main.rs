use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use stockdesk::{
    api::{new_auth_header_slot, ApiClient},
    config::Settings,
    guard::{LogProgress, NavigationGuard, Resolution},
    routes,
    session::SessionService,
    storage::SqliteKvStore,
    store::SharedStore,
};

#[derive(Debug, Parser)]
#[command(name = "stockdesk", version)]
struct Cli {
    /// Log in with these credentials before starting (user:password)
    #[arg(long, conflicts_with = "token")]
    login: Option<String>,

    /// Use an existing API token instead of logging in
    #[arg(long)]
    token: Option<String>,

    /// Route name to navigate to on startup
    #[arg(long, default_value = "home")]
    route: String,

    /// Override GUARD_FENCING (true|false)
    #[arg(long)]
    fencing: Option<bool>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(f) = cli.fencing {
        settings.guard_fencing = f;
    }

    let kv = SqliteKvStore::new(&settings.storage_path)?;
    kv.init_db()?;

    log::info!(
        "app.start api={} fencing={} storage={}",
        settings.api_base_url,
        settings.guard_fencing,
        kv.path()
    );

    let auth = new_auth_header_slot();
    let session = SessionService::new(Arc::new(kv), auth.clone());
    let api = ApiClient::new(&settings, auth)?;
    let store = SharedStore::new(session.clone(), api.clone(), settings.max_chat_messages);
    let guard = NavigationGuard::new(
        session.clone(),
        api.clone(),
        Arc::new(LogProgress),
        settings.guard_fencing,
    );

    if let Some(token) = cli.token.as_deref() {
        session.save_token(token)?;
    } else if let Some(credentials) = cli.login.as_deref() {
        let (user, password) = credentials
            .split_once(':')
            .ok_or_else(|| anyhow!("--login expects user:password"))?;
        let key = api.login(user, password).await?;
        session.save_token(&key)?;
        log::info!("session.login user={user}");
    } else {
        // Resuming with whatever the previous run left in storage.
        session.sync_authorization_header();
    }

    let target = routes::by_name(&cli.route)
        .ok_or_else(|| anyhow!("unknown route {}", cli.route))?;
    match guard.resolve(target).await {
        Resolution::Allow => log::info!("nav.allow route={}", target.name),
        Resolution::Redirect(path) => {
            log::info!("nav.redirect route={} to={path}", target.name)
        }
        Resolution::Superseded => log::warn!("nav.superseded route={}", target.name),
    }

    // One-shot fond membership resolution for the social views.
    {
        let store = store.clone();
        tokio::spawn(async move {
            store.refresh_fond_membership().await;
        });
    }

    // Periodic unread refresh for the navbar badges.
    {
        let store = store.clone();
        let secs = settings.unread_refresh_secs;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(secs));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                store.refresh_unread().await;
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    log::info!("app.shutdown");
    Ok(())
}
