use std::{process, sync::Arc};

use postdeck::{
    application::{
        error::AppError, notifications::NotificationCenter, posts::PostsService,
        preferences::PreferencesController, repos::ResourceApi,
    },
    cache::{CacheConfig, ResourceCache},
    config,
    infra::{prefs_store::FilePreferenceStore, remote::HttpResourceApi, telemetry},
};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

mod commands;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    for message in error.chain() {
        eprintln!("error: {message}");
    }

    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let mut service = build_service(&settings)?;
    let sweeper = service
        .cache()
        .spawn_sweeper(service.cache().config().gc_after());

    let result = match cli_args.command {
        config::Command::Posts(args) => commands::posts::handle(&mut service, args.action).await,
        config::Command::Users(args) => commands::users::handle(&service, args.action).await,
        config::Command::Prefs(args) => commands::prefs::handle(&mut service, args.action),
    };

    commands::print::notices(service.notifications());

    sweeper.abort();
    let _ = sweeper.await;

    result
}

fn build_service(settings: &config::Settings) -> Result<PostsService, AppError> {
    let api: Arc<dyn ResourceApi> = Arc::new(HttpResourceApi::new(&settings.api)?);
    debug!(base_url = %settings.api.base_url, "Configured remote API");

    let cache = ResourceCache::new(CacheConfig::from(&settings.cache), api.clone());
    let store = Arc::new(FilePreferenceStore::new(&settings.preferences.directory));
    let preferences = PreferencesController::load(store);

    Ok(PostsService::new(
        api,
        cache,
        Arc::new(NotificationCenter::default()),
        preferences,
    ))
}
