use std::sync::Arc;

use axum::Router;

use danmu_aggregator::modules::cache::CacheStore;
use danmu_aggregator::modules::config::RuntimeConfig;
use danmu_aggregator::modules::import::ImportEngine;
use danmu_aggregator::modules::jobs::TaskEngine;
use danmu_aggregator::modules::match_dispatch::MatchDispatcher;
use danmu_aggregator::modules::metadata::TmdbHttpClient;
use danmu_aggregator::modules::persistence::{
    ApiTokenRepositoryImpl, CacheRepositoryImpl, CommentRepositoryImpl, ConfigKvRepositoryImpl,
    EpisodeRepositoryImpl, ScheduledTaskRepositoryImpl, ScraperSettingRepositoryImpl,
    SourceRepositoryImpl, TaskHistoryRepositoryImpl, TmdbMappingRepositoryImpl, WorkRepositoryImpl,
};
use danmu_aggregator::modules::provider::adapters::{
    BilibiliAdapter, GamerAdapter, IqiyiAdapter, MgtvAdapter, TencentAdapter, YoukuAdapter,
};
use danmu_aggregator::modules::provider::ProviderAdapter;
use danmu_aggregator::modules::provider::ProviderRegistry;
use danmu_aggregator::modules::scheduler::{SchedulerEngine, TmdbAutoMapJob};
use danmu_aggregator::modules::{compat_api, webhook};
use danmu_aggregator::shared::utils::logger::init_logger;
use danmu_aggregator::shared::Database;
use danmu_aggregator::state::AppState;
use danmu_aggregator::{log_error, log_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let db = Arc::new(Database::new()?);

    let works: Arc<dyn danmu_aggregator::modules::persistence::WorkRepository> =
        Arc::new(WorkRepositoryImpl::new(Arc::clone(&db)));
    let sources: Arc<dyn danmu_aggregator::modules::persistence::SourceRepository> =
        Arc::new(SourceRepositoryImpl::new(Arc::clone(&db)));
    let episodes: Arc<dyn danmu_aggregator::modules::persistence::EpisodeRepository> =
        Arc::new(EpisodeRepositoryImpl::new(Arc::clone(&db)));
    let comments: Arc<dyn danmu_aggregator::modules::persistence::CommentRepository> =
        Arc::new(CommentRepositoryImpl::new(Arc::clone(&db)));
    let scraper_settings: Arc<dyn danmu_aggregator::modules::persistence::ScraperSettingRepository> =
        Arc::new(ScraperSettingRepositoryImpl::new(Arc::clone(&db)));
    let api_tokens: Arc<dyn danmu_aggregator::modules::persistence::ApiTokenRepository> =
        Arc::new(ApiTokenRepositoryImpl::new(Arc::clone(&db)));
    let scheduled_tasks: Arc<dyn danmu_aggregator::modules::persistence::ScheduledTaskRepository> =
        Arc::new(ScheduledTaskRepositoryImpl::new(Arc::clone(&db)));
    let task_history: Arc<dyn danmu_aggregator::modules::persistence::TaskHistoryRepository> =
        Arc::new(TaskHistoryRepositoryImpl::new(Arc::clone(&db)));
    let cache_repo: Arc<dyn danmu_aggregator::modules::persistence::CacheRepository> =
        Arc::new(CacheRepositoryImpl::new(Arc::clone(&db)));
    let config_kv: Arc<dyn danmu_aggregator::modules::persistence::ConfigKvRepository> =
        Arc::new(ConfigKvRepositoryImpl::new(Arc::clone(&db)));
    let tmdb_mappings: Arc<dyn danmu_aggregator::modules::persistence::TmdbMappingRepository> =
        Arc::new(TmdbMappingRepositoryImpl::new(Arc::clone(&db)));

    let config = Arc::new(RuntimeConfig::new(Arc::clone(&config_kv)));
    let cache = Arc::new(CacheStore::new(Arc::clone(&cache_repo)));
    let _ = cache.clone().spawn_hourly_sweep();

    let http = reqwest::Client::builder().timeout(std::time::Duration::from_secs(20)).build()?;

    let registry = Arc::new(ProviderRegistry::new(Arc::clone(&scraper_settings)));
    let candidates: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(BilibiliAdapter::new(http.clone())),
        Arc::new(TencentAdapter::new(http.clone())),
        Arc::new(IqiyiAdapter::new(http.clone())),
        Arc::new(YoukuAdapter::new(http.clone())),
        Arc::new(MgtvAdapter::new(http.clone())),
        Arc::new(GamerAdapter::new(http.clone(), Arc::clone(&config_kv))),
    ];
    registry.discover(candidates).await?;

    let task_engine = Arc::new(TaskEngine::start(Arc::clone(&task_history)));
    let import_engine = Arc::new(ImportEngine::new(
        Arc::clone(&works),
        Arc::clone(&sources),
        Arc::clone(&episodes),
        Arc::clone(&comments),
        Arc::clone(&registry),
    ));
    let match_dispatcher = Arc::new(MatchDispatcher::new(
        Arc::clone(&works),
        Arc::clone(&sources),
        Arc::clone(&registry),
        Arc::clone(&task_engine),
        Arc::clone(&import_engine),
    ));

    let state = Arc::new(AppState {
        works: Arc::clone(&works),
        sources: Arc::clone(&sources),
        episodes: Arc::clone(&episodes),
        comments: Arc::clone(&comments),
        api_tokens: Arc::clone(&api_tokens),
        registry: Arc::clone(&registry),
        task_engine: Arc::clone(&task_engine),
        import_engine: Arc::clone(&import_engine),
        match_dispatcher: Arc::clone(&match_dispatcher),
        cache: Arc::clone(&cache),
        config: Arc::clone(&config),
    });

    // §4.5.1: the TMDB auto-map job needs its own typed client; the API
    // key is read once at startup rather than per-run since a key
    // rotation mid-process is rare enough to warrant a restart.
    let tmdb_api_key = config.tmdb_api_key().await?.unwrap_or_default();
    let tmdb_client = Arc::new(TmdbHttpClient::new(http.clone(), tmdb_api_key));
    let tmdb_job = Arc::new(TmdbAutoMapJob::new(Arc::clone(&works), Arc::clone(&tmdb_mappings), tmdb_client));

    let scheduler = SchedulerEngine::new(Arc::clone(&scheduled_tasks), vec![tmdb_job]).await?;
    scheduler.start().await?;

    let app: Router = Router::new()
        .merge(compat_api::router())
        .merge(webhook::router())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    log_info!("listening on {}", listener.local_addr()?);
    if let Err(err) = axum::serve(listener, app).await {
        log_error!("server error: {}", err);
    }

    Ok(())
}
