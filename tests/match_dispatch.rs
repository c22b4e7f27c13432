use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use danmu_aggregator::modules::comment::{
    ApiToken, CacheEntry, Comment, Episode, MediaKind, ScheduledTask, ScraperSetting, Source,
    TaskHistory, TaskStatus, TmdbEpisodeMapping, Work, WorkAliases, WorkMetadata,
};
use danmu_aggregator::modules::import::ImportEngine;
use danmu_aggregator::modules::jobs::TaskEngine;
use danmu_aggregator::modules::match_dispatch::{MatchDispatcher, MatchRequest};
use danmu_aggregator::modules::persistence::{
    CommentRepository, EpisodeRepository, ScraperSettingRepository, SourceRepository,
    TaskHistoryRepository, WorkRepository,
};
use danmu_aggregator::modules::provider::ProviderRegistry;
use danmu_aggregator::shared::errors::AppResult;

struct FakeWorkRepository {
    work: Work,
}

#[async_trait]
impl WorkRepository for FakeWorkRepository {
    async fn find_by_title_season(&self, title: &str, season: i32) -> AppResult<Option<Work>> {
        if title == self.work.title && season == self.work.season {
            Ok(Some(self.work.clone()))
        } else {
            Ok(None)
        }
    }
    async fn get(&self, id: Uuid) -> AppResult<Option<Work>> {
        Ok((id == self.work.id).then(|| self.work.clone()))
    }
    async fn create(&self, work: Work) -> AppResult<Work> {
        Ok(work)
    }
    async fn set_poster_if_absent(&self, _work_id: Uuid, _poster_url: &str) -> AppResult<()> {
        Ok(())
    }
    async fn get_metadata(&self, work_id: Uuid) -> AppResult<WorkMetadata> {
        Ok(WorkMetadata { work_id, ..Default::default() })
    }
    async fn upsert_metadata(&self, _metadata: &WorkMetadata) -> AppResult<()> {
        Ok(())
    }
    async fn get_aliases(&self, work_id: Uuid) -> AppResult<WorkAliases> {
        Ok(WorkAliases { work_id, ..Default::default() })
    }
    async fn upsert_aliases(&self, _aliases: &WorkAliases) -> AppResult<()> {
        Ok(())
    }
    async fn list_pending_tmdb_mapping(&self) -> AppResult<Vec<(Work, WorkMetadata)>> {
        Ok(Vec::new())
    }
    async fn find_by_bangumi_id(&self, _bangumi_id: i32) -> AppResult<Option<(Work, WorkMetadata)>> {
        Ok(None)
    }
}

struct FakeSourceRepository {
    sources: Vec<Source>,
}

#[async_trait]
impl SourceRepository for FakeSourceRepository {
    async fn find_by_provider_media(&self, provider: &str, provider_media_id: &str) -> AppResult<Option<Source>> {
        Ok(self
            .sources
            .iter()
            .find(|s| s.provider == provider && s.provider_media_id == provider_media_id)
            .cloned())
    }
    async fn list_for_work(&self, work_id: Uuid) -> AppResult<Vec<Source>> {
        Ok(self.sources.iter().filter(|s| s.work_id == work_id).cloned().collect())
    }
    async fn get(&self, id: Uuid) -> AppResult<Option<Source>> {
        Ok(self.sources.iter().find(|s| s.id == id).cloned())
    }
    async fn insert_ignore(&self, source: Source) -> AppResult<Source> {
        Ok(source)
    }
    async fn set_favorited(&self, _work_id: Uuid, _source_id: Uuid) -> AppResult<()> {
        Ok(())
    }
}

struct UnusedScraperSettingRepository;

#[async_trait]
impl ScraperSettingRepository for UnusedScraperSettingRepository {
    async fn list_ordered(&self) -> AppResult<Vec<ScraperSetting>> {
        Ok(Vec::new())
    }
    async fn get(&self, _provider_name: &str) -> AppResult<Option<ScraperSetting>> {
        Ok(None)
    }
    async fn upsert(&self, _setting: ScraperSetting) -> AppResult<()> {
        Ok(())
    }
}

struct UnusedEpisodeRepository;

#[async_trait]
impl EpisodeRepository for UnusedEpisodeRepository {
    async fn find_by_source_index(&self, _source_id: Uuid, _index: i32) -> AppResult<Option<Episode>> {
        Ok(None)
    }
    async fn find_by_provider_episode(&self, _provider: &str, _provider_episode_id: &str) -> AppResult<Option<(Source, Episode)>> {
        Ok(None)
    }
    async fn list_for_source(&self, _source_id: Uuid) -> AppResult<Vec<Episode>> {
        Ok(Vec::new())
    }
    async fn get(&self, _id: Uuid) -> AppResult<Option<Episode>> {
        Ok(None)
    }
    async fn create_if_absent(&self, episode: Episode) -> AppResult<Episode> {
        Ok(episode)
    }
    async fn update_fetched(&self, _episode_id: Uuid, _fetched_at: chrono::DateTime<Utc>, _comment_count: i32) -> AppResult<()> {
        Ok(())
    }
    async fn clear_for_source(&self, _source_id: Uuid) -> AppResult<()> {
        Ok(())
    }
}

struct UnusedCommentRepository;

#[async_trait]
impl CommentRepository for UnusedCommentRepository {
    async fn insert_ignore_batch(&self, _episode_id: Uuid, _comments: &[Comment]) -> AppResult<i32> {
        Ok(0)
    }
    async fn list_for_episode(&self, _episode_id: Uuid) -> AppResult<Vec<Comment>> {
        Ok(Vec::new())
    }
    async fn clear_for_episode(&self, _episode_id: Uuid) -> AppResult<()> {
        Ok(())
    }
}

struct FakeTaskHistoryRepository {
    rows: std::sync::Mutex<Vec<TaskHistory>>,
}

#[async_trait]
impl TaskHistoryRepository for FakeTaskHistoryRepository {
    async fn create(&self, history: TaskHistory) -> AppResult<TaskHistory> {
        self.rows.lock().unwrap().push(history.clone());
        Ok(history)
    }
    async fn update_progress(&self, _id: Uuid, _progress: i32, _description: &str) -> AppResult<()> {
        Ok(())
    }
    async fn transition(&self, _id: Uuid, _status: TaskStatus, _description: &str) -> AppResult<()> {
        Ok(())
    }
    async fn get(&self, id: Uuid) -> AppResult<Option<TaskHistory>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
    async fn list_recent(&self, _limit: i64) -> AppResult<Vec<TaskHistory>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// §8 worked example: Work W has two Sources, S1 (favorited) and S2. A
/// webhook fires for W S1E1. Dispatch must take the favorited shortcut and
/// submit exactly one import task, addressed at S1's (provider,
/// media_id) — without ever falling through to `SearchAll`.
#[tokio::test]
async fn favorited_source_shortcut_skips_search_all() {
    let work = Work::new("Example Show".to_string(), MediaKind::TvSeries, Some(1));

    let s1 = Source::new(work.id, "bilibili", "bili-12345");
    let mut s1 = s1;
    s1.favorited = true;
    let s2 = Source::new(work.id, "tencent", "tc-67890");

    let works = Arc::new(FakeWorkRepository { work: work.clone() });
    let sources = Arc::new(FakeSourceRepository { sources: vec![s1.clone(), s2.clone()] });
    let episodes = Arc::new(UnusedEpisodeRepository);
    let comments = Arc::new(UnusedCommentRepository);
    let settings = Arc::new(UnusedScraperSettingRepository);
    let history = Arc::new(FakeTaskHistoryRepository { rows: std::sync::Mutex::new(Vec::new()) });

    let registry = Arc::new(ProviderRegistry::new(settings));
    let task_engine = Arc::new(TaskEngine::start(history.clone()));
    let import_engine = Arc::new(ImportEngine::new(
        works.clone(),
        sources.clone(),
        episodes,
        comments,
        registry.clone(),
    ));
    let dispatcher = MatchDispatcher::new(works, sources, registry, task_engine, import_engine);

    let task_id = dispatcher
        .dispatch(MatchRequest {
            title: work.title.clone(),
            kind: MediaKind::TvSeries,
            season: 1,
            episode: 1,
            external_ids: None,
        })
        .await
        .expect("favorited shortcut should succeed without contacting any provider");

    let submitted = history.get(task_id).await.unwrap().expect("task history row created");
    assert!(submitted.title.contains("bilibili"));
    assert!(submitted.title.contains(&work.title));
    assert_eq!(history.rows.lock().unwrap().len(), 1);
}
