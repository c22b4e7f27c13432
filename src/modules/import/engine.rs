use std::sync::Arc;

use chrono::Utc;

use crate::log_warn;
use crate::modules::comment::{normalize_title, Comment, Episode, MediaKind, Source, Work, WorkMetadata};
use crate::modules::jobs::ProgressFn;
use crate::modules::persistence::{CommentRepository, EpisodeRepository, SourceRepository, WorkRepository};
use crate::modules::provider::ProviderRegistry;
use crate::shared::errors::{AppError, AppResult};

use super::types::{ExternalIds, GenericImportRequest};

/// §4.3 "Import Engine": resolves or creates the Work/Source/Episode rows
/// an adapter's records belong under, then fetches and stores comments.
pub struct ImportEngine {
    works: Arc<dyn WorkRepository>,
    sources: Arc<dyn SourceRepository>,
    episodes: Arc<dyn EpisodeRepository>,
    comments: Arc<dyn CommentRepository>,
    registry: Arc<ProviderRegistry>,
}

impl ImportEngine {
    pub fn new(
        works: Arc<dyn WorkRepository>,
        sources: Arc<dyn SourceRepository>,
        episodes: Arc<dyn EpisodeRepository>,
        comments: Arc<dyn CommentRepository>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            works,
            sources,
            episodes,
            comments,
            registry,
        }
    }

    /// §4.3 "Generic import" steps 1-5.
    pub async fn generic_import(
        &self,
        request: GenericImportRequest,
        progress: Arc<ProgressFn>,
    ) -> AppResult<String> {
        let adapter = self
            .registry
            .find_adapter(&request.provider)
            .await
            .ok_or_else(|| AppError::UnknownProvider(request.provider.clone()))?;

        let normalized_title = normalize_title(&request.title);
        let work = match self.works.find_by_title_season(&normalized_title, request.season).await? {
            Some(existing) => existing,
            None => self.works.create(Work::new(request.title.clone(), request.kind, Some(request.season))).await?,
        };
        if let Some(poster) = &request.poster_url {
            self.works.set_poster_if_absent(work.id, poster).await?;
        }
        if let Some(external) = &request.external_ids {
            self.merge_external_ids(work.id, external).await?;
        }

        let source = self
            .sources
            .insert_ignore(Source::new(work.id, &request.provider, &request.media_id))
            .await?;

        let mut provider_episodes = adapter
            .get_episodes(&request.media_id, request.target_episode)
            .await?;
        if request.kind == MediaKind::Movie {
            provider_episodes.truncate(1);
        }
        let total_episodes = provider_episodes.len().max(1);

        let mut imported_episodes = 0;
        let mut total_comments = 0i32;
        for (i, provider_episode) in provider_episodes.into_iter().enumerate() {
            let base = (i * 100 / total_episodes) as i32;
            let span = ((i + 1) * 100 / total_episodes) as i32 - base;

            let episode = self
                .episodes
                .create_if_absent(Episode {
                    title: provider_episode.title.clone(),
                    playback_url: provider_episode.playback_url.clone(),
                    ..Episode::new(source.id, provider_episode.index, provider_episode.provider_episode_id.clone())
                })
                .await?;

            let description = format!("fetching episode {} of {}", i + 1, total_episodes);
            let outer = Arc::clone(&progress);
            let on_segment_progress = move |done: usize, total: usize| {
                let pct = if total == 0 { 100 } else { ((done * 100) / total) as i32 };
                outer((base + pct * span / 100).min(99), &description);
            };

            let normalized = match adapter
                .get_comments(&episode.provider_episode_id, &on_segment_progress)
                .await
            {
                Ok(comments) => comments,
                Err(e) => {
                    // §7 "per-episode ... skipped; the outer task continues."
                    log_warn!(
                        "import: episode {} ({}/{}) comment fetch failed: {}",
                        episode.id,
                        request.provider,
                        episode.provider_episode_id,
                        e
                    );
                    continue;
                }
            };

            imported_episodes += 1;
            if normalized.is_empty() {
                continue;
            }

            let rows: Vec<Comment> = normalized
                .iter()
                .map(|c| Comment {
                    id: uuid::Uuid::new_v4(),
                    episode_id: episode.id,
                    cid: c.cid,
                    p: crate::modules::comment::build_p(c.t, c.mode, c.color, &request.provider),
                    m: c.text.clone(),
                    t: c.t,
                })
                .collect();
            let inserted = self.comments.insert_ignore_batch(episode.id, &rows).await?;
            total_comments += inserted;
            self.episodes
                .update_fetched(episode.id, Utc::now(), episode.comment_count + inserted)
                .await?;
        }

        let final_description = format!("imported {} episodes, {} comments", imported_episodes, total_comments);
        progress(100, &final_description);
        Ok(final_description)
    }

    /// §4.4.2 "Full refresh of a Source": clear episodes/comments
    /// transactionally, rerun generic import, but do not overwrite the
    /// existing poster.
    pub async fn refresh_source(
        &self,
        provider: &str,
        media_id: &str,
        progress: Arc<ProgressFn>,
    ) -> AppResult<String> {
        let source = self
            .sources
            .find_by_provider_media(provider, media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("source {}/{} not found", provider, media_id)))?;
        let work = self
            .works
            .get(source.work_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("work {} not found", source.work_id)))?;

        self.episodes.clear_for_source(source.id).await?;

        let request = GenericImportRequest {
            provider: provider.to_string(),
            media_id: media_id.to_string(),
            title: work.title,
            kind: work.media_kind,
            season: work.season,
            target_episode: None,
            poster_url: None,
            external_ids: None,
        };
        self.generic_import(request, progress).await
    }

    /// §4.4.3 "Single-episode refresh": clear Comments, reset
    /// `comment_count=0`, fetch, insert, update `fetched_at`.
    pub async fn refresh_episode(
        &self,
        provider: &str,
        provider_episode_id: &str,
        progress: Arc<ProgressFn>,
    ) -> AppResult<String> {
        let adapter = self
            .registry
            .find_adapter(provider)
            .await
            .ok_or_else(|| AppError::UnknownProvider(provider.to_string()))?;
        let (_source, episode) = self
            .episodes
            .find_by_provider_episode(provider, provider_episode_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("episode {}/{} not found", provider, provider_episode_id))
            })?;

        self.comments.clear_for_episode(episode.id).await?;

        let description = format!("refreshing episode {}", episode.episode_index);
        let outer = Arc::clone(&progress);
        let on_segment_progress = move |done: usize, total: usize| {
            let pct = if total == 0 { 100 } else { ((done * 100) / total) as i32 };
            outer(pct.min(99), &description);
        };
        let normalized = adapter
            .get_comments(&episode.provider_episode_id, &on_segment_progress)
            .await?;

        let rows: Vec<Comment> = normalized
            .iter()
            .map(|c| Comment {
                id: uuid::Uuid::new_v4(),
                episode_id: episode.id,
                cid: c.cid,
                p: crate::modules::comment::build_p(c.t, c.mode, c.color, provider),
                m: c.text.clone(),
                t: c.t,
            })
            .collect();
        let inserted = self.comments.insert_ignore_batch(episode.id, &rows).await?;
        self.episodes.update_fetched(episode.id, Utc::now(), inserted).await?;

        let final_description = format!("refreshed episode {} with {} comments", episode.episode_index, inserted);
        progress(100, &final_description);
        Ok(final_description)
    }

    async fn merge_external_ids(&self, work_id: uuid::Uuid, external: &ExternalIds) -> AppResult<()> {
        let mut metadata = self.works.get_metadata(work_id).await?;
        let incoming = WorkMetadata {
            work_id,
            tmdb_id: external.tmdb_id,
            tmdb_episode_group_id: external.tmdb_episode_group_id.clone(),
            bangumi_id: external.bangumi_id,
            tvdb_id: external.tvdb_id,
            douban_id: external.douban_id.clone(),
            imdb_id: external.imdb_id.clone(),
        };
        metadata.fill_absent(&incoming);
        self.works.upsert_metadata(&metadata).await
    }
}
