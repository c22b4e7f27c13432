use std::sync::Arc;

use uuid::Uuid;

use crate::modules::comment::{normalize_title, MediaKind};
use crate::modules::import::{GenericImportRequest, ImportEngine};
use crate::modules::jobs::{ProgressFn, TaskEngine, TaskFactory};
use crate::modules::persistence::{SourceRepository, WorkRepository};
use crate::modules::provider::{is_movie_phrase, ProviderRegistry};
use crate::shared::errors::{AppError, AppResult};

use super::similarity::{SimilarityStrategy, TokenSetRatioStrategy};
use super::types::MatchRequest;

/// §4.6 "Match Dispatcher (Webhook)".
pub struct MatchDispatcher {
    works: Arc<dyn WorkRepository>,
    sources: Arc<dyn SourceRepository>,
    registry: Arc<ProviderRegistry>,
    task_engine: Arc<TaskEngine>,
    import_engine: Arc<ImportEngine>,
    similarity: TokenSetRatioStrategy,
}

impl MatchDispatcher {
    pub fn new(
        works: Arc<dyn WorkRepository>,
        sources: Arc<dyn SourceRepository>,
        registry: Arc<ProviderRegistry>,
        task_engine: Arc<TaskEngine>,
        import_engine: Arc<ImportEngine>,
    ) -> Self {
        Self {
            works,
            sources,
            registry,
            task_engine,
            import_engine,
            similarity: TokenSetRatioStrategy,
        }
    }

    /// Runs the §4.6 algorithm end to end and returns the id of the
    /// generic-import task it emitted.
    pub async fn dispatch(&self, request: MatchRequest) -> AppResult<Uuid> {
        let normalized_title = normalize_title(&request.title);

        // Step 1: favorited-source shortcut.
        if let Some(work) = self.works.find_by_title_season(&normalized_title, request.season).await? {
            let sources = self.sources.list_for_work(work.id).await?;
            if let Some(favorited) = sources.into_iter().find(|s| s.favorited) {
                return self
                    .emit_import(
                        favorited.provider,
                        favorited.provider_media_id,
                        request.title.clone(),
                        request.kind,
                        request.season,
                        Some(request.episode),
                        request.external_ids.clone(),
                    )
                    .await;
            }
        }

        // Step 2: SearchAll across enabled providers.
        let candidates = self
            .registry
            .search_all(&[request.title.clone()], Some(request.episode))
            .await;

        // Step 3: filter by (coerced) kind and, for tv_series, season. The
        // movie-phrase coercion only ever reclassifies a tv_series result
        // — an OVA/other candidate whose title happens to contain a
        // movie keyword is left as-is.
        let mut filtered = Vec::new();
        for candidate in candidates {
            let (effective_kind, effective_season) =
                if candidate.media_kind == MediaKind::TvSeries && is_movie_phrase(&candidate.title) {
                    (MediaKind::Movie, 1)
                } else {
                    (candidate.media_kind, candidate.season)
                };
            if effective_kind != request.kind {
                continue;
            }
            if request.kind == MediaKind::TvSeries && effective_season != request.season {
                continue;
            }
            filtered.push(candidate);
        }

        // Step 4: rank by (fuzzy_token_set_ratio DESC, provider_display_order ASC).
        let mut scored = Vec::with_capacity(filtered.len());
        for candidate in filtered {
            let score = self.similarity.calculate(&request.title, &candidate.title);
            let display_order = self.registry.display_order(&candidate.provider).await;
            scored.push((candidate, score, display_order));
        }
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });

        let (best, _, _) = scored
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("no provider match for {:?}", request.title)))?;

        self.emit_import(
            best.provider,
            best.media_id,
            request.title,
            request.kind,
            request.season,
            Some(request.episode),
            request.external_ids,
        )
        .await
    }

    async fn emit_import(
        &self,
        provider: String,
        media_id: String,
        title: String,
        kind: MediaKind,
        season: i32,
        target_episode: Option<i32>,
        external_ids: Option<crate::modules::import::ExternalIds>,
    ) -> AppResult<Uuid> {
        let import_engine = Arc::clone(&self.import_engine);
        let task_title = format!("import {} ({})", title, provider);
        let request = GenericImportRequest {
            provider,
            media_id,
            title,
            kind,
            season,
            target_episode,
            poster_url: None,
            external_ids,
        };
        let factory: TaskFactory = Box::new(move |progress: Arc<ProgressFn>| {
            Box::pin(async move { import_engine.generic_import(request, progress).await })
        });
        self.task_engine.submit(task_title, factory).await
    }
}
