use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use uuid::Uuid;

use crate::modules::comment::{TmdbEpisodeMapping, WorkMetadata};
use crate::modules::metadata::{extract_aliases, TmdbClient, TmdbEpisodeGroup};
use crate::modules::persistence::{TmdbMappingRepository, WorkRepository};
use crate::shared::errors::AppResult;
use crate::{log_info, log_warn};

use super::job::ScheduledJob;

fn season_only_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^season \d+$").expect("season-only pattern is valid"))
}

/// §4.5.1 step 1's episode-group selection algorithm, pulled out so it can
/// be exercised without a network call.
fn select_group(groups: &[TmdbEpisodeGroup]) -> Option<&TmdbEpisodeGroup> {
    let remaining: Vec<&TmdbEpisodeGroup> =
        groups.iter().filter(|g| !season_only_pattern().is_match(&g.name)).collect();

    if let Some(exact) = remaining.iter().find(|g| g.name.eq_ignore_ascii_case("seasons")) {
        return Some(exact);
    }
    if let Some(contains) = remaining.iter().find(|g| g.name.to_lowercase().contains("seasons")) {
        return Some(contains);
    }
    remaining.into_iter().next()
}

/// §4.5.1 "TMDB auto-map job": for every Work with a TMDB id but no
/// episode-group mapping yet, resolve the canonical episode group,
/// replace its `TmdbEpisodeMapping` rows and fill empty alias slots.
pub struct TmdbAutoMapJob {
    works: Arc<dyn WorkRepository>,
    mappings: Arc<dyn TmdbMappingRepository>,
    tmdb: Arc<dyn TmdbClient>,
}

impl TmdbAutoMapJob {
    pub fn new(
        works: Arc<dyn WorkRepository>,
        mappings: Arc<dyn TmdbMappingRepository>,
        tmdb: Arc<dyn TmdbClient>,
    ) -> Self {
        Self { works, mappings, tmdb }
    }

    async fn map_one(&self, work_id: Uuid, mut metadata: WorkMetadata) -> AppResult<()> {
        let tmdb_id = match metadata.tmdb_id {
            Some(id) => id,
            None => return Ok(()),
        };

        let groups = self.tmdb.episode_groups(tmdb_id).await?;
        let chosen = match select_group(&groups) {
            Some(g) => g.clone(),
            None => {
                log_warn!("tmdb auto-map: no episode group candidates for tv {}", tmdb_id);
                return Ok(());
            }
        };

        metadata.tmdb_episode_group_id = Some(chosen.id.clone());
        self.works.upsert_metadata(&metadata).await?;

        let detail = self.tmdb.episode_group_detail(&chosen.id).await?;
        let mut seasons = detail.groups;
        seasons.sort_by_key(|s| s.order);

        let mut rows = Vec::new();
        for season in &seasons {
            for (index, episode) in season.episodes.iter().enumerate() {
                rows.push(TmdbEpisodeMapping {
                    id: Uuid::new_v4(),
                    tmdb_tv_id: tmdb_id,
                    group_id: chosen.id.clone(),
                    tmdb_episode_id: episode.id,
                    native_season_number: episode.season_number,
                    native_episode_number: episode.episode_number,
                    custom_season_number: season.order,
                    custom_episode_number: (index + 1) as i32,
                    absolute_episode_number: episode.order + 1,
                });
            }
        }
        self.mappings.replace_for_group(&chosen.id, rows).await?;

        let tv = self.tmdb.tv_with_alternative_titles(tmdb_id).await?;
        if let Some(titles) = tv.alternative_titles {
            let candidates = extract_aliases(&titles.results);
            let mut aliases = self.works.get_aliases(work_id).await?;
            if aliases.alias_en.is_none() {
                aliases.alias_en = candidates.en;
            }
            if aliases.alias_jp.is_none() {
                aliases.alias_jp = candidates.jp;
            }
            if aliases.alias_romaji.is_none() {
                aliases.alias_romaji = candidates.romaji;
            }
            for cn in candidates.cn {
                aliases.fill_cn_slot(cn);
            }
            self.works.upsert_aliases(&aliases).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ScheduledJob for TmdbAutoMapJob {
    fn job_type(&self) -> &'static str {
        "tmdb_auto_map"
    }

    async fn run(&self) -> AppResult<()> {
        let pending = self.works.list_pending_tmdb_mapping().await?;
        log_info!("tmdb auto-map: {} work(s) pending", pending.len());

        for (work, metadata) in pending {
            if let Err(err) = self.map_one(work.id, metadata).await {
                log_warn!("tmdb auto-map failed for work {}: {}", work.id, err);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, name: &str) -> TmdbEpisodeGroup {
        TmdbEpisodeGroup { id: id.to_string(), name: name.to_string() }
    }

    #[test]
    fn drops_season_only_groups() {
        let groups = vec![group("a", "Season 1"), group("b", "Specials")];
        assert_eq!(select_group(&groups).map(|g| g.id.as_str()), Some("b"));
    }

    #[test]
    fn prefers_exact_seasons_name() {
        let groups = vec![group("a", "All Seasons Combined"), group("b", "Seasons")];
        assert_eq!(select_group(&groups).map(|g| g.id.as_str()), Some("b"));
    }

    #[test]
    fn falls_back_to_name_containing_seasons() {
        let groups = vec![group("a", "Original Seasons"), group("b", "Alternative Cut")];
        assert_eq!(select_group(&groups).map(|g| g.id.as_str()), Some("a"));
    }

    #[test]
    fn falls_back_to_first_remaining() {
        let groups = vec![group("a", "Season 1"), group("b", "Remastered"), group("c", "Director's Cut")];
        assert_eq!(select_group(&groups).map(|g| g.id.as_str()), Some("b"));
    }

    #[test]
    fn no_candidates_returns_none() {
        let groups = vec![group("a", "Season 1"), group("b", "Season 2")];
        assert!(select_group(&groups).is_none());
    }
}
