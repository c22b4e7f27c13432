// Diesel table definitions for the entities in spec.md §3.
//
// Hand-written rather than `diesel print-schema`-generated because no
// migrations/database are available in this environment; the shapes
// mirror the `Work`/`Source`/`Episode`/... structs in
// `modules::comment::entities` field-for-field.

diesel::table! {
    use diesel::sql_types::*;

    works (id) {
        id -> Uuid,
        title -> Varchar,
        media_kind -> Varchar,
        season -> Integer,
        poster_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    work_metadata (work_id) {
        work_id -> Uuid,
        tmdb_id -> Nullable<Integer>,
        tmdb_episode_group_id -> Nullable<Varchar>,
        bangumi_id -> Nullable<Integer>,
        tvdb_id -> Nullable<Integer>,
        douban_id -> Nullable<Varchar>,
        imdb_id -> Nullable<Varchar>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    work_aliases (work_id) {
        work_id -> Uuid,
        alias_en -> Nullable<Varchar>,
        alias_jp -> Nullable<Varchar>,
        alias_romaji -> Nullable<Varchar>,
        alias_cn_1 -> Nullable<Varchar>,
        alias_cn_2 -> Nullable<Varchar>,
        alias_cn_3 -> Nullable<Varchar>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    sources (id) {
        id -> Uuid,
        work_id -> Uuid,
        provider -> Varchar,
        provider_media_id -> Varchar,
        favorited -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    episodes (id) {
        id -> Uuid,
        source_id -> Uuid,
        episode_index -> Integer,
        title -> Nullable<Varchar>,
        playback_url -> Nullable<Varchar>,
        provider_episode_id -> Varchar,
        fetched_at -> Nullable<Timestamptz>,
        comment_count -> Integer,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    comments (id) {
        id -> Uuid,
        episode_id -> Uuid,
        cid -> BigInt,
        p -> Varchar,
        m -> Text,
        t -> Double,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    tmdb_episode_mappings (id) {
        id -> Uuid,
        tmdb_tv_id -> Integer,
        group_id -> Varchar,
        tmdb_episode_id -> Integer,
        native_season_number -> Integer,
        native_episode_number -> Integer,
        custom_season_number -> Integer,
        custom_episode_number -> Integer,
        absolute_episode_number -> Integer,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    scraper_settings (provider_name) {
        provider_name -> Varchar,
        is_enabled -> Bool,
        display_order -> Integer,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    api_tokens (token) {
        token -> Varchar,
        label -> Varchar,
        enabled -> Bool,
        expires_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    scheduled_tasks (id) {
        id -> Uuid,
        name -> Varchar,
        job_type -> Varchar,
        cron_expression -> Varchar,
        enabled -> Bool,
        last_run -> Nullable<Timestamptz>,
        next_run -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    task_history (id) {
        id -> Uuid,
        title -> Varchar,
        status -> Varchar,
        progress -> Integer,
        description -> Text,
        created_at -> Timestamptz,
        finished_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    cache_entries (provider, key) {
        provider -> Varchar,
        key -> Varchar,
        value_json -> Jsonb,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    config_kv (key) {
        key -> Varchar,
        value -> Text,
    }
}

diesel::joinable!(work_metadata -> works (work_id));
diesel::joinable!(work_aliases -> works (work_id));
diesel::joinable!(sources -> works (work_id));
diesel::joinable!(episodes -> sources (source_id));
diesel::joinable!(comments -> episodes (episode_id));

diesel::allow_tables_to_appear_in_same_query!(
    works,
    work_metadata,
    work_aliases,
    sources,
    episodes,
    comments,
    tmdb_episode_mappings,
    scraper_settings,
    api_tokens,
    scheduled_tasks,
    task_history,
    cache_entries,
    config_kv,
);
