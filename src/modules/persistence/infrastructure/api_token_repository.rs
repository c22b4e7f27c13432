use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use crate::modules::comment::ApiToken;
use crate::modules::persistence::ApiTokenRepository;
use crate::schema::api_tokens;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::ApiTokenRow;

pub struct ApiTokenRepositoryImpl {
    db: Arc<Database>,
}

impl ApiTokenRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiTokenRepository for ApiTokenRepositoryImpl {
    async fn find(&self, token: &str) -> AppResult<Option<ApiToken>> {
        let token = token.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = api_tokens::table
                    .find(token)
                    .first::<ApiTokenRow>(conn)
                    .optional()?;
                Ok(row.map(|r| ApiToken {
                    token: r.token,
                    label: r.label,
                    enabled: r.enabled,
                    expires_at: r.expires_at,
                }))
            })
            .await
    }
}
