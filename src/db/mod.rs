use core::str::FromStr;

use serenity::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Executor, PgPool,
};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    immut_data::{consts::SCHEMA, dynamic::DatabaseCfg},
    model::{Member, MemberFilter, Title},
    util::strip_discriminator,
};

pub(crate) mod dao;

/// Query surface of the system-of-record.
#[async_trait]
pub(crate) trait MemberDirectory: Send + Sync {
    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>>;

    /// Looks a member up by Discord handle, ignoring case and legacy discriminators.
    async fn get_member(&self, discord_handle: &str) -> Result<Option<Member>>;

    async fn update_member_title(&self, id: i64, title: Title) -> Result<()>;
}

pub(crate) async fn connect(cfg: &DatabaseCfg) -> Result<PgPool> {
    let mut options = PgConnectOptions::from_str(&cfg.url)?;
    if let Some(password) = &cfg.password {
        options = options.password(password);
    }
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await?;
    pool.execute(SCHEMA).await?;
    info!("Connected to the member directory");
    Ok(pool)
}

#[async_trait]
impl MemberDirectory for PgPool {
    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, dao::Member>(
            "SELECT id, discord_handle, title FROM members \
            WHERE ($1::BOOLEAN IS NULL OR (NULLIF(btrim(discord_handle), '') IS NOT NULL) = $1) \
            AND ($2::TEXT IS NULL OR title = $2) \
            ORDER BY id",
        )
        .bind(filter.has_discord_handle)
        .bind(filter.title.map(Title::as_db_str))
        .fetch_all(self)
        .await?;
        debug!(count = rows.len(), "Listed members");
        rows.into_iter()
            .map(|row| Member::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn get_member(&self, discord_handle: &str) -> Result<Option<Member>> {
        let handle = strip_discriminator(discord_handle.trim());
        let row = sqlx::query_as::<_, dao::Member>(
            "SELECT id, discord_handle, title FROM members \
            WHERE lower(regexp_replace(btrim(discord_handle), '#[0-9]{4}$', '')) = lower($1) \
            ORDER BY id \
            LIMIT 1",
        )
        .bind(handle)
        .fetch_optional(self)
        .await?;
        row.map(Member::try_from).transpose().map_err(Error::from)
    }

    async fn update_member_title(&self, id: i64, title: Title) -> Result<()> {
        let res = sqlx::query("UPDATE members SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title.as_db_str())
            .execute(self)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::UnknownMemberId(id));
        }
        info!(member_id = id, %title, "Updated member title");
        Ok(())
    }
}
