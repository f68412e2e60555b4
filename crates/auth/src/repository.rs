use super::*;
use gk_core::Uid;
use gk_database::*;
use std::sync::Arc;
use tokio_postgres::Client;

const SELECT_USER: &str =
    const_format::concatcp!("SELECT uid, banned FROM ", USERS, " WHERE uid = $1");
const TOUCH_USER: &str =
    const_format::concatcp!("UPDATE ", USERS, " SET lastonline = NOW() WHERE uid = $1");
const SELECT_SESSION: &str = const_format::concatcp!(
    "SELECT sess::text FROM ",
    SESSIONS,
    " WHERE sid = $1 AND expire > NOW()"
);

/// Users live in `users(uid BIGINT, banned BOOLEAN, lastonline TIMESTAMPTZ)`.
#[async_trait::async_trait]
impl UserStore for Arc<Client> {
    async fn fields(&self, uid: Uid) -> anyhow::Result<Option<UserFields>> {
        let row = self.query_opt(SELECT_USER, &[&(uid as i64)]).await?;
        Ok(row.map(|row| UserFields {
            uid: row.get::<_, i64>(0).max(0) as Uid,
            banned: row.get::<_, Option<bool>>(1).unwrap_or(false),
        }))
    }

    async fn touch(&self, uid: Uid) -> anyhow::Result<()> {
        let n = self.execute(TOUCH_USER, &[&(uid as i64)]).await?;
        if n == 0 {
            anyhow::bail!("user {} not found", uid);
        }
        Ok(())
    }
}

/// Sessions live in `session(sid VARCHAR, sess JSON, expire TIMESTAMPTZ)`,
/// the layout express session stores write. Expired rows are invisible.
#[async_trait::async_trait]
impl SessionLayer for Arc<Client> {
    async fn load(&self, sid: &str) -> anyhow::Result<Option<SessionRef>> {
        self.query_opt(SELECT_SESSION, &[&sid])
            .await?
            .map(|row| SessionRef::from_json(&row.get::<_, String>(0)))
            .transpose()
    }
}
