use crate::error::Result;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct RedisClient {
    manager: Arc<Mutex<ConnectionManager>>,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    // Fixed-window rate limiting. INCR and EXPIRE NX go out as one MULTI/EXEC
    // so the window always has an expiry once the counter exists (Redis 7+).
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_seconds: usize,
    ) -> Result<bool> {
        let mut conn = self.manager.lock().await;
        let key = rate_limit_key(key);

        let (count,): (u32,) = rate_limit_pipeline(&key, window_seconds)
            .query_async(&mut *conn)
            .await?;

        Ok(count <= limit)
    }

    // Session management
    pub async fn store_session(
        &self,
        session_id: &str,
        user_id: &str,
        ttl_seconds: usize,
    ) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let key = format!("session:{}", session_id);

        let _: () = conn.set_ex(key, user_id, ttl_seconds as u64).await?;
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.manager.lock().await;
        let key = format!("session:{}", session_id);

        let user_id: Option<String> = conn.get(key).await?;
        Ok(user_id)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let key = format!("session:{}", session_id);

        let _: () = conn.del(key).await?;
        Ok(())
    }
}

fn rate_limit_key(key: &str) -> String {
    format!("rate_limit:{}", key)
}

fn rate_limit_pipeline(key: &str, window_seconds: usize) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_seconds)
        .arg("NX")
        .ignore();
    pipe
}
