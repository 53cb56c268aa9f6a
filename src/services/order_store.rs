use crate::{
    error::CheckoutError,
    models::{OrderRecord, OrderState},
};
use async_trait::async_trait;
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::ops::compute::{CompResult, Op};
use redis::AsyncCommands;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const MEMORY_CAPACITY: u64 = 100_000;

// KEYS[1] state, KEYS[2] outcome; ARGV[1] record, ARGV[2] ttl, ARGV[3..] states
// the write may replace.
const SET_STATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
  return 'TERMINAL'
end
local current = redis.call('GET', KEYS[1])
if current then
  local state = cjson.decode(current)['state']
  local allowed = false
  for i = 3, #ARGV do
    if ARGV[i] == state then
      allowed = true
    end
  end
  if not allowed then
    return state
  end
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
return 'OK'
"#;

/// Result of trying to record a terminal outcome for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// This caller recorded the outcome and owns its side effects.
    Claimed,
    /// Another callback already recorded an outcome; it is returned unchanged.
    AlreadyCompleted(OrderRecord),
}

/// Persistence for per-order payment state, keyed by `orderId`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get_order_state(&self, order_id: &str) -> Result<Option<OrderRecord>, CheckoutError>;

    /// Atomically writes an in-flight record if the state machine allows
    /// moving there from the current state. Rewriting the same in-flight
    /// state is allowed. Terminal records are refused here and must go
    /// through [`OrderStore::complete_order`]; once an order is terminal
    /// every write fails.
    async fn set_order_state(&self, order_id: &str, record: &OrderRecord) -> Result<(), CheckoutError>;

    /// Atomically records a terminal outcome. Exactly one concurrent caller
    /// per order observes [`Completion::Claimed`].
    async fn complete_order(&self, order_id: &str, record: &OrderRecord) -> Result<Completion, CheckoutError>;

    async fn ping(&self) -> bool;
}

fn accepts_write(current: OrderState, next: OrderState) -> bool {
    (current == next && !current.is_terminal()) || current.can_transition_to(next)
}

fn ensure_in_flight(order_id: &str, next: OrderState) -> Result<(), CheckoutError> {
    if next.is_terminal() {
        return Err(CheckoutError::OrderStore(format!(
            "{} for {} must be recorded with complete_order",
            next.as_str(),
            order_id
        )));
    }
    Ok(())
}

fn illegal_transition(order_id: &str, current: &str, next: OrderState) -> CheckoutError {
    CheckoutError::OrderStore(format!(
        "illegal transition for {}: {} -> {}",
        order_id,
        current,
        next.as_str()
    ))
}

/// Process-local store backed by two moka caches: one for in-flight state,
/// one for terminal outcomes.
pub struct MemoryOrderStore {
    states: Cache<String, OrderRecord>,
    outcomes: Cache<String, OrderRecord>,
    evicted_outcomes: Arc<AtomicU64>,
}

impl MemoryOrderStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MEMORY_CAPACITY)
    }

    /// Each cache holds at most `capacity` orders. An outcome evicted for
    /// size is forgotten, so a late replay of that order is claimed again.
    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        let evicted_outcomes = Arc::new(AtomicU64::new(0));
        let evicted = evicted_outcomes.clone();

        let outcomes = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .eviction_listener(move |order_id: Arc<String>, record: OrderRecord, cause| {
                if matches!(cause, RemovalCause::Size) {
                    evicted.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        order_id = %order_id,
                        state = record.state.as_str(),
                        capacity,
                        "Order outcome evicted at capacity, replay protection lost"
                    );
                }
            })
            .build();

        Self {
            states: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            outcomes,
            evicted_outcomes,
        }
    }

    /// Outcomes dropped for capacity (not TTL) since startup.
    pub fn evicted_outcomes(&self) -> u64 {
        self.evicted_outcomes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_order_state(&self, order_id: &str) -> Result<Option<OrderRecord>, CheckoutError> {
        if let Some(outcome) = self.outcomes.get(order_id).await {
            return Ok(Some(outcome));
        }
        Ok(self.states.get(order_id).await)
    }

    async fn set_order_state(&self, order_id: &str, record: &OrderRecord) -> Result<(), CheckoutError> {
        ensure_in_flight(order_id, record.state)?;

        if let Some(outcome) = self.outcomes.get(order_id).await {
            return Err(illegal_transition(order_id, outcome.state.as_str(), record.state));
        }

        // Reads consult `outcomes` first, so a write racing a claim stays hidden.
        let next = record.state;
        let result = self
            .states
            .entry(order_id.to_string())
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if !accepts_write(entry.value().state, next) => Op::Nop,
                    _ => Op::Put(record.clone()),
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Unchanged(current) => {
                Err(illegal_transition(order_id, current.value().state.as_str(), next))
            }
            _ => Ok(()),
        }
    }

    async fn complete_order(&self, order_id: &str, record: &OrderRecord) -> Result<Completion, CheckoutError> {
        let entry = self
            .outcomes
            .entry(order_id.to_string())
            .or_insert_with(async { record.clone() })
            .await;

        if entry.is_fresh() {
            self.states.invalidate(order_id).await;
            Ok(Completion::Claimed)
        } else {
            Ok(Completion::AlreadyCompleted(entry.into_value()))
        }
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// Redis-backed store. In-flight state lives under `order:{id}:state`,
/// written by a script that checks the transition server-side; terminal
/// outcomes live under `order:{id}:outcome`, written with `SET NX`.
pub struct RedisOrderStore {
    redis: redis::aio::ConnectionManager,
    set_state: redis::Script,
    ttl_secs: u64,
}

impl RedisOrderStore {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> Result<Self, CheckoutError> {
        let client = redis::Client::open(redis_url)?;
        let redis = client.get_connection_manager().await?;
        Ok(Self {
            redis,
            set_state: redis::Script::new(SET_STATE_SCRIPT),
            ttl_secs,
        })
    }

    fn state_key(order_id: &str) -> String {
        format!("order:{}:state", order_id)
    }

    fn outcome_key(order_id: &str) -> String {
        format!("order:{}:outcome", order_id)
    }

    async fn set_nx(&self, key: &str, record: &OrderRecord) -> Result<bool, CheckoutError> {
        let serialized = serde_json::to_string(record)?;
        let mut redis = self.redis.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut redis)
            .await?;
        Ok(reply.is_some())
    }

    async fn read(&self, key: &str) -> Result<Option<OrderRecord>, CheckoutError> {
        let mut redis = self.redis.clone();
        let cached: Option<String> = redis.get(key).await?;
        match cached {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderStore for RedisOrderStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get_order_state(&self, order_id: &str) -> Result<Option<OrderRecord>, CheckoutError> {
        if let Some(outcome) = self.read(&Self::outcome_key(order_id)).await? {
            return Ok(Some(outcome));
        }
        self.read(&Self::state_key(order_id)).await
    }

    async fn set_order_state(&self, order_id: &str, record: &OrderRecord) -> Result<(), CheckoutError> {
        ensure_in_flight(order_id, record.state)?;

        let serialized = serde_json::to_string(record)?;
        let mut invocation = self.set_state.prepare_invoke();
        invocation
            .key(Self::state_key(order_id))
            .key(Self::outcome_key(order_id))
            .arg(serialized)
            .arg(self.ttl_secs);
        for state in OrderState::ALL {
            if accepts_write(state, record.state) {
                invocation.arg(state.as_str());
            }
        }

        let mut redis = self.redis.clone();
        let reply: String = invocation.invoke_async(&mut redis).await?;

        match reply.as_str() {
            "OK" => Ok(()),
            "TERMINAL" => Err(illegal_transition(order_id, "completed", record.state)),
            current => Err(illegal_transition(order_id, current, record.state)),
        }
    }

    async fn complete_order(&self, order_id: &str, record: &OrderRecord) -> Result<Completion, CheckoutError> {
        let key = Self::outcome_key(order_id);

        if self.set_nx(&key, record).await? {
            let mut redis = self.redis.clone();
            if let Err(e) = redis.del::<_, ()>(Self::state_key(order_id)).await {
                tracing::warn!("Failed to clear in-flight state for {}: {}", order_id, e);
            }
            return Ok(Completion::Claimed);
        }

        match self.read(&key).await? {
            Some(existing) => Ok(Completion::AlreadyCompleted(existing)),
            // Expired between SET NX and GET.
            None => Err(CheckoutError::OrderStore(format!(
                "outcome for {} vanished during claim",
                order_id
            ))),
        }
    }

    async fn ping(&self) -> bool {
        let mut redis = self.redis.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut redis)
            .await
            .is_ok()
    }
}

/// Picks the Redis store when a URL is configured and reachable, falling
/// back to the in-process store otherwise.
pub async fn connect_order_store(redis_url: Option<&str>, ttl_secs: u64) -> Arc<dyn OrderStore> {
    if let Some(url) = redis_url {
        match RedisOrderStore::connect(url, ttl_secs).await {
            Ok(store) => {
                tracing::info!("Redis order store connected");
                return Arc::new(store);
            }
            Err(e) => {
                tracing::warn!("Redis connection failed: {}, using memory order store", e);
            }
        }
    } else {
        tracing::info!("No REDIS_URL configured, using memory order store");
    }

    Arc::new(MemoryOrderStore::new(Duration::from_secs(ttl_secs)))
}
