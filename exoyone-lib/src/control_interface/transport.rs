use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use log::debug;
use serde_json::Value;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{sleep, timeout};

use crate::error::{ExoyOneError, Result};
use crate::state::ExoyOneState;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

const GET_DATA: &[u8] = br#"{"getData": 1}"#;
const MAX_DATAGRAM_SIZE: usize = 4096;

/// Attempts per logical operation, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;
/// Smallest growth factor between consecutive backoff delays.
pub const MIN_BACKOFF_FACTOR: u32 = 2;

/// Exponential backoff applied to timed out attempts.
///
/// The attempt count is fixed at [`MAX_ATTEMPTS`]; only the delays are
/// configurable, and they always grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(Duration::from_millis(100), MIN_BACKOFF_FACTOR)
    }
}

impl RetryPolicy {
    /// A factor below [`MIN_BACKOFF_FACTOR`] is raised to it.
    pub fn new(base_delay: Duration, factor: u32) -> Self {
        RetryPolicy {
            base_delay,
            factor: factor.max(MIN_BACKOFF_FACTOR),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        MAX_ATTEMPTS
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let multiplier = self
            .factor
            .saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(multiplier)
    }
}

/// One request/reply exchange with the device per call.
///
/// Every attempt opens its own socket and drops it before returning, so no
/// association outlives an attempt, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transport {
    host: String,
    port: u16,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl Transport {
    pub fn new(host: &str, port: u16) -> Self {
        Transport {
            host: host.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Sends a command without waiting for any reply.
    pub async fn send(&self, request: &Value) -> Result<()> {
        let payload = serde_json::to_vec(request)?;
        let payload = payload.as_slice();
        self.with_retries("send", move || self.send_once(payload))
            .await
    }

    /// Fetches the full device state.
    pub async fn query(&self) -> Result<ExoyOneState> {
        self.with_retries("query", move || self.query_once()).await
    }

    /// Sends a command, then reads the state back. A timeout in either step
    /// retries the pair.
    pub async fn send_and_refresh(&self, request: &Value) -> Result<ExoyOneState> {
        let payload = serde_json::to_vec(request)?;
        let payload = payload.as_slice();
        self.with_retries("send_and_refresh", move || async move {
            self.send_once(payload).await?;
            self.query_once().await
        })
        .await
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, mut attempt_once: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.retry_policy.max_attempts();
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry_policy.delay_after(attempt);
                    debug!(
                        "{} to {}:{} timed out (attempt {}/{}), retrying in {:?}",
                        operation, self.host, self.port, attempt, max_attempts, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    debug!(
                        "{} to {}:{} gave up after {} attempts",
                        operation, self.host, self.port, attempt
                    );
                    return Err(self.timeout_error(attempt));
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, payload: &[u8]) -> Result<()> {
        let socket = self.open().await?;
        debug!("Sending {} bytes to {}:{}", payload.len(), self.host, self.port);
        self.within_timeout(socket.send(payload)).await?;
        Ok(())
    }

    async fn query_once(&self) -> Result<ExoyOneState> {
        let socket = self.open().await?;
        self.within_timeout(socket.send(GET_DATA)).await?;

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let received = self.within_timeout(socket.recv(&mut buffer)).await?;
        debug!(
            "Received {} bytes from {}:{}",
            received, self.host, self.port
        );
        ExoyOneState::from_slice(&buffer[..received])
    }

    async fn open(&self) -> Result<UdpSocket> {
        let address = self.resolve().await?;
        let local_address = if address.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local_address).await?;
        socket.connect(address).await?;
        Ok(socket)
    }

    async fn resolve(&self) -> Result<SocketAddr> {
        let mut addresses = self
            .within_timeout(lookup_host((self.host.as_str(), self.port)))
            .await?;
        addresses.next().ok_or_else(|| {
            ExoyOneError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", self.host),
            ))
        })
    }

    async fn within_timeout<T>(&self, operation: impl Future<Output = io::Result<T>>) -> Result<T> {
        match timeout(self.timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(self.timeout_error(1)),
        }
    }

    fn timeout_error(&self, attempts: u32) -> ExoyOneError {
        ExoyOneError::Timeout {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;
    use tokio::time::Instant;

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(10), 2)
    }

    #[test]
    fn test_backoff_grows_between_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert!(policy.delay_after(3) > policy.delay_after(2));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_flat_factor_still_grows() {
        for factor in [0, 1] {
            let policy = RetryPolicy::new(Duration::from_millis(100), factor);
            assert_eq!(policy.factor(), MIN_BACKOFF_FACTOR);
            assert!(policy.delay_after(2) > policy.delay_after(1));
            assert!(policy.delay_after(3) > policy.delay_after(2));
        }
    }

    #[tokio::test]
    async fn test_query_times_out_against_silent_peer() {
        // Bound but never answers, so every attempt runs into the timeout.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();

        let per_attempt = Duration::from_millis(50);
        let transport = Transport::new("127.0.0.1", port)
            .with_timeout(per_attempt)
            .with_retry_policy(fast_policy());

        let started = Instant::now();
        let result = transport.query().await;
        let elapsed = started.elapsed();

        assert_matches!(result, Err(ExoyOneError::Timeout { attempts: 3, .. }));
        assert!(elapsed >= per_attempt * 3);
        assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_zero_timeout_still_fails_fast() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let transport = Transport::new("127.0.0.1", port)
            .with_timeout(Duration::ZERO)
            .with_retry_policy(fast_policy());

        let started = Instant::now();
        assert_matches!(
            transport.send_and_refresh(&serde_json::json!({"togglePower": 1})).await,
            Err(ExoyOneError::Timeout { .. })
        );
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_non_timeout_errors_are_not_retried() {
        let transport = Transport::new("127.0.0.1", 1).with_retry_policy(fast_policy());
        let calls = AtomicU32::new(0);

        let result: Result<()> = transport
            .with_retries("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ExoyOneError::Validation("bad".to_string())) }
            })
            .await;

        assert_matches!(result, Err(ExoyOneError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_retry_until_success() {
        let transport = Transport::new("127.0.0.1", 1).with_retry_policy(fast_policy());
        let calls = AtomicU32::new(0);

        let result = transport
            .with_retries("test", || {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                let outcome = if call < 3 {
                    Err(transport.timeout_error(1))
                } else {
                    Ok(call)
                };
                async move { outcome }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_query_decodes_reply() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = device.local_addr().unwrap().port();
        let reply = crate::state::tests::sample_payload().to_string();

        let server = tokio::spawn(async move {
            let mut buffer = [0u8; 64];
            let (len, peer) = device.recv_from(&mut buffer).await.unwrap();
            assert_eq!(&buffer[..len], GET_DATA);
            device.send_to(reply.as_bytes(), peer).await.unwrap();
        });

        let state = Transport::new("127.0.0.1", port).query().await.unwrap();
        assert_eq!(state.mdns_name, "exoyone12345");
        server.await.unwrap();
    }
}
