//! Fetches the address book a deployment job publishes over HTTP. Jobs
//! publish the book once every contract is mined, so a server that is down
//! or has nothing to serve yet is polled again before giving up.

use std::time::Duration;

use eyre::{eyre, Report, Result};
use gammaswap_addresses::Addresses;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info};

/// Where a published address book lives and how patiently to wait for it.
#[derive(Clone, Debug)]
pub struct AddressBookSource {
    url: String,
    client: Client,
    attempts: usize,
    backoff: Duration,
}

enum FetchError {
    /// The book may show up later.
    NotYet(String),
    Fatal(Report),
}

impl AddressBookSource {
    pub fn new<S: Into<String>>(url: S) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
            attempts: 5,
            backoff: Duration::from_millis(500),
        })
    }

    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// The wait after the first failed attempt. Later waits grow linearly.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn fetch(&self) -> Result<Addresses> {
        let mut last_failure = String::new();
        for attempt in 1..=self.attempts {
            match self.fetch_once().await {
                Ok(addresses) => {
                    info!(url = %self.url, attempt, pools = addresses.pools.len(), "fetched address book");
                    return Ok(addresses);
                }
                Err(FetchError::Fatal(error)) => return Err(error),
                Err(FetchError::NotYet(reason)) => {
                    debug!(url = %self.url, attempt, %reason, "address book isn't available");
                    last_failure = reason;
                }
            }
            if attempt < self.attempts {
                sleep(self.backoff * attempt as u32).await;
            }
        }
        Err(eyre!(
            "couldn't fetch the address book from {} after {} attempts: {}",
            self.url,
            self.attempts,
            last_failure
        ))
    }

    async fn fetch_once(&self) -> Result<Addresses, FetchError> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Err(FetchError::NotYet(e.to_string()))
            }
            Err(e) => return Err(FetchError::Fatal(e.into())),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            return Err(FetchError::NotYet(format!("server answered {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Fatal(eyre!(
                "{} refused the address book request: {}",
                self.url,
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NotYet(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            FetchError::Fatal(eyre!("{} served a malformed address book: {}", self.url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use ethers::types::{Address, H256};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Serves `responses` to successive connections and repeats the last one
    /// once they run out. Returns the URL and a count of requests served.
    async fn serve(responses: Vec<String>) -> Result<(String, Arc<AtomicUsize>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/addresses.json", listener.local_addr()?);
        let served = Arc::new(AtomicUsize::new(0));
        let counter = served.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let reply = responses[index.min(responses.len() - 1)].clone();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        Ok((url, served))
    }

    fn book() -> Addresses {
        Addresses {
            cfmm_factory: Address::from_low_u64_be(0xf1),
            cfmm_init_code_hash: H256::repeat_byte(0x96),
            pool_factory: Address::from_low_u64_be(0xf2),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_waits_for_the_book_to_be_published() -> Result<()> {
        let json = serde_json::to_string(&book())?;
        let (url, served) = serve(vec![
            response("503 Service Unavailable", ""),
            response("404 Not Found", ""),
            response("200 OK", &json),
        ])
        .await?;

        let source = AddressBookSource::new(url)?.backoff(Duration::from_millis(1));
        assert_eq!(source.fetch().await?, book());
        assert_eq!(served.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_gives_up_on_refusals_and_malformed_books() -> Result<()> {
        let (url, served) = serve(vec![response("403 Forbidden", "")]).await?;
        let source = AddressBookSource::new(url)?.backoff(Duration::from_millis(1));
        let error = source.fetch().await.unwrap_err();
        assert!(error.to_string().contains("403"), "{}", error);
        assert_eq!(served.load(Ordering::SeqCst), 1);

        let (url, served) = serve(vec![response("200 OK", r#"{"tokens": 7}"#)]).await?;
        let source = AddressBookSource::new(url)?.backoff(Duration::from_millis(1));
        let error = source.fetch().await.unwrap_err();
        assert!(error.to_string().contains("malformed"), "{}", error);
        assert_eq!(served.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_retries_an_unreachable_server() -> Result<()> {
        // Nothing listens on a port once its listener is dropped.
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/addresses.json", listener.local_addr()?);
        drop(listener);

        let source = AddressBookSource::new(url)?
            .attempts(3)
            .backoff(Duration::from_millis(1));
        let error = source.fetch().await.unwrap_err();
        assert!(error.to_string().contains("after 3 attempts"), "{}", error);
        Ok(())
    }
}
