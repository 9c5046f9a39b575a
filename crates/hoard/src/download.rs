use anyhow::{anyhow, bail, Result};
use futures::io::{AsyncReadExt, AsyncWriteExt};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// What a finished transfer wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub length: u64,
    pub content_type: Option<String>,
}

pub fn client(max_redirects: u8) -> surf::Client {
    surf::Client::new().with(RedirectMiddleware::new(max_redirects))
}

/// Stream `url` into `path`, reporting `(fetched, total)` after every chunk.
pub async fn fetch_to_file<F>(
    client: &surf::Client,
    url: &str,
    path: &Path,
    mut on_progress: F,
) -> Result<Fetched>
where
    F: FnMut(u64, Option<u64>),
{
    let mut response = client
        .get(url)
        .await
        .map_err(|e| anyhow!("Surf request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Download failed with status: {}", status);
    }

    let total = response.len().map(|len| len as u64);
    let content_type = response.content_type().map(|mime| mime.essence().to_string());
    on_progress(0, total);

    // Use std::fs to create file (workaround for potential async fs quirks in some envs)
    let std_file = std::fs::File::create(path)
        .map_err(|e| anyhow!("Failed to create file {:?}: {}", path, e))?;
    let mut file: async_std::fs::File = std_file.into();

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut fetched = 0u64;
    loop {
        let n = response
            .read(&mut buf)
            .await
            .map_err(|e| anyhow!("Streaming failed: {}", e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).await?;
        fetched += n as u64;
        on_progress(fetched, total);
    }
    file.flush().await?;

    if let Some(total) = total {
        if fetched != total {
            bail!("Truncated body: got {} of {} bytes", fetched, total);
        }
    }

    Ok(Fetched {
        length: fetched,
        content_type,
    })
}

struct RedirectMiddleware {
    max_attempts: u8,
}

impl RedirectMiddleware {
    pub fn new(max_attempts: u8) -> Self {
        Self { max_attempts }
    }
}

#[surf::utils::async_trait]
impl surf::middleware::Middleware for RedirectMiddleware {
    async fn handle(
        &self,
        req: surf::Request,
        client: surf::Client,
        next: surf::middleware::Next<'_>,
    ) -> surf::Result<surf::Response> {
        let mut attempts = 0;
        let mut current_req = req;

        loop {
            if attempts > self.max_attempts {
                return Err(surf::Error::from_str(
                    surf::StatusCode::LoopDetected,
                    "Too many redirects",
                ));
            }

            let response = next.run(current_req.clone(), client.clone()).await?;

            if response.status().is_redirection() {
                if let Some(location) = response.header("Location") {
                    let loc_str = location.last().as_str().to_string();

                    // Relative locations resolve against the request that produced them
                    let new_url = match surf::Url::parse(&loc_str) {
                        Ok(u) => u,
                        Err(_) => current_req.url().join(&loc_str).map_err(|_| {
                            surf::Error::from_str(
                                surf::StatusCode::BadGateway,
                                "Invalid redirect location",
                            )
                        })?,
                    };
                    log::debug!("redirect {} -> {}", current_req.url(), new_url);

                    current_req = surf::Request::new(current_req.method(), new_url);
                    attempts += 1;
                    continue;
                }
            }

            return Ok(response);
        }
    }
}
