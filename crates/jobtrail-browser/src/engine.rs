use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Rate limiter per domain.
///
/// Tracks the last navigation per domain and enforces a minimum delay
/// between navigations to the same host.
#[derive(Debug)]
struct RateLimiter {
    last_access: HashMap<String, Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay_ms: u64) -> Self {
        Self {
            last_access: HashMap::new(),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Time still to wait before the next navigation to `domain` is allowed.
    fn remaining(&self, domain: &str) -> Option<Duration> {
        self.last_access.get(domain).and_then(|last| {
            let elapsed = last.elapsed();
            (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
        })
    }

    fn mark(&mut self, domain: &str) {
        self.last_access.insert(domain.to_string(), Instant::now());
    }
}

/// Browser automation engine.
///
/// Owns the chromium process; hands out one [`PageSession`] per adapter run.
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    nav_timeout: Duration,
}

impl BrowserEngine {
    /// Launch a browser with the given application settings.
    pub async fn launch(config: &jobtrail_core::BrowserConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP event loop for the lifetime of the browser
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler_task,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_delay_ms))),
            nav_timeout: Duration::from_secs(config.nav_timeout_secs),
        })
    }

    /// Open a fresh page for one adapter run.
    ///
    /// The session shares the engine's rate limiter, so navigations across
    /// sessions still respect the per-domain delay.
    pub async fn new_session(&self) -> Result<PageSession> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        Ok(PageSession {
            page,
            rate_limiter: self.rate_limiter.clone(),
            nav_timeout: self.nav_timeout,
        })
    }

    /// Close the browser and stop the event loop.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        self.handler_task.abort();
        Ok(())
    }
}

/// One exclusive browser page, used for the duration of a single adapter's
/// operations. Listing fetch and applied fetch run sequentially on the same
/// session because both may depend on shared authenticated state.
pub struct PageSession {
    page: Page,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    nav_timeout: Duration,
}

impl PageSession {
    /// Navigate to a URL and wait for the load to settle.
    ///
    /// Applies the per-domain rate limit before navigating and the
    /// engine-wide timeout around the whole call. A timeout maps to
    /// [`BrowserError::Timeout`], which callers treat as a network failure.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let domain = crate::extract_domain(url)?;

        let wait = {
            let limiter = self.rate_limiter.lock().await;
            limiter.remaining(&domain)
        };
        if let Some(wait) = wait {
            tracing::debug!(domain = %domain, ?wait, "rate limit: delaying navigation");
            tokio::time::sleep(wait).await;
        }

        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
            Ok::<(), BrowserError>(())
        };

        tokio::time::timeout(self.nav_timeout, nav)
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))??;

        self.rate_limiter.lock().await.mark(&domain);
        Ok(())
    }

    /// Full HTML content of the current page.
    pub async fn content(&self) -> Result<String> {
        tokio::time::timeout(self.nav_timeout, self.page.content())
            .await
            .map_err(|_| BrowserError::Timeout("page content".to_string()))?
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    /// Visible text of the document body.
    ///
    /// Useful after navigating directly to a JSON endpoint, where the body
    /// text is the raw response.
    pub async fn body_text(&self) -> Result<String> {
        let result = tokio::time::timeout(
            self.nav_timeout,
            self.page.evaluate("document.body.innerText"),
        )
        .await
        .map_err(|_| BrowserError::Timeout("body text".to_string()))?
        .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        result
            .into_value::<String>()
            .map_err(|e| BrowserError::ChromiumError(format!("body text: {e}")))
    }

    /// Fill a form field located by CSS selector.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    /// Click an element located by CSS selector.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    /// Wait for a selector to appear, polling until `timeout_ms` elapses.
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!("waiting for {selector}")));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Whether an element matching the selector currently exists.
    pub async fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    /// Inner text of the first element matching the selector, if any.
    pub async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        match self.page.find_element(selector).await {
            Ok(element) => element
                .inner_text()
                .await
                .map_err(|e| BrowserError::ChromiumError(e.to_string())),
            Err(_) => Ok(None),
        }
    }
}
