//! Browser session manager.
//!
//! Owns one automated Chromium instance per scrape, launched with
//! anti-automation-detection countermeasures: the AutomationControlled
//! blink feature is disabled and the `navigator.webdriver` property is
//! cleared after navigation, since page scripts commonly probe both.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{EngineConfig, ExtractionRules};
use crate::engine::driver::SessionDriver;
use crate::engine::error::EngineError;

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

/// Script cleared into every loaded document; mirrors what detection
/// scripts probe first.
const WEBDRIVER_MASK: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Well-known Chromium-family install locations, probed after the env
/// override and PATH.
const BROWSER_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Find a usable browser executable: `CHROME_EXECUTABLE` env override,
/// then PATH, then well-known locations.
pub fn find_browser_executable() -> Option<String> {
    if let Ok(path) = std::env::var("CHROME_EXECUTABLE") {
        if std::path::Path::new(&path).exists() {
            return Some(path);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    BROWSER_PATHS
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .map(|path| path.to_string())
}

/// One automated browser session, exclusively owned by one scrape call.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    rules: ExtractionRules,
    released: bool,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Launch the automation runtime. Failure here is fatal and never
    /// retried by the engine.
    pub async fn launch(
        config: &EngineConfig,
        rules: ExtractionRules,
    ) -> Result<Self, EngineError> {
        let executable = config
            .browser_executable
            .clone()
            .or_else(find_browser_executable)
            .ok_or_else(|| {
                EngineError::environment(
                    "no Chromium-family executable found; set CHROME_EXECUTABLE or install chromium",
                )
            })?;

        info!("launching browser (headless={})", config.headless);

        let mut builder = BrowserConfig::builder().chrome_executable(executable);
        if !config.headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-gpu");
        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder.build().map_err(EngineError::environment)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::environment(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::environment(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            handler_task,
            rules,
            released: false,
        })
    }

    /// Run a script that iterates a selector list, returning its value or
    /// a default when evaluation fails mid-render.
    async fn evaluate_count(&self, script: String) -> i64 {
        match self.page.evaluate(script).await {
            Ok(result) => result.into_value::<i64>().unwrap_or(0),
            Err(e) => {
                warn!("page script failed: {e}");
                0
            }
        }
    }

    fn selector_json(selectors: &[String]) -> String {
        serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionDriver for BrowserSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        let load = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(timeout, load).await {
            Ok(Ok(())) => {
                // Defeats the common navigator.webdriver probe.
                if let Err(e) = self.page.evaluate(WEBDRIVER_MASK).await {
                    warn!("webdriver mask failed: {e}");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::navigation(url, e.to_string())),
            Err(_) => Err(EngineError::navigation(
                url,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        }
    }

    async fn prepare(&mut self) -> bool {
        let script = format!(
            r#"(() => {{
                const selectors = {selectors};
                for (const sel of selectors) {{
                    let nodes;
                    try {{ nodes = document.querySelectorAll(sel); }} catch (e) {{ continue; }}
                    for (const el of nodes) {{
                        const label = ((el.innerText || '') + ' ' +
                            (el.getAttribute('aria-label') || '')).toLowerCase();
                        if (label.includes('review') && !label.includes('menu') &&
                            el.offsetParent !== null) {{
                            el.click();
                            return 1;
                        }}
                    }}
                }}
                return 0;
            }})()"#,
            selectors = Self::selector_json(&self.rules.tab_selectors),
        );
        self.evaluate_count(script).await > 0
    }

    async fn advance(&mut self) {
        let script = format!(
            r#"(() => {{
                window.scrollTo(0, document.body.scrollHeight);
                const panes = {panes};
                for (const sel of panes) {{
                    let nodes;
                    try {{ nodes = document.querySelectorAll(sel); }} catch (e) {{ continue; }}
                    for (const pane of nodes) {{
                        pane.scrollTop = pane.scrollHeight;
                    }}
                }}
                let clicked = 0;
                const more = {more};
                for (const sel of more) {{
                    let nodes;
                    try {{ nodes = document.querySelectorAll(sel); }} catch (e) {{ continue; }}
                    for (const btn of Array.from(nodes).slice(0, 3)) {{
                        if (btn.offsetParent !== null && !btn.disabled) {{
                            btn.click();
                            clicked += 1;
                        }}
                    }}
                }}
                return clicked;
            }})()"#,
            panes = Self::selector_json(&self.rules.scroll_pane_selectors),
            more = Self::selector_json(&self.rules.load_more_selectors),
        );
        self.evaluate_count(script).await;
    }

    async fn page_html(&mut self) -> Option<String> {
        match self.page.content().await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("snapshot failed: {e}");
                None
            }
        }
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {e}");
        }
        self.handler_task.abort();
        info!("browser session released");
    }
}

// Stub for when browser support is not compiled in. Launch always fails
// with an environment error; the engine never sees an instance.
#[cfg(not(feature = "browser"))]
pub struct BrowserSession;

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn launch(
        _config: &EngineConfig,
        _rules: ExtractionRules,
    ) -> Result<Self, EngineError> {
        Err(EngineError::environment(
            "browser support not compiled; rebuild with: cargo build --features browser",
        ))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl SessionDriver for BrowserSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), EngineError> {
        Err(EngineError::navigation(url, "browser support not compiled"))
    }

    async fn prepare(&mut self) -> bool {
        false
    }

    async fn advance(&mut self) {}

    async fn page_html(&mut self) -> Option<String> {
        None
    }

    async fn release(&mut self) {}
}
