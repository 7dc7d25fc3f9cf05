//! Browser control over the Chrome `DevTools` Protocol.
//!
//! [`CdpFormDriver`] implements [`FormDriver`] with chromiumoxide. Controls
//! are addressed as `[name="<field>"]`; value injection, blur and state
//! capture run as page scripts so the driver sees exactly what the site's
//! own validation code sees.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::detector::{ControlSnapshot, SignalVocabulary};
use crate::driver::{DriverConfig, FormDriver};
use crate::result::{FormprobeError, FormprobeResult};

const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Attribute selector for a control name
fn name_selector(field: &str) -> String {
    let escaped = field.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[name=\"{escaped}\"]")
}

/// Wrap `body` in a function that receives the located control as `el`
/// (or `null`) and the JSON-encoded `args`
fn control_script(field: &str, args: &impl Serialize, body: &str) -> FormprobeResult<String> {
    let selector = serde_json::to_string(&name_selector(field))?;
    let args = serde_json::to_string(args)?;
    Ok(format!(
        "((el, args) => {{ {body} }})(document.querySelector({selector}), {args})"
    ))
}

const SET_VALUE: &str = r"
    if (!el) return false;
    el.focus();
    const proto = Object.getPrototypeOf(el);
    const setter = Object.getOwnPropertyDescriptor(proto, 'value');
    const next = args.append ? el.value + args.text : args.text;
    if (setter && setter.set) { setter.set.call(el, next); } else { el.value = next; }
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
";

const BLUR: &str = r"
    if (!el) return false;
    el.dispatchEvent(new FocusEvent('blur'));
    el.blur();
    return true;
";

const VISIBLE: &str = r"
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
";

const SNAPSHOT: &str = r"
    if (!el) return 'null';
    const attributes = {};
    const marker = el.getAttribute(args.attribute);
    if (marker !== null) attributes[args.attribute] = marker;
    const class_chain = [];
    let node = el;
    for (let i = 0; i <= args.depth && node; i++) {
        class_chain.push(node.getAttribute('class') || '');
        node = node.parentElement;
    }
    const style = getComputedStyle(el);
    const computed_style = {};
    for (const property of args.properties) {
        computed_style[property] = style.getPropertyValue(property);
    }
    return JSON.stringify({ attributes, class_chain, computed_style });
";

#[derive(Serialize)]
struct TextArgs<'a> {
    text: &'a str,
    append: bool,
}

#[derive(Serialize)]
struct SnapshotArgs<'a> {
    attribute: &'a str,
    depth: usize,
    properties: &'a [String],
}

/// Form driver backed by a real Chromium instance
#[derive(Debug)]
pub struct CdpFormDriver {
    config: DriverConfig,
    browser: CdpBrowser,
    page: Arc<Mutex<CdpPage>>,
    handle: tokio::task::JoinHandle<()>,
    url: String,
}

impl CdpFormDriver {
    /// Launch a browser and open a blank page
    pub async fn launch(config: DriverConfig) -> FormprobeResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout);

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| FormprobeError::BrowserLaunchError { message })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
            FormprobeError::BrowserLaunchError {
                message: e.to_string(),
            }
        })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FormprobeError::PageError {
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            browser,
            page: Arc::new(Mutex::new(page)),
            handle,
            url: String::from("about:blank"),
        })
    }

    /// Driver configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Current URL
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.url
    }

    /// Close the browser
    pub async fn close(mut self) -> FormprobeResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| FormprobeError::BrowserLaunchError {
                message: e.to_string(),
            })?;
        self.handle.abort();
        Ok(())
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> FormprobeResult<T> {
        let page = self.page.lock().await;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| FormprobeError::EvaluationError {
                message: e.to_string(),
            })?;
        result
            .into_value()
            .map_err(|e| FormprobeError::EvaluationError {
                message: e.to_string(),
            })
    }

    async fn run_on_control(&self, field: &str, args: &impl Serialize, body: &str) -> FormprobeResult<()> {
        let found: bool = self.eval(control_script(field, args, body)?).await?;
        if found {
            Ok(())
        } else {
            Err(FormprobeError::InputError {
                message: format!("no control named '{field}'"),
            })
        }
    }

    async fn write_text(&self, field: &str, text: &str, append: bool) -> FormprobeResult<()> {
        self.run_on_control(field, &TextArgs { text, append }, SET_VALUE)
            .await
    }
}

#[async_trait]
impl FormDriver for CdpFormDriver {
    async fn goto(&mut self, url: &str) -> FormprobeResult<()> {
        {
            let page = self.page.lock().await;
            page.goto(url)
                .await
                .map_err(|e| FormprobeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
        }
        debug!(url, "navigated");
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_for_visible(&self, field: &str, timeout: Duration) -> FormprobeResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let visible: bool = self.eval(control_script(field, &(), VISIBLE)?).await?;
            if visible {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(FormprobeError::Timeout {
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn clear(&mut self, field: &str) -> FormprobeResult<()> {
        self.write_text(field, "", false).await
    }

    async fn fill(&mut self, field: &str, value: &str) -> FormprobeResult<()> {
        let page = self.page.lock().await;
        let element = page
            .find_element(name_selector(field))
            .await
            .map_err(|e| FormprobeError::InputError {
                message: e.to_string(),
            })?;
        element
            .focus()
            .await
            .map_err(|e| FormprobeError::InputError {
                message: e.to_string(),
            })?;
        element
            .type_str(value)
            .await
            .map_err(|e| FormprobeError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn set_value_by_script(&mut self, field: &str, value: &str) -> FormprobeResult<()> {
        self.write_text(field, value, false).await
    }

    async fn append_text(&mut self, field: &str, text: &str) -> FormprobeResult<()> {
        self.write_text(field, text, true).await
    }

    async fn blur(&mut self, field: &str) -> FormprobeResult<()> {
        self.run_on_control(field, &(), BLUR).await
    }

    async fn submit(&mut self) -> FormprobeResult<()> {
        let page = self.page.lock().await;
        let button = page
            .find_element(self.config.submit_selector.as_str())
            .await
            .map_err(|e| FormprobeError::PageError {
                message: format!("submit control '{}': {e}", self.config.submit_selector),
            })?;
        button.click().await.map_err(|e| FormprobeError::PageError {
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn control_snapshot(
        &self,
        field: &str,
        vocabulary: &SignalVocabulary,
    ) -> FormprobeResult<Option<ControlSnapshot>> {
        let args = SnapshotArgs {
            attribute: &vocabulary.invalid_attribute,
            depth: vocabulary.ancestor_depth,
            properties: &vocabulary.style_properties,
        };
        // Encoded as a string so an absent control round-trips as `null`
        let encoded: String = self.eval(control_script(field, &args, SNAPSHOT)?).await?;
        Ok(serde_json::from_str(&encoded)?)
    }

    async fn screenshot(&self) -> FormprobeResult<Vec<u8>> {
        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .capture_beyond_viewport(true)
            .build();

        let screenshot = page
            .execute(params)
            .await
            .map_err(|e| FormprobeError::ScreenshotError {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| FormprobeError::ScreenshotError {
                message: e.to_string(),
            })
    }
}
