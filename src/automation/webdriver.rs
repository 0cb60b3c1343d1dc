//! W3C WebDriver client. Talks JSON over HTTP to a running driver server
//! (chromedriver by default) and maps its error codes onto `UiError`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use spdlog::{debug, info, warn};

use crate::automation::{Browser, Element, Locator, UiError, UiResult};
use crate::config::BrowserConfig;

/// Key the protocol uses for element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Extra time on top of the page load timeout before an HTTP call is abandoned.
const REQUEST_GRACE: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct WireResponse<T> {
    value: T,
}

#[derive(Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

pub struct WebDriverBrowser {
    agent: ureq::Agent,
    base_url: String,
    session_id: String,
}

impl WebDriverBrowser {
    /// Opens a new browser session. Any failure here is a session error.
    pub fn start(config: &BrowserConfig) -> UiResult<WebDriverBrowser> {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.page_load_timeout_secs) + REQUEST_GRACE)
            .build();
        let base_url = config.webdriver_url.trim_end_matches('/').to_string();

        let session: NewSession = Self::send(&agent, "POST", &format!("{}/session", base_url), Some(&Self::capabilities(config)))
            .map_err(|e| UiError::Session(format!("Could not start browser: {}", e)))?;

        let mut browser = WebDriverBrowser {
            agent,
            base_url,
            session_id: session.session_id,
        };

        let timeouts = browser.command::<Value>("POST", "timeouts", Some(json!({
            "implicit": config.implicit_wait_secs * 1000,
            "pageLoad": config.page_load_timeout_secs * 1000,
        })));
        if let Err(e) = timeouts {
            // the window is already open, don't leave it behind
            if let Err(quit_err) = browser.quit() {
                warn!("Could not close half-started session {}: {}", browser.session_id, quit_err);
            }
            return Err(UiError::Session(format!("Could not set browser timeouts: {}", e)));
        }

        info!("Browser setup successful (session {})", browser.session_id);
        Ok(browser)
    }

    fn capabilities(config: &BrowserConfig) -> Value {
        let mut args = vec![format!("--window-size={},{}", config.window_width, config.window_height)];
        if config.headless {
            args.push("--headless=new".to_string());
        } else {
            args.push("--start-maximized".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }

    fn send<T: DeserializeOwned>(agent: &ureq::Agent, method: &str, url: &str, body: Option<&Value>) -> UiResult<T> {
        debug!("WebDriver {} {}", method, url);
        let request = agent.request(method, url).set("Accept", "application/json");
        let response = match body {
            Some(body) => request
                .set("Content-Type", "application/json; charset=utf-8")
                .send_string(&body.to_string()),
            None => request.call(),
        };

        match response {
            Ok(resp) => {
                let text = resp.into_string()
                    .map_err(|e| UiError::Command(format!("Error reading WebDriver response: {}", e)))?;
                let parsed: WireResponse<T> = serde_json::from_str(&text)
                    .map_err(|e| UiError::Command(format!("Unexpected WebDriver response: {}", e)))?;
                Ok(parsed.value)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(match serde_json::from_str::<WireResponse<WireError>>(&text) {
                    Ok(wire) => error_from_code(&wire.value.error, &wire.value.message),
                    Err(_) => UiError::Command(format!("HTTP {} from WebDriver", code)),
                })
            }
            Err(ureq::Error::Transport(err)) => Err(UiError::Session(format!("WebDriver unreachable: {}", err))),
        }
    }

    fn command<T: DeserializeOwned>(&self, method: &str, path: &str, body: Option<Value>) -> UiResult<T> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        // POST always carries a JSON body, even an empty one
        let body = match (method, body) {
            ("POST", None) => Some(json!({})),
            (_, body) => body,
        };
        Self::send(&self.agent, method, &url, body.as_ref())
    }

    fn element_command<T: DeserializeOwned>(&self, method: &str, element: &Element, action: &str, body: Option<Value>) -> UiResult<T> {
        self.command(method, &format!("element/{}/{}", element.0, action), body)
    }

    fn locator_body(locator: &Locator) -> Value {
        let (using, value) = match locator {
            Locator::Id(id) => ("css selector", format!("[id=\"{}\"]", id)),
            Locator::Css(css) => ("css selector", css.clone()),
            Locator::ClassName(class) => ("css selector", format!(".{}", class)),
            Locator::XPath(xpath) => ("xpath", xpath.clone()),
        };
        json!({ "using": using, "value": value })
    }

    fn element_ref(element: &Element) -> Value {
        let mut reference = Map::new();
        reference.insert(ELEMENT_KEY.to_string(), Value::String(element.0.clone()));
        Value::Object(reference)
    }

    fn parse_element(value: &Value) -> UiResult<Element> {
        value.get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| Element(id.to_string()))
            .ok_or_else(|| UiError::Command("WebDriver returned no element reference".to_string()))
    }

    fn parse_elements(values: &[Value]) -> UiResult<Vec<Element>> {
        values.iter().map(Self::parse_element).collect()
    }
}

/// Maps a WebDriver error code to our error kinds.
fn error_from_code(code: &str, message: &str) -> UiError {
    // Drivers append stack traces after the first line
    let message = message.lines().next().unwrap_or_default().to_string();
    match code {
        "no such element" => UiError::ElementNotFound(message),
        "stale element reference" => UiError::StaleElement(message),
        "element click intercepted" | "element not interactable" => UiError::ClickIntercepted(message),
        "timeout" | "script timeout" => UiError::Timeout(message),
        "invalid session id" | "session not created" | "no such window" => UiError::Session(message),
        other => UiError::Command(format!("{}: {}", other, message)),
    }
}

impl Browser for WebDriverBrowser {
    fn navigate(&mut self, url: &str) -> UiResult<()> {
        self.command::<Value>("POST", "url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn find(&mut self, locator: &Locator) -> UiResult<Element> {
        let value: Value = self.command("POST", "element", Some(Self::locator_body(locator)))?;
        Self::parse_element(&value)
    }

    fn find_all(&mut self, locator: &Locator) -> UiResult<Vec<Element>> {
        let values: Vec<Value> = self.command("POST", "elements", Some(Self::locator_body(locator)))?;
        Self::parse_elements(&values)
    }

    fn find_within(&mut self, parent: &Element, locator: &Locator) -> UiResult<Element> {
        let value: Value = self.element_command("POST", parent, "element", Some(Self::locator_body(locator)))?;
        Self::parse_element(&value)
    }

    fn find_all_within(&mut self, parent: &Element, locator: &Locator) -> UiResult<Vec<Element>> {
        let values: Vec<Value> = self.element_command("POST", parent, "elements", Some(Self::locator_body(locator)))?;
        Self::parse_elements(&values)
    }

    fn click(&mut self, element: &Element) -> UiResult<()> {
        self.element_command::<Value>("POST", element, "click", None)?;
        Ok(())
    }

    fn clear(&mut self, element: &Element) -> UiResult<()> {
        self.element_command::<Value>("POST", element, "clear", None)?;
        Ok(())
    }

    fn send_keys(&mut self, element: &Element, text: &str) -> UiResult<()> {
        self.element_command::<Value>("POST", element, "value", Some(json!({ "text": text })))?;
        Ok(())
    }

    fn text(&mut self, element: &Element) -> UiResult<String> {
        self.element_command("GET", element, "text", None)
    }

    fn attribute(&mut self, element: &Element, name: &str) -> UiResult<Option<String>> {
        self.element_command("GET", element, &format!("attribute/{}", name), None)
    }

    fn is_selected(&mut self, element: &Element) -> UiResult<bool> {
        self.element_command("GET", element, "selected", None)
    }

    fn is_displayed(&mut self, element: &Element) -> UiResult<bool> {
        self.element_command("GET", element, "displayed", None)
    }

    fn is_enabled(&mut self, element: &Element) -> UiResult<bool> {
        self.element_command("GET", element, "enabled", None)
    }

    fn execute_script(&mut self, script: &str, args: &[&Element]) -> UiResult<Value> {
        let args: Vec<Value> = args.iter().map(|e| Self::element_ref(e)).collect();
        self.command("POST", "execute/sync", Some(json!({ "script": script, "args": args })))
    }

    fn quit(&mut self) -> UiResult<()> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        Self::send::<Value>(&self.agent, "DELETE", &url, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::*;

    /// Minimal driver server on a free port. Answers a new session, fails the
    /// timeouts call when asked to, and records every `METHOD path` it gets.
    fn local_driver(fail_timeouts: bool) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(vec![]));
        let seen = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header.trim().is_empty() {
                        break;
                    }
                    if let Some(len) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = len.trim().parse().unwrap();
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).unwrap();

                let mut parts = request_line.split_whitespace();
                let route = format!("{} {}", parts.next().unwrap_or_default(), parts.next().unwrap_or_default());
                seen.lock().unwrap().push(route.clone());

                let (status, reply) = if route == "POST /session" {
                    (200, r#"{"value":{"sessionId":"s1","capabilities":{}}}"#)
                } else if route.ends_with("/timeouts") && fail_timeouts {
                    (500, r#"{"value":{"error":"unknown error","message":"boom"}}"#)
                } else {
                    (200, r#"{"value":null}"#)
                };
                let response = format!(
                    "HTTP/1.1 {} Reply\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status, reply.len(), reply);
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        (url, requests)
    }

    fn config_for(url: String) -> BrowserConfig {
        BrowserConfig {
            webdriver_url: url,
            ..Default::default()
        }
    }

    #[test]
    fn test_error_from_code() {
        assert_eq!(error_from_code("no such element", "Unable to locate #title\nStacktrace: ..."),
                   UiError::ElementNotFound("Unable to locate #title".to_string()));
        assert!(error_from_code("stale element reference", "x").is_transient());
        assert!(error_from_code("element click intercepted", "x").is_transient());
        assert!(error_from_code("timeout", "x").is_transient());
        assert!(error_from_code("invalid session id", "x").is_fatal());
        assert_eq!(error_from_code("javascript error", "boom"), UiError::Command("javascript error: boom".to_string()));
    }

    #[test]
    fn test_locator_body() {
        assert_eq!(WebDriverBrowser::locator_body(&Locator::id("title")),
                   json!({ "using": "css selector", "value": "[id=\"title\"]" }));
        assert_eq!(WebDriverBrowser::locator_body(&Locator::class_name("media-modal")),
                   json!({ "using": "css selector", "value": ".media-modal" }));
        assert_eq!(WebDriverBrowser::locator_body(&Locator::xpath("//label")),
                   json!({ "using": "xpath", "value": "//label" }));
    }

    #[test]
    fn test_element_round_trip() {
        let element = Element("abc-123".to_string());
        let wire = WebDriverBrowser::element_ref(&element);
        assert_eq!(WebDriverBrowser::parse_element(&wire).unwrap(), element);
        assert!(WebDriverBrowser::parse_element(&json!({ "other": 1 })).is_err());
    }

    #[test]
    fn test_headless_capabilities() {
        let config = BrowserConfig {
            headless: true,
            ..Default::default()
        };
        let caps = WebDriverBrowser::capabilities(&config);
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--window-size=1920,1080")));
    }

    #[test]
    fn test_unreachable_driver_is_session_error() {
        let config = BrowserConfig {
            webdriver_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let err = WebDriverBrowser::start(&config).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_start_sets_timeouts() {
        let (url, requests) = local_driver(false);
        let browser = WebDriverBrowser::start(&config_for(url)).unwrap();
        assert_eq!(browser.session_id, "s1");
        assert_eq!(*requests.lock().unwrap(), vec!["POST /session", "POST /session/s1/timeouts"]);
    }

    #[test]
    fn test_failed_timeouts_closes_session() {
        let (url, requests) = local_driver(true);
        let err = WebDriverBrowser::start(&config_for(url)).err().unwrap();
        assert!(err.is_fatal());
        assert_eq!(*requests.lock().unwrap(),
                   vec!["POST /session", "POST /session/s1/timeouts", "DELETE /session/s1"]);
    }
}
