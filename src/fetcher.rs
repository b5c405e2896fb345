use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect;
use scraper::Html;

use crate::errors::Result;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36";

const MAX_REDIRECTS: usize = 10;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Source of response bodies for the pipeline.
pub trait Fetch {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP client sending the static browser user-agent on every request.
pub struct HttpFetcher {
    client: Client,
    retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u32) -> Result<Self> {
        let redirect_policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error(format!("Too many redirects (>{MAX_REDIRECTS})"))
            } else {
                attempt.follow()
            }
        });

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .redirect(redirect_policy)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn get_once(&self, url: &str) -> reqwest::Result<String> {
        self.client.get(url).send()?.error_for_status()?.text()
    }
}

impl Fetch for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            debug!("GET {url}");
            match self.get_once(url) {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!("Request to {url} failed ({e}), retry {attempt}/{}", self.retries);
                    thread::sleep(self.retry_delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Fetches `url` and parses the body as an HTML document.
pub fn fetch_document(fetcher: &dyn Fetch, url: &str) -> Result<Html> {
    let body = fetcher.fetch_text(url)?;
    Ok(Html::parse_document(&body))
}

#[cfg(test)]
pub mod test_support {
    use std::collections::HashMap;
    use std::io;

    use super::Fetch;
    use crate::errors::{Error, Result};

    /// Serves canned bodies keyed by URL.
    #[derive(Default)]
    pub struct StaticFetcher {
        bodies: HashMap<String, String>,
    }

    impl StaticFetcher {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl Fetch for StaticFetcher {
        fn fetch_text(&self, url: &str) -> Result<String> {
            self.bodies.get(url).cloned().ok_or_else(|| {
                Error::Io(io::Error::new(io::ErrorKind::NotFound, format!("no body for {url}")))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    use scraper::Selector;

    use super::test_support::StaticFetcher;
    use super::*;

    /// Answers each connection with the next canned status/body and reports the request's user-agent.
    fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut user_agent = String::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some(value) = line.to_ascii_lowercase().strip_prefix("user-agent:") {
                        user_agent = value.trim().to_string();
                    }
                }
                tx.send(user_agent).unwrap();
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
            }
        });

        (format!("http://{addr}/"), rx)
    }

    #[test]
    fn retries_failed_request_then_returns_body() {
        let (url, user_agents) = serve(vec![("503 Service Unavailable", ""), ("200 OK", "ok")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 1)
            .unwrap()
            .with_retry_delay(Duration::ZERO);

        assert_eq!(fetcher.fetch_text(&url).unwrap(), "ok");
        let agent = user_agents.recv().unwrap();
        assert_eq!(agent, BROWSER_USER_AGENT.to_ascii_lowercase());
        assert_eq!(user_agents.recv().unwrap(), agent);
    }

    #[test]
    fn non_success_status_is_an_error_without_retries() {
        let (url, _user_agents) = serve(vec![("404 Not Found", "missing")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 0).unwrap();

        let err = fetcher.fetch_text(&url).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Http(_)));
    }

    #[test]
    fn fetch_document_parses_body() {
        let fetcher =
            StaticFetcher::default().with("https://shop.test/", "<html><h1 class=\"t\">Hi</h1></html>");
        let doc = fetch_document(&fetcher, "https://shop.test/").unwrap();
        let selector = Selector::parse("h1.t").unwrap();

        let title: String = doc.select(&selector).next().unwrap().text().collect();
        assert_eq!(title, "Hi");
    }
}
