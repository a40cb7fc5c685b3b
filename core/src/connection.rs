use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use estate_backend_client::Client;
use estate_backend_client::ClientOptions;
use estate_backend_client::Geocoder;
use estate_login::CookieDotJson;
use estate_login::FileSessionStore;
use estate_login::clear_cookies;
use estate_login::read_cookies;
use estate_login::write_cookies;
use tracing::debug;

use crate::config::Config;

/// An access-layer [`Client`] whose session lives in `session.json` and whose
/// refresh cookie is carried across processes in `cookies.json`.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    estate_home: PathBuf,
    geocoder_url: String,
}

impl Connection {
    pub fn open(config: &Config) -> io::Result<Self> {
        let session = Arc::new(FileSessionStore::load(&config.estate_home)?);
        let options = ClientOptions {
            timeout: config.request_timeout,
            cookie_jar: None,
        };
        let mut client = Client::with_options(config.base_url.clone(), session, options)
            .map_err(io::Error::other)?
            .with_http_headers(&config.http_headers)
            .with_renewal_policy(config.renewal_policy);
        if let Some(ua) = &config.user_agent {
            client = client.with_user_agent(ua.clone());
        }

        match read_cookies(&config.estate_home)? {
            // Cookies captured against another backend are not replayed.
            Some(saved) if saved.url == client.base_url() => {
                debug!("restoring {} saved cookie(s)", saved.cookies.len());
                client.restore_cookies(&saved.cookies);
            }
            Some(saved) => debug!("ignoring cookies saved for {}", saved.url),
            None => {}
        }

        Ok(Self {
            client,
            estate_home: config.estate_home.clone(),
            geocoder_url: config.geocoder_url.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn estate_home(&self) -> &Path {
        &self.estate_home
    }

    pub fn geocoder(&self) -> estate_backend_client::Result<Geocoder> {
        Geocoder::new(self.geocoder_url.clone())
    }

    /// Write whatever the jar would send to the renewal endpoint, or remove
    /// `cookies.json` when nothing is left.
    pub fn persist_cookies(&self) -> io::Result<()> {
        match self.client.refresh_cookies() {
            Some(header) => write_cookies(
                &self.estate_home,
                &CookieDotJson::from_header_value(self.client.base_url(), &header),
            ),
            None => clear_cookies(&self.estate_home).map(|_| ()),
        }
    }
}
