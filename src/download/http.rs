use crate::download::ArchiveFetcher;
use crate::error::{InstallError, InstallResult};
use std::io::Read;
use std::time::Duration;

/// Fetches archives over HTTP/HTTPS with a blocking ureq agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("ggwp/", env!("CARGO_PKG_VERSION")))
            .timeout_connect(Duration::from_secs(30))
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> InstallResult<Box<dyn Read>> {
        log::info!("Downloading {url}");

        let response = self.agent.get(url).call()?;

        if response.status() != 200 {
            return Err(InstallError::fetch(
                url,
                format!("download failed with status: {}", response.status()),
                Some(response.status()),
            ));
        }

        Ok(Box::new(response.into_reader()))
    }
}
