use super::types::{Server, Spec};

/// Outcome of resolving the server URL a client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResolution {
    /// URL requests are sent to, without trailing slash.
    pub url: String,
    /// Declared servers, extended with `url` when it was not declared.
    pub servers: Vec<Server>,
}

/// Path component of a server URL (`""` for the root).
///
/// Absolute URLs are parsed as-is; relative ones (`/v1`) are parsed against a
/// placeholder host.
#[must_use]
pub fn base_path(server_url: &str) -> String {
    url::Url::parse(server_url)
        .or_else(|_| url::Url::parse(&format!("http://dummy{server_url}")))
        .map(|u| {
            let p = u.path().trim_end_matches('/');
            if p == "/" || p.is_empty() {
                String::new()
            } else {
                p.to_string()
            }
        })
        .unwrap_or_default()
}

impl Spec {
    /// Resolve the server URL without touching this spec.
    ///
    /// Without a request the first declared server is used (`/` when none is
    /// declared). A requested URL loses its trailing slashes and is appended
    /// to the returned server list when it is not already declared.
    #[must_use]
    pub fn resolve_server_url(&self, requested: Option<&str>) -> ServerResolution {
        let mut servers = self.servers.clone();
        let url = match requested {
            None => servers
                .first()
                .map(|s| s.url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/".to_string()),
            Some(requested) => {
                let url = requested.trim_end_matches('/').to_string();
                if !servers.iter().any(|s| s.url == url) {
                    servers.push(Server::new(url.clone()));
                }
                url
            }
        };
        ServerResolution { url, servers }
    }

    /// Owned copy of this spec with the resolved server list, plus the URL.
    #[must_use]
    pub fn with_server_url(&self, requested: Option<&str>) -> (Spec, String) {
        let ServerResolution { url, servers } = self.resolve_server_url(requested);
        let mut spec = self.clone();
        spec.servers = servers;
        (spec, url)
    }

    /// Ordered, de-duplicated base paths of every declared server.
    ///
    /// Always holds at least one entry; a document without servers yields `[""]`.
    #[must_use]
    pub fn base_paths(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for server in &self.servers {
            let bp = base_path(&server.url);
            if !out.contains(&bp) {
                out.push(bp);
            }
        }
        if out.is_empty() {
            out.push(String::new());
        }
        out
    }

    /// Relative forms of a path, one per declared base path it starts with.
    ///
    /// Longest base path first; a base path only matches on a segment
    /// boundary (`/v1` strips `/v1/pets` but not `/v10/pets`).
    #[must_use]
    pub fn relative_paths<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let mut bases = self.base_paths();
        bases.sort_by_key(|b| std::cmp::Reverse(b.len()));
        bases
            .iter()
            .filter_map(|base| {
                let rest = path.strip_prefix(base.as_str())?;
                if rest.is_empty() {
                    Some("/")
                } else if rest.starts_with('/') {
                    Some(rest)
                } else {
                    None
                }
            })
            .collect()
    }
}
