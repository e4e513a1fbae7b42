use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::domain::{Lineage, TaxonId, TaxonInfo, TaxonRecord};
use crate::error::TaxaError;
use crate::normalize::normalize;

pub const BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub backoff: Duration,
    pub timeout: Duration,
    pub inter_call_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            inter_call_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
            inter_call_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub fn run_with_retries<T>(
    policy: &RetryPolicy,
    mut op: impl FnMut() -> Result<T, TaxaError>,
) -> Result<T, TaxaError> {
    let mut attempt = 0usize;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                warn!(error = %err, attempt, "transient NCBI failure, backing off");
                thread::sleep(policy.backoff);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub trait TaxonomyClient: Send + Sync {
    fn find_taxon_id(&self, query: &str) -> Result<TaxonId, TaxaError>;
    fn fetch_lineage(&self, id: TaxonId) -> Result<TaxonInfo, TaxaError>;

    // Courtesy pause between the two chained remote calls; mocks keep the
    // no-op default.
    fn throttle(&self) {}

    fn resolve(&self, raw_name: &str) -> Result<TaxonInfo, TaxaError> {
        let id = self.find_taxon_id(&normalize(raw_name))?;
        self.throttle();
        self.fetch_lineage(id)
    }
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    base_url: String,
    email: String,
    tool: String,
    retry: RetryPolicy,
}

impl EutilsHttpClient {
    pub fn new(config: &Config) -> Result<Self, TaxaError> {
        Self::with_policy(config, RetryPolicy::default())
    }

    pub fn with_policy(config: &Config, retry: RetryPolicy) -> Result<Self, TaxaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("taxa-lm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TaxaError::Http(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(retry.timeout)
            .build()
            .map_err(|err| TaxaError::Http(err.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            email: config.email.clone(),
            tool: config.tool.clone(),
            retry,
        })
    }

    fn esearch(&self, term: &str) -> Result<Value, TaxaError> {
        let url = format!("{}/esearch.fcgi", self.base_url);
        let response = run_with_retries(&self.retry, || {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("mail", self.email.as_str()),
                    ("tool", self.tool.as_str()),
                    ("db", "taxonomy"),
                    ("term", term),
                    ("rettype", "uilist"),
                    ("retmode", "json"),
                ])
                .send()
                .map_err(|err| TaxaError::Http(err.to_string()))?;
            handle_status(response)
        })?;
        response.json().map_err(|err| TaxaError::Http(err.to_string()))
    }

    fn efetch(&self, id: TaxonId) -> Result<String, TaxaError> {
        let url = format!("{}/efetch.fcgi", self.base_url);
        let response = run_with_retries(&self.retry, || {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("mail", self.email.as_str()),
                    ("tool", self.tool.as_str()),
                    ("db", "taxonomy"),
                    ("id", id.to_string().as_str()),
                ])
                .send()
                .map_err(|err| TaxaError::Http(err.to_string()))?;
            handle_status(response)
        })?;
        response.text().map_err(|err| TaxaError::Http(err.to_string()))
    }
}

impl TaxonomyClient for EutilsHttpClient {
    fn find_taxon_id(&self, query: &str) -> Result<TaxonId, TaxaError> {
        let envelope = self.esearch(query)?;
        parse_id_list(query, &envelope)
    }

    fn fetch_lineage(&self, id: TaxonId) -> Result<TaxonInfo, TaxaError> {
        let body = self.efetch(id)?;
        parse_taxon_document(&body)
    }

    fn throttle(&self) {
        thread::sleep(self.retry.inter_call_delay);
    }
}

fn handle_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, TaxaError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .text()
        .unwrap_or_else(|_| "NCBI request failed".to_string());
    Err(TaxaError::Status { status, message })
}

pub fn parse_id_list(query: &str, envelope: &Value) -> Result<TaxonId, TaxaError> {
    let ids = envelope
        .get("esearchresult")
        .and_then(|v| v.get("idlist"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            TaxaError::Parse(format!("esearch response missing idlist for query {query}"))
        })?;

    match ids.as_slice() {
        [] => Err(TaxaError::NotFound(query.to_string())),
        [id] => id
            .as_str()
            .ok_or_else(|| TaxaError::MalformedId(id.to_string()))?
            .parse(),
        _ => Err(TaxaError::Ambiguous {
            query: query.to_string(),
            count: ids.len(),
        }),
    }
}

pub fn parse_taxon_document(body: &str) -> Result<TaxonInfo, TaxaError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|err| TaxaError::Parse(format!("taxonomy record is not valid XML: {err}")))?;

    let root_taxon = doc
        .root_element()
        .children()
        .find(|node| node.has_tag_name("Taxon"))
        .ok_or_else(|| TaxaError::Parse("taxonomy record missing Taxon element".to_string()))?;
    let own = parse_taxon_element(&root_taxon)?;

    let lineage_ex = root_taxon
        .children()
        .find(|node| node.has_tag_name("LineageEx"))
        .ok_or_else(|| TaxaError::Parse("taxonomy record missing LineageEx element".to_string()))?;

    let mut lineage = Lineage::default();
    for node in lineage_ex.children().filter(|node| node.has_tag_name("Taxon")) {
        lineage.push(parse_taxon_element(&node)?);
    }

    Ok(TaxonInfo {
        rank: own.rank,
        sci_name: own.sci_name,
        taxon_id: own.taxon_id,
        lineage,
    })
}

fn parse_taxon_element(taxon: &roxmltree::Node<'_, '_>) -> Result<TaxonRecord, TaxaError> {
    let rank = child_text(taxon, "Rank")?;
    let sci_name = child_text(taxon, "ScientificName")?;
    let taxon_id = child_text(taxon, "TaxId")?;
    let taxon_id = taxon_id
        .parse::<u64>()
        .map(TaxonId::new)
        .map_err(|_| TaxaError::Parse(format!("non-numeric TaxId: {taxon_id}")))?;

    Ok(TaxonRecord {
        rank,
        sci_name,
        taxon_id,
    })
}

fn child_text(node: &roxmltree::Node<'_, '_>, tag: &str) -> Result<String, TaxaError> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(|text| text.to_string())
        .ok_or_else(|| TaxaError::Parse(format!("Taxon element missing {tag}")))
}
