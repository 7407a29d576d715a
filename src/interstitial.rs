//! The interstitial page's URL contract and prompt selection.

use rand::seq::SliceRandom;
use rand::Rng;
use url::Url;

pub const FALLBACK_PROMPT: &str = "Hold on...";

/// Builds `<base>?url=<original>&domain=<domain>&count=<count>`.
pub fn interstitial_url(
    base: &str,
    original_url: &str,
    domain: &str,
    count: u64,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("url", original_url)
        .append_pair("domain", domain)
        .append_pair("count", &count.to_string());
    Ok(url.into())
}

/// What the interstitial reads back out of its own URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterstitialParams {
    pub original_url: Option<String>,
    pub domain: Option<String>,
    pub count: u64,
}

impl InterstitialParams {
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "url" => params.original_url = Some(value.into_owned()),
                "domain" => params.domain = Some(value.into_owned()),
                // Unparseable counts read as zero
                "count" => params.count = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        Ok(params)
    }
}

pub fn pick_prompt<'a, R: Rng + ?Sized>(prompts: &'a [String], rng: &mut R) -> &'a str {
    prompts
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(FALLBACK_PROMPT)
}
