//! HTML hazard-bulletin page provider.
//!
//! The national weather service publishes one advisory panel per hazard
//! category on a public bulletin page. This provider fetches the page
//! for a location and extracts each panel's text with CSS selectors.
//! Panels that are blank or read "no active advisory" map to absence.
//!
//! The page is assumed to be server-rendered; driving a headless browser
//! against script-heavy portals is out of scope here.

use async_trait::async_trait;
use hazard_fence_advisory_models::{AdvisorySnapshot, HazardCategory};
use scraper::{Html, Selector};

use crate::{AdvisoryError, AdvisorySource, LookupQuery};

/// Advisory provider that scrapes an HTML hazard bulletin page.
pub struct BulletinSource {
    client: reqwest::Client,
    base_url: String,
    panel_selector: String,
}

impl BulletinSource {
    /// Creates a provider for the given bulletin page URL.
    ///
    /// The default panel selector expects markup of the form
    /// `<div class="advisory-panel" data-hazard="flood">…</div>`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            panel_selector: ".advisory-panel[data-hazard=\"{hazard}\"]".to_string(),
        }
    }

    /// Creates a provider from `ADVISORY_BULLETIN_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError::MissingConfig`] if the variable is not
    /// set.
    pub fn from_env() -> Result<Self, AdvisoryError> {
        let base_url = std::env::var("ADVISORY_BULLETIN_URL").map_err(|_| {
            AdvisoryError::MissingConfig {
                name: "ADVISORY_BULLETIN_URL",
            }
        })?;
        Ok(Self::new(base_url))
    }

    /// Overrides the per-category panel selector template. The literal
    /// `{hazard}` is replaced with the lowercased category name.
    #[must_use]
    pub fn with_panel_selector(mut self, selector: &str) -> Self {
        selector.clone_into(&mut self.panel_selector);
        self
    }

    fn selector_for(&self, category: HazardCategory) -> Result<Selector, AdvisoryError> {
        let slug = category.as_ref().to_lowercase();
        let css = self.panel_selector.replace("{hazard}", &slug);
        Selector::parse(&css).map_err(|e| AdvisoryError::Parse {
            message: format!("invalid CSS selector '{css}': {e}"),
        })
    }
}

#[async_trait]
impl AdvisorySource for BulletinSource {
    fn id(&self) -> &str {
        "bulletin"
    }

    async fn fetch_advisories(
        &self,
        query: &LookupQuery,
    ) -> Result<AdvisorySnapshot, AdvisoryError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.key())])
            .send()
            .await?
            .error_for_status()?;

        let html = resp.text().await?;

        let mut snapshot = AdvisorySnapshot::empty();
        let document = Html::parse_document(&html);
        for category in HazardCategory::ALL {
            let selector = self.selector_for(*category)?;
            if let Some(text) = extract_panel_text(&document, &selector) {
                snapshot.set(*category, text);
            }
        }
        Ok(snapshot)
    }
}

/// Extracts the advisory text from the first element matching
/// `selector`, returning `None` for blank or "no active advisory"
/// panels.
fn extract_panel_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text: String = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.to_lowercase().contains("no active advisory") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
          <div class="advisory-panel" data-hazard="rainfall">
            <h3>Rainfall</h3>
            <p>No active advisory</p>
          </div>
          <div class="advisory-panel" data-hazard="thunderstorm"></div>
          <div class="advisory-panel" data-hazard="flood">
            <h3>Flood</h3>
            <p>Flood advisory #2: moderate flooding along the Yawa river</p>
          </div>
          <div class="advisory-panel" data-hazard="tropical">
            <p>  </p>
          </div>
        </body></html>
    "#;

    fn parse_sample(source: &BulletinSource) -> AdvisorySnapshot {
        let document = Html::parse_document(SAMPLE_PAGE);
        let mut snapshot = AdvisorySnapshot::empty();
        for category in HazardCategory::ALL {
            let selector = source.selector_for(*category).unwrap();
            if let Some(text) = extract_panel_text(&document, &selector) {
                snapshot.set(*category, text);
            }
        }
        snapshot
    }

    #[test]
    fn extracts_only_panels_with_real_advisories() {
        let source = BulletinSource::new("https://bulletin.example");
        let snapshot = parse_sample(&source);

        assert!(snapshot.has_any_advisory());
        assert!(snapshot.advisory(HazardCategory::Rainfall).is_none());
        assert!(snapshot.advisory(HazardCategory::Thunderstorm).is_none());
        assert!(snapshot.advisory(HazardCategory::Tropical).is_none());

        let flood = snapshot.advisory(HazardCategory::Flood).unwrap();
        assert!(flood.contains("moderate flooding along the Yawa river"));
    }

    #[test]
    fn custom_selector_template_is_honored() {
        let source = BulletinSource::new("https://bulletin.example")
            .with_panel_selector("#{hazard}-panel");
        let selector = source.selector_for(HazardCategory::Flood).unwrap();
        let document = Html::parse_document(
            r#"<div id="flood-panel">Flash flood watch in effect</div>"#,
        );
        assert_eq!(
            extract_panel_text(&document, &selector).as_deref(),
            Some("Flash flood watch in effect")
        );
    }
}
