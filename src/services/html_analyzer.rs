// Structural and script-trick signals from fetched markup

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use crate::{
    models::{
        features::{Feature, FeatureVectorBuilder, Signal},
        probe::RawContent,
    },
    utils::domain::{link_host, registrable_domain, DomainIdentity},
};

// =============================================================================
// STATIC REGEX PATTERNS
// =============================================================================

lazy_static! {
    static ref MAILTO_PATTERN: Regex = Regex::new(r"(?i)mailto:").expect("Invalid mailto regex");
    static ref MOUSEOVER_PATTERN: Regex =
        Regex::new(r"(?i)onmouseover\s*=").expect("Invalid onmouseover regex");
    static ref RIGHT_CLICK_PATTERN: Regex =
        Regex::new(r"(?i)event\.button\s*==\s*2").expect("Invalid right-click regex");
    static ref POPUP_PATTERN: Regex =
        Regex::new(r"(?i)window\.open\s*\(").expect("Invalid popup regex");
    static ref IFRAME_PATTERN: Regex = Regex::new(r"(?i)<iframe").expect("Invalid iframe regex");
}

// Percentage thresholds (low, high) for the ratio signals
const REQUEST_URL_THRESHOLDS: (f64, f64) = (22.0, 61.0);
const ANCHOR_THRESHOLDS: (f64, f64) = (31.0, 67.0);
const LINKS_IN_TAGS_THRESHOLDS: (f64, f64) = (17.0, 81.0);

// =============================================================================
// DATA STRUCTURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlSignals {
    pub favicon: Signal,
    pub request_url: Signal,
    pub url_of_anchor: Signal,
    pub links_in_tags: Signal,
    pub sfh: Signal,
    pub submitting_to_email: Signal,
    pub on_mouseover: Signal,
    pub right_click: Signal,
    pub popup_window: Signal,
    pub iframe: Signal,
}

impl HtmlSignals {
    /// Used whenever there is no 200 page to look at. Structural signals are
    /// suspicious; absent script tricks prove nothing, so they stay neutral.
    pub fn fallback() -> Self {
        Self {
            favicon: Signal::Suspicious,
            request_url: Signal::Suspicious,
            url_of_anchor: Signal::Suspicious,
            links_in_tags: Signal::Suspicious,
            sfh: Signal::Suspicious,
            submitting_to_email: Signal::Neutral,
            on_mouseover: Signal::Neutral,
            right_click: Signal::Neutral,
            popup_window: Signal::Neutral,
            iframe: Signal::Neutral,
        }
    }

    pub fn apply(&self, builder: &mut FeatureVectorBuilder) {
        builder
            .set(Feature::Favicon, self.favicon)
            .set(Feature::RequestUrl, self.request_url)
            .set(Feature::UrlOfAnchor, self.url_of_anchor)
            .set(Feature::LinksInTags, self.links_in_tags)
            .set(Feature::Sfh, self.sfh)
            .set(Feature::SubmittingToEmail, self.submitting_to_email)
            .set(Feature::OnMouseover, self.on_mouseover)
            .set(Feature::RightClick, self.right_click)
            .set(Feature::PopUpWindow, self.popup_window)
            .set(Feature::Iframe, self.iframe);
    }
}

// =============================================================================
// HTML ANALYZER
// =============================================================================

pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    /// Ten page signals for `identity`'s page. Anything but a non-empty
    /// 200 response yields the fallback set.
    pub fn analyze(identity: &DomainIdentity, content: Option<&RawContent>) -> HtmlSignals {
        match content {
            Some(content) if content.is_analyzable() => Self::analyze_markup(identity, &content.body),
            _ => HtmlSignals::fallback(),
        }
    }

    pub fn analyze_markup(identity: &DomainIdentity, html: &str) -> HtmlSignals {
        let document = Html::parse_document(html);

        HtmlSignals {
            favicon: favicon_signal(&document, identity),
            request_url: request_url_signal(&document, identity),
            url_of_anchor: anchor_signal(&document, identity),
            links_in_tags: links_in_tags_signal(&document, identity),
            sfh: form_handler_signal(&document),
            submitting_to_email: Signal::flag(MAILTO_PATTERN.is_match(html)),
            on_mouseover: Signal::flag(MOUSEOVER_PATTERN.is_match(html)),
            right_click: Signal::flag(RIGHT_CLICK_PATTERN.is_match(html)),
            popup_window: Signal::flag(POPUP_PATTERN.is_match(html)),
            iframe: Signal::flag(IFRAME_PATTERN.is_match(html)),
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// A reference is external when it names a host whose registrable domain
/// differs from the page's. Relative references are never external.
fn is_external(reference: &str, identity: &DomainIdentity) -> bool {
    match link_host(reference) {
        Some(host) => !identity.same_site(&host),
        None => false,
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn favicon_signal(document: &Html, identity: &DomainIdentity) -> Signal {
    let Some(links) = selector("link[rel][href]") else {
        return Signal::Legitimate;
    };

    let icon_href = document.select(&links).find_map(|el| {
        let rel = el.value().attr("rel")?.trim().to_ascii_lowercase();
        if rel == "icon" || rel == "shortcut icon" {
            el.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
        } else {
            None
        }
    });

    let Some(href) = icon_href else {
        return Signal::Legitimate;
    };

    let icon_domain = link_host(href)
        .map(|host| registrable_domain(&host))
        .unwrap_or_default();

    if !icon_domain.is_empty() && icon_domain != identity.domain {
        Signal::Suspicious
    } else {
        Signal::Legitimate
    }
}

fn request_url_signal(document: &Html, identity: &DomainIdentity) -> Signal {
    let Some(resources) = selector("[src], [href]") else {
        return Signal::Legitimate;
    };

    let references: Vec<&str> = document
        .select(&resources)
        .flat_map(|el| [el.value().attr("src"), el.value().attr("href")])
        .flatten()
        .filter(|r| !r.trim().is_empty())
        .collect();

    let external = references
        .iter()
        .filter(|r| is_external(r, identity))
        .count();

    let (low, high) = REQUEST_URL_THRESHOLDS;
    Signal::from_ratio(percentage(external, references.len()), low, high)
}

fn anchor_signal(document: &Html, identity: &DomainIdentity) -> Signal {
    let Some(anchors) = selector("a[href]") else {
        return Signal::Legitimate;
    };

    let hrefs: Vec<&str> = document
        .select(&anchors)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect();

    let suspicious = hrefs
        .iter()
        .filter(|href| {
            let lower = href.to_ascii_lowercase();
            lower.starts_with('#')
                || lower.starts_with("javascript:")
                || lower.starts_with("mailto:")
                || is_external(href, identity)
        })
        .count();

    let (low, high) = ANCHOR_THRESHOLDS;
    Signal::from_ratio(percentage(suspicious, hrefs.len()), low, high)
}

fn links_in_tags_signal(document: &Html, identity: &DomainIdentity) -> Signal {
    let Some(tags) = selector("meta, script, link") else {
        return Signal::Legitimate;
    };

    let references: Vec<&str> = document
        .select(&tags)
        .filter_map(|el| el.value().attr("src").or_else(|| el.value().attr("href")))
        .filter(|r| !r.trim().is_empty())
        .collect();

    let external = references
        .iter()
        .filter(|r| is_external(r, identity))
        .count();

    let (low, high) = LINKS_IN_TAGS_THRESHOLDS;
    Signal::from_ratio(percentage(external, references.len()), low, high)
}

fn form_handler_signal(document: &Html) -> Signal {
    let Some(forms) = selector("form[action]") else {
        return Signal::Legitimate;
    };

    let blank_handler = document
        .select(&forms)
        .filter_map(|el| el.value().attr("action"))
        .any(|action| {
            let action = action.trim();
            action.is_empty() || action.to_ascii_lowercase().contains("about:blank")
        });

    Signal::flag(blank_handler)
}

// =============================================================================
// TESTS
// =============================================================================
