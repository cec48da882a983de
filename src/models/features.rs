// Feature schema shared by the extractor, the CSV serializer and the classifier adapter
// Column order here is the order the classifier was trained on

use serde::{
    de::{self, Deserializer},
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};
use std::fmt;

// =============================================================================
// SIGNAL
// =============================================================================

/// One bounded heuristic value. The enum is closed, so a vector can never carry
/// anything outside {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Signal {
    Suspicious = -1,
    Neutral = 0,
    Legitimate = 1,
}

impl Signal {
    pub fn value(self) -> i8 {
        self as i8
    }

    /// `Suspicious` when the pattern is present, `Legitimate` otherwise
    pub fn flag(present: bool) -> Self {
        if present {
            Signal::Suspicious
        } else {
            Signal::Legitimate
        }
    }

    /// Three-way bucketing of a percentage: `< low` is legitimate,
    /// `<= high` neutral, anything above suspicious.
    pub fn from_ratio(percent: f64, low: f64, high: f64) -> Self {
        if percent < low {
            Signal::Legitimate
        } else if percent <= high {
            Signal::Neutral
        } else {
            Signal::Suspicious
        }
    }
}

impl TryFrom<i64> for Signal {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Suspicious),
            0 => Ok(Signal::Neutral),
            1 => Ok(Signal::Legitimate),
            other => Err(format!("signal out of range: {}", other)),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Signal::try_from(raw).map_err(de::Error::custom)
    }
}

// =============================================================================
// FEATURE NAMES
// =============================================================================

/// Number of signal columns (the label column is extra)
pub const SIGNAL_COUNT: usize = 30;

/// Signals plus the label column
pub const VECTOR_LEN: usize = SIGNAL_COUNT + 1;

/// Name of the trailing label column
pub const LABEL_COLUMN: &str = "Result";

/// Placeholder written into the label column at extraction time
pub const PLACEHOLDER_LABEL: i8 = 1;

/// Column names in training order. Spellings match the training data headers.
pub const FEATURE_NAMES: [&str; SIGNAL_COUNT] = [
    "having_IP_Address",
    "URL_Length",
    "Shortining_Service",
    "having_At_Symbol",
    "double_slash_redirecting",
    "Prefix_Suffix",
    "having_Sub_Domain",
    "SSLfinal_State",
    "Domain_registeration_length",
    "Favicon",
    "port",
    "HTTPS_token",
    "Request_URL",
    "URL_of_Anchor",
    "Links_in_tags",
    "SFH",
    "Submitting_to_email",
    "Abnormal_URL",
    "Redirect",
    "on_mouseover",
    "RightClick",
    "popUpWidnow",
    "Iframe",
    "age_of_domain",
    "DNSRecord",
    "web_traffic",
    "Page_Rank",
    "Google_Index",
    "Links_pointing_to_page",
    "Statistical_report",
];

/// Typed handle for each column. Discriminants are the column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    HavingIpAddress = 0,
    UrlLength,
    ShortiningService,
    HavingAtSymbol,
    DoubleSlashRedirecting,
    PrefixSuffix,
    HavingSubDomain,
    SslFinalState,
    DomainRegisterationLength,
    Favicon,
    Port,
    HttpsToken,
    RequestUrl,
    UrlOfAnchor,
    LinksInTags,
    Sfh,
    SubmittingToEmail,
    AbnormalUrl,
    Redirect,
    OnMouseover,
    RightClick,
    PopUpWindow,
    Iframe,
    AgeOfDomain,
    DnsRecord,
    WebTraffic,
    PageRank,
    GoogleIndex,
    LinksPointingToPage,
    StatisticalReport,
}

impl Feature {
    pub const ALL: [Feature; SIGNAL_COUNT] = [
        Feature::HavingIpAddress,
        Feature::UrlLength,
        Feature::ShortiningService,
        Feature::HavingAtSymbol,
        Feature::DoubleSlashRedirecting,
        Feature::PrefixSuffix,
        Feature::HavingSubDomain,
        Feature::SslFinalState,
        Feature::DomainRegisterationLength,
        Feature::Favicon,
        Feature::Port,
        Feature::HttpsToken,
        Feature::RequestUrl,
        Feature::UrlOfAnchor,
        Feature::LinksInTags,
        Feature::Sfh,
        Feature::SubmittingToEmail,
        Feature::AbnormalUrl,
        Feature::Redirect,
        Feature::OnMouseover,
        Feature::RightClick,
        Feature::PopUpWindow,
        Feature::Iframe,
        Feature::AgeOfDomain,
        Feature::DnsRecord,
        Feature::WebTraffic,
        Feature::PageRank,
        Feature::GoogleIndex,
        Feature::LinksPointingToPage,
        Feature::StatisticalReport,
    ];

    /// Signals with no data source yet. Always neutral.
    pub const PLACEHOLDERS: [Feature; 5] = [
        Feature::WebTraffic,
        Feature::PageRank,
        Feature::GoogleIndex,
        Feature::LinksPointingToPage,
        Feature::StatisticalReport,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Feature::ALL[i])
    }
}

// =============================================================================
// FEATURE VECTOR
// =============================================================================

/// Complete, ordered signal set for one URL. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    signals: [Signal; SIGNAL_COUNT],
    label: i8,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> Signal {
        self.signals[feature.index()]
    }

    pub fn signals(&self) -> &[Signal; SIGNAL_COUNT] {
        &self.signals
    }

    pub fn label(&self) -> i8 {
        self.label
    }

    /// `(column, signal)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Signal)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.signals.iter().copied())
    }

    /// Classifier input: the 30 signals without the label column
    pub fn model_input(&self) -> [i8; SIGNAL_COUNT] {
        let mut row = [0i8; SIGNAL_COUNT];
        for (slot, signal) in row.iter_mut().zip(self.signals.iter()) {
            *slot = signal.value();
        }
        row
    }

    /// Full training-layout row: 30 signals then the label
    pub fn to_row(&self) -> Vec<i8> {
        let mut row = Vec::with_capacity(VECTOR_LEN);
        row.extend(self.signals.iter().map(|s| s.value()));
        row.push(self.label);
        row
    }

    pub fn len(&self) -> usize {
        VECTOR_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.signals.iter().filter(|s| **s == signal).count()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(VECTOR_LEN))?;
        for (name, signal) in self.iter() {
            map.serialize_entry(name, &signal)?;
        }
        map.serialize_entry(LABEL_COLUMN, &self.label)?;
        map.end()
    }
}

/// Collects signals slot by slot; `build` fails if any slot was left unset.
#[derive(Debug, Clone, Default)]
pub struct FeatureVectorBuilder {
    slots: [Option<Signal>; SIGNAL_COUNT],
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, feature: Feature, signal: Signal) -> &mut Self {
        self.slots[feature.index()] = Some(signal);
        self
    }

    pub fn missing(&self) -> Vec<&'static str> {
        Feature::ALL
            .iter()
            .filter(|f| self.slots[f.index()].is_none())
            .map(|f| f.name())
            .collect()
    }

    pub fn build(&self) -> Result<FeatureVector, Vec<&'static str>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut signals = [Signal::Neutral; SIGNAL_COUNT];
        for (slot, value) in signals.iter_mut().zip(self.slots.iter()) {
            if let Some(signal) = value {
                *slot = *signal;
            }
        }

        Ok(FeatureVector {
            signals,
            label: PLACEHOLDER_LABEL,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn full_builder(signal: Signal) -> FeatureVectorBuilder {
        let mut builder = FeatureVectorBuilder::new();
        for feature in Feature::ALL {
            builder.set(feature, signal);
        }
        builder
    }

    #[test]
    fn test_feature_positions_match_names() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(feature.name(), FEATURE_NAMES[i]);
        }
        assert_eq!(Feature::PopUpWindow.name(), "popUpWidnow");
        assert_eq!(Feature::StatisticalReport.index(), 29);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Feature::from_name("SFH"), Some(Feature::Sfh));
        assert_eq!(Feature::from_name("DNSRecord"), Some(Feature::DnsRecord));
        assert_eq!(Feature::from_name("Result"), None);
    }

    #[test]
    fn test_builder_rejects_missing_slots() {
        let mut builder = FeatureVectorBuilder::new();
        builder.set(Feature::Iframe, Signal::Legitimate);

        let missing = builder.build().unwrap_err();
        assert_eq!(missing.len(), SIGNAL_COUNT - 1);
        assert!(!missing.contains(&"Iframe"));
    }

    #[test]
    fn test_vector_row_layout() {
        let mut builder = full_builder(Signal::Legitimate);
        builder.set(Feature::HavingIpAddress, Signal::Suspicious);
        builder.set(Feature::StatisticalReport, Signal::Neutral);
        let vector = builder.build().unwrap();

        let row = vector.to_row();
        assert_eq!(row.len(), VECTOR_LEN);
        assert_eq!(row[0], -1);
        assert_eq!(row[29], 0);
        assert_eq!(row[30], PLACEHOLDER_LABEL);
        assert_eq!(vector.model_input().len(), SIGNAL_COUNT);
        assert_eq!(vector.count(Signal::Legitimate), 28);
    }

    #[test]
    fn test_json_preserves_schema_order() {
        let vector = full_builder(Signal::Neutral).build().unwrap();
        let json = serde_json::to_string(&vector).unwrap();

        let first = json.find("having_IP_Address").unwrap();
        let middle = json.find("popUpWidnow").unwrap();
        let last = json.find("Result").unwrap();
        assert!(first < middle && middle < last);
    }

    #[test]
    fn test_signal_ratio_buckets() {
        assert_eq!(Signal::from_ratio(0.0, 22.0, 61.0), Signal::Legitimate);
        assert_eq!(Signal::from_ratio(30.0, 22.0, 61.0), Signal::Neutral);
        assert_eq!(Signal::from_ratio(61.0, 22.0, 61.0), Signal::Neutral);
        assert_eq!(Signal::from_ratio(61.5, 22.0, 61.0), Signal::Suspicious);
    }

    #[test]
    fn test_signal_serde() {
        assert_eq!(serde_json::to_string(&Signal::Suspicious).unwrap(), "-1");
        let parsed: Signal = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, Signal::Neutral);
        assert!(serde_json::from_str::<Signal>("2").is_err());
    }
}
