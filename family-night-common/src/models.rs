/// Placeholder used when a page carries no overall certification.
pub const NOT_RATED: &str = "Not Rated";

/// How intense a category's content is, ordered from least to most severe.
///
/// Anything the page says that is not one of the four known labels becomes
/// [`SeverityLabel::Unknown`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub enum SeverityLabel {
    None,
    Mild,
    Moderate,
    Severe,
    Unknown,
}

serde_plain::derive_display_from_serialize!(SeverityLabel);

impl SeverityLabel {
    /// Parses free text from the page, never failing.
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "none" => SeverityLabel::None,
            "mild" => SeverityLabel::Mild,
            "moderate" => SeverityLabel::Moderate,
            "severe" => SeverityLabel::Severe,
            _ => SeverityLabel::Unknown,
        }
    }

    /// Storage rank of the label, `Unknown` shares rank 0 with `None`.
    pub const fn rank(self) -> u8 {
        match self {
            SeverityLabel::None | SeverityLabel::Unknown => 0,
            SeverityLabel::Mild => 1,
            SeverityLabel::Moderate => 2,
            SeverityLabel::Severe => 3,
        }
    }

    /// Inverse of [`SeverityLabel::rank`], out of range ranks read as `None`.
    pub const fn from_rank(rank: i64) -> Self {
        match rank {
            1 => SeverityLabel::Mild,
            2 => SeverityLabel::Moderate,
            3 => SeverityLabel::Severe,
            _ => SeverityLabel::None,
        }
    }
}

/// The fixed set of advisory categories, in storage column order.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub enum Category {
    #[serde(rename = "Sex & Nudity")]
    SexNudity,
    #[serde(rename = "Violence & Gore")]
    ViolenceGore,
    #[serde(rename = "Profanity")]
    Profanity,
    #[serde(rename = "Substance Use")]
    SubstanceUse,
    #[serde(rename = "Frightening/Intense Scenes")]
    FrighteningIntense,
}

serde_plain::derive_display_from_serialize!(Category);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SexNudity,
        Category::ViolenceGore,
        Category::Profanity,
        Category::SubstanceUse,
        Category::FrighteningIntense,
    ];

    /// Matches a label as it appears on the page, ignoring case, spacing and
    /// the trailing colon.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let label = label.strip_suffix(':').unwrap_or(label);
        let label = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match label.as_str() {
            "sex & nudity" | "sex and nudity" => Some(Category::SexNudity),
            "violence & gore" | "violence and gore" => Some(Category::ViolenceGore),
            "profanity" => Some(Category::Profanity),
            "substance use" | "alcohol, drugs & smoking" | "alcohol, drugs and smoking" => {
                Some(Category::SubstanceUse)
            }
            "frightening/intense scenes" | "frightening & intense scenes" | "frightening and intense scenes" => {
                Some(Category::FrighteningIntense)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct CategoryRating {
    pub category: Category,
    pub severity: SeverityLabel,
}

/// Normalized parental guide for one title.
///
/// Categories keep the order they were inserted in, each category at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct AdvisoryRecord {
    pub overall_rating: String,
    categories: Vec<CategoryRating>,
}

impl AdvisoryRecord {
    /// An empty overall rating is replaced with [`NOT_RATED`].
    pub fn new(overall_rating: impl Into<String>) -> Self {
        let overall_rating = overall_rating.into();
        let overall_rating = if overall_rating.trim().is_empty() {
            NOT_RATED.to_string()
        } else {
            overall_rating.trim().to_string()
        };

        Self {
            overall_rating,
            categories: Vec::new(),
        }
    }

    /// Builds a record with a rating used verbatim, as read back from storage.
    pub fn with_rating(overall_rating: String) -> Self {
        Self {
            overall_rating,
            categories: Vec::new(),
        }
    }

    /// Sets the severity of a category; a repeated category keeps its
    /// original position but takes the newer severity.
    pub fn insert(&mut self, category: Category, severity: SeverityLabel) {
        match self.categories.iter_mut().find(|r| r.category == category) {
            Some(existing) => existing.severity = severity,
            None => self.categories.push(CategoryRating { category, severity }),
        }
    }

    pub fn get(&self, category: Category) -> Option<SeverityLabel> {
        self.categories
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.severity)
    }

    pub fn categories(&self) -> &[CategoryRating] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [SeverityLabel; 4] = [
        SeverityLabel::None,
        SeverityLabel::Mild,
        SeverityLabel::Moderate,
        SeverityLabel::Severe,
    ];

    #[test]
    fn rank_round_trips_known_labels() {
        for label in KNOWN {
            assert_eq!(SeverityLabel::from_rank(label.rank() as i64), label);
        }
    }

    #[test]
    fn rank_scale_is_ordered() {
        let ranks = KNOWN.iter().map(|l| l.rank()).collect::<Vec<_>>();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unrecognized_text_ranks_as_none() {
        for text in ["", "Extreme", "n/a", "Mildly", "  "] {
            let label = SeverityLabel::from_text(text);
            assert_eq!(label, SeverityLabel::Unknown);
            assert_eq!(label.rank(), 0);
        }
    }

    #[test]
    fn out_of_range_ranks_read_as_none() {
        for rank in [-1, 4, 100, i64::MIN, i64::MAX] {
            assert_eq!(SeverityLabel::from_rank(rank), SeverityLabel::None);
        }
    }

    #[test]
    fn labels_parse_from_page_text() {
        assert_eq!(SeverityLabel::from_text(" Severe\n"), SeverityLabel::Severe);
        assert_eq!(SeverityLabel::from_text("mild"), SeverityLabel::Mild);
        assert_eq!(SeverityLabel::from_text("MODERATE"), SeverityLabel::Moderate);
        assert_eq!(SeverityLabel::from_text("None"), SeverityLabel::None);
    }

    #[test]
    fn labels_display_canonical_text() {
        assert_eq!(SeverityLabel::Moderate.to_string(), "Moderate");
        assert_eq!(SeverityLabel::Unknown.to_string(), "Unknown");
        assert_eq!(Category::FrighteningIntense.to_string(), "Frightening/Intense Scenes");
    }

    #[test]
    fn category_labels_match_page_spellings() {
        assert_eq!(Category::from_label("Violence & Gore:"), Some(Category::ViolenceGore));
        assert_eq!(Category::from_label("  sex &\n nudity "), Some(Category::SexNudity));
        assert_eq!(
            Category::from_label("Alcohol, Drugs & Smoking"),
            Some(Category::SubstanceUse)
        );
        assert_eq!(
            Category::from_label("Frightening & Intense Scenes:"),
            Some(Category::FrighteningIntense)
        );
        assert_eq!(Category::from_label("Spoilers"), None);
    }

    #[test]
    fn empty_rating_becomes_placeholder() {
        assert_eq!(AdvisoryRecord::new("").overall_rating, NOT_RATED);
        assert_eq!(AdvisoryRecord::new("   ").overall_rating, NOT_RATED);
        assert_eq!(AdvisoryRecord::new(" PG-13 ").overall_rating, "PG-13");
    }

    #[test]
    fn repeated_category_keeps_position_and_takes_last_value() {
        let mut record = AdvisoryRecord::new("R");
        record.insert(Category::Profanity, SeverityLabel::Mild);
        record.insert(Category::ViolenceGore, SeverityLabel::Moderate);
        record.insert(Category::Profanity, SeverityLabel::Severe);

        let order = record
            .categories()
            .iter()
            .map(|r| (r.category, r.severity))
            .collect::<Vec<_>>();

        assert_eq!(
            order,
            vec![
                (Category::Profanity, SeverityLabel::Severe),
                (Category::ViolenceGore, SeverityLabel::Moderate),
            ]
        );
    }

    #[test]
    fn record_serializes_with_display_names() {
        let mut record = AdvisoryRecord::new("R");
        record.insert(Category::ViolenceGore, SeverityLabel::Severe);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["overall_rating"], "R");
        assert_eq!(json["categories"][0]["category"], "Violence & Gore");
        assert_eq!(json["categories"][0]["severity"], "Severe");
    }
}
