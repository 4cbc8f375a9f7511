use crate::models::{AdvisoryRecord, SeverityLabel};

const UNKNOWN_INDICATOR: &str = "❓";

const INDICATORS: [(SeverityLabel, &str); 4] = [
    (SeverityLabel::None, "⚪️"),
    (SeverityLabel::Mild, "🟢"),
    (SeverityLabel::Moderate, "🟡"),
    (SeverityLabel::Severe, "🔴"),
];

fn indicator(severity: SeverityLabel) -> &'static str {
    INDICATORS
        .iter()
        .find(|(label, _)| *label == severity)
        .map(|(_, indicator)| *indicator)
        .unwrap_or(UNKNOWN_INDICATOR)
}

/// Renders a record as the multi-line summary shown in the client.
///
/// The overall rating comes first (when there is one), then one line per
/// category in the record's order. There is no trailing newline.
pub fn render(record: &AdvisoryRecord) -> String {
    let mut lines = Vec::with_capacity(record.categories().len() + 1);

    if !record.overall_rating.is_empty() {
        lines.push(record.overall_rating.clone());
    }

    for rating in record.categories() {
        lines.push(format!(
            "{} {}: {}",
            indicator(rating.severity),
            rating.category,
            rating.severity
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn renders_rating_then_categories() {
        let mut record = AdvisoryRecord::new("R");
        record.insert(Category::ViolenceGore, SeverityLabel::Severe);

        assert_eq!(render(&record), "R\n🔴 Violence & Gore: Severe");
    }

    #[test]
    fn renders_every_indicator() {
        let mut record = AdvisoryRecord::new("PG-13");
        record.insert(Category::SexNudity, SeverityLabel::None);
        record.insert(Category::ViolenceGore, SeverityLabel::Mild);
        record.insert(Category::Profanity, SeverityLabel::Moderate);
        record.insert(Category::SubstanceUse, SeverityLabel::Severe);
        record.insert(Category::FrighteningIntense, SeverityLabel::Unknown);

        assert_eq!(
            render(&record),
            "PG-13\n\
             ⚪️ Sex & Nudity: None\n\
             🟢 Violence & Gore: Mild\n\
             🟡 Profanity: Moderate\n\
             🔴 Substance Use: Severe\n\
             ❓ Frightening/Intense Scenes: Unknown"
        );
    }

    #[test]
    fn empty_record_renders_only_rating() {
        assert_eq!(render(&AdvisoryRecord::new("")), "Not Rated");
        assert_eq!(render(&AdvisoryRecord::with_rating(String::new())), "");
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut record = AdvisoryRecord::new("TV-MA");
        record.insert(Category::Profanity, SeverityLabel::Severe);
        record.insert(Category::SexNudity, SeverityLabel::Mild);

        assert_eq!(render(&record), render(&record.clone()));
        assert!(!render(&record).ends_with('\n'));
    }
}
