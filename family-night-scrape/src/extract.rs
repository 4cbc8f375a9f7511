use family_night_common::models::{AdvisoryRecord, Category, SeverityLabel};

use crate::{query::Document, ParseError};

// Class names are the first thing to change upstream, so rating items are
// found through their test id and only the nested parts rely on classes.
static METADATA_ITEM: &str = "li.ipc-metadata-list__item";
static RATING_ITEM: &str = "[data-testid=rating-item]";
static ITEM_LABEL: &str = ".ipc-metadata-list-item__label";
static RICH_TEXT: &str = ".ipc-html-content-inner-div";

const RATING_ITEM_TEST_ID: &str = "rating-item";

/// Pulls the parental guide out of an advisory page.
///
/// Missing pieces never fail extraction: no certification becomes
/// [`NOT_RATED`](family_night_common::models::NOT_RATED) and incomplete
/// category entries are skipped. Only a document that cannot be read at all
/// is an error.
#[tracing::instrument(skip(html), fields(len = html.len()), err)]
pub fn extract(html: &str) -> Result<AdvisoryRecord, ParseError> {
    let doc = Document::try_from(html)?;

    let mut record = AdvisoryRecord::new(overall_rating(&doc).unwrap_or_default());

    for (index, item) in doc.select(RATING_ITEM).into_iter().enumerate() {
        let label = first_text(&item, ITEM_LABEL);
        let severity = first_text(&item, RICH_TEXT);

        let (label, severity) = match (label, severity) {
            (Some(label), Some(severity)) => (label, severity),
            _ => {
                tracing::debug!(index, "skipping incomplete rating item");
                continue;
            }
        };

        match Category::from_label(&label) {
            Some(category) => record.insert(category, SeverityLabel::from_text(&severity)),
            None => tracing::debug!(index, label = %label, "skipping unrecognized category"),
        }
    }

    tracing::debug!(
        rating = %record.overall_rating,
        categories = record.categories().len(),
        "extracted advisory"
    );

    Ok(record)
}

/// Certification from the first metadata item that is not a category rating.
fn overall_rating(doc: &Document) -> Option<String> {
    doc.select(METADATA_ITEM)
        .into_iter()
        .find(|item| item.attr("data-testid").as_deref() != Some(RATING_ITEM_TEST_ID))
        .and_then(|item| first_text(&item, RICH_TEXT))
}

/// Trimmed text of the first `selector` match under `element`, if non-empty.
fn first_text(element: &crate::query::Element, selector: &str) -> Option<String> {
    element
        .select(selector)
        .into_iter()
        .next()
        .map(|found| found.text().trim().to_string())
        .filter(|text| !text.is_empty())
}
