use crate::error::TimelineError;
use crate::timeline::entities::decode_html_entities;
use crate::timeline::outline::OutlineNode;
use crate::timeline::record::Record;
use crate::timeline::rename_map::RenameMap;
use chrono::{DateTime, Utc};

const OUTLINE: &str = "outline";
const LABEL_ATTR: &str = "text";
const LINK_ATTR: &str = "htmlUrl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLeaf {
    pub section: String,
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub candidates: Vec<Record>,
    pub skipped: Vec<SkippedLeaf>,
    pub sections_found: Vec<String>,
    pub sections_missing: Vec<String>,
}

fn non_empty<'a>(node: &'a OutlineNode, attr: &str) -> Option<&'a str> {
    node.attr(attr).filter(|v| !v.is_empty())
}

fn leaf_candidate(
    leaf: &OutlineNode,
    section: &str,
    observed: DateTime<Utc>,
    renames: &RenameMap,
) -> Result<Record, SkippedLeaf> {
    let label = non_empty(leaf, LABEL_ATTR);
    let link = non_empty(leaf, LINK_ATTR);
    match (label, link) {
        (Some(label), Some(link)) => Ok(Record::observed(
            decode_html_entities(label),
            renames.apply(link),
            observed,
        )),
        (label, link) => {
            let reason = match (label.is_none(), link.is_none()) {
                (true, true) => format!("missing {LABEL_ATTR} and {LINK_ATTR}"),
                (true, false) => format!("missing {LABEL_ATTR}"),
                _ => format!("missing {LINK_ATTR}"),
            };
            Err(SkippedLeaf {
                section: section.to_string(),
                label: label.or(link).unwrap_or_default().to_string(),
                reason,
            })
        }
    }
}

pub fn document_body<'a>(
    root: &'a OutlineNode,
    source: &str,
) -> Result<&'a OutlineNode, TimelineError> {
    if !root.name.eq_ignore_ascii_case("opml") {
        return Err(TimelineError::NotOutlineDocument(source.to_string()));
    }
    root.child("body")
        .ok_or_else(|| TimelineError::MissingBody(source.to_string()))
}

// first outline in document order with each title
pub fn extract(
    root: &OutlineNode,
    source: &str,
    sections: &[String],
    observed: DateTime<Utc>,
    renames: &RenameMap,
) -> Result<Extraction, TimelineError> {
    let body = document_body(root, source)?;
    let mut out = Extraction::default();

    for section in sections {
        let Some(target) = body.find_descendant(OUTLINE, LABEL_ATTR, section) else {
            out.sections_missing.push(section.clone());
            continue;
        };
        out.sections_found.push(section.clone());
        for leaf in target.children_named(OUTLINE) {
            match leaf_candidate(leaf, section, observed, renames) {
                Ok(candidate) => out.candidates.push(candidate),
                Err(skipped) => out.skipped.push(skipped),
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::outline::parse;
    use crate::timeline::record::midnight;
    use crate::timeline::rename_map::RenameEntry;
    use chrono::NaiveDate;

    fn jan(day: u32) -> DateTime<Utc> {
        midnight(NaiveDate::from_ymd_opt(2020, 1, day).expect("date"))
    }

    fn sections(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const DOC: &str = r#"<opml version="2.0"><body>
  <outline text="Feeds">
    <outline text="Blog A" htmlUrl="http://a.com/" xmlUrl="http://a.com/rss" />
    <outline text="No link" xmlUrl="http://nolink.com/rss" />
    <outline text="Tom &amp;amp; Jerry&amp;rsquo;s" htmlUrl="http://tj.com" />
    <outline text="" htmlUrl="http://untitled.com" />
  </outline>
  <outline text="Kindling">
    <outline text="Blog K" htmlUrl="https://k.com" />
  </outline>
  <outline text="Feeds">
    <outline text="Shadowed" htmlUrl="http://shadow.com" />
  </outline>
</body></opml>"#;

    #[test]
    fn extracts_leaves_of_each_section_in_order() {
        let root = parse(DOC.as_bytes(), "fever-20200101.opml").expect("parse");
        let out = extract(
            &root,
            "fever-20200101.opml",
            &sections(&["Kindling", "Feeds", "Absent"]),
            jan(1),
            &RenameMap::default(),
        )
        .expect("extract");

        let urls: Vec<&str> = out.candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://k.com", "http://a.com/", "http://tj.com"]);
        assert!(out.candidates.iter().all(|c| c.start == jan(1) && c.end == jan(1)));
        assert_eq!(out.sections_found, sections(&["Kindling", "Feeds"]));
        assert_eq!(out.sections_missing, sections(&["Absent"]));
    }

    #[test]
    fn leaves_without_label_or_link_are_skipped() {
        let root = parse(DOC.as_bytes(), "f.opml").expect("parse");
        let out = extract(&root, "f.opml", &sections(&["Feeds"]), jan(1), &RenameMap::default())
            .expect("extract");
        assert_eq!(out.skipped.len(), 2);
        assert_eq!(out.skipped[0].label, "No link");
        assert_eq!(out.skipped[0].reason, "missing htmlUrl");
        assert_eq!(out.skipped[1].reason, "missing text");
    }

    #[test]
    fn titles_are_html_decoded() {
        let root = parse(DOC.as_bytes(), "f.opml").expect("parse");
        let out = extract(&root, "f.opml", &sections(&["Feeds"]), jan(1), &RenameMap::default())
            .expect("extract");
        assert_eq!(out.candidates[1].title, "Tom & Jerry\u{2019}s");
    }

    #[test]
    fn urls_are_rewritten_through_the_rename_map() {
        let root = parse(DOC.as_bytes(), "f.opml").expect("parse");
        let renames = RenameMap::from_entries(vec![RenameEntry {
            old: "a.com".into(),
            new: "https://a.example".into(),
        }]);
        let out =
            extract(&root, "f.opml", &sections(&["Feeds"]), jan(1), &renames).expect("extract");
        assert_eq!(out.candidates[0].url, "https://a.example");
    }

    #[test]
    fn non_opml_root_is_rejected() {
        let root = parse(b"<rss><channel/></rss>", "feed.opml").expect("parse");
        let err = extract(&root, "feed.opml", &sections(&["Feeds"]), jan(1), &RenameMap::default())
            .expect_err("must fail");
        assert!(matches!(err, TimelineError::NotOutlineDocument(_)));
    }

    #[test]
    fn missing_body_is_rejected() {
        let root = parse(b"<OPML><head/></OPML>", "nobody.opml").expect("parse");
        let err = extract(
            &root,
            "nobody.opml",
            &sections(&["Feeds"]),
            jan(1),
            &RenameMap::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, TimelineError::MissingBody(_)));
    }
}
