use chrono::{DateTime, Utc};

use super::relationships::{
    REL_TYPE_CORE_PROPERTIES, REL_TYPE_EXTENDED_PROPERTIES, REL_TYPE_OFFICE_DOCUMENT,
    REL_TYPE_SHARED_STRINGS, REL_TYPE_WORKSHEET,
};
use super::{
    AppProperties, ContentTypes, CoreProperties, Part, PartKind, Relationship, Relationships,
    WorkbookPart, APP_PROPS_PART, CORE_PROPS_PART, ROOT_RELS_PART, SHARED_STRINGS_PART,
    SHEET_NAME, WORKBOOK_PART, WORKBOOK_RELS_PART, WORKSHEET_PART,
};

/// Relationship id of the worksheet in the workbook rels.
pub const WORKSHEET_REL_ID: &str = "rId1";

const APPLICATION: &str = "recordbook-xlsx";

/// Builds the fixed auxiliary parts of a single-sheet package.
///
/// The timestamp (stamped into `docProps/core.xml`) is the only thing that varies between builds.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    timestamp: DateTime<Utc>,
    creator: String,
}

impl ManifestBuilder {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            creator: APPLICATION.to_string(),
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Content types, package rels, workbook rels, workbook descriptor and both docProps parts.
    ///
    /// The registry and relationships also cover the worksheet and shared strings parts, which the
    /// caller serializes separately.
    pub fn build(&self) -> Vec<Part> {
        let content_types = ContentTypes::for_parts([
            (ROOT_RELS_PART, PartKind::Relationships),
            (CORE_PROPS_PART, PartKind::CoreProperties),
            (APP_PROPS_PART, PartKind::ExtendedProperties),
            (WORKBOOK_PART, PartKind::Workbook),
            (WORKBOOK_RELS_PART, PartKind::Relationships),
            (WORKSHEET_PART, PartKind::Worksheet),
            (SHARED_STRINGS_PART, PartKind::SharedStrings),
        ]);

        let root_rels = Relationships::new(vec![
            Relationship::new("rId1", REL_TYPE_OFFICE_DOCUMENT, WORKBOOK_PART),
            Relationship::new("rId2", REL_TYPE_CORE_PROPERTIES, CORE_PROPS_PART),
            Relationship::new("rId3", REL_TYPE_EXTENDED_PROPERTIES, APP_PROPS_PART),
        ]);

        // Workbook rels targets are relative to `xl/`.
        let workbook_rels = Relationships::new(vec![
            Relationship::new(WORKSHEET_REL_ID, REL_TYPE_WORKSHEET, "worksheets/sheet1.xml"),
            Relationship::new("rId2", REL_TYPE_SHARED_STRINGS, "sharedStrings.xml"),
        ]);

        let workbook = WorkbookPart::single_sheet(SHEET_NAME, WORKSHEET_REL_ID);
        let core = CoreProperties::new(self.creator.clone(), self.timestamp);
        let app = AppProperties {
            application: APPLICATION.to_string(),
            sheet_names: vec![SHEET_NAME.to_string()],
        };

        vec![
            content_types.into_part(),
            Part::new(ROOT_RELS_PART, PartKind::Relationships, root_rels.to_xml()),
            Part::new(CORE_PROPS_PART, PartKind::CoreProperties, core.to_xml()),
            Part::new(APP_PROPS_PART, PartKind::ExtendedProperties, app.to_xml()),
            Part::new(WORKBOOK_PART, PartKind::Workbook, workbook.to_xml()),
            Part::new(WORKBOOK_RELS_PART, PartKind::Relationships, workbook_rels.to_xml()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::CONTENT_TYPES_PART;
    use crate::path::{rels_for_part, resolve_target};
    use chrono::TimeZone;

    fn built() -> Vec<Part> {
        ManifestBuilder::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()).build()
    }

    fn xml_of<'a>(parts: &'a [Part], name: &str) -> &'a str {
        parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.xml.as_str())
            .unwrap_or_else(|| panic!("missing {name}"))
    }

    #[test]
    fn builds_six_auxiliary_parts() {
        let parts = built();
        let mut names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                CONTENT_TYPES_PART,
                ROOT_RELS_PART,
                APP_PROPS_PART,
                CORE_PROPS_PART,
                WORKBOOK_RELS_PART,
                WORKBOOK_PART,
            ]
        );
        for part in &parts {
            roxmltree::Document::parse(&part.xml)
                .unwrap_or_else(|e| panic!("{} is not well formed: {e}", part.name));
        }
    }

    #[test]
    fn relationships_lead_from_root_to_worksheet_and_shared_strings() {
        let parts = built();
        let root =
            Relationships::parse(xml_of(&parts, ROOT_RELS_PART).as_bytes(), ROOT_RELS_PART)
                .unwrap();
        let workbook_target = &root.by_type(REL_TYPE_OFFICE_DOCUMENT).unwrap().target;
        let workbook_part = resolve_target("", workbook_target);
        assert_eq!(workbook_part, WORKBOOK_PART);

        let workbook =
            WorkbookPart::parse(xml_of(&parts, WORKBOOK_PART).as_bytes(), WORKBOOK_PART).unwrap();
        assert_eq!(workbook.sheets.len(), 1);
        let sheet = workbook.first_sheet().unwrap();
        assert_eq!(sheet.name, "Sheet1");
        assert_eq!(sheet.rel_id, "rId1");

        let rels_name = rels_for_part(&workbook_part);
        let wb_rels =
            Relationships::parse(xml_of(&parts, &rels_name).as_bytes(), &rels_name).unwrap();
        let sheet_rel = wb_rels.by_id(&sheet.rel_id).unwrap();
        assert_eq!(resolve_target(&workbook_part, &sheet_rel.target), WORKSHEET_PART);
        let sst_rel = wb_rels.by_type(REL_TYPE_SHARED_STRINGS).unwrap();
        assert_eq!(resolve_target(&workbook_part, &sst_rel.target), SHARED_STRINGS_PART);
    }

    #[test]
    fn registry_covers_every_typed_part() {
        let parts = built();
        let types = ContentTypes::parse(
            xml_of(&parts, CONTENT_TYPES_PART).as_bytes(),
            CONTENT_TYPES_PART,
        )
        .unwrap();
        for (name, kind) in [
            (WORKBOOK_PART, PartKind::Workbook),
            (WORKSHEET_PART, PartKind::Worksheet),
            (SHARED_STRINGS_PART, PartKind::SharedStrings),
            (CORE_PROPS_PART, PartKind::CoreProperties),
            (APP_PROPS_PART, PartKind::ExtendedProperties),
        ] {
            assert_eq!(types.content_type_of(name), kind.content_type(), "{name}");
        }
        assert!(types.content_type_of(ROOT_RELS_PART).is_some());
    }

    #[test]
    fn timestamp_is_the_only_variable_input() {
        let a = ManifestBuilder::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()).build();
        let b = ManifestBuilder::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()).build();
        let c = ManifestBuilder::new(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()).build();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(xml_of(&a, CORE_PROPS_PART).contains("2024-01-02T03:04:05Z"));
    }
}
