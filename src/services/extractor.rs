// src/services/extractor.rs

//! Heuristic extraction from portal markup.
//!
//! The portal's element ids drift between deployments, so every lookup is an
//! ordered list of [`Locator`] strategies where the first hit wins. A miss is
//! never an error: callers get an empty or partial result.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{
    AcademicRecord, AnnouncementBoard, AnnouncementRecord, ExtractedTable, ExtractionConfig,
    KeyValueRecord, LinkRecord, MenuLink, StudentInfo,
};
use crate::utils::html::{element_text, id_selector, id_suffix_selector, parse_selector};
use crate::utils::resolve_opt;

/// One strategy for finding an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    /// Exact `id` attribute
    Id(&'a str),
    /// `id` attribute ending with the given suffix
    IdSuffix(&'a str),
    /// Rendered text containing a keyword, case-insensitively
    TextContains(&'a str),
}

impl<'a> Locator<'a> {
    /// First `tag` element matched by this strategy. An empty tag matches any element.
    pub fn locate<'d>(&self, document: &'d Html, tag: &str) -> Option<ElementRef<'d>> {
        let css = match self {
            Locator::Id(id) => id_selector(tag, id),
            Locator::IdSuffix(suffix) => id_suffix_selector(tag, suffix),
            Locator::TextContains(_) if tag.is_empty() => "*".to_string(),
            Locator::TextContains(_) => tag.to_string(),
        };
        let selector = match parse_selector(&css) {
            Ok(sel) => sel,
            Err(e) => {
                log::debug!("Locator {self:?} skipped: {e}");
                return None;
            }
        };

        match self {
            Locator::TextContains(keyword) => {
                let keyword = keyword.to_lowercase();
                document
                    .select(&selector)
                    .find(|el| el.text().collect::<String>().to_lowercase().contains(&keyword))
            }
            _ => document.select(&selector).next(),
        }
    }
}

/// Try each locator in order and return the first hit.
pub fn locate_first<'d>(
    document: &'d Html,
    tag: &str,
    locators: &[Locator<'_>],
) -> Option<ElementRef<'d>> {
    locators.iter().find_map(|loc| loc.locate(document, tag))
}

fn selector(css: &str) -> Option<Selector> {
    parse_selector(css)
        .map_err(|e| log::warn!("{e}"))
        .ok()
}

fn texts(element: ElementRef<'_>, sel: &Selector) -> Vec<String> {
    element.select(sel).map(element_text).collect()
}

/// Every table of a page as rows of `td`/`th` text. Tables without cells are dropped.
pub fn parse_tables(html: &str) -> Vec<ExtractedTable> {
    let document = Html::parse_document(html);
    let (Some(table_sel), Some(row_sel), Some(cell_sel)) =
        (selector("table"), selector("tr"), selector("td, th"))
    else {
        return Vec::new();
    };

    document
        .select(&table_sel)
        .filter_map(|table| {
            let mut extracted = ExtractedTable::default();
            for row in table.select(&row_sel) {
                extracted.push_row(texts(row, &cell_sel));
            }
            (!extracted.is_empty()).then_some(extracted)
        })
        .collect()
}

/// Map table rows to records.
///
/// The first row is always the header and never becomes a record. Its `th`
/// texts key every data row with the same number of `td` cells (blank headers
/// fall back to `col_i`); any other row, or every row under a `td`-only
/// header, gets `col_0..col_{n-1}`. Rows with no value of at least `min_len`
/// characters are dropped.
pub fn table_records(table: ElementRef<'_>, min_len: usize) -> Vec<KeyValueRecord> {
    let (Some(row_sel), Some(th_sel), Some(td_sel)) =
        (selector("tr"), selector("th"), selector("td"))
    else {
        return Vec::new();
    };

    let mut rows = table.select(&row_sel);
    let header = rows.next().map(|r| texts(r, &th_sel)).unwrap_or_default();

    rows
        .filter_map(|row| {
            let cells = texts(row, &td_sel);
            if cells.is_empty() {
                return None;
            }
            let keyed_by_header = header.len() == cells.len();
            let record: KeyValueRecord = cells
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let key = match header.get(i) {
                        Some(h) if keyed_by_header && !h.is_empty() => h.clone(),
                        _ => format!("col_{i}"),
                    };
                    (key, value)
                })
                .collect();
            is_meaningful(&record, min_len).then_some(record)
        })
        .collect()
}

fn is_meaningful(record: &KeyValueRecord, min_len: usize) -> bool {
    record.values().any(|v| v.chars().count() >= min_len)
}

/// Heuristic extraction driven by [`ExtractionConfig`].
pub struct HeuristicExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> HeuristicExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Records from every table with at least `min_rows` rows, in page order.
    pub fn records(&self, html: &str, min_rows: usize) -> Vec<KeyValueRecord> {
        let document = Html::parse_document(html);
        let (Some(table_sel), Some(row_sel)) = (selector("table"), selector("tr")) else {
            return Vec::new();
        };

        document
            .select(&table_sel)
            .filter(|table| table.select(&row_sel).count() >= min_rows.max(1))
            .flat_map(|table| table_records(table, self.config.min_meaningful_len))
            .collect()
    }

    /// Announcement rows of the board's grid, or of the first table
    /// mentioning the announcement keyword. At most `limit` records, each
    /// stamped with the board's source.
    pub fn announcements(
        &self,
        html: &str,
        base_url: Option<&Url>,
        board: &AnnouncementBoard,
        limit: usize,
    ) -> Vec<AnnouncementRecord> {
        let document = Html::parse_document(html);

        let locators: Vec<Locator<'_>> = board
            .table_ids
            .iter()
            .map(|id| Locator::Id(id))
            .chain(std::iter::once(Locator::TextContains(
                &self.config.announcement_keyword,
            )))
            .collect();
        let Some(grid) = locate_first(&document, "table", &locators) else {
            log::warn!("No announcement table found");
            return Vec::new();
        };
        let (Some(row_sel), Some(link_sel), Some(span_sel)) =
            (selector("tr"), selector("a"), selector("span"))
        else {
            return Vec::new();
        };

        grid.select(&row_sel)
            .filter_map(|row| {
                let link = row.select(&link_sel).next()?;
                let title = element_text(link);
                if title.is_empty() {
                    return None;
                }
                let date_text = row.select(&span_sel).next().map(element_text).unwrap_or_default();
                let id = link
                    .value()
                    .id()
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| title.clone());
                let href = link.value().attr("href").unwrap_or("");

                Some(AnnouncementRecord {
                    id,
                    title,
                    url: resolve_opt(base_url, href),
                    date_text,
                    source_tag: board.source.clone(),
                })
            })
            .take(limit)
            .collect()
    }

    /// Profile fields by id: prefixed id, bare id, then id suffix.
    /// Fields that are not on the page are omitted.
    pub fn profile_fields(&self, document: &Html) -> KeyValueRecord {
        let mut record = KeyValueRecord::new();
        for field in &self.config.profile_fields {
            let prefixed = format!("{}{}", self.config.profile_id_prefix, field.id);
            let suffix = format!("_{}", field.id);
            let locators = [
                Locator::Id(&prefixed),
                Locator::Id(&field.id),
                Locator::IdSuffix(&suffix),
            ];
            if let Some(element) = locate_first(document, "", &locators) {
                record.insert(field.name.clone(), control_text(element));
            }
        }
        record
    }

    /// Rows of the academic records grid; the first row is its header.
    pub fn academic_records(&self, document: &Html) -> Vec<AcademicRecord> {
        let Some(table) = Locator::Id(&self.config.academic_table_id).locate(document, "table")
        else {
            return Vec::new();
        };
        let (Some(row_sel), Some(td_sel)) = (selector("tr"), selector("td")) else {
            return Vec::new();
        };

        table
            .select(&row_sel)
            .skip(1)
            .filter_map(|row| {
                let cells = texts(row, &td_sel);
                if cells.len() < 9 {
                    return None;
                }
                let mut cells = cells.into_iter();
                let mut next = || cells.next().unwrap_or_default();
                Some(AcademicRecord {
                    student_id: next(),
                    first_name: next(),
                    last_name: next(),
                    class_level: next(),
                    yearly_credits: next(),
                    fall_credits: next(),
                    spring_credits: next(),
                    total_credits: next(),
                    gpa: next(),
                })
            })
            .collect()
    }

    /// Anchors of the main menu container.
    pub fn menu_links(&self, document: &Html, base_url: Option<&Url>) -> Vec<MenuLink> {
        let Some(menu) = Locator::Id(&self.config.menu_container_id).locate(document, "div") else {
            return Vec::new();
        };
        let Some(link_sel) = selector("a") else {
            return Vec::new();
        };

        menu.select(&link_sel)
            .map(|link| MenuLink {
                text: element_text(link),
                href: resolve_opt(base_url, link.value().attr("href").unwrap_or("")),
                tabindex: link.value().attr("tabindex").unwrap_or("").to_string(),
            })
            .collect()
    }

    /// Profile fields, academic records and menu links of the student info page.
    pub fn student_info(&self, html: &str, base_url: Option<&Url>) -> StudentInfo {
        let document = Html::parse_document(html);
        StudentInfo {
            fields: self.profile_fields(&document),
            academic_records: self.academic_records(&document),
            menu_links: self.menu_links(&document, base_url),
            source_url: None,
            parsed_at: None,
        }
    }

    /// Anchors whose lower-cased text contains any of `keywords`.
    pub fn links_matching(
        &self,
        html: &str,
        base_url: Option<&Url>,
        keywords: &[String],
    ) -> Vec<LinkRecord> {
        let document = Html::parse_document(html);
        let Some(link_sel) = selector("a") else {
            return Vec::new();
        };
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        document
            .select(&link_sel)
            .filter_map(|link| {
                let text = element_text(link);
                let lowered = text.to_lowercase();
                if !keywords.iter().any(|k| lowered.contains(k.as_str())) {
                    return None;
                }
                Some(LinkRecord {
                    text,
                    href: resolve_opt(base_url, link.value().attr("href").unwrap_or("")),
                })
            })
            .collect()
    }
}

/// Text of a control; inputs render their `value`.
fn control_text(element: ElementRef<'_>) -> String {
    if element.value().name() == "input" {
        return element.value().attr("value").unwrap_or("").trim().to_string();
    }
    element_text(element)
}
