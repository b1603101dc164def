use crate::domain::model::ListingPage;
use crate::utils::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PARTICIPANT_CHECKBOX: &str =
    r#"input[data-toggle="slave"][data-togglegroup="participants-table"]"#;
const ROLE_CELL: &str = "td.cell.c2";
const ROW_LINK: &str = "a[href]";
const PAGE_ITEM: &str = "li.page-item[data-page-number]";
const MAILTO_LINK: &str = r#"a[href*="mailto:"]"#;

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::SelectorError {
        message: format!("{}: {}", css, e),
    })
}

/// Moodle 參與者列表與個人頁面的 HTML 解析器
#[derive(Debug, Clone)]
pub struct MoodlePageParser {
    checkbox: Selector,
    role_cell: Selector,
    row_link: Selector,
    page_item: Selector,
    mailto_link: Selector,
    student_role: String,
    excluded_name: String,
}

impl MoodlePageParser {
    pub fn new(student_role: &str, excluded_name: &str) -> Result<Self> {
        Ok(Self {
            checkbox: parse_selector(PARTICIPANT_CHECKBOX)?,
            role_cell: parse_selector(ROLE_CELL)?,
            row_link: parse_selector(ROW_LINK)?,
            page_item: parse_selector(PAGE_ITEM)?,
            mailto_link: parse_selector(MAILTO_LINK)?,
            student_role: student_role.to_string(),
            excluded_name: excluded_name.to_lowercase(),
        })
    }

    /// 解析一頁參與者列表：學生個人頁連結，以及是否還有下一頁
    pub fn parse_listing(&self, html: &str, page_url: &Url, current_page: u32) -> ListingPage {
        let document = Html::parse_document(html);
        ListingPage {
            contacts: self.student_contacts(&document, page_url),
            has_next_page: self.has_next_page(&document, current_page),
        }
    }

    fn student_contacts(&self, document: &Html, page_url: &Url) -> Vec<String> {
        let mut contacts = Vec::new();

        for checkbox in document.select(&self.checkbox) {
            let Some(row) = enclosing_row(checkbox) else {
                continue;
            };

            let is_student = row
                .select(&self.role_cell)
                .next()
                .map(|cell| cell.text().collect::<String>().trim() == self.student_role)
                .unwrap_or(false);
            if !is_student {
                continue;
            }

            let Some(link) = row.select(&self.row_link).next() else {
                continue;
            };
            let display_name = link.text().collect::<String>().trim().to_lowercase();
            if !self.excluded_name.is_empty() && display_name.contains(&self.excluded_name) {
                tracing::debug!("Skipping placeholder participant '{}'", display_name);
                continue;
            }

            if let Some(href) = link.value().attr("href") {
                contacts.push(resolve_href(page_url, href));
            }
        }

        contacts
    }

    /// 分頁元件以 1 起算，所以第 N 頁（0 起算）的下一頁標記為 N+2
    fn has_next_page(&self, document: &Html, current_page: u32) -> bool {
        let next_marker = (current_page + 2).to_string();
        document.select(&self.page_item).any(|item| {
            item.value().attr("data-page-number") == Some(next_marker.as_str())
        })
    }

    /// 依文件順序取出所有 `mailto:` 連結中的 email，不做去重
    pub fn extract_emails(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.mailto_link)
            .filter_map(|link| link.value().attr("href"))
            .map(|href| decode_mailto(&href.replace("mailto:", "")))
            .collect()
    }
}

fn enclosing_row(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "tr")
}

fn resolve_href(page_url: &Url, href: &str) -> String {
    page_url
        .join(href)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 解碼失敗時保留原字串
pub fn decode_mailto(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::error!("Error decoding email {}: {}", raw, e);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MoodlePageParser {
        MoodlePageParser::new("Student", "demostudent").unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://eclass.example.edu/user/index.php?id=42&page=0").unwrap()
    }

    fn row(name: &str, href: &str, role: &str) -> String {
        format!(
            r#"<tr>
                <td class="cell c0"><input type="checkbox" data-toggle="slave" data-togglegroup="participants-table"></td>
                <td class="cell c1"><a href="{href}">{name}</a></td>
                <td class="cell c2">  {role}  </td>
            </tr>"#
        )
    }

    fn listing(rows: &[String], pages: &[u32]) -> String {
        let items: String = pages
            .iter()
            .map(|n| format!(r#"<li class="page-item" data-page-number="{n}"><a href="?page={n}">{n}</a></li>"#))
            .collect();
        format!(
            "<html><body><table>{}</table><ul class=\"pagination\">{}</ul></body></html>",
            rows.join(""),
            items
        )
    }

    #[test]
    fn test_extract_emails_decodes_in_document_order() {
        let html = r#"
            <p><a href="mailto:first%40example.com">First</a></p>
            <a href="https://example.com/profile">Not an email</a>
            <a href="mailto:second@example.com">Second</a>
            <a href="mailto:first%40example.com">Again</a>
        "#;

        let emails = parser().extract_emails(html);

        assert_eq!(
            emails,
            vec!["first@example.com", "second@example.com", "first@example.com"]
        );
    }

    #[test]
    fn test_extract_emails_keeps_raw_value_on_decode_failure() {
        let html = r#"<a href="mailto:broken%FF@example.com">x</a><a href="mailto:ok%2Bx@example.com">y</a>"#;

        let emails = parser().extract_emails(html);

        assert_eq!(emails, vec!["broken%FF@example.com", "ok+x@example.com"]);
    }

    #[test]
    fn test_extract_emails_without_mailto_links() {
        assert!(parser().extract_emails("<p>no links here</p>").is_empty());
    }

    #[test]
    fn test_listing_keeps_only_students() {
        let html = listing(
            &[
                row("Alice Smith", "https://eclass.example.edu/user/view.php?id=1", "Student"),
                row("Bob Teacher", "https://eclass.example.edu/user/view.php?id=2", "Teacher"),
                row("Carol Jones", "https://eclass.example.edu/user/view.php?id=3", "Student, Teacher"),
                row("Dan Brown", "https://eclass.example.edu/user/view.php?id=4", "Student"),
            ],
            &[],
        );

        let page = parser().parse_listing(&html, &page_url(), 0);

        assert_eq!(
            page.contacts,
            vec![
                "https://eclass.example.edu/user/view.php?id=1",
                "https://eclass.example.edu/user/view.php?id=4",
            ]
        );
    }

    #[test]
    fn test_listing_excludes_placeholder_name_case_insensitively() {
        let html = listing(
            &[
                row("DemoStudent Account", "https://eclass.example.edu/user/view.php?id=9", "Student"),
                row("Eve Adams", "https://eclass.example.edu/user/view.php?id=5", "Student"),
            ],
            &[],
        );

        let page = parser().parse_listing(&html, &page_url(), 0);

        assert_eq!(page.contacts, vec!["https://eclass.example.edu/user/view.php?id=5"]);
    }

    #[test]
    fn test_listing_ignores_rows_without_checkbox() {
        let html = r#"<table><tr>
            <td class="cell c1"><a href="https://eclass.example.edu/user/view.php?id=7">No Box</a></td>
            <td class="cell c2">Student</td>
        </tr></table>"#;

        let page = parser().parse_listing(html, &page_url(), 0);

        assert!(page.contacts.is_empty());
    }

    #[test]
    fn test_listing_resolves_relative_profile_links() {
        let html = listing(&[row("Frank Li", "/user/view.php?id=6&course=42", "Student")], &[]);

        let page = parser().parse_listing(&html, &page_url(), 0);

        assert_eq!(
            page.contacts,
            vec!["https://eclass.example.edu/user/view.php?id=6&course=42"]
        );
    }

    #[test]
    fn test_next_page_marker_is_current_plus_two() {
        let rows = [row("Alice", "https://eclass.example.edu/user/view.php?id=1", "Student")];

        // 第 0 頁需要標記 2
        let html = listing(&rows, &[1, 2, 3]);
        assert!(parser().parse_listing(&html, &page_url(), 0).has_next_page);

        // 只有標記 1（目前頁）時沒有下一頁
        let html = listing(&rows, &[1]);
        assert!(!parser().parse_listing(&html, &page_url(), 0).has_next_page);

        // 第 2 頁需要標記 4
        let html = listing(&rows, &[1, 2, 3]);
        assert!(!parser().parse_listing(&html, &page_url(), 2).has_next_page);
    }

    #[test]
    fn test_custom_role_and_exclusion() {
        let parser = MoodlePageParser::new("Estudiante", "").unwrap();
        let html = listing(
            &[
                row("demostudent", "https://eclass.example.edu/user/view.php?id=1", "Estudiante"),
                row("Other", "https://eclass.example.edu/user/view.php?id=2", "Student"),
            ],
            &[],
        );

        let page = parser.parse_listing(&html, &page_url(), 0);

        assert_eq!(page.contacts, vec!["https://eclass.example.edu/user/view.php?id=1"]);
    }
}
