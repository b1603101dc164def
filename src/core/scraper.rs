use crate::core::fetcher::PageFetcher;
use crate::core::parser::MoodlePageParser;
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::{DelayRange, EmailStore, ListingPage, MOODLE_SOURCE_KEY};
use crate::utils::error::{Result, ScrapeError};
use std::collections::HashSet;
use url::Url;

/// 從 Moodle 課程參與者列表收集學生 email
pub struct MoodleScraper<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: PageFetcher,
    parser: MoodlePageParser,
}

impl<S: Storage, C: ConfigProvider> MoodleScraper<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let fetcher = PageFetcher::new(config.cookies(), config.request_timeout())?;
        let parser = MoodlePageParser::new(config.student_role(), config.excluded_name())?;

        Ok(Self {
            storage,
            config,
            fetcher,
            parser,
        })
    }

    /// 從 HTML 中取出 `mailto:` email（保留文件順序與重複項）
    pub fn extract_emails(&self, html: &str) -> Vec<String> {
        self.parser.extract_emails(html)
    }

    /// 完整流程：收集學生連結、抓取個人頁、合併寫回 email store。
    ///
    /// 回傳的是本次抓到的 email，而非合併後寫入檔案的完整集合。
    pub async fn scrape_course_emails(&self, course_id: &str) -> Vec<String> {
        tracing::info!("Scraping course {} from {}", course_id, self.config.base_url());

        let email_data = self.load_email_data().await;
        let contacts = self.collect_student_contacts(course_id).await;
        tracing::info!("Collected {} student contacts", contacts.len());

        let emails = self.process_contacts(&contacts).await;

        if let Err(e) = self.save_emails(&emails, email_data).await {
            tracing::error!(
                "Error saving emails to {}: {}",
                self.config.store_file(),
                e
            );
        }

        emails
    }

    /// 逐頁讀取參與者列表。任何一頁失敗就停止，已收集的結果保留。
    pub async fn collect_student_contacts(&self, course_id: &str) -> Vec<String> {
        let mut all_contacts = Vec::new();
        let mut page = 0u32;

        loop {
            match self.fetch_listing_page(course_id, page).await {
                Ok(listing) => {
                    if listing.contacts.is_empty() {
                        tracing::debug!("No student contacts on page {}, stopping", page + 1);
                        break;
                    }

                    tracing::info!(
                        "Found {} contacts on page {}",
                        listing.contacts.len(),
                        page + 1
                    );
                    all_contacts.extend(listing.contacts);

                    if !listing.has_next_page {
                        break;
                    }

                    page += 1;
                    self.pause(self.config.listing_delay()).await;
                }
                Err(e) => {
                    tracing::error!("Error processing page {}: {}", page, e);
                    break;
                }
            }
        }

        dedup_preserving_order(all_contacts)
    }

    async fn fetch_listing_page(&self, course_id: &str, page: u32) -> Result<ListingPage> {
        let url = self.listing_url(course_id, page)?;
        let html = self.fetcher.fetch(url.as_str()).await?;
        Ok(self.parser.parse_listing(&html, &url, page))
    }

    fn listing_url(&self, course_id: &str, page: u32) -> Result<Url> {
        let base = self.config.base_url().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/user/index.php", base)).map_err(|e| {
            ScrapeError::ConfigError {
                message: format!("Invalid base URL '{}': {}", base, e),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("id", course_id)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// 逐一抓取個人頁。單頁失敗只跳過該頁。
    pub async fn process_contacts(&self, contacts: &[String]) -> Vec<String> {
        let mut all_emails = Vec::new();

        for contact_url in contacts {
            match self.fetcher.fetch(contact_url).await {
                Ok(html) => {
                    let emails = self.parser.extract_emails(&html);
                    tracing::debug!("Found {} emails at {}", emails.len(), contact_url);
                    all_emails.extend(emails);
                    self.pause(self.config.profile_delay()).await;
                }
                Err(e) => {
                    tracing::error!("Error processing contact {}: {}", contact_url, e);
                }
            }
        }

        dedup_preserving_order(all_emails)
    }

    /// 讀取既有 email store；檔案不存在或損毀時從空白開始
    pub async fn load_email_data(&self) -> EmailStore {
        let store_file = self.config.store_file();

        match self.storage.read_file(store_file).await {
            Ok(bytes) => match EmailStore::from_json_bytes(&bytes) {
                Some(store) => {
                    tracing::info!(
                        "Loaded {} existing emails from {}",
                        store.emails(MOODLE_SOURCE_KEY).len(),
                        store_file
                    );
                    store
                }
                None => {
                    tracing::warn!("Email store {} is unreadable. Starting fresh.", store_file);
                    EmailStore::new()
                }
            },
            Err(e) => {
                tracing::info!("No email store at {} ({}). Starting fresh.", store_file, e);
                EmailStore::new()
            }
        }
    }

    /// 合併新 email 後覆寫 email store；日誌記錄的是本批數量
    pub async fn save_emails(&self, new_emails: &[String], mut email_data: EmailStore) -> Result<()> {
        email_data.merge(MOODLE_SOURCE_KEY, new_emails);

        let json = email_data.to_pretty_json()?;
        self.storage.write_file(self.config.store_file(), &json).await?;

        tracing::info!(
            "Saved {} emails to {}",
            new_emails.len(),
            self.config.store_file()
        );
        Ok(())
    }

    async fn pause(&self, range: DelayRange) {
        let delay = range.sample();
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Waiting {} ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}

/// 去除重複，保留第一次出現的順序
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
