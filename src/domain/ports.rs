use crate::domain::model::DelayRange;
use crate::utils::error::Result;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn cookies(&self) -> &[(String, String)];
    fn request_timeout(&self) -> Duration;
    fn student_role(&self) -> &str;
    fn excluded_name(&self) -> &str;
    fn listing_delay(&self) -> DelayRange;
    fn profile_delay(&self) -> DelayRange;
    fn store_file(&self) -> &str;
}
