pub mod ajax;
pub mod albums;
pub mod songs;
pub mod tracklist;

use albumshelf_catalog::Page;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}
