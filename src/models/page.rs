use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page selection from query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn effective_size(&self) -> u32 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of an already sorted result set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
}

impl<T> Page<T> {
    pub fn from_sorted(items: Vec<T>, request: PageRequest) -> Self {
        let size = request.effective_size();
        let total_elements = items.len() as u64;
        let total_pages = total_elements.div_ceil(size as u64) as u32;
        let content = items
            .into_iter()
            .skip(request.page as usize * size as usize)
            .take(size as usize)
            .collect();

        Self {
            content,
            total_elements,
            total_pages,
            size,
            number: request.page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
        }
    }
}
