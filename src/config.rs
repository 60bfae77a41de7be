//! Engine tunables.
//!
//! Built from the CLI in `main.rs` and carried by the repository handle, so a
//! repository switch keeps the same settings.

/// Settings that shape diff, blame and history output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Context lines around each hunk.
    pub context_lines: u32,
    /// Similarity (percent) at which a delete/add pair becomes a rename or copy.
    /// Used both for diff status and for blame's rename following.
    pub rename_threshold: u16,
    /// Upper bound for a single history page.
    pub max_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            rename_threshold: 50,
            max_page_size: 500,
        }
    }
}

impl EngineConfig {
    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_page_size.max(1))
    }
}
