use std::time::Duration;

/// Counters and per-stage timings for one pipeline run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub listing_pages: u32,
    pub listing_rows_skipped: u32,
    pub shops_listed: u32,
    pub details_enriched: u32,
    pub details_failed: u32,
    pub sites_with_account: u32,
    pub sites_without_account: u32,
    pub profiles_fetched: u32,
    pub profiles_missing: u32,
    pub profiles_failed: u32,
    pub listing_time: Duration,
    pub detail_time: Duration,
    pub site_time: Duration,
    pub profile_time: Duration,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Store Scout Run Complete ===")?;
        writeln!(f, "Listing pages:      {}", self.listing_pages)?;
        writeln!(f, "Rows skipped:       {}", self.listing_rows_skipped)?;
        writeln!(f, "Shops listed:       {}", self.shops_listed)?;
        writeln!(f, "Details enriched:   {}", self.details_enriched)?;
        writeln!(f, "Details failed:     {}", self.details_failed)?;
        writeln!(f, "Accounts resolved:  {}", self.sites_with_account)?;
        writeln!(f, "No account found:   {}", self.sites_without_account)?;
        writeln!(f, "Profiles fetched:   {}", self.profiles_fetched)?;
        writeln!(f, "Profiles missing:   {}", self.profiles_missing)?;
        writeln!(f, "Profiles failed:    {}", self.profiles_failed)?;
        writeln!(f, "\nStage durations:")?;
        writeln!(f, "  listing:   {:.3}s", self.listing_time.as_secs_f64())?;
        writeln!(f, "  details:   {:.3}s", self.detail_time.as_secs_f64())?;
        writeln!(f, "  sites:     {:.3}s", self.site_time.as_secs_f64())?;
        writeln!(f, "  profiles:  {:.3}s", self.profile_time.as_secs_f64())
    }
}
