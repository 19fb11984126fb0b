use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::model::roster::RosterEntry;
use crate::utils::db_utils;

/// Roster rows per date. Submissions invalidate the dates they touch.
pub static ROSTER_CACHE: Lazy<Cache<NaiveDate, Arc<Vec<RosterEntry>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1_024)
        .time_to_live(Duration::from_secs(600))
        .build()
});

/// Roster for one date, loaded from the store on a miss
pub async fn roster_on(pool: &MySqlPool, date: NaiveDate) -> Result<Arc<Vec<RosterEntry>>, sqlx::Error> {
    if let Some(entries) = ROSTER_CACHE.get(&date).await {
        return Ok(entries);
    }

    let entries = Arc::new(db_utils::roster_on(pool, date).await?);
    ROSTER_CACHE.insert(date, entries.clone()).await;
    Ok(entries)
}

/// Drop cached rosters for the given dates
pub async fn invalidate(dates: impl IntoIterator<Item = NaiveDate>) {
    for date in dates {
        ROSTER_CACHE.invalidate(&date).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn invalidate_drops_only_listed_dates() {
        let kept = NaiveDate::from_ymd_opt(1999, 3, 1).unwrap();
        let dropped = NaiveDate::from_ymd_opt(1999, 3, 2).unwrap();
        ROSTER_CACHE.insert(kept, Arc::new(Vec::new())).await;
        ROSTER_CACHE.insert(dropped, Arc::new(Vec::new())).await;

        invalidate([dropped]).await;

        assert!(ROSTER_CACHE.get(&kept).await.is_some());
        assert!(ROSTER_CACHE.get(&dropped).await.is_none());
    }
}
